//! Operand shape codes.
//!
//! Every descriptor lists its operands as shape codes. A code decides how
//! the operand text is parsed, which range it must fall in and which
//! [`BitLocation`] receives it:
//!
//! | Code | Kind | Field | Range | Shift |
//! |------|------|-------|-------|-------|
//! | `<` | immediate | SHAMT | 0..=31 | |
//! | `a` | absolute target | TARGET | 0..=0x3ffffff | 2 |
//! | `b` | register | RS | | |
//! | `c` | immediate | CODE | 0..=0x3ff | |
//! | `d` | register | RD | | |
//! | `i` | immediate | IMMEDIATE | 0..=0xffff | |
//! | `j` | immediate | IMMEDIATE | -0x8000..=0x7fff | |
//! | `o` | offset | DELTA | -0x8000..=0x7fff | |
//! | `p` | pc-relative | DELTA | -0x8000..=0x7fff | 2 |
//! | `q` | immediate | CODE2 | 0..=0x3ff | |
//! | `r` `s` `v` | register | RS | | |
//! | `t` `w` | register | RT | | |
//! | `u` | immediate | IMMEDIATE | 0..=0xffff | |
//! | `x` | ignored register | | any | |
//! | `z` | ignored register | | zero only | |
//! | `B` | immediate | CODE20 | 0..=0xfffff | |
//!
//! A compound code such as `o(b)` binds `offset(base)` text: the part
//! before the parenthesis uses the first code, the part inside it the
//! second.

use super::locations::{self, BitLocation};
use thiserror::Error;

/// How an operand is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperandKind {
    /// General-purpose register encoded into a register field.
    Register,
    /// Plain numeric value.
    Immediate,
    /// Signed memory offset; empty text means zero.
    Offset,
    /// Branch displacement in bytes, stored as words.
    PcRelative,
    /// Jump target in bytes, stored as words.
    AbsoluteTarget,
    /// Register accepted in the text but not encoded.
    Ignored,
}

impl OperandKind {
    #[inline]
    pub const fn is_register(self) -> bool {
        matches!(self, OperandKind::Register | OperandKind::Ignored)
    }
}

/// Parse and packing rules for one shape code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperandShape {
    pub code: char,
    pub kind: OperandKind,
    pub location: Option<&'static BitLocation>,
    pub min: i64,
    pub max: i64,
    pub shift: u32,
}

/// Failure binding one operand text to one shape.
///
/// These never reach callers on their own: the matcher treats them as a
/// rejected descriptor and moves on to the next candidate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OperandError {
    #[error("'{0}' is not a register")]
    BadRegister(String),

    #[error("'{0}' is not a number")]
    BadNumber(String),

    #[error("value {value} outside {min}..={max}")]
    OutOfRange { value: i64, min: i64, max: i64 },

    #[error("value {value} is not a multiple of {align}")]
    Misaligned { value: i64, align: i64 },

    #[error("expected 'offset(base)', got '{0}'")]
    MissingParenthesis(String),

    #[error("register '{0}' must be $zero")]
    NotZeroRegister(String),

    #[error("unknown operand shape '{0}'")]
    UnknownShape(String),
}

const fn shape(
    code: char,
    kind: OperandKind,
    location: Option<&'static BitLocation>,
    min: i64,
    max: i64,
    shift: u32,
) -> OperandShape {
    OperandShape { code, kind, location, min, max, shift }
}

const fn register(code: char, location: &'static BitLocation) -> OperandShape {
    shape(code, OperandKind::Register, Some(location), 0, 31, 0)
}

const fn numeric(code: char, location: &'static BitLocation, min: i64, max: i64) -> OperandShape {
    shape(code, OperandKind::Immediate, Some(location), min, max, 0)
}

pub const SHAPES: &[OperandShape] = &[
    numeric('<', &locations::SHAMT, 0, 31),
    shape('a', OperandKind::AbsoluteTarget, Some(&locations::TARGET), 0, 0x3ff_ffff, 2),
    register('b', &locations::RS),
    numeric('c', &locations::CODE, 0, 0x3ff),
    register('d', &locations::RD),
    numeric('i', &locations::IMMEDIATE, 0, 0xffff),
    numeric('j', &locations::IMMEDIATE, -0x8000, 0x7fff),
    shape('o', OperandKind::Offset, Some(&locations::DELTA), -0x8000, 0x7fff, 0),
    shape('p', OperandKind::PcRelative, Some(&locations::DELTA), -0x8000, 0x7fff, 2),
    numeric('q', &locations::CODE2, 0, 0x3ff),
    register('r', &locations::RS),
    register('s', &locations::RS),
    register('t', &locations::RT),
    numeric('u', &locations::IMMEDIATE, 0, 0xffff),
    register('v', &locations::RS),
    register('w', &locations::RT),
    shape('x', OperandKind::Ignored, None, 0, 31, 0),
    shape('z', OperandKind::Ignored, None, 0, 0, 0),
    numeric('B', &locations::CODE20, 0, 0xf_ffff),
];

impl OperandShape {
    /// Look up a single-character shape code.
    pub fn lookup(code: char) -> Option<&'static OperandShape> {
        SHAPES.iter().find(|s| s.code == code)
    }

    /// Check a parsed numeric value against this shape and return the
    /// value that gets stored (after alignment shift).
    pub fn validate(&self, value: i64) -> Result<i64, OperandError> {
        let value = match self.kind {
            OperandKind::PcRelative | OperandKind::AbsoluteTarget if self.shift > 0 => {
                let align = 1i64 << self.shift;
                if value % align != 0 {
                    return Err(OperandError::Misaligned { value, align });
                }
                value >> self.shift
            }
            _ => value,
        };
        if value < self.min || value > self.max {
            return Err(OperandError::OutOfRange { value, min: self.min, max: self.max });
        }
        Ok(value)
    }

    /// Bits contributed to the encoded word by `value`.
    pub fn encode(&self, value: i64) -> u32 {
        match self.location {
            Some(loc) if self.kind != OperandKind::Ignored => loc.insert(value as u32),
            _ => 0,
        }
    }
}

/// Shape specification of one descriptor operand: a plain code or an
/// `offset(base)` compound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeSpec {
    Single(&'static OperandShape),
    Compound {
        offset: &'static OperandShape,
        base: &'static OperandShape,
    },
}

impl ShapeSpec {
    /// Parse a descriptor operand string such as `t` or `o(b)`.
    pub fn parse(spec: &str) -> Result<ShapeSpec, OperandError> {
        let unknown = || OperandError::UnknownShape(spec.to_string());
        let mut chars = spec.chars();
        let first = chars.next().ok_or_else(unknown)?;
        let first = OperandShape::lookup(first).ok_or_else(unknown)?;
        match chars.next() {
            None => Ok(ShapeSpec::Single(first)),
            Some('(') => {
                let inner = chars.next().ok_or_else(unknown)?;
                let base = OperandShape::lookup(inner).ok_or_else(unknown)?;
                if chars.next() != Some(')') || chars.next().is_some() {
                    return Err(unknown());
                }
                Ok(ShapeSpec::Compound { offset: first, base })
            }
            Some(_) => Err(unknown()),
        }
    }
}

/// Parse an integer literal the way assembler sources write them:
/// optional sign, then `0x`/`0o`/`0b` prefix or plain decimal.
/// Underscores between digits are allowed.
pub fn parse_int(text: &str) -> Option<i64> {
    let text = text.trim();
    let (negative, body) = match text.as_bytes().first()? {
        b'-' => (true, &text[1..]),
        b'+' => (false, &text[1..]),
        _ => (false, text),
    };
    let lower = body.to_ascii_lowercase();
    let (radix, digits) = if let Some(rest) = lower.strip_prefix("0x") {
        (16, rest)
    } else if let Some(rest) = lower.strip_prefix("0o") {
        (8, rest)
    } else if let Some(rest) = lower.strip_prefix("0b") {
        (2, rest)
    } else {
        // Leading zeros on a decimal literal are ambiguous; only "0" itself is allowed.
        if lower.len() > 1 && lower.starts_with('0') && lower.trim_start_matches('0').chars().any(|c| c != '_') {
            return None;
        }
        (10, lower.as_str())
    };
    if digits.is_empty() || digits.starts_with('_') || digits.ends_with('_') {
        return None;
    }
    let cleaned: String = digits.chars().filter(|&c| c != '_').collect();
    if cleaned.is_empty() || !cleaned.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    let magnitude = i64::from_str_radix(&cleaned, radix).ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_int_radixes() {
        assert_eq!(parse_int("42"), Some(42));
        assert_eq!(parse_int("-0x8000"), Some(-0x8000));
        assert_eq!(parse_int("0x4410"), Some(0x4410));
        assert_eq!(parse_int("0o17"), Some(15));
        assert_eq!(parse_int("0b101"), Some(5));
        assert_eq!(parse_int("+7"), Some(7));
        assert_eq!(parse_int("0"), Some(0));
        assert_eq!(parse_int("1_000"), Some(1000));
        assert_eq!(parse_int("0XFF"), Some(255));
    }

    #[test]
    fn test_parse_int_rejects() {
        assert_eq!(parse_int(""), None);
        assert_eq!(parse_int("-"), None);
        assert_eq!(parse_int("0x"), None);
        assert_eq!(parse_int("12ab"), None);
        assert_eq!(parse_int("t0"), None);
        assert_eq!(parse_int("017"), None);
        assert_eq!(parse_int("_1"), None);
    }

    #[test]
    fn test_lookup_all_codes() {
        for code in "<abcdijopqrstuvwxzB".chars() {
            assert!(OperandShape::lookup(code).is_some(), "missing {}", code);
        }
        assert!(OperandShape::lookup('k').is_none());
    }

    #[test]
    fn test_validate_ranges() {
        let j = OperandShape::lookup('j').unwrap();
        assert_eq!(j.validate(-0x8000), Ok(-0x8000));
        assert!(matches!(j.validate(0x8000), Err(OperandError::OutOfRange { .. })));

        let i = OperandShape::lookup('i').unwrap();
        assert!(i.validate(-1).is_err());
        assert_eq!(i.validate(0xffff), Ok(0xffff));
    }

    #[test]
    fn test_validate_alignment() {
        let p = OperandShape::lookup('p').unwrap();
        assert_eq!(p.validate(-8), Ok(-2));
        assert!(matches!(p.validate(6), Err(OperandError::Misaligned { value: 6, align: 4 })));
        // Range is checked after the shift.
        assert_eq!(p.validate(0x1fffc), Ok(0x7fff));
        assert!(p.validate(0x20000).is_err());

        let a = OperandShape::lookup('a').unwrap();
        assert_eq!(a.validate(0x400), Ok(0x100));
        assert!(a.validate(0x402).is_err());
    }

    #[test]
    fn test_encode_places_bits() {
        let t = OperandShape::lookup('t').unwrap();
        assert_eq!(t.encode(9), 9 << 16);
        let j = OperandShape::lookup('j').unwrap();
        assert_eq!(j.encode(-1), 0xffff);
        let z = OperandShape::lookup('z').unwrap();
        assert_eq!(z.encode(0), 0);
    }

    #[test]
    fn test_shape_spec_parse() {
        assert!(matches!(ShapeSpec::parse("t"), Ok(ShapeSpec::Single(s)) if s.code == 't'));
        match ShapeSpec::parse("o(b)") {
            Ok(ShapeSpec::Compound { offset, base }) => {
                assert_eq!(offset.code, 'o');
                assert_eq!(base.code, 'b');
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(ShapeSpec::parse("o(b").is_err());
        assert!(ShapeSpec::parse("").is_err());
        assert!(ShapeSpec::parse("tt").is_err());
    }
}
