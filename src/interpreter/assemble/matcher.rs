//! Overload resolution and encoding.
//!
//! Candidates for a mnemonic are tried in table order. A candidate is
//! taken when the operand count agrees and every operand text binds to
//! the shape in the same position; the first such candidate wins and the
//! rest are never looked at.

use smallvec::SmallVec;

use crate::interpreter::instruction::{Argument, Arguments, Instruction};
use crate::interpreter::traits::MatchError;
use crate::isa::{
    parse_int, parse_register, DepFlags, InstructionDescriptor, OpcodeTable, OperandError, OperandKind,
    OperandShape, ShapeSpec,
};

/// Assembles instructions against one [`OpcodeTable`].
#[derive(Debug, Clone, Copy)]
pub struct Matcher<'t> {
    table: &'t OpcodeTable,
}

impl Matcher<'static> {
    /// Matcher over the built-in table.
    pub fn standard() -> Self {
        Self::new(OpcodeTable::standard())
    }
}

impl<'t> Matcher<'t> {
    pub fn new(table: &'t OpcodeTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &'t OpcodeTable {
        self.table
    }

    /// Select the first descriptor of `mnemonic` that accepts `operands`
    /// and encode the instruction.
    pub fn match_operands(&self, mnemonic: &str, operands: &[&str]) -> Result<Instruction, MatchError> {
        if !self.table.contains(mnemonic) {
            return Err(MatchError::UnknownMnemonic(mnemonic.to_string()));
        }

        let mut last_error = None;
        for desc in self.table.candidates(mnemonic) {
            if desc.operands.len() != operands.len() {
                continue;
            }
            match bind_all(desc, operands) {
                Ok(args) => {
                    let inst = Instruction::from_descriptor(desc, mnemonic, args);
                    log::debug!("{} -> {:#010x} ({:?})", inst, inst.encoding(), desc.operands);
                    return Ok(inst);
                }
                Err(err) => {
                    log::trace!("{} {:?} rejected: {}", mnemonic, desc.operands, err);
                    last_error = Some(err);
                }
            }
        }

        Err(MatchError::NoMatchingOperands {
            mnemonic: mnemonic.to_string(),
            operands: operands.join(","),
            last_error,
        })
    }

    /// Encode without keeping the instruction.
    pub fn encode(&self, mnemonic: &str, operands: &[&str]) -> Result<u32, MatchError> {
        self.match_operands(mnemonic, operands).map(|inst| inst.encoding())
    }
}

fn bind_all(desc: &InstructionDescriptor, operands: &[&str]) -> Result<Arguments, OperandError> {
    let mut args: Arguments = SmallVec::with_capacity(operands.len());
    for (spec, text) in desc.operands.iter().zip(operands) {
        args.push(bind_operand(spec, text, desc.deps)?);
    }
    Ok(args)
}

/// Bind one operand text to a shape spec such as `t` or `o(b)`.
pub fn bind_operand(spec: &'static str, text: &str, deps: DepFlags) -> Result<Argument, OperandError> {
    let text = text.trim();
    let mut arg = Argument {
        shape: spec,
        kind: OperandKind::Immediate,
        register: None,
        location: None,
        value: 0,
        reads: false,
        writes: false,
        bits: 0,
        text: text.to_string(),
    };

    match ShapeSpec::parse(spec)? {
        ShapeSpec::Single(shape) => bind_part(&mut arg, shape, text, deps)?,
        ShapeSpec::Compound { offset, base } => {
            let (offset_text, base_text) = split_compound(text)?;
            bind_part(&mut arg, offset, offset_text, deps)?;
            bind_part(&mut arg, base, base_text, deps)?;
        }
    }
    Ok(arg)
}

/// Split `offset(base)` into its two halves.
fn split_compound(text: &str) -> Result<(&str, &str), OperandError> {
    let missing = || OperandError::MissingParenthesis(text.to_string());
    let open = text.find('(').ok_or_else(missing)?;
    let inner = text[open + 1..].strip_suffix(')').ok_or_else(missing)?;
    Ok((text[..open].trim(), inner.trim()))
}

fn bind_part(arg: &mut Argument, shape: &OperandShape, text: &str, deps: DepFlags) -> Result<(), OperandError> {
    match shape.kind {
        OperandKind::Register => {
            let reg = parse_register(text).ok_or_else(|| OperandError::BadRegister(text.to_string()))?;
            if let Some(loc) = shape.location {
                if u32::from(reg) > loc.field_mask() {
                    return Err(OperandError::OutOfRange {
                        value: i64::from(reg),
                        min: 0,
                        max: i64::from(loc.field_mask()),
                    });
                }
                arg.bits |= loc.insert(u32::from(reg));
                arg.location = Some(loc.location);
                arg.reads = loc.is_read(deps);
                arg.writes = loc.is_written(deps);
            }
            arg.kind = OperandKind::Register;
            arg.register = Some(reg);
        }
        OperandKind::Ignored => {
            let reg = parse_register(text).ok_or_else(|| OperandError::BadRegister(text.to_string()))?;
            if i64::from(reg) < shape.min || i64::from(reg) > shape.max {
                return Err(OperandError::NotZeroRegister(text.to_string()));
            }
            arg.kind = OperandKind::Ignored;
        }
        OperandKind::Offset if text.is_empty() => {
            arg.kind = OperandKind::Offset;
            arg.value = 0;
        }
        OperandKind::Immediate
        | OperandKind::Offset
        | OperandKind::PcRelative
        | OperandKind::AbsoluteTarget => {
            let raw = parse_int(text).ok_or_else(|| OperandError::BadNumber(text.to_string()))?;
            let value = shape.validate(raw)?;
            arg.kind = shape.kind;
            arg.value = value;
            arg.bits |= shape.encode(value);
        }
    }
    Ok(())
}
