//! Assembly text to [`Instruction`]s.
//!
//! Source lines have the form
//!
//! ```text
//! [label:] mnemonic [operand {, operand}] [# comment]
//! ```
//!
//! Registers may be written as `t0`, `$t0` or `$8`. Numbers accept an
//! optional sign and `0x`/`0o`/`0b` prefixes. Memory operands use
//! `offset(base)`; the offset may be omitted.

mod matcher;

pub use matcher::{bind_operand, Matcher};

use crate::interpreter::instruction::Instruction;
use crate::interpreter::traits::MatchError;

/// One parsed source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    pub label: Option<String>,
    /// `None` for blank, comment-only and label-only lines.
    pub instruction: Option<Instruction>,
}

impl<'t> Matcher<'t> {
    /// Parse and assemble one line of source.
    pub fn parse_line(&self, line: &str) -> Result<SourceLine, MatchError> {
        let code = match line.find('#') {
            Some(p) => &line[..p],
            None => line,
        };
        let (label, body) = match code.find(':') {
            Some(p) => {
                let label = code[..p].trim();
                let label = (!label.is_empty()).then(|| label.to_string());
                (label, &code[p + 1..])
            }
            None => (None, code),
        };

        let body = body.trim();
        if body.is_empty() {
            return Ok(SourceLine { label, instruction: None });
        }

        let (mnemonic, operand_text) = match body.split_once(char::is_whitespace) {
            Some((m, rest)) => (m, rest.trim()),
            None => (body, ""),
        };
        if !mnemonic.starts_with(|c: char| c.is_ascii_alphabetic()) {
            return Err(MatchError::MissingMnemonic(line.trim().to_string()));
        }

        let operands: Vec<&str> = if operand_text.is_empty() {
            Vec::new()
        } else {
            operand_text.split(',').map(str::trim).collect()
        };
        if let Some(position) = operands.iter().position(|o| o.is_empty()) {
            return Err(MatchError::EmptyOperand { position });
        }

        let instruction = self.match_operands(mnemonic, &operands)?;
        Ok(SourceLine { label, instruction: Some(instruction) })
    }
}

/// Assemble against the built-in table.
pub fn assemble(mnemonic: &str, operands: &[&str]) -> Result<Instruction, MatchError> {
    Matcher::standard().match_operands(mnemonic, operands)
}

/// Parse one source line against the built-in table.
pub fn parse_line(line: &str) -> Result<SourceLine, MatchError> {
    Matcher::standard().parse_line(line)
}

/// Assemble a single-instruction line, failing on blank lines.
pub fn parse_instruction(line: &str) -> Result<Instruction, MatchError> {
    parse_line(line)?
        .instruction
        .ok_or_else(|| MatchError::MissingMnemonic(line.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_line() {
        let line = parse_line("loop:  addi $t0, $t0, -1   # count down").unwrap();
        assert_eq!(line.label.as_deref(), Some("loop"));
        let inst = line.instruction.unwrap();
        assert_eq!(inst.mnemonic(), "addi");
        assert_eq!(inst.args().len(), 3);
        assert_eq!(inst.args()[2].value, -1);
        assert_eq!(inst.to_string(), "addi  $t0,$t0,-1");
    }

    #[test]
    fn test_parse_blank_and_label_only() {
        assert_eq!(parse_line("").unwrap(), SourceLine { label: None, instruction: None });
        assert_eq!(parse_line("   # just a comment").unwrap().instruction, None);
        let line = parse_line("start:").unwrap();
        assert_eq!(line.label.as_deref(), Some("start"));
        assert!(line.instruction.is_none());
    }

    #[test]
    fn test_parse_no_operands() {
        let inst = parse_instruction("  nop").unwrap();
        assert_eq!(inst.encoding(), 0);
        assert!(inst.args().is_empty());
    }

    #[test]
    fn test_parse_memory_operand_spacing() {
        let inst = parse_instruction("lw t2, 0( t0 )").unwrap();
        assert_eq!(inst.encoding(), 0x8d0a_0000);
    }

    #[test]
    fn test_empty_operand() {
        assert_eq!(parse_line("add t0,,t1"), Err(MatchError::EmptyOperand { position: 1 }));
        assert_eq!(parse_line("add t0,t1,"), Err(MatchError::EmptyOperand { position: 2 }));
    }

    #[test]
    fn test_missing_mnemonic() {
        assert!(matches!(parse_line("x: $t0, $t1"), Err(MatchError::MissingMnemonic(_))));
        assert!(matches!(parse_instruction("   "), Err(MatchError::MissingMnemonic(_))));
    }

    #[test]
    fn test_mnemonic_is_case_sensitive() {
        assert_eq!(
            parse_line("ADD t0,t1,t2"),
            Err(MatchError::UnknownMnemonic("ADD".to_string()))
        );
    }

    #[test]
    fn test_custom_table_matcher() {
        use crate::isa::{DepFlags, InstructionDescriptor, OpcodeTable};

        let table = OpcodeTable::new(vec![InstructionDescriptor::new(
            "inc",
            &["t"],
            0x2000_0001,
            0xffe0_ffff,
            DepFlags::WRITE_RT | DepFlags::READ_RT,
        )]);
        let m = Matcher::new(&table);
        let line = m.parse_line("inc t3").unwrap();
        assert_eq!(line.instruction.unwrap().encoding(), 0x200b_0001);
        assert!(m.parse_line("add t0,t1,t2").is_err());
    }
}
