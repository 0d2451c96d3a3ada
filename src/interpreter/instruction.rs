//! Matched instructions and their bound operands.

use std::fmt;

use smallvec::SmallVec;

use crate::isa::{DepFlags, InstructionDescriptor, Location, OperandKind, Semantics};

/// One operand bound against a descriptor shape.
///
/// For `offset(base)` operands `register` is the base and `value` the
/// offset, so reading the argument yields the effective address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argument {
    /// Shape spec this operand was bound with, e.g. `t` or `o(b)`.
    pub shape: &'static str,
    pub kind: OperandKind,
    /// Register number, for register and compound operands.
    pub register: Option<u8>,
    /// Field the register is encoded in.
    pub location: Option<Location>,
    /// Numeric value after alignment shift (offset for compound operands).
    pub value: i64,
    pub reads: bool,
    pub writes: bool,
    /// Bits this operand contributes to the encoded word.
    pub bits: u32,
    /// Operand text as written.
    pub text: String,
}

impl Argument {
    /// Register that carries a data dependence through this operand.
    /// Register 0 never does.
    #[inline]
    pub fn dependent_register(&self) -> Option<u8> {
        self.register.filter(|&r| r != 0)
    }

    /// Register this operand writes, if any.
    #[inline]
    pub fn written_register(&self) -> Option<u8> {
        if self.writes {
            self.dependent_register()
        } else {
            None
        }
    }

    /// Register this operand reads, if any.
    #[inline]
    pub fn read_register(&self) -> Option<u8> {
        if self.reads {
            self.dependent_register()
        } else {
            None
        }
    }
}

/// Operand list; most instructions have three or fewer.
pub type Arguments = SmallVec<[Argument; 3]>;

/// An assembled instruction.
///
/// Immutable once built. Analysis results live beside it in
/// [`InstructionWindow`](super::InstructionWindow), not inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    mnemonic: String,
    args: Arguments,
    deps: DepFlags,
    semantics: Semantics,
    encoding: u32,
}

impl Instruction {
    pub(crate) fn from_descriptor(desc: &InstructionDescriptor, mnemonic: &str, args: Arguments) -> Self {
        let encoding = args.iter().fold(desc.match_bits, |word, arg| word | arg.bits);
        Self {
            mnemonic: mnemonic.to_string(),
            args,
            deps: desc.deps,
            semantics: desc.semantics,
            encoding,
        }
    }

    #[inline]
    pub fn mnemonic(&self) -> &str {
        &self.mnemonic
    }

    #[inline]
    pub fn args(&self) -> &[Argument] {
        &self.args
    }

    #[inline]
    pub fn deps(&self) -> DepFlags {
        self.deps
    }

    #[inline]
    pub fn semantics(&self) -> Semantics {
        self.semantics
    }

    /// Encoded 32-bit word.
    #[inline]
    pub fn encoding(&self) -> u32 {
        self.encoding
    }

    /// True for loads and stores.
    #[inline]
    pub fn accesses_memory(&self) -> bool {
        self.deps.intersects(DepFlags::MEMORY)
    }

    #[inline]
    pub fn is_load(&self) -> bool {
        self.deps.contains(DepFlags::LOAD)
    }

    /// True if any operand writes `reg`.
    pub fn writes_register(&self, reg: u8) -> bool {
        self.args.iter().any(|a| a.written_register() == Some(reg))
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.args.is_empty() {
            return write!(f, "{}", self.mnemonic);
        }
        let operands: Vec<&str> = self.args.iter().map(|a| a.text.as_str()).collect();
        write!(f, "{:<6}{}", format!("{} ", self.mnemonic), operands.join(","))
    }
}
