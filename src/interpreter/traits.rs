//! Error types and the state-access seam.
//!
//! Execution handlers never touch [`CpuState`](super::state::CpuState)
//! fields directly; they go through [`StateAccess`], which keeps the
//! register-zero rule and the memory policy in one place and lets tests
//! substitute a recording state.

use thiserror::Error;

use crate::isa::{MemWidth, OperandError};

/// Failure to turn assembly text into an [`Instruction`](super::Instruction).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MatchError {
    /// No descriptor has this mnemonic.
    #[error("unknown mnemonic '{0}'")]
    UnknownMnemonic(String),

    /// The mnemonic exists but no descriptor accepted the operands.
    #[error("no '{mnemonic}' form accepts operands '{operands}'{}", reason_suffix(.last_error))]
    NoMatchingOperands {
        mnemonic: String,
        operands: String,
        /// Why the last candidate with the right operand count was rejected.
        last_error: Option<OperandError>,
    },

    /// An operand list contained an empty entry, e.g. `add t0,,t1`.
    #[error("empty operand at position {position}")]
    EmptyOperand { position: usize },

    /// A line had operands or a label but no mnemonic.
    #[error("missing mnemonic in '{0}'")]
    MissingMnemonic(String),
}

fn reason_suffix(reason: &Option<OperandError>) -> String {
    match reason {
        Some(err) => format!(" ({})", err),
        None => String::new(),
    }
}

/// Failure while executing one instruction.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExecError {
    /// The instruction has no execution handler.
    #[error("no execution handler for '{0}'")]
    UnsupportedOperation(String),

    /// Read of a never-written word under the strict memory policy.
    #[error("read of uninitialized memory at {address:#010x}")]
    UninitializedMemory { address: u32 },

    /// Sub-word access crossing a word boundary.
    #[error("misaligned {bits}-bit access at {address:#010x}")]
    MisalignedAccess { address: u32, bits: u32 },

    #[error("division by zero in '{0}'")]
    DivideByZero(String),

    /// Handler received a different number of inputs than its function takes.
    #[error("'{mnemonic}' expects {expected} inputs, got {actual}")]
    OperandCount { mnemonic: String, expected: usize, actual: usize },
}

/// Architectural state as seen by the execution handlers.
pub trait StateAccess {
    /// Read a general-purpose register. Register 0 reads as zero.
    fn read_reg(&self, reg: u8) -> u32;

    /// Write a general-purpose register. Writes to register 0 are dropped.
    fn write_reg(&mut self, reg: u8, value: u32);

    /// Address of the instruction being executed.
    fn pc(&self) -> u32;

    /// Record a taken branch; the fetch loop consumes it.
    fn set_pending_branch(&mut self, target: u32);

    fn hi(&self) -> u32;
    fn lo(&self) -> u32;
    fn set_hi(&mut self, value: u32);
    fn set_lo(&mut self, value: u32);

    /// Read `width` bits at `address`, zero- or sign-extended to 32 bits.
    fn read_mem(&self, address: u32, width: MemWidth, signed: bool) -> Result<u32, ExecError>;

    /// Write the low `width` bits of `value` at `address`.
    fn write_mem(&mut self, address: u32, width: MemWidth, value: u32) -> Result<(), ExecError>;
}
