//! Static ISA tables.
//!
//! Everything in this module is immutable once built and is shared by
//! every assembler, simulator and analyzer instance:
//!
//! - [`flags`]: dependency flags attached to descriptors
//! - [`locations`]: bit-field positions inside an encoded word
//! - [`operands`]: operand shape codes and literal parsing
//! - [`registers`]: register names
//! - [`opcodes`]: the ordered descriptor table and handler kinds

pub mod flags;
pub mod locations;
pub mod opcodes;
pub mod operands;
pub mod registers;

pub use flags::{DepFlags, Dependency};
pub use locations::{BitLocation, Location};
pub use opcodes::{
    AccHalf, AluOp, BranchCond, FieldConflict, InstructionDescriptor, MemWidth, OpcodeTable, Semantics,
    Signedness,
};
pub use operands::{parse_int, OperandError, OperandKind, OperandShape, ShapeSpec};
pub use registers::{parse_register, register_name, LINK_REGISTER, NUM_GPRS};
