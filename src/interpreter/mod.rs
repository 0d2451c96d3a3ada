//! MIPS I assembler, interpreter and pipeline analyzer.
//!
//! The interpreter is organized into several submodules:
//!
//! - [`assemble`]: text to [`Instruction`] through the opcode table
//! - [`instruction`]: matched instructions and bound operands
//! - [`state`]: processor state (registers, accumulator, sparse memory)
//! - [`execute`]: execution units (ALU, control, memory)
//! - [`timing`]: hazard classification and stall/forwarding analysis
//! - [`traits`]: error types and the [`StateAccess`] seam
//!
//! # Data flow
//!
//! ```text
//! text -> Matcher -> Instruction -> execute(CpuState)
//!                               \-> InstructionWindow -> analyze / reorder
//! ```
//!
//! # Example
//!
//! ```
//! use mips_emu::interpreter::{assemble::parse_instruction, execute, CpuState, StateAccess};
//!
//! let mut cpu = CpuState::new();
//! execute(&mut cpu, &parse_instruction("addi t1, zero, 0x4410").unwrap()).unwrap();
//! execute(&mut cpu, &parse_instruction("addi t2, t1, -0x8000").unwrap()).unwrap();
//! assert_eq!(cpu.read_reg(10), 0x4410u32.wrapping_sub(0x8000));
//! ```

pub mod traits;
pub mod instruction;
pub mod assemble;
pub mod state;
pub mod execute;
pub mod timing;

pub use traits::{ExecError, MatchError, StateAccess};

pub use instruction::{Argument, Arguments, Instruction};

pub use assemble::{Matcher, SourceLine};

pub use state::{CpuState, SparseMemory, UninitPolicy};

pub use execute::{execute, run};

pub use timing::{depanalyze, HazardSet, HazardType, InstructionWindow, PipelineModel, SlotTiming};
