//! Processor state.
//!
//! | Part | Width | Notes |
//! |------|-------|-------|
//! | GPR file | 32 × 32-bit | r0 reads zero, writes dropped |
//! | pc | 32-bit | address of the executing instruction |
//! | pending branch | optional 32-bit | set by taken branches and jumps |
//! | hi/lo | 2 × 32-bit | multiply/divide results |
//! | memory | sparse 32-bit cells | big-endian sub-word access |
//!
//! # Example
//!
//! ```
//! use mips_emu::interpreter::state::CpuState;
//! use mips_emu::interpreter::StateAccess;
//!
//! let mut cpu = CpuState::new();
//! cpu.write_reg(8, 42);
//! cpu.write_reg(0, 42);
//! assert_eq!(cpu.read_reg(8), 42);
//! assert_eq!(cpu.read_reg(0), 0);
//! ```

mod cpu;
mod memory;
mod registers;

pub use cpu::CpuState;
pub use memory::{SparseMemory, UninitPolicy};
pub use registers::{Accumulator, GprFile};
