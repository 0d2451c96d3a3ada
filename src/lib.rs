//! mips-emu library
//!
//! Assembly, execution and pipeline hazard analysis for a MIPS I subset.

pub mod config;
pub mod isa;
pub mod interpreter;
