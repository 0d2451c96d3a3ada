//! Register files.
//!
//! - **GPR**: 32 × 32-bit general purpose registers; r0 is hard-wired to zero
//! - **Accumulator**: the hi/lo pair written by multiply and divide

use std::fmt;

use crate::isa::{register_name, NUM_GPRS};

/// General purpose register file.
#[derive(Clone, PartialEq, Eq)]
pub struct GprFile {
    regs: [u32; NUM_GPRS],
}

impl Default for GprFile {
    fn default() -> Self {
        Self::new()
    }
}

impl GprFile {
    /// Create a new zeroed register file.
    pub const fn new() -> Self {
        Self { regs: [0; NUM_GPRS] }
    }

    /// Read a register (0-31). r0 always reads zero.
    #[inline]
    pub fn read(&self, reg: u8) -> u32 {
        match reg {
            0 => 0,
            r => self.regs[(r as usize) & (NUM_GPRS - 1)],
        }
    }

    /// Write a register (0-31). Writes to r0 are discarded.
    #[inline]
    pub fn write(&mut self, reg: u8, value: u32) {
        if reg != 0 {
            self.regs[(reg as usize) & (NUM_GPRS - 1)] = value;
        }
    }

    /// Iterate `(register, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (u8, u32)> + '_ {
        (0..NUM_GPRS as u8).map(move |r| (r, self.read(r)))
    }
}

impl fmt::Debug for GprFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Only show non-zero registers
        let non_zero: Vec<_> = self.iter().filter(|&(_, v)| v != 0).collect();
        if non_zero.is_empty() {
            return write!(f, "GprFile {{ all zero }}");
        }
        write!(f, "GprFile {{ ")?;
        for (i, (reg, val)) in non_zero.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: 0x{:08X}", register_name(*reg), val)?;
        }
        write!(f, " }}")
    }
}

/// The hi/lo accumulator pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Accumulator {
    pub hi: u32,
    pub lo: u32,
}
