//! Architectural state of one simulated processor.

use crate::interpreter::traits::{ExecError, StateAccess};
use crate::isa::{register_name, MemWidth};

use super::memory::{SparseMemory, UninitPolicy};
use super::registers::{Accumulator, GprFile};

/// Registers, program counter, pending branch and data memory.
///
/// Handlers reach this only through [`StateAccess`]; the fetch loop that
/// decides which instruction runs next is up to the caller, helped by
/// [`advance`](Self::advance).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CpuState {
    gprs: GprFile,
    pc: u32,
    pending_branch: Option<u32>,
    acc: Accumulator,
    memory: SparseMemory,
}

impl CpuState {
    /// Fresh state with the default (warn-and-zero) memory policy.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: UninitPolicy) -> Self {
        Self {
            memory: SparseMemory::new(policy),
            ..Self::default()
        }
    }

    /// Fresh state configured from a [`Config`](crate::config::Config).
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self::with_policy(config.uninit_policy())
    }

    pub fn set_pc(&mut self, pc: u32) {
        self.pc = pc;
    }

    pub fn pending_branch(&self) -> Option<u32> {
        self.pending_branch
    }

    /// Move to the next instruction: the pending branch target if one was
    /// taken, otherwise `pc + 4`. Returns the new pc.
    pub fn advance(&mut self) -> u32 {
        self.pc = match self.pending_branch.take() {
            Some(target) => target,
            None => self.pc.wrapping_add(4),
        };
        self.pc
    }

    pub fn memory(&self) -> &SparseMemory {
        &self.memory
    }

    /// Seed a memory word before running a program.
    pub fn poke_word(&mut self, address: u32, value: u32) -> Result<(), ExecError> {
        self.memory.write(address, MemWidth::Word, value)
    }

    /// One line per register: `name:xxxxxxxx`, then `pc`, `hi` and `lo`.
    pub fn register_dump(&self, symbolic: bool) -> Vec<String> {
        let mut lines: Vec<String> = self
            .gprs
            .iter()
            .map(|(reg, value)| {
                let name = if symbolic {
                    register_name(reg).to_string()
                } else {
                    format!("${}", reg)
                };
                format!("{:<4}:{:08x}", name, value)
            })
            .collect();
        lines.push(format!("{:<4}:{:08x}", "pc", self.pc));
        lines.push(format!("{:<4}:{:08x}", "hi", self.acc.hi));
        lines.push(format!("{:<4}:{:08x}", "lo", self.acc.lo));
        lines
    }
}

impl StateAccess for CpuState {
    #[inline]
    fn read_reg(&self, reg: u8) -> u32 {
        self.gprs.read(reg)
    }

    #[inline]
    fn write_reg(&mut self, reg: u8, value: u32) {
        self.gprs.write(reg, value);
    }

    #[inline]
    fn pc(&self) -> u32 {
        self.pc
    }

    fn set_pending_branch(&mut self, target: u32) {
        self.pending_branch = Some(target);
    }

    fn hi(&self) -> u32 {
        self.acc.hi
    }

    fn lo(&self) -> u32 {
        self.acc.lo
    }

    fn set_hi(&mut self, value: u32) {
        self.acc.hi = value;
    }

    fn set_lo(&mut self, value: u32) {
        self.acc.lo = value;
    }

    fn read_mem(&self, address: u32, width: MemWidth, signed: bool) -> Result<u32, ExecError> {
        self.memory.read(address, width, signed)
    }

    fn write_mem(&mut self, address: u32, width: MemWidth, value: u32) -> Result<(), ExecError> {
        self.memory.write(address, width, value)
    }
}
