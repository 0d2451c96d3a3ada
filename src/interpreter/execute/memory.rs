//! Loads and stores.
//!
//! Both take the effective address from an `offset(base)` operand:
//! base register plus signed offset, wrapping at 32 bits.

use crate::interpreter::instruction::Instruction;
use crate::interpreter::traits::{ExecError, StateAccess};
use crate::isa::MemWidth;

use super::read_argument;

/// Memory unit for load/store operations.
pub struct MemoryUnit;

impl MemoryUnit {
    pub fn load<S: StateAccess + ?Sized>(
        inst: &Instruction,
        width: MemWidth,
        signed: bool,
        state: &mut S,
    ) -> Result<(), ExecError> {
        let (reg, address) = Self::operands(inst, state)?;
        let value = state.read_mem(address, width, signed)?;
        log::trace!("{} {:#010x} -> {:#010x}", inst.mnemonic(), address, value);
        state.write_reg(reg, value);
        Ok(())
    }

    pub fn store<S: StateAccess + ?Sized>(inst: &Instruction, width: MemWidth, state: &mut S) -> Result<(), ExecError> {
        let (reg, address) = Self::operands(inst, state)?;
        let value = state.read_reg(reg);
        log::trace!("{} {:#010x} <- {:#010x}", inst.mnemonic(), address, value);
        state.write_mem(address, width, value)
    }

    /// Data register and effective address.
    fn operands<S: StateAccess + ?Sized>(inst: &Instruction, state: &S) -> Result<(u8, u32), ExecError> {
        match inst.args() {
            [data, addr] => match data.register {
                Some(reg) => Ok((reg, read_argument(state, addr))),
                None => Err(ExecError::UnsupportedOperation(inst.mnemonic().to_string())),
            },
            args => Err(ExecError::OperandCount {
                mnemonic: inst.mnemonic().to_string(),
                expected: 2,
                actual: args.len(),
            }),
        }
    }
}
