//! Integer ALU.
//!
//! Inputs are widened to `i64` according to the handler's signedness, the
//! function is applied with wrapping arithmetic, and the result is
//! truncated back to 32 bits on write. Multiply and divide keep the full
//! 64-bit result and split it across hi/lo.
//!
//! # Operand roles
//!
//! The destination is the first operand that is written but not read.
//! Every other operand, except ignored-register placeholders, is an input
//! in textual order.

use smallvec::SmallVec;

use crate::interpreter::instruction::Instruction;
use crate::interpreter::traits::{ExecError, StateAccess};
use crate::isa::{AccHalf, AluOp, DepFlags, OperandKind, Signedness};

use super::read_argument;

/// Integer ALU execution unit.
pub struct Alu;

impl Alu {
    /// Execute an ALU instruction.
    pub fn execute<S: StateAccess + ?Sized>(
        inst: &Instruction,
        op: AluOp,
        mode: Signedness,
        state: &mut S,
    ) -> Result<(), ExecError> {
        let args = inst.args();
        let dest = args.iter().position(|a| a.writes && !a.reads);
        let inputs: SmallVec<[i64; 3]> = args
            .iter()
            .enumerate()
            .filter(|&(i, a)| Some(i) != dest && a.kind != OperandKind::Ignored)
            .map(|(_, a)| widen(read_argument(state, a), mode))
            .collect();

        if inputs.len() != op.arity() {
            return Err(ExecError::OperandCount {
                mnemonic: inst.mnemonic().to_string(),
                expected: op.arity(),
                actual: inputs.len(),
            });
        }

        let result = Self::apply(op, &inputs, inst.mnemonic())?;

        if inst.deps().contains(DepFlags::WRITE_HILO) {
            state.set_hi((result >> 32) as u32);
            state.set_lo(result as u32);
            return Ok(());
        }
        match dest.and_then(|i| args[i].register) {
            Some(reg) => {
                state.write_reg(reg, result as u32);
                Ok(())
            }
            None => Err(ExecError::UnsupportedOperation(inst.mnemonic().to_string())),
        }
    }

    /// Apply `op` to already-widened inputs.
    pub fn apply(op: AluOp, inputs: &[i64], mnemonic: &str) -> Result<i64, ExecError> {
        let a = inputs.first().copied().unwrap_or(0);
        let b = inputs.get(1).copied().unwrap_or(0);
        let result = match op {
            AluOp::Add => a.wrapping_add(b),
            AluOp::Sub => a.wrapping_sub(b),
            AluOp::Mul => a.wrapping_mul(b),
            AluOp::DivRem => {
                if b == 0 {
                    return Err(ExecError::DivideByZero(mnemonic.to_string()));
                }
                let quot = a.wrapping_div(b);
                let rem = a.wrapping_rem(b);
                (i64::from(rem as u32) << 32) | i64::from(quot as u32)
            }
            AluOp::And => a & b,
            AluOp::Or => a | b,
            AluOp::Xor => a ^ b,
            AluOp::Nor => !(a | b),
            AluOp::Not => !a,
            AluOp::Neg => a.wrapping_neg(),
            AluOp::ShiftLeft => a << (b & 0x1f),
            // Signed inputs were sign-extended, so this is arithmetic for sra.
            AluOp::ShiftRight => a >> (b & 0x1f),
            AluOp::SetLess => i64::from(a < b),
            AluOp::Copy => a,
            AluOp::LoadUpper => a << 16,
        };
        Ok(result)
    }

    /// `mfhi`/`mflo`: copy one accumulator half into the destination.
    pub fn move_from<S: StateAccess + ?Sized>(inst: &Instruction, half: AccHalf, state: &mut S) -> Result<(), ExecError> {
        let reg = first_register(inst)?;
        let value = match half {
            AccHalf::Hi => state.hi(),
            AccHalf::Lo => state.lo(),
        };
        state.write_reg(reg, value);
        Ok(())
    }

    /// `mthi`/`mtlo`: copy a register into one accumulator half.
    pub fn move_to<S: StateAccess + ?Sized>(inst: &Instruction, half: AccHalf, state: &mut S) -> Result<(), ExecError> {
        let value = state.read_reg(first_register(inst)?);
        match half {
            AccHalf::Hi => state.set_hi(value),
            AccHalf::Lo => state.set_lo(value),
        }
        Ok(())
    }
}

/// Interpret a 32-bit operand as signed or unsigned.
#[inline]
fn widen(value: u32, mode: Signedness) -> i64 {
    match mode {
        Signedness::Signed => i64::from(value as i32),
        Signedness::Unsigned => i64::from(value),
    }
}

fn first_register(inst: &Instruction) -> Result<u8, ExecError> {
    inst.args()
        .first()
        .and_then(|a| a.register)
        .ok_or_else(|| ExecError::OperandCount {
            mnemonic: inst.mnemonic().to_string(),
            expected: 1,
            actual: 0,
        })
}
