//! Instruction execution.
//!
//! Dispatch is a match over the [`Semantics`] variant the descriptor was
//! built with:
//!
//! | Semantics | Unit |
//! |-----------|------|
//! | `Alu` | [`Alu`]: arithmetic, logic, shifts, compares, mul/div |
//! | `FromAccumulator` / `ToAccumulator` | [`Alu`]: hi/lo moves |
//! | `Branch` / `Jump` | [`ControlUnit`] |
//! | `Load` / `Store` | [`MemoryUnit`] |
//! | `Nop` | nothing |
//! | `Unsupported` | fails with [`ExecError::UnsupportedOperation`] |
//!
//! Execution never moves `pc`; see [`CpuState::advance`] and [`run`].
//!
//! # Example
//!
//! ```
//! use mips_emu::interpreter::{assemble::parse_instruction, execute::execute, CpuState, StateAccess};
//!
//! let mut cpu = CpuState::new();
//! execute(&mut cpu, &parse_instruction("addi t0, zero, 42").unwrap()).unwrap();
//! assert_eq!(cpu.read_reg(8), 42);
//! ```

mod alu;
mod control;
mod memory;

pub use alu::Alu;
pub use control::ControlUnit;
pub use memory::MemoryUnit;

use crate::interpreter::instruction::{Argument, Instruction};
use crate::interpreter::state::CpuState;
use crate::interpreter::traits::{ExecError, StateAccess};
use crate::isa::Semantics;

/// Execute one instruction against `state`.
pub fn execute<S: StateAccess + ?Sized>(state: &mut S, inst: &Instruction) -> Result<(), ExecError> {
    log::debug!("{:#010x}: {}", state.pc(), inst);
    match inst.semantics() {
        Semantics::Nop => Ok(()),
        Semantics::Alu(op, mode) => Alu::execute(inst, op, mode, state),
        Semantics::FromAccumulator(half) => Alu::move_from(inst, half, state),
        Semantics::ToAccumulator(half) => Alu::move_to(inst, half, state),
        Semantics::Branch(cond) => ControlUnit::branch(inst, cond, state),
        Semantics::Jump => ControlUnit::jump(inst, state),
        Semantics::Load { width, signed } => MemoryUnit::load(inst, width, signed, state),
        Semantics::Store(width) => MemoryUnit::store(inst, width, state),
        Semantics::Unsupported => Err(ExecError::UnsupportedOperation(inst.mnemonic().to_string())),
    }
}

/// Value of an operand: register contents plus offset for register and
/// `offset(base)` operands, the literal value otherwise.
pub(crate) fn read_argument<S: StateAccess + ?Sized>(state: &S, arg: &Argument) -> u32 {
    match arg.register {
        Some(reg) => state.read_reg(reg).wrapping_add(arg.value as u32),
        None => arg.value as u32,
    }
}

/// Run `program`, laid out word by word from `base`, until pc leaves it
/// or `max_steps` instructions have executed. Returns the step count.
pub fn run(state: &mut CpuState, program: &[Instruction], base: u32, max_steps: u64) -> Result<u64, ExecError> {
    state.set_pc(base);
    let mut steps = 0;
    while steps < max_steps {
        let offset = state.pc().wrapping_sub(base);
        let index = (offset / 4) as usize;
        if offset % 4 != 0 || index >= program.len() {
            break;
        }
        execute(state, &program[index])?;
        state.advance();
        steps += 1;
    }
    log::debug!("Ran {} instructions, pc = {:#010x}", steps, state.pc());
    Ok(steps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::assemble::parse_instruction;

    fn program(lines: &[&str]) -> Vec<Instruction> {
        lines.iter().map(|l| parse_instruction(l).unwrap()).collect()
    }

    #[test]
    fn test_unsupported_fails_loudly() {
        let mut cpu = CpuState::new();
        let inst = parse_instruction("syscall").unwrap();
        assert_eq!(
            execute(&mut cpu, &inst),
            Err(ExecError::UnsupportedOperation("syscall".to_string()))
        );
        let inst = parse_instruction("break 3").unwrap();
        assert!(execute(&mut cpu, &inst).is_err());
    }

    #[test]
    fn test_nop_changes_nothing() {
        let mut cpu = CpuState::new();
        let before = cpu.clone();
        execute(&mut cpu, &parse_instruction("nop").unwrap()).unwrap();
        assert_eq!(cpu, before);
    }

    #[test]
    fn test_execute_is_deterministic() {
        let prog = program(&["li t0,7", "sll t1,t0,3", "sw t1,0x20(zero)", "lw t2,0x20(zero)", "mult t2,t0"]);
        let mut a = CpuState::new();
        let mut b = CpuState::new();
        run(&mut a, &prog, 0, 100).unwrap();
        run(&mut b, &prog, 0, 100).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.lo(), 7 * 56);
    }

    #[test]
    fn test_run_loop() {
        // Sum 1..=5 into t1.
        let prog = program(&[
            "li t0,5",
            "li t1,0",
            "add t1,t1,t0",
            "addi t0,t0,-1",
            "bnez t0,-12",
            "nop",
        ]);
        let mut cpu = CpuState::new();
        let steps = run(&mut cpu, &prog, 0x400, 1000).unwrap();
        assert_eq!(cpu.read_reg(9), 15);
        assert_eq!(cpu.read_reg(8), 0);
        assert_eq!(steps, 2 + 5 * 3 + 1);
        assert_eq!(cpu.pc(), 0x400 + 6 * 4);
    }

    #[test]
    fn test_run_stops_at_step_limit() {
        let prog = program(&["b -4"]);
        let mut cpu = CpuState::new();
        assert_eq!(run(&mut cpu, &prog, 0, 10), Ok(10));
        assert_eq!(cpu.pc(), 0);
    }

    #[test]
    fn test_run_propagates_errors() {
        let prog = program(&["li t0,1", "div t0,zero"]);
        let mut cpu = CpuState::new();
        assert!(matches!(run(&mut cpu, &prog, 0, 10), Err(ExecError::DivideByZero(_))));
        assert_eq!(cpu.read_reg(8), 1);
    }
}
