//! Branches and jumps.
//!
//! Neither handler changes `pc`. A taken branch or jump records its
//! target as the pending branch, and the fetch loop picks it up. Link
//! values are `pc + 4`.

use smallvec::SmallVec;

use crate::interpreter::instruction::Instruction;
use crate::interpreter::traits::{ExecError, StateAccess};
use crate::isa::{BranchCond, DepFlags, OperandKind, LINK_REGISTER};

/// Control unit for branches and jumps.
pub struct ControlUnit;

impl ControlUnit {
    /// Conditional or unconditional pc-relative branch.
    ///
    /// The condition compares the first register operand against the
    /// second (or zero when there is only one), both taken as signed.
    pub fn branch<S: StateAccess + ?Sized>(inst: &Instruction, cond: BranchCond, state: &mut S) -> Result<(), ExecError> {
        let regs: SmallVec<[i32; 2]> = inst
            .args()
            .iter()
            .filter(|a| a.kind == OperandKind::Register)
            .filter_map(|a| a.register)
            .map(|r| state.read_reg(r) as i32)
            .collect();
        let lhs = regs.first().copied().unwrap_or(0);
        let rhs = regs.get(1).copied().unwrap_or(0);

        if !cond.holds(lhs, rhs) {
            return Ok(());
        }

        let offset = inst
            .args()
            .iter()
            .find(|a| a.kind == OperandKind::PcRelative)
            .map(|a| a.value)
            .unwrap_or(0);
        let next = state.pc().wrapping_add(4);
        let target = next.wrapping_add((offset << 2) as u32);
        log::trace!("{} taken -> {:#010x}", inst.mnemonic(), target);
        state.set_pending_branch(target);

        if inst.deps().contains(DepFlags::WRITE_LINK) {
            state.write_reg(LINK_REGISTER, next);
        }
        Ok(())
    }

    /// Absolute or register-indirect jump.
    ///
    /// An absolute target replaces the low 28 bits of `pc + 4`. `jal`
    /// links through r31; `jalr` links through its first operand, or r31
    /// when written with only the target register.
    pub fn jump<S: StateAccess + ?Sized>(inst: &Instruction, state: &mut S) -> Result<(), ExecError> {
        let args = inst.args();
        let target_arg = args.last().ok_or_else(|| ExecError::OperandCount {
            mnemonic: inst.mnemonic().to_string(),
            expected: 1,
            actual: 0,
        })?;

        let next = state.pc().wrapping_add(4);
        let target = match (target_arg.kind, target_arg.register) {
            (OperandKind::AbsoluteTarget, _) => (next & 0xF000_0000) | ((target_arg.value as u32) << 2),
            (OperandKind::Register, Some(reg)) => state.read_reg(reg),
            _ => return Err(ExecError::UnsupportedOperation(inst.mnemonic().to_string())),
        };

        let deps = inst.deps();
        let link = if deps.contains(DepFlags::WRITE_LINK) {
            Some(LINK_REGISTER)
        } else if deps.contains(DepFlags::WRITE_RD) {
            if args.len() > 1 {
                args[0].register
            } else {
                Some(LINK_REGISTER)
            }
        } else {
            None
        };
        if let Some(reg) = link {
            state.write_reg(reg, next);
        }

        log::trace!("{} -> {:#010x}", inst.mnemonic(), target);
        state.set_pending_branch(target);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::assemble::parse_instruction;
    use crate::interpreter::execute::execute;
    use crate::interpreter::state::CpuState;

    fn step(cpu: &mut CpuState, line: &str) {
        execute(cpu, &parse_instruction(line).unwrap()).unwrap();
    }

    #[test]
    fn test_branch_taken_and_not_taken() {
        let mut cpu = CpuState::new();
        cpu.set_pc(0x100);
        cpu.write_reg(8, 3);
        cpu.write_reg(9, 3);
        step(&mut cpu, "beq t0,t1,16");
        assert_eq!(cpu.pending_branch(), Some(0x114));

        let mut cpu = CpuState::new();
        cpu.set_pc(0x100);
        cpu.write_reg(8, 3);
        step(&mut cpu, "beq t0,t1,16");
        assert_eq!(cpu.pending_branch(), None);
    }

    #[test]
    fn test_branch_backwards() {
        let mut cpu = CpuState::new();
        cpu.set_pc(0x100);
        cpu.write_reg(8, 1);
        step(&mut cpu, "bnez t0,-8");
        assert_eq!(cpu.pending_branch(), Some(0xfc));
    }

    #[test]
    fn test_single_register_conditions_are_signed() {
        let cases = [
            ("bltz t0,8", 0xFFFF_FFFF, true),
            ("bltz t0,8", 1, false),
            ("blez t0,8", 0, true),
            ("bgtz t0,8", 0x8000_0000, false),
            ("bgez t0,8", 0, true),
            ("bne t0,zero,8", 0, false),
            ("beqz t0,8", 0, true),
        ];
        for (line, value, taken) in cases {
            let mut cpu = CpuState::new();
            cpu.write_reg(8, value);
            step(&mut cpu, line);
            assert_eq!(cpu.pending_branch().is_some(), taken, "{} with {:#x}", line, value);
        }
    }

    #[test]
    fn test_branch_and_link() {
        let mut cpu = CpuState::new();
        cpu.set_pc(0x200);
        step(&mut cpu, "bal 0x40");
        assert_eq!(cpu.pending_branch(), Some(0x244));
        assert_eq!(cpu.read_reg(31), 0x204);

        // Not taken: no link
        let mut cpu = CpuState::new();
        cpu.write_reg(8, 0xFFFF_FFFF);
        step(&mut cpu, "bgezal t0,8");
        assert_eq!(cpu.read_reg(31), 0);
    }

    #[test]
    fn test_absolute_jump_keeps_region() {
        let mut cpu = CpuState::new();
        cpu.set_pc(0x1000_0100);
        step(&mut cpu, "j 0x400");
        assert_eq!(cpu.pending_branch(), Some(0x1000_0400));
        assert_eq!(cpu.read_reg(31), 0);

        step(&mut cpu, "jal 0x800");
        assert_eq!(cpu.pending_branch(), Some(0x1000_0800));
        assert_eq!(cpu.read_reg(31), 0x1000_0104);
    }

    #[test]
    fn test_register_jumps() {
        let mut cpu = CpuState::new();
        cpu.set_pc(0x40);
        cpu.write_reg(25, 0x800);
        step(&mut cpu, "jr t9");
        assert_eq!(cpu.pending_branch(), Some(0x800));
        assert_eq!(cpu.read_reg(31), 0);

        step(&mut cpu, "jalr t9");
        assert_eq!(cpu.read_reg(31), 0x44);

        step(&mut cpu, "jalr s0,t9");
        assert_eq!(cpu.read_reg(16), 0x44);
        assert_eq!(cpu.pending_branch(), Some(0x800));
    }
}
