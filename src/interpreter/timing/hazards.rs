//! Pairwise hazard classification.
//!
//! Compares the register operands of two instructions:
//! - **RAW** (Read After Write): `a` reads a register `b` writes; with
//!   `bidirectional`, also `a` writes a register `b` reads
//! - **WAW** (Write After Write): both write the same register
//! - **Memory**: both access memory. There is no alias analysis, so any
//!   two loads or stores are assumed to possibly conflict.
//!
//! Register 0 never carries a dependence.

use std::fmt;

use crate::interpreter::instruction::Instruction;

/// Type of hazard between two instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HazardType {
    /// Read After Write.
    Raw,
    /// Write After Write.
    Waw,
    /// Both instructions access memory.
    Memory,
}

impl HazardType {
    const fn bit(self) -> u8 {
        match self {
            HazardType::Raw => 0x1,
            HazardType::Waw => 0x2,
            HazardType::Memory => 0x4,
        }
    }
}

/// Set of [`HazardType`]s.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct HazardSet(u8);

impl HazardSet {
    pub const EMPTY: HazardSet = HazardSet(0);

    #[inline]
    pub fn insert(&mut self, hazard: HazardType) {
        self.0 |= hazard.bit();
    }

    #[inline]
    pub fn contains(self, hazard: HazardType) -> bool {
        self.0 & hazard.bit() != 0
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Raw bits: RAW = 1, WAW = 2, memory = 4.
    #[inline]
    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn iter(self) -> impl Iterator<Item = HazardType> {
        [HazardType::Raw, HazardType::Waw, HazardType::Memory]
            .into_iter()
            .filter(move |&h| self.contains(h))
    }
}

impl fmt::Debug for HazardSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Classify the hazards between `a` and `b`.
pub fn depanalyze(a: &Instruction, b: &Instruction, bidirectional: bool) -> HazardSet {
    let mut hazards = HazardSet::EMPTY;
    for x in a.args() {
        let Some(reg) = x.dependent_register() else { continue };
        for y in b.args() {
            if y.dependent_register() != Some(reg) {
                continue;
            }
            if x.reads && y.writes {
                hazards.insert(HazardType::Raw);
            }
            if bidirectional && x.writes && y.reads {
                hazards.insert(HazardType::Raw);
            }
            if x.writes && y.writes {
                hazards.insert(HazardType::Waw);
            }
        }
    }
    if a.accesses_memory() && b.accesses_memory() {
        hazards.insert(HazardType::Memory);
    }
    hazards
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::assemble::parse_instruction;

    fn inst(line: &str) -> Instruction {
        parse_instruction(line).unwrap()
    }

    #[test]
    fn test_raw_direction() {
        let producer = inst("add t0,t1,t2");
        let consumer = inst("sub t3,t0,t4");
        assert!(depanalyze(&consumer, &producer, false).contains(HazardType::Raw));
        assert!(!depanalyze(&producer, &consumer, false).contains(HazardType::Raw));
        assert!(depanalyze(&producer, &consumer, true).contains(HazardType::Raw));
    }

    #[test]
    fn test_waw() {
        let a = inst("add t0,t1,t2");
        let b = inst("lui t0,0x10");
        let hazards = depanalyze(&a, &b, false);
        assert!(hazards.contains(HazardType::Waw));
        assert!(!hazards.contains(HazardType::Raw));
    }

    #[test]
    fn test_independent() {
        let a = inst("add t0,t1,t2");
        let b = inst("or s0,s1,s2");
        assert!(depanalyze(&a, &b, true).is_empty());
    }

    #[test]
    fn test_zero_register_ignored() {
        let a = inst("add zero,t1,t2");
        let b = inst("sub t3,zero,t4");
        assert!(depanalyze(&a, &b, true).is_empty());
    }

    #[test]
    fn test_memory_is_conservative() {
        let a = inst("sw t0,0(sp)");
        let b = inst("lw t1,64(gp)");
        let hazards = depanalyze(&a, &b, true);
        assert!(hazards.contains(HazardType::Memory));
        assert!(!hazards.contains(HazardType::Raw));
        assert_eq!(hazards.bits(), 0x4);
    }

    #[test]
    fn test_load_base_dependence() {
        let a = inst("addi t0,t0,4");
        let b = inst("lw t1,0(t0)");
        assert!(depanalyze(&b, &a, false).contains(HazardType::Raw));
    }

    #[test]
    fn test_debug_format() {
        let mut set = HazardSet::EMPTY;
        set.insert(HazardType::Waw);
        set.insert(HazardType::Raw);
        assert_eq!(format!("{:?}", set), "{Raw, Waw}");
    }
}
