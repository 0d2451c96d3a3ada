//! Dependency flags carried by instruction descriptors.
//!
//! Each descriptor declares which architectural resources it reads and
//! writes. The flags are combined with the per-field masks of
//! [`BitLocation`](super::BitLocation) to decide whether a given operand
//! is a source, a destination, or neither.
//!
//! | Flag | Bit | Meaning |
//! |------|-----|---------|
//! | `WRITE_RT` | 0x1 | writes the register in the RT field |
//! | `WRITE_RD` | 0x2 | writes the register in the RD field |
//! | `READ_RS` | 0x4 | reads the register in the RS field |
//! | `UNCOND_BRANCH` | 0x8 | unconditional branch or jump |
//! | `WRITE_LINK` | 0x10 | writes the link register (r31) |
//! | `READ_RT` | 0x20 | reads the register in the RT field |
//! | `COND_BRANCH` | 0x40 | conditional branch |
//! | `TRAP` | 0x80 | may trap |
//! | `WRITE_HILO` | 0x1000 | writes the hi/lo accumulator pair |
//! | `LOAD` | 0x2000 | memory load |
//! | `READ_BASE` | 0x4000 | reads the base register of `offset(base)` |
//! | `READ_HI` / `READ_LO` | 0x10000 / 0x20000 | reads one accumulator half |
//! | `WRITE_HI` / `WRITE_LO` | 0x80000 / 0x100000 | writes one accumulator half |
//! | `MULTIPLY` | 0x200000 | multiplier instruction |
//! | `STORE` | 0x400000 | memory store |
//!
//! The bit values follow the reference architecture table so descriptors
//! can be transcribed without renumbering.

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};

/// A single dependency kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dependency {
    WriteRt,
    WriteRd,
    ReadRs,
    UncondBranch,
    WriteLink,
    ReadRt,
    CondBranch,
    Trap,
    WriteHiLo,
    Load,
    ReadBase,
    ReadHi,
    ReadLo,
    WriteHi,
    WriteLo,
    Multiply,
    Store,
}

impl Dependency {
    /// Every dependency kind, in bit order.
    pub const ALL: [Dependency; 17] = [
        Dependency::WriteRt,
        Dependency::WriteRd,
        Dependency::ReadRs,
        Dependency::UncondBranch,
        Dependency::WriteLink,
        Dependency::ReadRt,
        Dependency::CondBranch,
        Dependency::Trap,
        Dependency::WriteHiLo,
        Dependency::Load,
        Dependency::ReadBase,
        Dependency::ReadHi,
        Dependency::ReadLo,
        Dependency::WriteHi,
        Dependency::WriteLo,
        Dependency::Multiply,
        Dependency::Store,
    ];

    /// The flag bit for this kind.
    pub const fn flag(self) -> DepFlags {
        match self {
            Dependency::WriteRt => DepFlags::WRITE_RT,
            Dependency::WriteRd => DepFlags::WRITE_RD,
            Dependency::ReadRs => DepFlags::READ_RS,
            Dependency::UncondBranch => DepFlags::UNCOND_BRANCH,
            Dependency::WriteLink => DepFlags::WRITE_LINK,
            Dependency::ReadRt => DepFlags::READ_RT,
            Dependency::CondBranch => DepFlags::COND_BRANCH,
            Dependency::Trap => DepFlags::TRAP,
            Dependency::WriteHiLo => DepFlags::WRITE_HILO,
            Dependency::Load => DepFlags::LOAD,
            Dependency::ReadBase => DepFlags::READ_BASE,
            Dependency::ReadHi => DepFlags::READ_HI,
            Dependency::ReadLo => DepFlags::READ_LO,
            Dependency::WriteHi => DepFlags::WRITE_HI,
            Dependency::WriteLo => DepFlags::WRITE_LO,
            Dependency::Multiply => DepFlags::MULTIPLY,
            Dependency::Store => DepFlags::STORE,
        }
    }

    /// Short name used in debug output.
    pub const fn name(self) -> &'static str {
        match self {
            Dependency::WriteRt => "WR_t",
            Dependency::WriteRd => "WR_d",
            Dependency::ReadRs => "RD_s",
            Dependency::UncondBranch => "UBD",
            Dependency::WriteLink => "WR_31",
            Dependency::ReadRt => "RD_t",
            Dependency::CondBranch => "CBD",
            Dependency::Trap => "TRAP",
            Dependency::WriteHiLo => "WR_HILO",
            Dependency::Load => "LDD",
            Dependency::ReadBase => "RD_b",
            Dependency::ReadHi => "RD_HI",
            Dependency::ReadLo => "RD_LO",
            Dependency::WriteHi => "WR_HI",
            Dependency::WriteLo => "WR_LO",
            Dependency::Multiply => "IS_M",
            Dependency::Store => "SM",
        }
    }
}

/// Set of [`Dependency`] kinds.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DepFlags(u32);

impl DepFlags {
    pub const NONE: DepFlags = DepFlags(0);
    pub const WRITE_RT: DepFlags = DepFlags(0x0000_0001);
    pub const WRITE_RD: DepFlags = DepFlags(0x0000_0002);
    pub const READ_RS: DepFlags = DepFlags(0x0000_0004);
    pub const UNCOND_BRANCH: DepFlags = DepFlags(0x0000_0008);
    pub const WRITE_LINK: DepFlags = DepFlags(0x0000_0010);
    pub const READ_RT: DepFlags = DepFlags(0x0000_0020);
    pub const COND_BRANCH: DepFlags = DepFlags(0x0000_0040);
    pub const TRAP: DepFlags = DepFlags(0x0000_0080);
    pub const WRITE_HILO: DepFlags = DepFlags(0x0000_1000);
    pub const LOAD: DepFlags = DepFlags(0x0000_2000);
    pub const READ_BASE: DepFlags = DepFlags(0x0000_4000);
    pub const READ_HI: DepFlags = DepFlags(0x0001_0000);
    pub const READ_LO: DepFlags = DepFlags(0x0002_0000);
    pub const WRITE_HI: DepFlags = DepFlags(0x0008_0000);
    pub const WRITE_LO: DepFlags = DepFlags(0x0010_0000);
    pub const MULTIPLY: DepFlags = DepFlags(0x0020_0000);
    pub const STORE: DepFlags = DepFlags(0x0040_0000);

    /// Loads and stores.
    pub const MEMORY: DepFlags = DepFlags(Self::LOAD.0 | Self::STORE.0);

    /// Raw bit value.
    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Build from raw bits, dropping any bit that has no named kind.
    pub fn from_bits_truncate(bits: u32) -> Self {
        let known = Dependency::ALL.iter().fold(0, |acc, d| acc | d.flag().0);
        DepFlags(bits & known)
    }

    #[inline]
    pub const fn union(self, other: DepFlags) -> DepFlags {
        DepFlags(self.0 | other.0)
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True if every bit of `other` is set.
    #[inline]
    pub const fn contains(self, other: DepFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// True if any bit of `other` is set.
    #[inline]
    pub const fn intersects(self, other: DepFlags) -> bool {
        self.0 & other.0 != 0
    }

    /// Iterate the individual kinds present.
    pub fn iter(self) -> impl Iterator<Item = Dependency> {
        Dependency::ALL
            .into_iter()
            .filter(move |d| self.contains(d.flag()))
    }
}

impl From<Dependency> for DepFlags {
    fn from(dep: Dependency) -> Self {
        dep.flag()
    }
}

impl BitOr for DepFlags {
    type Output = DepFlags;

    fn bitor(self, rhs: DepFlags) -> DepFlags {
        self.union(rhs)
    }
}

impl BitOrAssign for DepFlags {
    fn bitor_assign(&mut self, rhs: DepFlags) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for DepFlags {
    type Output = DepFlags;

    fn bitand(self, rhs: DepFlags) -> DepFlags {
        DepFlags(self.0 & rhs.0)
    }
}

impl fmt::Debug for DepFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "DepFlags(NONE)");
        }
        let names: Vec<&str> = self.iter().map(Dependency::name).collect();
        write!(f, "DepFlags({})", names.join("|"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_bits_match_table() {
        assert_eq!(DepFlags::WRITE_RT.bits(), 0x1);
        assert_eq!(DepFlags::READ_RT.bits(), 0x20);
        assert_eq!(DepFlags::WRITE_HILO.bits(), 0x1000);
        assert_eq!(DepFlags::READ_BASE.bits(), 0x4000);
        assert_eq!(DepFlags::STORE.bits(), 0x40_0000);
    }

    #[test]
    fn test_each_kind_is_one_bit() {
        let mut seen = 0u32;
        for dep in Dependency::ALL {
            let bits = dep.flag().bits();
            assert_eq!(bits.count_ones(), 1, "{:?}", dep);
            assert_eq!(seen & bits, 0, "{:?} reuses a bit", dep);
            seen |= bits;
        }
    }

    #[test]
    fn test_set_operations() {
        let flags = DepFlags::WRITE_RD | DepFlags::READ_RS | DepFlags::READ_RT;
        assert!(flags.contains(DepFlags::READ_RS));
        assert!(!flags.contains(DepFlags::READ_RS | DepFlags::LOAD));
        assert!(flags.intersects(DepFlags::READ_RS | DepFlags::LOAD));
        assert!(!flags.intersects(DepFlags::MEMORY));
        assert_eq!(flags.iter().count(), 3);
    }

    #[test]
    fn test_truncate_drops_unknown_bits() {
        let flags = DepFlags::from_bits_truncate(0x0000_0800 | 0x1);
        assert_eq!(flags, DepFlags::WRITE_RT);
    }

    #[test]
    fn test_debug_lists_names() {
        let flags = DepFlags::WRITE_RT | DepFlags::LOAD;
        assert_eq!(format!("{:?}", flags), "DepFlags(WR_t|LDD)");
        assert_eq!(format!("{:?}", DepFlags::NONE), "DepFlags(NONE)");
    }
}
