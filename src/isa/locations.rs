//! Bit-field positions inside a 32-bit instruction word.

use super::flags::DepFlags;

/// Named field of an encoded word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Location {
    Rs,
    Rt,
    Rd,
    Shamt,
    Immediate,
    Delta,
    Target,
    Code,
    Code2,
    Code20,
}

/// Position and dependency masks of one field.
///
/// `read_mask`/`write_mask` are intersected with a descriptor's
/// [`DepFlags`] to decide whether the register held in this field is
/// read or written by the instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitLocation {
    pub location: Location,
    pub start_bit: u32,
    pub width: u32,
    pub read_mask: DepFlags,
    pub write_mask: DepFlags,
}

impl BitLocation {
    /// Mask covering `width` low bits.
    #[inline]
    pub const fn field_mask(&self) -> u32 {
        if self.width >= 32 {
            u32::MAX
        } else {
            (1u32 << self.width) - 1
        }
    }

    /// Bits this field occupies in an encoded word.
    #[inline]
    pub const fn span(&self) -> u32 {
        self.field_mask() << self.start_bit
    }

    /// Place `value` into this field. Bits beyond `width` are dropped.
    #[inline]
    pub const fn insert(&self, value: u32) -> u32 {
        (value & self.field_mask()) << self.start_bit
    }

    /// Read this field back out of an encoded word.
    #[inline]
    pub const fn extract(&self, word: u32) -> u32 {
        (word >> self.start_bit) & self.field_mask()
    }

    /// True if an operand in this field is read, given descriptor flags.
    #[inline]
    pub const fn is_read(&self, deps: DepFlags) -> bool {
        deps.intersects(self.read_mask)
    }

    /// True if an operand in this field is written, given descriptor flags.
    #[inline]
    pub const fn is_written(&self, deps: DepFlags) -> bool {
        deps.intersects(self.write_mask)
    }
}

const fn loc(location: Location, start_bit: u32, width: u32, read_mask: DepFlags, write_mask: DepFlags) -> BitLocation {
    BitLocation { location, start_bit, width, read_mask, write_mask }
}

pub const RS: BitLocation = loc(
    Location::Rs,
    21,
    5,
    DepFlags::READ_RS.union(DepFlags::READ_BASE),
    DepFlags::NONE,
);
pub const RT: BitLocation = loc(Location::Rt, 16, 5, DepFlags::READ_RT, DepFlags::WRITE_RT);
pub const RD: BitLocation = loc(Location::Rd, 11, 5, DepFlags::NONE, DepFlags::WRITE_RD);
pub const SHAMT: BitLocation = loc(Location::Shamt, 6, 5, DepFlags::NONE, DepFlags::NONE);
pub const IMMEDIATE: BitLocation = loc(Location::Immediate, 0, 16, DepFlags::NONE, DepFlags::NONE);
pub const DELTA: BitLocation = loc(Location::Delta, 0, 16, DepFlags::NONE, DepFlags::NONE);
pub const TARGET: BitLocation = loc(Location::Target, 0, 26, DepFlags::NONE, DepFlags::NONE);
pub const CODE: BitLocation = loc(Location::Code, 16, 10, DepFlags::NONE, DepFlags::NONE);
pub const CODE2: BitLocation = loc(Location::Code2, 6, 10, DepFlags::NONE, DepFlags::NONE);
pub const CODE20: BitLocation = loc(Location::Code20, 6, 20, DepFlags::NONE, DepFlags::NONE);

impl Location {
    /// Table entry for this field.
    pub const fn bits(self) -> &'static BitLocation {
        match self {
            Location::Rs => &RS,
            Location::Rt => &RT,
            Location::Rd => &RD,
            Location::Shamt => &SHAMT,
            Location::Immediate => &IMMEDIATE,
            Location::Delta => &DELTA,
            Location::Target => &TARGET,
            Location::Code => &CODE,
            Location::Code2 => &CODE2,
            Location::Code20 => &CODE20,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_extract() {
        let word = RS.insert(9) | RT.insert(10) | RD.insert(8);
        assert_eq!(word, 0x012a_4000);
        assert_eq!(RS.extract(word), 9);
        assert_eq!(RT.extract(word), 10);
        assert_eq!(RD.extract(word), 8);
    }

    #[test]
    fn test_spans() {
        assert_eq!(RS.span(), 0x03e0_0000);
        assert_eq!(SHAMT.span(), 0x0000_07c0);
        assert_eq!(TARGET.span(), 0x03ff_ffff);
        assert_eq!(CODE20.span(), 0x03ff_ffc0);
    }

    #[test]
    fn test_insert_masks_width() {
        assert_eq!(IMMEDIATE.insert(-4i32 as u32), 0xfffc);
        assert_eq!(SHAMT.insert(33), 1 << 6);
    }

    #[test]
    fn test_read_write_masks() {
        let load = DepFlags::WRITE_RT | DepFlags::READ_BASE | DepFlags::LOAD;
        assert!(RS.is_read(load));
        assert!(RT.is_written(load));
        assert!(!RT.is_read(load));

        let store = DepFlags::READ_RT | DepFlags::READ_BASE | DepFlags::STORE;
        assert!(RT.is_read(store));
        assert!(!RT.is_written(store));
        assert!(!RD.is_read(store));
    }

    #[test]
    fn test_numeric_fields_have_no_deps() {
        for loc in [SHAMT, IMMEDIATE, DELTA, TARGET, CODE, CODE2, CODE20] {
            assert!(loc.read_mask.is_empty());
            assert!(loc.write_mask.is_empty());
        }
    }
}
