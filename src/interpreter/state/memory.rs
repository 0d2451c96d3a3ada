//! Sparse data memory.
//!
//! Memory is a map of word-aligned 32-bit cells. Sub-word accesses pick
//! their bits out of the containing cell big-endian style: byte 0 of a
//! word is its most significant byte, so the bit offset shrinks as the
//! address grows.
//!
//! ```text
//! address:   +0        +1        +2        +3
//! bits:    31..24    23..16    15..8     7..0
//! ```

use std::collections::HashMap;

use crate::interpreter::traits::ExecError;
use crate::isa::MemWidth;

/// What happens on a read of a never-written cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UninitPolicy {
    /// Log a warning and read zero.
    #[default]
    Warn,
    /// Fail with [`ExecError::UninitializedMemory`].
    Error,
}

/// Word-addressed sparse memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SparseMemory {
    words: HashMap<u32, u32>,
    policy: UninitPolicy,
}

impl SparseMemory {
    pub fn new(policy: UninitPolicy) -> Self {
        Self { words: HashMap::new(), policy }
    }

    pub fn policy(&self) -> UninitPolicy {
        self.policy
    }

    /// Number of cells ever written.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Raw cell at a word-aligned address, if written.
    pub fn word(&self, address: u32) -> Option<u32> {
        self.words.get(&(address & !3)).copied()
    }

    /// Written cells in address order.
    pub fn cells(&self) -> Vec<(u32, u32)> {
        let mut cells: Vec<_> = self.words.iter().map(|(&a, &v)| (a, v)).collect();
        cells.sort_unstable();
        cells
    }

    /// Read `width` bits at `address`, zero- or sign-extended.
    pub fn read(&self, address: u32, width: MemWidth, signed: bool) -> Result<u32, ExecError> {
        let (cell, shift) = locate(address, width)?;
        let word = match self.words.get(&cell) {
            Some(&w) => w,
            None => match self.policy {
                UninitPolicy::Warn => {
                    log::warn!("Read of uninitialized memory at {:#010x}", address);
                    0
                }
                UninitPolicy::Error => return Err(ExecError::UninitializedMemory { address }),
            },
        };

        let bits = width.bits();
        if bits == 32 {
            return Ok(word);
        }
        let raw = (word >> shift) & field_mask(bits);
        if signed && raw & (1 << (bits - 1)) != 0 {
            Ok(raw | !field_mask(bits))
        } else {
            Ok(raw)
        }
    }

    /// Write the low `width` bits of `value` at `address`, keeping the
    /// other bits of the containing cell.
    pub fn write(&mut self, address: u32, width: MemWidth, value: u32) -> Result<(), ExecError> {
        let (cell, shift) = locate(address, width)?;
        let bits = width.bits();
        let merged = if bits == 32 {
            value
        } else {
            let mask = field_mask(bits) << shift;
            let old = self.words.get(&cell).copied().unwrap_or(0);
            (old & !mask) | ((value << shift) & mask)
        };
        log::trace!("mem[{:#010x}] = {:#010x}", cell, merged);
        self.words.insert(cell, merged);
        Ok(())
    }
}

#[inline]
fn field_mask(bits: u32) -> u32 {
    if bits >= 32 {
        u32::MAX
    } else {
        (1 << bits) - 1
    }
}

/// Containing cell address and bit shift of an access.
fn locate(address: u32, width: MemWidth) -> Result<(u32, u32), ExecError> {
    let byte = address & 3;
    if byte + width.bytes() > 4 {
        return Err(ExecError::MisalignedAccess { address, bits: width.bits() });
    }
    let shift = 32 - width.bits() - byte * 8;
    Ok((address & !3, shift))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_round_trip() {
        let mut mem = SparseMemory::default();
        mem.write(0x100, MemWidth::Word, 0x1234_5678).unwrap();
        assert_eq!(mem.read(0x100, MemWidth::Word, false), Ok(0x1234_5678));
        assert_eq!(mem.word(0x102), Some(0x1234_5678));
    }

    #[test]
    fn test_byte_order_big_endian() {
        let mut mem = SparseMemory::default();
        mem.write(0x100, MemWidth::Word, 0x1234_5678).unwrap();
        assert_eq!(mem.read(0x100, MemWidth::Byte, false), Ok(0x12));
        assert_eq!(mem.read(0x103, MemWidth::Byte, false), Ok(0x78));
        assert_eq!(mem.read(0x100, MemWidth::Half, false), Ok(0x1234));
        assert_eq!(mem.read(0x102, MemWidth::Half, false), Ok(0x5678));
    }

    #[test]
    fn test_sign_extension() {
        let mut mem = SparseMemory::default();
        mem.write(0x200, MemWidth::Word, 0x80FF_7F01).unwrap();
        assert_eq!(mem.read(0x200, MemWidth::Byte, true), Ok(0xFFFF_FF80));
        assert_eq!(mem.read(0x200, MemWidth::Byte, false), Ok(0x80));
        assert_eq!(mem.read(0x201, MemWidth::Byte, true), Ok(0xFFFF_FFFF));
        assert_eq!(mem.read(0x202, MemWidth::Byte, true), Ok(0x7F));
        assert_eq!(mem.read(0x200, MemWidth::Half, true), Ok(0xFFFF_80FF));
        assert_eq!(mem.read(0x202, MemWidth::Half, true), Ok(0x7F01));
    }

    #[test]
    fn test_sub_word_write_preserves_neighbours() {
        let mut mem = SparseMemory::default();
        mem.write(0x100, MemWidth::Word, 0x1122_3344).unwrap();
        mem.write(0x101, MemWidth::Byte, 0xAB).unwrap();
        assert_eq!(mem.word(0x100), Some(0x11AB_3344));
        mem.write(0x102, MemWidth::Half, 0xFFFF_BEEF).unwrap();
        assert_eq!(mem.word(0x100), Some(0x11AB_BEEF));
    }

    #[test]
    fn test_sub_word_write_to_fresh_cell() {
        let mut mem = SparseMemory::new(UninitPolicy::Error);
        mem.write(0x10, MemWidth::Half, 0x8001).unwrap();
        assert_eq!(mem.word(0x10), Some(0x8001_0000));
        assert_eq!(mem.read(0x10, MemWidth::Half, true), Ok(0xFFFF_8001));
    }

    #[test]
    fn test_uninitialized_read_policy() {
        let mem = SparseMemory::default();
        assert_eq!(mem.read(0x400, MemWidth::Word, false), Ok(0));

        let strict = SparseMemory::new(UninitPolicy::Error);
        assert_eq!(
            strict.read(0x402, MemWidth::Half, false),
            Err(ExecError::UninitializedMemory { address: 0x402 })
        );
    }

    #[test]
    fn test_misaligned_access() {
        let mut mem = SparseMemory::default();
        assert_eq!(
            mem.read(0x103, MemWidth::Half, false),
            Err(ExecError::MisalignedAccess { address: 0x103, bits: 16 })
        );
        assert!(mem.write(0x102, MemWidth::Word, 1).is_err());
        // A half-word at offset 1 stays inside the cell.
        assert!(mem.write(0x101, MemWidth::Half, 1).is_ok());
    }

    #[test]
    fn test_cells_sorted() {
        let mut mem = SparseMemory::default();
        mem.write(0x20, MemWidth::Word, 2).unwrap();
        mem.write(0x10, MemWidth::Word, 1).unwrap();
        assert_eq!(mem.cells(), vec![(0x10, 1), (0x20, 2)]);
        assert_eq!(mem.len(), 2);
    }
}
