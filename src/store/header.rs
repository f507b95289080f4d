//! Control header
//!
//! Fixed-size metadata block at file offset 0: slot geometry plus the
//! allocator's free-list state. Encoded little-endian with a trailing CRC32.

use bytes::{Buf, BufMut};

use crate::error::{CellarError, Result};

use super::{CellRef, FORMAT_VERSION, HEADER_SIZE, MAGIC};

/// Byte offset of the CRC32 field — the checksum covers everything before it
const CRC_OFFSET: usize = HEADER_SIZE as usize - 4;

/// Allocation state and slot geometry for one store file.
///
/// `num_cells` is the highest reference ever allocated; it only grows.
/// `free_head` points at the most recently freed cell, whose first bytes in
/// turn hold the next free reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ControlHeader {
    /// Bytes reserved for the index slot
    pub index_size: u32,
    /// Bytes per cell, fixed at creation
    pub cell_size: u32,
    /// Highest cell reference ever allocated
    pub num_cells: u32,
    /// Head of the intrusive free list
    pub free_head: Option<CellRef>,
}

impl ControlHeader {
    /// Encode to the fixed on-disk representation
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(HEADER_SIZE as usize);
        buf.put_slice(MAGIC);
        buf.put_u16_le(FORMAT_VERSION);
        buf.put_u16_le(0); // reserved
        buf.put_u32_le(self.index_size);
        buf.put_u32_le(self.cell_size);
        buf.put_u32_le(self.num_cells);
        buf.put_u32_le(CellRef::to_raw(self.free_head));
        let crc = crc32fast::hash(&buf[..CRC_OFFSET]);
        buf.put_u32_le(crc);
        buf
    }

    /// Decode and validate magic, version, and checksum
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE as usize {
            return Err(CellarError::Corrupted(format!(
                "control header truncated: {} bytes",
                bytes.len()
            )));
        }

        if &bytes[0..4] != MAGIC {
            return Err(CellarError::Corrupted(format!(
                "bad magic: expected CELR, got {:?}",
                &bytes[0..4]
            )));
        }

        let stored_crc = u32::from_le_bytes(bytes[CRC_OFFSET..CRC_OFFSET + 4].try_into().unwrap());
        let computed_crc = crc32fast::hash(&bytes[..CRC_OFFSET]);
        if stored_crc != computed_crc {
            return Err(CellarError::Corrupted(format!(
                "header checksum mismatch: stored {stored_crc:#010x}, computed {computed_crc:#010x}"
            )));
        }

        let mut buf = &bytes[4..];
        let version = buf.get_u16_le();
        if version != FORMAT_VERSION {
            return Err(CellarError::Corrupted(format!(
                "unsupported format version: {version}"
            )));
        }
        buf.advance(2); // reserved

        Ok(Self {
            index_size: buf.get_u32_le(),
            cell_size: buf.get_u32_le(),
            num_cells: buf.get_u32_le(),
            free_head: CellRef::from_raw(buf.get_u32_le()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ControlHeader {
        ControlHeader {
            index_size: 16,
            cell_size: 12,
            num_cells: 7,
            free_head: CellRef::from_raw(3),
        }
    }

    #[test]
    fn encode_decode_round_trip() {
        let header = sample();
        let bytes = header.encode();
        assert_eq!(bytes.len(), HEADER_SIZE as usize);
        assert_eq!(ControlHeader::decode(&bytes).unwrap(), header);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut bytes = sample().encode();
        bytes[0..4].copy_from_slice(b"NOPE");
        assert!(matches!(
            ControlHeader::decode(&bytes),
            Err(CellarError::Corrupted(_))
        ));
    }

    #[test]
    fn rejects_checksum_mismatch() {
        let mut bytes = sample().encode();
        bytes[10] ^= 0xFF;
        assert!(matches!(
            ControlHeader::decode(&bytes),
            Err(CellarError::Corrupted(_))
        ));
    }

    #[test]
    fn null_free_head_survives_round_trip() {
        let header = ControlHeader {
            free_head: None,
            ..sample()
        };
        let decoded = ControlHeader::decode(&header.encode()).unwrap();
        assert_eq!(decoded.free_head, None);
    }
}
