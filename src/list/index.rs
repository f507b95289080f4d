//! List index record
//!
//! The list's resident summary state, stored in the cell store's index slot
//! and cached in memory while the list is open.

use bytes::{Buf, BufMut};

use crate::error::{CellarError, Result};
use crate::store::CellRef;

/// Encoded index size: head (4) + tail (4) + len (8)
pub(crate) const INDEX_SIZE: u32 = 16;

/// Head/tail/length snapshot of one list.
///
/// `Default` is the empty state: no head, no tail, zero length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct ListIndex {
    pub head: Option<CellRef>,
    pub tail: Option<CellRef>,
    pub len: u64,
}

impl ListIndex {
    /// Encode to the fixed on-disk representation
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(INDEX_SIZE as usize);
        buf.put_u32_le(CellRef::to_raw(self.head));
        buf.put_u32_le(CellRef::to_raw(self.tail));
        buf.put_u64_le(self.len);
        buf
    }

    /// Decode from the index slot bytes
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < INDEX_SIZE as usize {
            return Err(CellarError::Corrupted(format!(
                "list index truncated: {} bytes",
                bytes.len()
            )));
        }
        let mut buf = bytes;
        Ok(Self {
            head: CellRef::from_raw(buf.get_u32_le()),
            tail: CellRef::from_raw(buf.get_u32_le()),
            len: buf.get_u64_le(),
        })
    }
}
