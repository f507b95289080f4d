//! List node
//!
//! The list's private encoding of a cell: one element followed by the
//! reference to the next node. The store is unaware of this shape.

use bytes::{Buf, BufMut};

use crate::store::{CellRef, CELL_REF_SIZE};

use super::Record;

/// One list node: element plus successor reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Node<R> {
    pub element: R,
    pub next: Option<CellRef>,
}

impl<R: Record> Node<R> {
    /// Encoded node width — the list's cell size
    pub const SIZE: usize = R::SIZE + CELL_REF_SIZE;

    /// Encode to one cell payload
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(Self::SIZE);
        self.element.encode(&mut buf);
        buf.put_u32_le(CellRef::to_raw(self.next));
        buf
    }

    /// Decode from one cell payload
    pub fn decode(bytes: &[u8]) -> Self {
        let mut buf = bytes;
        let element = R::decode(&mut buf);
        let next = CellRef::from_raw(buf.get_u32_le());
        Self { element, next }
    }
}
