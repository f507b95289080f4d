//! Cell Store Module
//!
//! Generic file-backed cell allocator. Carves a single file into a control
//! header, one reserved index slot, and a run of fixed-size cells addressed
//! by stable 1-based references.
//!
//! ## Responsibilities
//! - Translate logical cell references into file offsets (nowhere else does)
//! - Allocate and free cells in O(1) via an intrusive free list
//! - Persist the control header on every allocation-state change
//! - Random-access reads/writes of the index slot and raw cell payloads
//!
//! ## File Format
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ Control Header (28 bytes)                                    │
//! │   Magic: "CELR" (4) | Version: u16 (2) | Reserved (2)        │
//! │   IndexSize: u32 | CellSize: u32 | NumCells: u32             │
//! │   FreeHead: u32 (0 = none) | CRC32: u32 (over prior 24)      │
//! ├──────────────────────────────────────────────────────────────┤
//! │ Index Slot (IndexSize bytes — owner-defined summary state)   │
//! ├──────────────────────────────────────────────────────────────┤
//! │ Cell 1 | Cell 2 | ... | Cell NumCells  (CellSize bytes each) │
//! │   (a free cell's first 4 bytes hold the next free reference) │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Cells are opaque byte blocks; the store never interprets payloads beyond
//! the free-list link it threads through freed cells.

mod header;
mod cell_store;

use std::fmt;
use std::num::NonZeroU32;

pub use cell_store::CellStore;

pub(crate) use header::ControlHeader;

// =============================================================================
// Shared Constants
// =============================================================================

/// Magic bytes identifying a Cellar store file
pub(crate) const MAGIC: &[u8; 4] = b"CELR";

/// Current on-disk format version
pub(crate) const FORMAT_VERSION: u16 = 1;

/// Control header size: magic (4) + version (2) + reserved (2)
/// + index_size (4) + cell_size (4) + num_cells (4) + free_head (4) + crc (4)
pub(crate) const HEADER_SIZE: u64 = 28;

/// Encoded width of one cell reference — the minimum legal cell size,
/// since a free cell repurposes its first bytes as the free-list link
pub(crate) const CELL_REF_SIZE: usize = 4;

// =============================================================================
// Cell References
// =============================================================================

/// Opaque 1-based handle to a cell in a [`CellStore`].
///
/// A reference is stable for the lifetime of its cell: freeing a cell never
/// invalidates other live references, it only makes this one eligible for
/// reuse by the next allocation. The absent ("null") reference is modelled
/// as `Option<CellRef>` and encodes as a raw 0 on disk.
///
/// References carry no owner tag; dereferencing one through a store other
/// than the store that produced it is caught only when it lands past that
/// store's allocation frontier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRef(NonZeroU32);

impl CellRef {
    /// Reconstruct a reference from its raw on-disk value; 0 decodes to `None`
    pub(crate) fn from_raw(raw: u32) -> Option<Self> {
        NonZeroU32::new(raw).map(Self)
    }

    /// Raw on-disk value of an optional reference; `None` encodes as 0
    pub(crate) fn to_raw(cell: Option<Self>) -> u32 {
        cell.map_or(0, |c| c.0.get())
    }

    /// The raw 1-based value of this reference
    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
