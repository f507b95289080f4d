//! # Cellar
//!
//! A persistent singly linked list stored in a single file, with:
//! - A slab-style cell allocator that carves the file into fixed-size cells
//! - An intrusive free list recycling freed cells with zero extra space
//! - Stable 1-based cell references in place of in-memory pointers
//! - Durability across process restarts without a database
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   PersistentList<R>                         │
//! │       (cached head/tail/len, position → ref chains)         │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ read/write cells by CellRef
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                      CellStore                              │
//! │    (control header, index slot, allocate/free, offsets)     │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ seek + read/write
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                     Single file                             │
//! │  [Header][Index slot][Cell 1][Cell 2]...[Cell num_cells]    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The list never manipulates file offsets; the store never interprets cell
//! payloads. Offset arithmetic happens in exactly one place.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod store;
pub mod list;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{CellarError, Result};
pub use config::{Config, SyncStrategy};
pub use store::{CellRef, CellStore};
pub use list::{PersistentList, Record};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of Cellar
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
