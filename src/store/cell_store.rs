//! Cell store
//!
//! Owns the file handle and the control header. All file-offset arithmetic
//! lives here; every other component speaks in logical cell references.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::config::{Config, SyncStrategy};
use crate::error::{CellarError, Result};

use super::{CellRef, ControlHeader, CELL_REF_SIZE, HEADER_SIZE};

/// File-backed cell allocator.
///
/// Cells are fixed-size opaque byte blocks addressed by [`CellRef`]. Freed
/// cells are recycled through an intrusive free list threaded through the
/// freed cells' own storage, so allocate and free are both O(1).
///
/// The file handle and header sit behind a mutex so that concurrent calls
/// through a shared handle cannot interleave a seek with another call's
/// read or write. That guard makes shared use non-corrupting; it is not a
/// coordination mechanism, and multi-handle or multi-process access to the
/// same file remains out of contract.
pub struct CellStore {
    /// Path to the backing file
    path: PathBuf,

    /// When to fsync the backing file
    sync_strategy: SyncStrategy,

    /// File handle + header, guarded as one unit
    inner: Mutex<StoreInner>,
}

struct StoreInner {
    file: File,
    header: ControlHeader,
}

impl StoreInner {
    /// Map a 1-based logical reference to its byte offset.
    ///
    /// The only place in the crate where this arithmetic occurs.
    fn offset_of(&self, cell: CellRef) -> u64 {
        HEADER_SIZE
            + self.header.index_size as u64
            + (cell.get() as u64 - 1) * self.header.cell_size as u64
    }

    fn write_header(&mut self) -> Result<()> {
        self.file.seek(SeekFrom::Start(0))?;
        self.file.write_all(&self.header.encode())?;
        Ok(())
    }

    /// A reference past the allocation frontier never came from this store's
    /// `allocate` — typically a stale or corrupt index handing out garbage.
    fn check_ref(&self, cell: CellRef) -> Result<()> {
        if cell.get() > self.header.num_cells {
            return Err(CellarError::InvalidReference {
                reference: cell.get(),
                allocated: self.header.num_cells,
            });
        }
        Ok(())
    }
}

impl CellStore {
    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Create a new store file with the default config.
    ///
    /// Fails with [`CellarError::AlreadyExists`] if the file exists — an
    /// existing file is never truncated or overwritten.
    ///
    /// Panics if `cell_size` cannot hold one cell reference (4 bytes); that
    /// is a caller programming error, not a runtime condition.
    pub fn create(path: impl AsRef<Path>, index_size: u32, cell_size: u32) -> Result<Self> {
        Self::create_with_config(path, index_size, cell_size, Config::default())
    }

    /// Create a new store file with the given config
    pub fn create_with_config(
        path: impl AsRef<Path>,
        index_size: u32,
        cell_size: u32,
        config: Config,
    ) -> Result<Self> {
        let path = path.as_ref();
        assert!(
            cell_size as usize >= CELL_REF_SIZE,
            "cell_size must have room for one cell reference"
        );

        let file = match OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(CellarError::AlreadyExists(path.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        };

        let header = ControlHeader {
            index_size,
            cell_size,
            num_cells: 0,
            free_head: None,
        };

        let mut inner = StoreInner { file, header };
        inner.write_header()?;
        // Reserve the index slot so it reads back as zeroes before the
        // owner's first write.
        inner.file.set_len(HEADER_SIZE + index_size as u64)?;
        if config.sync_strategy == SyncStrategy::EveryWrite {
            inner.file.sync_data()?;
        }

        debug!(path = %path.display(), index_size, cell_size, "created cell store");

        Ok(Self {
            path: path.to_path_buf(),
            sync_strategy: config.sync_strategy,
            inner: Mutex::new(inner),
        })
    }

    /// Open an existing store file with the default config.
    ///
    /// Fails with [`CellarError::NotFound`] if the file does not exist, and
    /// with [`CellarError::Corrupted`] if the header fails validation.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_config(path, Config::default())
    }

    /// Open an existing store file with the given config
    pub fn open_with_config(path: impl AsRef<Path>, config: Config) -> Result<Self> {
        let path = path.as_ref();

        let mut file = match OpenOptions::new().read(true).write(true).open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(CellarError::NotFound(path.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        };

        let mut bytes = [0u8; HEADER_SIZE as usize];
        file.read_exact(&mut bytes).map_err(|e| {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                CellarError::Corrupted("file too short for control header".to_string())
            } else {
                CellarError::Io(e)
            }
        })?;
        let header = ControlHeader::decode(&bytes)?;

        debug!(
            path = %path.display(),
            num_cells = header.num_cells,
            "opened cell store"
        );

        Ok(Self {
            path: path.to_path_buf(),
            sync_strategy: config.sync_strategy,
            inner: Mutex::new(StoreInner { file, header }),
        })
    }

    /// Close the store: persist the header and flush to stable storage.
    ///
    /// The handle is consumed; there is no using a store after close.
    pub fn close(self) -> Result<()> {
        let mut inner = self.inner.into_inner();
        inner.write_header()?;
        inner.file.sync_all()?;
        debug!(path = %self.path.display(), "closed cell store");
        Ok(())
    }

    // =========================================================================
    // Index Slot I/O
    // =========================================================================

    /// Read the reserved index slot
    pub fn read_index(&self) -> Result<Vec<u8>> {
        let mut inner = self.inner.lock();
        let mut bytes = vec![0u8; inner.header.index_size as usize];
        inner.file.seek(SeekFrom::Start(HEADER_SIZE))?;
        inner.file.read_exact(&mut bytes)?;
        Ok(bytes)
    }

    /// Write the reserved index slot.
    ///
    /// Panics if `bytes` does not match the index size fixed at creation.
    pub fn write_index(&self, bytes: &[u8]) -> Result<()> {
        let mut inner = self.inner.lock();
        assert_eq!(
            bytes.len(),
            inner.header.index_size as usize,
            "index buffer must match index_size"
        );
        inner.file.seek(SeekFrom::Start(HEADER_SIZE))?;
        inner.file.write_all(bytes)?;
        self.maybe_sync(&mut inner)
    }

    // =========================================================================
    // Cell I/O
    // =========================================================================

    /// Read one cell's raw payload.
    ///
    /// A reference past the allocation frontier fails with
    /// [`CellarError::InvalidReference`]; callers remain responsible for
    /// only dereferencing references they obtained from this store.
    pub fn read_cell(&self, cell: CellRef) -> Result<Vec<u8>> {
        let mut inner = self.inner.lock();
        inner.check_ref(cell)?;
        let offset = inner.offset_of(cell);
        let mut bytes = vec![0u8; inner.header.cell_size as usize];
        inner.file.seek(SeekFrom::Start(offset))?;
        inner.file.read_exact(&mut bytes)?;
        Ok(bytes)
    }

    /// Write one cell's raw payload.
    ///
    /// Panics if `bytes` does not match the cell size fixed at creation.
    pub fn write_cell(&self, cell: CellRef, bytes: &[u8]) -> Result<()> {
        let mut inner = self.inner.lock();
        assert_eq!(
            bytes.len(),
            inner.header.cell_size as usize,
            "cell buffer must match cell_size"
        );
        inner.check_ref(cell)?;
        let offset = inner.offset_of(cell);
        inner.file.seek(SeekFrom::Start(offset))?;
        inner.file.write_all(bytes)?;
        self.maybe_sync(&mut inner)
    }

    // =========================================================================
    // Allocation
    // =========================================================================

    /// Allocate one cell and return its reference.
    ///
    /// Pops the free list if non-empty, otherwise extends the allocation
    /// frontier. O(1) either way. The header is persisted before returning.
    pub fn allocate(&self) -> Result<CellRef> {
        let mut inner = self.inner.lock();

        let cell = match inner.header.free_head {
            Some(head) => {
                // The freed cell's first bytes hold the next free reference.
                let offset = inner.offset_of(head);
                let mut raw = [0u8; CELL_REF_SIZE];
                inner.file.seek(SeekFrom::Start(offset))?;
                inner.file.read_exact(&mut raw)?;
                inner.header.free_head = CellRef::from_raw(u32::from_le_bytes(raw));
                trace!(cell = %head, "recycled free cell");
                head
            }
            None => {
                inner.header.num_cells += 1;
                let cell = CellRef::from_raw(inner.header.num_cells)
                    .expect("num_cells is nonzero after increment");
                // Grow the file so the fresh cell reads back as zeroes.
                let end = inner.offset_of(cell) + inner.header.cell_size as u64;
                inner.file.set_len(end)?;
                trace!(cell = %cell, "allocated new cell");
                cell
            }
        };

        inner.write_header()?;
        self.maybe_sync(&mut inner)?;
        Ok(cell)
    }

    /// Return a cell to the free list.
    ///
    /// The cell's storage is repurposed as the free-list link; the caller
    /// must have already detached the reference from any live structure.
    /// No liveness checking is performed.
    pub fn free(&self, cell: CellRef) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.check_ref(cell)?;

        let offset = inner.offset_of(cell);
        let raw = CellRef::to_raw(inner.header.free_head);
        inner.file.seek(SeekFrom::Start(offset))?;
        inner.file.write_all(&raw.to_le_bytes())?;
        inner.header.free_head = Some(cell);

        inner.write_header()?;
        trace!(cell = %cell, "freed cell");
        self.maybe_sync(&mut inner)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Path to the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bytes reserved for the index slot
    pub fn index_size(&self) -> u32 {
        self.inner.lock().header.index_size
    }

    /// Bytes per cell
    pub fn cell_size(&self) -> u32 {
        self.inner.lock().header.cell_size
    }

    /// Highest cell reference ever allocated (never decreases on free)
    pub fn num_cells(&self) -> u32 {
        self.inner.lock().header.num_cells
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn maybe_sync(&self, inner: &mut StoreInner) -> Result<()> {
        if self.sync_strategy == SyncStrategy::EveryWrite {
            inner.file.sync_data()?;
        }
        Ok(())
    }
}
