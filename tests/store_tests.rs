//! Tests for the file-backed cell store
//!
//! These tests verify:
//! - Create/open/close lifecycle and failure modes
//! - Index slot round-trips independent of cell allocation
//! - Cell read/write by reference
//! - Free-list recycling (LIFO, O(1), num_cells never shrinks)
//! - Header validation on open (magic, checksum)
//! - Invalid reference detection past the allocation frontier

use std::io::{Seek, SeekFrom, Write};
use std::path::PathBuf;

use cellar::{CellStore, CellarError, Config, SyncStrategy};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_store() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("test.cells");
    (temp_dir, path)
}

/// Create a store with a 16-byte index slot and 8-byte cells
fn create_store(path: &PathBuf) -> CellStore {
    CellStore::create(path, 16, 8).unwrap()
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_create_writes_file() {
    let (_temp, path) = setup_temp_store();

    let store = create_store(&path);

    assert!(path.exists());
    assert_eq!(store.index_size(), 16);
    assert_eq!(store.cell_size(), 8);
    assert_eq!(store.num_cells(), 0);
}

#[test]
fn test_create_existing_file_fails() {
    let (_temp, path) = setup_temp_store();

    create_store(&path).close().unwrap();

    let result = CellStore::create(&path, 16, 8);
    assert!(matches!(result, Err(CellarError::AlreadyExists(_))));
}

#[test]
fn test_create_does_not_touch_existing_file() {
    let (_temp, path) = setup_temp_store();

    let store = create_store(&path);
    let cell = store.allocate().unwrap();
    store.write_cell(cell, b"original").unwrap();
    store.close().unwrap();

    assert!(CellStore::create(&path, 16, 8).is_err());

    let store = CellStore::open(&path).unwrap();
    assert_eq!(store.num_cells(), 1);
    assert_eq!(store.read_cell(cell).unwrap(), b"original");
}

#[test]
fn test_open_missing_file_fails() {
    let (_temp, path) = setup_temp_store();

    let result = CellStore::open(&path);
    assert!(matches!(result, Err(CellarError::NotFound(_))));
}

#[test]
fn test_header_persists_across_reopen() {
    let (_temp, path) = setup_temp_store();

    let store = create_store(&path);
    store.allocate().unwrap();
    store.allocate().unwrap();
    store.close().unwrap();

    let store = CellStore::open(&path).unwrap();
    assert_eq!(store.index_size(), 16);
    assert_eq!(store.cell_size(), 8);
    assert_eq!(store.num_cells(), 2);
}

#[test]
fn test_every_write_sync_strategy() {
    let (_temp, path) = setup_temp_store();
    let config = Config::builder()
        .sync_strategy(SyncStrategy::EveryWrite)
        .build();

    let store = CellStore::create_with_config(&path, 16, 8, config).unwrap();
    let cell = store.allocate().unwrap();
    store.write_cell(cell, b"synced!!").unwrap();
    store.close().unwrap();

    let store = CellStore::open(&path).unwrap();
    assert_eq!(store.read_cell(cell).unwrap(), b"synced!!");
}

// =============================================================================
// Index Slot Tests
// =============================================================================

#[test]
fn test_index_slot_starts_zeroed() {
    let (_temp, path) = setup_temp_store();

    let store = create_store(&path);
    assert_eq!(store.read_index().unwrap(), vec![0u8; 16]);
}

#[test]
fn test_index_slot_round_trip() {
    let (_temp, path) = setup_temp_store();

    let store = create_store(&path);
    store.write_index(b"0123456789abcdef").unwrap();
    assert_eq!(store.read_index().unwrap(), b"0123456789abcdef");
}

#[test]
fn test_index_slot_survives_reopen_and_allocation() {
    let (_temp, path) = setup_temp_store();

    let store = create_store(&path);
    store.write_index(b"summary-state-16").unwrap();
    store.allocate().unwrap();
    store.allocate().unwrap();
    store.close().unwrap();

    let store = CellStore::open(&path).unwrap();
    assert_eq!(store.read_index().unwrap(), b"summary-state-16");
}

// =============================================================================
// Cell I/O Tests
// =============================================================================

#[test]
fn test_cell_write_read_round_trip() {
    let (_temp, path) = setup_temp_store();

    let store = create_store(&path);
    let cell = store.allocate().unwrap();
    store.write_cell(cell, b"payload!").unwrap();

    assert_eq!(store.read_cell(cell).unwrap(), b"payload!");
}

#[test]
fn test_fresh_cell_reads_zeroed() {
    let (_temp, path) = setup_temp_store();

    let store = create_store(&path);
    let cell = store.allocate().unwrap();

    assert_eq!(store.read_cell(cell).unwrap(), vec![0u8; 8]);
}

#[test]
fn test_cells_are_independent() {
    let (_temp, path) = setup_temp_store();

    let store = create_store(&path);
    let a = store.allocate().unwrap();
    let b = store.allocate().unwrap();
    let c = store.allocate().unwrap();

    store.write_cell(a, b"cell-aaa").unwrap();
    store.write_cell(b, b"cell-bbb").unwrap();
    store.write_cell(c, b"cell-ccc").unwrap();

    assert_eq!(store.read_cell(b).unwrap(), b"cell-bbb");
    assert_eq!(store.read_cell(a).unwrap(), b"cell-aaa");
    assert_eq!(store.read_cell(c).unwrap(), b"cell-ccc");
}

#[test]
fn test_reference_past_frontier_is_invalid() {
    let (_temp, path) = setup_temp_store();

    // References are opaque, so obtain one from a store that allocated
    // further than this one.
    let other_path = path.with_extension("other");
    let other = CellStore::create(&other_path, 16, 8).unwrap();
    other.allocate().unwrap();
    other.allocate().unwrap();
    let stray = other.allocate().unwrap();
    other.close().unwrap();

    let store = create_store(&path);
    store.allocate().unwrap();

    let result = store.read_cell(stray);
    assert!(matches!(
        result,
        Err(CellarError::InvalidReference {
            reference: 3,
            allocated: 1
        })
    ));
}

// =============================================================================
// Allocation Tests
// =============================================================================

#[test]
fn test_allocate_returns_sequential_references() {
    let (_temp, path) = setup_temp_store();

    let store = create_store(&path);
    let refs: Vec<u32> = (0..4).map(|_| store.allocate().unwrap().get()).collect();

    assert_eq!(refs, vec![1, 2, 3, 4]);
    assert_eq!(store.num_cells(), 4);
}

#[test]
fn test_free_then_allocate_reuses_lifo() {
    let (_temp, path) = setup_temp_store();

    let store = create_store(&path);
    let a = store.allocate().unwrap();
    let _b = store.allocate().unwrap();
    let c = store.allocate().unwrap();

    store.free(a).unwrap();
    store.free(c).unwrap();

    // Most recently freed comes back first.
    assert_eq!(store.allocate().unwrap(), c);
    assert_eq!(store.allocate().unwrap(), a);

    // Free list drained — the frontier grows again.
    assert_eq!(store.allocate().unwrap().get(), 4);
}

#[test]
fn test_num_cells_never_decreases_on_free() {
    let (_temp, path) = setup_temp_store();

    let store = create_store(&path);
    let refs: Vec<_> = (0..5).map(|_| store.allocate().unwrap()).collect();
    assert_eq!(store.num_cells(), 5);

    for cell in refs {
        store.free(cell).unwrap();
    }
    assert_eq!(store.num_cells(), 5);
}

#[test]
fn test_free_list_survives_reopen() {
    let (_temp, path) = setup_temp_store();

    let store = create_store(&path);
    let a = store.allocate().unwrap();
    let b = store.allocate().unwrap();
    store.free(a).unwrap();
    store.free(b).unwrap();
    store.close().unwrap();

    let store = CellStore::open(&path).unwrap();
    assert_eq!(store.allocate().unwrap(), b);
    assert_eq!(store.allocate().unwrap(), a);
    assert_eq!(store.num_cells(), 2);
}

// =============================================================================
// Header Validation Tests
// =============================================================================

#[test]
fn test_open_rejects_bad_magic() {
    let (_temp, path) = setup_temp_store();

    create_store(&path).close().unwrap();

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .open(&path)
        .unwrap();
    file.seek(SeekFrom::Start(0)).unwrap();
    file.write_all(b"XXXX").unwrap();
    drop(file);

    let result = CellStore::open(&path);
    assert!(matches!(result, Err(CellarError::Corrupted(_))));
}

#[test]
fn test_open_rejects_checksum_mismatch() {
    let (_temp, path) = setup_temp_store();

    create_store(&path).close().unwrap();

    // Flip a byte inside the header body without fixing up the CRC.
    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .open(&path)
        .unwrap();
    file.seek(SeekFrom::Start(10)).unwrap();
    file.write_all(&[0xFF]).unwrap();
    drop(file);

    let result = CellStore::open(&path);
    assert!(matches!(result, Err(CellarError::Corrupted(_))));
}

#[test]
fn test_open_rejects_truncated_file() {
    let (_temp, path) = setup_temp_store();

    std::fs::write(&path, b"short").unwrap();

    let result = CellStore::open(&path);
    assert!(matches!(result, Err(CellarError::Corrupted(_))));
}
