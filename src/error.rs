//! Error types for Cellar
//!
//! Provides a unified error type for all operations.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using CellarError
pub type Result<T> = std::result::Result<T, CellarError>;

/// Unified error type for Cellar operations
#[derive(Debug, Error)]
pub enum CellarError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Store Errors
    // -------------------------------------------------------------------------
    #[error("store file already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("store file not found: {0}")]
    NotFound(PathBuf),

    #[error("corrupted store file: {0}")]
    Corrupted(String),

    #[error("invalid cell reference {reference} ({allocated} cells allocated)")]
    InvalidReference { reference: u32, allocated: u32 },

    // -------------------------------------------------------------------------
    // List Errors
    // -------------------------------------------------------------------------
    #[error("list is empty")]
    EmptyList,

    #[error("position {position} out of range for list of length {len}")]
    OutOfRange { position: u64, len: u64 },
}
