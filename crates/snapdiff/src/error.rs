//! Error types for the diff engine

use thiserror::Error;

/// Errors from diff construction, validation, patching, and the wire codec.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DiffError {
    #[error("page size {page_size} is not a non-zero power of two")]
    InvalidPageSize { page_size: u32 },

    #[error("unsupported diff version {version}")]
    UnsupportedVersion { version: u32 },

    #[error("diff input truncated: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },

    #[error("header names {expected} chunks but {actual} are present")]
    ChunkCountMismatch { expected: u32, actual: usize },

    #[error("chunks not sorted by page index at chunk {index}")]
    UnsortedChunks { index: usize },

    #[error("chunk {index} length {length} exceeds page size {page_size}")]
    ChunkTooLong {
        index: usize,
        length: usize,
        page_size: u32,
    },

    #[error("chunk {index} writes past target length {target_length}")]
    ChunkOutOfBounds { index: usize, target_length: u64 },

    #[error("chunk {index} reads past payload length {payload_length}")]
    PayloadOutOfBounds { index: usize, payload_length: usize },

    #[error("changed-set capacity {capacity} below chunk count {chunk_count}")]
    CapacityTooSmall {
        capacity: usize,
        chunk_count: usize,
    },

    #[error("value {value} does not fit in this platform's address space")]
    ValueTooLarge { value: u64 },
}
