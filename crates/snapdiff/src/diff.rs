//! Page-wise binary diff between two memory images
//!
//! A diff describes how to reconstruct `target` from `base`: one chunk per
//! changed page, with the target bytes of all changed pages concatenated into
//! a single payload. Bytes past the end of the shorter image compare as zero,
//! so growth and shrinkage fall out of the same page loop.
//!
//! Construction is two traversals: the first counts changed pages and sizes
//! the buffers, the second emits chunks. Output is exact-sized, with no
//! resizing and no dependence on allocator behavior.

use tracing::debug;

use crate::error::DiffError;

/// Diff format version emitted and accepted by this crate.
pub const DIFF_VERSION: u32 = 1;

/// Default page granularity (4 KiB).
pub const DEFAULT_PAGE_SIZE: u32 = 4096;

/// Fixed header of a diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffHeader {
    pub version: u32,
    pub page_size: u32,
    pub flags: u32,
    pub chunk_count: u32,
    pub target_length: u64,
}

/// One changed page: `length` target bytes at `payload[data_offset..]`,
/// destined for offset `page_index * page_size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    pub page_index: usize,
    pub length: usize,
    pub data_offset: usize,
}

/// A sparse, page-granular description of the bytes that differ between two
/// memory images. Owns its chunk table and payload; storage is released on
/// drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diff {
    pub(crate) header: DiffHeader,
    pub(crate) chunks: Vec<Chunk>,
    pub(crate) payload: Vec<u8>,
}

impl Diff {
    /// Compare `base` and `target` at the default page size.
    pub fn compute(base: &[u8], target: &[u8]) -> Self {
        // DEFAULT_PAGE_SIZE is a power of two, so this cannot fail.
        Self::compute_with_page_size(base, target, DEFAULT_PAGE_SIZE)
            .unwrap_or_else(|_| unreachable!("default page size is valid"))
    }

    /// Compare `base` and `target` with an explicit page granularity.
    pub fn compute_with_page_size(
        base: &[u8],
        target: &[u8],
        page_size: u32,
    ) -> Result<Self, DiffError> {
        if page_size == 0 || !page_size.is_power_of_two() {
            return Err(DiffError::InvalidPageSize { page_size });
        }
        let page = page_size as usize;
        let max_length = base.len().max(target.len());
        let total_pages = max_length.div_ceil(page);

        // First traversal: size the chunk table and payload exactly.
        let mut chunk_count = 0usize;
        let mut payload_size = 0usize;
        for page_index in 0..total_pages {
            let span = target_span(target.len(), page, page_index);
            if span > 0 && page_changed(base, target, page_index * page, span) {
                chunk_count += 1;
                payload_size += span;
            }
        }

        let mut chunks = Vec::with_capacity(chunk_count);
        let mut payload = Vec::with_capacity(payload_size);

        // Second traversal: emit in ascending page order.
        for page_index in 0..total_pages {
            let span = target_span(target.len(), page, page_index);
            let start = page_index * page;
            if span == 0 || !page_changed(base, target, start, span) {
                continue;
            }
            chunks.push(Chunk {
                page_index,
                length: span,
                data_offset: payload.len(),
            });
            payload.extend_from_slice(&target[start..start + span]);
        }

        debug!(
            base_length = base.len(),
            target_length = target.len(),
            page_size,
            chunks = chunks.len(),
            payload = payload.len(),
            "diff computed"
        );

        Ok(Self {
            header: DiffHeader {
                version: DIFF_VERSION,
                page_size,
                flags: 0,
                chunk_count: chunk_count as u32,
                target_length: target.len() as u64,
            },
            chunks,
            payload,
        })
    }

    pub fn header(&self) -> &DiffHeader {
        &self.header
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Changed page indices, ascending.
    pub fn changed_pages(&self) -> impl ExactSizeIterator<Item = usize> + '_ {
        self.chunks.iter().map(|chunk| chunk.page_index)
    }

    /// Copy the changed page indices into a caller-supplied buffer. Refuses
    /// if the buffer cannot hold every chunk.
    pub fn read_changed_set_into(&self, out: &mut [usize]) -> Result<usize, DiffError> {
        if out.len() < self.chunks.len() {
            return Err(DiffError::CapacityTooSmall {
                capacity: out.len(),
                chunk_count: self.chunks.len(),
            });
        }
        for (slot, page) in out.iter_mut().zip(self.changed_pages()) {
            *slot = page;
        }
        Ok(self.chunks.len())
    }

    /// Check every structural invariant: version, page size, chunk ordering,
    /// and chunk/payload bounds. `apply` and the wire decoder both rely on
    /// this.
    pub fn validate(&self) -> Result<(), DiffError> {
        let header = &self.header;
        if header.version != DIFF_VERSION {
            return Err(DiffError::UnsupportedVersion {
                version: header.version,
            });
        }
        if header.page_size == 0 || !header.page_size.is_power_of_two() {
            return Err(DiffError::InvalidPageSize {
                page_size: header.page_size,
            });
        }
        if self.chunks.len() != header.chunk_count as usize {
            return Err(DiffError::ChunkCountMismatch {
                expected: header.chunk_count,
                actual: self.chunks.len(),
            });
        }

        let page = header.page_size as usize;
        let mut previous: Option<usize> = None;
        for (index, chunk) in self.chunks.iter().enumerate() {
            if previous.is_some_and(|p| chunk.page_index <= p) {
                return Err(DiffError::UnsortedChunks { index });
            }
            previous = Some(chunk.page_index);

            if chunk.length > page {
                return Err(DiffError::ChunkTooLong {
                    index,
                    length: chunk.length,
                    page_size: header.page_size,
                });
            }
            let out_of_bounds = DiffError::ChunkOutOfBounds {
                index,
                target_length: header.target_length,
            };
            let start = chunk
                .page_index
                .checked_mul(page)
                .ok_or(out_of_bounds.clone())?;
            let end = start.checked_add(chunk.length).ok_or(out_of_bounds.clone())?;
            if end as u64 > header.target_length {
                return Err(out_of_bounds);
            }
            let payload_end = chunk
                .data_offset
                .checked_add(chunk.length)
                .unwrap_or(usize::MAX);
            if payload_end > self.payload.len() {
                return Err(DiffError::PayloadOutOfBounds {
                    index,
                    payload_length: self.payload.len(),
                });
            }
        }
        Ok(())
    }
}

/// Bytes of `target` covered by the given page, zero when the page lies
/// entirely past the end of the target. The diff reconstructs `target`, so
/// pages beyond it are never emitted.
fn target_span(target_length: usize, page_size: usize, page_index: usize) -> usize {
    let start = page_index * page_size;
    if start >= target_length {
        0
    } else {
        page_size.min(target_length - start)
    }
}

/// Whether the page differs between the images, treating positions past
/// either length as zero.
fn page_changed(base: &[u8], target: &[u8], start: usize, span: usize) -> bool {
    let target_page = &target[start..start + span];
    let base_end = base.len().min(start + span);
    if start < base_end {
        let base_page = &base[start..base_end];
        base_page != &target_page[..base_page.len()]
            || target_page[base_page.len()..].iter().any(|&byte| byte != 0)
    } else {
        target_page.iter().any(|&byte| byte != 0)
    }
}
