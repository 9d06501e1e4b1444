//! On-the-wire diff format
//!
//! ```text
//! Header:  u32 version, u32 page_size, u32 flags, u32 chunk_count,
//!          u64 target_length
//! Chunks:  chunk_count x (u64 page_index, u64 length, u64 data_offset)
//! Payload: concatenated changed-page bytes
//! ```
//!
//! All integers little-endian. The decoder re-validates every structural
//! invariant, so a hostile input can fail but never read out of bounds.

use crate::{
    diff::{Chunk, Diff, DiffHeader},
    error::DiffError,
};

const HEADER_LEN: usize = 24;
const CHUNK_LEN: usize = 24;

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

fn read_u64(bytes: &[u8], at: usize) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[at..at + 8]);
    u64::from_le_bytes(buf)
}

fn to_usize(value: u64) -> Result<usize, DiffError> {
    usize::try_from(value).map_err(|_| DiffError::ValueTooLarge { value })
}

impl Diff {
    /// Serialize to the wire format.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out =
            Vec::with_capacity(HEADER_LEN + self.chunks.len() * CHUNK_LEN + self.payload.len());
        out.extend_from_slice(&self.header.version.to_le_bytes());
        out.extend_from_slice(&self.header.page_size.to_le_bytes());
        out.extend_from_slice(&self.header.flags.to_le_bytes());
        out.extend_from_slice(&self.header.chunk_count.to_le_bytes());
        out.extend_from_slice(&self.header.target_length.to_le_bytes());
        for chunk in &self.chunks {
            out.extend_from_slice(&(chunk.page_index as u64).to_le_bytes());
            out.extend_from_slice(&(chunk.length as u64).to_le_bytes());
            out.extend_from_slice(&(chunk.data_offset as u64).to_le_bytes());
        }
        out.extend_from_slice(&self.payload);
        out
    }

    /// Parse and validate a wire-format diff.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DiffError> {
        if bytes.len() < HEADER_LEN {
            return Err(DiffError::Truncated {
                needed: HEADER_LEN,
                available: bytes.len(),
            });
        }
        let header = DiffHeader {
            version: read_u32(bytes, 0),
            page_size: read_u32(bytes, 4),
            flags: read_u32(bytes, 8),
            chunk_count: read_u32(bytes, 12),
            target_length: read_u64(bytes, 16),
        };

        let chunk_count = header.chunk_count as usize;
        let chunks_end = chunk_count
            .checked_mul(CHUNK_LEN)
            .and_then(|len| len.checked_add(HEADER_LEN))
            .ok_or(DiffError::ValueTooLarge {
                value: header.chunk_count as u64,
            })?;
        if bytes.len() < chunks_end {
            return Err(DiffError::Truncated {
                needed: chunks_end,
                available: bytes.len(),
            });
        }

        let mut chunks = Vec::with_capacity(chunk_count);
        for index in 0..chunk_count {
            let at = HEADER_LEN + index * CHUNK_LEN;
            chunks.push(Chunk {
                page_index: to_usize(read_u64(bytes, at))?,
                length: to_usize(read_u64(bytes, at + 8))?,
                data_offset: to_usize(read_u64(bytes, at + 16))?,
            });
        }

        let diff = Self {
            header,
            chunks,
            payload: bytes[chunks_end..].to_vec(),
        };
        diff.validate()?;
        Ok(diff)
    }
}

#[cfg(test)]
mod tests {
    use crate::diff::Diff;
    use crate::error::DiffError;

    fn sample_diff() -> Diff {
        let base = vec![0u8; 300];
        let mut target = vec![0u8; 300];
        target[0] = 1;
        target[290] = 2;
        Diff::compute_with_page_size(&base, &target, 128).unwrap()
    }

    #[test]
    fn test_wire_round_trip() {
        let diff = sample_diff();
        let decoded = Diff::from_bytes(&diff.to_bytes()).unwrap();
        assert_eq!(decoded, diff);
    }

    #[test]
    fn test_wire_layout() {
        let diff = sample_diff();
        let bytes = diff.to_bytes();
        assert_eq!(bytes.len(), 24 + diff.chunk_count() * 24 + diff.payload().len());
        // version, page_size
        assert_eq!(&bytes[0..4], &1u32.to_le_bytes());
        assert_eq!(&bytes[4..8], &128u32.to_le_bytes());
        // target_length
        assert_eq!(&bytes[16..24], &300u64.to_le_bytes());
    }

    #[test]
    fn test_truncated_header_rejected() {
        let err = Diff::from_bytes(&[0u8; 10]).unwrap_err();
        assert_eq!(
            err,
            DiffError::Truncated {
                needed: 24,
                available: 10,
            }
        );
    }

    #[test]
    fn test_truncated_chunk_table_rejected() {
        let diff = sample_diff();
        let bytes = diff.to_bytes();
        let err = Diff::from_bytes(&bytes[..30]).unwrap_err();
        assert!(matches!(err, DiffError::Truncated { .. }));
    }

    #[test]
    fn test_bad_version_rejected() {
        let diff = sample_diff();
        let mut bytes = diff.to_bytes();
        bytes[0] = 9;
        assert_eq!(
            Diff::from_bytes(&bytes).unwrap_err(),
            DiffError::UnsupportedVersion { version: 9 }
        );
    }

    #[test]
    fn test_corrupt_chunk_bounds_rejected() {
        let diff = sample_diff();
        let mut bytes = diff.to_bytes();
        // First chunk's page_index, little-endian u64 at offset 24.
        bytes[24] = 0xFF;
        let err = Diff::from_bytes(&bytes).unwrap_err();
        assert!(matches!(
            err,
            DiffError::ChunkOutOfBounds { .. } | DiffError::UnsortedChunks { .. }
        ));
    }

    #[test]
    fn test_empty_diff_round_trip() {
        let diff = Diff::compute(&[1, 2, 3], &[1, 2, 3]);
        let decoded = Diff::from_bytes(&diff.to_bytes()).unwrap();
        assert_eq!(decoded.chunk_count(), 0);
        assert_eq!(decoded.apply(&[1, 2, 3]).unwrap(), vec![1, 2, 3]);
    }
}
