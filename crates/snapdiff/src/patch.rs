//! Reconstruction of a target image from a base and a diff

use tracing::debug;

use crate::{diff::Diff, error::DiffError};

impl Diff {
    /// Reconstruct the target image this diff describes.
    ///
    /// The output is exactly `header.target_length` bytes: zero-filled, then
    /// overlaid with `base` (truncated to the target length), then with every
    /// chunk. Validates the diff first; a diff produced by
    /// [`Diff::compute`](Diff::compute) always passes.
    pub fn apply(&self, base: &[u8]) -> Result<Vec<u8>, DiffError> {
        self.validate()?;

        let target_length = usize::try_from(self.header.target_length).map_err(|_| {
            DiffError::ValueTooLarge {
                value: self.header.target_length,
            }
        })?;
        let page = self.header.page_size as usize;

        let mut output = vec![0u8; target_length];
        let shared = base.len().min(target_length);
        output[..shared].copy_from_slice(&base[..shared]);

        for chunk in &self.chunks {
            // Bounds established by validate().
            let start = chunk.page_index * page;
            output[start..start + chunk.length]
                .copy_from_slice(&self.payload[chunk.data_offset..chunk.data_offset + chunk.length]);
        }

        debug!(
            base_length = base.len(),
            target_length,
            chunks = self.chunks.len(),
            "patch applied"
        );
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use crate::diff::{Chunk, Diff, DiffHeader, DIFF_VERSION};
    use crate::error::DiffError;

    fn fill_pattern(buffer: &mut [u8], seed: u8) {
        for (i, byte) in buffer.iter_mut().enumerate() {
            *byte = seed.wrapping_add((i as u8).wrapping_mul(17));
        }
    }

    #[test]
    fn test_round_trip_disjoint_regions() {
        let mut base = vec![0u8; 8192];
        fill_pattern(&mut base, 1);
        let mut target = base.clone();
        fill_pattern(&mut target[1024..1152], 42);
        fill_pattern(&mut target[4096..8192], 9);

        let diff = Diff::compute(&base, &target);
        assert!(diff.chunk_count() >= 1);
        assert_eq!(diff.apply(&base).unwrap(), target);
        assert_eq!(diff.changed_pages().collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn test_patch_shrinks_output_to_target_length() {
        let base = vec![7u8; 8192];
        let target = vec![3u8; 2048];
        let diff = Diff::compute(&base, &target);
        let patched = diff.apply(&base).unwrap();
        assert_eq!(patched.len(), 2048);
        assert_eq!(patched, target);
    }

    #[test]
    fn test_patch_zero_fills_growth() {
        let base = vec![1u8; 100];
        let mut target = vec![0u8; 300];
        target[..100].copy_from_slice(&base);
        target[250..].fill(8);
        let diff = Diff::compute_with_page_size(&base, &target, 64).unwrap();
        assert_eq!(diff.apply(&base).unwrap(), target);
    }

    #[test]
    fn test_patch_empty_target() {
        let base = vec![9u8; 512];
        let diff = Diff::compute(&base, &[]);
        assert_eq!(diff.apply(&base).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_apply_rejects_chunk_past_target() {
        let diff = Diff {
            header: DiffHeader {
                version: DIFF_VERSION,
                page_size: 64,
                flags: 0,
                chunk_count: 1,
                target_length: 64,
            },
            chunks: vec![Chunk {
                page_index: 2,
                length: 64,
                data_offset: 0,
            }],
            payload: vec![0u8; 64],
        };
        assert_eq!(
            diff.apply(&[]),
            Err(DiffError::ChunkOutOfBounds {
                index: 0,
                target_length: 64,
            })
        );
    }

    #[test]
    fn test_apply_rejects_payload_overrun() {
        let diff = Diff {
            header: DiffHeader {
                version: DIFF_VERSION,
                page_size: 64,
                flags: 0,
                chunk_count: 1,
                target_length: 128,
            },
            chunks: vec![Chunk {
                page_index: 0,
                length: 64,
                data_offset: 32,
            }],
            payload: vec![0u8; 64],
        };
        assert_eq!(
            diff.apply(&[]),
            Err(DiffError::PayloadOutOfBounds {
                index: 0,
                payload_length: 64,
            })
        );
    }

    #[test]
    fn test_apply_rejects_unsorted_chunks() {
        let diff = Diff {
            header: DiffHeader {
                version: DIFF_VERSION,
                page_size: 64,
                flags: 0,
                chunk_count: 2,
                target_length: 256,
            },
            chunks: vec![
                Chunk {
                    page_index: 1,
                    length: 64,
                    data_offset: 0,
                },
                Chunk {
                    page_index: 0,
                    length: 64,
                    data_offset: 64,
                },
            ],
            payload: vec![0u8; 128],
        };
        assert_eq!(diff.apply(&[]), Err(DiffError::UnsortedChunks { index: 1 }));
    }

    #[test]
    fn test_apply_rejects_wrong_version() {
        let diff = Diff {
            header: DiffHeader {
                version: 2,
                page_size: 64,
                flags: 0,
                chunk_count: 0,
                target_length: 0,
            },
            chunks: Vec::new(),
            payload: Vec::new(),
        };
        assert_eq!(
            diff.apply(&[]),
            Err(DiffError::UnsupportedVersion { version: 2 })
        );
    }
}
