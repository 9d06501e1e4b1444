//! Page-granular snapshot diff and patch engine
//!
//! Produces compact change sets between two memory images and reconstructs
//! one from the other, so host-side snapshots can be stored sparsely and
//! replayed:
//!
//! ```
//! use snapdiff::Diff;
//!
//! let base = vec![0u8; 8192];
//! let mut target = base.clone();
//! target[5000] = 7;
//!
//! let diff = Diff::compute(&base, &target);
//! assert_eq!(diff.chunk_count(), 1);
//! assert_eq!(diff.apply(&base).unwrap(), target);
//! ```
//!
//! The engine is deterministic: the change set depends only on
//! `(base, target, page_size)`, never on allocator behavior or call order.
//! For any pair of images, `diff.apply(base)` equals `target` byte for byte.
//!
//! The independent verifier component lives in the `verifier` crate; the two
//! share no state.

mod diff;
mod error;
mod patch;
mod wire;

pub use diff::{Chunk, Diff, DiffHeader, DEFAULT_PAGE_SIZE, DIFF_VERSION};
pub use error::DiffError;
