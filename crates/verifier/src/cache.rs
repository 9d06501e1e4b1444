//! Verified-report cache
//!
//! Re-verifying a stream that has not changed is pure waste: the report is a
//! deterministic function of `(stream, options)`. The cache keys reports by
//! a SHA-256 digest of both, with LRU eviction so long-running hosts do not
//! accumulate reports without bound.

use std::sync::Arc;

use moka::sync::Cache;
use sha2::{Digest, Sha256};

use crate::{options::VerifyOptions, report::Report};

/// Number of reports retained before LRU eviction.
const DEFAULT_CAPACITY: u64 = 128;

pub(crate) struct ReportCache {
    reports: Cache<[u8; 32], Arc<Report>>,
}

impl ReportCache {
    pub fn new() -> Self {
        Self {
            reports: Cache::builder().max_capacity(DEFAULT_CAPACITY).build(),
        }
    }

    /// Digest of everything the report depends on. The stream length is
    /// hashed ahead of the bytes so option bytes can never be confused with
    /// stream content.
    pub fn key(stream: &[u8], options: &VerifyOptions) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update([
            options.level as u8,
            options.ignore_unknown_opcodes as u8,
            options.continue_on_error as u8,
        ]);
        hasher.update((stream.len() as u64).to_le_bytes());
        hasher.update(stream);
        hasher.finalize().into()
    }

    pub fn get(&self, key: &[u8; 32]) -> Option<Arc<Report>> {
        self.reports.get(key)
    }

    pub fn insert(&self, key: [u8; 32], report: Arc<Report>) {
        self.reports.insert(key, report);
    }
}
