//! The abstract machine state threaded through verification
//!
//! One [`Machine`] value is allocated per `verify` call and mutated only by
//! the judgment handlers, so the state transitions stay easy to audit. All
//! containers are ordered: iteration order, and therefore diagnostic order,
//! depends only on the input stream.
//!
//! The machine is crate-private. A future multi-queue extension turns it
//! into per-queue sub-states without touching the public API.

use std::collections::{BTreeMap, BTreeSet};

use stream::{Domain, Phase};
use tracing::trace;

/// A recorded intent to move a resource between domains; committed by
/// FENCE_WAIT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Pending {
    pub src: Domain,
    pub dst: Domain,
}

/// Per-resource record. Presence in the table means the id was allocated at
/// some point; `allocated` distinguishes live resources from freed ones so
/// ids are never reused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Resource {
    pub domain: Domain,
    pub pending: Option<Pending>,
    pub allocated: bool,
    pub persist: bool,
    pub heap: u32,
}

/// A host-observable checkpoint record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Checkpoint {
    pub label: u32,
    pub heap_root: u64,
    pub pipeline_root: u64,
    pub stream_ptr: u64,
}

/// The abstract machine Γ.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Machine {
    pub phase: Phase,
    /// Stream-global coherence domain driven by the short-form ops:
    /// SUBMIT moves it to Device, FENCE_WAIT back to Host.
    pub domain: Domain,
    pub snapshot_active: bool,
    /// Outstanding fences: id -> index of the introducing SUBMIT. Fence ids
    /// equal that index, so ids are unique across the stream.
    pub fences: BTreeMap<u32, usize>,
    pub resources: BTreeMap<u32, Resource>,
    pub labels: BTreeSet<u32>,
    pub checkpoints: Vec<Checkpoint>,
}

impl Machine {
    pub fn new() -> Self {
        Self {
            phase: Phase::Build,
            domain: Domain::Host,
            snapshot_active: false,
            fences: BTreeMap::new(),
            resources: BTreeMap::new(),
            labels: BTreeSet::new(),
            checkpoints: Vec::new(),
        }
    }

    /// The most recently introduced outstanding fence, if any.
    pub fn newest_fence(&self) -> Option<u32> {
        // Ids are monotonic in the introducing instruction index.
        self.fences.keys().next_back().copied()
    }

    /// Commit every pending domain transition. Runs on FENCE_WAIT.
    pub fn commit_transitions(&mut self) {
        for (id, resource) in self.resources.iter_mut() {
            if let Some(pending) = resource.pending.take() {
                trace!(
                    resource = *id,
                    src = %pending.src,
                    dst = %pending.dst,
                    "committing domain transition"
                );
                resource.domain = pending.dst;
            }
        }
    }
}
