//! Phase and domain model for the GDSL abstract machine
//!
//! A stream drives the device through a small state machine of [`Phase`]s,
//! and every resource lives in a coherence [`Domain`]. Both enums have fixed
//! numeric encodings shared with the binary stream format.

use std::fmt;

/// Operational phase of the abstract machine.
///
/// `Build` is the initial phase and `Finished` the terminal one; neither is a
/// target of user-visible transitions other than the first `BEGIN_STREAM` and
/// the final `END_STREAM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Phase {
    /// Before the first BEGIN_STREAM.
    Build = 0,
    /// Between BEGIN_STREAM and SUBMIT: commands are being recorded.
    Record = 1,
    /// After SUBMIT: a fence is outstanding, the device notionally working.
    Submitted = 2,
    /// After FENCE_WAIT: no device work in flight, safe for snapshots.
    Idle = 3,
    /// After the terminating END_STREAM.
    Finished = 4,
}

impl Phase {
    /// Fixed display name used in diagnostics.
    pub const fn name(self) -> &'static str {
        match self {
            Phase::Build => "Build",
            Phase::Record => "Record",
            Phase::Submitted => "Submitted",
            Phase::Idle => "Idle",
            Phase::Finished => "Finished",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Coherence domain of a resource, or of the stream as a whole.
///
/// The numeric values are the wire encoding used by the long-form BARRIER
/// operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u32)]
pub enum Domain {
    /// CPU-only access.
    Host = 0,
    /// GPU-only access.
    Device = 1,
    /// Both sides may access.
    Coherent = 2,
}

impl Domain {
    /// Fixed display name used in diagnostics.
    pub const fn name(self) -> &'static str {
        match self {
            Domain::Host => "Host",
            Domain::Device => "Device",
            Domain::Coherent => "Coherent",
        }
    }

    /// Decode a wire-encoded domain operand.
    pub fn from_wire(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(Domain::Host),
            1 => Some(Domain::Device),
            2 => Some(Domain::Coherent),
            _ => None,
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Set of phases in which an opcode is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseSet(u8);

impl PhaseSet {
    /// The empty set. Submitted-phase opcodes other than FENCE_WAIT use this:
    /// the host must wait before issuing anything else.
    pub const NONE: Self = Self(0);

    /// Returns the set extended with `phase`.
    pub const fn with(self, phase: Phase) -> Self {
        Self(self.0 | 1 << phase as u8)
    }

    /// Whether `phase` is a member.
    pub const fn contains(self, phase: Phase) -> bool {
        self.0 & (1 << phase as u8) != 0
    }
}
