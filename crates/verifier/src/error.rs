//! Diagnostic kinds discovered during verification
//!
//! Every rule violation is a [`DiagnosticKind`]; its `Display` rendering is
//! the message text stored in the report. Formatting uses only integers and
//! fixed lookup tables, so two runs over the same stream produce byte-equal
//! messages.

use stream::{Domain, Phase};
use thiserror::Error;

/// Severity of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Severity {
    Info = 0,
    Warning = 1,
    Error = 2,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// Rule violations and advisories the verifier can emit.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DiagnosticKind {
    // Syntax
    #[error("unknown opcode {opcode:#04x}")]
    UnknownOpcode { opcode: u8 },

    #[error("truncated instruction for {name}")]
    TruncatedInstruction { name: &'static str },

    // Phase
    #[error("{name} not allowed in {phase} phase")]
    PhaseViolation { name: &'static str, phase: Phase },

    #[error("cannot BEGIN_STREAM while snapshot is active")]
    BeginStreamInSnapshot,

    #[error("cannot SUBMIT inside a snapshot")]
    SubmitInSnapshot,

    #[error("stream did not reach END_STREAM/END_PROGRAM")]
    MissingTerminator,

    // Fences
    #[error("FENCE_WAIT with no outstanding fence")]
    NoOutstandingFence,

    #[error("unknown fence id {fence}")]
    UnknownFence { fence: u32 },

    #[error("outstanding fence {fence} at end of stream")]
    OutstandingFence { fence: u32 },

    // Resource lifetime
    #[error("resource {resource} already allocated")]
    ResourceAlreadyAllocated { resource: u32 },

    #[error("resource {resource} reused after free")]
    ResourceReusedAfterFree { resource: u32 },

    #[error("{name} of unallocated resource {resource}")]
    ResourceNotAllocated { name: &'static str, resource: u32 },

    #[error("cannot {name} inside a snapshot")]
    AllocInSnapshot { name: &'static str },

    // Domains
    #[error("BARRIER on resource {resource} with pending transition; insert FENCE_WAIT first")]
    BarrierLayered { resource: u32 },

    #[error("BARRIER src domain {src} does not match resource {resource} domain {actual}")]
    DomainMismatch {
        resource: u32,
        src: Domain,
        actual: Domain,
    },

    #[error("invalid domain value {value}")]
    InvalidDomain { value: u32 },

    #[error("BARRIER issued outside device domain; assuming implicit promotion")]
    BarrierOutsideDevice,

    #[error("END_STREAM while GPU work still pending; assuming idle transition")]
    EndStreamWhilePending,

    // Snapshots
    #[error("nested SNAPSHOT_BEGIN not allowed")]
    NestedSnapshot,

    #[error("SNAPSHOT_END without SNAPSHOT_BEGIN")]
    SnapshotEndWithoutBegin,

    #[error("snapshots require host domain but current domain is {domain}")]
    SnapshotOutsideHostDomain { domain: Domain },

    #[error("persistent resource {resource} not in host domain at SNAPSHOT_BEGIN")]
    PersistentNotHost { resource: u32 },

    #[error("persistent resource {resource} has pending transition at SNAPSHOT_BEGIN")]
    PersistentPending { resource: u32 },

    #[error("unterminated snapshot region")]
    UnterminatedSnapshot,

    // Checkpoints
    #[error("duplicate checkpoint label {label}")]
    DuplicateLabel { label: u32 },
}

impl DiagnosticKind {
    /// Severity of this kind. Implicit promotions and pending-work advisories
    /// are warnings; everything else is an error.
    pub fn severity(&self) -> Severity {
        match self {
            DiagnosticKind::BarrierOutsideDevice | DiagnosticKind::EndStreamWhilePending => {
                Severity::Warning
            }
            _ => Severity::Error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DiagnosticKind, Severity};
    use stream::Domain;

    #[test]
    fn test_message_formatting() {
        assert_eq!(
            DiagnosticKind::UnknownOpcode { opcode: 0xFF }.to_string(),
            "unknown opcode 0xff"
        );
        assert_eq!(
            DiagnosticKind::SnapshotOutsideHostDomain {
                domain: Domain::Device
            }
            .to_string(),
            "snapshots require host domain but current domain is Device"
        );
        assert_eq!(
            DiagnosticKind::OutstandingFence { fence: 12 }.to_string(),
            "outstanding fence 12 at end of stream"
        );
    }

    #[test]
    fn test_severities() {
        assert_eq!(
            DiagnosticKind::BarrierOutsideDevice.severity(),
            Severity::Warning
        );
        assert_eq!(
            DiagnosticKind::EndStreamWhilePending.severity(),
            Severity::Warning
        );
        assert_eq!(
            DiagnosticKind::UnknownOpcode { opcode: 0 }.severity(),
            Severity::Error
        );
        assert_eq!(DiagnosticKind::NestedSnapshot.severity(), Severity::Error);
    }
}
