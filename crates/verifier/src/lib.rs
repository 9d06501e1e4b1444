//! Verifier for GDSL command streams
//!
//! Decides, before any hardware touches a stream, whether it obeys the
//! abstract-machine semantics that guarantee snapshot safety: at every
//! host-observable checkpoint, persistent resources are coherent and
//! host-readable, with no GPU work in flight and no deferred domain
//! transitions outstanding.
//!
//! # Rule families by conformance level
//!
//! | Level | Checks |
//! |-------|--------|
//! | **Syntax** | Opcode recognition, instruction bounds, truncation |
//! | **Phase** | Phase-validity per opcode, fence balance, terminal state |
//! | **Domain** | Barrier preconditions, resource lifetimes, snapshot safety |
//!
//! The verifier is a pure single pass: one [`Report`] per call, derived only
//! from the stream bytes and the [`VerifyOptions`]. Diagnostics are appended
//! in instruction order and the pass continues past errors by default to
//! surface as many findings as the report can hold.

mod cache;
mod error;
mod machine;
mod options;
mod report;
mod verify;

pub use error::{DiagnosticKind, Severity};
pub use options::{Level, VerifyOptions};
pub use report::{Diagnostic, Report, MAX_DIAGNOSTICS};
pub use verify::{verify, Verifier};
