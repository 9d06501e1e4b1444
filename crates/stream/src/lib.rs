//! GDSL binary stream model
//!
//! Shared foundation for the verifier: the opcode table (names, fixed
//! instruction sizes, phase-validity sets), the phase/domain model of the
//! abstract machine, and instruction decoding.
//!
//! Streams are consumed through [`StreamCursor`], which never fails: unknown
//! opcodes and truncated instructions are ordinary items so callers can
//! report them and continue.

pub mod instr;
pub mod opcode;
pub mod phase;

pub use instr::{Decoded, Instr, StreamCursor, FLAG_PERSIST};
pub use opcode::{lookup, op, OpcodeInfo, VENDOR_RANGE_START};
pub use phase::{Domain, Phase, PhaseSet};
