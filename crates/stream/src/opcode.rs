//! Static opcode metadata for the GDSL instruction set
//!
//! Single source of truth for opcode names, fixed instruction sizes, and
//! phase-validity sets, consulted by the verifier on every instruction. The
//! table is statically initialized and read-only after program start.
//!
//! Instruction sizes are fixed in v1; there is no variable-length encoding.
//! `FENCE_WAIT` and `BARRIER` each have two encodings: the legacy one-byte
//! short form and an operand-carrying long form under a separate opcode byte.
//! Both encodings share the mnemonic, the way short/long encodings do in real
//! instruction sets.

use lazy_static::lazy_static;

use crate::phase::{Phase, PhaseSet};

/// Opcode byte values.
pub mod op {
    pub const NOP: u8 = 0x00;
    pub const BEGIN_STREAM: u8 = 0x01;
    /// Short form: stream-global domain barrier.
    pub const BARRIER: u8 = 0x02;
    pub const SUBMIT: u8 = 0x03;
    /// Short form: waits the newest outstanding fence.
    pub const FENCE_WAIT: u8 = 0x04;
    pub const END_STREAM: u8 = 0x05;
    pub const END_PROGRAM: u8 = 0x06;
    pub const SNAPSHOT_BEGIN: u8 = 0x07;
    pub const SNAPSHOT_END: u8 = 0x08;
    pub const CHECKPOINT: u8 = 0x09;
    /// Long form: 4-byte fence id operand.
    pub const FENCE_WAIT_ID: u8 = 0x0A;
    /// Long form: resource id, src domain, dst domain operands.
    pub const BARRIER_RES: u8 = 0x0B;
    pub const ALLOC_BUFFER: u8 = 0x0C;
    pub const ALLOC_IMAGE: u8 = 0x0D;
    pub const FREE_BUFFER: u8 = 0x0E;
    pub const FREE_IMAGE: u8 = 0x0F;
    pub const ASSERT_IDLE: u8 = 0x10;

    pub const DRAW: u8 = 0x20;
    pub const DISPATCH: u8 = 0x21;
    pub const COPY_BUFFER: u8 = 0x22;
    pub const COPY_IMAGE: u8 = 0x23;
    pub const CLEAR: u8 = 0x24;
    pub const BIND_PIPE: u8 = 0x25;
    pub const BIND_BUFFER: u8 = 0x26;
    pub const BIND_IMAGE: u8 = 0x27;
    pub const SET_VIEWPORT: u8 = 0x28;
    pub const SET_SCISSOR: u8 = 0x29;
    pub const PUSH_CONST: u8 = 0x2A;
    pub const BEGIN_PASS: u8 = 0x2B;
    pub const END_PASS: u8 = 0x2C;
    pub const EVENT_SIGNAL: u8 = 0x2D;
    pub const EVENT_WAIT: u8 = 0x2E;
    pub const QUERY_BEGIN: u8 = 0x2F;
    pub const QUERY_END: u8 = 0x30;
    pub const UPLOAD: u8 = 0x31;
    pub const DOWNLOAD: u8 = 0x32;
    pub const PIPE_CREATE: u8 = 0x33;
    pub const PIPE_DESTROY: u8 = 0x34;
    pub const MARKER_PUSH: u8 = 0x35;
    pub const MARKER_POP: u8 = 0x36;
    pub const LOG: u8 = 0x37;
    pub const TIMESTAMP: u8 = 0x38;
    pub const SLEEP_MS: u8 = 0x39;

    pub const CONST_I32: u8 = 0x40;
    pub const CONST_F32: u8 = 0x41;
    pub const ADD: u8 = 0x42;
    pub const SUB: u8 = 0x43;
    pub const MUL: u8 = 0x44;
    pub const DIV: u8 = 0x45;
    pub const IF_EQ: u8 = 0x46;
    pub const IF_NE: u8 = 0x47;
    pub const ELSE: u8 = 0x48;
    pub const ENDIF: u8 = 0x49;
    pub const LOOP: u8 = 0x4A;
    pub const ENDLOOP: u8 = 0x4B;
    pub const CALL: u8 = 0x4C;
    pub const RET: u8 = 0x4D;
    pub const INCLUDE: u8 = 0x4E;
}

/// First byte of the range reserved for vendor extensions.
pub const VENDOR_RANGE_START: u8 = 0xC0;

/// Metadata for one opcode byte.
#[derive(Debug, Clone, Copy)]
pub struct OpcodeInfo {
    /// Mnemonic used in diagnostics.
    pub name: &'static str,
    /// Total instruction size in bytes, opcode byte included.
    pub size: usize,
    /// Phases in which the opcode is accepted.
    pub phases: PhaseSet,
}

const RECORD: PhaseSet = PhaseSet::NONE.with(Phase::Record);
const IDLE: PhaseSet = PhaseSet::NONE.with(Phase::Idle);
const SUBMITTED: PhaseSet = PhaseSet::NONE.with(Phase::Submitted);
const RECORD_IDLE: PhaseSet = RECORD.with(Phase::Idle);
const BUILD_IDLE: PhaseSet = PhaseSet::NONE.with(Phase::Build).with(Phase::Idle);
const IDLE_FINISHED: PhaseSet = IDLE.with(Phase::Finished);

/// The opcode universe: (byte, mnemonic, size, validity set).
const ENTRIES: &[(u8, &str, usize, PhaseSet)] = &[
    (op::NOP, "NOP", 1, RECORD_IDLE),
    (op::BEGIN_STREAM, "BEGIN_STREAM", 1, BUILD_IDLE),
    (op::BARRIER, "BARRIER", 1, RECORD),
    (op::SUBMIT, "SUBMIT", 1, RECORD),
    (op::FENCE_WAIT, "FENCE_WAIT", 1, SUBMITTED),
    (op::END_STREAM, "END_STREAM", 1, RECORD_IDLE),
    (op::END_PROGRAM, "END_PROGRAM", 1, IDLE_FINISHED),
    (op::SNAPSHOT_BEGIN, "SNAPSHOT_BEGIN", 1, IDLE),
    (op::SNAPSHOT_END, "SNAPSHOT_END", 1, IDLE),
    // label u32 + heap root u64 + pipeline root u64 + stream ptr u64
    (op::CHECKPOINT, "CHECKPOINT", 29, IDLE),
    (op::FENCE_WAIT_ID, "FENCE_WAIT", 5, SUBMITTED),
    // resource u32 + src u32 + dst u32
    (op::BARRIER_RES, "BARRIER", 13, RECORD),
    // resource u32 + heap u32 + size u64 + usage/format u32 + flags u32
    (op::ALLOC_BUFFER, "ALLOC_BUFFER", 25, RECORD_IDLE),
    (op::ALLOC_IMAGE, "ALLOC_IMAGE", 25, RECORD_IDLE),
    (op::FREE_BUFFER, "FREE_BUFFER", 5, RECORD_IDLE),
    (op::FREE_IMAGE, "FREE_IMAGE", 5, RECORD_IDLE),
    (op::ASSERT_IDLE, "ASSERT_IDLE", 1, IDLE),
    (op::DRAW, "DRAW", 1, RECORD),
    (op::DISPATCH, "DISPATCH", 1, RECORD),
    (op::COPY_BUFFER, "COPY_BUFFER", 1, RECORD),
    (op::COPY_IMAGE, "COPY_IMAGE", 1, RECORD),
    (op::CLEAR, "CLEAR", 1, RECORD),
    (op::BIND_PIPE, "BIND_PIPE", 1, RECORD),
    (op::BIND_BUFFER, "BIND_BUFFER", 1, RECORD),
    (op::BIND_IMAGE, "BIND_IMAGE", 1, RECORD),
    (op::SET_VIEWPORT, "SET_VIEWPORT", 1, RECORD),
    (op::SET_SCISSOR, "SET_SCISSOR", 1, RECORD),
    (op::PUSH_CONST, "PUSH_CONST", 1, RECORD),
    (op::BEGIN_PASS, "BEGIN_PASS", 1, RECORD),
    (op::END_PASS, "END_PASS", 1, RECORD),
    (op::EVENT_SIGNAL, "EVENT_SIGNAL", 1, RECORD),
    (op::EVENT_WAIT, "EVENT_WAIT", 1, RECORD),
    (op::QUERY_BEGIN, "QUERY_BEGIN", 1, RECORD),
    (op::QUERY_END, "QUERY_END", 1, RECORD),
    (op::UPLOAD, "UPLOAD", 1, RECORD_IDLE),
    (op::DOWNLOAD, "DOWNLOAD", 1, IDLE),
    (op::PIPE_CREATE, "PIPE_CREATE", 1, RECORD_IDLE),
    (op::PIPE_DESTROY, "PIPE_DESTROY", 1, RECORD_IDLE),
    (op::MARKER_PUSH, "MARKER_PUSH", 1, RECORD_IDLE),
    (op::MARKER_POP, "MARKER_POP", 1, RECORD_IDLE),
    (op::LOG, "LOG", 1, RECORD_IDLE),
    (op::TIMESTAMP, "TIMESTAMP", 1, RECORD_IDLE),
    (op::SLEEP_MS, "SLEEP_MS", 1, RECORD_IDLE),
    (op::CONST_I32, "CONST_I32", 1, RECORD),
    (op::CONST_F32, "CONST_F32", 1, RECORD),
    (op::ADD, "ADD", 1, RECORD),
    (op::SUB, "SUB", 1, RECORD),
    (op::MUL, "MUL", 1, RECORD),
    (op::DIV, "DIV", 1, RECORD),
    (op::IF_EQ, "IF_EQ", 1, RECORD),
    (op::IF_NE, "IF_NE", 1, RECORD),
    (op::ELSE, "ELSE", 1, RECORD),
    (op::ENDIF, "ENDIF", 1, RECORD),
    (op::LOOP, "LOOP", 1, RECORD),
    (op::ENDLOOP, "ENDLOOP", 1, RECORD),
    (op::CALL, "CALL", 1, RECORD),
    (op::RET, "RET", 1, RECORD),
    (op::INCLUDE, "INCLUDE", 1, RECORD),
];

lazy_static! {
    /// 256-entry opcode table; `None` marks an unknown opcode.
    static ref TABLE: [Option<OpcodeInfo>; 256] = build_table();
}

fn build_table() -> [Option<OpcodeInfo>; 256] {
    let mut table = [None; 256];
    for &(byte, name, size, phases) in ENTRIES {
        debug_assert!(table[byte as usize].is_none(), "duplicate opcode byte");
        table[byte as usize] = Some(OpcodeInfo { name, size, phases });
    }
    table
}

/// Look up the metadata for an opcode byte.
///
/// Returns `None` for unassigned bytes and the vendor-reserved range
/// `0xC0..=0xFF`.
pub fn lookup(opcode: u8) -> Option<&'static OpcodeInfo> {
    TABLE[opcode as usize].as_ref()
}

#[cfg(test)]
mod tests {
    use super::{lookup, op, VENDOR_RANGE_START};
    use crate::phase::Phase;

    #[test]
    fn test_core_opcodes_are_one_byte() {
        for byte in [
            op::NOP,
            op::BEGIN_STREAM,
            op::BARRIER,
            op::SUBMIT,
            op::FENCE_WAIT,
            op::END_STREAM,
            op::END_PROGRAM,
            op::SNAPSHOT_BEGIN,
            op::SNAPSHOT_END,
        ] {
            assert_eq!(lookup(byte).unwrap().size, 1, "opcode {byte:#04x}");
        }
    }

    #[test]
    fn test_long_form_sizes() {
        assert_eq!(lookup(op::CHECKPOINT).unwrap().size, 29);
        assert_eq!(lookup(op::FENCE_WAIT_ID).unwrap().size, 5);
        assert_eq!(lookup(op::BARRIER_RES).unwrap().size, 13);
        assert_eq!(lookup(op::ALLOC_BUFFER).unwrap().size, 25);
        assert_eq!(lookup(op::ALLOC_IMAGE).unwrap().size, 25);
        assert_eq!(lookup(op::FREE_BUFFER).unwrap().size, 5);
        assert_eq!(lookup(op::FREE_IMAGE).unwrap().size, 5);
    }

    #[test]
    fn test_short_and_long_forms_share_mnemonics() {
        assert_eq!(lookup(op::FENCE_WAIT).unwrap().name, "FENCE_WAIT");
        assert_eq!(lookup(op::FENCE_WAIT_ID).unwrap().name, "FENCE_WAIT");
        assert_eq!(lookup(op::BARRIER).unwrap().name, "BARRIER");
        assert_eq!(lookup(op::BARRIER_RES).unwrap().name, "BARRIER");
    }

    #[test]
    fn test_only_fence_wait_valid_in_submitted() {
        for byte in 0u8..=255 {
            let Some(info) = lookup(byte) else { continue };
            let expected = byte == op::FENCE_WAIT || byte == op::FENCE_WAIT_ID;
            assert_eq!(
                info.phases.contains(Phase::Submitted),
                expected,
                "opcode {byte:#04x} ({})",
                info.name
            );
        }
    }

    #[test]
    fn test_only_begin_stream_valid_in_build() {
        for byte in 0u8..=255 {
            let Some(info) = lookup(byte) else { continue };
            assert_eq!(
                info.phases.contains(Phase::Build),
                byte == op::BEGIN_STREAM,
                "opcode {byte:#04x} ({})",
                info.name
            );
        }
    }

    #[test]
    fn test_vendor_range_is_unknown() {
        for byte in VENDOR_RANGE_START..=0xFF {
            assert!(lookup(byte).is_none(), "opcode {byte:#04x}");
        }
    }

    #[test]
    fn test_unassigned_bytes_are_unknown() {
        assert!(lookup(0x11).is_none());
        assert!(lookup(0x3A).is_none());
        assert!(lookup(0x4F).is_none());
        assert!(lookup(0xBF).is_none());
    }
}
