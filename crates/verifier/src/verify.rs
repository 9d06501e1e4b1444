//! Single-pass interpretation of GDSL command streams
//!
//! Runs every instruction through its judgment rule, mutating the abstract
//! machine and appending diagnostics to the report. State transitions are
//! applied even when a rule errored, mirroring the device runtime, so one
//! mistake does not cascade into spurious diagnostics downstream.
//!
//! Verification is pure on `(stream, options)`: no clock, no environment, no
//! process-global mutable state. Two calls with identical inputs produce
//! byte-identical reports.

use std::sync::Arc;

use stream::{Decoded, Domain, Instr, OpcodeInfo, Phase, StreamCursor, FLAG_PERSIST};
use tracing::{debug, trace};

use crate::{
    cache::ReportCache,
    error::{DiagnosticKind, Severity},
    machine::{Checkpoint, Machine, Pending, Resource},
    options::{Level, VerifyOptions},
    report::Report,
};

/// Verify a stream at the given conformance level with default options.
pub fn verify(stream: &[u8], level: Level) -> Report {
    run(stream, &VerifyOptions::with_level(level))
}

/// Reusable verifier holding options and the verified-hash fast path.
pub struct Verifier {
    options: VerifyOptions,
    cache: ReportCache,
}

impl Verifier {
    pub fn new(options: VerifyOptions) -> Self {
        Self {
            options,
            cache: ReportCache::new(),
        }
    }

    pub fn options(&self) -> &VerifyOptions {
        &self.options
    }

    /// Run the full single pass. Pure; never consults the cache.
    pub fn verify(&self, stream: &[u8]) -> Report {
        run(stream, &self.options)
    }

    /// Verify with the content-hash fast path: a stream already verified
    /// under these options returns its cached report without re-running the
    /// pass. `force_reverify` bypasses the lookup but refreshes the entry.
    pub fn verify_cached(&self, stream: &[u8]) -> Arc<Report> {
        let key = ReportCache::key(stream, &self.options);
        if !self.options.force_reverify {
            if let Some(report) = self.cache.get(&key) {
                debug!(length = stream.len(), "verified-hash cache hit");
                return report;
            }
        }
        let report = Arc::new(run(stream, &self.options));
        self.cache.insert(key, Arc::clone(&report));
        report
    }
}

pub(crate) fn run(stream: &[u8], options: &VerifyOptions) -> Report {
    debug!(
        length = stream.len(),
        level = ?options.level,
        "verifying stream"
    );

    let mut interp = Interp {
        options,
        machine: Machine::new(),
        report: Report::default(),
        stopped: false,
    };

    let mut cursor = StreamCursor::new(stream);
    while let Some((index, item)) = cursor.next() {
        match item {
            Decoded::Unknown { opcode } => {
                if options.ignore_unknown_opcodes {
                    interp.report.instruction_count += 1;
                } else {
                    interp.emit(index, DiagnosticKind::UnknownOpcode { opcode });
                }
            }
            Decoded::Truncated { info } => {
                interp.emit(index, DiagnosticKind::TruncatedInstruction { name: info.name });
                break;
            }
            Decoded::Instr { info, instr } => {
                interp.report.instruction_count += 1;
                interp.apply(index, info, instr);
            }
        }
        if interp.stopped {
            break;
        }
    }

    if !interp.stopped {
        interp.terminal_checks(cursor.next_index());
    }

    let mut report = interp.report;
    report.finalize();
    debug!(
        instructions = report.instruction_count,
        errors = report.error_count,
        warnings = report.warning_count,
        "verification finished"
    );
    report
}

/// One in-flight verification pass over a single stream.
struct Interp<'a> {
    options: &'a VerifyOptions,
    machine: Machine,
    report: Report,
    stopped: bool,
}

impl Interp<'_> {
    fn emit(&mut self, index: usize, kind: DiagnosticKind) {
        let severity = self.report.push(index, &kind);
        if severity == Severity::Error && !self.options.continue_on_error {
            self.stopped = true;
        }
    }

    fn phase_rules(&self) -> bool {
        self.options.level >= Level::Phase
    }

    fn domain_rules(&self) -> bool {
        self.options.level >= Level::Domain
    }

    /// Generic phase-validity check against the opcode table.
    fn require_phase(&mut self, index: usize, info: &'static OpcodeInfo) {
        if self.phase_rules() && !info.phases.contains(self.machine.phase) {
            self.emit(
                index,
                DiagnosticKind::PhaseViolation {
                    name: info.name,
                    phase: self.machine.phase,
                },
            );
        }
    }

    fn apply(&mut self, index: usize, info: &'static OpcodeInfo, instr: Instr) {
        match instr {
            Instr::BeginStream => {
                if self.phase_rules() && self.machine.snapshot_active {
                    self.emit(index, DiagnosticKind::BeginStreamInSnapshot);
                }
                self.require_phase(index, info);
                self.machine.phase = Phase::Record;
            }

            Instr::Barrier => {
                self.require_phase(index, info);
                if self.domain_rules() && self.machine.domain != Domain::Device {
                    self.emit(index, DiagnosticKind::BarrierOutsideDevice);
                }
                self.machine.domain = Domain::Device;
            }

            Instr::Submit => {
                self.require_phase(index, info);
                if self.phase_rules() && self.machine.snapshot_active {
                    self.emit(index, DiagnosticKind::SubmitInSnapshot);
                }
                // Fresh fence id, derived from the instruction index.
                self.machine.fences.insert(index as u32, index);
                self.machine.phase = Phase::Submitted;
                self.machine.domain = Domain::Device;
            }

            Instr::FenceWait => {
                self.require_phase(index, info);
                if self.phase_rules() && self.machine.fences.is_empty() {
                    self.emit(index, DiagnosticKind::NoOutstandingFence);
                }
                if let Some(fence) = self.machine.newest_fence() {
                    self.machine.fences.remove(&fence);
                }
                self.fence_waited();
            }

            Instr::FenceWaitId { fence } => {
                self.require_phase(index, info);
                if self.phase_rules() && !self.machine.fences.contains_key(&fence) {
                    self.emit(index, DiagnosticKind::UnknownFence { fence });
                }
                self.machine.fences.remove(&fence);
                self.fence_waited();
            }

            Instr::EndStream => {
                self.require_phase(index, info);
                if self.domain_rules() && self.machine.phase == Phase::Record {
                    self.emit(index, DiagnosticKind::EndStreamWhilePending);
                }
                self.machine.phase = Phase::Finished;
            }

            Instr::EndProgram => {
                self.require_phase(index, info);
            }

            Instr::SnapshotBegin => {
                self.require_phase(index, info);
                if self.domain_rules() {
                    if self.machine.snapshot_active {
                        self.emit(index, DiagnosticKind::NestedSnapshot);
                    }
                    if self.machine.domain != Domain::Host {
                        self.emit(
                            index,
                            DiagnosticKind::SnapshotOutsideHostDomain {
                                domain: self.machine.domain,
                            },
                        );
                    }
                    self.check_persistent_resources(index);
                }
                self.machine.snapshot_active = true;
            }

            Instr::SnapshotEnd => {
                self.require_phase(index, info);
                if self.domain_rules() && !self.machine.snapshot_active {
                    self.emit(index, DiagnosticKind::SnapshotEndWithoutBegin);
                }
                self.machine.snapshot_active = false;
            }

            Instr::Checkpoint {
                label,
                heap_root,
                pipeline_root,
                stream_ptr,
            } => {
                self.require_phase(index, info);
                if self.domain_rules() && self.machine.labels.contains(&label) {
                    self.emit(index, DiagnosticKind::DuplicateLabel { label });
                }
                if self.machine.labels.insert(label) {
                    let record = Checkpoint {
                        label,
                        heap_root,
                        pipeline_root,
                        stream_ptr,
                    };
                    trace!(
                        label = record.label,
                        heap_root = record.heap_root,
                        pipeline_root = record.pipeline_root,
                        stream_ptr = record.stream_ptr,
                        "checkpoint registered"
                    );
                    self.machine.checkpoints.push(record);
                }
            }

            Instr::AllocBuffer {
                resource,
                heap,
                flags,
                ..
            }
            | Instr::AllocImage {
                resource,
                heap,
                flags,
                ..
            } => self.alloc(index, info, resource, heap, flags),

            Instr::FreeBuffer { resource } | Instr::FreeImage { resource } => {
                self.require_phase(index, info);
                let freed = match self.machine.resources.get_mut(&resource) {
                    Some(record) if record.allocated => {
                        record.allocated = false;
                        true
                    }
                    _ => false,
                };
                if !freed && self.domain_rules() {
                    self.emit(
                        index,
                        DiagnosticKind::ResourceNotAllocated {
                            name: info.name,
                            resource,
                        },
                    );
                }
            }

            Instr::BarrierRes { resource, src, dst } => {
                self.barrier_resource(index, info, resource, src, dst)
            }

            Instr::Nop | Instr::AssertIdle | Instr::Passive(_) => {
                self.require_phase(index, info);
            }
        }
    }

    /// FENCE_WAIT aftermath shared by both encodings: deferred domain
    /// transitions become effective and the machine goes idle.
    fn fence_waited(&mut self) {
        self.machine.commit_transitions();
        self.machine.phase = Phase::Idle;
        self.machine.domain = Domain::Host;
    }

    fn alloc(
        &mut self,
        index: usize,
        info: &'static OpcodeInfo,
        resource: u32,
        heap: u32,
        flags: u32,
    ) {
        self.require_phase(index, info);
        if self.domain_rules() && self.machine.snapshot_active {
            self.emit(index, DiagnosticKind::AllocInSnapshot { name: info.name });
        }
        let live = self.machine.resources.get(&resource).map(|r| r.allocated);
        match live {
            Some(true) => {
                if self.domain_rules() {
                    self.emit(index, DiagnosticKind::ResourceAlreadyAllocated { resource });
                }
            }
            Some(false) => {
                if self.domain_rules() {
                    self.emit(index, DiagnosticKind::ResourceReusedAfterFree { resource });
                }
            }
            None => {
                let record = Resource {
                    domain: Domain::Device,
                    pending: None,
                    allocated: true,
                    persist: flags & FLAG_PERSIST != 0,
                    heap,
                };
                trace!(
                    resource,
                    heap = record.heap,
                    persist = record.persist,
                    "resource registered"
                );
                self.machine.resources.insert(resource, record);
            }
        }
    }

    fn barrier_resource(
        &mut self,
        index: usize,
        info: &'static OpcodeInfo,
        resource: u32,
        src: u32,
        dst: u32,
    ) {
        self.require_phase(index, info);

        let src_domain = Domain::from_wire(src);
        let dst_domain = Domain::from_wire(dst);
        if self.domain_rules() {
            if src_domain.is_none() {
                self.emit(index, DiagnosticKind::InvalidDomain { value: src });
            }
            if dst_domain.is_none() {
                self.emit(index, DiagnosticKind::InvalidDomain { value: dst });
            }
        }
        let (Some(src_domain), Some(dst_domain)) = (src_domain, dst_domain) else {
            return;
        };

        let domain_rules = self.domain_rules();
        let diagnostic = match self.machine.resources.get_mut(&resource) {
            Some(record) if record.allocated => {
                if record.pending.is_some() {
                    // Layering barriers is rejected: the first transition must
                    // commit before a second is recorded.
                    Some(DiagnosticKind::BarrierLayered { resource })
                } else {
                    let mismatch = (record.domain != src_domain).then(|| {
                        DiagnosticKind::DomainMismatch {
                            resource,
                            src: src_domain,
                            actual: record.domain,
                        }
                    });
                    // Recorded regardless: FENCE_WAIT will commit to dst.
                    record.pending = Some(Pending {
                        src: src_domain,
                        dst: dst_domain,
                    });
                    mismatch
                }
            }
            _ => Some(DiagnosticKind::ResourceNotAllocated {
                name: info.name,
                resource,
            }),
        };
        if domain_rules {
            if let Some(kind) = diagnostic {
                self.emit(index, kind);
            }
        }
    }

    /// SNAPSHOT_BEGIN precondition: every persistent resource is host-visible
    /// with no deferred transition outstanding. One diagnostic per offender.
    fn check_persistent_resources(&mut self, index: usize) {
        let offenders: Vec<DiagnosticKind> = self
            .machine
            .resources
            .iter()
            .filter(|(_, record)| record.allocated && record.persist)
            .flat_map(|(&resource, record)| {
                let mut kinds = Vec::new();
                if record.domain != Domain::Host {
                    kinds.push(DiagnosticKind::PersistentNotHost { resource });
                }
                if record.pending.is_some() {
                    kinds.push(DiagnosticKind::PersistentPending { resource });
                }
                kinds
            })
            .collect();
        for kind in offenders {
            self.emit(index, kind);
        }
    }

    fn terminal_checks(&mut self, end_index: usize) {
        if self.domain_rules() && self.machine.snapshot_active {
            self.emit(end_index, DiagnosticKind::UnterminatedSnapshot);
        }
        if self.phase_rules() {
            if self.machine.phase != Phase::Finished {
                self.emit(end_index, DiagnosticKind::MissingTerminator);
            }
            let outstanding: Vec<u32> = self.machine.fences.keys().copied().collect();
            for fence in outstanding {
                self.emit(end_index, DiagnosticKind::OutstandingFence { fence });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{verify, Verifier};
    use crate::options::{Level, VerifyOptions};

    /// BEGIN_STREAM, BARRIER, SUBMIT, FENCE_WAIT, END_STREAM, END_PROGRAM.
    const MINIMAL_VALID: &[u8] = &[0x01, 0x02, 0x03, 0x04, 0x05, 0x06];

    #[test]
    fn test_minimal_valid_stream() {
        let report = verify(MINIMAL_VALID, Level::Domain);
        assert!(report.success, "diagnostics: {:?}", report.diagnostics());
        assert_eq!(report.error_count, 0);
        assert_eq!(report.instruction_count, 6);
        // Implicit promotion warning from the short BARRIER in host domain.
        assert_eq!(report.warning_count, 1);
    }

    #[test]
    fn test_determinism_byte_identical_reports() {
        let stream: Vec<u8> = vec![0x01, 0xFF, 0x03, 0x04, 0x07, 0x05, 0x06, 0x11];
        let first = verify(&stream, Level::Domain);
        let second = verify(&stream, Level::Domain);
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_stream_fails_terminal_check() {
        let report = verify(&[], Level::Domain);
        assert!(!report.success);
        assert_eq!(report.instruction_count, 0);
        assert!(report.diagnostics()[0]
            .message
            .contains("did not reach END_STREAM"));
    }

    #[test]
    fn test_empty_stream_passes_at_syntax_level() {
        let report = verify(&[], Level::Syntax);
        assert!(report.success);
    }

    #[test]
    fn test_fail_fast_stops_at_first_error() {
        let options = VerifyOptions {
            continue_on_error: false,
            ..VerifyOptions::default()
        };
        // Two unknown opcodes plus a missing terminator; fail-fast keeps one.
        let report = Verifier::new(options).verify(&[0xFF, 0xFE]);
        assert_eq!(report.error_count, 1);
        assert_eq!(report.diagnostics().len(), 1);
    }

    #[test]
    fn test_ignore_unknown_opcodes_counts_noops() {
        let options = VerifyOptions {
            ignore_unknown_opcodes: true,
            ..VerifyOptions::default()
        };
        let stream = [0x01, 0xFF, 0x03, 0x04, 0x05, 0x06];
        let report = Verifier::new(options).verify(&stream);
        assert!(report.success, "diagnostics: {:?}", report.diagnostics());
        assert_eq!(report.instruction_count, 6);
    }

    #[test]
    fn test_verify_cached_agrees_with_uncached() {
        let verifier = Verifier::new(VerifyOptions::default());
        let first = verifier.verify_cached(MINIMAL_VALID);
        let second = verifier.verify_cached(MINIMAL_VALID);
        assert_eq!(*first, *second);
        assert_eq!(*first, verifier.verify(MINIMAL_VALID));
    }

    #[test]
    fn test_force_reverify_bypasses_cache() {
        let options = VerifyOptions {
            force_reverify: true,
            ..VerifyOptions::default()
        };
        let verifier = Verifier::new(options);
        let first = verifier.verify_cached(MINIMAL_VALID);
        let second = verifier.verify_cached(MINIMAL_VALID);
        assert_eq!(*first, *second);
    }
}
