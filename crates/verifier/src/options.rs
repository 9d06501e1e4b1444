//! Verifier configuration

/// Conformance tier selecting which rule families are enforced.
///
/// Each tier includes everything below it: Syntax checks only opcode
/// recognition and instruction bounds; Phase adds phase-validity and fence
/// balance; Domain adds barrier preconditions, snapshot-domain rules, and
/// resource lifetimes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Level {
    Syntax = 0,
    Phase = 1,
    #[default]
    Domain = 2,
}

impl Level {
    /// Parse a level name as accepted by the CLI.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "syntax" => Some(Level::Syntax),
            "phase" => Some(Level::Phase),
            "domain" => Some(Level::Domain),
            _ => None,
        }
    }
}

/// Recognized verifier options.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VerifyOptions {
    pub level: Level,
    /// Treat unknown opcodes as state-preserving no-ops of length 1 instead
    /// of errors. Off by default.
    pub ignore_unknown_opcodes: bool,
    /// Keep processing after errors until the report is full. On by default;
    /// off means fail-fast on the first error.
    pub continue_on_error: bool,
    /// Bypass the verified-hash fast path and re-run the full pass.
    pub force_reverify: bool,
}

impl Default for VerifyOptions {
    fn default() -> Self {
        Self {
            level: Level::Domain,
            ignore_unknown_opcodes: false,
            continue_on_error: true,
            force_reverify: false,
        }
    }
}

impl VerifyOptions {
    pub fn with_level(level: Level) -> Self {
        Self {
            level,
            ..Self::default()
        }
    }
}
