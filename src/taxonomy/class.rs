//! Failure classes and terminal violation events.
//!
//! [`FailureClass`] drives retry policy; [`ViolationEvent`] names the policy
//! breach that halted a run. Both are part of the wire contract and must not
//! be reordered or renamed.

use serde::{Deserialize, Serialize};

// ── FailureClass ───────────────────────────────────────────────────────

/// Coarse retry-policy bucket for a failed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureClass {
    /// Interpreter rejected the candidate before running it. Retryable.
    Syntax,
    /// Consistent logical failure (wrong output, uncaught exception). Retryable.
    Deterministic,
    /// A sandbox policy was breached. Never retryable.
    Policy,
    /// Wall-clock or budget exhaustion. Never retryable.
    Timeout,
    /// Non-deterministic failure. Non-retryable in v1; the variant exists so
    /// the taxonomy is stable when threshold-based retry lands.
    Flake,
}

impl FailureClass {
    /// Whether the circuit breaker may schedule another attempt for this class.
    #[must_use]
    pub fn is_retryable(self) -> bool {
        match self {
            Self::Syntax | Self::Deterministic => true,
            Self::Policy | Self::Timeout | Self::Flake => false,
        }
    }
}

impl std::fmt::Display for FailureClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Syntax => write!(f, "syntax"),
            Self::Deterministic => write!(f, "deterministic"),
            Self::Policy => write!(f, "policy"),
            Self::Timeout => write!(f, "timeout"),
            Self::Flake => write!(f, "flake"),
        }
    }
}

// ── ViolationEvent ─────────────────────────────────────────────────────

/// Canonical terminal event names emitted when a run is halted by policy.
///
/// Serialized under their exact PascalCase names; downstream audit tooling
/// keys on these strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViolationEvent {
    /// Outbound connection attempted with networking disabled.
    NetworkAccessViolation,
    /// Write attempted against a read-only mount.
    FilesystemWriteViolation,
    /// Per-run wall clock or total request budget exhausted.
    TimeoutViolation,
    /// Process/thread cap reached.
    ProcessLimitViolation,
    /// Container memory limit reached (OOM kill).
    MemoryLimitViolation,
    /// An output stream exceeded the log cap.
    OutputLimitViolation,
    /// Seccomp or capability denial.
    SyscallViolation,
    /// The requested isolation mode has no working runtime.
    StrictModeUnavailable,
    /// Policy demanded strict isolation but the request asked for less.
    StrictModeRequired,
    /// The retry budget ran out without a passing attempt.
    MaxRetriesExceeded,
}

impl ViolationEvent {
    /// Terminal events that the circuit breaker must never retry past.
    ///
    /// `TimeoutViolation` is excluded because its halt is carried by the
    /// `timeout` failure class; `MaxRetriesExceeded` is excluded because it is
    /// produced by the breaker itself, never observed on an inbound result.
    #[must_use]
    pub fn is_unretryable(self) -> bool {
        match self {
            Self::NetworkAccessViolation
            | Self::FilesystemWriteViolation
            | Self::ProcessLimitViolation
            | Self::MemoryLimitViolation
            | Self::OutputLimitViolation
            | Self::SyscallViolation
            | Self::StrictModeUnavailable
            | Self::StrictModeRequired => true,
            Self::TimeoutViolation | Self::MaxRetriesExceeded => false,
        }
    }
}

impl std::fmt::Display for ViolationEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::NetworkAccessViolation => "NetworkAccessViolation",
            Self::FilesystemWriteViolation => "FilesystemWriteViolation",
            Self::TimeoutViolation => "TimeoutViolation",
            Self::ProcessLimitViolation => "ProcessLimitViolation",
            Self::MemoryLimitViolation => "MemoryLimitViolation",
            Self::OutputLimitViolation => "OutputLimitViolation",
            Self::SyscallViolation => "SyscallViolation",
            Self::StrictModeUnavailable => "StrictModeUnavailable",
            Self::StrictModeRequired => "StrictModeRequired",
            Self::MaxRetriesExceeded => "MaxRetriesExceeded",
        };
        write!(f, "{name}")
    }
}

// ── Tests ──────────────────────────────────────────────────────────────
