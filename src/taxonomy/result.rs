//! The canonical verification contract record.
//!
//! Every sandbox execution — real, synthetic, or degraded — must account for
//! every field of [`VerificationResult`]. Downstream consumers (circuit
//! breaker, attestation, VEIL) rely on the record being fully populated.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::class::{FailureClass, ViolationEvent};
use super::mode::{RunStatus, VerificationMode, VerificationTier};
use super::payload::MAX_ATTEMPT;

/// Contract schema version; increments when any field is added or renamed.
pub const SCHEMA_VERSION: &str = "1.0";

// ── VerificationResult ─────────────────────────────────────────────────

/// Canonical outcome of one sandbox execution attempt.
///
/// Construct through [`VerificationResult::builder`], which enforces the
/// outcome invariant: `status == Pass` exactly when both `failure_class` and
/// `terminal_event` are absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationResult {
    /// Unique identifier from the originating request.
    pub request_id: String,
    /// Attempt number that produced this result (1-3).
    pub attempt: u8,
    /// Contract schema version.
    pub schema_version: String,

    /// Runtime isolation mode used.
    pub mode: VerificationMode,
    /// Evidence tier achieved.
    pub tier: VerificationTier,

    /// Pass or fail.
    pub status: RunStatus,
    /// Failure classification; absent on pass.
    pub failure_class: Option<FailureClass>,
    /// Terminal violation event if execution was killed by policy.
    pub terminal_event: Option<ViolationEvent>,

    /// Container exit code; -1 when the harness itself failed.
    pub exit_code: i32,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
    /// Captured standard output (possibly capped, possibly empty).
    pub stdout: String,
    /// Captured standard error (possibly capped, possibly empty).
    pub stderr: String,

    /// Paths to produced artifacts (logs, snapshots).
    pub artifacts: Vec<String>,
    /// Named checks intentionally omitted from this run.
    pub skipped_checks: Vec<String>,
    /// Snapshot of the runtime policy applied (limits, mounts, network).
    pub runtime_config: Map<String, Value>,
}

impl VerificationResult {
    /// Start building a result for the given request and attempt.
    #[must_use]
    pub fn builder(request_id: impl Into<String>, attempt: u8) -> VerificationResultBuilder {
        VerificationResultBuilder::new(request_id, attempt)
    }
}

// ── VerificationResultBuilder ──────────────────────────────────────────

/// Builder for [`VerificationResult`]; all setters are `#[must_use]`.
///
/// # Panics (debug only)
///
/// `build` debug-asserts the attempt range and the pass/fail outcome
/// invariant; both are programmer errors, not runtime conditions.
#[derive(Debug, Clone)]
pub struct VerificationResultBuilder {
    request_id: String,
    attempt: u8,
    mode: VerificationMode,
    tier: VerificationTier,
    status: RunStatus,
    failure_class: Option<FailureClass>,
    terminal_event: Option<ViolationEvent>,
    exit_code: i32,
    duration_ms: u64,
    stdout: String,
    stderr: String,
    artifacts: Vec<String>,
    skipped_checks: Vec<String>,
    runtime_config: Map<String, Value>,
}

impl VerificationResultBuilder {
    fn new(request_id: impl Into<String>, attempt: u8) -> Self {
        Self {
            request_id: request_id.into(),
            attempt,
            mode: VerificationMode::Balanced,
            tier: VerificationTier::L0,
            status: RunStatus::Fail,
            failure_class: None,
            terminal_event: None,
            exit_code: -1,
            duration_ms: 0,
            stdout: String::new(),
            stderr: String::new(),
            artifacts: Vec::new(),
            skipped_checks: Vec::new(),
            runtime_config: Map::new(),
        }
    }

    /// Set the isolation mode.
    #[must_use]
    pub fn mode(mut self, mode: VerificationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the evidence tier.
    #[must_use]
    pub fn tier(mut self, tier: VerificationTier) -> Self {
        self.tier = tier;
        self
    }

    /// Mark the run as passed, clearing any failure classification.
    #[must_use]
    pub fn passed(mut self) -> Self {
        self.status = RunStatus::Pass;
        self.failure_class = None;
        self.terminal_event = None;
        self
    }

    /// Mark the run as failed with the given classification.
    #[must_use]
    pub fn failed(
        mut self,
        failure_class: Option<FailureClass>,
        terminal_event: Option<ViolationEvent>,
    ) -> Self {
        self.status = RunStatus::Fail;
        self.failure_class = failure_class;
        self.terminal_event = terminal_event;
        self
    }

    /// Set the container exit code.
    #[must_use]
    pub fn exit_code(mut self, exit_code: i32) -> Self {
        self.exit_code = exit_code;
        self
    }

    /// Set the wall-clock duration.
    #[must_use]
    pub fn duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    /// Set the captured output streams.
    #[must_use]
    pub fn output(mut self, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        self.stdout = stdout.into();
        self.stderr = stderr.into();
        self
    }

    /// Set the artifact references.
    #[must_use]
    pub fn artifacts(mut self, artifacts: Vec<String>) -> Self {
        self.artifacts = artifacts;
        self
    }

    /// Set the skipped-check names.
    #[must_use]
    pub fn skipped_checks(mut self, skipped_checks: Vec<String>) -> Self {
        self.skipped_checks = skipped_checks;
        self
    }

    /// Set the runtime policy snapshot.
    #[must_use]
    pub fn runtime_config(mut self, runtime_config: Map<String, Value>) -> Self {
        self.runtime_config = runtime_config;
        self
    }

    /// Finalize the record.
    #[must_use]
    pub fn build(self) -> VerificationResult {
        debug_assert!(
            (1..=MAX_ATTEMPT).contains(&self.attempt),
            "attempt must be in 1..={MAX_ATTEMPT}, got {}",
            self.attempt,
        );
        debug_assert!(
            match self.status {
                RunStatus::Pass => self.failure_class.is_none() && self.terminal_event.is_none(),
                RunStatus::Fail => self.failure_class.is_some() || self.terminal_event.is_some(),
            },
            "status/{:?} is inconsistent with failure_class={:?} terminal_event={:?}",
            self.status,
            self.failure_class,
            self.terminal_event,
        );
        VerificationResult {
            request_id: self.request_id,
            attempt: self.attempt,
            schema_version: SCHEMA_VERSION.to_owned(),
            mode: self.mode,
            tier: self.tier,
            status: self.status,
            failure_class: self.failure_class,
            terminal_event: self.terminal_event,
            exit_code: self.exit_code,
            duration_ms: self.duration_ms,
            stdout: self.stdout,
            stderr: self.stderr,
            artifacts: self.artifacts,
            skipped_checks: self.skipped_checks,
            runtime_config: self.runtime_config,
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────
