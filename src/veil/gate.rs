//! The determinism gate.
//!
//! Predicate over an orchestration plus two fingerprints that admits only
//! environmentally-reproducible, signal-bearing runs into behavioural
//! memory. Noise classes (`flake`, `timeout`, `policy`) are filtered;
//! deterministic failures are kept as useful negative signal.

use serde::{Deserialize, Serialize};

use crate::orchestrator::OrchestrationResult;
use crate::taxonomy::{FailureClass, RunStatus};

use super::fingerprint::EnvironmentFingerprint;

/// The closed set of gate decision reasons.
pub mod reason {
    use crate::taxonomy::FailureClass;

    /// Current fingerprint differs from the baseline.
    pub const FINGERPRINT_MISMATCH: &str = "fingerprint_mismatch";
    /// The orchestration recorded no attempts.
    pub const NO_ATTEMPTS: &str = "no_attempts";
    /// The last attempt carried no verification result.
    pub const EXTRACTION_FAILED: &str = "extraction_failed";
    /// A deterministic pass on the first attempt.
    pub const DETERMINISTIC_PASS: &str = "deterministic_pass";
    /// A pass that survived at least one retry.
    pub const REPRODUCIBLE_PASS: &str = "reproducible_pass";

    /// `noise:<class>` for filtered failure classes.
    #[must_use]
    pub fn noise(class: FailureClass) -> String {
        format!("noise:{class}")
    }

    /// `deterministic_fail_<class>` for signal-bearing failures.
    #[must_use]
    pub fn deterministic_fail(class: Option<FailureClass>) -> String {
        match class {
            Some(class) => format!("deterministic_fail_{class}"),
            None => "deterministic_fail_none".to_owned(),
        }
    }
}

// ── GateDecision ───────────────────────────────────────────────────────

/// The result of evaluating a run through the determinism gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateDecision {
    /// Whether the run may enter behavioural memory.
    pub passed: bool,
    /// One of the closed [`reason`] strings.
    pub reason: String,
    /// Whether the outcome was demonstrated across a retry.
    pub reproducible: bool,
}

impl GateDecision {
    fn rejected(reason: impl Into<String>) -> Self {
        Self {
            passed: false,
            reason: reason.into(),
            reproducible: false,
        }
    }
}

// ── DeterminismGate ────────────────────────────────────────────────────

/// Stateless gate evaluator.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeterminismGate;

impl DeterminismGate {
    /// Evaluate an orchestration against the fingerprint baseline.
    #[must_use]
    pub fn evaluate(
        &self,
        result: &OrchestrationResult,
        fingerprint: &EnvironmentFingerprint,
        baseline: &EnvironmentFingerprint,
    ) -> GateDecision {
        if fingerprint != baseline {
            return GateDecision::rejected(reason::FINGERPRINT_MISMATCH);
        }

        if result.attempts.is_empty() {
            return GateDecision::rejected(reason::NO_ATTEMPTS);
        }

        let Some(last) = result.last_verification() else {
            return GateDecision::rejected(reason::EXTRACTION_FAILED);
        };

        if result.final_status == RunStatus::Fail {
            return match last.failure_class {
                Some(
                    class @ (FailureClass::Flake | FailureClass::Timeout | FailureClass::Policy),
                ) => GateDecision::rejected(reason::noise(class)),
                class => GateDecision {
                    passed: true,
                    reason: reason::deterministic_fail(class),
                    reproducible: false,
                },
            };
        }

        let reproducible = result.retry_count > 0;
        GateDecision {
            passed: true,
            reason: if reproducible {
                reason::REPRODUCIBLE_PASS.to_owned()
            } else {
                reason::DETERMINISTIC_PASS.to_owned()
            },
            reproducible,
        }
    }
}
