//! Retry eligibility rules for the circuit breaker.

use crate::taxonomy::{RunStatus, VerificationResult};

/// Hard attempt ceiling per request.
pub const MAX_ATTEMPTS: u8 = 3;

// ── RetryDecision ──────────────────────────────────────────────────────

/// A retry eligibility decision with its human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryDecision {
    /// Whether another attempt may be scheduled.
    pub should_retry: bool,
    /// Why; surfaces in logs and attempt records.
    pub reason: String,
}

impl RetryDecision {
    fn halt(reason: impl Into<String>) -> Self {
        Self {
            should_retry: false,
            reason: reason.into(),
        }
    }

    fn retry(reason: impl Into<String>) -> Self {
        Self {
            should_retry: true,
            reason: reason.into(),
        }
    }
}

/// Decide whether a failed verification warrants another attempt.
///
/// Rules, in priority order:
///
/// 1. passed results never retry
/// 2. the attempt ceiling halts with `MaxRetriesExceeded` semantics
/// 3. unretryable terminal violation events halt immediately
/// 4. retryable failure classes (`syntax`, `deterministic`) retry
/// 5. a failed result with no failure class halts (fail closed)
/// 6. everything else (`policy`, `timeout`, `flake`) halts
#[must_use]
pub fn evaluate(result: &VerificationResult, current_attempt: u8) -> RetryDecision {
    if result.status == RunStatus::Pass {
        return RetryDecision::halt("Verification passed. No retry needed.");
    }

    if current_attempt >= MAX_ATTEMPTS {
        return RetryDecision::halt(format!(
            "Max attempts reached ({MAX_ATTEMPTS}). Emitting MaxRetriesExceeded."
        ));
    }

    if let Some(event) = result.terminal_event
        && event.is_unretryable()
    {
        return RetryDecision::halt(format!(
            "Terminal violation event '{event}' is non-retryable."
        ));
    }

    let Some(failure_class) = result.failure_class else {
        return RetryDecision::halt(
            "No failure_class set on failed result. Halting (fail-closed).",
        );
    };

    if failure_class.is_retryable() {
        return RetryDecision::retry(format!(
            "Failure class '{failure_class}' is retryable. Scheduling attempt {}.",
            current_attempt + 1
        ));
    }

    RetryDecision::halt(format!(
        "Failure class '{failure_class}' is non-retryable. Halting."
    ))
}

// ── Tests ──────────────────────────────────────────────────────────────
