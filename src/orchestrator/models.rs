//! Records produced by the circuit breaker.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::taxonomy::{RunStatus, VerificationResult, ViolationEvent};

// ── AttemptRecord ──────────────────────────────────────────────────────

/// Immutable snapshot of a single generation-and-verification attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptRecord {
    /// Attempt number (1-3), strictly increasing within an orchestration.
    pub attempt: u8,
    /// Whether extraction produced a usable candidate.
    pub extraction_success: bool,
    /// Block, gateway, or extraction failure detail.
    pub extraction_error: Option<String>,
    /// Sandbox verdict; absent when nothing reached the sandbox.
    pub verification_result: Option<VerificationResult>,
    /// UTC time the attempt was recorded.
    pub timestamp: DateTime<Utc>,
}

// ── OrchestrationResult ────────────────────────────────────────────────

/// Final aggregated outcome of the complete circuit-breaker loop.
///
/// Invariant: `retry_count == attempt_count - 1` and
/// `1 <= attempt_count <= 3` for every completed orchestration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestrationResult {
    /// Identifier of the orchestrated request.
    pub request_id: String,
    /// How many attempts were made (1-3).
    pub attempt_count: u8,
    /// Number of retries consumed (attempts minus one).
    pub retry_count: u8,
    /// Final pass/fail outcome.
    pub final_status: RunStatus,
    /// Populated when a non-retryable terminal event halted the loop.
    pub terminal_event: Option<ViolationEvent>,
    /// Full ordered history of attempts.
    pub attempts: Vec<AttemptRecord>,
}

impl OrchestrationResult {
    /// The verification result of the last recorded attempt, if any.
    #[must_use]
    pub fn last_verification(&self) -> Option<&VerificationResult> {
        self.attempts
            .last()
            .and_then(|record| record.verification_result.as_ref())
    }

    /// Sandbox wall-clock summed across all attempts, in milliseconds.
    #[must_use]
    pub fn total_duration_ms(&self) -> u64 {
        self.attempts
            .iter()
            .filter_map(|record| record.verification_result.as_ref())
            .map(|result| result.duration_ms)
            .sum()
    }
}
