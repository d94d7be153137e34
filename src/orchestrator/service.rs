//! The circuit-breaker retry loop.
//!
//! Runs at most [`MAX_ATTEMPTS`] governed generation attempts per request:
//! the first with the caller's original content, later ones with a repair
//! prompt embedding the previous failure evidence. The loop halts
//! immediately on a pass, on a non-retryable failure class, on a terminal
//! violation event, on a non-syntax extraction failure, or when the budget
//! runs out.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde_json::json;
use tracing::{info, warn};

use crate::interceptor::Interceptor;
use crate::sandbox::RuntimeLimits;
use crate::taxonomy::{
    ContextPayload, FailureClass, PayloadError, RunStatus, VerificationMode, VerificationResult,
    VerificationTier, ViolationEvent,
};
use crate::veil::{DeterminismGate, EnvironmentFingerprint, FingerprintInputs, VeilLedger};

use super::models::{AttemptRecord, OrchestrationResult};
use super::prompts::build_repair_prompt;
use super::retry::{self, MAX_ATTEMPTS};

// ── VeilHook ───────────────────────────────────────────────────────────

/// Optional memory wiring: a gate, a ledger, and the process baseline
/// fingerprint captured at startup.
#[derive(Clone)]
pub struct VeilHook {
    /// The determinism predicate.
    pub gate: DeterminismGate,
    /// Shared event store.
    pub ledger: Arc<VeilLedger>,
    /// Baseline fingerprint; read-only after startup.
    pub baseline: EnvironmentFingerprint,
}

// ── Orchestrator ───────────────────────────────────────────────────────

/// Bounded circuit breaker over an [`Interceptor`].
#[derive(Clone)]
pub struct Orchestrator {
    interceptor: Arc<dyn Interceptor>,
    veil: Option<VeilHook>,
}

impl Orchestrator {
    /// Breaker without memory wiring.
    #[must_use]
    pub fn new(interceptor: Arc<dyn Interceptor>) -> Self {
        Self {
            interceptor,
            veil: None,
        }
    }

    /// Attach the determinism gate and ledger.
    #[must_use]
    pub fn with_veil(mut self, veil: VeilHook) -> Self {
        self.veil = Some(veil);
        self
    }

    /// Execute the circuit-breaker loop and return the final result.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadError`] only for an invalid `request_id`; everything
    /// downstream is captured in the result.
    pub async fn run(
        &self,
        request_id: &str,
        content: &str,
        files: Vec<String>,
        mode: VerificationMode,
    ) -> Result<OrchestrationResult, PayloadError> {
        let budget = RuntimeLimits::balanced().total_budget;
        let started = Instant::now();

        let original_content = content;
        let mut content = content.to_owned();
        let mut attempts: Vec<AttemptRecord> = Vec::new();
        let mut final_status = RunStatus::Fail;
        let mut terminal_event: Option<ViolationEvent> = None;

        for attempt_number in 1..=MAX_ATTEMPTS {
            info!(
                %request_id,
                attempt = attempt_number,
                max_attempts = MAX_ATTEMPTS,
                "starting attempt"
            );

            let payload =
                ContextPayload::new(request_id, attempt_number, files.clone(), content.as_str())?;
            let remaining = budget.saturating_sub(started.elapsed());
            let response = self.interceptor.process(&payload, mode, remaining).await;

            let mut verification = response.verification_result;
            if verification.is_none()
                && !response.extraction_success
                && is_extraction_syntax_error(response.extraction_error.as_deref())
            {
                // Pre-handoff syntax validation participates in the retry
                // budget the same way an in-sandbox SyntaxError does.
                info!(
                    %request_id,
                    attempt = attempt_number,
                    "extraction syntax failure promoted to retryable syntax class"
                );
                verification = Some(synthetic_syntax_failure(
                    request_id,
                    attempt_number,
                    mode,
                    response
                        .extraction_error
                        .as_deref()
                        .unwrap_or("SyntaxError during extraction."),
                ));
            }

            attempts.push(AttemptRecord {
                attempt: attempt_number,
                extraction_success: response.extraction_success,
                extraction_error: response.extraction_error.clone(),
                verification_result: verification.clone(),
                timestamp: Utc::now(),
            });

            let Some(verification) = verification else {
                warn!(
                    %request_id,
                    attempt = attempt_number,
                    error = response.extraction_error.as_deref().unwrap_or("unknown"),
                    "extraction failed, halting"
                );
                break;
            };

            if verification.status == RunStatus::Pass {
                info!(%request_id, attempt = attempt_number, "attempt passed");
                final_status = RunStatus::Pass;
                break;
            }

            let decision = retry::evaluate(&verification, attempt_number);
            info!(
                %request_id,
                attempt = attempt_number,
                reason = %decision.reason,
                "attempt failed"
            );

            if !decision.should_retry {
                if attempt_number >= MAX_ATTEMPTS {
                    terminal_event = Some(ViolationEvent::MaxRetriesExceeded);
                } else if let Some(event) = verification.terminal_event {
                    terminal_event = Some(event);
                }
                break;
            }

            // The repair prompt always embeds the caller's original request,
            // never a previously built prompt.
            content = build_repair_prompt(original_content, &verification);
        }

        let attempt_count = attempts.len() as u8;
        let result = OrchestrationResult {
            request_id: request_id.to_owned(),
            attempt_count,
            retry_count: attempt_count.saturating_sub(1),
            final_status,
            terminal_event,
            attempts,
        };

        if let Some(veil) = &self.veil {
            let current = EnvironmentFingerprint::generate(&FingerprintInputs::default());
            let decision = veil.gate.evaluate(&result, &current, &veil.baseline);
            veil.ledger.record(&decision, &result, &current);
        }

        Ok(result)
    }
}

fn is_extraction_syntax_error(error: Option<&str>) -> bool {
    error.is_some_and(|message| message.to_lowercase().contains("syntaxerror"))
}

/// Synthetic verification result standing in for a run the extractor
/// rejected on syntax grounds.
fn synthetic_syntax_failure(
    request_id: &str,
    attempt: u8,
    mode: VerificationMode,
    error: &str,
) -> VerificationResult {
    let mut runtime_config = serde_json::Map::new();
    runtime_config.insert("source".into(), json!("extractor"));
    VerificationResult::builder(request_id, attempt)
        .mode(mode)
        .tier(VerificationTier::L0)
        .failed(Some(FailureClass::Syntax), None)
        .exit_code(-1)
        .duration_ms(0)
        .output(String::new(), error.to_owned())
        .runtime_config(runtime_config)
        .build()
}

// ── Tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syntax_error_detection_is_case_insensitive() {
        assert!(is_extraction_syntax_error(Some(
            "SyntaxError at line 3, offset 1: invalid syntax"
        )));
        assert!(is_extraction_syntax_error(Some("caught SYNTAXERROR")));
        assert!(!is_extraction_syntax_error(Some("gateway timeout")));
        assert!(!is_extraction_syntax_error(None));
    }

    #[test]
    fn synthetic_failure_marks_extractor_source() {
        let result = synthetic_syntax_failure(
            "req-syn",
            2,
            VerificationMode::Balanced,
            "SyntaxError: bad",
        );
        assert_eq!(result.failure_class, Some(FailureClass::Syntax));
        assert_eq!(result.tier, VerificationTier::L0);
        assert_eq!(result.exit_code, -1);
        assert_eq!(result.duration_ms, 0);
        assert_eq!(result.stderr, "SyntaxError: bad");
        assert_eq!(result.runtime_config["source"], "extractor");
    }
}
