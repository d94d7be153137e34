//! Single-attempt interception chain.
//!
//! One pass of the end-to-end safe generation pipeline: governance, cloud
//! generation, extraction, sandbox verification. Every failure mode is
//! captured in the returned [`InterceptorResponse`] — a blocked request, a
//! gateway failure, and an extraction failure all come back as data, never
//! as errors, so the circuit breaker can decide what each one means.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::gateway::{CandidateExtractor, LlmClient};
use crate::governance::{GovernanceAuditRecord, GovernancePipeline};
use crate::sandbox::SandboxExecutor;
use crate::taxonomy::{ContextPayload, VerificationMode, VerificationResult};

// ── InterceptorResponse ────────────────────────────────────────────────

/// Combined outcome of governance, extraction, and sandbox verification for
/// one attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterceptorResponse {
    /// Identifier of the processed request.
    pub request_id: String,
    /// Governance decision trail for this attempt.
    pub audit: GovernanceAuditRecord,
    /// Model-provided reasoning notes, when extraction succeeded.
    pub llm_notes: String,
    /// Whether a usable candidate was extracted.
    pub extraction_success: bool,
    /// Block, gateway, or extraction failure detail.
    pub extraction_error: Option<String>,
    /// Sandbox verdict; absent when no candidate reached the sandbox.
    pub verification_result: Option<VerificationResult>,
}

// ── Interceptor ────────────────────────────────────────────────────────

/// Seam between the circuit breaker and the generation chain, so orchestrator
/// tests can script attempt sequences without network or containers.
#[async_trait]
pub trait Interceptor: Send + Sync {
    /// Run one governed generation attempt within the remaining budget.
    async fn process(
        &self,
        payload: &ContextPayload,
        mode: VerificationMode,
        budget_remaining: Duration,
    ) -> InterceptorResponse;
}

// ── InterceptorService ─────────────────────────────────────────────────

/// Production interceptor wiring the real pipeline stages together.
#[derive(Clone)]
pub struct InterceptorService {
    governance: GovernancePipeline,
    llm: Arc<dyn LlmClient>,
    extractor: CandidateExtractor,
    sandbox: SandboxExecutor,
}

impl InterceptorService {
    /// Assemble the chain from its stages.
    #[must_use]
    pub fn new(
        governance: GovernancePipeline,
        llm: Arc<dyn LlmClient>,
        extractor: CandidateExtractor,
        sandbox: SandboxExecutor,
    ) -> Self {
        Self {
            governance,
            llm,
            extractor,
            sandbox,
        }
    }
}

#[async_trait]
impl Interceptor for InterceptorService {
    async fn process(
        &self,
        payload: &ContextPayload,
        mode: VerificationMode,
        budget_remaining: Duration,
    ) -> InterceptorResponse {
        info!(
            request_id = %payload.request_id,
            attempt = payload.attempt,
            "running governance"
        );
        let (safe_payload, audit) = self.governance.run(payload);

        if audit.blocked {
            let reason = audit
                .block_reason
                .clone()
                .unwrap_or_else(|| "Unknown governance policy block.".to_owned());
            warn!(request_id = %payload.request_id, reason = %reason, "request blocked by governance");
            return InterceptorResponse {
                request_id: payload.request_id.clone(),
                audit,
                llm_notes: String::new(),
                extraction_success: false,
                extraction_error: Some(format!("Blocked by governance: {reason}")),
                verification_result: None,
            };
        }

        info!(request_id = %payload.request_id, "requesting cloud candidate");
        let raw_response = match self.llm.generate(&safe_payload).await {
            Ok(raw) => raw,
            Err(err) => {
                warn!(request_id = %payload.request_id, error = %err, "llm gateway failed");
                return InterceptorResponse {
                    request_id: payload.request_id.clone(),
                    audit,
                    llm_notes: String::new(),
                    extraction_success: false,
                    extraction_error: Some(err.to_string()),
                    verification_result: None,
                };
            }
        };

        let extraction = self.extractor.extract(&raw_response);
        if !extraction.success {
            warn!(
                request_id = %payload.request_id,
                error = extraction.error.as_deref().unwrap_or("unknown"),
                "candidate extraction failed"
            );
            return InterceptorResponse {
                request_id: payload.request_id.clone(),
                audit,
                llm_notes: extraction.notes,
                extraction_success: false,
                extraction_error: extraction.error,
                verification_result: None,
            };
        }

        info!(request_id = %payload.request_id, "submitting candidate to sandbox");
        let verification = self
            .sandbox
            .verify_within(
                &extraction.code,
                &payload.request_id,
                payload.attempt,
                mode,
                budget_remaining,
            )
            .await;

        InterceptorResponse {
            request_id: payload.request_id.clone(),
            audit,
            llm_notes: extraction.notes,
            extraction_success: true,
            extraction_error: None,
            verification_result: Some(verification),
        }
    }
}
