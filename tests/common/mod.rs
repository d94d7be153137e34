//! Shared fixtures for the integration suites.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use codewarden::governance::GovernanceAuditRecord;
use codewarden::interceptor::{Interceptor, InterceptorResponse};
use codewarden::sandbox::{ContainerRuntime, LaunchSpec, RunOutput, SandboxError};
use codewarden::taxonomy::{
    ContextPayload, FailureClass, VerificationMode, VerificationResult, ViolationEvent,
};
use codewarden::veil::{EnvironmentFingerprint, FingerprintInputs};

/// A passing verification result.
pub fn pass_result(request_id: &str, attempt: u8) -> VerificationResult {
    VerificationResult::builder(request_id, attempt)
        .passed()
        .exit_code(0)
        .duration_ms(150)
        .output("ok\n", "")
        .build()
}

/// A failing verification result with the given classification.
pub fn fail_result(
    request_id: &str,
    attempt: u8,
    class: Option<FailureClass>,
    event: Option<ViolationEvent>,
) -> VerificationResult {
    VerificationResult::builder(request_id, attempt)
        .failed(class, event)
        .exit_code(1)
        .duration_ms(100)
        .output("", "Traceback: boom")
        .build()
}

/// A clean audit record for fixtures.
pub fn clean_audit(request_id: &str) -> GovernanceAuditRecord {
    GovernanceAuditRecord::new(request_id, 0)
}

/// Interceptor response wrapping a verification result.
pub fn verified_response(result: VerificationResult) -> InterceptorResponse {
    InterceptorResponse {
        request_id: result.request_id.clone(),
        audit: clean_audit(&result.request_id),
        llm_notes: String::new(),
        extraction_success: true,
        extraction_error: None,
        verification_result: Some(result),
    }
}

/// Interceptor response for a failed extraction (no verification result).
pub fn extraction_failure(request_id: &str, error: &str) -> InterceptorResponse {
    InterceptorResponse {
        request_id: request_id.to_owned(),
        audit: clean_audit(request_id),
        llm_notes: String::new(),
        extraction_success: false,
        extraction_error: Some(error.to_owned()),
        verification_result: None,
    }
}

// ── ScriptedInterceptor ────────────────────────────────────────────────

/// Interceptor returning canned responses in order, recording the payloads
/// it was handed.
pub struct ScriptedInterceptor {
    responses: Mutex<VecDeque<InterceptorResponse>>,
    pub seen_payloads: Mutex<Vec<ContextPayload>>,
}

impl ScriptedInterceptor {
    pub fn new(responses: Vec<InterceptorResponse>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            seen_payloads: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl Interceptor for ScriptedInterceptor {
    async fn process(
        &self,
        payload: &ContextPayload,
        _mode: VerificationMode,
        _budget_remaining: Duration,
    ) -> InterceptorResponse {
        self.seen_payloads.lock().push(payload.clone());
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| extraction_failure(&payload.request_id, "script exhausted"))
    }
}

// ── FakeRuntime ────────────────────────────────────────────────────────

/// Container runtime returning a fixed output without touching Docker.
pub struct FakeRuntime {
    pub reachable: bool,
    pub output: RunOutput,
}

impl FakeRuntime {
    pub fn passing() -> Arc<Self> {
        Arc::new(Self {
            reachable: true,
            output: RunOutput {
                exit_code: 0,
                stdout: b"ok\n".to_vec(),
                ..RunOutput::default()
            },
        })
    }

    pub fn with_output(output: RunOutput) -> Arc<Self> {
        Arc::new(Self {
            reachable: true,
            output,
        })
    }
}

#[async_trait]
impl ContainerRuntime for FakeRuntime {
    async fn probe(&self) -> Result<(), SandboxError> {
        if self.reachable {
            Ok(())
        } else {
            Err(SandboxError::Unreachable {
                reason: "fake daemon offline".into(),
            })
        }
    }

    async fn run(
        &self,
        _spec: &LaunchSpec,
        _wait_timeout: Duration,
    ) -> Result<RunOutput, SandboxError> {
        Ok(self.output.clone())
    }
}

/// Baseline fingerprint matching what the orchestrator regenerates at the
/// end of a run.
pub fn process_baseline() -> EnvironmentFingerprint {
    EnvironmentFingerprint::generate(&FingerprintInputs::default())
}

/// Fingerprint with a pinned env-name set, independent of the process env.
pub fn pinned_fingerprint(commands: &[&str]) -> EnvironmentFingerprint {
    EnvironmentFingerprint::generate(&FingerprintInputs {
        commands: commands.iter().map(|s| (*s).to_owned()).collect(),
        env_var_names: Some(vec!["PATH".into(), "HOME".into()]),
        ..FingerprintInputs::default()
    })
}
