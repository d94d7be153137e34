//! HTTP surface.
//!
//! JSON in, JSON out: 200 on success, 422 on schema or range violations,
//! 404 for a missing manifest. The shared services ([`AppState`]) are
//! explicitly constructed by the entry point and injected here — the
//! process-wide singleton is a composition detail of `main`, not of this
//! module.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::error;

use crate::attestation::{AttestationManifest, MAX_RETRIES, build_manifest};
use crate::gateway::{CandidateExtractor, GatewayError, HttpLlmClient, LlmOptions, LlmProvider};
use crate::governance::{GovernanceAuditRecord, GovernanceError, GovernancePipeline};
use crate::interceptor::{Interceptor, InterceptorService};
use crate::orchestrator::{OrchestrationResult, Orchestrator, VeilHook};
use crate::sandbox::{ContainerRuntime, RuntimeLimits, SandboxExecutor};
use crate::taxonomy::{
    ContextPayload, PayloadError, VerificationMode, VerificationResult,
};
use crate::veil::{DeterminismGate, EnvironmentFingerprint, FingerprintInputs, VeilLedger};

// ── AppState ───────────────────────────────────────────────────────────

/// Shared services behind the HTTP handlers.
///
/// The manifest index and the ledger are the only cross-request state; both
/// are lock-guarded and survive request cancellation.
pub struct AppState {
    /// Compiled governance tables, shared across requests.
    pub governance: GovernancePipeline,
    /// Sandbox executor over the injected container runtime.
    pub sandbox: SandboxExecutor,
    /// Manifest index keyed by `request_id`.
    pub manifests: RwLock<HashMap<String, AttestationManifest>>,
    /// Shared VEIL event store.
    pub ledger: Arc<VeilLedger>,
    /// Baseline fingerprint captured at startup; read-only thereafter.
    pub baseline: EnvironmentFingerprint,
}

impl AppState {
    /// Compile policy tables and capture the fingerprint baseline.
    ///
    /// # Errors
    ///
    /// Returns [`GovernanceError`] when a built-in policy table fails to
    /// compile.
    pub fn new(runtime: Arc<dyn ContainerRuntime>) -> Result<Self, GovernanceError> {
        Ok(Self {
            governance: GovernancePipeline::with_defaults()?,
            sandbox: SandboxExecutor::new(runtime),
            manifests: RwLock::new(HashMap::new()),
            ledger: Arc::new(VeilLedger::new()),
            baseline: EnvironmentFingerprint::generate(&FingerprintInputs::default()),
        })
    }
}

/// Build the service router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/verify", post(verify))
        .route("/intercept", post(intercept))
        .route("/orchestrate", post(orchestrate))
        .route("/manifest/:request_id", get(manifest))
        .with_state(state)
}

// ── ApiError ───────────────────────────────────────────────────────────

/// Handler-level failure, rendered as a JSON error body.
#[derive(Debug)]
pub enum ApiError {
    /// Request violated the schema or a contract range (422).
    Unprocessable(String),
    /// Referenced resource does not exist (404).
    NotFound(String),
    /// Unexpected internal failure (500).
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Unprocessable(message) => (StatusCode::UNPROCESSABLE_ENTITY, message),
            Self::NotFound(message) => (StatusCode::NOT_FOUND, message),
            Self::Internal(message) => {
                error!(error = %message, "internal handler failure");
                (StatusCode::INTERNAL_SERVER_ERROR, message)
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<PayloadError> for ApiError {
    fn from(err: PayloadError) -> Self {
        Self::Unprocessable(err.to_string())
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::InvalidOptions { .. } | GatewayError::MissingApiKey { .. } => {
                Self::Unprocessable(err.to_string())
            }
            other => Self::Internal(other.to_string()),
        }
    }
}

// ── Request / response bodies ──────────────────────────────────────────

fn default_attempt() -> u8 {
    1
}

/// Body for `POST /verify`: run the sandbox on caller-supplied code.
#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    /// Request identifier; generated when absent.
    pub request_id: Option<String>,
    /// Attempt number (1-3).
    #[serde(default = "default_attempt")]
    pub attempt: u8,
    /// Candidate code to execute.
    pub code: String,
    /// Isolation mode.
    #[serde(default)]
    pub mode: VerificationMode,
}

/// Body for `POST /intercept` and `POST /orchestrate`.
#[derive(Debug, Deserialize)]
pub struct InterceptRequest {
    /// Request identifier; generated when absent.
    pub request_id: Option<String>,
    /// Attempt number (1-3); only meaningful for `/intercept`.
    #[serde(default = "default_attempt")]
    pub attempt: u8,
    /// Context file paths.
    #[serde(default)]
    pub files: Vec<String>,
    /// Prompt plus context content.
    pub content: String,
    /// Isolation mode.
    #[serde(default)]
    pub mode: VerificationMode,
    /// Model identifier.
    pub model_name: Option<String>,
    /// Provider family.
    #[serde(default)]
    pub llm_provider: LlmProvider,
    /// API base override.
    pub llm_api_base: Option<String>,
    /// Inline API key.
    pub llm_api_key: Option<String>,
    /// Provider-specific extra body entries.
    #[serde(default)]
    pub llm_extra_body: Map<String, Value>,
    /// Provider call timeout in seconds (0, 600].
    pub llm_timeout_s: Option<f64>,
    /// Completion token cap (0, 32768].
    pub llm_max_tokens: Option<u32>,
    /// Sampling temperature [0, 2].
    pub llm_temperature: Option<f32>,
    /// Nucleus sampling mass (0, 1].
    pub llm_top_p: Option<f32>,
}

impl InterceptRequest {
    fn llm_options(&self) -> Result<LlmOptions, ApiError> {
        let timeout = match self.llm_timeout_s {
            Some(seconds) if seconds > 0.0 => Duration::from_secs_f64(seconds),
            Some(seconds) => {
                return Err(ApiError::Unprocessable(format!(
                    "llm_timeout_s must be positive, got {seconds}"
                )));
            }
            None => crate::gateway::DEFAULT_LLM_TIMEOUT,
        };
        let options = LlmOptions {
            model_name: self
                .model_name
                .clone()
                .unwrap_or_else(|| "gpt-4o".to_owned()),
            provider: self.llm_provider,
            api_base: self.llm_api_base.clone(),
            api_key: self.llm_api_key.clone(),
            extra_body: self.llm_extra_body.clone(),
            timeout,
            max_tokens: self.llm_max_tokens,
            temperature: self.llm_temperature,
            top_p: self.llm_top_p,
        };
        Ok(options.validated()?)
    }
}

/// Response for `POST /verify`.
#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    /// Canonical sandbox outcome.
    pub result: VerificationResult,
    /// Manifest backing the outcome.
    pub manifest: AttestationManifest,
}

/// Response for `POST /intercept`.
#[derive(Debug, Serialize)]
pub struct InterceptResponse {
    /// Identifier of the processed request.
    pub request_id: String,
    /// Governance decision trail.
    pub audit: GovernanceAuditRecord,
    /// Model-provided reasoning notes.
    pub llm_notes: String,
    /// Whether extraction produced a usable candidate.
    pub extraction_success: bool,
    /// Block, gateway, or extraction failure detail.
    pub extraction_error: Option<String>,
    /// Sandbox verdict, when one was produced.
    pub verification_result: Option<VerificationResult>,
    /// Manifest, when a verification result exists.
    pub manifest: Option<AttestationManifest>,
}

/// Response for `POST /orchestrate`.
#[derive(Debug, Serialize)]
pub struct OrchestrateResponse {
    /// Full circuit-breaker outcome with attempt history.
    pub result: OrchestrationResult,
    /// Manifest from the last attempt that reached the sandbox.
    pub manifest: Option<AttestationManifest>,
}

// ── Handlers ───────────────────────────────────────────────────────────

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn verify(
    State(state): State<Arc<AppState>>,
    Json(request): Json<VerifyRequest>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let request_id = resolve_request_id(request.request_id);
    // Reuse payload validation for the attempt range.
    let payload = ContextPayload::new(request_id.as_str(), request.attempt, Vec::new(), "")?;

    // Detached so a caller disconnect cannot abandon a running container or
    // leave the manifest unwritten.
    let task = tokio::spawn(async move {
        let result = state
            .sandbox
            .verify(&request.code, &payload.request_id, payload.attempt, request.mode)
            .await;
        let manifest = build_manifest(&result, 0, None)
            .map_err(|err| ApiError::Internal(err.to_string()))?;
        state
            .manifests
            .write()
            .insert(request_id.clone(), manifest.clone());
        Ok(Json(VerifyResponse { result, manifest }))
    });
    task.await
        .map_err(|err| ApiError::Internal(err.to_string()))?
}

async fn intercept(
    State(state): State<Arc<AppState>>,
    Json(request): Json<InterceptRequest>,
) -> Result<Json<InterceptResponse>, ApiError> {
    let request_id = resolve_request_id(request.request_id.clone());
    let payload = ContextPayload::new(
        request_id.as_str(),
        request.attempt,
        request.files.clone(),
        request.content.as_str(),
    )?;

    let service = build_interceptor(&state, &request)?;
    let task = tokio::spawn(async move {
        let budget = RuntimeLimits::balanced().total_budget;
        let response = service.process(&payload, request.mode, budget).await;

        let manifest = match &response.verification_result {
            Some(result) => {
                let manifest = build_manifest(result, 0, None)
                    .map_err(|err| ApiError::Internal(err.to_string()))?;
                state
                    .manifests
                    .write()
                    .insert(request_id.clone(), manifest.clone());
                Some(manifest)
            }
            None => None,
        };

        Ok(Json(InterceptResponse {
            request_id: response.request_id,
            audit: response.audit,
            llm_notes: response.llm_notes,
            extraction_success: response.extraction_success,
            extraction_error: response.extraction_error,
            verification_result: response.verification_result,
            manifest,
        }))
    });
    task.await
        .map_err(|err| ApiError::Internal(err.to_string()))?
}

async fn orchestrate(
    State(state): State<Arc<AppState>>,
    Json(request): Json<InterceptRequest>,
) -> Result<Json<OrchestrateResponse>, ApiError> {
    let request_id = resolve_request_id(request.request_id.clone());
    // Surface invalid identifiers before entering the loop.
    let _ = ContextPayload::new(
        request_id.as_str(),
        1,
        request.files.clone(),
        request.content.as_str(),
    )?;

    let service = build_interceptor(&state, &request)?;
    let orchestrator = Orchestrator::new(Arc::new(service)).with_veil(VeilHook {
        gate: DeterminismGate,
        ledger: Arc::clone(&state.ledger),
        baseline: state.baseline.clone(),
    });

    let task = tokio::spawn(async move {
        let result = orchestrator
            .run(&request_id, &request.content, request.files.clone(), request.mode)
            .await?;

        let manifest = match result.last_verification() {
            Some(verification) => {
                let retries_used = result.retry_count.min(MAX_RETRIES);
                let manifest = build_manifest(verification, retries_used, None)
                    .map_err(|err| ApiError::Internal(err.to_string()))?;
                state
                    .manifests
                    .write()
                    .insert(request_id.clone(), manifest.clone());
                Some(manifest)
            }
            None => None,
        };

        Ok(Json(OrchestrateResponse { result, manifest }))
    });
    task.await
        .map_err(|err| ApiError::Internal(err.to_string()))?
}

async fn manifest(
    State(state): State<Arc<AppState>>,
    Path(request_id): Path<String>,
) -> Result<Json<AttestationManifest>, ApiError> {
    state
        .manifests
        .read()
        .get(&request_id)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("no manifest stored for '{request_id}'")))
}

fn resolve_request_id(request_id: Option<String>) -> String {
    match request_id {
        Some(id) if !id.trim().is_empty() => id,
        _ => uuid::Uuid::new_v4().to_string(),
    }
}

fn build_interceptor(
    state: &AppState,
    request: &InterceptRequest,
) -> Result<InterceptorService, ApiError> {
    let options = request.llm_options()?;
    let llm = HttpLlmClient::new(options)?;
    let extractor =
        CandidateExtractor::new().map_err(|err| ApiError::Internal(err.to_string()))?;
    Ok(InterceptorService::new(
        state.governance.clone(),
        Arc::new(llm),
        extractor,
        state.sandbox.clone(),
    ))
}

// ── Tests ──────────────────────────────────────────────────────────────
