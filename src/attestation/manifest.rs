//! Attestation manifest: the trust contract proof.
//!
//! Every response labelled "verified" must be backed by a complete manifest;
//! [`assert_complete`] is the single enforcement point for that rule.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::taxonomy::{
    FailureClass, RunStatus, VerificationMode, VerificationResult, VerificationTier,
    ViolationEvent,
};

use super::tier::map_tier;

/// Manifest schema version; increments when any field is added or renamed.
pub const MANIFEST_SCHEMA_VERSION: &str = "1.0";

/// Ceiling on retries a manifest may account for (attempts minus one).
pub const MAX_RETRIES: u8 = 2;

// ── AttestationError ───────────────────────────────────────────────────

/// Dedicated error kinds for the attestation layer.
#[derive(Debug, Error)]
pub enum AttestationError {
    /// The "verified" label was requested without a complete manifest.
    #[error("cannot label response as 'verified': {reason}")]
    Incomplete {
        /// What was missing.
        reason: String,
    },

    /// The retry accounting was out of contract range.
    #[error("retries_used must be in 0..={MAX_RETRIES}, got {retries_used}")]
    RetriesOutOfRange {
        /// The rejected value.
        retries_used: u8,
    },
}

// ── AttestationManifest ────────────────────────────────────────────────

/// Full trust-contract proof for one completed request attempt.
///
/// A downstream consumer that receives a response without a manifest MUST
/// treat the result as unverified.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttestationManifest {
    /// Unique ID from the originating request.
    pub request_id: String,
    /// Attempt number that produced this manifest (1-3).
    pub attempt: u8,
    /// Manifest schema version.
    pub schema_version: String,
    /// UTC timestamp of manifest creation.
    pub created_at: DateTime<Utc>,

    /// Highest tier of evidence achieved.
    pub tier: VerificationTier,
    /// True exactly when `tier` is `AI_TESTS_ONLY`; the response must not be
    /// labelled "verified" without human sign-off.
    pub human_review_required: bool,

    /// Runtime isolation mode used.
    pub mode: VerificationMode,
    /// Container exit code.
    pub exit_code: i32,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,

    /// Ordered commands executed inside the sandbox.
    pub commands_run: Vec<String>,

    /// Final outcome.
    pub status: RunStatus,
    /// Failure class; absent on pass.
    pub failure_class: Option<FailureClass>,
    /// Terminal violation event if execution was killed.
    pub terminal_event: Option<ViolationEvent>,

    /// Retry attempts consumed before this result (0-2).
    pub retries_used: u8,

    /// Named checks intentionally omitted from this run.
    pub skipped_checks: Vec<String>,
    /// Paths to produced artifacts (logs, snapshots, coverage files).
    pub artifact_refs: Vec<String>,
    /// Snapshot of the runtime policy applied.
    pub runtime_config: Map<String, Value>,
}

/// Construct a complete manifest from a verification result.
///
/// When `commands_run` is absent, a single-element list is inferred from
/// `runtime_config["command"]`, or left empty.
///
/// # Errors
///
/// Returns [`AttestationError::RetriesOutOfRange`] when `retries_used`
/// exceeds [`MAX_RETRIES`].
pub fn build_manifest(
    result: &VerificationResult,
    retries_used: u8,
    commands_run: Option<Vec<String>>,
) -> Result<AttestationManifest, AttestationError> {
    if retries_used > MAX_RETRIES {
        return Err(AttestationError::RetriesOutOfRange { retries_used });
    }

    let tier = map_tier(result);

    Ok(AttestationManifest {
        request_id: result.request_id.clone(),
        attempt: result.attempt,
        schema_version: MANIFEST_SCHEMA_VERSION.to_owned(),
        created_at: Utc::now(),
        tier,
        human_review_required: tier == VerificationTier::AiTestsOnly,
        mode: result.mode,
        exit_code: result.exit_code,
        duration_ms: result.duration_ms,
        commands_run: commands_run.unwrap_or_else(|| infer_commands(result)),
        status: result.status,
        failure_class: result.failure_class,
        terminal_event: result.terminal_event,
        retries_used,
        skipped_checks: result.skipped_checks.clone(),
        artifact_refs: result.artifacts.clone(),
        runtime_config: result.runtime_config.clone(),
    })
}

/// Fail unless the manifest is present and complete.
///
/// Completeness means a non-empty `request_id` (the typed `status` field
/// cannot be empty by construction). Call this before attaching a
/// "verified" label to any response; `human_review_required` is not a
/// blocker here but must be propagated by the caller.
///
/// # Errors
///
/// Returns [`AttestationError::Incomplete`] when the manifest is missing or
/// a required field is empty.
pub fn assert_complete(
    manifest: Option<&AttestationManifest>,
) -> Result<&AttestationManifest, AttestationError> {
    let Some(manifest) = manifest else {
        return Err(AttestationError::Incomplete {
            reason: "attestation manifest is missing. All verified responses require a \
                     complete AttestationManifest."
                .to_owned(),
        });
    };
    if manifest.request_id.trim().is_empty() {
        return Err(AttestationError::Incomplete {
            reason: "manifest field 'request_id' is empty.".to_owned(),
        });
    }
    Ok(manifest)
}

/// Best-effort reconstruction of commands from the runtime config snapshot.
fn infer_commands(result: &VerificationResult) -> Vec<String> {
    match result.runtime_config.get("command") {
        Some(Value::String(command)) if !command.is_empty() => vec![command.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_owned)
            .collect(),
        _ => Vec::new(),
    }
}

// ── Tests ──────────────────────────────────────────────────────────────
