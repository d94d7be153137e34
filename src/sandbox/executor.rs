//! Hardened sandbox executor.
//!
//! Runs candidate code under the balanced policy profile and always returns
//! a fully-populated [`VerificationResult`] — harness failures fold into a
//! synthetic `StrictModeUnavailable` result rather than escaping as errors.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::taxonomy::{
    FailureClass, VerificationMode, VerificationResult, VerificationTier, ViolationEvent,
};

use super::classifier::{ExecutionSignals, classify};
use super::limits::{CANDIDATE_FILE, RuntimeLimits, SANDBOX_IMAGE, SOURCE_MOUNT};
use super::runtime::{ContainerRuntime, LaunchSpec};

// ── SandboxExecutor ────────────────────────────────────────────────────

/// Policy-enforcing front of the container runtime. Cheap to clone; runs do
/// not share containers, so one executor serves concurrent requests.
#[derive(Clone)]
pub struct SandboxExecutor {
    runtime: Arc<dyn ContainerRuntime>,
    image: String,
}

impl SandboxExecutor {
    /// Executor over the given runtime with the default image tag.
    #[must_use]
    pub fn new(runtime: Arc<dyn ContainerRuntime>) -> Self {
        Self {
            runtime,
            image: SANDBOX_IMAGE.to_owned(),
        }
    }

    /// Override the sandbox image tag.
    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }

    /// Run `code` with the full request budget available.
    pub async fn verify(
        &self,
        code: &str,
        request_id: &str,
        attempt: u8,
        mode: VerificationMode,
    ) -> VerificationResult {
        let budget = RuntimeLimits::balanced().total_budget;
        self.verify_within(code, request_id, attempt, mode, budget).await
    }

    /// Run `code` with at most `budget_remaining` of the request budget left.
    ///
    /// The container waits `min(per_run_timeout, budget_remaining)`; an
    /// exhausted budget classifies as a timeout without launching anything.
    pub async fn verify_within(
        &self,
        code: &str,
        request_id: &str,
        attempt: u8,
        mode: VerificationMode,
        budget_remaining: Duration,
    ) -> VerificationResult {
        let limits = RuntimeLimits::balanced();
        let command = vec!["python".to_owned(), format!("{SOURCE_MOUNT}/{CANDIDATE_FILE}")];
        let runtime_config = limits.snapshot(mode, &command.join(" "));
        let started = Instant::now();

        // Unsupported modes fail closed before any container work.
        if !mode.is_supported() {
            warn!(%request_id, %mode, "requested isolation mode has no runtime");
            return harness_unavailable(
                request_id,
                attempt,
                mode,
                runtime_config,
                started,
                format!("isolation mode '{mode}' is not available in this deployment"),
            );
        }

        if budget_remaining.is_zero() {
            return timed_out_result(request_id, attempt, mode, runtime_config, started);
        }

        // Candidate source is written to a scratch directory and mounted
        // read-only; it never touches a shell line.
        let source_dir = match tempfile::Builder::new().prefix("warden-src-").tempdir() {
            Ok(dir) => dir,
            Err(err) => {
                return harness_unavailable(
                    request_id,
                    attempt,
                    mode,
                    runtime_config,
                    started,
                    format!("failed to create source dir: {err}"),
                );
            }
        };
        let candidate_path = source_dir.path().join(CANDIDATE_FILE);
        if let Err(err) = tokio::fs::write(&candidate_path, code).await {
            return harness_unavailable(
                request_id,
                attempt,
                mode,
                runtime_config,
                started,
                format!("failed to write candidate source: {err}"),
            );
        }

        if let Err(err) = self.runtime.probe().await {
            return harness_unavailable(
                request_id,
                attempt,
                mode,
                runtime_config,
                started,
                err.to_string(),
            );
        }

        let spec = LaunchSpec {
            image: self.image.clone(),
            command,
            source_dir: source_dir.path().to_path_buf(),
            limits: limits.clone(),
        };
        let wait_timeout = limits.per_run_timeout.min(budget_remaining);

        let output = match self.runtime.run(&spec, wait_timeout).await {
            Ok(output) => output,
            Err(err) => {
                return harness_unavailable(
                    request_id,
                    attempt,
                    mode,
                    runtime_config,
                    started,
                    err.to_string(),
                );
            }
        };

        let mut timed_out = output.timed_out;
        // Defensive: a slow engine can overshoot the request budget even
        // when the per-run wait returned normally.
        if started.elapsed() > limits.total_budget {
            timed_out = true;
        }

        let signals = ExecutionSignals {
            exit_code: output.exit_code,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            timed_out,
            output_capped: output.stdout_capped || output.stderr_capped,
        };
        let (terminal_event, failure_class) = classify(&signals);

        let elapsed_ms = started.elapsed().as_millis() as u64;
        info!(
            %request_id,
            attempt,
            exit_code = signals.exit_code,
            duration_ms = elapsed_ms,
            pass = terminal_event.is_none() && failure_class.is_none(),
            "sandbox run complete"
        );

        let builder = VerificationResult::builder(request_id, attempt)
            .mode(mode)
            .tier(VerificationTier::L0)
            .exit_code(signals.exit_code)
            .duration_ms(elapsed_ms)
            .output(signals.stdout, signals.stderr)
            .runtime_config(runtime_config);

        if terminal_event.is_none() && failure_class.is_none() {
            builder.passed().build()
        } else {
            builder.failed(failure_class, terminal_event).build()
        }
    }
}

/// Synthetic result for harness failures: the sandbox itself could not give
/// the run a fair trial, so the outcome is a non-retryable policy halt.
fn harness_unavailable(
    request_id: &str,
    attempt: u8,
    mode: VerificationMode,
    runtime_config: serde_json::Map<String, serde_json::Value>,
    started: Instant,
    reason: String,
) -> VerificationResult {
    VerificationResult::builder(request_id, attempt)
        .mode(mode)
        .tier(VerificationTier::L0)
        .failed(
            Some(FailureClass::Policy),
            Some(ViolationEvent::StrictModeUnavailable),
        )
        .exit_code(-1)
        .duration_ms(started.elapsed().as_millis() as u64)
        .output(String::new(), reason)
        .runtime_config(runtime_config)
        .build()
}

fn timed_out_result(
    request_id: &str,
    attempt: u8,
    mode: VerificationMode,
    runtime_config: serde_json::Map<String, serde_json::Value>,
    started: Instant,
) -> VerificationResult {
    VerificationResult::builder(request_id, attempt)
        .mode(mode)
        .tier(VerificationTier::L0)
        .failed(
            Some(FailureClass::Timeout),
            Some(ViolationEvent::TimeoutViolation),
        )
        .exit_code(-1)
        .duration_ms(started.elapsed().as_millis() as u64)
        .output(String::new(), "request budget exhausted before launch".to_owned())
        .runtime_config(runtime_config)
        .build()
}

// ── Tests ──────────────────────────────────────────────────────────────
