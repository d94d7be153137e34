//! Container runtime seam.
//!
//! [`ContainerRuntime`] is the trait boundary between the executor's policy
//! logic and the actual container engine, so tests substitute scripted
//! fakes. [`DockerCli`] is the production implementation: it drives the
//! `docker` binary through [`tokio::process::Command`] with an argument
//! vector — candidate content is never interpolated into a shell line.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::debug;
use uuid::Uuid;

use super::limits::{RuntimeLimits, SCRATCH_MOUNT, SOURCE_MOUNT};

// ── SandboxError ───────────────────────────────────────────────────────

/// Harness-level failure while driving the container engine. These never
/// escape the executor: every variant is folded into a synthetic
/// `StrictModeUnavailable` result.
#[derive(Debug, Error)]
pub enum SandboxError {
    /// The engine did not answer the reachability probe.
    #[error("container runtime unreachable: {reason}")]
    Unreachable {
        /// Probe failure detail.
        reason: String,
    },

    /// The container could not be launched or awaited.
    #[error("failed to run sandbox container: {reason}")]
    Launch {
        /// Launch failure detail.
        reason: String,
    },

    /// Filesystem or pipe failure in the harness itself.
    #[error("sandbox io failure: {0}")]
    Io(#[from] std::io::Error),
}

// ── LaunchSpec / RunOutput ─────────────────────────────────────────────

/// Everything a runtime needs to launch one hardened container.
#[derive(Debug, Clone)]
pub struct LaunchSpec {
    /// Image tag to run.
    pub image: String,
    /// Command vector executed inside the container.
    pub command: Vec<String>,
    /// Host directory mounted read-only at [`SOURCE_MOUNT`].
    pub source_dir: PathBuf,
    /// Resource limits to enforce.
    pub limits: RuntimeLimits,
}

/// Raw signals captured from one container run.
#[derive(Debug, Clone, Default)]
pub struct RunOutput {
    /// Container exit code; -1 when unavailable (killed, signalled).
    pub exit_code: i32,
    /// Whether the wait deadline expired and the container was killed.
    pub timed_out: bool,
    /// Captured stdout, already truncated to the log cap.
    pub stdout: Vec<u8>,
    /// Captured stderr, already truncated to the log cap.
    pub stderr: Vec<u8>,
    /// Whether raw stdout exceeded the cap before truncation.
    pub stdout_capped: bool,
    /// Whether raw stderr exceeded the cap before truncation.
    pub stderr_capped: bool,
}

// ── ContainerRuntime ───────────────────────────────────────────────────

/// Engine abstraction: probe reachability, then run one container to
/// completion (or kill it at the deadline), always removing it afterwards.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Cheap reachability check against the engine daemon.
    async fn probe(&self) -> Result<(), SandboxError>;

    /// Launch the container, wait up to `wait_timeout`, kill on expiry, and
    /// return captured signals. Implementations must force-remove the
    /// container on every exit path, swallowing removal errors.
    async fn run(&self, spec: &LaunchSpec, wait_timeout: Duration) -> Result<RunOutput, SandboxError>;
}

// ── DockerCli ──────────────────────────────────────────────────────────

/// Production runtime speaking to a local Docker daemon through the CLI.
#[derive(Debug, Clone)]
pub struct DockerCli {
    binary: String,
}

impl DockerCli {
    /// Runtime using the `docker` binary from `PATH`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            binary: "docker".to_owned(),
        }
    }

    /// Runtime using an explicit binary path (tests, podman shims).
    #[must_use]
    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn run_args(&self, name: &str, spec: &LaunchSpec) -> Vec<String> {
        let mut args: Vec<String> = vec![
            "run".into(),
            "--name".into(),
            name.into(),
            "--network".into(),
            "none".into(),
            "--read-only".into(),
            "--memory".into(),
            spec.limits.mem_limit.into(),
            "--cpus".into(),
            spec.limits.cpus.to_string(),
            "--pids-limit".into(),
            spec.limits.pids_limit.to_string(),
            "--mount".into(),
            format!(
                "type=bind,source={},target={SOURCE_MOUNT},readonly",
                spec.source_dir.display()
            ),
            "--tmpfs".into(),
            format!(
                "{SCRATCH_MOUNT}:rw,noexec,nosuid,size={}",
                spec.limits.tmpfs_size
            ),
        ];
        args.push(spec.image.clone());
        args.extend(spec.command.iter().cloned());
        args
    }

    async fn quiet(&self, args: &[&str]) {
        let _ = Command::new(&self.binary)
            .args(args)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;
    }
}

impl Default for DockerCli {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContainerRuntime for DockerCli {
    async fn probe(&self) -> Result<(), SandboxError> {
        let status = Command::new(&self.binary)
            .args(["version", "--format", "{{.Server.Version}}"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|err| SandboxError::Unreachable {
                reason: err.to_string(),
            })?;
        if status.success() {
            Ok(())
        } else {
            Err(SandboxError::Unreachable {
                reason: format!("docker daemon probe exited with {status}"),
            })
        }
    }

    async fn run(&self, spec: &LaunchSpec, wait_timeout: Duration) -> Result<RunOutput, SandboxError> {
        let name = format!("warden-{}", Uuid::new_v4());
        let args = self.run_args(&name, spec);
        debug!(container = %name, "launching sandbox container");

        let mut child = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| SandboxError::Launch {
                reason: err.to_string(),
            })?;

        let cap = spec.limits.log_cap_bytes;
        let stdout_task = child
            .stdout
            .take()
            .map(|stream| tokio::spawn(read_capped(stream, cap)));
        let stderr_task = child
            .stderr
            .take()
            .map(|stream| tokio::spawn(read_capped(stream, cap)));

        let (exit_code, timed_out) = match tokio::time::timeout(wait_timeout, child.wait()).await {
            Ok(Ok(status)) => (status.code().unwrap_or(-1), false),
            Ok(Err(err)) => {
                self.quiet(&["rm", "-f", name.as_str()]).await;
                return Err(SandboxError::Launch {
                    reason: err.to_string(),
                });
            }
            Err(_elapsed) => {
                // Deadline expired: SIGKILL the container, then reap the CLI
                // child so the log pipes close.
                self.quiet(&["kill", name.as_str()]).await;
                let _ = child.start_kill();
                let _ = child.wait().await;
                (-1, true)
            }
        };

        let (stdout, stdout_capped) = join_capture(stdout_task).await;
        let (stderr, stderr_capped) = join_capture(stderr_task).await;

        self.quiet(&["rm", "-f", name.as_str()]).await;

        Ok(RunOutput {
            exit_code,
            timed_out,
            stdout,
            stderr,
            stdout_capped,
            stderr_capped,
        })
    }
}

/// Read up to `cap` bytes, flagging overflow, then drain the remainder so
/// the writer never blocks on a full pipe.
async fn read_capped<R>(mut reader: R, cap: usize) -> (Vec<u8>, bool)
where
    R: AsyncRead + Unpin + Send,
{
    let mut buf = Vec::new();
    let mut limited = (&mut reader).take(cap as u64 + 1);
    if limited.read_to_end(&mut buf).await.is_err() {
        return (buf, false);
    }
    let capped = buf.len() > cap;
    if capped {
        buf.truncate(cap);
        let _ = tokio::io::copy(&mut reader, &mut tokio::io::sink()).await;
    }
    (buf, capped)
}

async fn join_capture(
    task: Option<tokio::task::JoinHandle<(Vec<u8>, bool)>>,
) -> (Vec<u8>, bool) {
    match task {
        Some(handle) => handle.await.unwrap_or((Vec::new(), false)),
        None => (Vec::new(), false),
    }
}

// ── Tests ──────────────────────────────────────────────────────────────
