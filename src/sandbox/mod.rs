//! Hardened execution sandbox.
//!
//! Candidate code runs inside a locked-down container: no network, read-only
//! root and source mounts, a small scratch tmpfs, and hard CPU / memory /
//! pids / log limits. The executor turns every run — including harness
//! failures — into a canonical [`VerificationResult`](crate::taxonomy::VerificationResult);
//! the [`classifier`] maps raw signals onto the violation taxonomy.
//!
//! - [`limits`] - the balanced policy profile
//! - [`runtime`] - the [`ContainerRuntime`] seam and the Docker CLI driver
//! - [`executor`] - lifecycle: write, probe, launch, wait, cap, remove
//! - [`classifier`] - exit-code + stderr pattern → event/class pair

pub mod classifier;
pub mod executor;
pub mod limits;
pub mod runtime;

pub use classifier::{ExecutionSignals, classify};
pub use executor::SandboxExecutor;
pub use limits::{RuntimeLimits, SANDBOX_IMAGE};
pub use runtime::{ContainerRuntime, DockerCli, LaunchSpec, RunOutput, SandboxError};
