//! # codewarden: Trusted-Execution Gateway for AI-Generated Code
//!
//! codewarden sits between a user request and a remote LLM provider, and
//! between the provider's output and any claim that the output "works".
//! Nothing confidential leaves the process without policy review, and no
//! AI-authored code is labelled *verified* without reproducible,
//! sandbox-backed evidence.
//!
//! ## Pipeline
//!
//! ```text
//! request ──► Governance ──► LLM ──► Extractor ──► Sandbox ──► Classifier
//!                  │                                   │
//!                  └──────── Audit ──────┐   ┌── VerificationResult
//!                                        ▼   ▼
//!                                 Orchestrator (retry loop)
//!                                        │
//!                         ┌──────────────┼──────────────┐
//!                         ▼              ▼              ▼
//!                    Attestation   DeterminismGate  RepairPrompt
//!                     Manifest           │
//!                                        ▼
//!                                     Ledger
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use codewarden::governance::GovernancePipeline;
//! use codewarden::sandbox::{DockerCli, SandboxExecutor};
//! use codewarden::taxonomy::{ContextPayload, VerificationMode};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! // Governance: policy tables compile once, run per request.
//! let governance = GovernancePipeline::with_defaults()?;
//! let payload = ContextPayload::new("req-1", 1, vec!["src/app.py".into()], "fix the bug")?;
//! let (safe, audit) = governance.run(&payload);
//! assert!(!audit.blocked);
//!
//! // Sandbox: candidate code runs with no network and hard limits.
//! let sandbox = SandboxExecutor::new(Arc::new(DockerCli::new()));
//! let verdict = sandbox
//!     .verify("print('hello')", "req-1", 1, VerificationMode::Balanced)
//!     .await;
//! assert_eq!(verdict.request_id, "req-1");
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Guide
//!
//! - [`taxonomy`] - shared closed enums and validated records
//! - [`governance`] - egress policy: paths, secrets, entropy, injection
//! - [`gateway`] - LLM provider client and candidate extraction
//! - [`sandbox`] - hardened container executor and violation classifier
//! - [`orchestrator`] - bounded circuit-breaker retry loop
//! - [`attestation`] - manifest builder, tier mapping, completeness guard
//! - [`veil`] - environment fingerprint, determinism gate, event ledger
//! - [`interceptor`] - single-attempt generation chain
//! - [`api`] - axum HTTP surface
//! - [`env`] - upward-walking `.env` discovery

#![warn(missing_docs)]

pub mod api;
pub mod attestation;
pub mod env;
pub mod gateway;
pub mod governance;
pub mod interceptor;
pub mod orchestrator;
pub mod sandbox;
pub mod taxonomy;
pub mod veil;

/// Re-exports for convenient access to the core types.
pub mod prelude {
    pub use crate::attestation::{AttestationManifest, assert_complete, build_manifest};
    pub use crate::governance::{GovernanceAuditRecord, GovernancePipeline};
    pub use crate::interceptor::{Interceptor, InterceptorResponse, InterceptorService};
    pub use crate::orchestrator::{OrchestrationResult, Orchestrator, VeilHook};
    pub use crate::sandbox::{ContainerRuntime, DockerCli, SandboxExecutor};
    pub use crate::taxonomy::{
        ContextPayload, FailureClass, RunStatus, VerificationMode, VerificationResult,
        VerificationTier, ViolationEvent,
    };
    pub use crate::veil::{DeterminismGate, EnvironmentFingerprint, GateDecision, VeilLedger};
}
