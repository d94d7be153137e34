//! Circuit-breaker orchestration.
//!
//! Composes governance, cloud generation, extraction, and sandbox
//! verification into a bounded retry state machine, then feeds the VEIL
//! ledger through the determinism gate.
//!
//! - [`service`] - the retry loop itself
//! - [`retry`] - eligibility rules, evaluated in strict priority order
//! - [`prompts`] - the deterministic repair prompt builder
//! - [`models`] - attempt records and the aggregated result

pub mod models;
pub mod prompts;
pub mod retry;
pub mod service;

pub use models::{AttemptRecord, OrchestrationResult};
pub use prompts::build_repair_prompt;
pub use retry::{MAX_ATTEMPTS, RetryDecision};
pub use service::{Orchestrator, VeilHook};
