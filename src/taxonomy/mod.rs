//! Shared verification taxonomy: the closed enums and validated records that
//! every subsystem speaks.
//!
//! The taxonomy is deliberately its own module so that the attestation layer
//! and the sandbox layer both import from here instead of from each other.
//! Every enum below is closed — match sites are exhaustive and adding a
//! variant is a breaking change to the verification contract.
//!
//! - [`mode`] - isolation modes, evidence tiers, and run status
//! - [`class`] - failure classes and terminal violation events
//! - [`result`] - the canonical [`VerificationResult`] record
//! - [`payload`] - the inbound [`ContextPayload`] unit of work

pub mod class;
pub mod mode;
pub mod payload;
pub mod result;

pub use class::{FailureClass, ViolationEvent};
pub use mode::{RunStatus, VerificationMode, VerificationTier};
pub use payload::{ContextPayload, PayloadError};
pub use result::{SCHEMA_VERSION, VerificationResult, VerificationResultBuilder};
