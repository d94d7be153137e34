//! The inbound unit of work.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Hard ceiling on attempts per request; attempt numbers outside 1..=3 are
/// rejected at construction.
pub const MAX_ATTEMPT: u8 = 3;

// ── PayloadError ───────────────────────────────────────────────────────

/// Validation failure while constructing a [`ContextPayload`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PayloadError {
    /// The request identifier was empty or whitespace.
    #[error("request_id must be a non-empty string")]
    EmptyRequestId,

    /// Attempt number outside the 1..=3 contract window.
    #[error("attempt must be between 1 and {MAX_ATTEMPT}, got {attempt}")]
    AttemptOutOfRange {
        /// The rejected attempt number.
        attempt: u8,
    },
}

// ── ContextPayload ─────────────────────────────────────────────────────

/// Inbound request context: identity, attempt number, file paths, and the
/// prompt content. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextPayload {
    /// Opaque unique identifier for this request.
    pub request_id: String,
    /// Current attempt number (1-3).
    pub attempt: u8,
    /// Ordered context file paths accompanying the content.
    pub files: Vec<String>,
    /// Prompt plus context content, UTF-8.
    pub content: String,
}

impl ContextPayload {
    /// Construct a validated payload.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadError`] when `request_id` is empty or `attempt` is
    /// outside 1..=3.
    pub fn new(
        request_id: impl Into<String>,
        attempt: u8,
        files: Vec<String>,
        content: impl Into<String>,
    ) -> Result<Self, PayloadError> {
        let request_id = request_id.into();
        if request_id.trim().is_empty() {
            return Err(PayloadError::EmptyRequestId);
        }
        if attempt == 0 || attempt > MAX_ATTEMPT {
            return Err(PayloadError::AttemptOutOfRange { attempt });
        }
        Ok(Self {
            request_id,
            attempt,
            files,
            content: content.into(),
        })
    }

    /// Copy of this payload with different content, keeping identity fields.
    #[must_use]
    pub fn with_content(&self, content: impl Into<String>) -> Self {
        Self {
            request_id: self.request_id.clone(),
            attempt: self.attempt,
            files: self.files.clone(),
            content: content.into(),
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────
