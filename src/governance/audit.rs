//! The per-request egress audit record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Decision trail of one governance pass. Produced exactly once per request
/// and read-only afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GovernanceAuditRecord {
    /// Identifier of the audited request.
    pub request_id: String,
    /// UTC time the pass completed.
    pub timestamp: DateTime<Utc>,
    /// Number of context file paths inspected.
    pub file_count: usize,
    /// Confirmed secret-pattern redactions made.
    pub redaction_count: usize,
    /// High-entropy token redactions made.
    pub high_entropy_redaction_count: usize,
    /// Whether phrase stripping or truncation changed the content.
    pub prompt_minimized: bool,
    /// Whether egress was blocked.
    pub blocked: bool,
    /// Reason for the block, when blocked.
    pub block_reason: Option<String>,
    /// True when a confirmed secret pattern was found and redacted.
    pub secret_leak_detected: bool,
    /// UTF-8 byte length of the outbound content; 0 when blocked.
    pub bytes_sent: u64,
}

impl GovernanceAuditRecord {
    /// Fresh record for a request with all counters at zero.
    #[must_use]
    pub fn new(request_id: impl Into<String>, file_count: usize) -> Self {
        Self {
            request_id: request_id.into(),
            timestamp: Utc::now(),
            file_count,
            redaction_count: 0,
            high_entropy_redaction_count: 0,
            prompt_minimized: false,
            blocked: false,
            block_reason: None,
            secret_leak_detected: false,
            bytes_sent: 0,
        }
    }
}
