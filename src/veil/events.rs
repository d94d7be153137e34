//! Ledger event records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::taxonomy::{FailureClass, RunStatus};

use super::fingerprint::EnvironmentFingerprint;

/// Discriminator carried by every ledger event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VeilEventType {
    /// Execution telemetry, written for every orchestration.
    Telemetry,
    /// Behavioural memory, written only behind the determinism gate.
    Behavioral,
}

// ── TelemetryEvent ─────────────────────────────────────────────────────

/// Lightweight record of one orchestration's execution telemetry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryEvent {
    /// Always [`VeilEventType::Telemetry`].
    pub event_type: VeilEventType,
    /// Identifier of the orchestrated request.
    pub request_id: String,
    /// UTC time the event was recorded.
    pub timestamp: DateTime<Utc>,
    /// Final orchestration outcome.
    pub outcome: RunStatus,
    /// Failure class of the last attempt, when any.
    pub failure_class: Option<FailureClass>,
    /// Attempts consumed.
    pub attempt_count: u8,
    /// Sandbox wall-clock summed across attempts, milliseconds.
    pub duration_ms: u64,
}

// ── BehavioralEvent ────────────────────────────────────────────────────

/// Rich record written only when a run passes the determinism gate; these
/// form the episodic memory behavioural rules are distilled from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehavioralEvent {
    /// Always [`VeilEventType::Behavioral`].
    pub event_type: VeilEventType,
    /// Identifier of the orchestrated request.
    pub request_id: String,
    /// UTC time the event was recorded.
    pub timestamp: DateTime<Utc>,
    /// Final orchestration outcome.
    pub outcome: RunStatus,
    /// Failure class of the last attempt, when any.
    pub failure_class: Option<FailureClass>,
    /// Attempts consumed.
    pub attempt_count: u8,
    /// Sandbox wall-clock summed across attempts, milliseconds.
    pub duration_ms: u64,
    /// Environment that produced the run.
    pub fingerprint: EnvironmentFingerprint,
}
