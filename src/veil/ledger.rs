//! In-process event ledger.
//!
//! Telemetry is written for every orchestration; behavioural events only
//! for runs the determinism gate admits. The ledger owns its lists
//! exclusively; readers get cloned snapshots and observe strictly
//! monotonic growth.

use chrono::Utc;
use parking_lot::RwLock;
use tracing::debug;

use crate::orchestrator::OrchestrationResult;

use super::events::{BehavioralEvent, TelemetryEvent, VeilEventType};
use super::fingerprint::EnvironmentFingerprint;
use super::gate::GateDecision;

#[derive(Debug, Default)]
struct LedgerStore {
    telemetry: Vec<TelemetryEvent>,
    behavioral: Vec<BehavioralEvent>,
}

// ── VeilLedger ─────────────────────────────────────────────────────────

/// List-backed event store shared across request tasks. Writers take the
/// write lock; snapshot readers take the read lock.
#[derive(Debug, Default)]
pub struct VeilLedger {
    store: RwLock<LedgerStore>,
}

impl VeilLedger {
    /// Empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one orchestration outcome.
    ///
    /// Always appends a telemetry event; appends a behavioural event only
    /// when `decision.passed`, attaching the fingerprint.
    pub fn record(
        &self,
        decision: &GateDecision,
        result: &OrchestrationResult,
        fingerprint: &EnvironmentFingerprint,
    ) {
        let now = Utc::now();
        let failure_class = result
            .last_verification()
            .and_then(|verification| verification.failure_class);
        let duration_ms = result.total_duration_ms();

        let mut store = self.store.write();
        store.telemetry.push(TelemetryEvent {
            event_type: VeilEventType::Telemetry,
            request_id: result.request_id.clone(),
            timestamp: now,
            outcome: result.final_status,
            failure_class,
            attempt_count: result.attempt_count,
            duration_ms,
        });

        if decision.passed {
            debug!(
                request_id = %result.request_id,
                reason = %decision.reason,
                "gate admitted run into behavioural memory"
            );
            store.behavioral.push(BehavioralEvent {
                event_type: VeilEventType::Behavioral,
                request_id: result.request_id.clone(),
                timestamp: now,
                outcome: result.final_status,
                failure_class,
                attempt_count: result.attempt_count,
                duration_ms,
                fingerprint: fingerprint.clone(),
            });
        }
    }

    /// Snapshot of all recorded telemetry events.
    #[must_use]
    pub fn telemetry(&self) -> Vec<TelemetryEvent> {
        self.store.read().telemetry.clone()
    }

    /// Snapshot of all recorded behavioural events.
    #[must_use]
    pub fn behavioral(&self) -> Vec<BehavioralEvent> {
        self.store.read().behavioral.clone()
    }
}
