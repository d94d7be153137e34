//! VEIL: verified-environment incident ledger.
//!
//! The memory side of the gateway. Every orchestration leaves telemetry;
//! only environmentally-reproducible, signal-bearing runs — as judged by the
//! [`DeterminismGate`] against an [`EnvironmentFingerprint`] baseline —
//! become behavioural memory.
//!
//! - [`fingerprint`] - five-hash environment identity
//! - [`gate`] - the determinism predicate and its closed reason set
//! - [`events`] - telemetry and behavioural records
//! - [`ledger`] - the in-process, lock-guarded event store

pub mod events;
pub mod fingerprint;
pub mod gate;
pub mod ledger;

pub use events::{BehavioralEvent, TelemetryEvent, VeilEventType};
pub use fingerprint::{EnvironmentFingerprint, FingerprintInputs, sha256_file, sha256_string};
pub use gate::{DeterminismGate, GateDecision, reason};
pub use ledger::VeilLedger;
