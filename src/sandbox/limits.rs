//! Balanced-mode runtime limits.
//!
//! All limits are hard-coded policy defaults; there is no override path.
//! Network stays disabled in every mode.

use std::time::Duration;

use serde_json::{Map, Value, json};

use crate::taxonomy::VerificationMode;

/// Image tag the sandbox launches. Must be built and present locally before
/// the verify surface is served.
pub const SANDBOX_IMAGE: &str = "warden-sandbox:latest";

/// Path the candidate source directory is mounted at, read-only.
pub const SOURCE_MOUNT: &str = "/source";

/// Writable scratch tmpfs mount point.
pub const SCRATCH_MOUNT: &str = "/scratch";

/// Candidate file name written into the source directory.
pub const CANDIDATE_FILE: &str = "candidate.py";

// ── RuntimeLimits ──────────────────────────────────────────────────────

/// Hard resource limits applied to a sandbox run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeLimits {
    /// Wall clock allowed for a single container run.
    pub per_run_timeout: Duration,
    /// Total budget for the whole request, shared across retries.
    pub total_budget: Duration,
    /// Container memory limit, docker syntax.
    pub mem_limit: &'static str,
    /// vCPU equivalents.
    pub cpus: u32,
    /// Process/thread cap.
    pub pids_limit: u32,
    /// Cap applied to each captured output stream, in bytes.
    pub log_cap_bytes: usize,
    /// Scratch tmpfs size, docker syntax.
    pub tmpfs_size: &'static str,
}

impl RuntimeLimits {
    /// The balanced profile — the only supported mode in v1.
    #[must_use]
    pub fn balanced() -> Self {
        Self {
            per_run_timeout: Duration::from_secs(45),
            total_budget: Duration::from_secs(180),
            mem_limit: "1g",
            cpus: 2,
            pids_limit: 256,
            log_cap_bytes: 10 * 1024 * 1024,
            tmpfs_size: "512m",
        }
    }

    /// Snapshot of the applied policy for `runtime_config` on every result.
    #[must_use]
    pub fn snapshot(&self, mode: VerificationMode, command: &str) -> Map<String, Value> {
        let mut config = Map::new();
        config.insert("mode".into(), json!(mode.to_string()));
        config.insert("timeout_s".into(), json!(self.per_run_timeout.as_secs()));
        config.insert("budget_s".into(), json!(self.total_budget.as_secs()));
        config.insert("mem_limit".into(), json!(self.mem_limit));
        config.insert("cpus".into(), json!(self.cpus));
        config.insert("pids_limit".into(), json!(self.pids_limit));
        config.insert("log_cap_bytes".into(), json!(self.log_cap_bytes));
        config.insert("network".into(), json!("none"));
        config.insert("source_mount".into(), json!("ro"));
        config.insert("rootfs".into(), json!("ro"));
        config.insert(
            "tmpfs".into(),
            json!(format!("{SCRATCH_MOUNT}:{},noexec,nosuid", self.tmpfs_size)),
        );
        config.insert("command".into(), json!(command));
        config
    }
}

impl Default for RuntimeLimits {
    fn default() -> Self {
        Self::balanced()
    }
}

// ── Tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balanced_matches_policy_table() {
        let limits = RuntimeLimits::balanced();
        assert_eq!(limits.per_run_timeout, Duration::from_secs(45));
        assert_eq!(limits.total_budget, Duration::from_secs(180));
        assert_eq!(limits.mem_limit, "1g");
        assert_eq!(limits.cpus, 2);
        assert_eq!(limits.pids_limit, 256);
        assert_eq!(limits.log_cap_bytes, 10 * 1024 * 1024);
        assert_eq!(limits.tmpfs_size, "512m");
    }

    #[test]
    fn snapshot_records_network_disabled_and_command() {
        let snapshot = RuntimeLimits::balanced()
            .snapshot(VerificationMode::Balanced, "python /source/candidate.py");
        assert_eq!(snapshot["network"], json!("none"));
        assert_eq!(snapshot["source_mount"], json!("ro"));
        assert_eq!(snapshot["command"], json!("python /source/candidate.py"));
        assert!(snapshot["tmpfs"].as_str().unwrap().contains("noexec,nosuid"));
    }
}
