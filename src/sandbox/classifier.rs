//! Violation classifier.
//!
//! Deterministic mapping from execution signals to a
//! `(ViolationEvent, FailureClass)` pair. No heuristics, no models — only
//! substring matching on known signals, evaluated in strict priority order.
//! The order is part of the contract: re-ordering any rule changes
//! observable behaviour.

use crate::taxonomy::{FailureClass, ViolationEvent};

/// Socket-layer errors surfacing when the network is disabled.
const NETWORK_SIGNALS: &[&str] = &[
    "network is unreachable",
    "name or service not known",
    "connection refused",
    "errno 101",
    "errno 111",
    "[errno 110]",
    "socket.gaierror",
];

/// Write failures against read-only mounts.
const FILESYSTEM_SIGNALS: &[&str] = &["read-only file system", "[errno 30]", "erofs"];

/// Fork/thread/allocation failures under the pids cap.
const PROCESS_SIGNALS: &[&str] = &[
    "resource temporarily unavailable",
    "can't start new thread",
    "cannot allocate memory",
    "fork: retry",
    "pids limit",
];

/// Seccomp and capability denials.
const SYSCALL_SIGNALS: &[&str] = &[
    "seccomp",
    "operation not permitted",
    "permission denied",
    "bad system call",
];

// ── ExecutionSignals ───────────────────────────────────────────────────

/// Everything the classifier looks at from one run.
#[derive(Debug, Clone, Default)]
pub struct ExecutionSignals {
    /// Container exit code (-1 when killed or unavailable).
    pub exit_code: i32,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
    /// Whether the run hit a wall-clock or budget deadline.
    pub timed_out: bool,
    /// Whether an output stream exceeded the log cap.
    pub output_capped: bool,
}

/// Classify a sandbox run. First matching rule wins:
///
/// 1. timeout
/// 2. output cap
/// 3. clean pass (exit 0)
/// 4. network signals
/// 5. read-only filesystem signals
/// 6. process-limit signals
/// 7. seccomp/syscall signals
/// 8. OOM kill (exit 137)
/// 9. interpreter syntax errors
/// 10. generic deterministic failure
#[must_use]
pub fn classify(signals: &ExecutionSignals) -> (Option<ViolationEvent>, Option<FailureClass>) {
    // 1. Timeout — SIGKILL at the limit, checked before anything else.
    if signals.timed_out {
        return (
            Some(ViolationEvent::TimeoutViolation),
            Some(FailureClass::Timeout),
        );
    }

    // 2. Output cap breach outranks even a clean exit code.
    if signals.output_capped {
        return (
            Some(ViolationEvent::OutputLimitViolation),
            Some(FailureClass::Policy),
        );
    }

    // 3. Clean pass.
    if signals.exit_code == 0 {
        return (None, None);
    }

    let stderr_lower = signals.stderr.to_lowercase();
    let combined = format!("{stderr_lower}{}", signals.stdout.to_lowercase());

    // 4. Network access attempts surface as socket errors under network=none.
    if contains_any(&combined, NETWORK_SIGNALS) {
        return (
            Some(ViolationEvent::NetworkAccessViolation),
            Some(FailureClass::Policy),
        );
    }

    // 5. Writes against the read-only mounts.
    if contains_any(&combined, FILESYSTEM_SIGNALS) {
        return (
            Some(ViolationEvent::FilesystemWriteViolation),
            Some(FailureClass::Policy),
        );
    }

    // 6. Process/thread cap.
    if contains_any(&combined, PROCESS_SIGNALS) {
        return (
            Some(ViolationEvent::ProcessLimitViolation),
            Some(FailureClass::Policy),
        );
    }

    // 7. Seccomp / capability denials.
    if contains_any(&combined, SYSCALL_SIGNALS) {
        return (
            Some(ViolationEvent::SyscallViolation),
            Some(FailureClass::Policy),
        );
    }

    // 8. OOM kill: exit 137 with a kill marker or a silent stderr.
    if signals.exit_code == 137
        && (combined.contains("killed")
            || combined.contains("out of memory")
            || signals.stderr.trim().is_empty())
    {
        return (
            Some(ViolationEvent::MemoryLimitViolation),
            Some(FailureClass::Policy),
        );
    }

    // 9. Interpreter rejected the candidate.
    if stderr_lower.contains("syntaxerror") || stderr_lower.contains("indentationerror") {
        return (None, Some(FailureClass::Syntax));
    }

    // 10. Any other non-zero exit is a deterministic logical failure.
    (None, Some(FailureClass::Deterministic))
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

// ── Tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn signals(exit_code: i32, stderr: &str) -> ExecutionSignals {
        ExecutionSignals {
            exit_code,
            stderr: stderr.to_owned(),
            ..ExecutionSignals::default()
        }
    }

    #[test]
    fn clean_exit_is_a_pass() {
        assert_eq!(classify(&signals(0, "")), (None, None));
    }

    #[test]
    fn timeout_wins_over_everything() {
        let s = ExecutionSignals {
            exit_code: 0,
            stderr: "connection refused".into(),
            timed_out: true,
            output_capped: true,
            ..ExecutionSignals::default()
        };
        assert_eq!(
            classify(&s),
            (
                Some(ViolationEvent::TimeoutViolation),
                Some(FailureClass::Timeout)
            )
        );
    }

    #[test]
    fn output_cap_outranks_clean_exit() {
        let s = ExecutionSignals {
            exit_code: 0,
            output_capped: true,
            ..ExecutionSignals::default()
        };
        assert_eq!(
            classify(&s),
            (
                Some(ViolationEvent::OutputLimitViolation),
                Some(FailureClass::Policy)
            )
        );
    }

    #[test]
    fn network_signal_in_stdout_counts_too() {
        let s = ExecutionSignals {
            exit_code: 1,
            stdout: "socket.gaierror: [Errno -3]".into(),
            ..ExecutionSignals::default()
        };
        assert_eq!(
            classify(&s).0,
            Some(ViolationEvent::NetworkAccessViolation)
        );
    }

    #[test]
    fn syntax_error_has_no_terminal_event() {
        let s = signals(1, "  File \"candidate.py\", line 2\nSyntaxError: invalid syntax");
        assert_eq!(classify(&s), (None, Some(FailureClass::Syntax)));
    }

    #[test]
    fn plain_failure_is_deterministic() {
        let s = signals(1, "ZeroDivisionError: division by zero");
        assert_eq!(classify(&s), (None, Some(FailureClass::Deterministic)));
    }
}
