//! Violation classifier priority contract.
//!
//! Each rule gets a targeted test proving its position: an input built to
//! match rule N *and* a later rule must classify as rule N.

use codewarden::sandbox::{ExecutionSignals, classify};
use codewarden::taxonomy::{FailureClass, ViolationEvent};

fn base() -> ExecutionSignals {
    ExecutionSignals::default()
}

// Rule 1: timeout beats output cap, network signals, and exit codes.
#[test]
fn rule_1_timeout_beats_all_later_rules() {
    let signals = ExecutionSignals {
        exit_code: 137,
        stderr: "connection refused; read-only file system; killed".into(),
        timed_out: true,
        output_capped: true,
        ..base()
    };
    assert_eq!(
        classify(&signals),
        (
            Some(ViolationEvent::TimeoutViolation),
            Some(FailureClass::Timeout)
        )
    );
}

// Rule 2: output cap beats a clean exit and every signal table.
#[test]
fn rule_2_output_cap_beats_pass_and_signals() {
    let signals = ExecutionSignals {
        exit_code: 0,
        stdout: "network is unreachable".into(),
        output_capped: true,
        ..base()
    };
    assert_eq!(
        classify(&signals),
        (
            Some(ViolationEvent::OutputLimitViolation),
            Some(FailureClass::Policy)
        )
    );
}

// Rule 3: exit 0 passes even with scary stderr text.
#[test]
fn rule_3_clean_exit_ignores_stderr_noise() {
    let signals = ExecutionSignals {
        exit_code: 0,
        stderr: "warning: connection refused during optional telemetry".into(),
        ..base()
    };
    assert_eq!(classify(&signals), (None, None));
}

// Rule 4: network signals beat filesystem, process, and syscall tables.
#[test]
fn rule_4_network_beats_later_tables() {
    let signals = ExecutionSignals {
        exit_code: 1,
        stderr: "connection refused; read-only file system; operation not permitted".into(),
        ..base()
    };
    assert_eq!(
        classify(&signals),
        (
            Some(ViolationEvent::NetworkAccessViolation),
            Some(FailureClass::Policy)
        )
    );
}

// Rule 4 matches each listed network signal.
#[test]
fn rule_4_every_network_signal_matches() {
    for signal in [
        "network is unreachable",
        "name or service not known",
        "connection refused",
        "errno 101",
        "errno 111",
        "[errno 110]",
        "socket.gaierror",
    ] {
        let signals = ExecutionSignals {
            exit_code: 1,
            stderr: format!("OSError: {signal}"),
            ..base()
        };
        assert_eq!(
            classify(&signals).0,
            Some(ViolationEvent::NetworkAccessViolation),
            "signal '{signal}' should classify as network"
        );
    }
}

// Rule 5: filesystem signals beat process and syscall tables.
#[test]
fn rule_5_filesystem_beats_later_tables() {
    let signals = ExecutionSignals {
        exit_code: 1,
        stderr: "erofs; cannot allocate memory; permission denied".into(),
        ..base()
    };
    assert_eq!(
        classify(&signals),
        (
            Some(ViolationEvent::FilesystemWriteViolation),
            Some(FailureClass::Policy)
        )
    );
}

// Rule 6: process-limit signals beat the syscall table.
#[test]
fn rule_6_process_limit_beats_syscall() {
    let signals = ExecutionSignals {
        exit_code: 1,
        stderr: "can't start new thread; operation not permitted".into(),
        ..base()
    };
    assert_eq!(
        classify(&signals),
        (
            Some(ViolationEvent::ProcessLimitViolation),
            Some(FailureClass::Policy)
        )
    );
}

// Rule 7: syscall signals beat the OOM heuristic.
#[test]
fn rule_7_syscall_beats_oom_heuristic() {
    let signals = ExecutionSignals {
        exit_code: 137,
        stderr: "bad system call (killed)".into(),
        ..base()
    };
    assert_eq!(
        classify(&signals),
        (
            Some(ViolationEvent::SyscallViolation),
            Some(FailureClass::Policy)
        )
    );
}

// Rule 8: exit 137 with empty stderr is an OOM kill.
#[test]
fn rule_8_exit_137_with_silent_stderr_is_oom() {
    let signals = ExecutionSignals {
        exit_code: 137,
        ..base()
    };
    assert_eq!(
        classify(&signals),
        (
            Some(ViolationEvent::MemoryLimitViolation),
            Some(FailureClass::Policy)
        )
    );
}

// Rule 8 requires the kill marker when stderr is non-empty.
#[test]
fn rule_8_exit_137_with_other_stderr_falls_through() {
    let signals = ExecutionSignals {
        exit_code: 137,
        stderr: "ValueError: nope".into(),
        ..base()
    };
    assert_eq!(classify(&signals), (None, Some(FailureClass::Deterministic)));
}

// Rule 9: syntax errors beat the deterministic fallback, with no event.
#[test]
fn rule_9_syntax_beats_deterministic() {
    for marker in ["SyntaxError: invalid syntax", "IndentationError: unexpected indent"] {
        let signals = ExecutionSignals {
            exit_code: 1,
            stderr: marker.to_owned(),
            ..base()
        };
        assert_eq!(
            classify(&signals),
            (None, Some(FailureClass::Syntax)),
            "marker '{marker}' should classify as syntax"
        );
    }
}

// Rule 9 only looks at stderr; a syntax mention on stdout is not a match.
#[test]
fn rule_9_only_reads_stderr() {
    let signals = ExecutionSignals {
        exit_code: 1,
        stdout: "printing the word SyntaxError".into(),
        ..base()
    };
    assert_eq!(classify(&signals), (None, Some(FailureClass::Deterministic)));
}

// Rule 10: any other non-zero exit is deterministic.
#[test]
fn rule_10_fallback_is_deterministic() {
    let signals = ExecutionSignals {
        exit_code: 2,
        stderr: "KeyError: 'missing'".into(),
        ..base()
    };
    assert_eq!(classify(&signals), (None, Some(FailureClass::Deterministic)));
}
