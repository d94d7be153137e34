//! Attestation manifests: builder wiring, tier priorities, the completeness
//! guard, and wire-format stability.

mod common;

use codewarden::attestation::{
    AttestationError, MANIFEST_SCHEMA_VERSION, assert_complete, build_manifest, map_tier,
};
use codewarden::taxonomy::{
    FailureClass, RunStatus, VerificationTier, ViolationEvent,
};
use serde_json::json;

use common::{fail_result, pass_result};

#[test]
fn manifest_carries_full_evidence_chain() {
    let mut result = pass_result("req-att-1", 2);
    result
        .runtime_config
        .insert("command".into(), json!("python /source/candidate.py"));
    result.artifacts.push("logs/run.txt".into());
    result.skipped_checks.push("lint".into());

    let manifest = build_manifest(&result, 1, None).unwrap();
    assert_eq!(manifest.request_id, "req-att-1");
    assert_eq!(manifest.attempt, 2);
    assert_eq!(manifest.schema_version, MANIFEST_SCHEMA_VERSION);
    assert_eq!(manifest.retries_used, 1);
    assert_eq!(manifest.commands_run, vec!["python /source/candidate.py"]);
    assert_eq!(manifest.artifact_refs, vec!["logs/run.txt"]);
    assert_eq!(manifest.skipped_checks, vec!["lint"]);
    assert_eq!(manifest.status, RunStatus::Pass);
}

#[test]
fn failed_result_keeps_classification_in_manifest() {
    let result = fail_result(
        "req-att-2",
        3,
        Some(FailureClass::Policy),
        Some(ViolationEvent::NetworkAccessViolation),
    );
    let manifest = build_manifest(&result, 2, None).unwrap();
    assert_eq!(manifest.status, RunStatus::Fail);
    assert_eq!(manifest.failure_class, Some(FailureClass::Policy));
    assert_eq!(
        manifest.terminal_event,
        Some(ViolationEvent::NetworkAccessViolation)
    );
}

// Invariant: human_review_required is true exactly for AI_TESTS_ONLY.
#[test]
fn human_review_tracks_the_tier() {
    let configs: [(serde_json::Value, VerificationTier, bool); 3] = [
        (json!({"ai_tests_only": true}), VerificationTier::AiTestsOnly, true),
        (json!({"integration_tests": true}), VerificationTier::L2, false),
        (json!({"user_tests": true}), VerificationTier::L1, false),
    ];
    for (config, expected_tier, review) in configs {
        let mut result = pass_result("req-att-3", 1);
        if let serde_json::Value::Object(entries) = config {
            result.runtime_config.extend(entries);
        }
        let manifest = build_manifest(&result, 0, None).unwrap();
        assert_eq!(manifest.tier, expected_tier);
        assert_eq!(manifest.human_review_required, review);
    }
}

// Tier priority: the AI-tests signal wins even when L2 signals are present.
#[test]
fn ai_tests_signal_outranks_l2() {
    let mut result = pass_result("req-att-4", 1);
    result.runtime_config.insert("integration_tests".into(), json!(true));
    result.runtime_config.insert("tier".into(), json!("ai_tests_only"));
    assert_eq!(map_tier(&result), VerificationTier::AiTestsOnly);
}

// L2 requires a pass; on failure the mapping falls to L0.
#[test]
fn l2_signal_requires_a_pass() {
    let mut result = fail_result("req-att-5", 1, Some(FailureClass::Deterministic), None);
    result.runtime_config.insert("e2e_tests".into(), json!(true));
    assert_eq!(map_tier(&result), VerificationTier::L0);
}

#[test]
fn guard_is_the_single_enforcement_point() {
    // Missing manifest.
    assert!(matches!(
        assert_complete(None),
        Err(AttestationError::Incomplete { .. })
    ));

    // Complete manifest passes through unchanged.
    let manifest = build_manifest(&pass_result("req-att-6", 1), 0, None).unwrap();
    let checked = assert_complete(Some(&manifest)).unwrap();
    assert_eq!(checked.request_id, "req-att-6");

    // Empty identity fails.
    let mut broken = manifest.clone();
    broken.request_id = "   ".into();
    assert!(matches!(
        assert_complete(Some(&broken)),
        Err(AttestationError::Incomplete { .. })
    ));
}

#[test]
fn manifest_round_trips_with_stable_wire_names() {
    let mut result = pass_result("req-att-7", 1);
    result.runtime_config.insert("ai_tests_only".into(), json!(true));
    let manifest = build_manifest(&result, 0, None).unwrap();

    let value = serde_json::to_value(&manifest).unwrap();
    assert_eq!(value["tier"], "AI_TESTS_ONLY");
    assert_eq!(value["status"], "pass");
    assert_eq!(value["mode"], "balanced");
    assert_eq!(value["human_review_required"], json!(true));

    let back: codewarden::attestation::AttestationManifest =
        serde_json::from_value(value).unwrap();
    assert_eq!(back.tier, VerificationTier::AiTestsOnly);
}

#[test]
fn retries_above_the_ceiling_are_rejected() {
    let err = build_manifest(&pass_result("req-att-8", 1), 3, None).unwrap_err();
    assert!(err.to_string().contains("retries_used"));
}
