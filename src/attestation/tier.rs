//! Tier mapping: derive the evidence tier from a verification result.
//!
//! Mapping rules, in priority order:
//!
//! 1. AI-authored-tests signals force `AI_TESTS_ONLY`
//! 2. integration / e2e tests passed → `L2`
//! 3. pre-existing user tests passed → `L1`
//! 4. otherwise mirror the executor's tier where passing (or for
//!    `AI_TESTS_ONLY` regardless), falling back to `L0`

use serde_json::Value;

use crate::taxonomy::{RunStatus, VerificationResult, VerificationTier};

/// Return the highest [`VerificationTier`] the result evidences.
///
/// Deterministic and based solely on fields the sandbox already produced.
#[must_use]
pub fn map_tier(result: &VerificationResult) -> VerificationTier {
    let cfg = &result.runtime_config;
    let passed = result.status == RunStatus::Pass;

    let ai_tests_flag = result
        .skipped_checks
        .iter()
        .any(|check| check.eq_ignore_ascii_case("ai_tests_only"))
        || truthy(cfg.get("ai_tests_only"))
        || runtime_label(cfg) == "ai_tests_only";
    if ai_tests_flag {
        return VerificationTier::AiTestsOnly;
    }

    let integration_flag = truthy(cfg.get("integration_tests")) || truthy(cfg.get("e2e_tests"));
    if integration_flag && passed {
        return VerificationTier::L2;
    }

    let user_tests_flag = truthy(cfg.get("user_tests")) || truthy(cfg.get("pre_existing_tests"));
    if user_tests_flag && passed {
        return VerificationTier::L1;
    }

    match result.tier {
        VerificationTier::L2 if passed => VerificationTier::L2,
        VerificationTier::L1 if passed => VerificationTier::L1,
        VerificationTier::AiTestsOnly => VerificationTier::AiTestsOnly,
        _ => VerificationTier::L0,
    }
}

/// Normalised tier label from `runtime_config`, or empty.
fn runtime_label(cfg: &serde_json::Map<String, Value>) -> String {
    let label = cfg
        .get("tier_label")
        .or_else(|| cfg.get("tier"))
        .and_then(Value::as_str)
        .unwrap_or("");
    label.trim().to_lowercase()
}

/// Python-style truthiness over JSON values.
fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(flag)) => *flag,
        Some(Value::Number(number)) => number.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::String(text)) => !text.is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(entries)) => !entries.is_empty(),
    }
}

// ── Tests ──────────────────────────────────────────────────────────────
