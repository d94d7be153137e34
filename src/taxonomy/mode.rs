//! Isolation modes, evidence tiers, and the pass/fail status enum.

use serde::{Deserialize, Serialize};

// ── VerificationMode ───────────────────────────────────────────────────

/// Runtime isolation mode requested for a sandbox run.
///
/// Only [`Balanced`](Self::Balanced) is implemented in v1; the other modes
/// are declared so the wire contract is stable, and fail closed with
/// `StrictModeUnavailable` when requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationMode {
    /// Reduced isolation for quick iteration. Unsupported in v1.
    Fast,
    /// The default hardened profile: no network, read-only mounts, hard limits.
    Balanced,
    /// Maximum isolation (gVisor-class runtime). Unsupported in v1.
    Strict,
}

impl VerificationMode {
    /// Whether this mode has a working executor profile.
    #[must_use]
    pub fn is_supported(self) -> bool {
        matches!(self, Self::Balanced)
    }
}

impl Default for VerificationMode {
    fn default() -> Self {
        Self::Balanced
    }
}

impl std::fmt::Display for VerificationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fast => write!(f, "fast"),
            Self::Balanced => write!(f, "balanced"),
            Self::Strict => write!(f, "strict"),
        }
    }
}

// ── VerificationTier ───────────────────────────────────────────────────

/// Strength of the evidence behind a verified claim.
///
/// `AiTestsOnly` is the one tier that always demands human review before a
/// response may carry a "verified" label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VerificationTier {
    /// Static checks only: parse, lint, type.
    L0,
    /// Pre-existing user-owned tests passed.
    L1,
    /// Integration or end-to-end tests passed.
    L2,
    /// Only AI-authored tests ran; human review required.
    #[serde(rename = "AI_TESTS_ONLY")]
    AiTestsOnly,
}

impl std::fmt::Display for VerificationTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::L0 => write!(f, "L0"),
            Self::L1 => write!(f, "L1"),
            Self::L2 => write!(f, "L2"),
            Self::AiTestsOnly => write!(f, "AI_TESTS_ONLY"),
        }
    }
}

// ── RunStatus ──────────────────────────────────────────────────────────

/// Binary outcome of a sandbox run or an orchestration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// Exit code zero within budget, no policy breach.
    Pass,
    /// Anything else.
    Fail,
}

impl RunStatus {
    /// Returns `true` for [`Pass`](Self::Pass).
    #[must_use]
    pub fn is_pass(self) -> bool {
        matches!(self, Self::Pass)
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pass => write!(f, "pass"),
            Self::Fail => write!(f, "fail"),
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&VerificationMode::Balanced).unwrap(),
            r#""balanced""#
        );
        let parsed: VerificationMode = serde_json::from_str(r#""strict""#).unwrap();
        assert_eq!(parsed, VerificationMode::Strict);
    }

    #[test]
    fn only_balanced_is_supported() {
        assert!(VerificationMode::Balanced.is_supported());
        assert!(!VerificationMode::Fast.is_supported());
        assert!(!VerificationMode::Strict.is_supported());
    }

    #[test]
    fn tier_wire_names_are_stable() {
        assert_eq!(
            serde_json::to_string(&VerificationTier::AiTestsOnly).unwrap(),
            r#""AI_TESTS_ONLY""#
        );
        assert_eq!(serde_json::to_string(&VerificationTier::L2).unwrap(), r#""L2""#);
        let parsed: VerificationTier = serde_json::from_str(r#""AI_TESTS_ONLY""#).unwrap();
        assert_eq!(parsed, VerificationTier::AiTestsOnly);
    }

    #[test]
    fn status_round_trips() {
        assert_eq!(serde_json::to_string(&RunStatus::Pass).unwrap(), r#""pass""#);
        let parsed: RunStatus = serde_json::from_str(r#""fail""#).unwrap();
        assert_eq!(parsed, RunStatus::Fail);
        assert!(!parsed.is_pass());
    }
}
