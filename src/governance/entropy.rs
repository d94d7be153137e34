//! High-entropy token detection.
//!
//! Shannon-entropy scanning catches non-patterned secrets (base64 blobs,
//! random API keys) that evade the regex families in
//! [`secrets`](super::secrets). Findings are redacted but never block: a
//! high-entropy token is a suspicion, not a confirmation.

use std::collections::HashMap;

use regex::Regex;

use super::GovernanceError;

/// Tokens with entropy at or above this many bits per character are flagged.
///
/// A perfectly random ASCII string of 64 characters sits near 6.0; English
/// prose averages 3.5-4.0.
pub const HIGH_ENTROPY_THRESHOLD: f64 = 4.5;

/// Tokens shorter than this are ignored.
pub const MIN_TOKEN_LEN: usize = 16;

/// Replacement marker for high-entropy (non-pattern-confirmed) tokens.
pub const HIGH_ENTROPY_MARKER: &str = "<REDACTED_HIGH_ENTROPY>";

const TOKENIZER: &str = r#"[\s'"=:,;()\[\]{}<>|\\@&#%!?]+"#;
const NON_TRIVIAL: &str = r"[0-9+/=_\-]";

// ── EntropyScanner ─────────────────────────────────────────────────────

/// Tokenising entropy scanner with compiled split and filter patterns.
#[derive(Debug, Clone)]
pub struct EntropyScanner {
    tokenizer: Regex,
    non_trivial: Regex,
}

impl EntropyScanner {
    /// Compile the scanner.
    ///
    /// # Errors
    ///
    /// Returns [`GovernanceError::PatternCompile`] if a built-in pattern
    /// fails to compile.
    pub fn with_defaults() -> Result<Self, GovernanceError> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|source| GovernanceError::PatternCompile {
                pattern: pattern.to_owned(),
                source,
            })
        };
        Ok(Self {
            tokenizer: compile(TOKENIZER)?,
            non_trivial: compile(NON_TRIVIAL)?,
        })
    }

    /// Return `(token, entropy)` for every over-threshold token.
    ///
    /// Purely alphabetical words (common in code and comments) are skipped to
    /// keep the false-positive rate down.
    #[must_use]
    pub fn scan(&self, content: &str) -> Vec<(String, f64)> {
        let mut flagged = Vec::new();
        for raw in self.tokenizer.split(content) {
            let token = raw.trim_matches(|c| matches!(c, '\'' | '"' | '`' | ')' | '\\'));
            if token.chars().count() < MIN_TOKEN_LEN {
                continue;
            }
            if !self.non_trivial.is_match(token) {
                continue;
            }
            let entropy = shannon_entropy(token);
            if entropy >= HIGH_ENTROPY_THRESHOLD {
                flagged.push((token.to_owned(), entropy));
            }
        }
        flagged
    }

    /// Replace every occurrence of each flagged token with
    /// [`HIGH_ENTROPY_MARKER`], returning the redacted content and the total
    /// replacement count.
    #[must_use]
    pub fn redact(&self, content: &str) -> (String, usize) {
        let flagged = self.scan(content);
        if flagged.is_empty() {
            return (content.to_owned(), 0);
        }

        let mut redacted = content.to_owned();
        let mut count = 0usize;
        let mut seen: Vec<String> = Vec::new();
        for (token, _) in flagged {
            if seen.contains(&token) {
                continue;
            }
            let occurrences = redacted.matches(token.as_str()).count();
            if occurrences > 0 {
                redacted = redacted.replace(token.as_str(), HIGH_ENTROPY_MARKER);
                count += occurrences;
            }
            seen.push(token);
        }
        (redacted, count)
    }
}

/// Shannon entropy of a string in bits per character.
#[must_use]
pub fn shannon_entropy(token: &str) -> f64 {
    if token.is_empty() {
        return 0.0;
    }
    let mut frequency: HashMap<char, usize> = HashMap::new();
    let mut length = 0usize;
    for c in token.chars() {
        *frequency.entry(c).or_insert(0) += 1;
        length += 1;
    }
    let length = length as f64;
    frequency
        .values()
        .map(|&count| {
            let p = count as f64 / length;
            -p * p.log2()
        })
        .sum()
}

// ── Tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn scanner() -> EntropyScanner {
        EntropyScanner::with_defaults().expect("built-in entropy patterns should compile")
    }

    #[test]
    fn empty_string_has_zero_entropy() {
        assert_eq!(shannon_entropy(""), 0.0);
    }

    #[test]
    fn uniform_string_has_zero_entropy() {
        assert_eq!(shannon_entropy("aaaaaaaa"), 0.0);
    }

    #[test]
    fn random_base64_exceeds_threshold() {
        let entropy = shannon_entropy("aB3xK9mQ7pL2vR5nW8jT4cF6hD1sG0yZ");
        assert!(entropy >= HIGH_ENTROPY_THRESHOLD, "entropy was {entropy}");
    }

    #[test]
    fn prose_stays_below_threshold() {
        let entropy = shannon_entropy("the_quick_brown_fox");
        assert!(entropy < HIGH_ENTROPY_THRESHOLD, "entropy was {entropy}");
    }

    #[test]
    fn short_tokens_skipped() {
        let flagged = scanner().scan("key=aB3xK9mQ7pL");
        assert!(flagged.is_empty());
    }

    #[test]
    fn pure_alpha_tokens_skipped() {
        // Long English-ish word with no digit or symbol characters.
        let flagged = scanner().scan("internationalization");
        assert!(flagged.is_empty());
    }

    #[test]
    fn redact_replaces_every_occurrence() {
        let secret = "aB3xK9mQ7pL2vR5nW8jT4cF6hD1sG0yZ";
        let content = format!("first {secret} then again {secret}");
        let (clean, n) = scanner().redact(&content);
        assert_eq!(n, 2);
        assert!(!clean.contains(secret));
        assert_eq!(clean.matches(HIGH_ENTROPY_MARKER).count(), 2);
    }

    #[test]
    fn quoted_tokens_are_trimmed_before_scoring() {
        let content = r#"blob: "aB3xK9mQ7pL2vR5nW8jT4cF6hD1sG0yZ""#;
        let (clean, n) = scanner().redact(content);
        assert_eq!(n, 1);
        assert!(!clean.contains("aB3xK9mQ7pL2"));
    }

    #[test]
    fn adding_tokens_never_decreases_count() {
        let one = "entropy: aB3xK9mQ7pL2vR5nW8jT4cF6hD1sG0yZ".to_owned();
        let (_, n1) = scanner().redact(&one);
        let two = format!("{one}\nmore: Zx9Qm2Kp8Lb3Vr6Nw1Jt5Cf7Hd4Sg0y");
        let (_, n2) = scanner().redact(&two);
        assert!(n2 >= n1);
    }
}
