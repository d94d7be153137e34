//! Candidate extraction from raw LLM output.
//!
//! Strategy: strict JSON parse first (stripping a ```json fence when
//! present), markdown code-fence fallback second. Empty code is always a
//! failure; Python candidates get a structural syntax scan before handoff —
//! the sandbox remains the authoritative validator.

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::llm::GatewayError;

const FENCE_PATTERN: &str = r"(?s)```([A-Za-z0-9_+-]*)\n(.*?)```";

// ── ExtractionOutcome ──────────────────────────────────────────────────

/// Result of extracting candidate code from LLM output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionOutcome {
    /// Whether a usable candidate was produced.
    pub success: bool,
    /// Extracted code (possibly invalid; kept for audit even on failure).
    pub code: String,
    /// Normalised language tag, when known.
    pub language: Option<String>,
    /// Model-provided reasoning notes.
    pub notes: String,
    /// Whether the markdown fallback path produced the candidate.
    pub fallback_used: bool,
    /// Failure detail, when `success` is false.
    pub error: Option<String>,
}

impl ExtractionOutcome {
    fn failure(code: impl Into<String>, fallback_used: bool, error: impl Into<String>) -> Self {
        Self {
            success: false,
            code: code.into(),
            language: None,
            notes: String::new(),
            fallback_used,
            error: Some(error.into()),
        }
    }
}

/// The strict JSON shape the system prompt demands.
#[derive(Debug, Deserialize)]
struct StructuredResponse {
    language: String,
    code: String,
    #[serde(default)]
    notes: String,
}

// ── CandidateExtractor ─────────────────────────────────────────────────

/// Compiled extraction pipeline; build once and share.
#[derive(Debug, Clone)]
pub struct CandidateExtractor {
    fence: Regex,
}

impl CandidateExtractor {
    /// Compile the fence pattern.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PatternCompile`] if the built-in pattern is
    /// invalid.
    pub fn new() -> Result<Self, GatewayError> {
        Ok(Self {
            fence: Regex::new(FENCE_PATTERN)?,
        })
    }

    /// Extract candidate code, JSON first, markdown fallback second.
    #[must_use]
    pub fn extract(&self, response_text: &str) -> ExtractionOutcome {
        if response_text.trim().is_empty() {
            return ExtractionOutcome::failure("", false, "Raw LLM response was empty.");
        }

        if let Some(structured) = parse_structured(response_text) {
            return build_outcome(
                structured.code,
                structured.language,
                structured.notes,
                false,
            );
        }

        debug!("primary JSON extraction failed, using markdown fallback parser");
        self.parse_markdown_fallback(response_text)
    }

    fn parse_markdown_fallback(&self, response_text: &str) -> ExtractionOutcome {
        let Some(caps) = self.fence.captures(response_text) else {
            return ExtractionOutcome::failure(
                "",
                true,
                "Could not extract code via JSON or Markdown blocks.",
            );
        };
        let language = match &caps[1] {
            "" => "python".to_owned(),
            tag => tag.to_owned(),
        };
        let code = caps[2].trim().to_owned();
        build_outcome(code, language, String::new(), true)
    }
}

fn parse_structured(response_text: &str) -> Option<StructuredResponse> {
    let cleaned = strip_json_fence(response_text);
    serde_json::from_str(cleaned).ok()
}

fn strip_json_fence(response_text: &str) -> &str {
    let stripped = response_text.trim();
    stripped
        .strip_prefix("```json")
        .and_then(|rest| rest.strip_suffix("```"))
        .map_or(stripped, str::trim)
}

fn build_outcome(
    code: String,
    language: String,
    notes: String,
    fallback_used: bool,
) -> ExtractionOutcome {
    let language = language.trim().to_lowercase();

    let validation_error = if code.trim().is_empty() {
        Some("Candidate code is completely empty.".to_owned())
    } else if language == "python" {
        python_syntax_scan(&code)
    } else {
        None
    };

    if let Some(error) = validation_error {
        let mut outcome = ExtractionOutcome::failure(code, fallback_used, error);
        outcome.language = Some(language);
        outcome.notes = notes;
        return outcome;
    }

    ExtractionOutcome {
        success: true,
        code,
        language: Some(language),
        notes,
        fallback_used,
        error: None,
    }
}

/// Structural scan for obviously broken Python.
///
/// Catches the failure shapes the pipeline actually sees from model output
/// (unbalanced brackets, NUL bytes, empty bodies) without pulling in a full
/// parser; anything subtler is caught by the interpreter in the sandbox and
/// classified as a retryable `SyntaxError` there.
#[must_use]
pub fn python_syntax_scan(code: &str) -> Option<String> {
    if code.contains('\0') {
        return Some("SyntaxError: source contains NUL bytes".to_owned());
    }

    let mut depth: i64 = 0;
    let mut line_no = 1usize;
    let mut chars = code.chars().peekable();
    let mut string_delim: Option<char> = None;
    let mut in_comment = false;

    while let Some(c) = chars.next() {
        if c == '\n' {
            line_no += 1;
            in_comment = false;
            continue;
        }
        if in_comment {
            continue;
        }
        if let Some(delim) = string_delim {
            if c == '\\' {
                chars.next();
            } else if c == delim {
                string_delim = None;
            }
            continue;
        }
        match c {
            '#' => in_comment = true,
            '\'' | '"' => string_delim = Some(c),
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => {
                depth -= 1;
                if depth < 0 {
                    return Some(format!("SyntaxError at line {line_no}: unbalanced closing bracket"));
                }
            }
            _ => {}
        }
    }

    if depth > 0 {
        return Some(format!("SyntaxError at line {line_no}: {depth} unclosed bracket(s)"));
    }
    None
}

// ── Tests ──────────────────────────────────────────────────────────────
