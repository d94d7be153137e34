//! Deterministic repair prompt builder for retry attempts.

use crate::taxonomy::{FailureClass, VerificationResult};

/// Character budget for each captured output block embedded in the prompt.
pub const MAX_OUTPUT_CHARS: usize = 2_000;

/// Marker appended to a truncated output block.
pub const OUTPUT_TRUNCATION_MARKER: &str = "\n...[TRUNCATED]";

fn truncate(text: &str) -> String {
    if text.chars().count() <= MAX_OUTPUT_CHARS {
        return text.to_owned();
    }
    let cut: String = text.chars().take(MAX_OUTPUT_CHARS).collect();
    format!("{cut}{OUTPUT_TRUNCATION_MARKER}")
}

fn failure_guidance(failure_class: Option<FailureClass>) -> &'static str {
    match failure_class {
        Some(FailureClass::Syntax) => {
            "The previous code had a SYNTAX ERROR. \
             Review the error output carefully and emit clean, syntactically valid Python."
        }
        Some(FailureClass::Deterministic) => {
            "The previous code produced a DETERMINISTIC LOGICAL FAILURE \
             (consistent wrong output or exception). \
             Do not change the overall approach - instead fix the specific \
             logical error shown in the error output."
        }
        _ => {
            "The previous attempt failed. Analyze the error output and produce \
             a corrected solution."
        }
    }
}

/// Construct the repair prompt embedding original context, failure
/// classification, and execution evidence for the next attempt.
///
/// The returned string replaces the payload content on retry; the original
/// request is always embedded verbatim, never a previously built prompt.
#[must_use]
pub fn build_repair_prompt(original_content: &str, last_result: &VerificationResult) -> String {
    let class_label = last_result
        .failure_class
        .map_or_else(|| "unknown".to_owned(), |class| class.to_string());

    let mut sections: Vec<String> = vec![
        "## PREVIOUS ATTEMPT FAILED - REPAIR REQUIRED".to_owned(),
        String::new(),
        format!("**Failure class:** {class_label}"),
        format!("**Attempt number:** {}", last_result.attempt),
        String::new(),
        "### Guidance".to_owned(),
        failure_guidance(last_result.failure_class).to_owned(),
        String::new(),
    ];

    if !last_result.stdout.trim().is_empty() {
        sections.extend([
            "### Captured stdout".to_owned(),
            "```".to_owned(),
            truncate(&last_result.stdout),
            "```".to_owned(),
            String::new(),
        ]);
    }

    if !last_result.stderr.trim().is_empty() {
        sections.extend([
            "### Captured stderr".to_owned(),
            "```".to_owned(),
            truncate(&last_result.stderr),
            "```".to_owned(),
            String::new(),
        ]);
    }

    sections.extend([
        "---".to_owned(),
        String::new(),
        "## Original Request".to_owned(),
        original_content.to_owned(),
    ]);

    sections.join("\n")
}

// ── Tests ──────────────────────────────────────────────────────────────
