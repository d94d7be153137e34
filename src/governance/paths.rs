//! Path allow/deny policy for outbound context file metadata.

use regex::Regex;

use super::GovernanceError;

/// Path fragments that always block egress, matched case-insensitively
/// against the normalised path.
pub const DENYLISTED_PATH_SNIPPETS: &[&str] =
    &[".env", "secrets.yaml", "id_rsa", "credentials.json", ".pem"];

/// Path shapes allowed in payload metadata: project-relative source trees or
/// bare filenames with a vetted extension.
pub const ALLOWED_PATH_SHAPES: &[&str] = &[
    r"^(src|tests|docs)/.+",
    r"^[A-Za-z0-9_.-]+\.(py|md|toml|json|ya?ml)$",
];

// ── PathPolicy ─────────────────────────────────────────────────────────

/// Compiled path policy. The deny and allow tables are data, not code:
/// tests construct narrowed policies through [`PathPolicy::new`].
#[derive(Debug, Clone)]
pub struct PathPolicy {
    denylist: Vec<String>,
    allowed: Vec<Regex>,
}

impl PathPolicy {
    /// Compile a policy from raw tables.
    ///
    /// # Errors
    ///
    /// Returns [`GovernanceError::PatternCompile`] when an allow shape fails
    /// to compile.
    pub fn new(
        denylist: impl IntoIterator<Item = impl Into<String>>,
        allowed_shapes: &[&str],
    ) -> Result<Self, GovernanceError> {
        let allowed = allowed_shapes
            .iter()
            .map(|shape| {
                Regex::new(shape).map_err(|source| GovernanceError::PatternCompile {
                    pattern: (*shape).to_owned(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            denylist: denylist
                .into_iter()
                .map(|s| s.into().to_lowercase())
                .collect(),
            allowed,
        })
    }

    /// Compile the built-in policy tables.
    ///
    /// # Errors
    ///
    /// Returns [`GovernanceError`] if a built-in shape fails to compile.
    pub fn with_defaults() -> Result<Self, GovernanceError> {
        Self::new(DENYLISTED_PATH_SNIPPETS.iter().copied(), ALLOWED_PATH_SHAPES)
    }

    /// Check every path; the first violation yields a block reason.
    #[must_use]
    pub fn enforce(&self, files: &[String]) -> Option<String> {
        for file_path in files {
            let normalized = normalize_path(file_path);
            let lower = normalized.to_lowercase();

            if is_absolute_or_traversal(&normalized) {
                return Some(format!("Path traversal violation: {file_path}"));
            }
            if self.denylist.iter().any(|fragment| lower.contains(fragment)) {
                return Some(format!("Path denylist violation: {file_path} is restricted."));
            }
            if !self.allowed.iter().any(|shape| shape.is_match(&normalized)) {
                return Some(format!("Path allowlist violation: {file_path} is not allowed."));
            }
        }
        None
    }
}

/// Normalise separators and strip a leading `./`.
#[must_use]
pub fn normalize_path(path: &str) -> String {
    let normalized = path.replace('\\', "/");
    let normalized = normalized.trim();
    normalized.strip_prefix("./").unwrap_or(normalized).to_owned()
}

/// Absolute paths (POSIX or drive-letter) and `..` segments are traversal.
#[must_use]
pub fn is_absolute_or_traversal(path: &str) -> bool {
    if path.is_empty() {
        return true;
    }
    if path.starts_with('/') {
        return true;
    }
    let bytes = path.as_bytes();
    if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
        return true;
    }
    path.split('/').filter(|part| !part.is_empty()).any(|part| part == "..")
}

// ── Tests ──────────────────────────────────────────────────────────────
