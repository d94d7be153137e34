//! Environment fingerprint generation.
//!
//! A fingerprint pins the environment that produced a run: sandbox image
//! descriptor, language runtime, dependency lockfile, planned command set,
//! and the *names* of the process environment variables — never their
//! values. Two runs may feed behavioural memory only when their fingerprints
//! are field-wise equal.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Runtime identity folded into the fingerprint: the pinned toolchain plus
/// the sandbox interpreter tag. Compile-time constant so two fingerprints
/// from one process trivially agree.
pub const RUNTIME_VERSION: &str = concat!("rust-", env!("CARGO_PKG_RUST_VERSION"), "/python3");

/// Default sandbox image descriptor consulted for the image digest.
pub const DEFAULT_IMAGE_DESCRIPTOR: &str = "Dockerfile.sandbox";

/// Default dependency lockfile consulted for the lockfile hash.
pub const DEFAULT_LOCKFILE: &str = "Cargo.lock";

// ── EnvironmentFingerprint ─────────────────────────────────────────────

/// Deterministic snapshot of the environment that produced a run.
///
/// All five fields are lowercase hex SHA-256 digests; equality is
/// field-wise and inequality in any field fails the determinism gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentFingerprint {
    /// Digest of the sandbox image descriptor file (empty-input digest when
    /// unreadable).
    pub runtime_image_digest: String,
    /// Digest of the language runtime identity string.
    pub language_runtime_version: String,
    /// Digest of the dependency lockfile.
    pub lockfile_hash: String,
    /// Digest of the newline-joined planned command set.
    pub command_set_hash: String,
    /// Digest of the sorted environment variable names. Values never enter
    /// the hash input.
    pub env_var_names_hash: String,
}

/// Inputs to fingerprint generation; defaults point at the repository-root
/// descriptor files.
#[derive(Debug, Clone)]
pub struct FingerprintInputs {
    /// Path to the sandbox image descriptor.
    pub image_descriptor: PathBuf,
    /// Path to the dependency lockfile.
    pub lockfile: PathBuf,
    /// Planned sandbox commands, in execution order.
    pub commands: Vec<String>,
    /// Explicit env var name allowlist; `None` snapshots the whole process
    /// environment (names only).
    pub env_var_names: Option<Vec<String>>,
}

impl Default for FingerprintInputs {
    fn default() -> Self {
        Self {
            image_descriptor: PathBuf::from(DEFAULT_IMAGE_DESCRIPTOR),
            lockfile: PathBuf::from(DEFAULT_LOCKFILE),
            commands: Vec::new(),
            env_var_names: None,
        }
    }
}

impl EnvironmentFingerprint {
    /// Generate a fingerprint from the current runtime environment.
    ///
    /// Called once at startup for the baseline and again per run when the
    /// gate is wired.
    #[must_use]
    pub fn generate(inputs: &FingerprintInputs) -> Self {
        let env_names = match &inputs.env_var_names {
            Some(names) => names.clone(),
            None => std::env::vars().map(|(name, _)| name).collect(),
        };
        let mut sorted = env_names;
        sorted.sort();

        Self {
            runtime_image_digest: sha256_file(&inputs.image_descriptor),
            language_runtime_version: sha256_string(RUNTIME_VERSION),
            lockfile_hash: sha256_file(&inputs.lockfile),
            command_set_hash: sha256_string(&inputs.commands.join("\n")),
            env_var_names_hash: sha256_string(&sorted.join("\n")),
        }
    }
}

/// Lowercase hex SHA-256 of a UTF-8 string.
#[must_use]
pub fn sha256_string(input: &str) -> String {
    to_hex(&Sha256::digest(input.as_bytes()))
}

/// Lowercase hex SHA-256 of a file's contents; the empty string when the
/// file is unreadable.
#[must_use]
pub fn sha256_file(path: &Path) -> String {
    match std::fs::read(path) {
        Ok(bytes) => to_hex(&Sha256::digest(&bytes)),
        Err(_) => String::new(),
    }
}

fn to_hex(digest: &[u8]) -> String {
    digest.iter().fold(String::with_capacity(64), |mut out, byte| {
        use std::fmt::Write;
        let _ = write!(out, "{byte:02x}");
        out
    })
}

// ── Tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn inputs() -> FingerprintInputs {
        FingerprintInputs {
            env_var_names: Some(vec!["PATH".into(), "HOME".into()]),
            ..FingerprintInputs::default()
        }
    }

    #[test]
    fn sha256_string_matches_known_vector() {
        assert_eq!(
            sha256_string(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn same_inputs_yield_equal_fingerprints() {
        let a = EnvironmentFingerprint::generate(&inputs());
        let b = EnvironmentFingerprint::generate(&inputs());
        assert_eq!(a, b);
    }

    #[test]
    fn env_name_order_does_not_matter() {
        let mut reversed = inputs();
        reversed.env_var_names = Some(vec!["HOME".into(), "PATH".into()]);
        assert_eq!(
            EnvironmentFingerprint::generate(&inputs()),
            EnvironmentFingerprint::generate(&reversed)
        );
    }

    #[test]
    fn command_set_changes_the_fingerprint() {
        let mut changed = inputs();
        changed.commands = vec!["python /source/candidate.py".into()];
        assert_ne!(
            EnvironmentFingerprint::generate(&inputs()),
            EnvironmentFingerprint::generate(&changed)
        );
    }

    #[test]
    fn unreadable_descriptor_falls_back_to_empty() {
        let mut missing = inputs();
        missing.image_descriptor = PathBuf::from("definitely/not/a/file");
        let fp = EnvironmentFingerprint::generate(&missing);
        assert_eq!(fp.runtime_image_digest, "");
    }

    #[test]
    fn descriptor_content_feeds_the_digest() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "FROM python:3.12-slim").unwrap();

        let mut with_file = inputs();
        with_file.image_descriptor = file.path().to_path_buf();
        let fp = EnvironmentFingerprint::generate(&with_file);
        assert_eq!(fp.runtime_image_digest.len(), 64);
    }
}
