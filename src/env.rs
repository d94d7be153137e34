//! Local `.env` discovery.
//!
//! Walks from the current directory up to the filesystem root; the first
//! `.env` found wins. Existing process variables are not overridden unless
//! the caller asks. Only variable *names* ever reach the fingerprint.

use std::path::PathBuf;

use tracing::{debug, warn};

/// Load the nearest `.env` file, returning its path when one was applied.
pub fn load_dotenv(override_existing: bool) -> Option<PathBuf> {
    let path = find_env_file()?;
    let loaded = if override_existing {
        dotenvy::from_path_override(&path)
    } else {
        dotenvy::from_path(&path)
    };
    match loaded {
        Ok(()) => {
            debug!(path = %path.display(), "loaded .env");
            Some(path)
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "failed to load .env");
            None
        }
    }
}

fn find_env_file() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    let mut base = Some(cwd.as_path());
    while let Some(dir) = base {
        let candidate = dir.join(".env");
        if candidate.is_file() {
            return Some(candidate);
        }
        base = dir.parent();
    }
    None
}
