//! Attestation: structured proof behind every "verified" label.
//!
//! - [`manifest`] - builder and the completeness guard
//! - [`tier`] - evidence tier mapping from verification results

pub mod manifest;
pub mod tier;

pub use manifest::{
    AttestationError, AttestationManifest, MANIFEST_SCHEMA_VERSION, MAX_RETRIES, assert_complete,
    build_manifest,
};
pub use tier::map_tier;
