//! Chart handling module
//!
//! Resolves a local chart reference into the artifacts that get pushed: the
//! packaged chart archive, its parsed `Chart.yaml`, and an optional detached
//! provenance file sitting next to it (`<chart>.prov`).

pub mod loader;
pub mod metadata;

pub use loader::{Blob, ChartArtifacts, PROVENANCE_EXTENSION};
pub use metadata::ChartMetadata;
