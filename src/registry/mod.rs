//! Registry module for OCI registry interactions
//!
//! This module builds registry clients from a
//! [`RegistryConfiguration`](crate::config::RegistryConfiguration), handles
//! registry authentication and performs the blob and manifest uploads a chart
//! push consists of.

pub mod auth;
pub mod client;
pub mod manifest;
pub mod reference;
pub mod session;

pub use auth::{Authorization, Credentials};
pub use client::{RegistryClient, TlsSettings};
pub use manifest::{Descriptor, OciManifest};
pub use reference::OciReference;
pub use session::RegistrySession;
