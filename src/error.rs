//! Error handling module for the chart pusher
//!
//! Every failure a push can hit maps onto one variant of [`PusherError`], and
//! each variant names the stage it came from so the caller can print it as-is.

use std::path::PathBuf;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum PusherError {
    /// No registered provider declares the scheme of the destination
    #[error("no provider found for scheme \"{scheme}\" in \"{reference}\" (supported: {supported})")]
    ProviderNotFound {
        scheme: String,
        reference: String,
        supported: String,
    },

    /// Plain HTTP was requested together with TLS material
    #[error("invalid registry configuration: plain HTTP cannot be combined with {}", .fields.join(", "))]
    ConflictingTlsOptions { fields: Vec<&'static str> },

    /// Only one half of a client certificate pair was supplied
    #[error("invalid registry configuration: {missing} is required when {present} is set")]
    IncompleteTlsMaterial {
        present: &'static str,
        missing: &'static str,
    },

    /// Credential or TLS material could not be loaded into a client
    #[error("failed to construct registry client: {message}")]
    ClientConstruction {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// The source chart is missing, unreadable or malformed
    #[error("failed to load chart {}: {message}", .path.display())]
    ArtifactResolution { path: PathBuf, message: String },

    /// The provider failed while talking to the registry
    #[error("push failed during {stage}: {message}")]
    Transport { stage: String, message: String },

    /// The destination could not be turned into a registry reference
    #[error("invalid remote reference \"{reference}\": {message}")]
    InvalidReference { reference: String, message: String },

    /// A required argument was empty
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PusherError {
    pub fn client_io(path: &std::path::Path, err: std::io::Error) -> Self {
        PusherError::ClientConstruction {
            message: format!("cannot read {}: {}", path.display(), err),
            source: Some(Box::new(err)),
        }
    }

    pub fn client_tls(what: &str, err: reqwest::Error) -> Self {
        PusherError::ClientConstruction {
            message: format!("invalid {}: {}", what, err),
            source: Some(Box::new(err)),
        }
    }

    pub fn artifact(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        PusherError::ArtifactResolution {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn transport(stage: impl Into<String>, message: impl Into<String>) -> Self {
        PusherError::Transport {
            stage: stage.into(),
            message: message.into(),
        }
    }

    pub fn invalid_reference(reference: &str, message: impl Into<String>) -> Self {
        PusherError::InvalidReference {
            reference: reference.to_string(),
            message: message.into(),
        }
    }

    /// Only transport failures may succeed on a later attempt; configuration
    /// and input errors never do.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PusherError::Transport { .. })
    }
}

pub type Result<T> = std::result::Result<T, PusherError>;
