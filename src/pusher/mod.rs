//! Transport providers and the scheme-keyed provider registry
//!
//! A [`Provider`] binds one or more URI schemes to a [`Pusher`]
//! implementation. The [`ProviderRegistry`] is built once and only read
//! afterwards, so it can be shared freely between concurrent pushes.

pub mod oci;

use crate::chart::ChartArtifacts;
use crate::error::{PusherError, Result};
use crate::registry::RegistryClient;
use async_trait::async_trait;
use std::sync::{Arc, OnceLock};

pub use oci::OciPusher;

/// What a provider reports back after a successful upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushOutcome {
    /// Final location without the URI scheme, e.g. `host/charts/mychart:1.2.0`
    pub reference: String,
    /// Digest of the artifact as stored by the registry
    pub digest: String,
    pub chart_digest: String,
    pub provenance_digest: Option<String>,
}

/// A transport capable of uploading chart artifacts
#[async_trait]
pub trait Pusher: Send + Sync {
    async fn push(
        &self,
        artifacts: &ChartArtifacts,
        client: &RegistryClient,
        destination: &str,
    ) -> Result<PushOutcome>;
}

#[derive(Clone)]
pub struct Provider {
    pub name: String,
    pub schemes: Vec<String>,
    pusher: Arc<dyn Pusher>,
}

impl Provider {
    pub fn new<S: Into<String>>(
        name: &str,
        schemes: impl IntoIterator<Item = S>,
        pusher: Arc<dyn Pusher>,
    ) -> Self {
        Self {
            name: name.to_string(),
            schemes: schemes.into_iter().map(Into::into).collect(),
            pusher,
        }
    }

    pub fn provides(&self, scheme: &str) -> bool {
        self.schemes.iter().any(|s| s == scheme)
    }

    pub fn pusher(&self) -> &dyn Pusher {
        self.pusher.as_ref()
    }
}

impl std::fmt::Debug for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider")
            .field("name", &self.name)
            .field("schemes", &self.schemes)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct ProviderRegistry {
    providers: Vec<Provider>,
}

static BUILTIN: OnceLock<Arc<ProviderRegistry>> = OnceLock::new();

impl ProviderRegistry {
    pub fn new(providers: Vec<Provider>) -> Self {
        Self { providers }
    }

    /// The providers shipped with this crate, built on first use
    pub fn builtin() -> Arc<ProviderRegistry> {
        BUILTIN
            .get_or_init(|| {
                Arc::new(ProviderRegistry::new(vec![Provider::new(
                    "oci",
                    [oci::OCI_SCHEME],
                    Arc::new(OciPusher),
                )]))
            })
            .clone()
    }

    /// Providers in registration order
    pub fn providers(&self) -> impl Iterator<Item = &Provider> + '_ {
        self.providers.iter()
    }

    /// First provider, in registration order, that declares `scheme`
    pub fn lookup(&self, scheme: &str) -> Result<&Provider> {
        self.find(scheme, scheme)
    }

    /// Provider for the scheme of `remote_ref` (`oci://host/path` -> `oci`)
    pub fn resolve(&self, remote_ref: &str) -> Result<&Provider> {
        self.find(scheme_of(remote_ref).unwrap_or_default(), remote_ref)
    }

    fn find(&self, scheme: &str, reference: &str) -> Result<&Provider> {
        self.providers
            .iter()
            .find(|p| !scheme.is_empty() && p.provides(scheme))
            .ok_or_else(|| PusherError::ProviderNotFound {
                scheme: scheme.to_string(),
                reference: reference.to_string(),
                supported: self.scheme_prefixes().join(", "),
            })
    }

    /// `"<scheme>://"` for every registered scheme, in order
    pub fn scheme_prefixes(&self) -> Vec<String> {
        self.providers
            .iter()
            .flat_map(|p| p.schemes.iter())
            .map(|s| format!("{}://", s))
            .collect()
    }
}

/// The text before `://`, if any
pub fn scheme_of(reference: &str) -> Option<&str> {
    reference
        .split_once("://")
        .map(|(scheme, _)| scheme)
        .filter(|scheme| !scheme.is_empty())
}
