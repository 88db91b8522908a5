//! Push orchestration
//!
//! [`Push::run`] drives one chart upload end to end:
//!
//! 1. pick the provider whose scheme matches the destination,
//! 2. load the chart archive and its provenance file, if any (`Resolved`),
//! 3. build the registry client from the configuration (`Authenticated`),
//! 4. hand everything to the provider (`Uploading`),
//! 5. write the summary to the caller's sink (`Done`).
//!
//! A failure at any step ends the push; nothing is retried or rolled back.
//! Registries are content addressed, so pushing the same chart again is the
//! recovery path.

use crate::chart::ChartArtifacts;
use crate::config::RegistryConfiguration;
use crate::error::{PusherError, Result};
use crate::pusher::{PushOutcome, ProviderRegistry, scheme_of};
use crate::registry::RegistryClient;
use std::fmt;
use std::io::Write;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PushStage {
    Idle,
    Resolved,
    Authenticated,
    Uploading,
    Done,
    Failed,
}

impl fmt::Display for PushStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PushStage::Idle => "idle",
            PushStage::Resolved => "resolved",
            PushStage::Authenticated => "authenticated",
            PushStage::Uploading => "uploading",
            PushStage::Done => "done",
            PushStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Result of a successful push
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushResult {
    pub summary: String,
    pub outcome: PushOutcome,
}

#[derive(Debug, Clone)]
pub struct Push {
    providers: Arc<ProviderRegistry>,
}

impl Default for Push {
    fn default() -> Self {
        Self::new()
    }
}

impl Push {
    /// Push through the built-in providers
    pub fn new() -> Self {
        Self::with_providers(ProviderRegistry::builtin())
    }

    pub fn with_providers(providers: Arc<ProviderRegistry>) -> Self {
        Self { providers }
    }

    /// Upload the chart at `source_ref` to `remote_ref`.
    ///
    /// The summary is written to `out` only once the upload has succeeded.
    pub async fn run<W: Write + ?Sized>(
        &self,
        source_ref: &str,
        remote_ref: &str,
        config: &RegistryConfiguration,
        out: &mut W,
    ) -> Result<PushResult> {
        let mut stage = PushStage::Idle;
        match self.execute(source_ref, remote_ref, config, &mut stage).await {
            Ok(result) => {
                out.write_all(result.summary.as_bytes())?;
                out.flush()?;
                advance(&mut stage, PushStage::Done);
                Ok(result)
            }
            Err(e) => {
                warn!(stage = %stage, error = %e, "push failed");
                advance(&mut stage, PushStage::Failed);
                Err(e)
            }
        }
    }

    async fn execute(
        &self,
        source_ref: &str,
        remote_ref: &str,
        config: &RegistryConfiguration,
        stage: &mut PushStage,
    ) -> Result<PushResult> {
        if source_ref.trim().is_empty() {
            return Err(PusherError::InvalidArgument(
                "chart reference must not be empty".into(),
            ));
        }
        if remote_ref.trim().is_empty() {
            return Err(PusherError::InvalidArgument(
                "remote destination must not be empty".into(),
            ));
        }

        let provider = self.providers.resolve(remote_ref)?;
        debug!(provider = %provider.name, remote = remote_ref, "selected provider");

        let artifacts = ChartArtifacts::load(source_ref).await?;
        advance(stage, PushStage::Resolved);

        let client = RegistryClient::from_config(config)?;
        advance(stage, PushStage::Authenticated);

        advance(stage, PushStage::Uploading);
        let outcome = provider.pusher().push(&artifacts, &client, remote_ref).await?;

        // resolve() succeeded, so the scheme is present
        let scheme = scheme_of(remote_ref).unwrap_or_default();
        Ok(PushResult {
            summary: format_summary(scheme, &outcome),
            outcome,
        })
    }
}

fn advance(stage: &mut PushStage, next: PushStage) {
    debug!(from = %stage, to = %next, "push stage");
    *stage = next;
}

/// Human readable summary of a push
pub fn format_summary(scheme: &str, outcome: &PushOutcome) -> String {
    let mut summary = format!(
        "Pushed: {}://{}\nDigest: {}\n",
        scheme, outcome.reference, outcome.digest
    );
    if let Some(prov) = &outcome.provenance_digest {
        summary.push_str(&format!("Provenance: {}\n", prov));
    }
    summary
}
