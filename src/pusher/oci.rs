//! Built-in provider for `oci://` destinations

use crate::chart::ChartArtifacts;
use crate::digest::DigestUtils;
use crate::error::{PusherError, Result};
use crate::pusher::{PushOutcome, Pusher};
use crate::registry::manifest::{
    ANNOTATION_DESCRIPTION, ANNOTATION_TITLE, ANNOTATION_VERSION, CHART_CONFIG_MEDIA_TYPE,
    CHART_LAYER_MEDIA_TYPE, OCI_MANIFEST_MEDIA_TYPE, PROVENANCE_LAYER_MEDIA_TYPE,
};
use crate::registry::{Descriptor, OciManifest, OciReference, RegistryClient};
use async_trait::async_trait;
use tracing::{debug, info};

pub const OCI_SCHEME: &str = "oci";

/// Pushes charts to OCI distribution registries.
///
/// Order of operations: config blob, chart layer, provenance layer, then the
/// manifest that ties them together under the chart version tag. The tag
/// only moves once every blob is in place, so a failed provenance upload
/// leaves no new tag behind.
#[derive(Debug, Default, Clone, Copy)]
pub struct OciPusher;

impl OciPusher {
    pub fn build_manifest(artifacts: &ChartArtifacts, config: &[u8]) -> OciManifest {
        let metadata = &artifacts.metadata;
        let mut layers = vec![Descriptor::new(
            CHART_LAYER_MEDIA_TYPE,
            &artifacts.chart.digest,
            artifacts.chart.size(),
        )];
        if let Some(prov) = &artifacts.provenance {
            layers.push(Descriptor::new(PROVENANCE_LAYER_MEDIA_TYPE, &prov.digest, prov.size()));
        }

        let config = Descriptor::new(
            CHART_CONFIG_MEDIA_TYPE,
            &DigestUtils::compute_digest(config),
            config.len() as u64,
        );

        let mut manifest = OciManifest::new(config, layers)
            .with_annotation(ANNOTATION_TITLE, metadata.name.as_str())
            .with_annotation(ANNOTATION_VERSION, metadata.version.as_str());
        if let Some(description) = metadata.description.as_deref().filter(|d| !d.is_empty()) {
            manifest = manifest.with_annotation(ANNOTATION_DESCRIPTION, description);
        }
        manifest
    }
}

#[async_trait]
impl Pusher for OciPusher {
    async fn push(
        &self,
        artifacts: &ChartArtifacts,
        client: &RegistryClient,
        destination: &str,
    ) -> Result<PushOutcome> {
        let reference = OciReference::for_chart(destination, &artifacts.metadata)?;
        let mut session = client.connect(&reference).await?;
        debug!(
            reference = %reference,
            layers = artifacts.layer_count(),
            bytes = artifacts.total_size(),
            "uploading chart"
        );

        let config = artifacts.metadata.to_config_json()?;
        let manifest = Self::build_manifest(artifacts, &config);

        session
            .upload_blob(&config, &manifest.config.digest, "config upload")
            .await?;
        session
            .upload_blob(&artifacts.chart.data, &artifacts.chart.digest, "chart upload")
            .await?;
        if let Some(prov) = &artifacts.provenance {
            session
                .upload_blob(&prov.data, &prov.digest, "provenance upload")
                .await?;
        }

        let manifest_json = manifest
            .to_json()
            .map_err(|e| PusherError::transport("manifest serialization", e.to_string()))?;
        let digest = session
            .put_manifest(&reference.tag, &manifest_json, OCI_MANIFEST_MEDIA_TYPE)
            .await?;

        info!(reference = %reference, digest = %digest, "chart pushed");

        Ok(PushOutcome {
            reference: reference.to_string(),
            digest,
            chart_digest: artifacts.chart.digest.clone(),
            provenance_digest: artifacts.provenance.as_ref().map(|p| p.digest.clone()),
        })
    }
}
