//! OCI image manifest for chart artifacts

use serde::Serialize;
use std::collections::BTreeMap;

pub const OCI_MANIFEST_MEDIA_TYPE: &str = "application/vnd.oci.image.manifest.v1+json";
pub const CHART_CONFIG_MEDIA_TYPE: &str = "application/vnd.cncf.helm.config.v1+json";
pub const CHART_LAYER_MEDIA_TYPE: &str = "application/vnd.cncf.helm.chart.content.v1.tar+gzip";
pub const PROVENANCE_LAYER_MEDIA_TYPE: &str = "application/vnd.cncf.helm.chart.provenance.v1.prov";

pub const ANNOTATION_TITLE: &str = "org.opencontainers.image.title";
pub const ANNOTATION_VERSION: &str = "org.opencontainers.image.version";
pub const ANNOTATION_DESCRIPTION: &str = "org.opencontainers.image.description";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptor {
    pub media_type: String,
    pub digest: String,
    pub size: u64,
}

impl Descriptor {
    pub fn new(media_type: &str, digest: &str, size: u64) -> Self {
        Self {
            media_type: media_type.to_string(),
            digest: digest.to_string(),
            size,
        }
    }
}

/// Annotations use a `BTreeMap` so the serialized manifest, and with it the
/// manifest digest, only depends on the pushed content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OciManifest {
    pub schema_version: u32,
    pub media_type: String,
    pub config: Descriptor,
    pub layers: Vec<Descriptor>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

impl OciManifest {
    pub fn new(config: Descriptor, layers: Vec<Descriptor>) -> Self {
        Self {
            schema_version: 2,
            media_type: OCI_MANIFEST_MEDIA_TYPE.to_string(),
            config,
            layers,
            annotations: BTreeMap::new(),
        }
    }

    pub fn with_annotation(mut self, key: &str, value: impl Into<String>) -> Self {
        self.annotations.insert(key.to_string(), value.into());
        self
    }

    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_json_shape() {
        let manifest = OciManifest::new(
            Descriptor::new(CHART_CONFIG_MEDIA_TYPE, "sha256:aa", 10),
            vec![Descriptor::new(CHART_LAYER_MEDIA_TYPE, "sha256:bb", 20)],
        )
        .with_annotation(ANNOTATION_VERSION, "1.2.0")
        .with_annotation(ANNOTATION_TITLE, "mychart");

        let value: serde_json::Value =
            serde_json::from_slice(&manifest.to_json().unwrap()).unwrap();
        assert_eq!(value["schemaVersion"], 2);
        assert_eq!(value["mediaType"], OCI_MANIFEST_MEDIA_TYPE);
        assert_eq!(value["config"]["mediaType"], CHART_CONFIG_MEDIA_TYPE);
        assert_eq!(value["layers"][0]["size"], 20);
        assert_eq!(value["annotations"][ANNOTATION_TITLE], "mychart");
    }

    #[test]
    fn test_annotation_order_does_not_change_bytes() {
        let config = Descriptor::new(CHART_CONFIG_MEDIA_TYPE, "sha256:aa", 1);
        let a = OciManifest::new(config.clone(), vec![])
            .with_annotation(ANNOTATION_TITLE, "x")
            .with_annotation(ANNOTATION_VERSION, "1");
        let b = OciManifest::new(config, vec![])
            .with_annotation(ANNOTATION_VERSION, "1")
            .with_annotation(ANNOTATION_TITLE, "x");
        assert_eq!(a.to_json().unwrap(), b.to_json().unwrap());
    }
}
