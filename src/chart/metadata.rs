//! `Chart.yaml` metadata

use crate::error::{PusherError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The subset of `Chart.yaml` carried into the registry config blob.
///
/// Field order is the serialization order, so the same chart always yields
/// the same config blob bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMetadata {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    pub api_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_version: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kube_version: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub chart_type: Option<String>,
}

impl ChartMetadata {
    /// Parse and validate `Chart.yaml` content read from `archive`
    pub fn parse(content: &str, archive: &Path) -> Result<Self> {
        let metadata: ChartMetadata = serde_yaml::from_str(content)
            .map_err(|e| PusherError::artifact(archive, format!("invalid Chart.yaml: {}", e)))?;
        metadata.validate(archive)?;
        Ok(metadata)
    }

    fn validate(&self, archive: &Path) -> Result<()> {
        if self.api_version.trim().is_empty() {
            return Err(PusherError::artifact(archive, "Chart.yaml apiVersion is required"));
        }
        if self.name.trim().is_empty() {
            return Err(PusherError::artifact(archive, "Chart.yaml name is required"));
        }
        if self.version.trim().is_empty() {
            return Err(PusherError::artifact(archive, "Chart.yaml version is required"));
        }
        if self.name.contains('/') || self.name.contains(':') {
            return Err(PusherError::artifact(
                archive,
                format!("chart name {:?} contains invalid characters", self.name),
            ));
        }
        Ok(())
    }

    /// Registry config blob: the metadata as compact JSON
    pub fn to_config_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| {
            PusherError::transport("config serialization", e.to_string())
        })
    }
}
