//! Destination reference parsing for OCI registries

use crate::chart::ChartMetadata;
use crate::error::{PusherError, Result};
use std::fmt;

/// Where a chart lands: `<registry>/<repository>:<tag>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OciReference {
    pub registry: String,
    pub repository: String,
    pub tag: String,
}

impl OciReference {
    /// Build the chart reference from a destination such as
    /// `oci://registry.example.com/charts`.
    ///
    /// The chart name is appended to the destination path and the chart
    /// version becomes the tag. OCI tags cannot hold `+`, so semver build
    /// metadata is written with `_` instead.
    pub fn for_chart(destination: &str, metadata: &ChartMetadata) -> Result<Self> {
        let without_scheme = destination
            .split_once("://")
            .map_or(destination, |(_, rest)| rest)
            .trim_end_matches('/');

        let (registry, base_path) = match without_scheme.split_once('/') {
            Some((registry, path)) => (registry, path),
            None => (without_scheme, ""),
        };

        validate_registry(destination, registry)?;

        if let Some(last) = base_path.rsplit('/').next() {
            if last.contains(':') || last.contains('@') {
                return Err(PusherError::invalid_reference(
                    destination,
                    "destination must not contain a tag or digest; the chart version is used as the tag",
                ));
            }
        }

        let repository = if base_path.is_empty() {
            metadata.name.clone()
        } else {
            format!("{}/{}", base_path, metadata.name)
        };
        validate_repository(destination, &repository)?;

        Ok(Self {
            registry: registry.to_string(),
            repository,
            tag: metadata.version.replace('+', "_"),
        })
    }
}

impl fmt::Display for OciReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}:{}", self.registry, self.repository, self.tag)
    }
}

fn validate_registry(destination: &str, registry: &str) -> Result<()> {
    if registry.is_empty() {
        return Err(PusherError::invalid_reference(destination, "missing registry host"));
    }
    let parsed = url::Url::parse(&format!("https://{}", registry))
        .map_err(|e| {
            PusherError::invalid_reference(destination, format!("invalid registry host: {}", e))
        })?;
    if parsed.host_str().is_none() || parsed.path() != "/" {
        return Err(PusherError::invalid_reference(destination, "invalid registry host"));
    }
    Ok(())
}

fn validate_repository(destination: &str, repository: &str) -> Result<()> {
    let valid_component = |component: &str| {
        !component.is_empty()
            && component
                .chars()
                .all(|c| {
                    c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '_' | '-')
                })
            && component.starts_with(|c: char| c.is_ascii_alphanumeric())
    };

    if repository.split('/').all(valid_component) {
        Ok(())
    } else {
        Err(PusherError::invalid_reference(
            destination,
            format!(
                "repository \"{}\" must be lowercase alphanumerics separated by '.', '_', '-' or '/'",
                repository
            ),
        ))
    }
}
