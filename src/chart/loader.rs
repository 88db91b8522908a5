//! Loading packaged charts and their provenance files from disk

use crate::chart::metadata::ChartMetadata;
use crate::digest::DigestUtils;
use crate::error::{PusherError, Result};
use flate2::read::GzDecoder;
use std::io::Read;
use std::path::{Path, PathBuf};
use tar::Archive;
use tracing::debug;

/// Appended to the chart file name to locate its provenance file
pub const PROVENANCE_EXTENSION: &str = ".prov";

const CHART_FILE_NAME: &str = "Chart.yaml";

/// A file loaded into memory together with its content digest
#[derive(Debug, Clone)]
pub struct Blob {
    pub path: PathBuf,
    pub data: Vec<u8>,
    pub digest: String,
}

impl Blob {
    fn new(path: PathBuf, data: Vec<u8>) -> Self {
        let digest = DigestUtils::compute_digest(&data);
        Self { path, data, digest }
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

/// Everything one push uploads
#[derive(Debug, Clone)]
pub struct ChartArtifacts {
    pub metadata: ChartMetadata,
    pub chart: Blob,
    pub provenance: Option<Blob>,
}

impl ChartArtifacts {
    /// Load the chart archive at `source_ref` and, if present, `<source_ref>.prov`.
    pub async fn load(source_ref: impl AsRef<Path>) -> Result<Self> {
        let path = source_ref.as_ref();

        let file_meta = tokio::fs::metadata(path)
            .await
            .map_err(|e| PusherError::artifact(path, e.to_string()))?;
        if !file_meta.is_file() {
            return Err(PusherError::artifact(
                path,
                "not a packaged chart file; package the chart before pushing",
            ));
        }

        let data = tokio::fs::read(path)
            .await
            .map_err(|e| PusherError::artifact(path, e.to_string()))?;
        let metadata = read_chart_metadata(&data, path)?;
        debug!(
            chart = %metadata.name,
            version = %metadata.version,
            size = data.len(),
            "loaded chart archive"
        );

        let chart = Blob::new(path.to_path_buf(), data);
        let provenance = Self::load_provenance(path).await?;

        Ok(Self {
            metadata,
            chart,
            provenance,
        })
    }

    /// Path a provenance file for `chart_path` would have
    pub fn provenance_path(chart_path: &Path) -> PathBuf {
        let mut name = chart_path.as_os_str().to_os_string();
        name.push(PROVENANCE_EXTENSION);
        PathBuf::from(name)
    }

    async fn load_provenance(chart_path: &Path) -> Result<Option<Blob>> {
        let prov_path = Self::provenance_path(chart_path);
        match tokio::fs::metadata(&prov_path).await {
            Ok(meta) if meta.is_file() => {
                let data = tokio::fs::read(&prov_path)
                    .await
                    .map_err(|e| PusherError::artifact(&prov_path, e.to_string()))?;
                debug!(path = %prov_path.display(), "found provenance file");
                Ok(Some(Blob::new(prov_path, data)))
            }
            _ => Ok(None),
        }
    }

    /// Number of blobs that will be uploaded as layers
    pub fn layer_count(&self) -> usize {
        1 + usize::from(self.provenance.is_some())
    }

    pub fn total_size(&self) -> u64 {
        self.chart.size() + self.provenance.as_ref().map_or(0, Blob::size)
    }
}

/// Find `<chart>/Chart.yaml` inside the gzip'd tarball and parse it
fn read_chart_metadata(data: &[u8], path: &Path) -> Result<ChartMetadata> {
    let mut archive = Archive::new(GzDecoder::new(data));
    let entries = archive
        .entries()
        .map_err(|e| PusherError::artifact(path, format!("not a gzip'd tar archive: {}", e)))?;

    for entry in entries {
        let mut entry =
            entry.map_err(|e| PusherError::artifact(path, format!("corrupt archive: {}", e)))?;
        let entry_path = entry
            .path()
            .map_err(|e| PusherError::artifact(path, format!("corrupt archive: {}", e)))?
            .into_owned();

        let components: Vec<_> = entry_path.components().collect();
        if components.len() == 2 && components[1].as_os_str() == CHART_FILE_NAME {
            let mut content = String::new();
            entry.read_to_string(&mut content).map_err(|e| {
                PusherError::artifact(path, format!("cannot read {}: {}", entry_path.display(), e))
            })?;
            return ChartMetadata::parse(&content, path);
        }
    }

    Err(PusherError::artifact(path, "Chart.yaml file is missing"))
}
