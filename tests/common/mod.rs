#![allow(dead_code)]

use async_trait::async_trait;
use chart_pusher::chart::ChartArtifacts;
use chart_pusher::digest::DigestUtils;
use chart_pusher::pusher::{OciPusher, PushOutcome, Pusher};
use chart_pusher::registry::RegistryClient;
use chart_pusher::Result;
use flate2::Compression;
use flate2::write::GzEncoder;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Write `<dir>/<name>-<version>.tgz` containing a minimal chart
pub fn write_chart(dir: &Path, name: &str, version: &str) -> PathBuf {
    let chart_yaml = format!(
        "apiVersion: v2\nname: {}\ndescription: Test chart\ntype: application\nversion: {}\n",
        name, version
    );
    let files = [
        (format!("{}/Chart.yaml", name), chart_yaml),
        (format!("{}/values.yaml", name), "replicaCount: 1\n".to_string()),
        (
            format!("{}/templates/configmap.yaml", name),
            "apiVersion: v1\nkind: ConfigMap\n".to_string(),
        ),
    ];

    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for (path, content) in &files {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        builder
            .append_data(&mut header, path, content.as_bytes())
            .unwrap();
    }
    let data = builder.into_inner().unwrap().finish().unwrap();

    let path = dir.join(format!("{}-{}.tgz", name, version));
    std::fs::write(&path, data).unwrap();
    path
}

pub fn write_provenance(chart_path: &Path, content: &str) -> PathBuf {
    let path = ChartArtifacts::provenance_path(chart_path);
    std::fs::write(&path, content).unwrap();
    path
}

/// One recorded provider call
#[derive(Debug, Clone)]
pub struct RecordedPush {
    pub destination: String,
    pub chart_digest: String,
    pub provenance_digest: Option<String>,
    pub uploaded_blobs: usize,
}

/// In-memory content addressed store standing in for a registry
#[derive(Default)]
pub struct RecordingPusher {
    pub calls: AtomicUsize,
    pub pushes: Mutex<Vec<RecordedPush>>,
    blobs: Mutex<HashSet<String>>,
}

impl RecordingPusher {
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn recorded(&self) -> Vec<RecordedPush> {
        self.pushes.lock().unwrap().clone()
    }
}

#[async_trait]
impl Pusher for RecordingPusher {
    async fn push(
        &self,
        artifacts: &ChartArtifacts,
        _client: &RegistryClient,
        destination: &str,
    ) -> Result<PushOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let config = artifacts.metadata.to_config_json()?;
        let manifest = OciPusher::build_manifest(artifacts, &config).to_json().unwrap();

        let mut digests = vec![artifacts.chart.digest.clone()];
        if let Some(prov) = &artifacts.provenance {
            digests.push(prov.digest.clone());
        }
        let uploaded_blobs = {
            let mut blobs = self.blobs.lock().unwrap();
            digests.iter().filter(|d| blobs.insert((*d).clone())).count()
        };

        self.pushes.lock().unwrap().push(RecordedPush {
            destination: destination.to_string(),
            chart_digest: artifacts.chart.digest.clone(),
            provenance_digest: artifacts.provenance.as_ref().map(|p| p.digest.clone()),
            uploaded_blobs,
        });

        let base = destination.split_once("://").map_or(destination, |(_, rest)| rest);
        Ok(PushOutcome {
            reference: format!(
                "{}/{}:{}",
                base.trim_end_matches('/'),
                artifacts.metadata.name,
                artifacts.metadata.version
            ),
            digest: DigestUtils::compute_digest(&manifest),
            chart_digest: artifacts.chart.digest.clone(),
            provenance_digest: artifacts.provenance.as_ref().map(|p| p.digest.clone()),
        })
    }
}

/// Provider that always fails the way a rejected upload would
pub struct RejectingPusher;

#[async_trait]
impl Pusher for RejectingPusher {
    async fn push(&self, _: &ChartArtifacts, _: &RegistryClient, _: &str) -> Result<PushOutcome> {
        Err(chart_pusher::PusherError::transport(
            "chart upload",
            "access denied by registry (401 Unauthorized)",
        ))
    }
}
