//! Authenticated blob and manifest operations against one repository.
//!
//! Uploads are monolithic: a POST opens the upload session and a single PUT
//! carries the bytes and the expected digest. Blobs already present in the
//! repository are skipped, which makes re-pushing identical content a no-op.
//!
//! A registry may accept the anonymous `/v2/` probe and only challenge on the
//! repository endpoints. Such a `401` is answered once per request and the
//! request is replayed with the new authorization.

use crate::digest::DigestUtils;
use crate::error::{PusherError, Result};
use crate::registry::auth::{Auth, Authorization, Credentials};
use reqwest::header::{CONTENT_TYPE, LOCATION, WWW_AUTHENTICATE};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use tracing::{debug, warn};
use url::Url;

const DOCKER_CONTENT_DIGEST: &str = "Docker-Content-Digest";

#[derive(Debug)]
pub struct RegistrySession {
    auth: Auth,
    base_url: String,
    repository: String,
    credentials: Option<Credentials>,
    authorization: Authorization,
}

impl RegistrySession {
    pub fn new(
        auth: Auth,
        base_url: String,
        repository: String,
        credentials: Option<Credentials>,
        authorization: Authorization,
    ) -> Self {
        Self {
            auth,
            base_url,
            repository,
            credentials,
            authorization,
        }
    }

    /// Send a request built by `build`, answering a fresh challenge once.
    async fn send<F>(&mut self, stage: &str, build: F) -> Result<Response>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let response = self
            .authorization
            .apply(build(self.auth.client()))
            .send()
            .await
            .map_err(|e| network_error(stage, e))?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }
        let challenge = response
            .headers()
            .get(WWW_AUTHENTICATE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let Some(challenge) = challenge else {
            return Ok(response);
        };

        let renewed = self
            .auth
            .answer_challenge(&challenge, &self.repository, self.credentials.as_ref())
            .await?;
        if renewed == self.authorization {
            return Ok(response);
        }

        debug!(stage, "registry challenged the session, retrying with new authorization");
        self.authorization = renewed;
        self.authorization
            .apply(build(self.auth.client()))
            .send()
            .await
            .map_err(|e| network_error(stage, e))
    }

    pub async fn blob_exists(&mut self, digest: &str, stage: &str) -> Result<bool> {
        let url = format!("{}/v2/{}/blobs/{}", self.base_url, self.repository, digest);
        let response = self.send(stage, |client| client.head(&url)).await?;

        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(status_error(stage, status, response).await),
        }
    }

    /// Upload `data` unless the registry already has it. Returns whether
    /// bytes were actually sent.
    pub async fn upload_blob(&mut self, data: &[u8], digest: &str, stage: &str) -> Result<bool> {
        DigestUtils::verify_data_integrity(data, digest)?;
        if self.blob_exists(digest, stage).await? {
            debug!(digest, stage, "blob already present, skipping upload");
            return Ok(false);
        }

        let mut url = self.start_upload(stage).await?;
        url.query_pairs_mut().append_pair("digest", digest);

        let response = self
            .send(stage, |client| {
                client
                    .put(url.clone())
                    .header(CONTENT_TYPE, "application/octet-stream")
                    .body(data.to_vec())
            })
            .await?;

        if !response.status().is_success() {
            return Err(status_error(stage, response.status(), response).await);
        }

        debug!(digest, stage, size = data.len(), "blob uploaded");
        Ok(true)
    }

    async fn start_upload(&mut self, stage: &str) -> Result<Url> {
        let url = format!("{}/v2/{}/blobs/uploads/", self.base_url, self.repository);
        let response = self.send(stage, |client| client.post(&url)).await?;

        if !response.status().is_success() {
            return Err(status_error(stage, response.status(), response).await);
        }

        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                PusherError::transport(stage, "upload response is missing a Location header")
            })?;

        let base = Url::parse(&url).map_err(|e| PusherError::transport(stage, e.to_string()))?;
        base.join(location).map_err(|e| {
            PusherError::transport(
                stage,
                format!("invalid upload location {:?}: {}", location, e),
            )
        })
    }

    /// Put the manifest under `tag` and return its digest
    pub async fn put_manifest(
        &mut self,
        tag: &str,
        manifest: &[u8],
        media_type: &str,
    ) -> Result<String> {
        const STAGE: &str = "manifest upload";
        let url = format!("{}/v2/{}/manifests/{}", self.base_url, self.repository, tag);
        let computed = DigestUtils::compute_digest(manifest);

        let response = self
            .send(STAGE, |client| {
                client
                    .put(&url)
                    .header(CONTENT_TYPE, media_type)
                    .body(manifest.to_vec())
            })
            .await?;

        if !response.status().is_success() {
            return Err(status_error(STAGE, response.status(), response).await);
        }

        if let Some(reported) = response
            .headers()
            .get(DOCKER_CONTENT_DIGEST)
            .and_then(|v| v.to_str().ok())
        {
            if reported != computed {
                warn!(
                    reported,
                    computed = %computed,
                    "registry reported a different manifest digest"
                );
            }
        }

        Ok(computed)
    }
}

fn network_error(stage: &str, err: reqwest::Error) -> PusherError {
    PusherError::transport(stage, err.to_string())
}

async fn status_error(stage: &str, status: StatusCode, response: Response) -> PusherError {
    let body = response.text().await.unwrap_or_default();
    let detail = body.trim();
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => PusherError::transport(
            stage,
            format!("access denied by registry ({}) {}", status, detail),
        ),
        _ if detail.is_empty() => {
            PusherError::transport(stage, format!("registry returned {}", status))
        }
        _ => PusherError::transport(stage, format!("registry returned {}: {}", status, detail)),
    }
}
