//! Authentication module for OCI registry access
//!
//! The registry is probed at `/v2/`. A `401` carries a `WWW-Authenticate`
//! challenge: `Bearer` challenges are answered by fetching a repository
//! scoped token from the advertised realm, `Basic` challenges by sending the
//! configured credentials on every request.

use crate::error::{PusherError, Result};
use reqwest::{Client, RequestBuilder, StatusCode, header::WWW_AUTHENTICATE};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

const STAGE: &str = "authentication";

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// How requests in a session are authorized
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authorization {
    Anonymous,
    Basic(Credentials),
    Bearer(String),
}

impl Authorization {
    pub fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        match self {
            Authorization::Anonymous => request,
            Authorization::Basic(c) => request.basic_auth(&c.username, Some(&c.password)),
            Authorization::Bearer(token) => request.bearer_auth(token),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Challenge {
    Bearer { realm: String, service: Option<String> },
    Basic,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: Option<String>,
    access_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Auth {
    client: Client,
    base_url: String,
}

impl Auth {
    pub fn new(client: Client, base_url: String) -> Self {
        Self { client, base_url }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Work out how to authorize pushes to `repository`
    pub async fn login(
        &self,
        repository: &str,
        credentials: Option<&Credentials>,
    ) -> Result<Authorization> {
        let url = format!("{}/v2/", self.base_url);
        debug!(url = %url, "probing registry");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| PusherError::transport(STAGE, format!("cannot reach {}: {}", url, e)))?;

        match response.status() {
            status if status.is_success() => {
                debug!("registry accepts anonymous access");
                Ok(credentials.map_or(Authorization::Anonymous, |c| {
                    Authorization::Basic(c.clone())
                }))
            }
            StatusCode::UNAUTHORIZED => {
                let header = response
                    .headers()
                    .get(WWW_AUTHENTICATE)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default();
                self.answer_challenge(header, repository, credentials).await
            }
            status => Err(PusherError::transport(
                STAGE,
                format!("unexpected status {} from {}", status, url),
            )),
        }
    }

    /// Turn a `WWW-Authenticate` challenge into request authorization
    pub async fn answer_challenge(
        &self,
        header: &str,
        repository: &str,
        credentials: Option<&Credentials>,
    ) -> Result<Authorization> {
        match parse_challenge(header) {
            Some(Challenge::Bearer { realm, service }) => {
                let token = self
                    .fetch_token(&realm, service.as_deref(), repository, credentials)
                    .await?;
                Ok(Authorization::Bearer(token))
            }
            Some(Challenge::Basic) => credentials
                .map(|c| Authorization::Basic(c.clone()))
                .ok_or_else(|| {
                    PusherError::transport(
                        STAGE,
                        "registry requires credentials but none were provided",
                    )
                }),
            None => Err(PusherError::transport(
                STAGE,
                format!("unsupported authentication challenge: {:?}", header),
            )),
        }
    }

    async fn fetch_token(
        &self,
        realm: &str,
        service: Option<&str>,
        repository: &str,
        credentials: Option<&Credentials>,
    ) -> Result<String> {
        let scope = format!("repository:{}:pull,push", repository);
        let mut query = vec![("scope", scope.as_str())];
        if let Some(service) = service {
            query.push(("service", service));
        }
        debug!(realm, scope = %scope, "requesting bearer token");

        let mut request = self.client.get(realm).query(&query);
        if let Some(c) = credentials {
            request = request.basic_auth(&c.username, Some(&c.password));
        }

        let response = request
            .send()
            .await
            .map_err(|e| PusherError::transport(STAGE, format!("token request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PusherError::transport(
                STAGE,
                format!("token request rejected with status {}", status),
            ));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| PusherError::transport(STAGE, format!("invalid token response: {}", e)))?;

        body.token
            .or(body.access_token)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| PusherError::transport(STAGE, "token response did not contain a token"))
    }
}

/// Parse a `WWW-Authenticate` header value.
///
/// Parameter values may be quoted and contain commas (`scope="a:b:pull,push"`).
pub(crate) fn parse_challenge(header: &str) -> Option<Challenge> {
    let header = header.trim();
    let (scheme, params) = header.split_once(' ').unwrap_or((header, ""));

    if scheme.eq_ignore_ascii_case("basic") {
        return Some(Challenge::Basic);
    }
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let params = parse_params(params);
    let realm = params.get("realm").filter(|r| !r.is_empty())?.clone();
    Some(Challenge::Bearer {
        realm,
        service: params.get("service").cloned(),
    })
}

fn parse_params(input: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();
    let mut rest = input.trim();

    while !rest.is_empty() {
        let Some((key, after)) = rest.split_once('=') else {
            break;
        };
        let key = key.trim().trim_start_matches(',').trim().to_ascii_lowercase();
        let after = after.trim_start();

        let (value, remaining) = if let Some(quoted) = after.strip_prefix('"') {
            match quoted.find('"') {
                Some(end) => (&quoted[..end], &quoted[end + 1..]),
                None => (quoted, ""),
            }
        } else {
            match after.find(',') {
                Some(end) => (after[..end].trim(), &after[end..]),
                None => (after.trim(), ""),
            }
        };

        params.insert(key, value.to_string());
        rest = remaining.trim_start().trim_start_matches(',').trim_start();
    }

    params
}
