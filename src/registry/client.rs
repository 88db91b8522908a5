//! Registry client construction.
//!
//! `RegistryClient` is an in-memory descriptor built from a
//! `RegistryConfiguration`. Building it only checks that the TLS and auth
//! options fit together; certificate files are read when a connection is
//! actually opened.

use crate::config::RegistryConfiguration;
use crate::error::{PusherError, Result};
use crate::registry::auth::{Auth, Credentials};
use crate::registry::reference::OciReference;
use crate::registry::session::RegistrySession;
use reqwest::{Certificate, Client, Identity};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const USER_AGENT: &str = concat!("chart-pusher/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlsSettings {
    pub cert_file: Option<PathBuf>,
    pub key_file: Option<PathBuf>,
    pub ca_file: Option<PathBuf>,
    pub insecure_skip_verify: bool,
}

#[derive(Debug, Clone)]
pub struct RegistryClient {
    tls: TlsSettings,
    plain_http: bool,
    credentials: Option<Credentials>,
}

impl RegistryClient {
    /// Validate `config` and build a client descriptor from it.
    ///
    /// Checks run in a fixed order: plain HTTP against TLS files first, then
    /// the certificate/key pairing. Nothing touches the filesystem or network.
    pub fn from_config(config: &RegistryConfiguration) -> Result<Self> {
        let cert_file = set_path(&config.cert_file);
        let key_file = set_path(&config.key_file);
        let ca_file = set_path(&config.ca_file);

        if config.plain_http {
            let fields: Vec<&'static str> = [
                ("cert-file", cert_file.is_some()),
                ("key-file", key_file.is_some()),
                ("ca-file", ca_file.is_some()),
            ]
            .into_iter()
            .filter_map(|(name, set)| set.then_some(name))
            .collect();
            if !fields.is_empty() {
                return Err(PusherError::ConflictingTlsOptions { fields });
            }
        }

        match (&cert_file, &key_file) {
            (Some(_), None) => {
                return Err(PusherError::IncompleteTlsMaterial {
                    present: "cert-file",
                    missing: "key-file",
                });
            }
            (None, Some(_)) => {
                return Err(PusherError::IncompleteTlsMaterial {
                    present: "key-file",
                    missing: "cert-file",
                });
            }
            _ => {}
        }

        let username = config.username.as_deref().filter(|u| !u.is_empty());
        let password = config.password.as_deref().filter(|p| !p.is_empty());
        let credentials = match (username, password) {
            (Some(username), Some(password)) => Some(Credentials::new(username, password)),
            (Some(username), None) => {
                warn!(username, "username given without password; pushing anonymously");
                None
            }
            (None, Some(_)) => {
                warn!("password given without username; pushing anonymously");
                None
            }
            (None, None) => None,
        };

        Ok(Self {
            tls: TlsSettings {
                cert_file,
                key_file,
                ca_file,
                insecure_skip_verify: config.insecure_skip_tls_verify,
            },
            plain_http: config.plain_http,
            credentials,
        })
    }

    pub fn tls(&self) -> &TlsSettings {
        &self.tls
    }

    pub fn plain_http(&self) -> bool {
        self.plain_http
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// URL scheme used to reach the registry
    pub fn scheme(&self) -> &'static str {
        if self.plain_http { "http" } else { "https" }
    }

    pub fn base_url(&self, registry: &str) -> String {
        format!("{}://{}", self.scheme(), registry)
    }

    /// Build the HTTP client, loading any referenced TLS material.
    ///
    /// Client keys may be PKCS#8, PKCS#1 (`RSA PRIVATE KEY`) or SEC1
    /// (`EC PRIVATE KEY`) PEM. A client identity switches the connection to
    /// the rustls backend, which is the one that reads all three.
    pub fn http_client(&self) -> Result<Client> {
        let mut builder = Client::builder().user_agent(USER_AGENT);

        if self.tls.insecure_skip_verify {
            debug!("TLS certificate verification disabled");
            builder = builder
                .danger_accept_invalid_certs(true)
                .danger_accept_invalid_hostnames(true);
        }

        if let Some(ca_file) = &self.tls.ca_file {
            let pem = read_file(ca_file)?;
            let ca = Certificate::from_pem(&pem)
                .map_err(|e| PusherError::client_tls("CA bundle", e))?;
            builder = builder.add_root_certificate(ca);
        }

        if let (Some(cert_file), Some(key_file)) = (&self.tls.cert_file, &self.tls.key_file) {
            let mut pem = read_file(cert_file)?;
            pem.push(b'\n');
            pem.extend(read_file(key_file)?);
            let identity = Identity::from_pem(&pem).map_err(|e| {
                PusherError::client_tls(
                    &format!(
                        "client certificate {} or key {}",
                        cert_file.display(),
                        key_file.display()
                    ),
                    e,
                )
            })?;
            debug!(cert = %cert_file.display(), "using client certificate");
            builder = builder.use_rustls_tls().identity(identity);
        }

        builder
            .build()
            .map_err(|e| PusherError::client_tls("HTTP client configuration", e))
    }

    /// Open an authenticated session against the repository of `reference`
    pub async fn connect(&self, reference: &OciReference) -> Result<RegistrySession> {
        let http = self.http_client()?;
        let base_url = self.base_url(&reference.registry);
        let auth = Auth::new(http, base_url.clone());
        let authorization = auth
            .login(&reference.repository, self.credentials.as_ref())
            .await?;
        Ok(RegistrySession::new(
            auth,
            base_url,
            reference.repository.clone(),
            self.credentials.clone(),
            authorization,
        ))
    }
}

fn set_path(path: &Option<PathBuf>) -> Option<PathBuf> {
    path.as_ref().filter(|p| !p.as_os_str().is_empty()).cloned()
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| PusherError::client_io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tls_config(
        cert: Option<&str>,
        key: Option<&str>,
        ca: Option<&str>,
    ) -> RegistryConfiguration {
        RegistryConfiguration::default().with_tls_client_config(cert, key, ca)
    }

    #[test]
    fn test_plain_http_conflicts_with_any_tls_file() {
        let cases = [
            (Some("c.pem"), None, None),
            (None, Some("k.pem"), None),
            (None, None, Some("ca.pem")),
            (Some("c.pem"), Some("k.pem"), Some("ca.pem")),
        ];
        for (cert, key, ca) in cases {
            let config = tls_config(cert, key, ca).with_plain_http(true);
            let err = RegistryClient::from_config(&config).unwrap_err();
            assert!(
                matches!(err, PusherError::ConflictingTlsOptions { .. }),
                "expected conflict for {:?}/{:?}/{:?}, got {}",
                cert,
                key,
                ca,
                err
            );
        }
    }

    #[test]
    fn test_conflict_checked_before_pairing() {
        let config = tls_config(Some("c.pem"), None, None).with_plain_http(true);
        let err = RegistryClient::from_config(&config).unwrap_err();
        assert!(matches!(
            err,
            PusherError::ConflictingTlsOptions { ref fields } if fields == &["cert-file"]
        ));
    }

    #[test]
    fn test_cert_and_key_must_be_paired() {
        let err = RegistryClient::from_config(&tls_config(Some("c.pem"), None, None)).unwrap_err();
        assert!(matches!(
            err,
            PusherError::IncompleteTlsMaterial { present: "cert-file", missing: "key-file" }
        ));

        let config = tls_config(None, Some("k.pem"), Some("ca.pem"));
        let err = RegistryClient::from_config(&config).unwrap_err();
        assert!(matches!(
            err,
            PusherError::IncompleteTlsMaterial { present: "key-file", missing: "cert-file" }
        ));
    }

    #[test]
    fn test_files_are_not_read_during_construction() {
        let config = tls_config(Some("/nonexistent/c.pem"), Some("/nonexistent/k.pem"), None);
        let client = RegistryClient::from_config(&config).unwrap();
        assert_eq!(client.tls().cert_file, Some(PathBuf::from("/nonexistent/c.pem")));
        assert_eq!(client.scheme(), "https");
    }

    #[test]
    fn test_missing_ca_file_surfaces_on_connect() {
        let config = tls_config(None, None, Some("/nonexistent/ca.pem"));
        let client = RegistryClient::from_config(&config).unwrap();
        let err = client.http_client().unwrap_err();
        assert!(matches!(err, PusherError::ClientConstruction { .. }));
        assert!(err.to_string().contains("/nonexistent/ca.pem"));
    }

    const RSA_CERT: &str = include_str!("../../tests/fixtures/tls/rsa.crt");
    const RSA_PKCS8_KEY: &str = include_str!("../../tests/fixtures/tls/rsa-pkcs8.key");
    const RSA_PKCS1_KEY: &str = include_str!("../../tests/fixtures/tls/rsa-pkcs1.key");
    const EC_CERT: &str = include_str!("../../tests/fixtures/tls/ec.crt");
    const EC_KEY: &str = include_str!("../../tests/fixtures/tls/ec.key");

    fn client_with_identity(dir: &Path, cert: &str, key: &str) -> RegistryClient {
        let cert_path = dir.join("client.crt");
        let key_path = dir.join("client.key");
        std::fs::write(&cert_path, cert).unwrap();
        std::fs::write(&key_path, key).unwrap();
        let config = tls_config(cert_path.to_str(), key_path.to_str(), None);
        RegistryClient::from_config(&config).unwrap()
    }

    #[test]
    fn test_client_identity_key_formats() {
        let dir = tempfile::tempdir().unwrap();
        let cases = [
            ("pkcs8", RSA_CERT, RSA_PKCS8_KEY),
            ("pkcs1", RSA_CERT, RSA_PKCS1_KEY),
            ("sec1", EC_CERT, EC_KEY),
        ];
        for (format, cert, key) in cases {
            let client = client_with_identity(dir.path(), cert, key);
            if let Err(e) = client.http_client() {
                panic!("{} key was rejected: {}", format, e);
            }
        }
    }

    #[test]
    fn test_identity_with_ca_and_insecure_mode() {
        let dir = tempfile::tempdir().unwrap();
        let cert_path = dir.path().join("client.crt");
        let key_path = dir.path().join("client.key");
        std::fs::write(&cert_path, RSA_CERT).unwrap();
        std::fs::write(&key_path, RSA_PKCS1_KEY).unwrap();
        let config = tls_config(cert_path.to_str(), key_path.to_str(), cert_path.to_str())
            .with_insecure_skip_tls_verify(true);
        let client = RegistryClient::from_config(&config).unwrap();
        assert!(client.http_client().is_ok());
    }

    #[test]
    fn test_missing_key_file_surfaces_on_connect() {
        let dir = tempfile::tempdir().unwrap();
        let cert_path = dir.path().join("client.crt");
        std::fs::write(&cert_path, RSA_CERT).unwrap();
        let key_path = dir.path().join("missing.key");
        let config = tls_config(cert_path.to_str(), key_path.to_str(), None);

        let client = RegistryClient::from_config(&config).unwrap();
        let err = client.http_client().unwrap_err();
        assert!(matches!(err, PusherError::ClientConstruction { .. }));
        assert!(err.to_string().contains("missing.key"));
    }

    #[test]
    fn test_unparseable_key_is_client_construction_error() {
        let dir = tempfile::tempdir().unwrap();
        let client = client_with_identity(dir.path(), RSA_CERT, "not a private key\n");
        let err = client.http_client().unwrap_err();
        assert!(matches!(err, PusherError::ClientConstruction { .. }));
        assert!(err.to_string().contains("client.key"));
    }

    #[test]
    fn test_plain_http_without_tls_files() {
        let config = RegistryConfiguration::default()
            .with_plain_http(true)
            .with_insecure_skip_tls_verify(true);
        let client = RegistryClient::from_config(&config).unwrap();
        assert!(client.plain_http());
        assert_eq!(client.base_url("localhost:5000"), "http://localhost:5000");
        assert!(client.http_client().is_ok());
    }

    #[test]
    fn test_credentials_need_both_halves() {
        let config = RegistryConfiguration {
            username: Some("admin".into()),
            ..Default::default()
        };
        assert!(RegistryClient::from_config(&config).unwrap().credentials().is_none());

        let config = RegistryConfiguration::default().with_credentials("admin", "secret");
        let client = RegistryClient::from_config(&config).unwrap();
        assert_eq!(client.credentials().map(|c| c.username.as_str()), Some("admin"));
    }
}
