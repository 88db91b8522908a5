//! Configuration module for resolving registry connection settings
//!
//! Flag values and `CHART_PUSHER_*` environment variables are merged into a
//! single [`RegistryConfiguration`]. No semantic validation happens here;
//! option compatibility is checked when the client is built.

use clap::Args;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const ENV_PREFIX: &str = "CHART_PUSHER_";

/// Connection and credential settings for one push
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfiguration {
    pub cert_file: Option<PathBuf>,
    pub key_file: Option<PathBuf>,
    pub ca_file: Option<PathBuf>,
    pub insecure_skip_tls_verify: bool,
    pub plain_http: bool,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Raw registry options as supplied on the command line
#[derive(Debug, Clone, Default, Args, Serialize, Deserialize)]
pub struct RegistryOptions {
    /// Identify registry client using this SSL certificate file
    #[arg(long = "cert-file")]
    pub cert_file: Option<String>,

    /// Identify registry client using this SSL key file
    #[arg(long = "key-file")]
    pub key_file: Option<String>,

    /// Verify certificates of HTTPS-enabled servers using this CA bundle
    #[arg(long = "ca-file")]
    pub ca_file: Option<String>,

    /// Skip tls certificate checks for the chart upload
    #[arg(long = "insecure-skip-tls-verify")]
    pub insecure_skip_tls_verify: bool,

    /// Use insecure HTTP connections for the chart upload
    #[arg(long = "plain-http")]
    pub plain_http: bool,

    /// Registry username
    #[arg(long = "username")]
    pub username: Option<String>,

    /// Registry password
    #[arg(long = "password")]
    pub password: Option<String>,
}

impl RegistryConfiguration {
    pub fn has_credentials(&self) -> bool {
        self.username.is_some() && self.password.is_some()
    }

    pub fn with_plain_http(mut self, plain_http: bool) -> Self {
        self.plain_http = plain_http;
        self
    }

    pub fn with_insecure_skip_tls_verify(mut self, skip: bool) -> Self {
        self.insecure_skip_tls_verify = skip;
        self
    }

    pub fn with_credentials(mut self, username: &str, password: &str) -> Self {
        self.username = non_empty(Some(username.to_string()));
        self.password = non_empty(Some(password.to_string()));
        self
    }

    pub fn with_tls_client_config(
        mut self,
        cert_file: Option<&str>,
        key_file: Option<&str>,
        ca_file: Option<&str>,
    ) -> Self {
        self.cert_file = non_empty(cert_file.map(str::to_string)).map(PathBuf::from);
        self.key_file = non_empty(key_file.map(str::to_string)).map(PathBuf::from);
        self.ca_file = non_empty(ca_file.map(str::to_string)).map(PathBuf::from);
        self
    }
}

/// Merge flag values with environment fallbacks.
///
/// Flags win over the environment. `env` is consulted with the full variable
/// name (e.g. `CHART_PUSHER_USERNAME`), which keeps the function pure.
pub fn resolve<F>(options: RegistryOptions, env: F) -> RegistryConfiguration
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |name: &str| env(&format!("{}{}", ENV_PREFIX, name));
    let string =
        |flag: Option<String>, name: &str| non_empty(flag).or_else(|| non_empty(lookup(name)));
    let flag = |value: bool, name: &str| value || lookup(name).is_some_and(|v| parse_bool(&v));

    RegistryConfiguration {
        cert_file: string(options.cert_file, "CERT_FILE").map(PathBuf::from),
        key_file: string(options.key_file, "KEY_FILE").map(PathBuf::from),
        ca_file: string(options.ca_file, "CA_FILE").map(PathBuf::from),
        insecure_skip_tls_verify: flag(
            options.insecure_skip_tls_verify,
            "INSECURE_SKIP_TLS_VERIFY",
        ),
        plain_http: flag(options.plain_http, "PLAIN_HTTP"),
        username: string(options.username, "USERNAME"),
        password: string(options.password, "PASSWORD"),
    }
}

/// Resolve against the process environment
pub fn resolve_from_env(options: RegistryOptions) -> RegistryConfiguration {
    resolve(options, |name| std::env::var(name).ok())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn parse_bool(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "true" | "1" | "yes")
}
