//! Service endpoint configuration.
//!
//! Base URLs for every service the harness talks to, plus the OIDC
//! credentials used for the password-grant token exchange. Values come from
//! environment variables (names match the load-test scripts these harnesses
//! replace) or explicit construction for tests.

use url::Url;
use zeroize::Zeroizing;

/// Default base URL of the local crypto helper.
pub const DEFAULT_HELPER_URL: &str = "http://localhost:8080";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Base URLs for the services under test.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Crypto helper (`/generate-payloads`, `/get-timestamp`).
    pub helper_url: Url,
    /// Certificate authority. Required only by signing workloads.
    pub fulcio_url: Option<Url>,
    /// Transparency log. Required by every workload.
    pub rekor_url: Url,
    /// Timestamp authority (`/certchain`). Optional.
    pub tsa_url: Option<Url>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `REKOR_URL` (required)
    /// - `FULCIO_URL` (optional here; signing workloads check for it)
    /// - `TSA_URL` (optional)
    /// - `HELPER_URL` (default: `http://localhost:8080`)
    /// - `HTTP_TIMEOUT_SECS` (default: 30)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to
    /// its value. Lets callers layer other sources over the environment.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let rekor_url = optional_url(&lookup, "REKOR_URL")?.ok_or(ConfigError::Missing("REKOR_URL"))?;
        let timeout_secs = match lookup("HTTP_TIMEOUT_SECS") {
            Some(raw) if !raw.trim().is_empty() => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid("HTTP_TIMEOUT_SECS", raw))?,
            _ => DEFAULT_TIMEOUT_SECS,
        };
        Ok(Self {
            helper_url: url_or_default(&lookup, "HELPER_URL", DEFAULT_HELPER_URL)?,
            fulcio_url: optional_url(&lookup, "FULCIO_URL")?,
            rekor_url,
            tsa_url: optional_url(&lookup, "TSA_URL")?,
            timeout_secs,
        })
    }

    /// Point every service at one mock server (for testing).
    pub fn single_host(base: &str) -> Result<Self, ConfigError> {
        let url = parse_url("base", base)?;
        Ok(Self {
            helper_url: url.clone(),
            fulcio_url: Some(url.clone()),
            rekor_url: url.clone(),
            tsa_url: Some(url),
            timeout_secs: 5,
        })
    }
}

/// Password-grant credentials for the OIDC provider.
///
/// Custom `Debug` implementation redacts the password.
#[derive(Clone, Default)]
pub struct OidcCredentials {
    /// Issuer base URL; the token endpoint is
    /// `{issuer_url}/protocol/openid-connect/token`.
    pub issuer_url: String,
    pub user: String,
    pub password: Zeroizing<String>,
    pub client_id: String,
}

impl std::fmt::Debug for OidcCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OidcCredentials")
            .field("issuer_url", &self.issuer_url)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("client_id", &self.client_id)
            .finish()
    }
}

impl OidcCredentials {
    /// Read `OIDC_ISSUER_URL`, `OIDC_USER`, `OIDC_PASSWORD`, `OIDC_CLIENT_ID`.
    ///
    /// Absent variables become empty strings; [`Self::validate`] reports them.
    pub fn from_env() -> Self {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Read the same variables through `lookup`.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str| lookup(name).unwrap_or_default();
        Self {
            issuer_url: var("OIDC_ISSUER_URL"),
            user: var("OIDC_USER"),
            password: Zeroizing::new(var("OIDC_PASSWORD")),
            client_id: var("OIDC_CLIENT_ID"),
        }
    }

    /// Reject empty fields, naming the first missing variable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields: [(&'static str, &str); 4] = [
            ("OIDC_ISSUER_URL", self.issuer_url.as_str()),
            ("OIDC_USER", self.user.as_str()),
            ("OIDC_PASSWORD", self.password.as_str()),
            ("OIDC_CLIENT_ID", self.client_id.as_str()),
        ];
        match fields.iter().find(|(_, value)| value.trim().is_empty()) {
            Some((name, _)) => Err(ConfigError::Missing(*name)),
            None => Ok(()),
        }
    }

    /// Token endpoint derived from the issuer URL.
    pub fn token_url(&self) -> String {
        format!(
            "{}/protocol/openid-connect/token",
            self.issuer_url.trim_end_matches('/')
        )
    }
}

fn parse_url(var: &str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|e| ConfigError::InvalidUrl(var.to_string(), e.to_string()))
}

fn url_or_default(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &str,
    default: &str,
) -> Result<Url, ConfigError> {
    match optional_url(lookup, var)? {
        Some(url) => Ok(url),
        None => parse_url(var, default),
    }
}

fn optional_url(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &str,
) -> Result<Option<Url>, ConfigError> {
    match lookup(var) {
        Some(raw) if !raw.trim().is_empty() => parse_url(var, raw.trim()).map(Some),
        _ => Ok(None),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is required but not set")]
    Missing(&'static str),
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    #[error("invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}
