//! Scenario selection and run-shape configuration.
//!
//! Settings resolve through one lookup chain: an optional YAML scenario
//! file, then the process environment, then built-in defaults. The CLI
//! applies its flags on top of the resolved [`ScenarioConfig`].
//!
//! ```yaml
//! sign_vus: 5
//! verify_vus: 20
//! duration: 2m
//! payload_size: small
//! token_mode: once
//! services:
//!   rekor_url: https://rekor.example.com
//!   fulcio_url: https://fulcio.example.com
//! oidc:
//!   issuer_url: https://keycloak.example.com/auth/realms/tas
//!   user: jdoe
//!   client_id: trusted-artifact-signer
//! ```

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use humantime_serde::re::humantime;
use serde::{Deserialize, Serialize};
use tasperf_client::{OidcCredentials, ServiceConfig};
use tasperf_core::HarnessError;

use crate::token::TokenMode;

pub const DEFAULT_SIGN_VUS: usize = 10;
pub const DEFAULT_VERIFY_VUS: usize = 40;
pub const DEFAULT_DURATION: Duration = Duration::from_secs(600);
pub const DEFAULT_UUID_FILE: &str = "rekor_uuids.txt";
/// Payload selector the standalone signing scenario asks the helper for.
pub const DEFAULT_SIGN_PAYLOAD: &str = "small";

/// Which workloads a run drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scenario {
    /// Signing VUs only, with the timestamp branch. Identifiers go to the sink.
    Sign,
    /// Signing and verifying VUs sharing a live entry pool.
    SignVerify,
    /// Verifying VUs only, sampling a static identifier file.
    Verify,
}

impl Scenario {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sign => "sign",
            Self::SignVerify => "sign-verify",
            Self::Verify => "verify",
        }
    }

    pub fn signs(&self) -> bool {
        matches!(self, Self::Sign | Self::SignVerify)
    }

    pub fn verifies(&self) -> bool {
        matches!(self, Self::SignVerify | Self::Verify)
    }
}

impl std::fmt::Display for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scenario {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sign" => Ok(Self::Sign),
            "sign-verify" => Ok(Self::SignVerify),
            "verify" => Ok(Self::Verify),
            other => Err(HarnessError::Configuration(format!("unknown scenario {other:?}"))),
        }
    }
}

/// Resolved run shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioConfig {
    pub sign_vus: usize,
    pub verify_vus: usize,
    /// Shared default for both pools.
    pub duration: Duration,
    pub sign_duration: Option<Duration>,
    pub verify_duration: Option<Duration>,
    pub payload_size: Option<String>,
    /// Static identifier source for the `verify` scenario.
    pub uuid_file: PathBuf,
    /// Where published identifiers are appended, if anywhere.
    pub uuid_out: Option<PathBuf>,
    pub token_mode: Option<TokenMode>,
    pub timestamp_branch: Option<bool>,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            sign_vus: DEFAULT_SIGN_VUS,
            verify_vus: DEFAULT_VERIFY_VUS,
            duration: DEFAULT_DURATION,
            sign_duration: None,
            verify_duration: None,
            payload_size: None,
            uuid_file: PathBuf::from(DEFAULT_UUID_FILE),
            uuid_out: None,
            token_mode: None,
            timestamp_branch: None,
        }
    }
}

impl ScenarioConfig {
    /// Resolve from environment variables.
    pub fn from_env() -> Result<Self, HarnessError> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Resolve through `lookup`. Variables: `SIGN_VUS`, `VERIFY_VUS`,
    /// `TEST_DURATION`, `SIGN_DURATION`, `VERIFY_DURATION`, `PAYLOAD_SIZE`,
    /// `REKOR_UUID_FILE`, `REKOR_UUID_OUT`, `TOKEN_MODE`, `TIMESTAMP_BRANCH`.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, HarnessError> {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        Ok(Self {
            sign_vus: parse_opt(get("SIGN_VUS"), "SIGN_VUS")?.unwrap_or(defaults.sign_vus),
            verify_vus: parse_opt(get("VERIFY_VUS"), "VERIFY_VUS")?.unwrap_or(defaults.verify_vus),
            duration: duration_opt(get("TEST_DURATION"), "TEST_DURATION")?.unwrap_or(defaults.duration),
            sign_duration: duration_opt(get("SIGN_DURATION"), "SIGN_DURATION")?,
            verify_duration: duration_opt(get("VERIFY_DURATION"), "VERIFY_DURATION")?,
            payload_size: get("PAYLOAD_SIZE"),
            uuid_file: get("REKOR_UUID_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.uuid_file),
            uuid_out: get("REKOR_UUID_OUT").map(PathBuf::from),
            token_mode: get("TOKEN_MODE").map(|v| parse_token_mode(&v)).transpose()?,
            timestamp_branch: parse_opt(get("TIMESTAMP_BRANCH"), "TIMESTAMP_BRANCH")?,
        })
    }

    pub fn sign_duration(&self) -> Duration {
        self.sign_duration.unwrap_or(self.duration)
    }

    pub fn verify_duration(&self) -> Duration {
        self.verify_duration.unwrap_or(self.duration)
    }

    /// Token mode, defaulting per scenario: the standalone signing run
    /// exchanges a token every iteration, the dual run once.
    pub fn token_mode_for(&self, scenario: Scenario) -> TokenMode {
        self.token_mode.unwrap_or(match scenario {
            Scenario::Sign => TokenMode::PerIteration,
            _ => TokenMode::Once,
        })
    }

    pub fn timestamp_branch_for(&self, scenario: Scenario) -> bool {
        self.timestamp_branch.unwrap_or(scenario == Scenario::Sign)
    }

    pub fn payload_size_for(&self, scenario: Scenario) -> Option<String> {
        match (&self.payload_size, scenario) {
            (Some(size), _) => Some(size.clone()),
            (None, Scenario::Sign) => Some(DEFAULT_SIGN_PAYLOAD.to_string()),
            (None, _) => None,
        }
    }

    /// Reject shapes that would run nothing.
    pub fn validate(&self, scenario: Scenario) -> Result<(), HarnessError> {
        if scenario.signs() && self.sign_vus == 0 {
            return Err(HarnessError::Configuration("sign VUs must be at least 1".into()));
        }
        if scenario.verifies() && self.verify_vus == 0 {
            return Err(HarnessError::Configuration("verify VUs must be at least 1".into()));
        }
        Ok(())
    }
}

/// Parse a humantime duration such as `10m` or `90s`.
pub fn parse_duration(raw: &str) -> Result<Duration, HarnessError> {
    humantime::parse_duration(raw.trim())
        .map_err(|e| HarnessError::Configuration(format!("invalid duration {raw:?}: {e}")))
}

fn format_duration(d: Duration) -> String {
    humantime::format_duration(d).to_string()
}

fn duration_opt(raw: Option<String>, var: &str) -> Result<Option<Duration>, HarnessError> {
    raw.map(|v| {
        humantime::parse_duration(&v)
            .map_err(|e| HarnessError::Configuration(format!("invalid duration for {var}: {v:?}: {e}")))
    })
    .transpose()
}

fn parse_opt<T: FromStr>(raw: Option<String>, var: &str) -> Result<Option<T>, HarnessError> {
    raw.map(|v| {
        v.parse()
            .map_err(|_| HarnessError::Configuration(format!("invalid value for {var}: {v:?}")))
    })
    .transpose()
}

fn parse_token_mode(raw: &str) -> Result<TokenMode, HarnessError> {
    match raw {
        "once" => Ok(TokenMode::Once),
        "per-iteration" => Ok(TokenMode::PerIteration),
        other => Err(HarnessError::Configuration(format!(
            "invalid value for TOKEN_MODE: {other:?} (expected once or per-iteration)"
        ))),
    }
}

// -- YAML scenario file --------------------------------------------------------

/// Optional on-disk scenario file. Every field is optional; absent fields
/// fall through to the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioFile {
    pub sign_vus: Option<usize>,
    pub verify_vus: Option<usize>,
    #[serde(default, with = "humantime_serde")]
    pub duration: Option<Duration>,
    #[serde(default, with = "humantime_serde")]
    pub sign_duration: Option<Duration>,
    #[serde(default, with = "humantime_serde")]
    pub verify_duration: Option<Duration>,
    pub payload_size: Option<String>,
    pub uuid_file: Option<PathBuf>,
    pub uuid_out: Option<PathBuf>,
    pub token_mode: Option<TokenMode>,
    pub timestamp_branch: Option<bool>,
    #[serde(default)]
    pub services: ServicesSection,
    #[serde(default)]
    pub oidc: OidcSection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServicesSection {
    pub rekor_url: Option<String>,
    pub fulcio_url: Option<String>,
    pub tsa_url: Option<String>,
    pub helper_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// Credentials may be given here, but the password is better left to
/// `OIDC_PASSWORD`.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OidcSection {
    pub issuer_url: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub client_id: Option<String>,
}

impl std::fmt::Debug for OidcSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OidcSection")
            .field("issuer_url", &self.issuer_url)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("client_id", &self.client_id)
            .finish()
    }
}

impl ScenarioFile {
    /// Read and parse a YAML scenario file.
    pub fn load(path: &Path) -> Result<Self, HarnessError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            HarnessError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::parse(&raw)
            .map_err(|e| HarnessError::Configuration(format!("{}: {e}", path.display())))
    }

    pub fn parse(raw: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(raw)
    }

    /// The value this file assigns to environment variable `name`.
    pub fn var(&self, name: &str) -> Option<String> {
        let s = |v: &Option<String>| v.clone();
        match name {
            "SIGN_VUS" => self.sign_vus.map(|n| n.to_string()),
            "VERIFY_VUS" => self.verify_vus.map(|n| n.to_string()),
            "TEST_DURATION" => self.duration.map(format_duration),
            "SIGN_DURATION" => self.sign_duration.map(format_duration),
            "VERIFY_DURATION" => self.verify_duration.map(format_duration),
            "PAYLOAD_SIZE" => s(&self.payload_size),
            "REKOR_UUID_FILE" => self.uuid_file.as_ref().map(|p| p.display().to_string()),
            "REKOR_UUID_OUT" => self.uuid_out.as_ref().map(|p| p.display().to_string()),
            "TOKEN_MODE" => self.token_mode.map(|m| match m {
                TokenMode::Once => "once".to_string(),
                TokenMode::PerIteration => "per-iteration".to_string(),
            }),
            "TIMESTAMP_BRANCH" => self.timestamp_branch.map(|b| b.to_string()),
            "REKOR_URL" => s(&self.services.rekor_url),
            "FULCIO_URL" => s(&self.services.fulcio_url),
            "TSA_URL" => s(&self.services.tsa_url),
            "HELPER_URL" => s(&self.services.helper_url),
            "HTTP_TIMEOUT_SECS" => self.services.timeout_secs.map(|n| n.to_string()),
            "OIDC_ISSUER_URL" => s(&self.oidc.issuer_url),
            "OIDC_USER" => s(&self.oidc.user),
            "OIDC_PASSWORD" => s(&self.oidc.password),
            "OIDC_CLIENT_ID" => s(&self.oidc.client_id),
            _ => None,
        }
    }

    /// Lookup that prefers this file and falls back to the environment.
    pub fn layered(&self) -> impl Fn(&str) -> Option<String> + '_ {
        move |name| self.var(name).or_else(|| std::env::var(name).ok())
    }

    pub fn scenario_config(&self) -> Result<ScenarioConfig, HarnessError> {
        ScenarioConfig::from_vars(self.layered())
    }

    pub fn service_config(&self) -> Result<ServiceConfig, HarnessError> {
        ServiceConfig::from_vars(self.layered())
            .map_err(|e| HarnessError::Configuration(e.to_string()))
    }

    pub fn credentials(&self) -> OidcCredentials {
        OidcCredentials::from_vars(self.layered())
    }
}
