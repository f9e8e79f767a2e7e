//! Client configuration.
//!
//! A [`Config`] is built once and handed to a client at construction; the
//! client never mutates it. Every field has a default, so a YAML file only
//! needs to mention what it overrides:
//!
//! ```yaml
//! connect_timeout_ms: 2000
//! retry:
//!   enabled: true
//!   max_retries: 3
//!   on_5xx: true
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Deserializer};

/// Environment variable naming a YAML configuration file.
pub const CONFIG_ENV: &str = "HTTPLINE_CONFIG";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tls: TlsConfig,

    #[serde(rename = "connect_timeout_ms", deserialize_with = "millis")]
    pub connect_timeout: Duration,

    #[serde(rename = "read_timeout_ms", deserialize_with = "millis")]
    pub read_timeout: Duration,

    pub redirect: RedirectConfig,

    pub retry: RetryConfig,

    /// Advertise `Accept-Encoding: gzip, deflate` and decode compressed bodies.
    pub compression: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TlsConfig {
    /// When false, certificates are not verified and SNI is not sent.
    pub verify: bool,
    /// Extra PEM bundle trusted in addition to the system roots.
    pub ca_file: Option<PathBuf>,
    /// Directory of PEM certificates trusted in addition to the system roots.
    pub ca_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RedirectConfig {
    pub follow: bool,
    pub max_hops: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub enabled: bool,
    pub max_retries: u32,

    #[serde(rename = "initial_delay_ms", deserialize_with = "millis")]
    pub initial_delay: Duration,

    pub backoff_factor: f64,

    #[serde(rename = "max_delay_ms", deserialize_with = "millis")]
    pub max_delay: Duration,

    pub on_timeout: bool,
    pub on_connection_error: bool,
    pub on_5xx: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tls: TlsConfig::default(),
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(30),
            redirect: RedirectConfig::default(),
            retry: RetryConfig::default(),
            compression: true,
        }
    }
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            verify: true,
            ca_file: None,
            ca_path: None,
        }
    }
}

impl Default for RedirectConfig {
    fn default() -> Self {
        Self {
            follow: true,
            max_hops: 10,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_retries: 3,
            initial_delay: Duration::from_millis(1000),
            backoff_factor: 2.0,
            max_delay: Duration::from_secs(30),
            on_timeout: true,
            on_connection_error: true,
            on_5xx: false,
        }
    }
}

impl Config {
    /// Loads the file named by `HTTPLINE_CONFIG`, or the defaults when unset.
    pub fn load() -> anyhow::Result<Self> {
        match std::env::var(CONFIG_ENV) {
            Ok(path) => Self::from_file(path),
            Err(_) => Ok(Self::default()),
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_yaml(&text).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn from_yaml(text: &str) -> anyhow::Result<Self> {
        let config: Config = serde_yaml::from_str(text).context("failed to parse YAML config")?;
        // A zero socket timeout is rejected by the OS
        if config.connect_timeout.is_zero() {
            anyhow::bail!("connect_timeout_ms must be greater than 0");
        }
        if config.read_timeout.is_zero() {
            anyhow::bail!("read_timeout_ms must be greater than 0");
        }
        if config.retry.backoff_factor < 1.0 {
            anyhow::bail!(
                "retry.backoff_factor must be >= 1.0, got {}",
                config.retry.backoff_factor
            );
        }
        Ok(config)
    }
}

fn millis<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    u64::deserialize(deserializer).map(Duration::from_millis)
}
