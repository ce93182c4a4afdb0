//! Configuration types for batch-uploader

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main configuration for an upload run
///
/// Every field has a default, so `Config::default()` and `{}` in JSON are both
/// valid. Durations are encoded as whole seconds.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Endpoint every file is POSTed to (default: "http://localhost:8080/upload")
    #[serde(default = "default_endpoint_url")]
    pub endpoint_url: String,

    /// Number of concurrent upload workers (default: 2 x available parallelism)
    #[serde(default = "default_num_workers")]
    pub num_workers: usize,

    /// Per-request timeout (None = wait indefinitely)
    #[serde(default, with = "optional_duration_serde")]
    pub request_timeout: Option<Duration>,

    /// Connection establishment timeout (None = client default)
    #[serde(default, with = "optional_duration_serde")]
    pub connect_timeout: Option<Duration>,

    /// User-Agent header sent with each upload
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint_url: default_endpoint_url(),
            num_workers: default_num_workers(),
            request_timeout: None,
            connect_timeout: None,
            user_agent: None,
        }
    }
}

impl Config {
    /// Parse a configuration from a JSON document and validate it
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read config '{}': {}", path.display(), e),
            ))
        })?;
        Self::from_json(&contents)
    }

    /// Check settings that serde cannot enforce on its own
    pub fn validate(&self) -> Result<()> {
        if self.num_workers == 0 {
            return Err(Error::config("num_workers", "must be at least 1"));
        }

        let url = url::Url::parse(&self.endpoint_url).map_err(|e| {
            Error::config(
                "endpoint_url",
                format!("invalid URL '{}': {}", self.endpoint_url, e),
            )
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::config(
                "endpoint_url",
                format!("unsupported scheme '{}'", url.scheme()),
            ));
        }

        Ok(())
    }
}

/// Default worker count: twice the available parallelism
///
/// Uploads are I/O-bound, so oversubscribing the cores keeps them busy.
pub fn default_num_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get() * 2)
        .unwrap_or(2)
}

fn default_endpoint_url() -> String {
    "http://localhost:8080/upload".to_string()
}

// Optional Duration serialization helper
mod optional_duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&d.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Option::<u64>::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs))
    }
}
