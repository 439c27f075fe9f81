//! Toolkit configuration.
//!
//! Configuration can be built in code or loaded from TOML:
//!
//! ```toml
//! merchant_url = "https://flowers.example.com"
//! agent_name = "flower-shop-agent"
//! timeout_secs = 30
//!
//! [[products]]
//! id = "roses"
//! title = "Red Roses"
//!
//! [[products]]
//! id = "tulips"
//! title = "Spring Tulips"
//! ```

use std::{path::Path, time::Duration};

use serde::Deserialize;
use url::Url;

use crate::{
    catalog::Product,
    error::{Result, ToolkitError},
};

/// Default name sent in the `UCP-Agent` header.
pub const DEFAULT_AGENT_NAME: &str = "ucp-agent-toolkit";

/// Default checkout currency (ISO 4217).
pub const DEFAULT_CURRENCY: &str = "USD";

/// Root toolkit configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolkitConfig {
    /// Base URL of the UCP merchant.
    pub merchant_url: String,

    /// Agent name for the `UCP-Agent` header.
    #[serde(default = "default_agent_name")]
    pub agent_name: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Currency for new checkouts.
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Reject merchants whose protocol version predates the agent's.
    #[serde(default = "default_true")]
    pub validate_version: bool,

    /// Local product catalog.
    #[serde(default)]
    pub products: Vec<Product>,
}

impl ToolkitConfig {
    /// Creates a configuration with defaults for everything but the merchant URL.
    #[must_use]
    pub fn new(merchant_url: impl Into<String>) -> Self {
        Self {
            merchant_url: merchant_url.into(),
            agent_name: default_agent_name(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            currency: default_currency(),
            validate_version: true,
            products: Vec::new(),
        }
    }

    /// Parses and validates a TOML configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ToolkitError::ConfigError`] if parsing fails, or any error from
    /// [`validate`](Self::validate).
    ///
    /// # Examples
    ///
    /// ```
    /// use ucp_toolkit::config::ToolkitConfig;
    ///
    /// let config = ToolkitConfig::from_toml(
    ///     r#"
    ///     merchant_url = "https://flowers.example.com/"
    ///     [[products]]
    ///     id = "roses"
    ///     title = "Red Roses"
    /// "#,
    /// )?;
    ///
    /// assert_eq!(config.merchant_url, "https://flowers.example.com");
    /// assert_eq!(config.products.len(), 1);
    /// # Ok::<(), ucp_toolkit::ToolkitError>(())
    /// ```
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(toml_str)
            .map_err(|e| ToolkitError::ConfigError(format!("invalid TOML config: {e}")))?;
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or its contents are invalid.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ToolkitError::ConfigError(format!("cannot read config file: {e}")))?;
        Self::from_toml(&content)
    }

    /// Validates the configuration.
    ///
    /// Checks that:
    /// - `merchant_url` parses, uses `http` or `https`, and has a host
    /// - `timeout_secs` is within 1-300 and `connect_timeout_secs` within 1-60
    /// - `agent_name` and `currency` are not empty
    ///
    /// # Errors
    ///
    /// Returns [`ToolkitError::InvalidMerchantUrl`] or [`ToolkitError::ConfigError`].
    pub fn validate(&self) -> Result<()> {
        parse_merchant_url(&self.merchant_url)?;

        if self.timeout_secs == 0 || self.timeout_secs > 300 {
            return Err(ToolkitError::ConfigError(
                "timeout_secs must be between 1 and 300".to_owned(),
            ));
        }
        if self.connect_timeout_secs == 0 || self.connect_timeout_secs > 60 {
            return Err(ToolkitError::ConfigError(
                "connect_timeout_secs must be between 1 and 60".to_owned(),
            ));
        }
        if self.agent_name.trim().is_empty() {
            return Err(ToolkitError::ConfigError("agent_name cannot be empty".to_owned()));
        }
        if self.currency.trim().is_empty() {
            return Err(ToolkitError::ConfigError("currency cannot be empty".to_owned()));
        }

        Ok(())
    }

    /// Trims trailing slashes from the merchant URL.
    pub(crate) fn normalize(&mut self) {
        let trimmed = self.merchant_url.trim_end_matches('/').len();
        self.merchant_url.truncate(trimmed);
    }

    /// Returns the request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Returns the connection timeout.
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// Parses and validates a merchant base URL.
pub(crate) fn parse_merchant_url(url_str: &str) -> Result<Url> {
    let url = Url::parse(url_str)
        .map_err(|e| ToolkitError::InvalidMerchantUrl(format!("parse error: {e}")))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ToolkitError::InvalidMerchantUrl(format!(
            "URL must use http or https, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(ToolkitError::InvalidMerchantUrl(format!("URL missing host: {url_str}")));
    }

    Ok(url)
}

fn default_agent_name() -> String {
    DEFAULT_AGENT_NAME.to_owned()
}

const fn default_timeout_secs() -> u64 {
    30
}

const fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_owned()
}

const fn default_true() -> bool {
    true
}
