//! # Client Configuration
//!
//! Loaded from an optional TOML file, then overridden by environment
//! variables (a `.env` file is honoured).
//!
//! ```toml
//! api_url = "http://localhost:5001"
//! checkout_url = "http://localhost:5001"
//! state_file = ".shop/session.json"
//! timeout_secs = 30
//! ```

use serde::Deserialize;
use shop_core::{ShopError, ShopResult};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Looked up in the working directory when no `--config` is given
pub const DEFAULT_CONFIG_FILE: &str = "shop.toml";

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ClientConfig {
    /// Storefront backend serving `/users` and `/orders`
    pub api_url: String,
    /// Checkout-session server; defaults to `api_url`
    pub checkout_url: Option<String>,
    /// File backing the persistent key/value store
    pub state_file: PathBuf,
    /// Request timeout for every backend call
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:5001".to_string(),
            checkout_url: None,
            state_file: PathBuf::from(".shop/session.json"),
            timeout_secs: 30,
        }
    }
}

impl ClientConfig {
    /// Load configuration.
    ///
    /// An explicit `path` must exist; otherwise [`DEFAULT_CONFIG_FILE`] is read
    /// when present. Environment variables override file values.
    pub fn load(path: Option<&Path>) -> ShopResult<Self> {
        dotenvy::dotenv().ok();

        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> ShopResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ShopError::Configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        debug!("Loaded client config from {}", path.display());
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> ShopResult<Self> {
        toml::from_str(raw).map_err(|e| ShopError::Configuration(format!("invalid config: {}", e)))
    }

    /// Override fields from `SHOP_API_URL`, `SHOP_CHECKOUT_URL`,
    /// `SHOP_STATE_FILE` and `SHOP_TIMEOUT_SECS`
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("SHOP_API_URL") {
            self.api_url = url;
        }
        if let Some(url) = lookup("SHOP_CHECKOUT_URL") {
            self.checkout_url = Some(url);
        }
        if let Some(path) = lookup("SHOP_STATE_FILE") {
            self.state_file = PathBuf::from(path);
        }
        if let Some(secs) = lookup("SHOP_TIMEOUT_SECS").and_then(|s| s.parse().ok()) {
            self.timeout_secs = secs;
        }
    }

    pub fn validate(&self) -> ShopResult<()> {
        for url in [Some(&self.api_url), self.checkout_url.as_ref()]
            .into_iter()
            .flatten()
        {
            let parsed = Url::parse(url)
                .map_err(|e| ShopError::Configuration(format!("invalid URL {:?}: {}", url, e)))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(ShopError::Configuration(format!(
                    "URL {:?} must use http or https",
                    url
                )));
            }
        }
        if self.timeout_secs == 0 {
            return Err(ShopError::Configuration(
                "timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn checkout_api_url(&self) -> &str {
        self.checkout_url.as_deref().unwrap_or(&self.api_url)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
