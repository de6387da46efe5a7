//! Configuration management with TOML, environment variables, and CLI overrides.

use crate::ozon::marketplace::{Marketplace, DEFAULT_API_PATH, DEFAULT_SITE_URL};
use crate::proxy::ProxySource;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Proxy list, one `host:port` or `host:port:user:pass` per line
    #[serde(default = "default_proxy_file")]
    pub proxy_file: PathBuf,

    /// Marketplace site URL
    #[serde(default = "default_site_url")]
    pub site_url: String,

    /// Page-JSON API path under the site URL
    #[serde(default = "default_api_path")]
    pub api_path: String,

    /// Listing pages to walk (0 = until an empty page)
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,

    /// Maximum in-flight product extractions (0 = unbounded)
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Backoff unit in seconds; escalation n sleeps n/2 units
    #[serde(default = "default_backoff_unit_secs")]
    pub backoff_unit_secs: u64,

    /// Pool reloads allowed per request before giving up
    #[serde(default = "default_max_escalations")]
    pub max_escalations: u32,

    /// Output format
    #[serde(default)]
    pub format: OutputFormat,
}

fn default_proxy_file() -> PathBuf {
    PathBuf::from("proxylist.txt")
}

fn default_site_url() -> String {
    DEFAULT_SITE_URL.to_string()
}

fn default_api_path() -> String {
    DEFAULT_API_PATH.to_string()
}

fn default_max_pages() -> u32 {
    10
}

fn default_concurrency() -> usize {
    32
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_backoff_unit_secs() -> u64 {
    60
}

fn default_max_escalations() -> u32 {
    3
}

impl Default for Config {
    fn default() -> Self {
        Self {
            proxy_file: default_proxy_file(),
            site_url: default_site_url(),
            api_path: default_api_path(),
            max_pages: default_max_pages(),
            concurrency: default_concurrency(),
            request_timeout_secs: default_request_timeout_secs(),
            backoff_unit_secs: default_backoff_unit_secs(),
            max_escalations: default_max_escalations(),
            format: OutputFormat::Table,
        }
    }
}

impl Config {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading config from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Loads configuration with fallback to default locations.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit_path {
            return Self::from_file(path);
        }

        let local_config = Path::new("config.toml");
        if local_config.exists() {
            debug!("Found config.toml in current directory");
            return Self::from_file(local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("ozon-sellers").join("config.toml");
            if xdg_config.exists() {
                debug!("Found config in XDG config directory");
                return Self::from_file(xdg_config);
            }
        }

        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Applies environment variable overrides.
    pub fn with_env(mut self) -> Self {
        if let Ok(path) = std::env::var("OZON_PROXIES") {
            self.proxy_file = PathBuf::from(path);
        }

        if let Ok(site) = std::env::var("OZON_SITE_URL") {
            self.site_url = site;
        }

        if let Ok(pages) = std::env::var("OZON_MAX_PAGES") {
            if let Ok(p) = pages.parse() {
                self.max_pages = p;
            }
        }

        if let Ok(concurrency) = std::env::var("OZON_CONCURRENCY") {
            if let Ok(c) = concurrency.parse() {
                self.concurrency = c;
            }
        }

        self
    }

    pub fn proxy_source(&self) -> ProxySource {
        ProxySource::File(self.proxy_file.clone())
    }

    pub fn marketplace(&self) -> Marketplace {
        Marketplace::with_api_path(&self.site_url, &self.api_path)
    }

    /// Page cap as understood by the walker.
    pub fn page_limit(&self) -> Option<u32> {
        (self.max_pages > 0).then_some(self.max_pages)
    }

    pub fn concurrency_limit(&self) -> Option<usize> {
        (self.concurrency > 0).then_some(self.concurrency)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn backoff_unit(&self) -> Duration {
        Duration::from_secs(self.backoff_unit_secs)
    }
}

/// Output format for results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Unknown format: {}. Use: table, json, csv", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}
