//! Proxy list inspection command.

use crate::config::{Config, OutputFormat};
use crate::proxy::ProxyPool;
use anyhow::{Context, Result};

/// Loads the proxy list and prints the normalised addresses.
pub struct ProxiesCommand {
    config: Config,
}

impl ProxiesCommand {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<String> {
        let addresses = ProxyPool::load_from(&self.config.proxy_source())
            .with_context(|| format!("Failed to load {}", self.config.proxy_file.display()))?;

        let addresses: Vec<&str> = addresses.iter().map(|a| a.as_str()).collect();

        Ok(match self.config.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(&addresses).unwrap_or_else(|_| "[]".to_string())
            }
            OutputFormat::Csv => {
                let mut lines = vec!["proxy"];
                lines.extend(addresses);
                lines.join("\n")
            }
            OutputFormat::Table => {
                let mut lines: Vec<String> = addresses.iter().map(|a| a.to_string()).collect();
                lines.push(String::new());
                lines.push(format!("{} proxies", addresses.len()));
                lines.join("\n")
            }
        })
    }
}
