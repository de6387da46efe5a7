//! Proxy pool with per-epoch health tracking.

use crate::error::{CrawlError, ExhaustionError};
use rand::Rng;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

/// A proxy endpoint, either `host:port` or `user:pass@host:port`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProxyAddress(String);

impl ProxyAddress {
    pub fn new(addr: impl Into<String>) -> Self {
        Self(addr.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// URL used to dial the proxy.
    pub fn url(&self) -> String {
        format!("http://{}", self.0)
    }

    /// Parses one line of a proxy list.
    ///
    /// `host:port` is taken as-is. Lines with four or more fields are read as
    /// `host:port:user:pass` and turned into `user:pass@host:port`.
    pub fn parse_line(line: &str) -> Option<Self> {
        let fields: Vec<&str> = line.trim().split(':').collect();

        let host = fields.first().copied().unwrap_or_default();
        let port = fields.get(1).copied().unwrap_or_default();
        if host.is_empty() || port.is_empty() {
            return None;
        }

        let addr = if fields.len() >= 4 {
            format!("{}:{}@{}:{}", fields[2], fields[3], host, port)
        } else {
            format!("{}:{}", host, port)
        };

        Some(Self(addr))
    }
}

impl fmt::Display for ProxyAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where the proxy list comes from. Re-read on every reload.
#[derive(Debug, Clone)]
pub enum ProxySource {
    /// Line-oriented text file.
    File(PathBuf),
    /// Inline list, one address per line.
    Text(String),
}

impl ProxySource {
    fn read(&self) -> Result<String, CrawlError> {
        match self {
            ProxySource::File(path) => std::fs::read_to_string(path).map_err(|e| {
                CrawlError::Configuration(format!(
                    "cannot read proxy list {}: {}",
                    path.display(),
                    e
                ))
            }),
            ProxySource::Text(text) => Ok(text.clone()),
        }
    }
}

impl fmt::Display for ProxySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProxySource::File(path) => write!(f, "{}", path.display()),
            ProxySource::Text(_) => f.write_str("<inline>"),
        }
    }
}

/// Health classification of a proxy within the current epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyHealth {
    Unchecked,
    Working,
    NotWorking,
}

#[derive(Debug, Default)]
struct PoolState {
    health: HashMap<ProxyAddress, ProxyHealth>,
    epoch: u64,
}

impl PoolState {
    fn reset(&mut self, addresses: Vec<ProxyAddress>) {
        self.health = addresses.into_iter().map(|a| (a, ProxyHealth::Unchecked)).collect();
    }

    fn set(&mut self, addr: &ProxyAddress, health: ProxyHealth) {
        if let Some(current) = self.health.get_mut(addr) {
            *current = health;
        }
    }

    fn with_health(&self, health: ProxyHealth) -> Vec<ProxyAddress> {
        let mut addrs: Vec<ProxyAddress> =
            self.health.iter().filter(|(_, h)| **h == health).map(|(a, _)| a.clone()).collect();
        addrs.sort();
        addrs
    }
}

/// Shared pool of outbound proxies.
///
/// Every known address has exactly one [`ProxyHealth`], so the
/// unchecked / working / not-working sets always partition the pool.
/// All operations take `&self`; the state sits behind a mutex that is never
/// held across an await point.
#[derive(Debug)]
pub struct ProxyPool {
    source: ProxySource,
    state: Mutex<PoolState>,
}

impl ProxyPool {
    /// Builds a pool from `source` with every address unchecked.
    pub fn new(source: ProxySource) -> Result<Self, CrawlError> {
        let addresses = Self::load_from(&source)?;
        info!("Loaded {} proxies from {}", addresses.len(), source);

        let mut state = PoolState::default();
        state.reset(addresses);

        Ok(Self { source, state: Mutex::new(state) })
    }

    /// Reads and normalises the proxy list.
    pub fn load_from(source: &ProxySource) -> Result<Vec<ProxyAddress>, CrawlError> {
        let content = source.read()?;

        let mut addresses = Vec::new();
        for line in content.lines() {
            match ProxyAddress::parse_line(line) {
                Some(addr) => addresses.push(addr),
                None if line.trim().is_empty() => {}
                None => debug!("Skipping malformed proxy line: {:?}", line),
            }
        }

        if addresses.is_empty() {
            return Err(CrawlError::Configuration(format!("no usable proxies in {}", source)));
        }

        Ok(addresses)
    }

    fn state(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Picks a proxy uniformly from the unchecked and working ones.
    pub fn pick_random(&self) -> Result<ProxyAddress, ExhaustionError> {
        let state = self.state();
        let available: Vec<&ProxyAddress> = state
            .health
            .iter()
            .filter(|(_, h)| **h != ProxyHealth::NotWorking)
            .map(|(a, _)| a)
            .collect();

        if available.is_empty() {
            return Err(ExhaustionError);
        }

        let idx = rand::rng().random_range(0..available.len());
        Ok(available[idx].clone())
    }

    pub fn mark_working(&self, addr: &ProxyAddress) {
        self.state().set(addr, ProxyHealth::Working);
    }

    pub fn mark_failed(&self, addr: &ProxyAddress) {
        self.state().set(addr, ProxyHealth::NotWorking);
    }

    pub fn mark_untested(&self, addr: &ProxyAddress) {
        self.state().set(addr, ProxyHealth::Unchecked);
    }

    /// Re-reads the source and starts a new epoch with every address unchecked.
    pub fn reload(&self) -> Result<(), CrawlError> {
        let addresses = Self::load_from(&self.source)?;
        let mut state = self.state();
        state.reset(addresses);
        state.epoch += 1;
        info!("Reloaded {} proxies (epoch {})", state.health.len(), state.epoch);
        Ok(())
    }

    /// Health of `addr`, or `None` if the pool does not know it.
    pub fn health(&self, addr: &ProxyAddress) -> Option<ProxyHealth> {
        self.state().health.get(addr).copied()
    }

    pub fn unchecked(&self) -> Vec<ProxyAddress> {
        self.state().with_health(ProxyHealth::Unchecked)
    }

    pub fn working(&self) -> Vec<ProxyAddress> {
        self.state().with_health(ProxyHealth::Working)
    }

    pub fn not_working(&self) -> Vec<ProxyAddress> {
        self.state().with_health(ProxyHealth::NotWorking)
    }

    /// Number of reloads since construction.
    pub fn epoch(&self) -> u64 {
        self.state().epoch
    }

    pub fn len(&self) -> usize {
        self.state().health.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
