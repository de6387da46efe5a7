//! ozon-sellers - Proxy-rotating crawler for Ozon seller disclosures
//!
//! Walks a category listing through a pool of unreliable proxies, pulls the
//! seller block of every product and returns one record per seller.

pub mod commands;
pub mod config;
pub mod error;
pub mod format;
pub mod ozon;
pub mod proxy;

pub use config::Config;
pub use error::CrawlError;
pub use ozon::{CrawlOrchestrator, Marketplace, ProductRef, SellerRecord};
pub use proxy::{ProxyAddress, ProxyPool, ProxySource, ResilientFetcher};
