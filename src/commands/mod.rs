//! CLI command implementations.

pub mod crawl;
pub mod proxies;

pub use crawl::CrawlCommand;
pub use proxies::ProxiesCommand;
