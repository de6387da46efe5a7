//! Category crawl command implementation.

use crate::config::Config;
use crate::format::Formatter;
use crate::ozon::{CrawlOrchestrator, SellerRecord};
use crate::proxy::{HttpTransport, ProxyPool, ResilientFetcher, Transport};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

/// Crawls a category and formats the sellers found.
pub struct CrawlCommand {
    config: Config,
}

impl CrawlCommand {
    /// Creates a new crawl command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Executes the crawl and returns formatted output.
    pub async fn execute(&self, category_url: &str) -> Result<String> {
        let transport = HttpTransport::new(self.config.request_timeout());
        self.execute_with_transport(transport, category_url).await
    }

    /// Executes the crawl over a provided transport (for testing).
    pub async fn execute_with_transport<T: Transport + 'static>(
        &self,
        transport: T,
        category_url: &str,
    ) -> Result<String> {
        let records = self.crawl_with_transport(transport, category_url).await?;

        let formatter = Formatter::new(self.config.format);
        Ok(formatter.format_records(&records))
    }

    /// Runs the crawl and returns the raw records.
    pub async fn crawl_with_transport<T: Transport + 'static>(
        &self,
        transport: T,
        category_url: &str,
    ) -> Result<Vec<SellerRecord>> {
        // Reject bad input before touching the proxy list.
        let marketplace = self.config.marketplace();
        marketplace.category_slug(category_url)?;

        let pool = ProxyPool::new(self.config.proxy_source())
            .context("Failed to load proxy list")?;

        let fetcher = ResilientFetcher::new(Arc::new(pool), transport)
            .with_backoff_unit(self.config.backoff_unit())
            .with_max_escalations(self.config.max_escalations);

        let orchestrator = CrawlOrchestrator::new(Arc::new(fetcher), marketplace)
            .with_max_pages(self.config.page_limit())
            .with_concurrency(self.config.concurrency_limit());

        let records = orchestrator.crawl_category(category_url).await?;
        info!("Crawl finished with {} sellers", records.len());

        Ok(records)
    }
}
