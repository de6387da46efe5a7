//! Category crawl: enumerate, extract concurrently, deduplicate.

use crate::error::CrawlError;
use crate::ozon::extractor::SellerExtractor;
use crate::ozon::marketplace::Marketplace;
use crate::ozon::models::{SellerRecord, SellerSet};
use crate::ozon::walker::CatalogWalker;
use crate::proxy::{ResilientFetcher, Transport};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Default page cap of a crawl.
pub const DEFAULT_MAX_PAGES: u32 = 10;

/// Runs a whole category crawl against one shared fetcher.
pub struct CrawlOrchestrator<T> {
    fetcher: Arc<ResilientFetcher<T>>,
    marketplace: Arc<Marketplace>,
    max_pages: Option<u32>,
    concurrency: Option<usize>,
}

impl<T: Transport + 'static> CrawlOrchestrator<T> {
    pub fn new(fetcher: Arc<ResilientFetcher<T>>, marketplace: Marketplace) -> Self {
        Self {
            fetcher,
            marketplace: Arc::new(marketplace),
            max_pages: Some(DEFAULT_MAX_PAGES),
            concurrency: None,
        }
    }

    /// Page cap; `None` walks until an empty page.
    pub fn with_max_pages(mut self, max_pages: Option<u32>) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Caps in-flight extractions; `None` leaves them unbounded.
    pub fn with_concurrency(mut self, concurrency: Option<usize>) -> Self {
        self.concurrency = concurrency.filter(|n| *n > 0);
        self
    }

    /// Crawls `category_url` and returns one record per seller identity.
    ///
    /// Extractions are launched as products are enumerated and awaited in
    /// launch order once the walk ends. When two products share a seller
    /// identity, the one enumerated later wins.
    pub async fn crawl_category(
        &self,
        category_url: &str,
    ) -> Result<Vec<SellerRecord>, CrawlError> {
        let mut walker =
            CatalogWalker::walk(&*self.fetcher, &*self.marketplace, category_url, self.max_pages)?;
        info!("Crawling category {}", category_url);

        let extractor =
            SellerExtractor::new(Arc::clone(&self.fetcher), Arc::clone(&self.marketplace));
        let limiter = self.concurrency.map(|n| Arc::new(Semaphore::new(n)));
        let mut tasks: Vec<JoinHandle<Result<Option<SellerRecord>, CrawlError>>> = Vec::new();

        loop {
            let product = match walker.next().await {
                Ok(Some(product)) => product,
                Ok(None) => break,
                Err(e) => {
                    abort_all(&tasks);
                    return Err(e);
                }
            };

            let extractor = extractor.clone();
            let limiter = limiter.clone();
            tasks.push(tokio::spawn(async move {
                let _permit = match &limiter {
                    Some(sem) => sem.acquire().await.ok(),
                    None => None,
                };
                extractor.extract(&product).await
            }));
        }

        debug!("Enumerated {} products, awaiting extraction", tasks.len());
        let total = tasks.len();

        let mut sellers = SellerSet::new();
        let mut pending = tasks.into_iter();
        while let Some(task) = pending.next() {
            let outcome = match task.await {
                Ok(outcome) => outcome,
                Err(e) => Err(CrawlError::TaskFailed(e.to_string())),
            };

            match outcome {
                Ok(Some(record)) => {
                    if let Some(previous) = sellers.insert(record) {
                        debug!("Replacing earlier record for seller {:?}", previous.identity);
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    warn!("Aborting crawl: {}", e);
                    for task in pending {
                        task.abort();
                    }
                    return Err(e);
                }
            }
        }

        info!("Collected {} unique sellers from {} products", sellers.len(), total);
        Ok(sellers.into_records())
    }
}

fn abort_all<R>(tasks: &[JoinHandle<R>]) {
    for task in tasks {
        task.abort();
    }
}
