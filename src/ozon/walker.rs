//! Sequential, pull-driven walk over a category listing.

use crate::error::CrawlError;
use crate::ozon::marketplace::Marketplace;
use crate::ozon::models::ProductRef;
use crate::ozon::parser;
use crate::proxy::{ResilientFetcher, Transport};
use std::collections::VecDeque;
use tracing::{debug, info};

/// Lazily enumerates the products of one category.
///
/// Pages are fetched one at a time, only when the items of the previous page
/// have all been pulled. The walk ends on the first page without items or
/// after `max_pages` pages.
pub struct CatalogWalker<'a, T> {
    fetcher: &'a ResilientFetcher<T>,
    marketplace: &'a Marketplace,
    slug: String,
    max_pages: Option<u32>,
    page: u32,
    buffer: VecDeque<ProductRef>,
    done: bool,
}

impl<'a, T: Transport> CatalogWalker<'a, T> {
    /// Starts a walk over the category at `category_url`.
    pub fn walk(
        fetcher: &'a ResilientFetcher<T>,
        marketplace: &'a Marketplace,
        category_url: &str,
        max_pages: Option<u32>,
    ) -> Result<Self, CrawlError> {
        let slug = marketplace.category_slug(category_url)?;
        Ok(Self::for_slug(fetcher, marketplace, slug, max_pages))
    }

    pub fn for_slug(
        fetcher: &'a ResilientFetcher<T>,
        marketplace: &'a Marketplace,
        slug: impl Into<String>,
        max_pages: Option<u32>,
    ) -> Self {
        Self {
            fetcher,
            marketplace,
            slug: slug.into(),
            max_pages,
            page: 1,
            buffer: VecDeque::new(),
            done: false,
        }
    }

    /// Number of the next page to fetch.
    pub fn next_page_number(&self) -> u32 {
        self.page
    }

    /// Pulls the next product, fetching a page when the buffer runs dry.
    pub async fn next(&mut self) -> Result<Option<ProductRef>, CrawlError> {
        loop {
            if let Some(product) = self.buffer.pop_front() {
                return Ok(Some(product));
            }
            if self.done {
                return Ok(None);
            }
            self.fetch_page().await?;
        }
    }

    /// Drains the whole walk.
    pub async fn collect(mut self) -> Result<Vec<ProductRef>, CrawlError> {
        let mut products = Vec::new();
        while let Some(product) = self.next().await? {
            products.push(product);
        }
        Ok(products)
    }

    async fn fetch_page(&mut self) -> Result<(), CrawlError> {
        let url = self.marketplace.listing_url(&self.slug, self.page);
        let response = self.fetcher.fetch(&url, None).await?;

        if !response.is_ok() {
            return Err(CrawlError::Upstream { status: response.status, url });
        }

        let listing = parser::parse_listing(&response.body);
        info!(
            "Category {} page {} gave {} products",
            self.slug,
            self.page,
            listing.products.len()
        );

        if listing.is_empty() {
            debug!("No items on page {}, stopping", self.page);
            self.done = true;
            return Ok(());
        }

        self.buffer.extend(listing.products);
        self.page += 1;

        if let Some(max) = self.max_pages {
            if self.page > max {
                debug!("Reached page limit {}", max);
                self.done = true;
            }
        }

        Ok(())
    }
}
