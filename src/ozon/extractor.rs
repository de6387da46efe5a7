//! Seller record extraction from product detail payloads.

use crate::error::CrawlError;
use crate::ozon::marketplace::Marketplace;
use crate::ozon::models::{ProductRef, SellerRecord};
use crate::ozon::parser;
use crate::proxy::{ResilientFetcher, Transport};
use std::sync::Arc;
use tracing::{debug, warn};

/// Fetches a product page and turns its seller widget into a [`SellerRecord`].
pub struct SellerExtractor<T> {
    fetcher: Arc<ResilientFetcher<T>>,
    marketplace: Arc<Marketplace>,
}

impl<T> Clone for SellerExtractor<T> {
    fn clone(&self) -> Self {
        Self { fetcher: Arc::clone(&self.fetcher), marketplace: Arc::clone(&self.marketplace) }
    }
}

impl<T: Transport> SellerExtractor<T> {
    pub fn new(fetcher: Arc<ResilientFetcher<T>>, marketplace: Arc<Marketplace>) -> Self {
        Self { fetcher, marketplace }
    }

    /// Returns `Ok(None)` when the product has no usable seller disclosure.
    pub async fn extract(&self, product: &ProductRef) -> Result<Option<SellerRecord>, CrawlError> {
        let url = self.marketplace.product_api_url(&product.id);
        let response = self.fetcher.fetch(&url, None).await?;

        if !response.is_ok() {
            warn!("Server returned {} while parsing product {}", response.status, product.id);
            return Err(CrawlError::Upstream { status: response.status, url });
        }

        let Some(widget) = parser::parse_seller_widget(&response.body) else {
            debug!("No seller widget for product {}", product.id);
            return Ok(None);
        };

        let credentials = parser::parse_credentials(&widget.credentials);
        let Some(registration_id) = credentials.registration_id else {
            debug!("Seller of product {} has no registration id, discarding", product.id);
            return Ok(None);
        };

        Ok(Some(SellerRecord {
            product_name: product.name.clone(),
            identity: credentials.identity,
            registration_id,
            ozon_tenure_marker: credentials.tenure_marker,
            product_url: self.marketplace.product_url(&product.id),
            seller_profile_url: widget.link.unwrap_or_default(),
        }))
    }
}
