//! Marketplace endpoints and category URL validation.

use crate::error::CrawlError;
use url::Url;

pub const DEFAULT_SITE_URL: &str = "https://www.ozon.ru";
pub const DEFAULT_API_PATH: &str = "/api/entrypoint-api.bx/page/json/v2?url=/";

/// Widget key prefix of the paginated search results.
pub const LISTING_WIDGET_PREFIX: &str = "searchResultsV2";
/// Widget key prefix of the current seller block on a product page.
pub const SELLER_WIDGET_PREFIX: &str = "webCurrentSeller";

/// Site and page-JSON API locations of the marketplace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marketplace {
    site_url: String,
    api_url: String,
}

impl Marketplace {
    /// Uses the default API path under `site_url`.
    pub fn new(site_url: &str) -> Self {
        Self::with_api_path(site_url, DEFAULT_API_PATH)
    }

    pub fn with_api_path(site_url: &str, api_path: &str) -> Self {
        let site_url = site_url.trim_end_matches('/').to_string();
        let api_url = format!("{}{}", site_url, api_path);
        Self { site_url, api_url }
    }

    pub fn site_url(&self) -> &str {
        &self.site_url
    }

    /// Extracts the category slug from `https://<host>/category/<slug>/...`.
    pub fn category_slug(&self, category_url: &str) -> Result<String, CrawlError> {
        let url = Url::parse(category_url.trim())
            .map_err(|e| CrawlError::invalid_input(category_url, format!("not a url ({})", e)))?;
        let site = Url::parse(&self.site_url)
            .map_err(|e| CrawlError::invalid_input(category_url, format!("bad site url ({})", e)))?;

        if url.scheme() != site.scheme()
            || url.host_str() != site.host_str()
            || url.port_or_known_default() != site.port_or_known_default()
        {
            return Err(CrawlError::invalid_input(
                category_url,
                format!("not a {} url", self.site_url),
            ));
        }

        let mut segments = url.path_segments().into_iter().flatten();
        if segments.next() != Some("category") {
            return Err(CrawlError::invalid_input(category_url, "not a category"));
        }

        match segments.next() {
            Some(slug) if !slug.is_empty() => Ok(slug.to_string()),
            _ => Err(CrawlError::invalid_input(category_url, "missing category slug")),
        }
    }

    /// API URL of listing page `page` (1-based).
    pub fn listing_url(&self, slug: &str, page: u32) -> String {
        format!(
            "{}category/{}/?layout_container=categorySearchMegapagination&layout_page_index={}&page={}",
            self.api_url, slug, page, page
        )
    }

    /// API URL of the product detail payload holding the seller widget.
    pub fn product_api_url(&self, product_id: &str) -> String {
        format!(
            "{}product/{}/?layout_container=pdpPage2column&layout_page_index=2",
            self.api_url, product_id
        )
    }

    /// Public product page.
    pub fn product_url(&self, product_id: &str) -> String {
        format!("{}/product/{}/", self.site_url, product_id)
    }
}

impl Default for Marketplace {
    fn default() -> Self {
        Self::new(DEFAULT_SITE_URL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_marketplace() -> Marketplace {
        Marketplace::new("https://example-marketplace.test/")
    }

    #[test]
    fn test_category_slug() {
        let m = test_marketplace();
        assert_eq!(m.category_slug("https://example-marketplace.test/category/shoes/").unwrap(), "shoes");
        assert_eq!(
            m.category_slug("https://example-marketplace.test/category/smartfony-15502/?sorting=price")
                .unwrap(),
            "smartfony-15502"
        );
        assert_eq!(m.category_slug("https://example-marketplace.test/category/shoes").unwrap(), "shoes");
    }

    #[test]
    fn test_category_slug_default_site() {
        let m = Marketplace::default();
        assert_eq!(
            m.category_slug("https://www.ozon.ru/category/noutbuki-15692/").unwrap(),
            "noutbuki-15692"
        );
    }

    #[test]
    fn test_category_slug_rejects_other_host() {
        let m = test_marketplace();
        let err = m.category_slug("https://other.test/category/shoes/").unwrap_err();
        assert!(matches!(err, CrawlError::InvalidInput { .. }));
        assert!(m.category_slug("http://example-marketplace.test/category/shoes/").is_err());
    }

    #[test]
    fn test_category_slug_rejects_non_category() {
        let m = test_marketplace();
        assert!(m.category_slug("https://example-marketplace.test/product/123/").is_err());
        assert!(m.category_slug("https://example-marketplace.test/category/").is_err());
        assert!(m.category_slug("https://example-marketplace.test/").is_err());
        assert!(m.category_slug("not a url").is_err());
        assert!(m.category_slug("").is_err());
    }

    #[test]
    fn test_listing_url() {
        let m = test_marketplace();
        assert_eq!(
            m.listing_url("shoes", 3),
            "https://example-marketplace.test/api/entrypoint-api.bx/page/json/v2?url=/category/shoes/?layout_container=categorySearchMegapagination&layout_page_index=3&page=3"
        );
    }

    #[test]
    fn test_product_urls() {
        let m = test_marketplace();
        assert_eq!(m.product_url("123"), "https://example-marketplace.test/product/123/");
        assert_eq!(
            m.product_api_url("kedy-123"),
            "https://example-marketplace.test/api/entrypoint-api.bx/page/json/v2?url=/product/kedy-123/?layout_container=pdpPage2column&layout_page_index=2"
        );
    }

    #[test]
    fn test_custom_api_path() {
        let m = Marketplace::with_api_path("http://127.0.0.1:8080", "/json?url=/");
        assert_eq!(m.product_api_url("1"), "http://127.0.0.1:8080/json?url=/product/1/?layout_container=pdpPage2column&layout_page_index=2");
    }
}
