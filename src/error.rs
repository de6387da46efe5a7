//! Error taxonomy for the crawl pipeline.
//!
//! Proxy-level failures never show up here: the fetcher absorbs them through
//! rotation, reloads and backoff. What remains are the terminal outcomes a
//! caller has to deal with.

use thiserror::Error;

/// Terminal errors surfaced by the crawl pipeline.
#[derive(Debug, Error)]
pub enum CrawlError {
    /// The proxy source is missing, unreadable or yields no usable address.
    #[error("proxy configuration error: {0}")]
    Configuration(String),

    /// Every proxy failed through all allowed reload escalations.
    #[error("proxy pool exhausted after {escalations} reloads, the proxy list needs updating")]
    ProxyExhaustion { escalations: u32 },

    /// The marketplace answered, but not with 200.
    #[error("marketplace returned status {status} for {url}")]
    Upstream { status: u16, url: String },

    /// The category URL does not belong to the supported marketplace.
    #[error("invalid category url '{url}': {reason}")]
    InvalidInput { url: String, reason: String },

    /// An extraction task panicked or was cancelled.
    #[error("extraction task failed: {0}")]
    TaskFailed(String),
}

impl CrawlError {
    pub(crate) fn invalid_input(url: &str, reason: impl Into<String>) -> Self {
        CrawlError::InvalidInput { url: url.to_string(), reason: reason.into() }
    }
}

/// No `unchecked` or `working` proxy is left in the current epoch.
///
/// Transient: the fetcher answers it with a reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no proxies available")]
pub struct ExhaustionError;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CrawlError::ProxyExhaustion { escalations: 3 };
        assert!(err.to_string().contains("3 reloads"));

        let err = CrawlError::Upstream { status: 403, url: "https://x.test/a".to_string() };
        assert!(err.to_string().contains("403"));
        assert!(err.to_string().contains("https://x.test/a"));

        let err = CrawlError::invalid_input("ftp://nope", "unsupported host");
        assert!(err.to_string().contains("ftp://nope"));
        assert!(err.to_string().contains("unsupported host"));
    }

    #[test]
    fn test_exhaustion_display() {
        assert_eq!(ExhaustionError.to_string(), "no proxies available");
    }
}
