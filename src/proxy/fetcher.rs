//! Proxy-rotating GET with reload and backoff escalation.

use crate::error::CrawlError;
use crate::proxy::pool::{ProxyAddress, ProxyPool};
use crate::proxy::transport::{Transport, UpstreamResponse};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Statuses that prove the proxy relayed the request, usable payload or not.
pub const HEALTHY_STATUSES: [u16; 5] = [200, 301, 302, 307, 404];

/// Default number of pool reloads before giving up.
pub const DEFAULT_MAX_ESCALATIONS: u32 = 3;

/// Returns true if `status` classifies the proxy as healthy.
pub fn is_healthy_status(status: u16) -> bool {
    HEALTHY_STATUSES.contains(&status)
}

/// Routes every GET through the shared [`ProxyPool`].
///
/// Failed proxies are marked and replaced. When the pool runs dry it is
/// reloaded and the fetcher sleeps `n/2` backoff units on escalation `n`.
/// Once `max_escalations` reloads are spent, the next exhaustion is terminal.
pub struct ResilientFetcher<T> {
    pool: Arc<ProxyPool>,
    transport: T,
    backoff_unit: Duration,
    max_escalations: u32,
}

impl<T: Transport> ResilientFetcher<T> {
    pub fn new(pool: Arc<ProxyPool>, transport: T) -> Self {
        Self {
            pool,
            transport,
            backoff_unit: Duration::from_secs(60),
            max_escalations: DEFAULT_MAX_ESCALATIONS,
        }
    }

    /// Sets the backoff unit (one minute by default).
    pub fn with_backoff_unit(mut self, unit: Duration) -> Self {
        self.backoff_unit = unit;
        self
    }

    pub fn with_max_escalations(mut self, max: u32) -> Self {
        self.max_escalations = max;
        self
    }

    pub fn pool(&self) -> &Arc<ProxyPool> {
        &self.pool
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Fetches `url`, starting with `proxy` if given.
    ///
    /// Any allow-listed status is returned as-is; the caller decides whether
    /// the payload is usable.
    pub async fn fetch(
        &self,
        url: &str,
        proxy: Option<ProxyAddress>,
    ) -> Result<UpstreamResponse, CrawlError> {
        let mut escalations = 0;
        let mut proxy = match proxy {
            Some(proxy) => proxy,
            None => self.next_proxy(&mut escalations).await?,
        };

        loop {
            match self.transport.get(url, &proxy).await {
                Ok(response) if is_healthy_status(response.status) => {
                    debug!("{} via {} -> {}", url, proxy, response.status);
                    self.pool.mark_working(&proxy);
                    return Ok(response);
                }
                Ok(response) => {
                    warn!("Proxy {} got status {} for {}", proxy, response.status, url);
                    self.pool.mark_failed(&proxy);
                }
                Err(e) => {
                    warn!("Proxy {} failed for {}: {}", proxy, url, e);
                    self.pool.mark_failed(&proxy);
                }
            }

            proxy = self.next_proxy(&mut escalations).await?;
        }
    }

    async fn next_proxy(&self, escalations: &mut u32) -> Result<ProxyAddress, CrawlError> {
        if let Ok(proxy) = self.pool.pick_random() {
            return Ok(proxy);
        }

        if *escalations >= self.max_escalations {
            error!("Proxy pool exhausted after {} reloads", *escalations);
            return Err(CrawlError::ProxyExhaustion { escalations: *escalations });
        }
        *escalations += 1;

        self.pool.reload()?;
        let proxy = self.pool.pick_random().map_err(|_| {
            CrawlError::Configuration("proxy list is empty after reload".to_string())
        })?;

        let delay = self.backoff_unit.mul_f64(f64::from(*escalations) / 2.0);
        warn!(
            "No proxies available, reloaded pool (escalation {}/{}), sleeping {:?}",
            *escalations, self.max_escalations, delay
        );
        tokio::time::sleep(delay).await;

        Ok(proxy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::pool::{ProxyHealth, ProxySource};
    use crate::proxy::transport::scripted::ScriptedTransport;
    use std::time::Instant;

    fn make_fetcher(
        proxies: &str,
        transport: ScriptedTransport,
    ) -> ResilientFetcher<ScriptedTransport> {
        let pool = Arc::new(ProxyPool::new(ProxySource::Text(proxies.to_string())).unwrap());
        ResilientFetcher::new(pool, transport).with_backoff_unit(Duration::ZERO)
    }

    fn addr(s: &str) -> ProxyAddress {
        ProxyAddress::new(s)
    }

    #[test]
    fn test_healthy_statuses() {
        for status in [200, 301, 302, 307, 404] {
            assert!(is_healthy_status(status), "{} should be healthy", status);
        }
        for status in [201, 304, 403, 429, 500, 502, 503] {
            assert!(!is_healthy_status(status), "{} should be unhealthy", status);
        }
    }

    #[tokio::test]
    async fn test_fetch_success_marks_working() {
        let transport = ScriptedTransport::new().route("/page", 200, "ok");
        let fetcher = make_fetcher("a:1", transport);

        let response = fetcher.fetch("http://m.test/page", None).await.unwrap();
        assert_eq!(response, UpstreamResponse::new(200, "ok"));
        assert_eq!(fetcher.pool().health(&addr("a:1")), Some(ProxyHealth::Working));
    }

    #[tokio::test]
    async fn test_fetch_returns_allow_listed_non_200() {
        let transport = ScriptedTransport::new().route("/missing", 404, "");
        let fetcher = make_fetcher("a:1\nb:2", transport);

        let response = fetcher.fetch("http://m.test/missing", None).await.unwrap();
        assert_eq!(response.status, 404);
        assert_eq!(fetcher.transport().calls().len(), 1);
        assert!(fetcher.pool().not_working().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_rotates_to_second_proxy() {
        let transport =
            ScriptedTransport::new().proxy_status("a:1", 500).route("/page", 200, "payload");
        let fetcher = make_fetcher("a:1\nb:2", transport);

        let response = fetcher.fetch("http://m.test/page", Some(addr("a:1"))).await.unwrap();

        assert_eq!(response.body, "payload");
        assert_eq!(fetcher.pool().not_working(), vec![addr("a:1")]);
        assert_eq!(fetcher.pool().working(), vec![addr("b:2")]);
        let proxies: Vec<String> =
            fetcher.transport().calls().into_iter().map(|(_, p)| p).collect();
        assert_eq!(proxies, vec!["a:1", "b:2"]);
    }

    #[tokio::test]
    async fn test_fetch_rotates_past_transport_errors() {
        let transport = ScriptedTransport::new()
            .dead_proxy("a:1")
            .dead_proxy("b:2")
            .route("/page", 200, "payload");
        let fetcher = make_fetcher("a:1\nb:2\nc:3", transport);

        let response = fetcher.fetch("http://m.test/page", None).await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(fetcher.pool().working(), vec![addr("c:3")]);
        assert_eq!(fetcher.pool().epoch(), 0);
    }

    #[tokio::test]
    async fn test_fetch_gives_up_after_three_escalations() {
        let transport =
            ScriptedTransport::new().proxy_status("a:1", 500).proxy_status("b:2", 500);
        let fetcher = make_fetcher("a:1\nb:2", transport);

        let err = fetcher.fetch("http://m.test/page", None).await.unwrap_err();

        assert!(matches!(err, CrawlError::ProxyExhaustion { escalations: 3 }));
        assert_eq!(fetcher.pool().epoch(), 3);
        // one pass over both proxies in the initial epoch and each reloaded one
        assert_eq!(fetcher.transport().calls().len(), 8);
    }

    #[tokio::test]
    async fn test_fetch_respects_custom_escalation_limit() {
        let transport = ScriptedTransport::new().dead_proxy("a:1");
        let fetcher = make_fetcher("a:1", transport).with_max_escalations(1);

        let err = fetcher.fetch("http://m.test/page", None).await.unwrap_err();

        assert!(matches!(err, CrawlError::ProxyExhaustion { escalations: 1 }));
        assert_eq!(fetcher.pool().epoch(), 1);
        assert_eq!(fetcher.transport().calls().len(), 2);
    }

    #[tokio::test]
    async fn test_fetch_recovers_after_reload() {
        let transport = ScriptedTransport::new().route("/page", 200, "ok");
        let fetcher = make_fetcher("a:1", transport);
        fetcher.pool().mark_failed(&addr("a:1"));

        let response = fetcher.fetch("http://m.test/page", None).await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(fetcher.pool().epoch(), 1);
        assert_eq!(fetcher.pool().working(), vec![addr("a:1")]);
    }

    #[tokio::test]
    async fn test_backoff_grows_per_escalation() {
        let transport = ScriptedTransport::new().dead_proxy("a:1");
        let fetcher = make_fetcher("a:1", transport).with_backoff_unit(Duration::from_millis(40));

        let started = Instant::now();
        let result = fetcher.fetch("http://m.test/page", None).await;

        assert!(result.is_err());
        // 0.5 + 1.0 + 1.5 units
        assert!(started.elapsed() >= Duration::from_millis(120));
    }
}
