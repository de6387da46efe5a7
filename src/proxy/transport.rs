//! Single proxied GET, using wreq for TLS fingerprint emulation.

use crate::proxy::pool::ProxyAddress;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use wreq::Client;
use wreq_util::Emulation;

/// Status and body of an upstream response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: String,
}

impl UpstreamResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self { status, body: body.into() }
    }

    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Connection-level failure: timeout, refused connection, TLS, bad proxy.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

impl From<wreq::Error> for TransportError {
    fn from(e: wreq::Error) -> Self {
        TransportError(e.to_string())
    }
}

/// Issues one GET through a given proxy - enables mocking for tests.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(
        &self,
        url: &str,
        proxy: &ProxyAddress,
    ) -> Result<UpstreamResponse, TransportError>;
}

/// wreq-backed transport with one client per proxy.
pub struct HttpTransport {
    timeout: Duration,
    clients: Mutex<HashMap<ProxyAddress, Client>>,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout, clients: Mutex::new(HashMap::new()) }
    }

    fn client_for(&self, proxy: &ProxyAddress) -> Result<Client, TransportError> {
        let mut clients = self.clients.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(client) = clients.get(proxy) {
            return Ok(client.clone());
        }

        debug!("Building client for proxy {}", proxy);
        let client = Client::builder()
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .timeout(self.timeout)
            .connect_timeout(Duration::from_secs(10))
            .proxy(wreq::Proxy::all(proxy.url())?)
            .build()?;

        clients.insert(proxy.clone(), client.clone());
        Ok(client)
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(
        &self,
        url: &str,
        proxy: &ProxyAddress,
    ) -> Result<UpstreamResponse, TransportError> {
        let client = self.client_for(proxy)?;

        debug!("GET {} via {}", url, proxy);

        let response = client
            .get(url)
            .emulation(Emulation::Chrome131)
            .header("Accept", "application/json, text/plain, */*")
            .header("Accept-Language", "ru-RU,ru;q=0.9,en-US;q=0.8,en;q=0.7")
            .header("Cache-Control", "no-cache")
            .header("Pragma", "no-cache")
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(UpstreamResponse { status, body })
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn proxy_for(server: &MockServer) -> ProxyAddress {
        ProxyAddress::new(server.address().to_string())
    }

    #[test]
    fn test_upstream_response_is_ok() {
        assert!(UpstreamResponse::new(200, "{}").is_ok());
        assert!(!UpstreamResponse::new(404, "").is_ok());
        assert!(!UpstreamResponse::new(301, "").is_ok());
    }

    #[tokio::test]
    async fn test_get_through_proxy() {
        // The mock server plays the HTTP proxy: plain-http targets are
        // forwarded to it in absolute form.
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/page"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"widgetStates":{}}"#))
            .mount(&mock_server)
            .await;

        let transport = HttpTransport::new(Duration::from_secs(5));
        let response = transport
            .get("http://marketplace.test/api/page", &proxy_for(&mock_server))
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert!(response.body.contains("widgetStates"));
    }

    #[tokio::test]
    async fn test_non_success_status_is_returned() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let transport = HttpTransport::new(Duration::from_secs(5));
        let response =
            transport.get("http://marketplace.test/x", &proxy_for(&mock_server)).await.unwrap();

        assert_eq!(response.status, 500);
    }

    #[tokio::test]
    async fn test_unreachable_proxy_is_transport_error() {
        // Bind and drop to get a port nobody listens on.
        let port = std::net::TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();

        let transport = HttpTransport::new(Duration::from_secs(5));
        let result = transport
            .get("http://marketplace.test/x", &ProxyAddress::new(format!("127.0.0.1:{}", port)))
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_client_is_cached_per_proxy() {
        let transport = HttpTransport::default();
        let proxy = ProxyAddress::new("127.0.0.1:9");

        transport.client_for(&proxy).unwrap();
        transport.client_for(&proxy).unwrap();
        transport.client_for(&ProxyAddress::new("127.0.0.1:10")).unwrap();

        assert_eq!(transport.clients.lock().unwrap().len(), 2);
    }
}
