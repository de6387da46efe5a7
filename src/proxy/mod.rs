//! Outbound proxy pool and the fetch layer built on it.

pub mod fetcher;
pub mod pool;
pub mod transport;

pub use fetcher::ResilientFetcher;
pub use pool::{ProxyAddress, ProxyHealth, ProxyPool, ProxySource};
pub use transport::{HttpTransport, Transport, TransportError, UpstreamResponse};
