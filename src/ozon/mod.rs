//! Ozon catalog walking, seller extraction and the crawl pipeline.

pub mod crawler;
pub mod extractor;
pub mod marketplace;
pub mod models;
pub mod parser;
pub mod walker;

pub use crawler::CrawlOrchestrator;
pub use extractor::SellerExtractor;
pub use marketplace::Marketplace;
pub use models::{ProductRef, SellerRecord, SellerSet};
pub use walker::CatalogWalker;
