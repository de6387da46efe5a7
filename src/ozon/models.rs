//! Data models for catalog entries and seller records.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A product enumerated from a category listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRef {
    /// Path segment identifying the product (slug ending in the SKU)
    pub id: String,
    /// Display name
    pub name: String,
}

impl ProductRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self { id: id.into(), name: name.into() }
    }
}

/// Seller disclosure attached to a product. Field order is the output column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellerRecord {
    /// Product display name
    pub product_name: String,
    /// Raw seller disclosure string; dedup key
    pub identity: String,
    /// Numeric business registration id
    pub registration_id: String,
    /// Raw fifth disclosure field
    pub ozon_tenure_marker: String,
    /// Public product page
    pub product_url: String,
    /// Seller profile link from the seller widget
    pub seller_profile_url: String,
}

/// Result set keyed by seller identity.
///
/// A later record with an identity already present replaces the earlier one
/// in place, so output order is first-seen identity order.
#[derive(Debug, Default)]
pub struct SellerSet {
    records: Vec<SellerRecord>,
    index: HashMap<String, usize>,
}

impl SellerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `record`, returning the record it replaced.
    pub fn insert(&mut self, record: SellerRecord) -> Option<SellerRecord> {
        match self.index.get(&record.identity) {
            Some(&idx) => Some(std::mem::replace(&mut self.records[idx], record)),
            None => {
                self.index.insert(record.identity.clone(), self.records.len());
                self.records.push(record);
                None
            }
        }
    }

    pub fn get(&self, identity: &str) -> Option<&SellerRecord> {
        self.index.get(identity).map(|&idx| &self.records[idx])
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<SellerRecord> {
        self.records
    }
}

impl FromIterator<SellerRecord> for SellerSet {
    fn from_iter<I: IntoIterator<Item = SellerRecord>>(iter: I) -> Self {
        let mut set = SellerSet::new();
        for record in iter {
            set.insert(record);
        }
        set
    }
}
