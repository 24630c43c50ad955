pub mod catalogue;
pub mod server_metrics;
pub mod shared;

// Re-export the main types for easy access
use crate::error::CollectionWarning;
pub use catalogue::*;
use chrono::{
    DateTime,
    Utc,
};
use serde::Serialize;
pub use server_metrics::*;
pub use shared::*;
use std::collections::BTreeMap;

/// Stat key → raw value text of one endpoint, as received.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RawStatsBlock(BTreeMap<String, String>);

impl RawStatsBlock {
    pub fn new(stats: BTreeMap<String, String>) -> Self {
        Self(stats)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, String)> for RawStatsBlock {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Display name → metrics, for every server that was resolved, reached and correlated.
pub type CollectionResult = BTreeMap<String, ServerMetrics>;

/// Outcome of one successful collection cycle.
#[derive(Debug, Clone, Serialize)]
pub struct CollectionReport {
    pub cycle: String,
    pub collection_start: DateTime<Utc>,
    pub collection_end: DateTime<Utc>,
    pub result: CollectionResult,
    pub warnings: Vec<CollectionWarning>,
}

impl CollectionReport {
    pub fn new(cycle: String, collection_start: DateTime<Utc>) -> Self {
        Self {
            cycle,
            collection_start,
            collection_end: collection_start,
            result: CollectionResult::new(),
            warnings: Vec::new(),
        }
    }

    pub fn finalize(mut self) -> Self {
        self.collection_end = Utc::now();
        self
    }
}
