//! Configuration for the synchronization engine.

use chrono::{DateTime, TimeZone, Utc};
use remstore_query::OrderBy;

/// Configuration for repository operations.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Ordering applied to bulk selects when the caller gives none.
    pub default_order: Vec<OrderBy>,
    /// Modification time assigned to a local record created as a merge
    /// target for a remote document. Far enough in the past that any real
    /// remote timestamp is newer.
    pub ancient_timestamp: DateTime<Utc>,
}

impl EngineConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self {
            default_order: vec![OrderBy::asc("modified_at")],
            ancient_timestamp: Utc.with_ymd_and_hms(1900, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    /// Sets the fallback ordering for bulk selects.
    pub fn with_default_order(mut self, order: Vec<OrderBy>) -> Self {
        self.default_order = order;
        self
    }

    /// Sets the merge-target placeholder timestamp.
    pub fn with_ancient_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.ancient_timestamp = timestamp;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}
