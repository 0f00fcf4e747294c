//! Record-store trait for pluggable hierarchical document stores.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use serde_json::Value;

use crate::result::AppResult;

/// Ordering dimension for a range scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderBy {
    /// Order children by their key.
    Key,
    /// Order children by the value of the named child field.
    Child(String),
}

/// Parameters for an ordered range scan over the children of a path.
///
/// Bounds are inclusive and apply to the ordering dimension. `limit_to_last`
/// keeps the last N children in order (the most recent N when keys are
/// chronological), `limit_to_first` the first N.
#[derive(Debug, Clone)]
pub struct RangeQuery {
    /// Ordering dimension for the scan.
    pub order_by: OrderBy,
    /// Inclusive lower bound on the ordering dimension.
    pub start_at: Option<String>,
    /// Inclusive upper bound on the ordering dimension.
    pub end_at: Option<String>,
    /// Keep only the first N children.
    pub limit_to_first: Option<usize>,
    /// Keep only the last N children.
    pub limit_to_last: Option<usize>,
}

impl RangeQuery {
    /// A scan ordered by child key with no bounds or limits.
    pub fn by_key() -> Self {
        Self {
            order_by: OrderBy::Key,
            start_at: None,
            end_at: None,
            limit_to_first: None,
            limit_to_last: None,
        }
    }

    /// A scan ordered by the value of the named child field.
    pub fn by_child(field: impl Into<String>) -> Self {
        Self {
            order_by: OrderBy::Child(field.into()),
            ..Self::by_key()
        }
    }

    /// Set the inclusive lower bound.
    pub fn start_at(mut self, value: impl Into<String>) -> Self {
        self.start_at = Some(value.into());
        self
    }

    /// Set the inclusive upper bound.
    pub fn end_at(mut self, value: impl Into<String>) -> Self {
        self.end_at = Some(value.into());
        self
    }

    /// Keep only the first `n` children.
    pub fn limit_to_first(mut self, n: usize) -> Self {
        self.limit_to_first = Some(n);
        self
    }

    /// Keep only the last `n` children.
    pub fn limit_to_last(mut self, n: usize) -> Self {
        self.limit_to_last = Some(n);
        self
    }
}

/// Trait for hierarchical document stores.
///
/// Paths are `/`-delimited from an implicit root. The [`RecordStore`]
/// trait is defined here in `leadhub-core` and implemented in
/// `leadhub-store`; any store with these semantics satisfies the engine.
#[async_trait]
pub trait RecordStore: Send + Sync + fmt::Debug + 'static {
    /// Point read of the value (or whole subtree) at `path`.
    async fn get(&self, path: &str) -> AppResult<Option<Value>>;

    /// Write `value` at `path`, replacing whatever is there. Writing a
    /// JSON null deletes the node.
    async fn set(&self, path: &str, value: Value) -> AppResult<()>;

    /// Apply every path/value pair in one atomic update.
    ///
    /// Atomicity across all paths is a hard requirement: the index
    /// consistency of the audit engine is built on it. Either every pair
    /// is durably applied or none is.
    async fn update(&self, updates: HashMap<String, Value>) -> AppResult<()>;

    /// Generate a collision-resistant child key for `path`.
    ///
    /// Keys generated later must sort lexicographically after keys
    /// generated earlier, so that key order is chronological order.
    fn generate_key(&self, path: &str) -> String;

    /// Ordered range scan over the children of `path`.
    ///
    /// Returns `(key, value)` pairs in scan order. A missing path yields
    /// an empty list.
    async fn query_range(&self, path: &str, query: RangeQuery) -> AppResult<Vec<(String, Value)>>;
}
