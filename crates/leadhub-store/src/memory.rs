//! In-memory hierarchical document store.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use leadhub_core::error::AppError;
use leadhub_core::result::AppResult;
use leadhub_core::traits::store::{OrderBy, RangeQuery, RecordStore};

/// In-memory implementation of [`RecordStore`].
///
/// The whole store is one JSON object tree behind an async `RwLock`.
/// Multi-path updates take the write guard once, which makes them atomic
/// with respect to every other operation.
#[derive(Debug)]
pub struct MemoryStore {
    /// Root of the document tree. Always a JSON object.
    tree: RwLock<Value>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            tree: RwLock::new(Value::Object(Map::new())),
        }
    }

    /// Split a path into its non-empty segments.
    fn segments(path: &str) -> Vec<&str> {
        path.split('/').filter(|s| !s.is_empty()).collect()
    }

    /// Walk the tree to the node at `path`.
    fn walk<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
        let mut node = root;
        for segment in Self::segments(path) {
            node = node.as_object()?.get(segment)?;
        }
        Some(node)
    }

    /// Write `value` at `path` inside `root`, creating intermediate
    /// objects as needed. A null value deletes the node.
    ///
    /// Intermediate non-object nodes are overwritten by objects, matching
    /// document-store set semantics.
    fn apply(root: &mut Value, path: &str, value: Value) {
        let segments = Self::segments(path);
        let Some((last, parents)) = segments.split_last() else {
            return;
        };

        let mut node = root;
        for segment in parents {
            node = Self::as_map(node)
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
        }

        let map = Self::as_map(node);
        if value.is_null() {
            map.remove(*last);
        } else {
            map.insert((*last).to_string(), value);
        }
    }

    /// View `node` as an object map, replacing any non-object value.
    fn as_map(node: &mut Value) -> &mut Map<String, Value> {
        if !node.is_object() {
            *node = Value::Object(Map::new());
        }
        match node {
            Value::Object(map) => map,
            _ => unreachable!("node coerced to an object above"),
        }
    }

    /// Reject paths without a single usable segment.
    fn validate(path: &str) -> AppResult<()> {
        if Self::segments(path).is_empty() {
            return Err(AppError::validation(format!("Invalid store path: '{path}'")));
        }
        Ok(())
    }

    /// The ordering key of one child under a range scan.
    fn order_key(order_by: &OrderBy, key: &str, value: &Value) -> String {
        match order_by {
            OrderBy::Key => key.to_string(),
            OrderBy::Child(field) => match value.get(field) {
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
                None => String::new(),
            },
        }
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn get(&self, path: &str) -> AppResult<Option<Value>> {
        let tree = self.tree.read().await;
        Ok(Self::walk(&tree, path).cloned())
    }

    async fn set(&self, path: &str, value: Value) -> AppResult<()> {
        Self::validate(path)?;
        let mut tree = self.tree.write().await;
        Self::apply(&mut tree, path, value);
        Ok(())
    }

    async fn update(&self, updates: HashMap<String, Value>) -> AppResult<()> {
        // Validate every path before touching the tree so a bad pair
        // cannot leave a partial update behind.
        for path in updates.keys() {
            Self::validate(path)?;
        }

        let count = updates.len();
        let mut tree = self.tree.write().await;
        for (path, value) in updates {
            Self::apply(&mut tree, &path, value);
        }
        debug!(count, "Applied multi-path update");
        Ok(())
    }

    fn generate_key(&self, _path: &str) -> String {
        // Millisecond prefix keeps generated keys in chronological order
        // under lexicographic sort; the UUID suffix makes them
        // collision-resistant.
        let millis = Utc::now().timestamp_millis();
        format!("{millis:013}-{}", Uuid::new_v4().simple())
    }

    async fn query_range(&self, path: &str, query: RangeQuery) -> AppResult<Vec<(String, Value)>> {
        let tree = self.tree.read().await;
        let Some(node) = Self::walk(&tree, path) else {
            return Ok(Vec::new());
        };
        let Some(map) = node.as_object() else {
            return Ok(Vec::new());
        };

        let mut children: Vec<(String, Value)> =
            map.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        children.sort_by(|a, b| {
            Self::order_key(&query.order_by, &a.0, &a.1)
                .cmp(&Self::order_key(&query.order_by, &b.0, &b.1))
        });

        if let Some(start) = &query.start_at {
            children.retain(|(k, v)| Self::order_key(&query.order_by, k, v).as_str() >= start.as_str());
        }
        if let Some(end) = &query.end_at {
            children.retain(|(k, v)| Self::order_key(&query.order_by, k, v).as_str() <= end.as_str());
        }
        if let Some(n) = query.limit_to_first {
            children.truncate(n);
        }
        if let Some(n) = query.limit_to_last {
            if children.len() > n {
                children.drain(..children.len() - n);
            }
        }

        Ok(children)
    }
}
