//! Core traits defined in `leadhub-core` and implemented by other crates.

pub mod store;

pub use store::{OrderBy, RangeQuery, RecordStore};
