//! # leadhub-core
//!
//! Core crate for the LeadHub audit engine. Contains the record-store
//! trait, configuration schemas, typed identifiers, the persisted log
//! entry shapes, and the unified error system.
//!
//! This crate has **no** internal dependencies on other LeadHub crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
