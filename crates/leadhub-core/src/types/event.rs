//! Well-known event type strings.
//!
//! Event types are open-ended strings on the wire; these constants cover
//! the kinds the CRM emits itself.

/// A single field edited in place.
pub const FIELD_CHANGED: &str = "field_changed";
/// A record updated through a form submit.
pub const RECORD_UPDATED: &str = "record_updated";
/// A record created.
pub const RECORD_CREATED: &str = "record_created";
/// A record deleted.
pub const RECORD_DELETED: &str = "record_deleted";
/// A record removed as part of a bulk operation.
pub const BULK_DELETE: &str = "bulk_delete";
/// Several records edited in one bulk operation.
pub const BULK_EDIT: &str = "bulk_edit";
