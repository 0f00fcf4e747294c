//! Newtype wrappers around `String` for all domain identifiers.
//!
//! The record store keys everything by opaque string identifiers (record
//! keys, store-generated log keys, user ids from the auth system). Using
//! distinct types prevents accidentally passing a `UserId` where a
//! `RecordId` is expected.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Macro to define a newtype ID wrapper around `String`.
macro_rules! define_string_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Create an identifier from any string-like value.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Return the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the identifier and return the inner string.
            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_string_id!(
    /// Identifier of a business record (a sale/lead).
    RecordId
);

define_string_id!(
    /// Identifier of the user performing a change.
    UserId
);

define_string_id!(
    /// Store-generated key identifying one persisted log entry.
    ///
    /// Write retries reuse the same `LogId`, which makes them idempotent:
    /// the same key is overwritten, never duplicated.
    LogId
);
