//! Identity of the user performing a change.

use serde::{Deserialize, Serialize};

use crate::types::id::UserId;

/// The authenticated user attributed to a change.
///
/// Callers pass this explicitly with each logging call; the engine never
/// probes ambient session state for it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserContext {
    /// Stable user identifier from the auth system.
    pub user_id: Option<UserId>,
    /// The user's email address.
    pub email: Option<String>,
    /// The user's display name.
    pub username: Option<String>,
}

impl UserContext {
    /// Build a context with all three identity fields set.
    pub fn new(
        user_id: impl Into<UserId>,
        email: impl Into<String>,
        username: impl Into<String>,
    ) -> Self {
        Self {
            user_id: Some(user_id.into()),
            email: Some(email.into()),
            username: Some(username.into()),
        }
    }

    /// An anonymous context with no identity information.
    pub fn anonymous() -> Self {
        Self::default()
    }
}
