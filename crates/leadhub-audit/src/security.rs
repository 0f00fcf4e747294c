//! Security event logging.
//!
//! Security events are fire-and-forget: each one is written directly to
//! its date partition under `security/`, outside the batch pipeline.
//! Failures are logged and swallowed so that security logging can never
//! break authentication flows.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::warn;

use leadhub_core::result::AppResult;
use leadhub_core::traits::store::RangeQuery;
use leadhub_core::types::{Severity, UserContext, UserId};

use crate::logger::{AuditLogger, Components};
use crate::paths;

/// Kinds of security events the CRM records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecurityEventKind {
    /// A user signed in.
    LoginSuccess,
    /// A sign-in attempt failed.
    LoginFailed,
    /// An account was locked after repeated failures.
    LoginLocked,
    /// A user signed out.
    Logout,
    /// Repeated failures crossed the brute-force threshold.
    BruteForceDetected,
    /// A route was accessed without permission.
    UnauthorizedAccess,
    /// A user changed their password.
    PasswordChange,
    /// An account was created.
    AccountCreated,
    /// An account was deleted.
    AccountDeleted,
    /// A user's role changed.
    RoleChanged,
    /// A session expired.
    SessionExpired,
}

impl SecurityEventKind {
    /// The event type string persisted on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LoginSuccess => "login_success",
            Self::LoginFailed => "login_failed",
            Self::LoginLocked => "login_locked",
            Self::Logout => "logout",
            Self::BruteForceDetected => "brute_force_detected",
            Self::UnauthorizedAccess => "unauthorized_access",
            Self::PasswordChange => "password_change",
            Self::AccountCreated => "account_created",
            Self::AccountDeleted => "account_deleted",
            Self::RoleChanged => "role_changed",
            Self::SessionExpired => "session_expired",
        }
    }

    /// The severity this event is recorded at unless overridden.
    pub fn default_severity(&self) -> Severity {
        match self {
            Self::LoginLocked | Self::BruteForceDetected => Severity::Critical,
            Self::UnauthorizedAccess | Self::AccountDeleted | Self::RoleChanged => {
                Severity::Warning
            }
            Self::LoginSuccess
            | Self::LoginFailed
            | Self::Logout
            | Self::PasswordChange
            | Self::AccountCreated
            | Self::SessionExpired => Severity::Info,
        }
    }
}

impl fmt::Display for SecurityEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One persisted security event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityEvent {
    /// Kind of event, as its wire string.
    pub event_type: String,
    /// Severity of the event.
    pub severity: Severity,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// The user concerned, if known.
    pub user_id: Option<UserId>,
    /// The user's email, if known.
    pub user_email: Option<String>,
    /// The user's display name, if known.
    pub username: Option<String>,
    /// Client IP address, if supplied in the details.
    #[serde(default)]
    pub ip_address: Option<String>,
    /// Client user agent, if supplied in the details.
    #[serde(default)]
    pub user_agent: Option<String>,
    /// Cleaned event details.
    #[serde(default)]
    pub details: Value,
}

/// Recursively drop credential material from event details.
///
/// `password`/`passwordHash` keys and null values are removed; nested
/// objects are cleaned the same way and elided when they end up empty.
fn clean_details(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut cleaned = Map::new();
            for (key, nested) in map {
                if key == "password" || key == "passwordHash" || nested.is_null() {
                    continue;
                }
                if nested.is_object() {
                    let nested = clean_details(nested);
                    if nested.as_object().is_some_and(|m| !m.is_empty()) {
                        cleaned.insert(key.clone(), nested);
                    }
                } else {
                    cleaned.insert(key.clone(), nested.clone());
                }
            }
            Value::Object(cleaned)
        }
        other => other.clone(),
    }
}

impl AuditLogger {
    /// Record a security event at its default severity.
    pub async fn log_security_event(
        &self,
        kind: SecurityEventKind,
        user: &UserContext,
        details: Value,
    ) {
        self.log_security_event_with_severity(kind, user, details, kind.default_severity())
            .await;
    }

    /// Record a security event at an explicit severity.
    pub async fn log_security_event_with_severity(
        &self,
        kind: SecurityEventKind,
        user: &UserContext,
        details: Value,
        severity: Severity,
    ) {
        let Some(components) = self.components() else {
            warn!(event = kind.as_str(), "Audit logger has no store attached, skipping security event");
            return;
        };

        let timestamp = Utc::now();
        let event = SecurityEvent {
            event_type: kind.as_str().to_string(),
            severity,
            timestamp,
            user_id: user.user_id.clone(),
            user_email: user.email.clone(),
            username: user.username.clone(),
            ip_address: details
                .get("ipAddress")
                .and_then(Value::as_str)
                .map(String::from),
            user_agent: details
                .get("userAgent")
                .and_then(Value::as_str)
                .map(String::from),
            details: clean_details(&details),
        };

        if matches!(severity, Severity::Warning | Severity::Critical) {
            warn!(event = kind.as_str(), severity = %severity, "Security event");
        }

        let date_key = paths::date_key(&timestamp);
        let key = components
            .store
            .generate_key(&paths::security_partition(&date_key));
        let path = paths::security_event(&date_key, &key);

        match serde_json::to_value(&event) {
            Ok(value) => {
                if let Err(e) = components.store.set(&path, value).await {
                    warn!(event = kind.as_str(), error = %e, "Failed to write security event");
                }
            }
            Err(e) => {
                warn!(event = kind.as_str(), error = %e, "Failed to serialize security event");
            }
        }
    }

    /// Security events within `[start, end]`, newest first. Fail-open.
    pub async fn query_security_events(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: Option<usize>,
    ) -> Vec<SecurityEvent> {
        let Some(components) = self.components() else {
            warn!("Audit logger has no store attached, returning empty result");
            return Vec::new();
        };
        let limit = limit.unwrap_or(self.config().query.default_limit);
        match scan_security(components, start, end, limit).await {
            Ok(events) => events,
            Err(e) => {
                warn!(error = %e, "Security event query failed");
                Vec::new()
            }
        }
    }

    /// Record a successful sign-in.
    pub async fn log_login_success(&self, user: &UserContext) {
        self.log_security_event(SecurityEventKind::LoginSuccess, user, json!({}))
            .await;
    }

    /// Record a failed sign-in attempt. Escalates to warning severity
    /// once the attempt count approaches the lockout threshold.
    pub async fn log_login_failed(&self, identifier: &str, reason: &str, attempt_count: u32) {
        let severity = if attempt_count >= 4 {
            Severity::Warning
        } else {
            Severity::Info
        };
        let details = json!({
            "identifier": identifier.to_lowercase(),
            "reason": reason,
            "attemptCount": attempt_count,
            "remainingAttempts": 5u32.saturating_sub(attempt_count),
        });
        self.log_security_event_with_severity(
            SecurityEventKind::LoginFailed,
            &UserContext::anonymous(),
            details,
            severity,
        )
        .await;
    }

    /// Record an account lockout.
    pub async fn log_account_locked(&self, identifier: &str, lockout_duration_secs: u64) {
        let details = json!({
            "identifier": identifier.to_lowercase(),
            "lockoutDurationSeconds": lockout_duration_secs,
            "reason": "Too many failed login attempts",
        });
        self.log_security_event(
            SecurityEventKind::LoginLocked,
            &UserContext::anonymous(),
            details,
        )
        .await;
    }

    /// Record a brute-force detection.
    pub async fn log_brute_force_detected(&self, identifier: &str, attempt_count: u32) {
        let details = json!({
            "identifier": identifier.to_lowercase(),
            "attemptCount": attempt_count,
            "action": "Account locked",
        });
        self.log_security_event(
            SecurityEventKind::BruteForceDetected,
            &UserContext::anonymous(),
            details,
        )
        .await;
    }

    /// Record a denied route access.
    pub async fn log_unauthorized_access(&self, user: &UserContext, route: &str) {
        let details = json!({
            "route": route,
            "action": "Access denied",
        });
        self.log_security_event(SecurityEventKind::UnauthorizedAccess, user, details)
            .await;
    }

    /// Record a sign-out.
    pub async fn log_logout(&self, user: &UserContext) {
        self.log_security_event(SecurityEventKind::Logout, user, json!({}))
            .await;
    }

    /// Record an account creation.
    pub async fn log_account_created(
        &self,
        user: &UserContext,
        role: &str,
        created_by: Option<&UserId>,
    ) {
        let details = json!({
            "role": role,
            "createdBy": created_by.map(UserId::as_str),
        });
        self.log_security_event(SecurityEventKind::AccountCreated, user, details)
            .await;
    }

    /// Record an account deletion.
    pub async fn log_account_deleted(&self, user: &UserContext, deleted_by: Option<&UserId>) {
        let details = json!({
            "deletedBy": deleted_by.map(UserId::as_str),
        });
        self.log_security_event(SecurityEventKind::AccountDeleted, user, details)
            .await;
    }

    /// Record a role change.
    pub async fn log_role_changed(
        &self,
        user: &UserContext,
        old_role: &str,
        new_role: &str,
        changed_by: Option<&UserId>,
    ) {
        let details = json!({
            "oldRole": old_role,
            "newRole": new_role,
            "changedBy": changed_by.map(UserId::as_str),
        });
        self.log_security_event(SecurityEventKind::RoleChanged, user, details)
            .await;
    }
}

/// Walk the security partitions in `[start, end]`, newest first.
async fn scan_security(
    components: &Components,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    limit: usize,
) -> AppResult<Vec<SecurityEvent>> {
    let mut events = Vec::new();
    let mut date = start.date_naive();
    let last = end.date_naive();

    while date <= last {
        let partition = paths::security_partition(&date.format("%Y-%m-%d").to_string());
        let rows = components
            .store
            .query_range(&partition, RangeQuery::by_key().limit_to_last(limit))
            .await?;

        for (key, value) in rows {
            match serde_json::from_value::<SecurityEvent>(value) {
                Ok(event) if event.timestamp >= start && event.timestamp <= end => {
                    events.push(event);
                }
                Ok(_) => {}
                Err(e) => warn!(%key, error = %e, "Skipping malformed security event"),
            }
        }

        let Some(next) = date.succ_opt() else { break };
        date = next;
    }

    events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    events.truncate(limit);
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_details_drops_credentials_and_nulls() {
        let details = json!({
            "identifier": "alice",
            "password": "hunter2",
            "passwordHash": "xxxx",
            "reason": null,
            "nested": {"password": "p", "keep": 1},
            "empty": {"password": "p"},
        });

        let cleaned = clean_details(&details);
        assert_eq!(
            cleaned,
            json!({
                "identifier": "alice",
                "nested": {"keep": 1},
            })
        );
    }

    #[test]
    fn test_default_severities() {
        assert_eq!(
            SecurityEventKind::BruteForceDetected.default_severity(),
            Severity::Critical
        );
        assert_eq!(
            SecurityEventKind::RoleChanged.default_severity(),
            Severity::Warning
        );
        assert_eq!(
            SecurityEventKind::Logout.default_severity(),
            Severity::Info
        );
    }
}
