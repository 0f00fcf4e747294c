//! Log entry severity levels.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Severity attached to a log entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Routine change or event.
    #[default]
    Info,
    /// Suspicious or noteworthy event.
    Warning,
    /// Event requiring attention (lockouts, brute force detection).
    Critical,
}

impl Severity {
    /// Return the lowercase string form used in persisted entries.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
