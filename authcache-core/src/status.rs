use crate::error::AuthError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The state of one OAuth login attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// The user was redirected to the provider and the callback has not arrived yet.
    Pending,
    /// The provider's authorization code was verified.
    Authenticated,
    /// Provider verification failed.
    Failed,
}

impl SessionStatus {
    /// The string stored in the cache for this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Pending => "pending",
            SessionStatus::Authenticated => "authenticated",
            SessionStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SessionStatus::Pending),
            "authenticated" => Ok(SessionStatus::Authenticated),
            "failed" => Ok(SessionStatus::Failed),
            other => Err(AuthError::InvalidStatus(other.to_string())),
        }
    }
}
