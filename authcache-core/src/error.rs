use crate::status::SessionStatus;

/// Errors surfaced by the token generator, the status cache and the lifecycle controller.
///
/// A missing session is reported as `Ok(None)` by plain reads; `SessionNotFound` is only
/// used by operations that require the session to exist.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The operating system's secure random source could not produce bytes.
    #[error("Entropy unavailable: {0}")]
    EntropyUnavailable(String),
    /// The store could not be reached while establishing the connection.
    #[error("Connection error: {0}")]
    Connection(String),
    /// The cache handle is not initialized or the store is marked down.
    #[error("Cache unavailable")]
    CacheUnavailable,
    /// A read round-trip failed or exceeded its deadline.
    #[error("Read error: {0}")]
    Read(String),
    /// A write round-trip failed or exceeded its deadline.
    #[error("Write error: {0}")]
    Write(String),
    /// The stored status value is not one of the known states.
    #[error("Invalid session status: {0:?}")]
    InvalidStatus(String),
    /// A client-supplied token is not a well-formed session token.
    #[error("Malformed session token")]
    MalformedToken,
    /// The session record does not exist (never created, logged out or expired).
    #[error("Session not found")]
    SessionNotFound,
    /// The session exists but has not completed a successful login.
    #[error("Session is not authenticated (status: {0})")]
    NotAuthenticated(SessionStatus),
    /// The session already reached a final status and cannot move to another one.
    #[error("Invalid session transition from {from} to {to}")]
    InvalidTransition {
        from: SessionStatus,
        to: SessionStatus,
    },
}

impl AuthError {
    /// Returns `true` when the store itself is unreachable.
    ///
    /// Callers should answer these with a "try again" outcome rather than
    /// treating the user as logged out.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, AuthError::Connection(_) | AuthError::CacheUnavailable)
    }
}
