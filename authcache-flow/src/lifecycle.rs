use crate::{LifecycleBuilder, Missing};
use authcache_core::{AuthError, SessionStatus, SessionToken, STATUS_FIELD};
use authcache_session::{FieldUpdate, StatusCache};
use std::sync::Arc;

/// Orchestrates the status of each login attempt across an OAuth handshake.
///
/// Transitions are single atomic compare-and-set writes out of `pending`, so duplicate
/// or racing callbacks for the same token need no lock. Repeating the status a session
/// already holds succeeds; moving a session out of a final status is rejected with
/// [`AuthError::InvalidTransition`]. Cache errors are returned as-is; nothing here retries.
#[derive(Clone)]
pub struct SessionLifecycle {
    cache: Arc<dyn StatusCache>,
    session_ttl: Option<chrono::Duration>,
}

impl SessionLifecycle {
    /// Create a controller over the given cache, leaving expiry to the store.
    pub fn new(cache: Arc<dyn StatusCache>) -> Self {
        Self::from_parts(cache, None)
    }

    /// Create a new [`LifecycleBuilder`].
    pub fn builder() -> LifecycleBuilder<Missing> {
        LifecycleBuilder::default()
    }

    pub(crate) fn from_parts(
        cache: Arc<dyn StatusCache>,
        session_ttl: Option<chrono::Duration>,
    ) -> Self {
        Self { cache, session_ttl }
    }

    /// The cache this controller writes to.
    pub fn cache(&self) -> &Arc<dyn StatusCache> {
        &self.cache
    }

    /// Expiry armed on new session records, if any.
    pub fn session_ttl(&self) -> Option<chrono::Duration> {
        self.session_ttl
    }

    /// Begin a login: issue a token and record it as `pending`.
    ///
    /// The token is only returned once its record has been written, so a client never
    /// holds a token that cannot resolve to a status.
    pub async fn start(&self) -> Result<SessionToken, AuthError> {
        let token = SessionToken::generate()?;
        let pending = SessionStatus::Pending.as_str();

        match self.session_ttl {
            Some(ttl) => {
                self.cache
                    .set_with_expiry(token.as_str(), STATUS_FIELD, pending, ttl)
                    .await?
            }
            None => self.cache.set(token.as_str(), STATUS_FIELD, pending).await?,
        }

        tracing::debug!(token = token.redacted(), "Started login session");
        Ok(token)
    }

    /// Mark the session as authenticated after the provider's code was verified.
    pub async fn authenticate(&self, token: &SessionToken) -> Result<(), AuthError> {
        self.transition(token, SessionStatus::Authenticated).await
    }

    /// Mark the session as failed after provider verification was rejected.
    pub async fn fail(&self, token: &SessionToken) -> Result<(), AuthError> {
        self.transition(token, SessionStatus::Failed).await
    }

    /// Record the outcome of provider verification and return the committed status.
    pub async fn record_outcome(
        &self,
        token: &SessionToken,
        verified: bool,
    ) -> Result<SessionStatus, AuthError> {
        let status = if verified {
            SessionStatus::Authenticated
        } else {
            SessionStatus::Failed
        };
        self.transition(token, status).await?;
        Ok(status)
    }

    /// Current status of the session, or `None` if it does not exist.
    pub async fn check_status(
        &self,
        token: &SessionToken,
    ) -> Result<Option<SessionStatus>, AuthError> {
        self.cache.get_status(token.as_str()).await
    }

    /// Succeed only for an authenticated session.
    pub async fn require_authenticated(&self, token: &SessionToken) -> Result<(), AuthError> {
        match self.check_status(token).await? {
            Some(SessionStatus::Authenticated) => Ok(()),
            Some(other) => Err(AuthError::NotAuthenticated(other)),
            None => Err(AuthError::SessionNotFound),
        }
    }

    /// End the session. Logging out an unknown session succeeds.
    pub async fn logout(&self, token: &SessionToken) -> Result<(), AuthError> {
        self.cache.delete(token.as_str()).await?;
        tracing::debug!(token = token.redacted(), "Session removed");
        Ok(())
    }

    async fn transition(&self, token: &SessionToken, to: SessionStatus) -> Result<(), AuthError> {
        // Only a pending record moves; a record that was logged out or expired is not recreated.
        let update = self
            .cache
            .compare_and_set(
                token.as_str(),
                STATUS_FIELD,
                SessionStatus::Pending.as_str(),
                to.as_str(),
            )
            .await?;
        match update {
            FieldUpdate::Written => {
                tracing::debug!(
                    token = token.redacted(),
                    status = %to,
                    "Session status updated"
                );
                Ok(())
            }
            FieldUpdate::Missing => Err(AuthError::SessionNotFound),
            FieldUpdate::Conflict(current) => {
                let from: SessionStatus = current.parse()?;
                tracing::debug!(
                    token = token.redacted(),
                    from = %from,
                    to = %to,
                    "Rejected session status change"
                );
                Err(AuthError::InvalidTransition { from, to })
            }
        }
    }
}

impl std::fmt::Debug for SessionLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionLifecycle")
            .field("session_ttl", &self.session_ttl)
            .finish_non_exhaustive()
    }
}
