//! # Authcache Flow
//!
//! `authcache-flow` drives the status of a login attempt through an OAuth handshake:
//!
//! 1. [`SessionLifecycle::start`] issues a token and records it as `pending` before the
//!    user is redirected to the provider.
//! 2. After the callback handler has verified the provider's authorization code, it calls
//!    [`SessionLifecycle::authenticate`] (or [`SessionLifecycle::fail`]).
//! 3. Protected routes call [`SessionLifecycle::check_status`] or
//!    [`SessionLifecycle::require_authenticated`].
//! 4. [`SessionLifecycle::logout`] removes the record.
//!
//! All state lives in the injected [`StatusCache`]; the controller itself is a cheap,
//! clonable handle.

#![warn(missing_docs)]

pub use authcache_core::{AuthError, SessionStatus, SessionToken};
pub use authcache_session::{CacheConfig, StatusCache};

use std::sync::Arc;

/// The session lifecycle controller.
pub mod lifecycle;
pub use lifecycle::SessionLifecycle;

/// Marker for a missing component in the typestate pattern.
#[derive(Clone, Default)]
pub struct Missing;

/// Marker for a configured component in the typestate pattern.
#[derive(Clone)]
pub struct Configured<T>(pub T);

/// A builder for configuring and creating a [`SessionLifecycle`].
///
/// [`LifecycleBuilder::build`] only exists once a cache has been supplied.
pub struct LifecycleBuilder<C> {
    cache: C,
    session_ttl: Option<chrono::Duration>,
}

impl Default for LifecycleBuilder<Missing> {
    fn default() -> Self {
        Self {
            cache: Missing,
            session_ttl: None,
        }
    }
}

impl<C> LifecycleBuilder<C> {
    /// Set the status cache.
    pub fn cache(
        self,
        cache: Arc<dyn StatusCache>,
    ) -> LifecycleBuilder<Configured<Arc<dyn StatusCache>>> {
        LifecycleBuilder {
            cache: Configured(cache),
            session_ttl: self.session_ttl,
        }
    }

    /// Expire session records this long after the login starts.
    pub fn session_ttl(mut self, ttl: chrono::Duration) -> Self {
        self.session_ttl = Some(ttl);
        self
    }

    /// Apply the expiry from a [`CacheConfig`], if it has one.
    pub fn config(mut self, config: &CacheConfig) -> Self {
        if let Some(ttl) = config.session_ttl {
            self.session_ttl = Some(ttl);
        }
        self
    }
}

impl LifecycleBuilder<Configured<Arc<dyn StatusCache>>> {
    /// Build the [`SessionLifecycle`].
    pub fn build(self) -> SessionLifecycle {
        SessionLifecycle::from_parts(self.cache.0, self.session_ttl)
    }
}
