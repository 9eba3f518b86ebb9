//! # Authcache
//!
//! Tracks the authentication status of OAuth login attempts in a key-value store.
//!
//! ```no_run
//! use authcache::flow::SessionLifecycle;
//! use authcache::session::MemoryStatusCache;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), authcache::AuthError> {
//! let lifecycle = SessionLifecycle::new(Arc::new(MemoryStatusCache::new()));
//! let token = lifecycle.start().await?;
//! // ... redirect to the provider, verify the callback ...
//! lifecycle.authenticate(&token).await?;
//! lifecycle.require_authenticated(&token).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - `flow` (default): the [`flow::SessionLifecycle`] controller.
//! - `redis`: the Redis-backed `RedisStatusCache`.
//! - `full`: everything.

pub use authcache_core::{AuthError, SessionStatus, SessionToken, STATUS_FIELD};

/// Status cache trait, backends and configuration.
pub use authcache_session as session;

/// Session lifecycle controller.
#[cfg(feature = "flow")]
pub use authcache_flow as flow;
