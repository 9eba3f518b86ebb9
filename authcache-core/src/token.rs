use crate::error::AuthError;
use rand::rngs::OsRng;
use rand::TryRngCore;
use std::fmt;

/// Number of random bytes in a session token (128 bits).
pub const TOKEN_BYTES: usize = 16;

/// Length of the hex-encoded token.
pub const TOKEN_HEX_LEN: usize = TOKEN_BYTES * 2;

/// An opaque, unguessable identifier for one login attempt.
///
/// The hex value is the cache key. `Debug` only shows a short prefix, so a token
/// can be logged or traced without leaking the credential.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SessionToken(String);

impl SessionToken {
    /// Generate a fresh token from the operating system's secure random source.
    ///
    /// Fails with [`AuthError::EntropyUnavailable`] if the source cannot be read;
    /// no weaker fallback is attempted.
    pub fn generate() -> Result<Self, AuthError> {
        Self::generate_with(&mut OsRng)
    }

    /// Generate a token from the given fallible random source.
    pub fn generate_with<R: TryRngCore + ?Sized>(rng: &mut R) -> Result<Self, AuthError> {
        let mut bytes = [0u8; TOKEN_BYTES];
        rng.try_fill_bytes(&mut bytes)
            .map_err(|e| AuthError::EntropyUnavailable(e.to_string()))?;
        Ok(Self(hex::encode(bytes)))
    }

    /// Validate a token received back from a client.
    pub fn parse(value: &str) -> Result<Self, AuthError> {
        if value.len() != TOKEN_HEX_LEN || !value.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(AuthError::MalformedToken);
        }
        Ok(Self(value.to_ascii_lowercase()))
    }

    /// The hex-encoded token value.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// A short prefix suitable for log lines.
    pub fn redacted(&self) -> &str {
        &self.0[..8.min(self.0.len())]
    }

    /// Consume the token, returning its hex value.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl AsRef<str> for SessionToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionToken({}…)", self.redacted())
    }
}
