//! Secret and Share Value Objects
//!
//! Both exist only for the duration of one register/recover call and are
//! zeroized when dropped; the core never persists either.

use std::fmt;

use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Maximum length in bytes of a user-provided secret
pub const MAX_USER_SECRET_LENGTH: usize = 128;

/// Secret length violation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SecretError {
    /// User secrets are capped at [`MAX_USER_SECRET_LENGTH`] bytes
    #[error("Secret must be at most {max} bytes (got {actual})")]
    TooLong { max: usize, actual: usize },
}

/// A user-provided secret, at most 128 bytes
///
/// ## Security
/// - Implements `Zeroize` and `ZeroizeOnDrop`
/// - Debug output is redacted
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct UserSecret(Vec<u8>);

impl UserSecret {
    /// Create a secret, enforcing the length cap. Empty secrets are allowed.
    pub fn new(raw: Vec<u8>) -> Result<Self, SecretError> {
        if raw.len() > MAX_USER_SECRET_LENGTH {
            return Err(SecretError::TooLong {
                max: MAX_USER_SECRET_LENGTH,
                actual: raw.len(),
            });
        }
        Ok(Self(raw))
    }

    /// The secret bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the secret is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for UserSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("UserSecret").field(&"[REDACTED]").finish()
    }
}

/// One realm's fragment of the secret-protecting material
///
/// Opaque to the coordinator; produced and consumed only by the
/// [`SecretCodec`](crate::domain::codec::SecretCodec).
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SecretShare {
    /// Position of this share in the split (realm order)
    pub index: u8,
    /// The share material
    pub data: Vec<u8>,
}

impl fmt::Debug for SecretShare {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretShare")
            .field("index", &self.index)
            .field("data", &"[REDACTED]")
            .finish()
    }
}
