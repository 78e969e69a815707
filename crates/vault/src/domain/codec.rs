//! Secret Codec Trait
//!
//! The threshold split/reconstruct math is an external primitive; this
//! trait is the seam it plugs into. The contract the coordinator relies on:
//! `split` produces exactly `share_count` shares, and any
//! `recover_threshold` of them reconstruct the original secret.

use thiserror::Error;

use crate::domain::secret::{SecretShare, UserSecret};

/// Codec failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Reconstruction was attempted below the threshold
    #[error("Reconstruction needs {needed} shares (got {got})")]
    TooFewShares { needed: u8, got: usize },

    /// Shares were inconsistent or corrupted
    #[error("Malformed shares: {0}")]
    MalformedShares(String),

    /// The split parameters were unusable
    #[error("Cannot split: {0}")]
    SplitFailed(String),
}

/// Threshold secret sharing, consumed as an external primitive
pub trait SecretCodec: Send + Sync {
    /// Split `secret` into `share_count` shares, any `recover_threshold`
    /// of which reconstruct it.
    ///
    /// Must be deterministic given identical inputs, or callers lose the
    /// ability to retry a registration idempotently.
    fn split(
        &self,
        secret: &UserSecret,
        share_count: u8,
        recover_threshold: u8,
    ) -> Result<Vec<SecretShare>, CodecError>;

    /// Reconstruct the secret from at least `recover_threshold` shares
    fn reconstruct(
        &self,
        shares: &[SecretShare],
        recover_threshold: u8,
    ) -> Result<UserSecret, CodecError>;
}
