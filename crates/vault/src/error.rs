//! Caller-visible Error Types
//!
//! One error enum per facade operation, plus the configuration validation
//! errors shared by all of them. Per-realm failures are buffered during an
//! operation and collapsed into exactly one of these variants when the
//! coordinator reaches its quorum decision.

use thiserror::Error;

use kernel::id::RealmId;

use crate::domain::outcome::RealmError;

/// Configuration invariant violations
///
/// Each variant names the violated invariant so callers can fix the
/// configuration rather than guess.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// A configuration must name at least one realm
    #[error("Configuration contains no realms")]
    NoRealms,

    /// At most 255 realms are supported
    #[error("Configuration contains {count} realms (maximum 255)")]
    TooManyRealms { count: usize },

    /// Realm ids must be unique within a configuration
    #[error("Duplicate realm id: {0}")]
    DuplicateRealmId(RealmId),

    /// `1 <= register_threshold <= realm count` must hold
    #[error("Register threshold {threshold} out of range for {realms} realms")]
    RegisterThresholdOutOfRange { threshold: u8, realms: usize },

    /// `ceil(n/2) <= recover_threshold <= n` must hold
    #[error(
        "Recover threshold {threshold} out of range for {realms} realms (minimum {min_required})"
    )]
    RecoverThresholdOutOfRange {
        threshold: u8,
        min_required: u8,
        realms: usize,
    },

    /// An adversary must not need fewer realms than a registration uses
    #[error(
        "Recover threshold {recover_threshold} exceeds register threshold {register_threshold}"
    )]
    ThresholdOrder {
        register_threshold: u8,
        recover_threshold: u8,
    },

    /// The authentication map is missing a token for a configured realm
    #[error("No authentication token for realm {0}")]
    MissingToken(RealmId),
}

/// Error returned by `Client::register`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegisterError {
    /// The configuration or authentication map is invalid
    #[error("Invalid configuration: {0}")]
    Configuration(#[from] ConfigurationError),

    /// A realm rejected the client's auth token
    #[error("A realm rejected the authentication token")]
    InvalidAuth,

    /// The client software is too old to talk to a configured realm
    #[error("Client software must be upgraded to talk to a configured realm")]
    UpgradeRequired,

    /// A software error; do not retry with the same parameters
    #[error("A realm reported a software error")]
    Assertion,

    /// A transient failure; retrying with the same parameters may succeed
    #[error("Too many realms failed transiently; the registration may succeed if retried")]
    Transient,
}

impl RegisterError {
    /// Whether retrying the identical request may succeed
    ///
    /// Safe because hardening and splitting are deterministic.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RegisterError::Transient)
    }
}

impl From<RealmError> for RegisterError {
    fn from(err: RealmError) -> Self {
        match err {
            RealmError::InvalidAuth => RegisterError::InvalidAuth,
            RealmError::UpgradeRequired => RegisterError::UpgradeRequired,
            RealmError::Transient => RegisterError::Transient,
            // NotRegistered / InvalidPin cannot come back from a register
            // RPC; a realm that reports them is misbehaving.
            RealmError::Assertion
            | RealmError::Unknown(_)
            | RealmError::NotRegistered
            | RealmError::InvalidPin { .. } => RegisterError::Assertion,
        }
    }
}

/// Error returned by `Client::recover`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecoverError {
    /// The configuration or authentication map is invalid
    #[error("Invalid configuration: {0}")]
    Configuration(#[from] ConfigurationError),

    /// The PIN did not unlock the secret on a quorum of realms.
    ///
    /// `guesses_remaining` is the most restrictive count reported by any
    /// realm; at zero the secret is locked and permanently inaccessible.
    #[error("Invalid PIN ({guesses_remaining} guesses remaining)")]
    InvalidPin { guesses_remaining: u16 },

    /// The secret was not registered, or not fully registered, on these realms
    #[error("No secret is registered on these realms")]
    NotRegistered,

    /// A realm rejected the client's auth token
    #[error("A realm rejected the authentication token")]
    InvalidAuth,

    /// The client software is too old to talk to a configured realm
    #[error("Client software must be upgraded to talk to a configured realm")]
    UpgradeRequired,

    /// A software error; do not retry with the same parameters
    #[error("A realm reported a software error")]
    Assertion,

    /// A transient failure; retrying with the same parameters may succeed
    #[error("Too many realms failed transiently; recovery may succeed if retried")]
    Transient,
}

impl RecoverError {
    /// Guesses remaining, when the failure was a wrong PIN
    pub fn guesses_remaining(&self) -> Option<u16> {
        match self {
            RecoverError::InvalidPin { guesses_remaining } => Some(*guesses_remaining),
            _ => None,
        }
    }

    /// Whether the secret can no longer be recovered at all.
    ///
    /// Distinct from a transient failure so callers do not offer the user a
    /// pointless retry.
    pub fn is_unrecoverable(&self) -> bool {
        matches!(
            self,
            RecoverError::NotRegistered
                | RecoverError::InvalidPin {
                    guesses_remaining: 0
                }
        )
    }

    /// Whether retrying the identical request may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, RecoverError::Transient)
    }
}

/// Error returned by `Client::delete`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeleteError {
    /// The configuration or authentication map is invalid
    #[error("Invalid configuration: {0}")]
    Configuration(#[from] ConfigurationError),

    /// A realm rejected the client's auth token
    #[error("A realm rejected the authentication token")]
    InvalidAuth,

    /// The client software is too old to talk to a configured realm
    #[error("Client software must be upgraded to talk to a configured realm")]
    UpgradeRequired,

    /// A software error; do not retry with the same parameters
    #[error("A realm reported a software error")]
    Assertion,

    /// A transient failure; retrying with the same parameters may succeed
    #[error("Too many realms failed transiently; the delete may succeed if retried")]
    Transient,
}

impl From<RealmError> for DeleteError {
    fn from(err: RealmError) -> Self {
        match err {
            RealmError::InvalidAuth => DeleteError::InvalidAuth,
            RealmError::UpgradeRequired => DeleteError::UpgradeRequired,
            RealmError::Transient => DeleteError::Transient,
            RealmError::Assertion
            | RealmError::Unknown(_)
            | RealmError::NotRegistered
            | RealmError::InvalidPin { .. } => DeleteError::Assertion,
        }
    }
}
