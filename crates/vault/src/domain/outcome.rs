//! Per-realm Error Taxonomy
//!
//! Every realm-reported status collapses into [`RealmError`]. Codes outside
//! the fixed table become [`RealmError::Unknown`] - surfaced explicitly,
//! never coerced into a known variant, never silently swallowed.

use thiserror::Error;

use kernel::error::code::RealmErrorCode;

/// A typed failure from one realm during one operation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RealmError {
    /// The realm rejected the client's auth token
    #[error("realm rejected the authentication token")]
    InvalidAuth,

    /// The client software is too old to talk to this realm
    #[error("realm requires a newer client version")]
    UpgradeRequired,

    /// A software error; retrying with the same parameters will not help
    #[error("realm reported a software error")]
    Assertion,

    /// A transient send/receive failure; retrying may succeed
    #[error("transient failure talking to realm")]
    Transient,

    /// No secret is registered (or fully registered) on this realm
    #[error("no secret registered on realm")]
    NotRegistered,

    /// The guess did not unlock the share on this realm
    #[error("invalid PIN ({guesses_remaining} guesses remaining on realm)")]
    InvalidPin {
        /// Guesses left before the realm locks the share
        guesses_remaining: u16,
    },

    /// A code outside the fixed table; classified at assertion severity
    #[error("unknown realm error: {0}")]
    Unknown(String),
}

impl RealmError {
    /// Build from a parsed wire code.
    ///
    /// `guesses_remaining` applies only to `INVALID_PIN`; a wrong-PIN report
    /// without a count is a realm contract violation and is surfaced as
    /// unknown rather than invented.
    pub fn from_code(code: RealmErrorCode, guesses_remaining: Option<u16>) -> Self {
        match code {
            RealmErrorCode::InvalidAuth => RealmError::InvalidAuth,
            RealmErrorCode::UpgradeRequired => RealmError::UpgradeRequired,
            RealmErrorCode::Assertion => RealmError::Assertion,
            RealmErrorCode::Transient => RealmError::Transient,
            RealmErrorCode::NotRegistered => RealmError::NotRegistered,
            RealmErrorCode::InvalidPin => match guesses_remaining {
                Some(guesses_remaining) => RealmError::InvalidPin { guesses_remaining },
                None => {
                    RealmError::Unknown("INVALID_PIN without guessesRemaining".to_string())
                }
            },
            other => RealmError::Unknown(other.as_str().to_string()),
        }
    }

    /// Whether one realm reporting this error dooms the whole operation.
    ///
    /// Auth rejections and version mismatches apply to every realm equally;
    /// waiting for the others cannot change the outcome.
    pub fn is_fail_fast(&self) -> bool {
        matches!(self, RealmError::InvalidAuth | RealmError::UpgradeRequired)
    }

    /// Severity rank for choosing one representative error at quorum time.
    ///
    /// `InvalidAuth > UpgradeRequired > Assertion > Transient`; unknown
    /// codes rank with assertions. Domain outcomes (`NotRegistered`,
    /// `InvalidPin`) are handled before severity comparison and rank lowest.
    pub fn severity(&self) -> u8 {
        match self {
            RealmError::InvalidAuth => 4,
            RealmError::UpgradeRequired => 3,
            RealmError::Assertion | RealmError::Unknown(_) => 2,
            RealmError::Transient => 1,
            RealmError::NotRegistered | RealmError::InvalidPin { .. } => 0,
        }
    }
}

/// Keep whichever of two buffered errors is more severe
pub(crate) fn more_severe(current: Option<RealmError>, candidate: RealmError) -> Option<RealmError> {
    match current {
        Some(current) if current.severity() >= candidate.severity() => Some(current),
        _ => Some(candidate),
    }
}
