//! Realm Error Codes - Classification of realm-reported failures
//!
//! Defines the [`RealmErrorCode`] table shared by every realm on the wire,
//! and the parsing rules for both code spellings plus the legacy free-text
//! guesses-remaining form.

use serde::Serialize;

/// The fixed error-code table reported by realms.
///
/// Realms have historically emitted these codes in two spellings
/// (`invalidAuth` and `INVALID_AUTH`); both must be accepted. The table is
/// deliberately closed: codes outside it are surfaced by callers as an
/// explicit unknown, never coerced into a known variant.
///
/// ## Notes
/// * `non_exhaustive` - realm software may grow new codes before clients do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum RealmErrorCode {
    /// The realm rejected the client's auth token
    InvalidAuth,
    /// The client software is too old to talk to this realm
    UpgradeRequired,
    /// A software error; retrying with the same parameters will not help
    Assertion,
    /// A transient send/receive failure; retrying may succeed
    Transient,
    /// No secret is registered (or fully registered) on this realm
    NotRegistered,
    /// The guess did not unlock the secret; a guesses-remaining count applies
    InvalidPin,
}

impl RealmErrorCode {
    /// Parse a wire code string, accepting both spellings case-insensitively.
    ///
    /// Returns `None` for codes outside the fixed table; the caller decides
    /// how to surface those (they must not be silently swallowed).
    pub fn parse(code: &str) -> Option<Self> {
        match code.trim() {
            c if c.eq_ignore_ascii_case("invalidAuth") || c.eq_ignore_ascii_case("INVALID_AUTH") => {
                Some(RealmErrorCode::InvalidAuth)
            }
            c if c.eq_ignore_ascii_case("upgradeRequired")
                || c.eq_ignore_ascii_case("UPGRADE_REQUIRED") =>
            {
                Some(RealmErrorCode::UpgradeRequired)
            }
            c if c.eq_ignore_ascii_case("assertion") => Some(RealmErrorCode::Assertion),
            c if c.eq_ignore_ascii_case("transient") => Some(RealmErrorCode::Transient),
            c if c.eq_ignore_ascii_case("notRegistered")
                || c.eq_ignore_ascii_case("NOT_REGISTERED") =>
            {
                Some(RealmErrorCode::NotRegistered)
            }
            c if c.eq_ignore_ascii_case("invalidPin") || c.eq_ignore_ascii_case("INVALID_PIN") => {
                Some(RealmErrorCode::InvalidPin)
            }
            _ => None,
        }
    }

    /// Canonical wire spelling
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            RealmErrorCode::InvalidAuth => "INVALID_AUTH",
            RealmErrorCode::UpgradeRequired => "UPGRADE_REQUIRED",
            RealmErrorCode::Assertion => "ASSERTION",
            RealmErrorCode::Transient => "TRANSIENT",
            RealmErrorCode::NotRegistered => "NOT_REGISTERED",
            RealmErrorCode::InvalidPin => "INVALID_PIN",
        }
    }

    /// Whether retrying the same request may succeed
    #[inline]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, RealmErrorCode::Transient)
    }

    /// Whether one realm reporting this code dooms the whole operation
    ///
    /// Auth rejections and version mismatches apply to every realm the same
    /// way; waiting for the others cannot change the outcome.
    #[inline]
    pub const fn is_fail_fast(&self) -> bool {
        matches!(
            self,
            RealmErrorCode::InvalidAuth | RealmErrorCode::UpgradeRequired
        )
    }
}

impl std::fmt::Display for RealmErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Extract a guesses-remaining count from legacy free-text codes.
///
/// Older realm software reports wrong-PIN outcomes as an unstructured code
/// matching `guessesRemaining: <digits>` instead of a structured field.
/// Returns the count when the text matches, `None` otherwise.
pub fn parse_guesses_remaining(code: &str) -> Option<u16> {
    let (prefix, rest) = code.split_once(':')?;
    if !prefix.trim().eq_ignore_ascii_case("guessesRemaining") {
        return None;
    }
    rest.trim().parse::<u16>().ok()
}
