//! Realm Transport Trait
//!
//! One method per wire operation. Implementations map their own failure
//! modes (network, HTTP status, body parsing) into [`RealmError`]; the
//! coordinator never sees transport-level detail.

use kernel::id::SecretId;
use platform::pin::HardenedPin;
use platform::token::AuthToken;

use crate::domain::configuration::RealmDescriptor;
use crate::domain::outcome::RealmError;
use crate::domain::secret::SecretShare;

/// Client-to-realm operations
#[trait_variant::make(RealmTransport: Send)]
pub trait LocalRealmTransport {
    /// Store a share on one realm under `secret_id`, guarded by the
    /// hardened PIN and a guess allowance.
    ///
    /// Registering again under the same id replaces the previous share and
    /// resets the guess counter.
    async fn register(
        &self,
        realm: &RealmDescriptor,
        token: &AuthToken,
        secret_id: &SecretId,
        hardened_pin: &HardenedPin,
        share: &SecretShare,
        num_guesses: u16,
    ) -> Result<(), RealmError>;

    /// Present the hardened PIN to one realm and retrieve its share.
    ///
    /// A wrong PIN consumes a guess; an exhausted allowance renders the
    /// share permanently unrecoverable on that realm.
    async fn recover(
        &self,
        realm: &RealmDescriptor,
        token: &AuthToken,
        secret_id: &SecretId,
        hardened_pin: &HardenedPin,
    ) -> Result<SecretShare, RealmError>;

    /// Delete whatever is stored for `secret_id` on one realm
    async fn delete(
        &self,
        realm: &RealmDescriptor,
        token: &AuthToken,
        secret_id: &SecretId,
    ) -> Result<(), RealmError>;
}
