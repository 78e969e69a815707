//! End-to-end Scenarios Against an In-memory Realm Fleet
//!
//! The fake fleet mimics the realm contract closely enough to exercise
//! every quorum path: per-secret guess counters, exhausted-share wiping,
//! realms taken offline, and forced error codes.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use kernel::id::{RealmId, SecretId};
use platform::pin::{HardenedPin, Pin, PinHashingMode};
use platform::token::AuthToken;

use crate::client::Client;
use crate::domain::authentication::Authentication;
use crate::domain::codec::{CodecError, SecretCodec};
use crate::domain::configuration::{Configuration, RealmDescriptor};
use crate::domain::outcome::RealmError;
use crate::domain::secret::{SecretShare, UserSecret};
use crate::domain::transport::RealmTransport;
use crate::error::{ConfigurationError, DeleteError, RecoverError, RegisterError};

// ============================================================
// Fake fleet
// ============================================================

struct Record {
    hardened: HardenedPin,
    share: SecretShare,
    guesses_allowed: u16,
    guesses_used: u16,
}

#[derive(Default)]
struct FakeFleet {
    records: Mutex<HashMap<(RealmId, SecretId), Record>>,
    offline: Mutex<HashSet<RealmId>>,
    forced: Mutex<HashMap<RealmId, RealmError>>,
}

impl FakeFleet {
    fn set_offline(&self, realm: RealmId) {
        self.offline.lock().unwrap().insert(realm);
    }

    fn force_error(&self, realm: RealmId, err: RealmError) {
        self.forced.lock().unwrap().insert(realm, err);
    }

    fn stored_on(&self, realm: RealmId, secret_id: &SecretId) -> bool {
        self.records
            .lock()
            .unwrap()
            .contains_key(&(realm, *secret_id))
    }

    fn gate(&self, realm: &RealmDescriptor) -> Result<(), RealmError> {
        if self.offline.lock().unwrap().contains(&realm.id) {
            return Err(RealmError::Transient);
        }
        if let Some(err) = self.forced.lock().unwrap().get(&realm.id) {
            return Err(err.clone());
        }
        Ok(())
    }
}

impl RealmTransport for FakeFleet {
    async fn register(
        &self,
        realm: &RealmDescriptor,
        _token: &AuthToken,
        secret_id: &SecretId,
        hardened_pin: &HardenedPin,
        share: &SecretShare,
        num_guesses: u16,
    ) -> Result<(), RealmError> {
        self.gate(realm)?;
        self.records.lock().unwrap().insert(
            (realm.id, *secret_id),
            Record {
                hardened: hardened_pin.clone(),
                share: share.clone(),
                guesses_allowed: num_guesses,
                guesses_used: 0,
            },
        );
        Ok(())
    }

    async fn recover(
        &self,
        realm: &RealmDescriptor,
        _token: &AuthToken,
        secret_id: &SecretId,
        hardened_pin: &HardenedPin,
    ) -> Result<SecretShare, RealmError> {
        self.gate(realm)?;
        let mut records = self.records.lock().unwrap();
        let key = (realm.id, *secret_id);
        let Some(record) = records.get_mut(&key) else {
            return Err(RealmError::NotRegistered);
        };
        if record.guesses_used >= record.guesses_allowed {
            // Exhausted shares are wiped; nothing distinguishes this from
            // never having registered.
            records.remove(&key);
            return Err(RealmError::NotRegistered);
        }
        if record.hardened != *hardened_pin {
            record.guesses_used += 1;
            let remaining = record.guesses_allowed - record.guesses_used;
            return Err(RealmError::InvalidPin {
                guesses_remaining: remaining,
            });
        }
        Ok(record.share.clone())
    }

    async fn delete(
        &self,
        realm: &RealmDescriptor,
        _token: &AuthToken,
        secret_id: &SecretId,
    ) -> Result<(), RealmError> {
        self.gate(realm)?;
        match self.records.lock().unwrap().remove(&(realm.id, *secret_id)) {
            Some(_) => Ok(()),
            None => Err(RealmError::NotRegistered),
        }
    }
}

/// Every share mirrors the whole secret; reconstruction demands a quorum
/// of identical shares. Stands in for a real threshold scheme in tests.
struct MirrorCodec;

impl SecretCodec for MirrorCodec {
    fn split(
        &self,
        secret: &UserSecret,
        share_count: u8,
        _recover_threshold: u8,
    ) -> Result<Vec<SecretShare>, CodecError> {
        Ok((0..share_count)
            .map(|index| SecretShare {
                index,
                data: secret.as_bytes().to_vec(),
            })
            .collect())
    }

    fn reconstruct(
        &self,
        shares: &[SecretShare],
        recover_threshold: u8,
    ) -> Result<UserSecret, CodecError> {
        if shares.len() < usize::from(recover_threshold) {
            return Err(CodecError::TooFewShares {
                needed: recover_threshold,
                got: shares.len(),
            });
        }
        if shares.iter().any(|s| s.data != shares[0].data) {
            return Err(CodecError::MalformedShares(
                "shares disagree".to_string(),
            ));
        }
        UserSecret::new(shares[0].data.clone())
            .map_err(|e| CodecError::MalformedShares(e.to_string()))
    }
}

// ============================================================
// Harness
// ============================================================

struct Harness {
    fleet: Arc<FakeFleet>,
    client: Client<FakeFleet, MirrorCodec>,
    configuration: Configuration,
    authentication: Authentication,
    secret_id: SecretId,
}

fn realm_id(byte: u8) -> RealmId {
    RealmId::from_bytes([byte; 16])
}

fn harness(n: u8, register_threshold: u8, recover_threshold: u8) -> Harness {
    let fleet = Arc::new(FakeFleet::default());
    let client = Client::new(Arc::clone(&fleet), Arc::new(MirrorCodec));

    let realms: Vec<RealmDescriptor> = (1..=n)
        .map(|byte| RealmDescriptor {
            id: realm_id(byte),
            address: format!("https://realm-{byte}.test"),
            public_key: None,
        })
        .collect();
    let authentication = realms
        .iter()
        .map(|realm| (realm.id, AuthToken::new(format!("token-{}", realm.id))))
        .collect();

    Harness {
        fleet,
        client,
        configuration: Configuration {
            realms,
            register_threshold,
            recover_threshold,
            pin_hashing_mode: PinHashingMode::FastInsecure,
        },
        authentication,
        secret_id: SecretId::random(),
    }
}

fn pin(raw: &[u8]) -> Pin {
    Pin::new(raw.to_vec()).unwrap()
}

fn secret(raw: &[u8]) -> UserSecret {
    UserSecret::new(raw.to_vec()).unwrap()
}

impl Harness {
    async fn register(&self, pin_bytes: &[u8], guesses: u16) -> Result<(), RegisterError> {
        self.client
            .register(
                &self.configuration,
                &self.authentication,
                &self.secret_id,
                &pin(pin_bytes),
                &secret(b"hello-secret"),
                b"user-1",
                guesses,
            )
            .await
    }

    async fn recover(&self, pin_bytes: &[u8]) -> Result<UserSecret, RecoverError> {
        self.client
            .recover(
                &self.configuration,
                &self.authentication,
                &self.secret_id,
                &pin(pin_bytes),
                b"user-1",
            )
            .await
    }

    async fn delete(&self) -> Result<(), DeleteError> {
        self.client
            .delete(&self.configuration, &self.authentication, &self.secret_id)
            .await
    }
}

// ============================================================
// Scenarios
// ============================================================

#[tokio::test]
async fn test_register_recover_roundtrip() {
    let h = harness(3, 3, 2);
    h.register(b"123456", 5).await.unwrap();

    let recovered = h.recover(b"123456").await.unwrap();
    assert_eq!(recovered.as_bytes(), b"hello-secret");
}

#[tokio::test]
async fn test_recover_without_registration() {
    let h = harness(3, 3, 2);
    assert_eq!(
        h.recover(b"123456").await.unwrap_err(),
        RecoverError::NotRegistered
    );
}

#[tokio::test]
async fn test_wrong_pin_burns_guesses_until_the_secret_is_gone() {
    let h = harness(3, 3, 2);
    h.register(b"123456", 5).await.unwrap();

    // Each wrong attempt consumes one guess on every reachable realm.
    for expected_remaining in (0..5).rev() {
        assert_eq!(
            h.recover(b"000000").await.unwrap_err(),
            RecoverError::InvalidPin {
                guesses_remaining: expected_remaining
            }
        );
    }

    // Allowance exhausted: even the correct PIN cannot recover it now.
    assert_eq!(
        h.recover(b"123456").await.unwrap_err(),
        RecoverError::NotRegistered
    );
}

#[tokio::test]
async fn test_correct_pin_does_not_consume_guesses() {
    let h = harness(3, 3, 2);
    h.register(b"123456", 2).await.unwrap();

    for _ in 0..5 {
        h.recover(b"123456").await.unwrap();
    }
}

#[tokio::test]
async fn test_register_survives_minority_outage() {
    let h = harness(5, 3, 3);
    h.fleet.set_offline(realm_id(4));
    h.fleet.set_offline(realm_id(5));

    h.register(b"123456", 5).await.unwrap();
    let recovered = h.recover(b"123456").await.unwrap();
    assert_eq!(recovered.as_bytes(), b"hello-secret");
}

#[tokio::test]
async fn test_register_fails_on_majority_outage() {
    let h = harness(5, 3, 3);
    h.fleet.set_offline(realm_id(3));
    h.fleet.set_offline(realm_id(4));
    h.fleet.set_offline(realm_id(5));

    let err = h.register(b"123456", 5).await.unwrap_err();
    assert_eq!(err, RegisterError::Transient);
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_failed_register_leaves_no_orphan_shares() {
    let h = harness(3, 3, 2);
    h.fleet.set_offline(realm_id(3));

    assert_eq!(
        h.register(b"123456", 5).await.unwrap_err(),
        RegisterError::Transient
    );

    // Whatever the two reachable realms stored was rolled back.
    for byte in 1..=3 {
        assert!(!h.fleet.stored_on(realm_id(byte), &h.secret_id));
    }
}

#[tokio::test]
async fn test_invalid_auth_fails_fast() {
    let h = harness(3, 3, 2);
    h.fleet.force_error(realm_id(2), RealmError::InvalidAuth);

    assert_eq!(
        h.register(b"123456", 5).await.unwrap_err(),
        RegisterError::InvalidAuth
    );
}

#[tokio::test]
async fn test_upgrade_required_fails_fast_on_recover() {
    let h = harness(3, 3, 2);
    h.register(b"123456", 5).await.unwrap();
    h.fleet.force_error(realm_id(1), RealmError::UpgradeRequired);
    h.fleet.force_error(realm_id(2), RealmError::UpgradeRequired);

    assert_eq!(
        h.recover(b"123456").await.unwrap_err(),
        RecoverError::UpgradeRequired
    );
}

#[tokio::test]
async fn test_hashing_mode_change_behaves_as_wrong_pin() {
    let mut h = harness(3, 3, 2);
    h.register(b"123456", 5).await.unwrap();

    h.configuration.pin_hashing_mode = PinHashingMode::Standard2019;
    assert_eq!(
        h.recover(b"123456").await.unwrap_err(),
        RecoverError::InvalidPin {
            guesses_remaining: 4
        }
    );
}

#[tokio::test]
async fn test_recover_transient_when_quorum_unreachable() {
    let h = harness(3, 3, 2);
    h.register(b"123456", 5).await.unwrap();
    h.fleet.set_offline(realm_id(1));
    h.fleet.set_offline(realm_id(2));

    let err = h.recover(b"123456").await.unwrap_err();
    assert_eq!(err, RecoverError::Transient);
    assert!(!err.is_unrecoverable());
}

#[tokio::test]
async fn test_delete_then_recover() {
    let h = harness(3, 3, 2);
    h.register(b"123456", 5).await.unwrap();

    h.delete().await.unwrap();
    assert_eq!(
        h.recover(b"123456").await.unwrap_err(),
        RecoverError::NotRegistered
    );
}

#[tokio::test]
async fn test_delete_is_idempotent() {
    let h = harness(3, 3, 2);
    h.register(b"123456", 5).await.unwrap();

    h.delete().await.unwrap();
    // Realms answer not-registered now; that still counts as deleted.
    h.delete().await.unwrap();
}

#[tokio::test]
async fn test_reregistration_resets_guess_counter() {
    let h = harness(3, 3, 2);
    h.register(b"123456", 2).await.unwrap();

    assert_eq!(
        h.recover(b"000000").await.unwrap_err(),
        RecoverError::InvalidPin {
            guesses_remaining: 1
        }
    );

    h.register(b"123456", 2).await.unwrap();
    assert_eq!(
        h.recover(b"000000").await.unwrap_err(),
        RecoverError::InvalidPin {
            guesses_remaining: 1
        }
    );
}

#[tokio::test]
async fn test_missing_token_rejected_before_any_network_call() {
    let mut h = harness(3, 3, 2);
    h.authentication = h
        .configuration
        .realms
        .iter()
        .take(2)
        .map(|realm| (realm.id, AuthToken::new("t")))
        .collect();

    let err = h.register(b"123456", 5).await.unwrap_err();
    assert_eq!(
        err,
        RegisterError::Configuration(ConfigurationError::MissingToken(realm_id(3)))
    );
    for byte in 1..=3 {
        assert!(!h.fleet.stored_on(realm_id(byte), &h.secret_id));
    }
}

#[tokio::test]
async fn test_invalid_configuration_rejected() {
    let mut h = harness(3, 3, 2);
    h.configuration.recover_threshold = 0;

    assert!(matches!(
        h.register(b"123456", 5).await.unwrap_err(),
        RegisterError::Configuration(ConfigurationError::RecoverThresholdOutOfRange { .. })
    ));
}

#[tokio::test]
async fn test_secrets_are_isolated_by_id() {
    let h = harness(3, 3, 2);
    h.register(b"123456", 5).await.unwrap();

    let mut other = Harness {
        fleet: Arc::clone(&h.fleet),
        client: Client::new(Arc::clone(&h.fleet), Arc::new(MirrorCodec)),
        configuration: h.configuration.clone(),
        authentication: h.authentication.clone(),
        secret_id: SecretId::random(),
    };
    assert_eq!(
        other.recover(b"123456").await.unwrap_err(),
        RecoverError::NotRegistered
    );

    other.secret_id = h.secret_id;
    other.recover(b"123456").await.unwrap();
}
