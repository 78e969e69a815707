//! Recover Coordinator
//!
//! Hardens the PIN, asks every realm for its share concurrently, and
//! reconstructs the secret once `recover_threshold` shares arrive. When a
//! quorum is no longer reachable the buffered failures collapse into one
//! caller-facing error, wrong-PIN reports taking precedence so the user
//! learns their most restrictive remaining guess count.

use std::sync::Arc;

use kernel::id::SecretId;
use platform::pin::{self, HardenedPin, Pin};
use platform::token::AuthToken;

use crate::application::fanout::{fan_out, OutcomeSlots};
use crate::domain::authentication::Authentication;
use crate::domain::codec::SecretCodec;
use crate::domain::configuration::{Configuration, RealmDescriptor};
use crate::domain::outcome::{more_severe, RealmError};
use crate::domain::secret::{SecretShare, UserSecret};
use crate::domain::transport::RealmTransport;
use crate::error::{ConfigurationError, RecoverError};

struct RealmContext {
    realm: RealmDescriptor,
    token: AuthToken,
    hardened: HardenedPin,
}

/// Use case: recover a previously registered secret with its PIN
pub struct RecoverUseCase<T, C: ?Sized> {
    transport: Arc<T>,
    codec: Arc<C>,
}

impl<T, C> RecoverUseCase<T, C>
where
    T: RealmTransport + Send + Sync + 'static,
    C: SecretCodec + ?Sized,
{
    pub fn new(transport: Arc<T>, codec: Arc<C>) -> Self {
        Self { transport, codec }
    }

    /// Execute the recovery. `info` must match the value used at
    /// registration or every realm sees a wrong PIN.
    pub async fn execute(
        &self,
        configuration: &Configuration,
        authentication: &Authentication,
        secret_id: &SecretId,
        pin: &Pin,
        info: &[u8],
    ) -> Result<UserSecret, RecoverError> {
        configuration.validate()?;
        authentication.ensure_covers(configuration)?;

        let n = configuration.realm_count();
        let recover_threshold = usize::from(configuration.recover_threshold);

        let hardened =
            pin::harden(pin, configuration.pin_hashing_mode, info).map_err(|err| {
                tracing::warn!(error = %err, "PIN hardening failed");
                RecoverError::Assertion
            })?;

        let mut contexts = Vec::with_capacity(n);
        for realm in &configuration.realms {
            let token = authentication
                .token_for(&realm.id)
                .cloned()
                .ok_or(ConfigurationError::MissingToken(realm.id))?;
            contexts.push(RealmContext {
                realm: realm.clone(),
                token,
                hardened: hardened.clone(),
            });
        }

        let transport = Arc::clone(&self.transport);
        let secret_id = *secret_id;
        let mut rx = fan_out(contexts, move |_, ctx| {
            let transport = Arc::clone(&transport);
            async move {
                transport
                    .recover(&ctx.realm, &ctx.token, &secret_id, &ctx.hardened)
                    .await
            }
        });

        let mut slots = OutcomeSlots::new(n);
        let mut shares: Vec<SecretShare> = Vec::new();
        let mut failures = 0usize;
        let mut worst = None;
        let mut guess_floor: Option<u16> = None;
        let mut not_registered = 0usize;

        while let Some((index, outcome)) = rx.recv().await {
            if !slots.record(index) {
                continue;
            }
            match outcome {
                Ok(share) => {
                    shares.push(share);
                    if shares.len() >= recover_threshold {
                        tracing::info!(
                            secret_id = %secret_id,
                            shares = shares.len(),
                            realms = n,
                            "Recovery reached quorum"
                        );
                        return self
                            .codec
                            .reconstruct(&shares, recover_threshold as u8)
                            .map_err(|err| {
                                tracing::warn!(error = %err, "Secret reconstruction failed");
                                RecoverError::Assertion
                            });
                    }
                }
                Err(err) => {
                    tracing::debug!(
                        realm = %configuration.realms[index].id,
                        error = %err,
                        "Realm rejected recovery"
                    );
                    if err.is_fail_fast() {
                        return Err(fatal(err));
                    }
                    failures += 1;
                    match &err {
                        RealmError::InvalidPin { guesses_remaining } => {
                            guess_floor = Some(match guess_floor {
                                Some(floor) => floor.min(*guesses_remaining),
                                None => *guesses_remaining,
                            });
                        }
                        RealmError::NotRegistered => not_registered += 1,
                        _ => {}
                    }
                    worst = more_severe(worst, err);
                    if failures > n - recover_threshold {
                        return Err(decide(
                            guess_floor,
                            not_registered,
                            recover_threshold,
                            worst,
                        ));
                    }
                }
            }
        }

        tracing::error!(written = slots.written(), "Recovery fold exhausted");
        Err(RecoverError::Assertion)
    }
}

fn fatal(err: RealmError) -> RecoverError {
    match err {
        RealmError::InvalidAuth => RecoverError::InvalidAuth,
        RealmError::UpgradeRequired => RecoverError::UpgradeRequired,
        _ => RecoverError::Assertion,
    }
}

/// Collapse the buffered failures into one caller-facing error.
///
/// Precedence: a wrong PIN anywhere (reporting the lowest remaining guess
/// count seen), then not-registered at quorum strength, then the most
/// severe infrastructure failure.
fn decide(
    guess_floor: Option<u16>,
    not_registered: usize,
    recover_threshold: usize,
    worst: Option<RealmError>,
) -> RecoverError {
    if let Some(guesses_remaining) = guess_floor {
        return RecoverError::InvalidPin { guesses_remaining };
    }
    if not_registered >= recover_threshold {
        return RecoverError::NotRegistered;
    }
    match worst {
        Some(RealmError::Assertion) | Some(RealmError::Unknown(_)) => RecoverError::Assertion,
        Some(RealmError::Transient) => RecoverError::Transient,
        // Only sub-quorum NotRegistered reports remain: the registration
        // never completed on enough realms.
        _ => RecoverError::NotRegistered,
    }
}
