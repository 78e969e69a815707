//! Register Coordinator
//!
//! Hardens the PIN, splits the secret, stores one share per realm, and
//! succeeds once `register_threshold` realms ack. On failure it issues
//! best-effort deletes to the realms that already acked, so a failed
//! registration leaves as little behind as it can.

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
use crate::error::{ConfigurationError, RegisterError};

struct RealmContext {
    realm: RealmDescriptor,
    token: AuthToken,
    hardened: HardenedPin,
    share: SecretShare,
}

/// Use case: store a PIN-protected secret across the configured realms
pub struct RegisterUseCase<T, C: ?Sized> {
    transport: Arc<T>,
    codec: Arc<C>,
}

impl<T, C> RegisterUseCase<T, C>
where
    T: RealmTransport + Send + Sync + 'static,
    C: SecretCodec + ?Sized,
{
    pub fn new(transport: Arc<T>, codec: Arc<C>) -> Self {
        Self { transport, codec }
    }

    /// Execute the registration.
    ///
    /// `info` is caller context mixed into the hardening salt and must be
    /// identical at recovery time. `num_guesses` is the per-realm wrong-PIN
    /// allowance.
    pub async fn execute(
        &self,
        configuration: &Configuration,
        authentication: &Authentication,
        secret_id: &SecretId,
        pin: &Pin,
        secret: &UserSecret,
        info: &[u8],
        num_guesses: u16,
    ) -> Result<(), RegisterError> {
        configuration.validate()?;
        authentication.ensure_covers(configuration)?;

        let n = configuration.realm_count();
        let register_threshold = usize::from(configuration.register_threshold);
        let recover_threshold = configuration.recover_threshold;

        let hardened =
            pin::harden(pin, configuration.pin_hashing_mode, info).map_err(|err| {
                tracing::warn!(error = %err, "PIN hardening failed");
                RegisterError::Assertion
            })?;

        let shares = self
            .codec
            .split(secret, n as u8, recover_threshold)
            .map_err(|err| {
                tracing::warn!(error = %err, "Secret split failed");
                RegisterError::Assertion
            })?;
        if shares.len() != n {
            tracing::error!(
                expected = n,
                actual = shares.len(),
                "Codec produced the wrong number of shares"
            );
            return Err(RegisterError::Assertion);
        }

        let mut contexts = Vec::with_capacity(n);
        for (realm, share) in configuration.realms.iter().zip(shares) {
            let token = authentication
                .token_for(&realm.id)
                .cloned()
                .ok_or(ConfigurationError::MissingToken(realm.id))?;
            contexts.push(RealmContext {
                realm: realm.clone(),
                token,
                hardened: hardened.clone(),
                share,
            });
        }

        let transport = Arc::clone(&self.transport);
        let secret_id = *secret_id;
        let mut rx = fan_out(contexts, move |_, ctx| {
            let transport = Arc::clone(&transport);
            async move {
                transport
                    .register(
                        &ctx.realm,
                        &ctx.token,
                        &secret_id,
                        &ctx.hardened,
                        &ctx.share,
                        num_guesses,
                    )
                    .await
            }
        });

        let mut slots = OutcomeSlots::new(n);
        let mut acked: Vec<usize> = Vec::new();
        let mut failures = 0usize;
        let mut worst = None;

        while let Some((index, outcome)) = rx.recv().await {
            if !slots.record(index) {
                continue;
            }
            match outcome {
                Ok(()) => {
                    acked.push(index);
                    if acked.len() >= register_threshold {
                        tracing::info!(
                            secret_id = %secret_id,
                            acks = acked.len(),
                            realms = n,
                            "Registration reached quorum"
                        );
                        return Ok(());
                    }
                }
                Err(err) => {
                    tracing::debug!(
                        realm = %configuration.realms[index].id,
                        error = %err,
                        "Realm rejected registration"
                    );
                    if err.is_fail_fast() {
                        self.rollback(configuration, authentication, &secret_id, &acked)
                            .await;
                        return Err(err.into());
                    }
                    failures += 1;
                    worst = more_severe(worst, err);
                    if failures > n - register_threshold {
                        self.rollback(configuration, authentication, &secret_id, &acked)
                            .await;
                        let err = worst.take().unwrap_or(RealmError::Assertion);
                        return Err(err.into());
                    }
                }
            }
        }

        // Every realm reported, yet neither quorum nor shortfall tripped.
        // The arithmetic above makes this unreachable.
        tracing::error!(written = slots.written(), "Registration fold exhausted");
        Err(RegisterError::Assertion)
    }

    /// Best-effort deletes against realms that acked a failed registration.
    ///
    /// Failures here are logged and swallowed; the caller's error is the
    /// registration failure, not the cleanup.
    async fn rollback(
        &self,
        configuration: &Configuration,
        authentication: &Authentication,
        secret_id: &SecretId,
        acked: &[usize],
    ) {
        for &index in acked {
            let realm = &configuration.realms[index];
            let Some(token) = authentication.token_for(&realm.id) else {
                continue;
            };
            if let Err(err) = self.transport.delete(realm, token, secret_id).await {
                tracing::warn!(
                    realm = %realm.id,
                    error = %err,
                    "Rollback delete failed; an orphaned share may remain"
                );
            }
        }
    }
}
