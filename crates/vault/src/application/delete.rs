//! Delete Coordinator
//!
//! Removes whatever is stored for one secret id on every realm. A realm
//! with nothing stored answers not-registered; that counts as success here,
//! since the end state the caller asked for already holds on that realm.

use std::sync::Arc;

use kernel::id::SecretId;
use platform::token::AuthToken;

use crate::application::fanout::{fan_out, OutcomeSlots};
use crate::domain::authentication::Authentication;
use crate::domain::configuration::{Configuration, RealmDescriptor};
use crate::domain::outcome::{more_severe, RealmError};
use crate::domain::transport::RealmTransport;
use crate::error::{ConfigurationError, DeleteError};

struct RealmContext {
    realm: RealmDescriptor,
    token: AuthToken,
}

/// Use case: delete a registered secret from the configured realms
pub struct DeleteUseCase<T> {
    transport: Arc<T>,
}

impl<T> DeleteUseCase<T>
where
    T: RealmTransport + Send + Sync + 'static,
{
    pub fn new(transport: Arc<T>) -> Self {
        Self { transport }
    }

    /// Execute the delete. Succeeds once `register_threshold` realms have
    /// confirmed the secret is gone.
    pub async fn execute(
        &self,
        configuration: &Configuration,
        authentication: &Authentication,
        secret_id: &SecretId,
    ) -> Result<(), DeleteError> {
        configuration.validate()?;
        authentication.ensure_covers(configuration)?;

        let n = configuration.realm_count();
        let threshold = usize::from(configuration.register_threshold);

        let mut contexts = Vec::with_capacity(n);
        for realm in &configuration.realms {
            let token = authentication
                .token_for(&realm.id)
                .cloned()
                .ok_or(ConfigurationError::MissingToken(realm.id))?;
            contexts.push(RealmContext {
                realm: realm.clone(),
                token,
            });
        }

        let transport = Arc::clone(&self.transport);
        let secret_id = *secret_id;
        let mut rx = fan_out(contexts, move |_, ctx| {
            let transport = Arc::clone(&transport);
            async move { transport.delete(&ctx.realm, &ctx.token, &secret_id).await }
        });

        let mut slots = OutcomeSlots::new(n);
        let mut acks = 0usize;
        let mut failures = 0usize;
        let mut worst = None;

        while let Some((index, outcome)) = rx.recv().await {
            if !slots.record(index) {
                continue;
            }
            // Nothing stored means nothing left to delete.
            let outcome = match outcome {
                Err(RealmError::NotRegistered) => Ok(()),
                other => other,
            };
            match outcome {
                Ok(()) => {
                    acks += 1;
                    if acks >= threshold {
                        tracing::info!(
                            secret_id = %secret_id,
                            acks,
                            realms = n,
                            "Delete reached quorum"
                        );
                        return Ok(());
                    }
                }
                Err(err) => {
                    tracing::debug!(
                        realm = %configuration.realms[index].id,
                        error = %err,
                        "Realm rejected delete"
                    );
                    if err.is_fail_fast() {
                        return Err(err.into());
                    }
                    failures += 1;
                    worst = more_severe(worst, err);
                    if failures > n - threshold {
                        let err = worst.take().unwrap_or(RealmError::Assertion);
                        return Err(err.into());
                    }
                }
            }
        }

        tracing::error!(written = slots.written(), "Delete fold exhausted");
        Err(DeleteError::Assertion)
    }
}
