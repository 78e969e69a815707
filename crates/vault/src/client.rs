//! Client Facade
//!
//! The one type applications hold. Generic over the realm transport and
//! secret codec so tests swap in fakes; production callers use
//! [`Client::over_http`] with their codec of choice.

use std::sync::Arc;

use kernel::id::SecretId;
use platform::pin::Pin;
use platform::token::SigningParameters;

use crate::application::delete::DeleteUseCase;
use crate::application::recover::RecoverUseCase;
use crate::application::register::RegisterUseCase;
use crate::domain::authentication::Authentication;
use crate::domain::broker::BrokerError;
use crate::domain::codec::SecretCodec;
use crate::domain::configuration::Configuration;
use crate::domain::secret::UserSecret;
use crate::domain::transport::RealmTransport;
use crate::error::{DeleteError, RecoverError, RegisterError};
use crate::infra::http::HttpRealmTransport;
use crate::infra::tokens::LocalTokenBroker;

/// PIN-protected threshold secret client
pub struct Client<T, C: ?Sized> {
    transport: Arc<T>,
    codec: Arc<C>,
}

impl<T, C: ?Sized> Clone for Client<T, C> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            codec: Arc::clone(&self.codec),
        }
    }
}

impl<C> Client<HttpRealmTransport, C>
where
    C: SecretCodec + ?Sized,
{
    /// Client talking to realms over HTTPS
    pub fn over_http(codec: Arc<C>) -> Self {
        Self::new(Arc::new(HttpRealmTransport::new()), codec)
    }
}

impl<T, C> Client<T, C>
where
    T: RealmTransport + Send + Sync + 'static,
    C: SecretCodec + ?Sized,
{
    /// Client with an explicit transport (tests, custom protocols)
    pub fn new(transport: Arc<T>, codec: Arc<C>) -> Self {
        Self { transport, codec }
    }

    /// Store `secret` across the configured realms, protected by `pin`.
    ///
    /// Registering again under the same secret id replaces the previous
    /// registration and resets every realm's guess counter.
    pub async fn register(
        &self,
        configuration: &Configuration,
        authentication: &Authentication,
        secret_id: &SecretId,
        pin: &Pin,
        secret: &UserSecret,
        info: &[u8],
        num_guesses: u16,
    ) -> Result<(), RegisterError> {
        tracing::info!(secret_id = %secret_id, realms = configuration.realm_count(), "Register");
        RegisterUseCase::new(Arc::clone(&self.transport), Arc::clone(&self.codec))
            .execute(
                configuration,
                authentication,
                secret_id,
                pin,
                secret,
                info,
                num_guesses,
            )
            .await
    }

    /// Recover the secret stored under `secret_id` with its PIN.
    ///
    /// A wrong PIN consumes one guess on every reachable realm.
    pub async fn recover(
        &self,
        configuration: &Configuration,
        authentication: &Authentication,
        secret_id: &SecretId,
        pin: &Pin,
        info: &[u8],
    ) -> Result<UserSecret, RecoverError> {
        tracing::info!(secret_id = %secret_id, realms = configuration.realm_count(), "Recover");
        RecoverUseCase::new(Arc::clone(&self.transport), Arc::clone(&self.codec))
            .execute(configuration, authentication, secret_id, pin, info)
            .await
    }

    /// Delete whatever is stored under `secret_id` on the configured realms
    pub async fn delete(
        &self,
        configuration: &Configuration,
        authentication: &Authentication,
        secret_id: &SecretId,
    ) -> Result<(), DeleteError> {
        tracing::info!(secret_id = %secret_id, realms = configuration.realm_count(), "Delete");
        DeleteUseCase::new(Arc::clone(&self.transport))
            .execute(configuration, authentication, secret_id)
            .await
    }
}

/// Mint a per-realm token map locally with a tenant signing key.
///
/// Development convenience; production apps should fetch tokens from their
/// backend so the signing key never reaches the device.
pub fn create_authentication(
    configuration: &Configuration,
    parameters: SigningParameters,
    secret_id: &SecretId,
) -> Result<Authentication, BrokerError> {
    LocalTokenBroker::new(parameters).issue(configuration, secret_id)
}

/// A fresh random secret id
pub fn random_secret_id() -> SecretId {
    SecretId::random()
}
