//! Authentication Broker Trait
//!
//! Produces the per-realm token map for one secret id. Local signing and
//! remote token-vending services both implement this seam.

use thiserror::Error;

use kernel::id::SecretId;
use platform::token::TokenError;

use crate::domain::authentication::Authentication;
use crate::domain::configuration::Configuration;

/// Broker failures
#[derive(Debug, Error)]
pub enum BrokerError {
    /// Local signing failed
    #[error("token signing failed: {0}")]
    Signing(#[from] TokenError),

    /// A token endpoint was unreachable or rejected the request
    #[error("token endpoint failure: {0}")]
    Endpoint(String),

    /// A token endpoint answered with an unparseable body
    #[error("malformed token response: {0}")]
    MalformedResponse(String),
}

/// Source of per-realm authentication tokens
#[trait_variant::make(AuthenticationBroker: Send)]
pub trait LocalAuthenticationBroker {
    /// Produce one token per realm in `configuration`, scoped to `secret_id`
    async fn authenticate(
        &self,
        configuration: &Configuration,
        secret_id: &SecretId,
    ) -> Result<Authentication, BrokerError>;
}
