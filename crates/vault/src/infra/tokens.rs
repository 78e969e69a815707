//! Token Brokers
//!
//! Two sources of per-realm bearer tokens: local minting with a tenant
//! signing key (development, backend-side use), and a remote token-vending
//! endpoint (production apps, where the signing key never ships to the
//! device).

use chrono::Duration;
use serde::{Deserialize, Serialize};

use kernel::id::SecretId;
use platform::token::{mint_realm_token, AuthToken, SigningParameters};

use crate::domain::authentication::Authentication;
use crate::domain::broker::{AuthenticationBroker, BrokerError};
use crate::domain::configuration::Configuration;

/// Default token lifetime; long enough for any single operation
const DEFAULT_LIFETIME_MINUTES: i64 = 10;

/// Mints realm tokens locally with a tenant signing key
pub struct LocalTokenBroker {
    parameters: SigningParameters,
    lifetime: Duration,
}

impl LocalTokenBroker {
    /// Broker with the default token lifetime
    pub fn new(parameters: SigningParameters) -> Self {
        Self {
            parameters,
            lifetime: Duration::minutes(DEFAULT_LIFETIME_MINUTES),
        }
    }

    /// Broker with an explicit token lifetime
    pub fn with_lifetime(parameters: SigningParameters, lifetime: Duration) -> Self {
        Self {
            parameters,
            lifetime,
        }
    }

    /// Mint one token per realm, scoped to `secret_id`.
    ///
    /// Synchronous: local signing involves no I/O.
    pub fn issue(
        &self,
        configuration: &Configuration,
        secret_id: &SecretId,
    ) -> Result<Authentication, BrokerError> {
        let mut authentication = Authentication::new();
        for realm in &configuration.realms {
            let token = mint_realm_token(&self.parameters, &realm.id, secret_id, self.lifetime)?;
            authentication.insert(realm.id, token);
        }
        Ok(authentication)
    }
}

impl AuthenticationBroker for LocalTokenBroker {
    async fn authenticate(
        &self,
        configuration: &Configuration,
        secret_id: &SecretId,
    ) -> Result<Authentication, BrokerError> {
        self.issue(configuration, secret_id)
    }
}

/// Fetches realm tokens from a tenant token-vending endpoint
pub struct RemoteTokenBroker {
    http: reqwest::Client,
    endpoint: String,
    credential: String,
}

impl RemoteTokenBroker {
    /// `endpoint` is POSTed once per realm; `credential` authenticates the
    /// client (or its user session) to the tenant backend.
    pub fn new(endpoint: impl Into<String>, credential: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            credential: credential.into(),
        }
    }
}

#[derive(Serialize)]
struct TokenRequest {
    realm: String,
    secret: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    token: String,
}

impl AuthenticationBroker for RemoteTokenBroker {
    async fn authenticate(
        &self,
        configuration: &Configuration,
        secret_id: &SecretId,
    ) -> Result<Authentication, BrokerError> {
        let mut authentication = Authentication::new();
        for realm in &configuration.realms {
            let request = TokenRequest {
                realm: realm.id.to_hex(),
                secret: secret_id.to_hex(),
            };
            let response = self
                .http
                .post(&self.endpoint)
                .bearer_auth(&self.credential)
                .json(&request)
                .send()
                .await
                .map_err(|err| BrokerError::Endpoint(err.to_string()))?;

            if !response.status().is_success() {
                return Err(BrokerError::Endpoint(format!(
                    "token endpoint answered {} for realm {}",
                    response.status(),
                    realm.id
                )));
            }

            let body: TokenResponse = response
                .json()
                .await
                .map_err(|err| BrokerError::MalformedResponse(err.to_string()))?;
            authentication.insert(realm.id, AuthToken::new(body.token));
        }
        Ok(authentication)
    }
}
