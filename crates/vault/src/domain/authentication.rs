//! Per-realm Authentication Material
//!
//! A realm only honors tokens scoped to itself, so every operation carries
//! one token per realm rather than a single shared credential.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use kernel::id::RealmId;
use platform::token::AuthToken;

use crate::domain::configuration::Configuration;
use crate::error::ConfigurationError;

/// A map from realm id to the token authenticating the client to that realm
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Authentication {
    tokens: HashMap<RealmId, AuthToken>,
}

impl Authentication {
    /// An empty token map
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the token for one realm
    pub fn insert(&mut self, realm_id: RealmId, token: AuthToken) {
        self.tokens.insert(realm_id, token);
    }

    /// The token for one realm, if present
    pub fn token_for(&self, realm_id: &RealmId) -> Option<&AuthToken> {
        self.tokens.get(realm_id)
    }

    /// Number of realms covered
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether no tokens are present
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Verify a token exists for every realm in `configuration`.
    ///
    /// Tokens for realms outside the configuration are ignored. Checked
    /// before any network traffic so a partial token map never produces a
    /// partial fan-out.
    pub fn ensure_covers(&self, configuration: &Configuration) -> Result<(), ConfigurationError> {
        for realm in &configuration.realms {
            if !self.tokens.contains_key(&realm.id) {
                return Err(ConfigurationError::MissingToken(realm.id));
            }
        }
        Ok(())
    }
}

impl FromIterator<(RealmId, AuthToken)> for Authentication {
    fn from_iter<I: IntoIterator<Item = (RealmId, AuthToken)>>(iter: I) -> Self {
        Self {
            tokens: iter.into_iter().collect(),
        }
    }
}
