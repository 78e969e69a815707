//! Realm Bearer Tokens
//!
//! Mints the HS256-signed bearer tokens realms accept, one per realm. A
//! token is three URL-safe base64 segments (`header.claims.signature`), the
//! header carrying a `{tenant}:{version}` key id so realms can look up the
//! tenant verification key. Expiry and refresh are owned by the caller;
//! everywhere else in the SDK tokens are opaque strings.

use std::fmt;

use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

use kernel::id::{RealmId, SecretId};

use crate::crypto::{from_base64url, hmac_sha256, to_base64url};

/// Token minting/verification errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// The signing key hex string could not be decoded
    #[error("Invalid signing key: {0}")]
    InvalidKey(String),

    /// Tenant names appear in the key id and must not contain ':'
    #[error("Invalid tenant name: {0}")]
    InvalidTenant(String),

    /// Claims serialization failed
    #[error("Token encoding failed: {0}")]
    Encoding(String),

    /// Token is not three base64 segments
    #[error("Malformed token")]
    Malformed,

    /// Signature did not verify
    #[error("Token signature mismatch")]
    SignatureMismatch,
}

/// An opaque bearer token for a single realm
///
/// Debug output is redacted; a leaked token authorizes guesses against the
/// holder's secret.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthToken(String);

impl AuthToken {
    /// Wrap an externally issued token
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The raw token for an Authorization header
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AuthToken").field(&"[REDACTED]").finish()
    }
}

/// Parameters for signing realm tokens on device
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SigningParameters {
    key: Vec<u8>,
    #[zeroize(skip)]
    tenant: String,
    #[zeroize(skip)]
    version: u32,
}

impl SigningParameters {
    /// Create signing parameters from a hex-encoded private key
    pub fn new(key_hex: &str, tenant: impl Into<String>, version: u32) -> Result<Self, TokenError> {
        let key = hex::decode(key_hex).map_err(|e| TokenError::InvalidKey(e.to_string()))?;
        if key.is_empty() {
            return Err(TokenError::InvalidKey("key is empty".to_string()));
        }
        let tenant = tenant.into();
        if tenant.is_empty() || tenant.contains(':') {
            return Err(TokenError::InvalidTenant(tenant));
        }
        Ok(Self {
            key,
            tenant,
            version,
        })
    }

    /// The tenant this key belongs to
    pub fn tenant(&self) -> &str {
        &self.tenant
    }

    /// The integer version of the signing key
    pub fn version(&self) -> u32 {
        self.version
    }
}

impl fmt::Debug for SigningParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningParameters")
            .field("key", &"[REDACTED]")
            .field("tenant", &self.tenant)
            .field("version", &self.version)
            .finish()
    }
}

#[derive(Serialize, Deserialize)]
struct Header {
    alg: String,
    typ: String,
    kid: String,
}

/// Claims carried by a realm token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Issuer: the tenant name
    pub iss: String,
    /// Subject: the secret id being authorized, hex
    pub sub: String,
    /// Audience: the realm id the token is scoped to, hex
    pub aud: String,
    /// Issued-at, unix seconds
    pub iat: i64,
    /// Expiry, unix seconds
    pub exp: i64,
}

/// Mint a token authorizing operations on `secret_id` against one realm.
///
/// Tokens are realm-scoped via the `aud` claim; a token minted for one
/// realm is rejected by the others.
pub fn mint_realm_token(
    params: &SigningParameters,
    realm_id: &RealmId,
    secret_id: &SecretId,
    lifetime: Duration,
) -> Result<AuthToken, TokenError> {
    let now = Utc::now().timestamp();
    let header = Header {
        alg: "HS256".to_string(),
        typ: "JWT".to_string(),
        kid: format!("{}:{}", params.tenant, params.version),
    };
    let claims = TokenClaims {
        iss: params.tenant.clone(),
        sub: secret_id.to_hex(),
        aud: realm_id.to_hex(),
        iat: now,
        exp: now + lifetime.num_seconds(),
    };

    let header_json =
        serde_json::to_vec(&header).map_err(|e| TokenError::Encoding(e.to_string()))?;
    let claims_json =
        serde_json::to_vec(&claims).map_err(|e| TokenError::Encoding(e.to_string()))?;

    let signing_input = format!(
        "{}.{}",
        to_base64url(&header_json),
        to_base64url(&claims_json)
    );
    let signature = sign(&params.key, signing_input.as_bytes());

    Ok(AuthToken(format!(
        "{}.{}",
        signing_input,
        to_base64url(&signature)
    )))
}

/// Verify a token's signature and decode its claims.
///
/// Expiry is deliberately not enforced here; realms are the authority on
/// token freshness, this is for local inspection and tests.
pub fn verify_realm_token(
    params: &SigningParameters,
    token: &AuthToken,
) -> Result<TokenClaims, TokenError> {
    let mut segments = token.0.split('.');
    let (Some(header), Some(claims), Some(signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(TokenError::Malformed);
    };

    let signing_input = format!("{}.{}", header, claims);
    let provided = from_base64url(signature).map_err(|_| TokenError::Malformed)?;

    let mut mac = Hmac::<Sha256>::new_from_slice(&params.key)
        .map_err(|e| TokenError::InvalidKey(e.to_string()))?;
    mac.update(signing_input.as_bytes());
    mac.verify_slice(&provided)
        .map_err(|_| TokenError::SignatureMismatch)?;

    let claims_json = from_base64url(claims).map_err(|_| TokenError::Malformed)?;
    serde_json::from_slice(&claims_json).map_err(|_| TokenError::Malformed)
}

fn sign(key: &[u8], data: &[u8]) -> Vec<u8> {
    hmac_sha256(key, data).to_vec()
}
