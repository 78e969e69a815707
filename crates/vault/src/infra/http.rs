//! HTTP Realm Transport
//!
//! Speaks the realm wire protocol: one POST per operation under `/v1/`,
//! bearer-token auth, JSON bodies with base64 binary fields. All failure
//! modes collapse into [`RealmError`] here; status-line and body-shape
//! detail never leaves this module.

use serde::{Deserialize, Serialize};

use kernel::error::code::{parse_guesses_remaining, RealmErrorCode};
use kernel::id::SecretId;
use platform::crypto::{from_base64url, to_base64url};
use platform::pin::HardenedPin;
use platform::token::AuthToken;

use crate::domain::configuration::RealmDescriptor;
use crate::domain::outcome::RealmError;
use crate::domain::secret::SecretShare;
use crate::domain::transport::RealmTransport;

/// Realm transport over HTTPS
#[derive(Debug, Clone, Default)]
pub struct HttpRealmTransport {
    http: reqwest::Client,
}

impl HttpRealmTransport {
    /// Transport with a default client
    pub fn new() -> Self {
        Self::default()
    }

    /// Transport with a caller-configured client (timeouts, proxies)
    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }

    async fn post<Req: Serialize>(
        &self,
        realm: &RealmDescriptor,
        operation: &str,
        token: &AuthToken,
        body: &Req,
    ) -> Result<reqwest::Response, RealmError> {
        let url = format!("{}/v1/{}", realm.address.trim_end_matches('/'), operation);
        let response = self
            .http
            .post(&url)
            .bearer_auth(token.as_str())
            .json(body)
            .send()
            .await
            .map_err(|err| {
                tracing::debug!(realm = %realm.id, error = %err, "Realm unreachable");
                RealmError::Transient
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let err = map_error_response(status.as_u16(), &body);
        if matches!(err, RealmError::Unknown(_)) {
            tracing::warn!(realm = %realm.id, status = status.as_u16(), "Unknown realm error");
        }
        Err(err)
    }
}

impl RealmTransport for HttpRealmTransport {
    async fn register(
        &self,
        realm: &RealmDescriptor,
        token: &AuthToken,
        secret_id: &SecretId,
        hardened_pin: &HardenedPin,
        share: &SecretShare,
        num_guesses: u16,
    ) -> Result<(), RealmError> {
        let request = RegisterRequest {
            secret_id: secret_id.to_hex(),
            hardened_pin: to_base64url(hardened_pin.as_bytes()),
            share: ShareDto::from(share),
            num_guesses,
        };
        self.post(realm, "register", token, &request).await?;
        Ok(())
    }

    async fn recover(
        &self,
        realm: &RealmDescriptor,
        token: &AuthToken,
        secret_id: &SecretId,
        hardened_pin: &HardenedPin,
    ) -> Result<SecretShare, RealmError> {
        let request = RecoverRequest {
            secret_id: secret_id.to_hex(),
            hardened_pin: to_base64url(hardened_pin.as_bytes()),
        };
        let response = self.post(realm, "recover", token, &request).await?;
        let body: RecoverResponse = response.json().await.map_err(|err| {
            tracing::warn!(realm = %realm.id, error = %err, "Malformed recover response");
            RealmError::Assertion
        })?;
        body.share.try_into()
    }

    async fn delete(
        &self,
        realm: &RealmDescriptor,
        token: &AuthToken,
        secret_id: &SecretId,
    ) -> Result<(), RealmError> {
        let request = DeleteRequest {
            secret_id: secret_id.to_hex(),
        };
        self.post(realm, "delete", token, &request).await?;
        Ok(())
    }
}

// ============================================================
// Wire shapes
// ============================================================

#[derive(Serialize)]
struct RegisterRequest {
    secret_id: String,
    hardened_pin: String,
    share: ShareDto,
    num_guesses: u16,
}

#[derive(Serialize)]
struct RecoverRequest {
    secret_id: String,
    hardened_pin: String,
}

#[derive(Deserialize)]
struct RecoverResponse {
    share: ShareDto,
}

#[derive(Serialize)]
struct DeleteRequest {
    secret_id: String,
}

#[derive(Serialize, Deserialize)]
struct ShareDto {
    index: u8,
    data: String,
}

impl From<&SecretShare> for ShareDto {
    fn from(share: &SecretShare) -> Self {
        Self {
            index: share.index,
            data: to_base64url(&share.data),
        }
    }
}

impl TryFrom<ShareDto> for SecretShare {
    type Error = RealmError;

    fn try_from(dto: ShareDto) -> Result<Self, RealmError> {
        let data = from_base64url(&dto.data)
            .map_err(|_| RealmError::Unknown("share data is not base64".to_string()))?;
        Ok(SecretShare {
            index: dto.index,
            data,
        })
    }
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
    #[serde(rename = "guessesRemaining")]
    guesses_remaining: Option<u16>,
}

/// Map an error status and body to a [`RealmError`].
///
/// Precedence: a structured `{"error": ..., "guessesRemaining": ...}` body,
/// then the legacy free-text guesses form, then the HTTP status class.
fn map_error_response(status: u16, body: &str) -> RealmError {
    if let Ok(parsed) = serde_json::from_str::<ErrorResponse>(body) {
        if let Some(code) = RealmErrorCode::parse(&parsed.error) {
            return RealmError::from_code(code, parsed.guesses_remaining);
        }
        if let Some(remaining) = parse_guesses_remaining(&parsed.error) {
            return RealmError::InvalidPin {
                guesses_remaining: remaining,
            };
        }
        return RealmError::Unknown(parsed.error);
    }

    if let Some(remaining) = parse_guesses_remaining(body) {
        return RealmError::InvalidPin {
            guesses_remaining: remaining,
        };
    }

    match status {
        401 | 403 => RealmError::InvalidAuth,
        426 => RealmError::UpgradeRequired,
        408 | 429 => RealmError::Transient,
        500..=599 => RealmError::Transient,
        _ => RealmError::Unknown(format!("HTTP {status}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structured_error_body() {
        assert_eq!(
            map_error_response(400, r#"{"error": "NOT_REGISTERED"}"#),
            RealmError::NotRegistered
        );
        assert_eq!(
            map_error_response(400, r#"{"error": "invalidAuth"}"#),
            RealmError::InvalidAuth
        );
        assert_eq!(
            map_error_response(403, r#"{"error": "INVALID_PIN", "guessesRemaining": 2}"#),
            RealmError::InvalidPin {
                guesses_remaining: 2
            }
        );
    }

    #[test]
    fn test_invalid_pin_without_count_is_unknown() {
        assert!(matches!(
            map_error_response(403, r#"{"error": "INVALID_PIN"}"#),
            RealmError::Unknown(_)
        ));
    }

    #[test]
    fn test_legacy_free_text_guesses() {
        assert_eq!(
            map_error_response(403, r#"{"error": "guessesRemaining: 3"}"#),
            RealmError::InvalidPin {
                guesses_remaining: 3
            }
        );
        assert_eq!(
            map_error_response(403, "guessesRemaining: 0"),
            RealmError::InvalidPin {
                guesses_remaining: 0
            }
        );
    }

    #[test]
    fn test_unknown_code_is_surfaced_not_coerced() {
        assert_eq!(
            map_error_response(400, r#"{"error": "QUOTA_EXCEEDED"}"#),
            RealmError::Unknown("QUOTA_EXCEEDED".to_string())
        );
    }

    #[test]
    fn test_status_fallbacks() {
        assert_eq!(map_error_response(401, ""), RealmError::InvalidAuth);
        assert_eq!(map_error_response(403, ""), RealmError::InvalidAuth);
        assert_eq!(map_error_response(426, ""), RealmError::UpgradeRequired);
        assert_eq!(map_error_response(429, ""), RealmError::Transient);
        assert_eq!(map_error_response(503, ""), RealmError::Transient);
        assert_eq!(
            map_error_response(418, ""),
            RealmError::Unknown("HTTP 418".to_string())
        );
    }

    #[test]
    fn test_share_dto_roundtrip() {
        let share = SecretShare {
            index: 3,
            data: vec![1, 2, 3, 4],
        };
        let dto = ShareDto::from(&share);
        let back: SecretShare = dto.try_into().unwrap();
        assert_eq!(back, share);
    }
}
