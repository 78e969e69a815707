//! Vault - PIN-protected threshold secret client
//!
//! Client-side orchestrator for storing a small secret behind a short PIN,
//! split across several independent realms. A quorum of realms must
//! cooperate to register or recover the secret, and every realm
//! independently rate-limits guesses against its own share, so the secret
//! is neither held nor brute-forceable anywhere.
//!
//! Clean Architecture structure:
//! - `domain/` - Configuration, secret/share value objects, realm transport
//!   and secret codec traits, per-realm error taxonomy
//! - `application/` - Register/recover/delete coordinators and the
//!   concurrent fan-out machinery
//! - `infra/` - HTTP realm transport, token brokers
//!
//! ## Security Model
//! - PINs are hardened (Argon2id) before anything touches the network
//! - Secrets, PINs, hardened PINs and tokens are zeroized and never logged
//! - Each realm sees one share and its own bearer token, nothing else
//! - No cross-realm atomicity: a failed registration may leave shares on
//!   realms that acked; a best-effort rollback delete mitigates this

pub mod application;
pub mod client;
pub mod domain;
pub mod error;
pub mod infra;

// Re-exports for convenience
pub use client::{create_authentication, random_secret_id, Client};
pub use domain::authentication::Authentication;
pub use domain::broker::{AuthenticationBroker, BrokerError};
pub use domain::codec::{CodecError, SecretCodec};
pub use domain::configuration::{Configuration, RealmDescriptor};
pub use domain::outcome::RealmError;
pub use domain::secret::{SecretShare, UserSecret, MAX_USER_SECRET_LENGTH};
pub use domain::transport::RealmTransport;
pub use error::{ConfigurationError, DeleteError, RecoverError, RegisterError};
pub use infra::http::HttpRealmTransport;
pub use infra::tokens::{LocalTokenBroker, RemoteTokenBroker};

// Re-export the identifier and hardening vocabulary callers need
pub use kernel::id::{RealmId, SecretId};
pub use platform::pin::{Pin, PinHashingMode};
pub use platform::token::{AuthToken, SigningParameters};

#[cfg(test)]
mod tests;
