//! PIN Hardening
//!
//! Turns a raw, low-entropy PIN into a fixed 32-byte hardened value before
//! anything touches the network, with:
//! - Argon2id hashing (memory-hard, recommended by OWASP)
//! - Deterministic, domain-separated salting from caller context
//! - Zeroization of sensitive data
//!
//! Determinism is part of the contract: the same `(pin, info, mode)` must
//! reproduce the same hardened value so recovery matches registration, and
//! callers can safely retry with identical inputs.

use std::fmt;

use argon2::{Algorithm, Argon2, Params, Version};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::crypto::sha256;

/// Length in bytes of a hardened PIN
pub const HARDENED_PIN_LENGTH: usize = 32;

/// Domain separation tag mixed into every hardening salt
const SALT_DOMAIN: &[u8] = b"vault pin hardening v1";

/// Domain separation tag for the fast (test-only) mode
const FAST_DOMAIN: &[u8] = b"vault pin fast-insecure v1";

// OWASP recommended Argon2id parameters:
// m=19456 (19 MiB), t=2, p=1
const ARGON2_M_COST: u32 = 19_456;
const ARGON2_T_COST: u32 = 2;
const ARGON2_P_COST: u32 = 1;

/// Defines how a PIN is hashed before register and recover operations.
///
/// Changing modes between registration and recovery produces a different
/// hardened value and therefore behaves as an incorrect PIN; secrets stored
/// under the old mode become inaccessible without re-registering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PinHashingMode {
    /// A tuned memory-hard hash, secure for low-entropy PINs on modern devices
    Standard2019,
    /// A fast hash used for testing. Do not use in production.
    FastInsecure,
}

/// PIN hardening errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HardenError {
    /// PIN must contain at least one byte
    #[error("PIN cannot be empty")]
    EmptyPin,

    /// The underlying hash function rejected its inputs
    #[error("PIN hardening failed: {0}")]
    HashingFailed(String),
}

/// Raw user PIN with automatic memory zeroization
///
/// The raw PIN is never transmitted or logged; it exists only long enough
/// to be hardened.
///
/// ## Security
/// - Implements `Zeroize` and `ZeroizeOnDrop`
/// - Does not implement `Clone` to prevent accidental copies
/// - Debug output is redacted
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Pin(Vec<u8>);

impl Pin {
    /// Create a new PIN from raw bytes
    ///
    /// Low entropy is acceptable (that is the point of hardening), but an
    /// empty PIN is rejected as a caller mistake.
    pub fn new(raw: Vec<u8>) -> Result<Self, HardenError> {
        if raw.is_empty() {
            return Err(HardenError::EmptyPin);
        }
        Ok(Self(raw))
    }

    /// Get the PIN as bytes for hardening
    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pin").field(&"[REDACTED]").finish()
    }
}

/// Hardened PIN value, safe to send to realms
///
/// Deterministic function of `(pin, info, mode)`. Still treated as secret
/// material: zeroized on drop, redacted Debug.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct HardenedPin([u8; HARDENED_PIN_LENGTH]);

impl HardenedPin {
    /// Get the hardened bytes for the wire
    pub fn as_bytes(&self) -> &[u8; HARDENED_PIN_LENGTH] {
        &self.0
    }

    /// Reconstruct from raw bytes (e.g., a wire payload)
    pub fn from_bytes(bytes: [u8; HARDENED_PIN_LENGTH]) -> Self {
        Self(bytes)
    }
}

impl fmt::Debug for HardenedPin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("HardenedPin").field(&"[REDACTED]").finish()
    }
}

/// Harden a PIN for the given context.
///
/// `info` is arbitrary caller context (a user id, or even a service name)
/// mixed into the salt so two applications hardening the same PIN produce
/// unlinkable values. It must be identical between registration and
/// recovery or recovery behaves as a wrong PIN.
pub fn harden(
    pin: &Pin,
    mode: PinHashingMode,
    info: &[u8],
) -> Result<HardenedPin, HardenError> {
    match mode {
        PinHashingMode::Standard2019 => harden_standard_2019(pin, info),
        PinHashingMode::FastInsecure => Ok(harden_fast_insecure(pin, info)),
    }
}

/// Argon2id with a salt derived deterministically from the context info
fn harden_standard_2019(pin: &Pin, info: &[u8]) -> Result<HardenedPin, HardenError> {
    let salt = derive_salt(info);

    let params = Params::new(
        ARGON2_M_COST,
        ARGON2_T_COST,
        ARGON2_P_COST,
        Some(HARDENED_PIN_LENGTH),
    )
    .map_err(|e| HardenError::HashingFailed(e.to_string()))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut output = [0u8; HARDENED_PIN_LENGTH];
    argon2
        .hash_password_into(pin.as_bytes(), &salt, &mut output)
        .map_err(|e| HardenError::HashingFailed(e.to_string()))?;

    Ok(HardenedPin(output))
}

/// Single SHA-256 pass. Cheap by design; test configurations only.
fn harden_fast_insecure(pin: &Pin, info: &[u8]) -> HardenedPin {
    let mut input = Vec::with_capacity(FAST_DOMAIN.len() + 4 + info.len() + pin.as_bytes().len());
    input.extend_from_slice(FAST_DOMAIN);
    input.extend_from_slice(&(info.len() as u32).to_be_bytes());
    input.extend_from_slice(info);
    input.extend_from_slice(pin.as_bytes());
    let digest = sha256(&input);
    input.zeroize();
    HardenedPin(digest)
}

/// Derive a 16-byte Argon2 salt from the domain tag and context info.
///
/// Length-prefixing keeps `(tag, info)` concatenation unambiguous.
fn derive_salt(info: &[u8]) -> [u8; 16] {
    let mut input = Vec::with_capacity(SALT_DOMAIN.len() + 4 + info.len());
    input.extend_from_slice(SALT_DOMAIN);
    input.extend_from_slice(&(info.len() as u32).to_be_bytes());
    input.extend_from_slice(info);
    let digest = sha256(&input);

    let mut salt = [0u8; 16];
    salt.copy_from_slice(&digest[..16]);
    salt
}
