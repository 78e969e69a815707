//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Cryptographic utilities (SHA-256, HMAC, Base64)
//! - PIN hardening (Argon2id, deterministic and domain-separated)
//! - Bearer token minting for realm authentication (HS256)

pub mod crypto;
pub mod pin;
pub mod token;
