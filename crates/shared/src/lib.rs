//! Shared Kernel - Domain-crossing minimal core
//!
//! This crate contains the "smallest core" of protocol vocabulary:
//! - Typed 16-byte identifiers for realms and secrets
//! - The fixed realm error-code table and its wire parsing rules
//!
//! **Design Principle**: Only include things that are "hard to change"
//! and have consistent meaning across all crates.

pub mod error {
    pub mod code;
}
pub mod id;
