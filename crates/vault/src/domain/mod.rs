//! Domain Layer
//!
//! Value objects, traits at the protocol's seams, and the per-realm error
//! taxonomy. No I/O lives here.

pub mod authentication;
pub mod broker;
pub mod codec;
pub mod configuration;
pub mod outcome;
pub mod secret;
pub mod transport;
