//! Infrastructure Layer
//!
//! Concrete implementations of the domain seams: an HTTP realm transport
//! and the local/remote token brokers.

pub mod http;
pub mod tokens;
