//! Application Layer
//!
//! One coordinator per facade operation, each following the same shape:
//! validate, prepare per-realm contexts, fan out concurrently, fold
//! outcomes as they arrive, decide at quorum. Late responses are ignored.

pub mod delete;
pub(crate) mod fanout;
pub mod recover;
pub mod register;
