//! Back2Use wallet API SDK.
//!
//! Shared wire types for the wallet endpoints used by the deposit flow, and
//! (behind the `client` feature) a typed HTTP client for them.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![forbid(unsafe_code)]

#[cfg(feature = "client")]
pub mod client;
pub mod objects;
