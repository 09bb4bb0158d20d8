//! Ferrogate Core — domain models, store trait definitions, and the
//! token revocation cache.
//!
//! This crate is dependency-light by design: the auth and persistence
//! crates both build on it without depending on each other.

pub mod cache;
pub mod error;
pub mod models;
pub mod store;

pub use error::{FerrogateError, FerrogateResult};
