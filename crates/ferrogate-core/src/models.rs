//! Domain models for Ferrogate.
//!
//! These are the core types shared across all crates.

pub mod device;
pub mod namespace;
pub mod position;
pub mod public_key;
pub mod recording;
pub mod session;
pub mod user;
