//! SurrealDB store implementations.

mod device;
mod namespace;
mod public_key;
mod recording;
mod session;
mod user;

pub use device::SurrealDeviceStore;
pub use namespace::SurrealNamespaceStore;
pub use public_key::SurrealPublicKeyStore;
pub use recording::SurrealRecordingStore;
pub use session::SurrealSessionStore;
pub use user::SurrealUserStore;
