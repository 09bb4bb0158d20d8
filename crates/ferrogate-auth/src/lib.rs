//! Ferrogate Auth — claim decoding, signed-token issuance and
//! verification, MFA policy, and the request-time auth gateway.

pub mod claims;
pub mod config;
pub mod error;
pub mod gateway;
pub mod keys;
pub mod mfa;
pub mod password;
pub mod service;
pub mod token;

pub use claims::{AuthClaims, DeviceClaims, MfaClaims, UserClaims};
pub use config::AuthConfig;
pub use error::AuthError;
pub use gateway::{AuthGateway, CacheHint, Identity};
pub use keys::{KeyProvider, PemKeyProvider};
pub use service::{AuthService, DeviceAuthenticator, PublicKeyAuthenticator};
