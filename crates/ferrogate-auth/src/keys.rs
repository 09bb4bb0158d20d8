//! Signing-key access as a narrow capability.
//!
//! The token codec takes a [`KeyProvider`] instead of reaching back
//! into the service that is itself gated by token verification, so the
//! verifier has no circular dependency on the surface it protects.

use jsonwebtoken::{DecodingKey, EncodingKey};

use crate::error::AuthError;

/// Provides the Ed25519 key pair used to sign and verify tokens.
pub trait KeyProvider: Send + Sync {
    fn encoding_key(&self) -> Result<EncodingKey, AuthError>;
    fn decoding_key(&self) -> Result<DecodingKey, AuthError>;
}

/// Key provider backed by in-memory PEM material.
#[derive(Debug, Clone)]
pub struct PemKeyProvider {
    private_key_pem: String,
    public_key_pem: String,
}

impl PemKeyProvider {
    pub fn new(private_key_pem: impl Into<String>, public_key_pem: impl Into<String>) -> Self {
        Self {
            private_key_pem: private_key_pem.into(),
            public_key_pem: public_key_pem.into(),
        }
    }
}

impl KeyProvider for PemKeyProvider {
    fn encoding_key(&self) -> Result<EncodingKey, AuthError> {
        EncodingKey::from_ed_pem(self.private_key_pem.as_bytes())
            .map_err(|e| AuthError::Crypto(format!("bad private key: {e}")))
    }

    fn decoding_key(&self) -> Result<DecodingKey, AuthError> {
        DecodingKey::from_ed_pem(self.public_key_pem.as_bytes())
            .map_err(|e| AuthError::Crypto(format!("bad public key: {e}")))
    }
}
