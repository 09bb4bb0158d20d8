//! Multi-factor policy: the claim gate, the exemption list, and TOTP
//! enrollment with AES-256-GCM secret encryption.

use std::collections::HashSet;

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use totp_rs::{Algorithm, Secret, TOTP};

use crate::error::AuthError;

// ---------------------------------------------------------------------------
// Claim gate
// ---------------------------------------------------------------------------

/// Compare the claimed MFA-required state against the authoritative
/// one. Pure and side-effect free, so the gateway can also call it
/// for exemption probes.
///
/// The rejection is deliberately one-sided: a mismatch only fails when
/// the authoritative state says MFA is NOT required. The opposite
/// mismatch (required authoritatively, claim says otherwise) passes
/// here and is caught by the validated-MFA enforcement downstream.
pub fn check_claim(authoritative: bool, claimed: bool) -> Result<(), AuthError> {
    if authoritative != claimed && !authoritative {
        return Err(AuthError::unauthorized_with("MFA enablement required"));
    }
    Ok(())
}

/// Routes exempt from the "must have validated MFA" gate: the MFA
/// management endpoints themselves, which a user mid-enrollment must
/// be able to reach.
#[derive(Debug, Clone)]
pub struct MfaExemptions {
    routes: HashSet<String>,
}

impl Default for MfaExemptions {
    fn default() -> Self {
        Self {
            routes: [
                "/api/mfa/generate",
                "/api/mfa/enable",
                "/api/mfa/disable",
                "/api/mfa/recovery",
                "/api/mfa/auth",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

impl MfaExemptions {
    pub fn new(routes: impl IntoIterator<Item = String>) -> Self {
        Self {
            routes: routes.into_iter().collect(),
        }
    }

    pub fn is_exempt(&self, path: &str) -> bool {
        self.routes.contains(path)
    }

    /// Whether a request on `path` must be rejected given the caller's
    /// MFA claim state. Exempt routes always pass; elsewhere a subject
    /// with MFA required must have validated it.
    pub fn enforce(&self, path: &str, status: bool, validated: bool) -> Result<(), AuthError> {
        if self.is_exempt(path) {
            return Ok(());
        }
        if status && !validated {
            return Err(AuthError::unauthorized());
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// TOTP enrollment
// ---------------------------------------------------------------------------

// RFC 6238 defaults: SHA1, 6 digits, 30 s step, ±1 step skew.
fn totp_for(secret_bytes: Vec<u8>, issuer: &str, account: &str) -> Result<TOTP, AuthError> {
    TOTP::new(
        Algorithm::SHA1,
        6,
        1,
        30,
        secret_bytes,
        Some(issuer.to_string()),
        account.to_string(),
    )
    .map_err(|e| AuthError::Crypto(format!("TOTP init: {e}")))
}

/// Generate a TOTP enrollment for an account.
///
/// Returns `(base32_secret, otpauth_uri)` — the URI is what the
/// authenticator app scans.
pub fn generate_enrollment(issuer: &str, account: &str) -> Result<(String, String), AuthError> {
    let secret = Secret::generate_secret();
    let secret_bytes = secret
        .to_bytes()
        .map_err(|e| AuthError::Crypto(format!("secret bytes: {e}")))?;

    let totp = totp_for(secret_bytes, issuer, account)?;

    Ok((secret.to_encoded().to_string(), totp.get_url()))
}

/// Verify a TOTP code against a base32-encoded secret.
pub fn verify_code(
    base32_secret: &str,
    code: &str,
    issuer: &str,
    account: &str,
) -> Result<bool, AuthError> {
    let secret_bytes = Secret::Encoded(base32_secret.to_string())
        .to_bytes()
        .map_err(|e| AuthError::Crypto(format!("secret bytes: {e}")))?;

    totp_for(secret_bytes, issuer, account)?
        .check_current(code)
        .map_err(|e| AuthError::Crypto(format!("TOTP check: {e}")))
}

// ---------------------------------------------------------------------------
// Secret encryption at rest
// ---------------------------------------------------------------------------

/// AES-256-GCM cipher for TOTP secrets stored on the user record.
/// Ciphertext wire format: `base64(nonce || ciphertext || tag)`.
pub struct SecretCipher {
    key: [u8; 32],
}

impl SecretCipher {
    pub fn new(key: [u8; 32]) -> Self {
        Self { key }
    }

    pub fn seal(&self, plaintext: &[u8]) -> Result<String, AuthError> {
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.key));
        let mut nonce_bytes = [0u8; 12];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext)
            .map_err(|e| AuthError::Crypto(format!("AES-GCM encrypt: {e}")))?;

        let mut combined = nonce_bytes.to_vec();
        combined.extend_from_slice(&ciphertext);
        Ok(STANDARD.encode(combined))
    }

    pub fn open(&self, encoded: &str) -> Result<Vec<u8>, AuthError> {
        let combined = STANDARD
            .decode(encoded)
            .map_err(|e| AuthError::Crypto(format!("base64 decode: {e}")))?;

        if combined.len() < 13 {
            return Err(AuthError::Crypto("ciphertext too short".into()));
        }

        let (nonce_bytes, ciphertext) = combined.split_at(12);
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.key));

        cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|e| AuthError::Crypto(format!("AES-GCM decrypt: {e}")))
    }
}
