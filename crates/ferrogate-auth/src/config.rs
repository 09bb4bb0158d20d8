//! Authentication configuration.

/// Configuration for token issuance and MFA policy.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// JWT issuer (`iss` claim).
    pub issuer: String,
    /// Token lifetime in seconds (default: 259_200 = 72 hours).
    pub token_lifetime_secs: u64,
    /// Optional pepper prepended to passwords before Argon2id
    /// verification.
    pub pepper: Option<String>,
    /// 256-bit AES-GCM key for encrypting TOTP secrets at rest.
    /// `None` disables MFA enrollment.
    pub mfa_encryption_key: Option<[u8; 32]>,
    /// Issuer name shown in authenticator apps.
    pub totp_issuer: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            issuer: "ferrogate".into(),
            token_lifetime_secs: 259_200,
            pepper: None,
            mfa_encryption_key: None,
            totp_issuer: "Ferrogate".into(),
        }
    }
}
