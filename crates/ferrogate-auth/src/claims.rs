//! Typed token claims and the claim codec.
//!
//! A verified token carries an untyped claim bag. The codec validates
//! the `claims` discriminator first and then decodes into exactly one
//! typed variant, rejecting unknown fields instead of ignoring them.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;

/// Discriminator value of a user-scoped token.
pub const USER_TOKEN: &str = "user";
/// Discriminator value of a device-scoped token.
pub const DEVICE_TOKEN: &str = "device";

/// MFA sub-record carried by user tokens.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct MfaClaims {
    /// Whether MFA was required for this subject when the token was
    /// issued.
    pub status: bool,
    /// Whether the subject has completed an MFA challenge on this
    /// token.
    pub validated: bool,
}

/// Claims carried by a user-scoped token.
///
/// An empty `tenant_id` is a valid, distinguished state: a "bare"
/// token not scoped to any namespace, good only for acting on the
/// subject's own profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserClaims {
    /// Discriminator, always [`USER_TOKEN`].
    pub claims: String,
    /// Subject — user ID (UUID string).
    pub sub: String,
    /// Tenant the token is scoped to; empty for a bare token.
    #[serde(default)]
    pub tenant_id: String,
    pub username: String,
    /// Role the subject holds in the tenant; empty for a bare token.
    #[serde(default)]
    pub role: String,
    pub mfa: MfaClaims,
    /// Issuer.
    pub iss: String,
    /// Issued-at (Unix timestamp).
    pub iat: i64,
    /// Expiration (Unix timestamp).
    pub exp: i64,
    /// Unique token ID (UUID string).
    pub jti: String,
}

impl UserClaims {
    pub fn new(
        user_id: Uuid,
        tenant_id: Option<Uuid>,
        username: &str,
        role: &str,
        mfa: MfaClaims,
        config: &AuthConfig,
    ) -> Self {
        let now = Utc::now().timestamp();
        Self {
            claims: USER_TOKEN.into(),
            sub: user_id.to_string(),
            tenant_id: tenant_id.map(|t| t.to_string()).unwrap_or_default(),
            username: username.into(),
            role: role.into(),
            mfa,
            iss: config.issuer.clone(),
            iat: now,
            exp: now + config.token_lifetime_secs as i64,
            jti: Uuid::new_v4().to_string(),
        }
    }
}

/// Claims carried by a device-scoped token. Minimal on purpose:
/// authorization for device operations is derived downstream from the
/// UID.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeviceClaims {
    /// Discriminator, always [`DEVICE_TOKEN`].
    pub claims: String,
    pub uid: String,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

impl DeviceClaims {
    pub fn new(uid: &str, config: &AuthConfig) -> Self {
        let now = Utc::now().timestamp();
        Self {
            claims: DEVICE_TOKEN.into(),
            uid: uid.into(),
            iss: config.issuer.clone(),
            iat: now,
            exp: now + config.token_lifetime_secs as i64,
            jti: Uuid::new_v4().to_string(),
        }
    }
}

/// The two claim variants a verified token can decode into. Exactly
/// one variant per token.
#[derive(Debug, Clone)]
pub enum AuthClaims {
    User(UserClaims),
    Device(DeviceClaims),
}

/// Decode a verified claim bag into a typed variant.
///
/// An unknown or absent discriminator is Unauthorized with no cause; a
/// bag that names a known variant but fails to decode is a claim-shape
/// (wiring) error, since only this service issues these tokens.
pub fn decode(bag: &Value) -> Result<AuthClaims, AuthError> {
    match bag.get("claims").and_then(Value::as_str) {
        Some(USER_TOKEN) => serde_json::from_value(bag.clone())
            .map(AuthClaims::User)
            .map_err(|e| AuthError::ClaimShape(e.to_string())),
        Some(DEVICE_TOKEN) => serde_json::from_value(bag.clone())
            .map(AuthClaims::Device)
            .map_err(|e| AuthError::ClaimShape(e.to_string())),
        _ => Err(AuthError::unauthorized()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user_bag() -> Value {
        json!({
            "claims": "user",
            "sub": "8f7b1f0e-6d52-4f4e-9a10-0a2b3c4d5e6f",
            "tenant_id": "00000000-0000-4000-0000-000000000000",
            "username": "john_doe",
            "role": "owner",
            "mfa": { "status": false, "validated": false },
            "iss": "ferrogate",
            "iat": 1_700_000_000,
            "exp": 1_700_259_200,
            "jti": "b67c4a5e-9a3f-4a01-8c9d-1e2f3a4b5c6d",
        })
    }

    #[test]
    fn decodes_user_variant() {
        let decoded = decode(&user_bag()).unwrap();
        match decoded {
            AuthClaims::User(c) => {
                assert_eq!(c.username, "john_doe");
                assert_eq!(c.role, "owner");
                assert!(!c.mfa.status);
            }
            AuthClaims::Device(_) => panic!("expected user claims"),
        }
    }

    #[test]
    fn decodes_device_variant() {
        let bag = json!({
            "claims": "device",
            "uid": "2300230e3ca2f637636b4d025d2235269014865db5204b6d115386cbee89809c",
            "iss": "ferrogate",
            "iat": 1_700_000_000,
            "exp": 1_700_259_200,
            "jti": "b67c4a5e-9a3f-4a01-8c9d-1e2f3a4b5c6d",
        });

        match decode(&bag).unwrap() {
            AuthClaims::Device(c) => assert!(c.uid.starts_with("2300230e")),
            AuthClaims::User(_) => panic!("expected device claims"),
        }
    }

    #[test]
    fn unknown_discriminator_is_unauthorized() {
        let mut bag = user_bag();
        bag["claims"] = json!("admin");
        assert!(matches!(
            decode(&bag),
            Err(AuthError::Unauthorized { cause: None })
        ));
    }

    #[test]
    fn missing_discriminator_is_unauthorized() {
        let mut bag = user_bag();
        bag.as_object_mut().unwrap().remove("claims");
        assert!(matches!(decode(&bag), Err(AuthError::Unauthorized { .. })));
    }

    #[test]
    fn shape_mismatch_is_a_wiring_error() {
        let mut bag = user_bag();
        bag.as_object_mut().unwrap().remove("username");
        assert!(matches!(decode(&bag), Err(AuthError::ClaimShape(_))));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let mut bag = user_bag();
        bag["smuggled"] = json!("value");
        assert!(matches!(decode(&bag), Err(AuthError::ClaimShape(_))));
    }

    #[test]
    fn empty_tenant_defaults_on_decode() {
        let mut bag = user_bag();
        bag.as_object_mut().unwrap().remove("tenant_id");
        bag.as_object_mut().unwrap().remove("role");

        match decode(&bag).unwrap() {
            AuthClaims::User(c) => {
                assert!(c.tenant_id.is_empty());
                assert!(c.role.is_empty());
            }
            AuthClaims::Device(_) => panic!("expected user claims"),
        }
    }
}
