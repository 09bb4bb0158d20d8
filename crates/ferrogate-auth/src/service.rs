//! Authentication services: user login and token exchange, device and
//! public-key authentication, MFA management.
//!
//! Services are generic over the store traits so this crate carries no
//! dependency on the persistence crate.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use sha2::{Digest, Sha256};
use tracing::info;
use uuid::Uuid;

use ferrogate_core::cache::RevocationCache;
use ferrogate_core::error::{FerrogateError, FerrogateResult};
use ferrogate_core::models::device::NewDevice;
use ferrogate_core::models::position::Position;
use ferrogate_core::models::user::User;
use ferrogate_core::store::{DeviceStore, NamespaceStore, PublicKeyStore, UserStore};

use crate::claims::{DeviceClaims, MfaClaims, UserClaims};
use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::keys::KeyProvider;
use crate::mfa::{self, SecretCipher};
use crate::password;
use crate::token;

/// Result of a successful user authentication or token exchange.
#[derive(Debug, Clone)]
pub struct UserAuthOutput {
    /// Signed user token.
    pub token: String,
    pub id: Uuid,
    pub username: String,
    pub email: String,
    /// Tenant the token is scoped to; `None` for a bare token.
    pub tenant: Option<Uuid>,
    pub role: String,
    pub mfa: MfaClaims,
}

/// Result of a successful device authentication.
#[derive(Debug, Clone)]
pub struct DeviceAuthOutput {
    pub uid: String,
    /// Signed device token.
    pub token: String,
    pub name: String,
}

/// Device identity assertion presented at login.
#[derive(Debug, Clone)]
pub struct DeviceAuthInput {
    pub tenant_id: Uuid,
    pub mac: String,
    pub hostname: String,
    pub public_key: String,
}

/// Public-key proof presented at login.
#[derive(Debug, Clone)]
pub struct PublicKeyAuthInput {
    pub fingerprint: String,
    /// UID of the device the token will be scoped to.
    pub uid: String,
    /// Message the client signed.
    pub data: String,
    /// Base64-encoded signature over `data`.
    pub signature: String,
}

/// Verifies a signature proof against registered key material. The
/// concrete primitive is a pluggable collaborator.
pub trait SignatureVerifier: Send + Sync {
    fn verify(
        &self,
        public_key: &str,
        message: &[u8],
        signature: &[u8],
    ) -> Result<bool, AuthError>;
}

/// Resolves a network position from a source IP. Geolocation itself is
/// an external collaborator; the null locator reports the origin.
pub trait PositionLocator: Send + Sync {
    fn locate(&self, ip: &str) -> Result<Position, AuthError>;
}

/// Locator for deployments without a geolocation backend.
#[derive(Debug, Clone, Default)]
pub struct NullLocator;

impl PositionLocator for NullLocator {
    fn locate(&self, _ip: &str) -> Result<Position, AuthError> {
        Ok(Position::default())
    }
}

// ---------------------------------------------------------------------------
// User authentication, token exchange, MFA management
// ---------------------------------------------------------------------------

/// User-facing authentication service.
pub struct AuthService<U, N, C, K>
where
    U: UserStore,
    N: NamespaceStore,
    C: RevocationCache,
    K: KeyProvider,
{
    users: U,
    namespaces: N,
    cache: C,
    keys: K,
    config: AuthConfig,
}

impl<U, N, C, K> AuthService<U, N, C, K>
where
    U: UserStore,
    N: NamespaceStore,
    C: RevocationCache,
    K: KeyProvider,
{
    pub fn new(users: U, namespaces: N, cache: C, keys: K, config: AuthConfig) -> Self {
        Self {
            users,
            namespaces,
            cache,
            keys,
            config,
        }
    }

    /// Authenticate with username + password and issue a token scoped
    /// to the user's default namespace, or a bare token when the user
    /// belongs to none.
    pub async fn login(&self, username: &str, password: &str) -> FerrogateResult<UserAuthOutput> {
        let user = match self.users.get_by_username(username).await {
            Ok(u) => u,
            Err(FerrogateError::NotFound { .. }) => {
                return Err(AuthError::unauthorized_with("unknown user").into());
            }
            Err(e) => return Err(e),
        };

        let valid = password::verify_password(
            password,
            &user.password_hash,
            self.config.pepper.as_deref(),
        )?;
        if !valid {
            return Err(AuthError::unauthorized_with("invalid credentials").into());
        }

        let scope = self.resolve_scope(&user).await?;
        self.issue(&user, scope, false).await
    }

    /// Re-issue a token for a subject by ID. `mfa_validated` marks the
    /// token as having completed an MFA challenge.
    pub async fn token_for(&self, id: Uuid, mfa_validated: bool) -> FerrogateResult<UserAuthOutput> {
        let user = self.users.get_by_id(id).await?;
        let scope = self.resolve_scope(&user).await?;
        self.issue(&user, scope, mfa_validated).await
    }

    /// Exchange the caller's identity for a token scoped to another
    /// tenant it is a member of. Switching always lands on a concrete
    /// tenant — there is no bare variant of this operation.
    pub async fn swap_token(&self, id: Uuid, tenant_id: Uuid) -> FerrogateResult<UserAuthOutput> {
        let role = match self.namespaces.member_role(tenant_id, id).await {
            Ok(role) => role,
            Err(FerrogateError::NotFound { .. }) => {
                return Err(AuthError::unauthorized_with("not a member of target tenant").into());
            }
            Err(e) => return Err(e),
        };

        let user = self.users.get_by_id(id).await?;
        self.issue(&user, Some((tenant_id, role)), false).await
    }

    /// Profile of the authenticated caller. The tenant comes from the
    /// propagated identity context, not from the request body.
    pub async fn user_info(
        &self,
        username: &str,
        tenant: Option<Uuid>,
    ) -> FerrogateResult<UserAuthOutput> {
        let user = self.users.get_by_username(username).await?;
        let scope = match tenant {
            Some(tenant_id) => {
                let role = self.namespaces.member_role(tenant_id, user.id).await?;
                Some((tenant_id, role))
            }
            None => None,
        };
        self.issue(&user, scope, false).await
    }

    /// Authoritative MFA-required state for a subject.
    pub async fn mfa_status(&self, id: Uuid) -> FerrogateResult<bool> {
        self.users.mfa_status(id).await
    }

    /// Begin MFA enrollment: a fresh TOTP secret plus the otpauth URI
    /// the authenticator app scans. Nothing is stored yet.
    pub async fn mfa_generate(&self, id: Uuid) -> FerrogateResult<(String, String)> {
        let user = self.users.get_by_id(id).await?;
        let (secret, uri) = mfa::generate_enrollment(&self.config.totp_issuer, &user.username)?;
        Ok((secret, uri))
    }

    /// Complete enrollment: the caller proves possession of the secret
    /// with a current code, then the secret is sealed and stored.
    pub async fn mfa_enable(&self, id: Uuid, secret: &str, code: &str) -> FerrogateResult<()> {
        let user = self.users.get_by_id(id).await?;

        if !mfa::verify_code(secret, code, &self.config.totp_issuer, &user.username)? {
            return Err(AuthError::unauthorized_with("invalid MFA code").into());
        }

        let sealed = self.cipher()?.seal(secret.as_bytes())?;
        self.users.set_mfa(id, true, Some(sealed)).await?;
        info!(user = %user.username, "MFA enabled");
        Ok(())
    }

    pub async fn mfa_disable(&self, id: Uuid) -> FerrogateResult<()> {
        self.users.set_mfa(id, false, None).await
    }

    /// Answer an MFA challenge: on a valid code, issue a token with
    /// `mfa.validated` set.
    pub async fn mfa_auth(&self, id: Uuid, code: &str) -> FerrogateResult<UserAuthOutput> {
        let user = self.users.get_by_id(id).await?;
        let sealed = user.mfa_secret.as_deref().ok_or(AuthError::MfaNotEnrolled)?;

        let secret_bytes = self.cipher()?.open(sealed)?;
        let secret = String::from_utf8(secret_bytes)
            .map_err(|e| AuthError::Crypto(format!("stored secret: {e}")))?;

        if !mfa::verify_code(&secret, code, &self.config.totp_issuer, &user.username)? {
            return Err(AuthError::unauthorized_with("invalid MFA code").into());
        }

        let scope = self.resolve_scope(&user).await?;
        self.issue(&user, scope, true).await
    }

    fn cipher(&self) -> Result<SecretCipher, AuthError> {
        self.config
            .mfa_encryption_key
            .map(SecretCipher::new)
            .ok_or_else(|| AuthError::Crypto("MFA encryption key not configured".into()))
    }

    /// The (tenant, role) scope a fresh login resolves to.
    async fn resolve_scope(&self, user: &User) -> FerrogateResult<Option<(Uuid, String)>> {
        let namespace = self.namespaces.default_for_user(user.id).await?;
        Ok(namespace.map(|ns| {
            let role = ns
                .members
                .iter()
                .find(|m| m.id == user.id)
                .map(|m| m.role.clone())
                .unwrap_or_default();
            (ns.tenant_id, role)
        }))
    }

    /// Sign a token for the user and admit it into the revocation
    /// cache when tenant-scoped.
    async fn issue(
        &self,
        user: &User,
        scope: Option<(Uuid, String)>,
        mfa_validated: bool,
    ) -> FerrogateResult<UserAuthOutput> {
        let (tenant, role) = match scope {
            Some((tenant, role)) => (Some(tenant), role),
            None => (None, String::new()),
        };
        let mfa = MfaClaims {
            status: user.mfa_enabled,
            validated: mfa_validated,
        };

        let claims = UserClaims::new(user.id, tenant, &user.username, &role, mfa, &self.config);
        let signed = token::issue_user_token(&self.keys, &claims)?;

        if let Some(tenant) = tenant {
            self.cache.admit(tenant, user.id, signed.clone()).await?;
        }

        Ok(UserAuthOutput {
            token: signed,
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            tenant,
            role,
            mfa,
        })
    }
}

// ---------------------------------------------------------------------------
// Device authentication
// ---------------------------------------------------------------------------

/// Issues device-scoped tokens from a device identity assertion and
/// records the device's network position as a side effect.
pub struct DeviceAuthenticator<D, K, L>
where
    D: DeviceStore,
    K: KeyProvider,
    L: PositionLocator,
{
    devices: D,
    keys: K,
    locator: L,
    config: AuthConfig,
}

impl<D, K, L> DeviceAuthenticator<D, K, L>
where
    D: DeviceStore,
    K: KeyProvider,
    L: PositionLocator,
{
    pub fn new(devices: D, keys: K, locator: L, config: AuthConfig) -> Self {
        Self {
            devices,
            keys,
            locator,
            config,
        }
    }

    /// Authenticate a device. The UID is derived from the assertion,
    /// so the same device always authenticates to the same record.
    ///
    /// The position write after a successful auth is not best-effort:
    /// its failure fails the whole request.
    pub async fn auth_device(
        &self,
        input: DeviceAuthInput,
        source_ip: &str,
    ) -> FerrogateResult<DeviceAuthOutput> {
        if input.mac.is_empty() || input.hostname.is_empty() {
            return Err(AuthError::unauthorized_with("invalid device identity assertion").into());
        }

        let uid = derive_device_uid(input.tenant_id, &input.mac, &input.public_key);

        let device = self
            .devices
            .create(NewDevice {
                uid: uid.clone(),
                name: input.hostname,
                tenant_id: input.tenant_id,
                mac: input.mac,
                public_key: input.public_key,
            })
            .await?;

        let signed = token::issue_device_token(&self.keys, &DeviceClaims::new(&uid, &self.config))?;

        let position = self.locator.locate(source_ip)?;
        self.devices.set_position(&uid, position).await?;
        self.devices.set_last_seen(&uid).await?;

        Ok(DeviceAuthOutput {
            uid,
            token: signed,
            name: device.name,
        })
    }
}

/// Content-derived device UID: the same (tenant, identity, key) triple
/// always maps to the same 64-char hex UID.
pub fn derive_device_uid(tenant_id: Uuid, mac: &str, public_key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(tenant_id.to_string().as_bytes());
    hasher.update(b":");
    hasher.update(mac.as_bytes());
    hasher.update(b":");
    hasher.update(public_key.as_bytes());
    hex::encode(hasher.finalize())
}

// ---------------------------------------------------------------------------
// Public-key authentication
// ---------------------------------------------------------------------------

/// Issues device-scoped tokens from a public-key signature proof.
pub struct PublicKeyAuthenticator<P, K, V>
where
    P: PublicKeyStore,
    K: KeyProvider,
    V: SignatureVerifier,
{
    keys_store: P,
    keys: K,
    verifier: V,
    config: AuthConfig,
}

impl<P, K, V> PublicKeyAuthenticator<P, K, V>
where
    P: PublicKeyStore,
    K: KeyProvider,
    V: SignatureVerifier,
{
    pub fn new(keys_store: P, keys: K, verifier: V, config: AuthConfig) -> Self {
        Self {
            keys_store,
            keys,
            verifier,
            config,
        }
    }

    /// Validate a signature proof against the registered key for the
    /// fingerprint and issue a device token on success.
    pub async fn auth_public_key(&self, input: PublicKeyAuthInput) -> FerrogateResult<String> {
        let registered = match self.keys_store.get(&input.fingerprint).await {
            Ok(key) => key,
            Err(FerrogateError::NotFound { .. }) => {
                return Err(AuthError::unauthorized_with("unknown key fingerprint").into());
            }
            Err(e) => return Err(e),
        };

        let signature = STANDARD
            .decode(&input.signature)
            .map_err(|_| AuthError::unauthorized_with("malformed signature"))?;

        let proven =
            self.verifier
                .verify(&registered.data, input.data.as_bytes(), &signature)?;
        if !proven {
            return Err(AuthError::unauthorized_with("signature proof rejected").into());
        }

        let signed =
            token::issue_device_token(&self.keys, &DeviceClaims::new(&input.uid, &self.config))?;
        Ok(signed)
    }
}
