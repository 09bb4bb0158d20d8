//! The request-time auth gateway.
//!
//! Invoked once per inbound request with the already-verified claim
//! bag. Dispatches on the claim discriminator, consults the revocation
//! cache and the MFA gate, and produces a typed [`Identity`] that is
//! passed down the call chain — not smuggled through response headers.

use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use ferrogate_core::cache::RevocationCache;
use ferrogate_core::error::FerrogateResult;
use ferrogate_core::store::UserStore;

use crate::claims::{self, AuthClaims};
use crate::error::AuthError;
use crate::mfa;

/// Whether to consult the revocation cache for this request. `Skip`
/// corresponds to the `args=skip` query hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheHint {
    Check,
    Skip,
}

impl CacheHint {
    /// Interpret the raw `args` query parameter.
    pub fn from_args(args: Option<&str>) -> Self {
        match args {
            Some("skip") => CacheHint::Skip,
            _ => CacheHint::Check,
        }
    }
}

/// Identity established for a request, consumed by downstream
/// authorization. Exactly one variant per authenticated request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    User {
        id: Uuid,
        /// `None` for a bare token: the subject can only act on its
        /// own profile.
        tenant: Option<Uuid>,
        username: String,
        role: String,
        mfa_status: bool,
        mfa_validated: bool,
    },
    Device {
        uid: String,
    },
}

/// Request-time dispatcher over verified claim bags.
pub struct AuthGateway<U: UserStore, C: RevocationCache> {
    users: U,
    cache: C,
}

impl<U: UserStore, C: RevocationCache> AuthGateway<U, C> {
    pub fn new(users: U, cache: C) -> Self {
        Self { users, cache }
    }

    /// Establish the caller's identity from a verified claim bag.
    ///
    /// User tokens scoped to a tenant must be present in the
    /// revocation cache unless the hint says to skip: a miss means the
    /// caller has not been re-admitted since the last forced global
    /// invalidation, so the token is rejected even if unexpired. Cache
    /// errors fail closed the same way. Bare (tenant-less) tokens
    /// bypass the cache entirely.
    pub async fn authenticate(
        &self,
        bag: &Value,
        hint: CacheHint,
        source_ip: &str,
    ) -> FerrogateResult<Identity> {
        match claims::decode(bag)? {
            AuthClaims::User(c) => {
                let id = Uuid::parse_str(&c.sub)
                    .map_err(|e| AuthError::ClaimShape(format!("subject id: {e}")))?;
                let tenant = match c.tenant_id.as_str() {
                    "" => None,
                    raw => Some(
                        Uuid::parse_str(raw)
                            .map_err(|e| AuthError::ClaimShape(format!("tenant id: {e}")))?,
                    ),
                };

                if hint == CacheHint::Check {
                    if let Some(tenant) = tenant {
                        match self.cache.admitted(tenant, id).await {
                            Ok(true) => {}
                            Ok(false) => {
                                return Err(AuthError::unauthorized_with(
                                    "token not admitted by revocation cache",
                                )
                                .into());
                            }
                            Err(e) => {
                                return Err(AuthError::unauthorized_with(e.to_string()).into());
                            }
                        }
                    }
                }

                // Authoritative state lookup failures propagate
                // unchanged; they are not authentication failures.
                let authoritative = self.users.mfa_status(id).await?;
                mfa::check_claim(authoritative, c.mfa.status)?;

                debug!(user = %c.username, %source_ip, "authenticated user request");

                Ok(Identity::User {
                    id,
                    tenant,
                    username: c.username,
                    role: c.role,
                    mfa_status: c.mfa.status,
                    mfa_validated: c.mfa.validated,
                })
            }
            AuthClaims::Device(c) => {
                debug!(uid = %c.uid, %source_ip, "authenticated device request");
                Ok(Identity::Device { uid: c.uid })
            }
        }
    }
}
