//! Integration tests for the auth gateway against real stores on
//! in-memory SurrealDB.

use std::sync::Arc;

use ferrogate_auth::claims::{MfaClaims, UserClaims};
use ferrogate_auth::config::AuthConfig;
use ferrogate_auth::gateway::{AuthGateway, CacheHint, Identity};
use ferrogate_core::cache::{MemoryCache, RevocationCache};
use ferrogate_core::error::FerrogateError;
use ferrogate_core::models::user::NewUser;
use ferrogate_core::store::UserStore;
use ferrogate_db::store::SurrealUserStore;
use serde_json::{Value, json};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

type TestGateway = AuthGateway<SurrealUserStore<surrealdb::engine::local::Db>, Arc<MemoryCache>>;

/// Spin up in-memory DB, run migrations, create one user, and wire a
/// gateway around a shared cache handle.
async fn setup() -> (TestGateway, Arc<MemoryCache>, Uuid) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    ferrogate_db::run_migrations(&db).await.unwrap();

    let users = SurrealUserStore::new(db);
    let user = users
        .create(NewUser {
            username: "john_doe".into(),
            email: "john@example.com".into(),
            password: "correct-horse-battery".into(),
        })
        .await
        .unwrap();

    let cache = Arc::new(MemoryCache::new());
    let gateway = AuthGateway::new(users, cache.clone());

    (gateway, cache, user.id)
}

fn user_bag(id: Uuid, tenant: Option<Uuid>, mfa_status: bool) -> Value {
    let claims = UserClaims::new(
        id,
        tenant,
        "john_doe",
        "owner",
        MfaClaims {
            status: mfa_status,
            validated: false,
        },
        &AuthConfig::default(),
    );
    serde_json::to_value(claims).unwrap()
}

#[tokio::test]
async fn bare_token_bypasses_the_cache() {
    let (gateway, _cache, id) = setup().await;

    // Nothing admitted in the cache, but a tenant-less token never
    // consults it.
    let identity = gateway
        .authenticate(&user_bag(id, None, false), CacheHint::Check, "127.0.0.1")
        .await
        .unwrap();

    match identity {
        Identity::User {
            tenant, username, ..
        } => {
            assert_eq!(tenant, None);
            assert_eq!(username, "john_doe");
        }
        Identity::Device { .. } => panic!("expected user identity"),
    }
}

#[tokio::test]
async fn scoped_token_requires_cache_admission() {
    let (gateway, cache, id) = setup().await;
    let tenant = Uuid::new_v4();
    let bag = user_bag(id, Some(tenant), false);

    // Not admitted: rejected even though the token is unexpired.
    let err = gateway
        .authenticate(&bag, CacheHint::Check, "127.0.0.1")
        .await
        .unwrap_err();
    assert!(matches!(err, FerrogateError::Unauthorized { .. }));

    cache.admit(tenant, id, "token".into()).await.unwrap();

    let identity = gateway
        .authenticate(&bag, CacheHint::Check, "127.0.0.1")
        .await
        .unwrap();
    assert!(matches!(identity, Identity::User { tenant: Some(t), .. } if t == tenant));
}

#[tokio::test]
async fn skip_hint_bypasses_the_cache() {
    let (gateway, _cache, id) = setup().await;
    let bag = user_bag(id, Some(Uuid::new_v4()), false);

    assert_eq!(CacheHint::from_args(Some("skip")), CacheHint::Skip);
    assert_eq!(CacheHint::from_args(None), CacheHint::Check);

    let identity = gateway
        .authenticate(&bag, CacheHint::Skip, "127.0.0.1")
        .await
        .unwrap();
    assert!(matches!(identity, Identity::User { .. }));
}

#[tokio::test]
async fn device_token_yields_device_identity() {
    let (gateway, _cache, _id) = setup().await;

    let uid = "2300230e3ca2f637636b4d025d2235269014865db5204b6d115386cbee89809c";
    let bag = serde_json::to_value(ferrogate_auth::claims::DeviceClaims::new(
        uid,
        &AuthConfig::default(),
    ))
    .unwrap();

    let identity = gateway
        .authenticate(&bag, CacheHint::Check, "127.0.0.1")
        .await
        .unwrap();
    assert_eq!(
        identity,
        Identity::Device {
            uid: uid.to_string()
        }
    );
}

#[tokio::test]
async fn unknown_discriminator_is_unauthorized() {
    let (gateway, _cache, id) = setup().await;

    let mut bag = user_bag(id, None, false);
    bag["claims"] = json!("admin");

    let err = gateway
        .authenticate(&bag, CacheHint::Check, "127.0.0.1")
        .await
        .unwrap_err();
    assert!(matches!(err, FerrogateError::Unauthorized { .. }));
}

#[tokio::test]
async fn malformed_bag_is_a_wiring_error() {
    let (gateway, _cache, id) = setup().await;

    let mut bag = user_bag(id, None, false);
    bag.as_object_mut().unwrap().remove("mfa");

    let err = gateway
        .authenticate(&bag, CacheHint::Check, "127.0.0.1")
        .await
        .unwrap_err();
    assert!(matches!(err, FerrogateError::TypeAssertion(_)));
}

#[tokio::test]
async fn mfa_claim_mismatch_rejects_when_not_required() {
    let (gateway, _cache, id) = setup().await;

    // Authoritative state: MFA not required. The claim says it is.
    let err = gateway
        .authenticate(&user_bag(id, None, true), CacheHint::Check, "127.0.0.1")
        .await
        .unwrap_err();
    assert!(matches!(err, FerrogateError::Unauthorized { .. }));
}

#[tokio::test]
async fn mfa_claim_mismatch_passes_when_required() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    ferrogate_db::run_migrations(&db).await.unwrap();

    let users = SurrealUserStore::new(db);
    let user = users
        .create(NewUser {
            username: "mfa_user".into(),
            email: "mfa@example.com".into(),
            password: "correct-horse-battery".into(),
        })
        .await
        .unwrap();
    users
        .set_mfa(user.id, true, Some("sealed".into()))
        .await
        .unwrap();

    let gateway = AuthGateway::new(users, Arc::new(MemoryCache::new()));

    // Authoritative state: required. Claim says not. The one-sided
    // rule lets this through; the validated-MFA layer handles it.
    let claims = UserClaims::new(
        user.id,
        None,
        "mfa_user",
        "",
        MfaClaims {
            status: false,
            validated: false,
        },
        &AuthConfig::default(),
    );
    let bag = serde_json::to_value(claims).unwrap();

    let identity = gateway
        .authenticate(&bag, CacheHint::Check, "127.0.0.1")
        .await
        .unwrap();
    assert!(matches!(identity, Identity::User { .. }));
}

#[tokio::test]
async fn unknown_subject_propagates_not_found() {
    let (gateway, _cache, _id) = setup().await;

    // The authoritative-state lookup fails with NotFound, which is
    // not an authentication failure and passes through unchanged.
    let err = gateway
        .authenticate(
            &user_bag(Uuid::new_v4(), None, false),
            CacheHint::Check,
            "127.0.0.1",
        )
        .await
        .unwrap_err();
    assert!(matches!(err, FerrogateError::NotFound { .. }));
}
