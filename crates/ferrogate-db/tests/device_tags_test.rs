//! Integration tests for the tag registry using in-memory SurrealDB.

use ferrogate_core::error::FerrogateError;
use ferrogate_core::models::device::NewDevice;
use ferrogate_core::store::{DeviceStore, DeviceTagStore};
use ferrogate_db::store::SurrealDeviceStore;
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

/// Helper: spin up in-memory DB, run migrations, and create one
/// device carrying `tag-1` plus one untagged device in the tenant.
async fn setup() -> (
    SurrealDeviceStore<surrealdb::engine::local::Db>,
    Uuid,    // tenant_id
    String,  // tagged device uid
    String,  // untagged device uid
) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    ferrogate_db::run_migrations(&db).await.unwrap();

    let store = SurrealDeviceStore::new(db);
    let tenant_id = Uuid::new_v4();

    let tagged = "23".repeat(32);
    let untagged = "42".repeat(32);

    for (uid, name) in [(&tagged, "device-1"), (&untagged, "device-2")] {
        store
            .create(NewDevice {
                uid: uid.clone(),
                name: name.into(),
                tenant_id,
                mac: format!("mac-{name}"),
                public_key: "".into(),
            })
            .await
            .unwrap();
    }
    store.create_tag(&tagged, "tag-1").await.unwrap();

    (store, tenant_id, tagged, untagged)
}

#[tokio::test]
async fn create_tag_on_missing_device_is_not_found() {
    let (store, _, _, _) = setup().await;

    let err = store.create_tag("nonexistent", "tag-4").await.unwrap_err();
    assert!(matches!(err, FerrogateError::NotFound { .. }));
}

#[tokio::test]
async fn create_tag_appears_in_reads() {
    let (store, _, tagged, _) = setup().await;

    store.create_tag(&tagged, "tag-4").await.unwrap();

    let device = store.get(&tagged).await.unwrap();
    assert!(device.tags.contains(&"tag-1".to_string()));
    assert!(device.tags.contains(&"tag-4".to_string()));
}

#[tokio::test]
async fn duplicate_create_tag_is_a_noop() {
    let (store, _, tagged, _) = setup().await;

    store.create_tag(&tagged, "tag-1").await.unwrap();

    let device = store.get(&tagged).await.unwrap();
    assert_eq!(device.tags, vec!["tag-1".to_string()]);
}

#[tokio::test]
async fn remove_tag_not_found_cases() {
    let (store, _, tagged, _) = setup().await;

    let err = store.remove_tag("nonexistent", "tag-1").await.unwrap_err();
    assert!(matches!(err, FerrogateError::NotFound { .. }));

    // Device exists but does not carry the tag.
    let err = store.remove_tag(&tagged, "nonexistent").await.unwrap_err();
    assert!(matches!(err, FerrogateError::NotFound { .. }));
}

#[tokio::test]
async fn remove_tag_leaves_the_rest_untouched() {
    let (store, _, tagged, _) = setup().await;

    store.create_tag(&tagged, "tag-2").await.unwrap();
    store.remove_tag(&tagged, "tag-1").await.unwrap();

    let device = store.get(&tagged).await.unwrap();
    assert_eq!(device.tags, vec!["tag-2".to_string()]);
}

#[tokio::test]
async fn update_tags_replaces_the_set() {
    let (store, _, tagged, _) = setup().await;

    let err = store
        .update_tags("nonexistent", &["tag-0".into()])
        .await
        .unwrap_err();
    assert!(matches!(err, FerrogateError::NotFound { .. }));

    store
        .update_tags(&tagged, &["tag-0".into(), "tag-9".into(), "tag-0".into()])
        .await
        .unwrap();

    let mut tags = store.get(&tagged).await.unwrap().tags;
    tags.sort();
    // Replaced wholesale and de-duplicated.
    assert_eq!(tags, vec!["tag-0".to_string(), "tag-9".to_string()]);
}

#[tokio::test]
async fn rename_tag_across_the_tenant() {
    let (store, tenant_id, tagged, _) = setup().await;

    // Unknown tenant.
    let err = store
        .rename_tag(Uuid::new_v4(), "tag-1", "newtag")
        .await
        .unwrap_err();
    assert!(matches!(err, FerrogateError::NotFound { .. }));

    // No device in the tenant carries the tag.
    let err = store
        .rename_tag(tenant_id, "nonexistent", "newtag")
        .await
        .unwrap_err();
    assert!(matches!(err, FerrogateError::NotFound { .. }));

    store.rename_tag(tenant_id, "tag-1", "newtag").await.unwrap();

    let device = store.get(&tagged).await.unwrap();
    assert_eq!(device.tags, vec!["newtag".to_string()]);

    // The old tag is gone, so renaming again finds nothing.
    let err = store
        .rename_tag(tenant_id, "tag-1", "newtag")
        .await
        .unwrap_err();
    assert!(matches!(err, FerrogateError::NotFound { .. }));
}

#[tokio::test]
async fn rename_touches_every_carrier() {
    let (store, tenant_id, tagged, untagged) = setup().await;

    store.create_tag(&untagged, "tag-1").await.unwrap();
    store.rename_tag(tenant_id, "tag-1", "newtag").await.unwrap();

    for uid in [&tagged, &untagged] {
        let device = store.get(uid).await.unwrap();
        assert!(device.tags.contains(&"newtag".to_string()));
        assert!(!device.tags.contains(&"tag-1".to_string()));
    }
}

#[tokio::test]
async fn delete_tag_across_the_tenant() {
    let (store, tenant_id, tagged, untagged) = setup().await;

    let err = store.delete_tag(Uuid::new_v4(), "tag-1").await.unwrap_err();
    assert!(matches!(err, FerrogateError::NotFound { .. }));

    let err = store.delete_tag(tenant_id, "nonexistent").await.unwrap_err();
    assert!(matches!(err, FerrogateError::NotFound { .. }));

    store.create_tag(&untagged, "tag-1").await.unwrap();
    store.delete_tag(tenant_id, "tag-1").await.unwrap();

    for uid in [&tagged, &untagged] {
        assert!(!store.get(uid).await.unwrap().tags.contains(&"tag-1".to_string()));
    }
}
