use super::*;
use crate::storage::StorageError;

async fn setup() -> Sqlite {
    let db = Sqlite::new(None).await.unwrap();
    db.run_migration().await.unwrap();
    db
}

#[tokio::test]
async fn test_get_missing_key() {
    let db = setup().await;
    assert_eq!(db.get("conversations").await.unwrap(), None);
}

#[tokio::test]
async fn test_set_overwrites_value() {
    let db = setup().await;

    db.set("conversations", "[]").await.unwrap();
    assert_eq!(db.get("conversations").await.unwrap().as_deref(), Some("[]"));

    db.set("conversations", r#"[{"id":"a"}]"#).await.unwrap();
    assert_eq!(
        db.get("conversations").await.unwrap().as_deref(),
        Some(r#"[{"id":"a"}]"#)
    );
}

#[tokio::test]
async fn test_remove_key() {
    let db = setup().await;

    db.set("activeConversationId", "\"a\"").await.unwrap();
    db.remove("activeConversationId").await.unwrap();
    assert_eq!(db.get("activeConversationId").await.unwrap(), None);

    // Removing a missing key is not an error.
    db.remove("activeConversationId").await.unwrap();
}

#[tokio::test]
async fn test_capacity_exceeded() {
    let db = setup().await.with_max_value_bytes(Some(4));

    db.set("k", "1234").await.unwrap();
    let err = db.set("k", "12345").await.unwrap_err();
    let err = err
        .downcast_ref::<StorageError>()
        .expect("capacity error expected");
    assert!(matches!(
        err,
        StorageError::CapacityExceeded { size: 5, limit: 4, .. }
    ));

    assert_eq!(db.get("k").await.unwrap().as_deref(), Some("1234"));
}

#[tokio::test]
async fn test_persists_across_connections() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chat.db");
    let path = path.to_str().unwrap();

    {
        let db = Sqlite::new(Some(path)).await.unwrap();
        db.run_migration().await.unwrap();
        db.set("conversations", "[]").await.unwrap();
    }

    let db = Sqlite::new(Some(path)).await.unwrap();
    db.run_migration().await.unwrap();
    assert_eq!(db.get("conversations").await.unwrap().as_deref(), Some("[]"));
}
