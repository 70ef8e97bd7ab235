//! Behavior every backend must share
//!
//! Written to tolerate pre-existing rows so it can run against a live database.

use chrono::Utc;

use super::{Store, StoreError};
use crate::models::{Email, NewPost, NewUser};

pub async fn post_lifecycle(store: &dyn Store) {
    let first = store
        .create_post(&NewPost::new("first", "hello", true, None).unwrap())
        .await
        .expect("create first");
    let second = store
        .create_post(&NewPost::new("second", "world", false, Some(3)).unwrap())
        .await
        .expect("create second");

    assert_ne!(first.id, second.id);
    assert!(second.id > first.id);
    assert!(first.published);
    assert_eq!(second.rating, Some(3));

    let fetched = store.get_post(first.id).await.expect("get first");
    assert_eq!(fetched, first);

    let listed = store.list_posts().await.expect("list");
    assert!(listed.windows(2).all(|w| w[0].id < w[1].id));
    assert!(listed.iter().any(|p| p.id == first.id));
    assert!(listed.iter().any(|p| p.id == second.id));

    // Other writers may share the table, so only a lower bound is stable
    let latest = store.latest_post().await.expect("latest");
    assert!(latest.id >= second.id);
    assert!(latest.id >= listed.last().expect("non-empty list").id);

    let replacement = NewPost::new("replaced", "new body", false, Some(5)).unwrap();
    let updated = store
        .update_post(first.id, &replacement)
        .await
        .expect("update");
    assert_eq!(updated.id, first.id);
    assert_eq!(updated.created_at, first.created_at);
    assert_eq!(updated.title, "replaced");

    let refetched = store.get_post(first.id).await.expect("get updated");
    assert_eq!(refetched.title, replacement.title());
    assert_eq!(refetched.content, replacement.content());
    assert_eq!(refetched.published, replacement.published());
    assert_eq!(refetched.rating, replacement.rating());
    assert_eq!(refetched.created_at, first.created_at);

    // Full replace clears an omitted rating
    let cleared = store
        .update_post(second.id, &NewPost::new("second", "world", true, None).unwrap())
        .await
        .expect("update second");
    assert_eq!(cleared.rating, None);

    store.delete_post(first.id).await.expect("delete");
    assert!(matches!(
        store.get_post(first.id).await,
        Err(StoreError::NotFound { .. })
    ));
    assert!(matches!(
        store.delete_post(first.id).await,
        Err(StoreError::NotFound { .. })
    ));
    assert!(matches!(
        store.update_post(first.id, &replacement).await,
        Err(StoreError::NotFound { .. })
    ));

    store.delete_post(second.id).await.expect("cleanup");
}

pub async fn user_lifecycle(store: &dyn Store) {
    // Unique per run so repeated runs against a live database don't collide
    let address = format!(
        "user{}@example.com",
        Utc::now().timestamp_nanos_opt().unwrap_or_default()
    );
    let new_user = NewUser {
        email: Email::new(&address).unwrap(),
        password_hash: "$argon2id$placeholder".into(),
    };

    let created = store.create_user(&new_user).await.expect("create user");
    assert_eq!(created.email, address);
    assert_eq!(created.password_hash, "$argon2id$placeholder");

    let by_id = store.get_user(created.id).await.expect("get user");
    assert_eq!(by_id, created);

    let by_email = store
        .find_user_by_email(&address)
        .await
        .expect("find by email");
    assert_eq!(by_email.id, created.id);

    let duplicate = NewUser {
        email: Email::new(&address).unwrap(),
        password_hash: "$argon2id$other".into(),
    };
    assert!(matches!(
        store.create_user(&duplicate).await,
        Err(StoreError::Conflict { field: "email", .. })
    ));

    // The original row is untouched by the failed insert
    let after = store
        .find_user_by_email(&address)
        .await
        .expect("find after conflict");
    assert_eq!(after, created);

    assert!(matches!(
        store.find_user_by_email("nobody@example.com").await,
        Err(StoreError::NotFound { .. })
    ));
    assert!(matches!(
        store.get_user(i32::MAX).await,
        Err(StoreError::NotFound { .. })
    ));
}
