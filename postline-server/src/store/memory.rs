//! In-memory fallback store
//!
//! Non-persistent substitute used when the SQL backend can't connect at startup.
//! All state sits behind one async mutex. Ids come from per-table monotonic
//! counters starting at 1 and are never reused, even after a delete.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use super::{Backend, Store, StoreError};
use crate::models::{NewPost, NewUser, Post, User};

#[derive(Default)]
struct Tables {
    // Keyed by id so iteration is ascending
    posts: BTreeMap<i32, Post>,
    users: BTreeMap<i32, User>,
    last_post_id: i32,
    last_user_id: i32,
}

/// Store held entirely in process memory
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered users
    pub async fn user_count(&self) -> usize {
        self.tables.lock().await.users.len()
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn backend(&self) -> Backend {
        Backend::Memory
    }

    async fn list_posts(&self) -> Result<Vec<Post>, StoreError> {
        Ok(self.tables.lock().await.posts.values().cloned().collect())
    }

    async fn latest_post(&self) -> Result<Post, StoreError> {
        self.tables
            .lock()
            .await
            .posts
            .values()
            .next_back()
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                resource: "post",
                id: "latest".to_owned(),
            })
    }

    async fn get_post(&self, id: i32) -> Result<Post, StoreError> {
        self.tables
            .lock()
            .await
            .posts
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::post_not_found(id))
    }

    async fn create_post(&self, post: &NewPost) -> Result<Post, StoreError> {
        let mut tables = self.tables.lock().await;
        tables.last_post_id += 1;

        let created = Post {
            id: tables.last_post_id,
            title: post.title().to_owned(),
            content: post.content().to_owned(),
            published: post.published(),
            rating: post.rating(),
            created_at: Utc::now(),
        };
        tables.posts.insert(created.id, created.clone());

        Ok(created)
    }

    async fn update_post(&self, id: i32, post: &NewPost) -> Result<Post, StoreError> {
        let mut tables = self.tables.lock().await;
        let existing = tables
            .posts
            .get_mut(&id)
            .ok_or_else(|| StoreError::post_not_found(id))?;

        existing.title = post.title().to_owned();
        existing.content = post.content().to_owned();
        existing.published = post.published();
        existing.rating = post.rating();

        Ok(existing.clone())
    }

    async fn delete_post(&self, id: i32) -> Result<(), StoreError> {
        self.tables
            .lock()
            .await
            .posts
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::post_not_found(id))
    }

    async fn get_user(&self, id: i32) -> Result<User, StoreError> {
        self.tables
            .lock()
            .await
            .users
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::user_not_found(id))
    }

    async fn create_user(&self, user: &NewUser) -> Result<User, StoreError> {
        let mut tables = self.tables.lock().await;

        if tables
            .users
            .values()
            .any(|u| u.email == user.email.as_str())
        {
            return Err(StoreError::email_taken());
        }

        tables.last_user_id += 1;
        let created = User {
            id: tables.last_user_id,
            email: user.email.as_str().to_owned(),
            password_hash: user.password_hash.clone(),
            created_at: Utc::now(),
        };
        tables.users.insert(created.id, created.clone());

        Ok(created)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<User, StoreError> {
        self.tables
            .lock()
            .await
            .users
            .values()
            .find(|u| u.email == email)
            .cloned()
            .ok_or_else(|| StoreError::user_not_found(email))
    }

    async fn close(&self) {}
}
