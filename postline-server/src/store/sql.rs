//! Raw-SQL backend
//!
//! Every operation is one statement:
//! - writes use `RETURNING` so the stored row comes back in the same round trip
//! - update/delete detect a missing row from the result, not a prior SELECT
//! - email uniqueness relies on the UNIQUE constraint (no check-then-insert)

use async_trait::async_trait;
use sqlx::PgPool;

use super::{Backend, Store, StoreError};
use crate::models::{NewPost, NewUser, Post, User};

/// Store backed by hand-written SQL
#[derive(Clone)]
pub struct SqlStore {
    pool: PgPool,
}

impl SqlStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_insert_error(e: sqlx::Error) -> StoreError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::email_taken(),
        _ => StoreError::Sqlx(e),
    }
}

#[async_trait]
impl Store for SqlStore {
    fn backend(&self) -> Backend {
        Backend::Sql
    }

    async fn list_posts(&self) -> Result<Vec<Post>, StoreError> {
        let posts: Vec<Post> = sqlx::query_as(
            r#"
            SELECT id, title, content, published, rating, created_at
            FROM posts
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }

    async fn latest_post(&self) -> Result<Post, StoreError> {
        let post: Option<Post> = sqlx::query_as(
            r#"
            SELECT id, title, content, published, rating, created_at
            FROM posts
            ORDER BY id DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        post.ok_or_else(|| StoreError::NotFound {
            resource: "post",
            id: "latest".to_owned(),
        })
    }

    async fn get_post(&self, id: i32) -> Result<Post, StoreError> {
        let post: Option<Post> = sqlx::query_as(
            r#"
            SELECT id, title, content, published, rating, created_at
            FROM posts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        post.ok_or_else(|| StoreError::post_not_found(id))
    }

    async fn create_post(&self, post: &NewPost) -> Result<Post, StoreError> {
        let created: Post = sqlx::query_as(
            r#"
            INSERT INTO posts (title, content, published, rating)
            VALUES ($1, $2, $3, $4)
            RETURNING id, title, content, published, rating, created_at
            "#,
        )
        .bind(post.title())
        .bind(post.content())
        .bind(post.published())
        .bind(post.rating())
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn update_post(&self, id: i32, post: &NewPost) -> Result<Post, StoreError> {
        let updated: Option<Post> = sqlx::query_as(
            r#"
            UPDATE posts
            SET title = $1, content = $2, published = $3, rating = $4
            WHERE id = $5
            RETURNING id, title, content, published, rating, created_at
            "#,
        )
        .bind(post.title())
        .bind(post.content())
        .bind(post.published())
        .bind(post.rating())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        updated.ok_or_else(|| StoreError::post_not_found(id))
    }

    async fn delete_post(&self, id: i32) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::post_not_found(id));
        }

        Ok(())
    }

    async fn get_user(&self, id: i32) -> Result<User, StoreError> {
        let user: Option<User> = sqlx::query_as(
            r#"
            SELECT id, email, password, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        user.ok_or_else(|| StoreError::user_not_found(id))
    }

    async fn create_user(&self, user: &NewUser) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password)
            VALUES ($1, $2)
            RETURNING id, email, password, created_at
            "#,
        )
        .bind(user.email.as_str())
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(map_insert_error)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<User, StoreError> {
        let user: Option<User> = sqlx::query_as(
            r#"
            SELECT id, email, password, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        user.ok_or_else(|| StoreError::user_not_found(email))
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
