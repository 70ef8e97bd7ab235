//! ORM backend (sea-orm)
//!
//! Entities mirror the `posts` and `users` tables created by [`super::migrations`].
//! Update is read-then-write, so it runs in a transaction holding a row lock.

use std::time::Duration;

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectOptions, Database, DatabaseConnection, DbErr,
    EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait,
};

use super::{Backend, Store, StoreError};
use crate::models::{NewPost, NewUser, Post, User};

pub mod posts {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "posts")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,
        pub title: String,
        #[sea_orm(column_type = "Text")]
        pub content: String,
        pub published: bool,
        pub rating: Option<i32>,
        pub created_at: DateTimeUtc,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod users {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "users")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,
        #[sea_orm(unique)]
        pub email: String,
        pub password: String,
        pub created_at: DateTimeUtc,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

impl From<posts::Model> for Post {
    fn from(m: posts::Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
            content: m.content,
            published: m.published,
            rating: m.rating,
            created_at: m.created_at,
        }
    }
}

impl From<users::Model> for User {
    fn from(m: users::Model) -> Self {
        Self {
            id: m.id,
            email: m.email,
            password_hash: m.password,
            created_at: m.created_at,
        }
    }
}

/// Store backed by sea-orm entities
#[derive(Clone)]
pub struct OrmStore {
    db: DatabaseConnection,
}

impl OrmStore {
    /// Connect once; failure is returned to the caller.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let mut options = ConnectOptions::new(database_url.to_owned());
        options
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .sqlx_logging(false);

        let db = Database::connect(options).await?;
        tracing::info!("ORM database connection was successful");
        Ok(Self { db })
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

fn map_insert_error(e: DbErr) -> StoreError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => StoreError::email_taken(),
        _ => StoreError::Orm(e),
    }
}

#[async_trait]
impl Store for OrmStore {
    fn backend(&self) -> Backend {
        Backend::Orm
    }

    async fn list_posts(&self) -> Result<Vec<Post>, StoreError> {
        let models = posts::Entity::find()
            .order_by_asc(posts::Column::Id)
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(Post::from).collect())
    }

    async fn latest_post(&self) -> Result<Post, StoreError> {
        posts::Entity::find()
            .order_by_desc(posts::Column::Id)
            .one(&self.db)
            .await?
            .map(Post::from)
            .ok_or_else(|| StoreError::NotFound {
                resource: "post",
                id: "latest".to_owned(),
            })
    }

    async fn get_post(&self, id: i32) -> Result<Post, StoreError> {
        posts::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(Post::from)
            .ok_or_else(|| StoreError::post_not_found(id))
    }

    async fn create_post(&self, post: &NewPost) -> Result<Post, StoreError> {
        // id and created_at come from column defaults
        let model = posts::ActiveModel {
            title: Set(post.title().to_owned()),
            content: Set(post.content().to_owned()),
            published: Set(post.published()),
            rating: Set(post.rating()),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        Ok(Post::from(model))
    }

    async fn update_post(&self, id: i32, post: &NewPost) -> Result<Post, StoreError> {
        let txn = self.db.begin().await?;

        let existing = posts::Entity::find_by_id(id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| StoreError::post_not_found(id))?;

        let mut active: posts::ActiveModel = existing.into();
        active.title = Set(post.title().to_owned());
        active.content = Set(post.content().to_owned());
        active.published = Set(post.published());
        active.rating = Set(post.rating());

        let updated = active.update(&txn).await?;
        txn.commit().await?;

        Ok(Post::from(updated))
    }

    async fn delete_post(&self, id: i32) -> Result<(), StoreError> {
        let result = posts::Entity::delete_by_id(id).exec(&self.db).await?;

        if result.rows_affected == 0 {
            return Err(StoreError::post_not_found(id));
        }

        Ok(())
    }

    async fn get_user(&self, id: i32) -> Result<User, StoreError> {
        users::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(User::from)
            .ok_or_else(|| StoreError::user_not_found(id))
    }

    async fn create_user(&self, user: &NewUser) -> Result<User, StoreError> {
        let model = users::ActiveModel {
            email: Set(user.email.as_str().to_owned()),
            password: Set(user.password_hash.clone()),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(map_insert_error)?;

        Ok(User::from(model))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<User, StoreError> {
        users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await?
            .map(User::from)
            .ok_or_else(|| StoreError::user_not_found(email))
    }

    async fn close(&self) {
        if let Err(e) = self.db.clone().close().await {
            tracing::warn!(error = %e, "Error closing ORM connection");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{conformance, migrations};
    use chrono::Utc;

    #[test]
    fn post_model_converts_field_for_field() {
        let created_at = Utc::now();
        let post = Post::from(posts::Model {
            id: 3,
            title: "t".into(),
            content: "c".into(),
            published: false,
            rating: Some(2),
            created_at,
        });

        assert_eq!(post.id, 3);
        assert_eq!(post.title, "t");
        assert!(!post.published);
        assert_eq!(post.rating, Some(2));
        assert_eq!(post.created_at, created_at);
    }

    #[test]
    fn user_model_keeps_password_as_hash() {
        let user = User::from(users::Model {
            id: 9,
            email: "a@b.com".into(),
            password: "$argon2id$digest".into(),
            created_at: Utc::now(),
        });

        assert_eq!(user.password_hash, "$argon2id$digest");
    }

    // Integration tests - run with DATABASE_URL set
    // cargo test -p postline-server -- --ignored

    async fn store() -> OrmStore {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let store = OrmStore::connect(&url, 5).await.expect("connect failed");
        migrations::run_orm(store.connection()).await.expect("migrations failed");
        store
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn post_lifecycle() {
        conformance::post_lifecycle(&store().await).await;
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn user_lifecycle() {
        conformance::user_lifecycle(&store().await).await;
    }
}
