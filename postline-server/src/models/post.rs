//! Post records and their validated write form

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::ValidationError;

/// Maximum length for post titles (matches the VARCHAR(255) column)
const MAX_TITLE_LEN: usize = 255;

/// Post record as stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Post {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub published: bool,
    pub rating: Option<i32>,
    pub created_at: DateTime<Utc>,
}

/// Create/replace request body
#[derive(Debug, Clone, Deserialize)]
pub struct PostInput {
    pub title: String,
    pub content: String,
    #[serde(default = "default_published")]
    pub published: bool,
    #[serde(default)]
    pub rating: Option<i32>,
}

fn default_published() -> bool {
    true
}

/// Validated post fields, used for both create and full replace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    title: String,
    content: String,
    published: bool,
    rating: Option<i32>,
}

impl NewPost {
    /// Validate and build post fields.
    ///
    /// # Rules
    /// - title: non-blank, max 255 characters
    /// - content: non-blank
    pub fn new(
        title: &str,
        content: &str,
        published: bool,
        rating: Option<i32>,
    ) -> Result<Self, ValidationError> {
        if title.trim().is_empty() {
            return Err(ValidationError::Empty { field: "title" });
        }

        if title.chars().count() > MAX_TITLE_LEN {
            return Err(ValidationError::TooLong {
                field: "title",
                max: MAX_TITLE_LEN,
            });
        }

        if content.trim().is_empty() {
            return Err(ValidationError::Empty { field: "content" });
        }

        Ok(Self {
            title: title.to_owned(),
            content: content.to_owned(),
            published,
            rating,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn published(&self) -> bool {
        self.published
    }

    pub fn rating(&self) -> Option<i32> {
        self.rating
    }
}

impl TryFrom<PostInput> for NewPost {
    type Error = ValidationError;

    fn try_from(input: PostInput) -> Result<Self, Self::Error> {
        Self::new(&input.title, &input.content, input.published, input.rating)
    }
}
