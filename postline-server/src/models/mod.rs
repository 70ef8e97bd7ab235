//! Domain models with validation at construction
//!
//! Request input is validated when building these types.
//! Invalid input returns ValidationError, not panic.

pub mod post;
pub mod user;
pub mod validation;

pub use post::{NewPost, Post, PostInput};
pub use user::{Email, NewUser, User};
pub use validation::ValidationError;
