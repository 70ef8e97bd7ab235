//! Authentication primitives
//!
//! Argon2 password hashing and HMAC-signed, time-limited bearer tokens.

pub mod password;
pub mod token;

pub use password::{hash_password, verify_password, PasswordError};
pub use token::{Claims, TokenError, TokenService};
