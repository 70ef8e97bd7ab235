//! Route handlers organized by resource

pub mod auth;
pub mod posts;
pub mod root;
pub mod users;


use serde::Serialize;

/// `{"data": ...}` envelope for read and replace responses
#[derive(Debug, Serialize)]
pub struct Data<T> {
    pub data: T,
}

impl<T> Data<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}
