//! Command implementations for the postline CLI

pub mod serve;

pub use serve::run_serve;
