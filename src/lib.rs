/// Chithi Library
/// Letters between users, persisted in a local revisioned key-value store

pub mod cli;
pub mod collection;
pub mod config;
pub mod error;
pub mod keys;
pub mod models;
pub mod services;
pub mod storage;
pub mod templates;

pub use config::Config;
pub use error::{AppError, Result};
pub use services::Chithi;
