//! Database layer for the local cache

mod cache_repository;
mod connection;
mod migrations;

pub use cache_repository::{CacheRepository, SqliteCacheRepository};
pub use connection::Database;
