//! Storage backends for Tinylink.
//!
//! Both backends enforce uniqueness on the short code and on the content
//! hash, and report a violation as [`StorageError::Conflict`].

pub mod memory;
pub mod mysql;

pub use memory::InMemoryRepository;
pub use mysql::MySqlRepository;
pub use tinylink_core::repository::{ReadRepository, Repository, Result, UrlRecord};
pub use tinylink_core::StorageError;
