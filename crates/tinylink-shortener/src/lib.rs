//! URL shortener service implementation.
//!
//! [`ShortenerService`] allocates short codes on top of any
//! [`Repository`](tinylink_core::Repository) and
//! [`Generator`](tinylink_generator::Generator). Core types are re-exported
//! from `tinylink_core`.

pub mod config;
pub mod service;
pub mod validation;

pub use config::{ShortenerConfig, DEFAULT_MAX_ATTEMPTS};
pub use service::ShortenerService;
pub use tinylink_core::{ShortCode, Shortener, ShortenerError, UrlRecord};
pub use validation::validate_destination;
