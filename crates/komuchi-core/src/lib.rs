//! Komuchi Core Library
//!
//! This crate provides core domain models, error types, configuration, and validation
//! that are shared across all Komuchi components.

pub mod config;
pub mod error;
pub mod job_error;
pub mod models;
pub mod pagination;
pub mod storage_types;
pub mod validation;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use job_error::{JobError, JobResultExt};
pub use pagination::{Page, PageParams, Pagination};
pub use storage_types::StorageBackend;
