//! Komuchi Storage Library
//!
//! This crate provides the storage abstraction used for recording audio.
//! It includes the Storage trait and S3, local filesystem, and in-memory
//! implementations.
//!
//! # Storage key format
//!
//! All backends share the same key layout: `recordings/{user_id}/{recording_id}.{ext}`.
//! Keys must not contain `..`, `.` components, backslashes, or a leading `/`;
//! every backend validates this before touching the key.

pub mod factory;
pub mod local;
pub mod memory;
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use komuchi_core::StorageBackend;
pub use local::LocalStorage;
pub use memory::MemoryStorage;
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult};
