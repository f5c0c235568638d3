//! Data models for the application
//!
//! This module contains all data structures used throughout the application,
//! organized by domain. Each sub-module represents a specific feature area.

mod chat;
mod debrief;
mod job;
mod recording;
mod transcript;
mod user;

// Re-export all models for convenient imports
pub use chat::*;
pub use debrief::*;
pub use job::*;
pub use recording::*;
pub use transcript::*;
pub use user::*;
