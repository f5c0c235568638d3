//! HTTP request handlers, one module per feature area.

pub mod chat;
pub mod health;
pub mod recordings;
pub mod voice_profile;
