//! Request authentication.
//!
//! Clients identify themselves with an `x-user-id` header carrying their
//! user UUID. The middleware verifies the user exists and stashes a
//! [`CurrentUser`] in request extensions for handlers to extract.

pub mod middleware;
mod models;

pub use models::CurrentUser;
