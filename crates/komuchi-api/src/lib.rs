//! Komuchi HTTP API.
//!
//! Axum server exposing the recording, chat, voice-profile, and health
//! endpoints, backed by the service layer and the background job queue.
//! [`setup::initialize_app`] wires the whole application; integration tests
//! reuse [`setup::routes`] with their own state.

pub mod auth;
pub mod error;
mod handlers;
mod middleware;
mod response;
pub mod setup;
pub mod state;

pub use error::{ErrorResponse, HttpAppError};
