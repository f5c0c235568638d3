//! Komuchi Services Layer
//!
//! This crate is the **business service layer**: recording lifecycle, job
//! orchestration, chat sessions, conversation context, and voice profiles.
//! Both the API handlers and the worker call into it; keep HTTP concerns in
//! komuchi-api and SQL in komuchi-db.

pub mod services;

pub use services::chat::{ChatScope, ChatService, Opener};
pub use services::context::{ContextService, DayContext, RecordingContext};
pub use services::job::JobService;
pub use services::recording::{NewRecording, RecordingService, UploadCompletion};
pub use services::user::UserService;
pub use services::voice_profile::VoiceProfileService;
