//! Domain services, one module per feature area.

pub mod chat;
pub mod context;
pub mod job;
pub mod recording;
pub mod user;
pub mod voice_profile;

pub use chat::{ChatScope, ChatService, Opener};
pub use context::{ContextService, DayContext, RecordingContext};
pub use job::JobService;
pub use recording::{NewRecording, RecordingService, UploadCompletion};
pub use user::UserService;
pub use voice_profile::VoiceProfileService;
