//! Repository implementations for database operations
//
// User accounts and voice profiles
pub mod user;
//
// Recordings and their upload lifecycle
pub mod recording;
//
// Transcription and debrief artifacts (one per recording)
pub mod debrief;
pub mod transcript;
//
// Background job bookkeeping (claiming, retries, reaping)
pub mod job;
//
// Chat sessions and messages
pub mod chat;

pub use chat::ChatRepository;
pub use debrief::DebriefRepository;
pub use job::JobRepository;
pub use recording::RecordingRepository;
pub use transcript::TranscriptRepository;
pub use user::UserRepository;
