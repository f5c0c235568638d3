//! AI provider abstractions.
//!
//! Transcription, debrief generation, chat completion, and voice embedding are
//! pluggable: cloud implementations (OpenAI, the diarization sidecar) live in
//! [`crate::openai`] and [`crate::diarization`], deterministic in-process
//! versions in [`crate::mock`] back tests and local development.

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;

use komuchi_core::models::{ChatRole, DebriefSection, RecordingMode, TranscriptSegment};

/// Required embedding dimension for voice profiles.
pub const VOICE_EMBEDDING_DIM: usize = 512;

/// Output of a transcription run.
#[derive(Debug, Clone)]
pub struct TranscriptionResult {
    pub text: String,
    pub segments: Vec<TranscriptSegment>,
    /// Language tag as reported by the provider (e.g. "en").
    pub language: String,
    pub duration_seconds: f64,
}

/// Input for debrief generation.
#[derive(Debug, Clone)]
pub struct DebriefRequest {
    pub transcript_text: String,
    pub mode: RecordingMode,
    pub title: String,
}

/// Output of debrief generation.
#[derive(Debug, Clone)]
pub struct DebriefResult {
    pub markdown: String,
    pub sections: Vec<DebriefSection>,
}

/// Wire-level role for chat completion requests. Unlike the persisted
/// [`ChatRole`], system turns exist here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnRole {
    System,
    User,
    Assistant,
}

impl TurnRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnRole::System => "system",
            TurnRole::User => "user",
            TurnRole::Assistant => "assistant",
        }
    }
}

impl From<ChatRole> for TurnRole {
    fn from(role: ChatRole) -> Self {
        match role {
            ChatRole::User => TurnRole::User,
            ChatRole::Assistant => TurnRole::Assistant,
        }
    }
}

/// One message of a conversation passed to the chat model.
#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub role: TurnRole,
    pub content: String,
}

impl ChatTurn {
    pub fn system(content: impl Into<String>) -> Self {
        ChatTurn {
            role: TurnRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        ChatTurn {
            role: TurnRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        ChatTurn {
            role: TurnRole::Assistant,
            content: content.into(),
        }
    }
}

/// Speech-to-text provider.
#[async_trait]
pub trait TranscriptionProvider: Send + Sync {
    /// Provider name recorded in logs (e.g. "openai", "mock").
    fn name(&self) -> &str;

    /// Transcribe an audio file into text with diarized segments.
    async fn transcribe(
        &self,
        audio: Bytes,
        mime_type: &str,
        filename: &str,
    ) -> Result<TranscriptionResult>;
}

/// Generator of structured debriefs from transcripts.
#[async_trait]
pub trait DebriefProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn generate(&self, request: DebriefRequest) -> Result<DebriefResult>;
}

/// Conversational completion provider backing the reflection chat.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Complete a conversation, returning the assistant's reply.
    async fn complete(&self, messages: &[ChatTurn]) -> Result<String>;
}

/// Client for the diarization service's voice embedding endpoint.
#[async_trait]
pub trait VoiceEmbeddingClient: Send + Sync {
    fn name(&self) -> &str;

    /// Embed a voice sample. Must return exactly [`VOICE_EMBEDDING_DIM`] dimensions.
    async fn embed(&self, audio: Bytes, mime_type: &str) -> Result<Vec<f32>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turn_role_maps_from_chat_role() {
        assert_eq!(TurnRole::from(ChatRole::User), TurnRole::User);
        assert_eq!(TurnRole::from(ChatRole::Assistant), TurnRole::Assistant);
    }

    #[test]
    fn turn_constructors_set_roles() {
        assert_eq!(ChatTurn::system("a").role.as_str(), "system");
        assert_eq!(ChatTurn::user("b").role.as_str(), "user");
        assert_eq!(ChatTurn::assistant("c").role.as_str(), "assistant");
    }
}
