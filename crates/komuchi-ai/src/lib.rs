//! AI provider integrations for Komuchi.
//!
//! Defines the provider traits (transcription, debrief, chat, voice
//! embedding) plus their OpenAI, diarization-sidecar, and mock
//! implementations, with factories keyed off configuration.

pub mod diarization;
pub mod factory;
pub mod mock;
pub mod openai;
pub mod providers;

pub use diarization::DiarizationClient;
pub use factory::{
    create_chat_provider, create_debrief_provider, create_transcription_provider,
    create_voice_embedding_client,
};
pub use mock::{MockChat, MockDebrief, MockTranscription, MockVoiceEmbedding};
pub use openai::{OpenAiChat, OpenAiDebrief, OpenAiTranscription};
pub use providers::{
    ChatProvider, ChatTurn, DebriefProvider, DebriefRequest, DebriefResult, TranscriptionProvider,
    TranscriptionResult, TurnRole, VoiceEmbeddingClient, VOICE_EMBEDDING_DIM,
};
