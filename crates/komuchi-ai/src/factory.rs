use anyhow::{Context, Result};
use std::sync::Arc;

use komuchi_core::config::ProviderKind;
use komuchi_core::Config;

use crate::diarization::DiarizationClient;
use crate::mock::{MockChat, MockDebrief, MockTranscription, MockVoiceEmbedding};
use crate::openai::{OpenAiChat, OpenAiDebrief, OpenAiTranscription};
use crate::providers::{ChatProvider, DebriefProvider, TranscriptionProvider, VoiceEmbeddingClient};

fn openai_api_key(config: &Config) -> Result<String> {
    config
        .openai_api_key()
        .map(String::from)
        .context("OPENAI_API_KEY not configured")
}

/// Create the transcription provider selected by configuration.
pub fn create_transcription_provider(config: &Config) -> Result<Arc<dyn TranscriptionProvider>> {
    match config.transcription_provider() {
        ProviderKind::OpenAi => {
            let provider = OpenAiTranscription::new(
                openai_api_key(config)?,
                config.openai_base_url().to_string(),
            )?;
            Ok(Arc::new(provider))
        }
        ProviderKind::Mock => Ok(Arc::new(MockTranscription)),
    }
}

/// Create the debrief provider selected by configuration.
pub fn create_debrief_provider(config: &Config) -> Result<Arc<dyn DebriefProvider>> {
    match config.debrief_provider() {
        ProviderKind::OpenAi => {
            let provider =
                OpenAiDebrief::new(openai_api_key(config)?, config.openai_base_url().to_string())?;
            Ok(Arc::new(provider))
        }
        ProviderKind::Mock => Ok(Arc::new(MockDebrief)),
    }
}

/// Create the chat provider selected by configuration.
pub fn create_chat_provider(config: &Config) -> Result<Arc<dyn ChatProvider>> {
    match config.chat_provider() {
        ProviderKind::OpenAi => {
            let provider =
                OpenAiChat::new(openai_api_key(config)?, config.openai_base_url().to_string())?;
            Ok(Arc::new(provider))
        }
        ProviderKind::Mock => Ok(Arc::new(MockChat)),
    }
}

/// Create the voice embedding client. Falls back to the deterministic mock
/// when `DIARIZATION_SERVICE_URL` is unset so local setups without the
/// sidecar still boot.
pub fn create_voice_embedding_client(config: &Config) -> Result<Arc<dyn VoiceEmbeddingClient>> {
    match config.diarization_service_url() {
        Some(url) => Ok(Arc::new(DiarizationClient::new(url.to_string())?)),
        None => {
            tracing::warn!(
                "DIARIZATION_SERVICE_URL not set, voice enrollment uses the mock embedding client"
            );
            Ok(Arc::new(MockVoiceEmbedding))
        }
    }
}
