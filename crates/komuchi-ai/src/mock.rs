//! Deterministic in-process providers for tests and local development.
//!
//! Outputs are fixed so tests can assert on them without network access.

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;

use komuchi_core::models::{DebriefSection, TranscriptSegment};

use crate::providers::{
    ChatProvider, ChatTurn, DebriefProvider, DebriefRequest, DebriefResult, TranscriptionProvider,
    TranscriptionResult, VoiceEmbeddingClient, VOICE_EMBEDDING_DIM,
};

/// Transcription provider returning a fixed transcript.
#[derive(Debug, Clone, Default)]
pub struct MockTranscription;

#[async_trait]
impl TranscriptionProvider for MockTranscription {
    fn name(&self) -> &str {
        "mock"
    }

    async fn transcribe(
        &self,
        _audio: Bytes,
        _mime_type: &str,
        filename: &str,
    ) -> Result<TranscriptionResult> {
        Ok(TranscriptionResult {
            text: format!("Mock transcript: {}", filename),
            segments: vec![TranscriptSegment {
                start: 0.0,
                end: 5.0,
                text: "Hello world".to_string(),
                speaker: Some("speaker_0".to_string()),
            }],
            language: "en".to_string(),
            duration_seconds: 5.0,
        })
    }
}

/// Debrief provider returning a fixed two-section debrief.
#[derive(Debug, Clone, Default)]
pub struct MockDebrief;

#[async_trait]
impl DebriefProvider for MockDebrief {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, request: DebriefRequest) -> Result<DebriefResult> {
        let markdown = format!(
            "## Summary\n\nMock debrief of \"{}\".\n\n## Key Points\n\n- Mock key point",
            request.title
        );
        Ok(DebriefResult {
            markdown,
            sections: vec![
                DebriefSection {
                    title: "Summary".to_string(),
                    content: format!("Mock debrief of \"{}\".", request.title),
                    order: 0,
                },
                DebriefSection {
                    title: "Key Points".to_string(),
                    content: "- Mock key point".to_string(),
                    order: 1,
                },
            ],
        })
    }
}

/// Chat provider answering every conversation the same way.
#[derive(Debug, Clone, Default)]
pub struct MockChat;

#[async_trait]
impl ChatProvider for MockChat {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, _messages: &[ChatTurn]) -> Result<String> {
        Ok("Mock AI response".to_string())
    }
}

/// Voice embedding client returning a constant unit vector.
#[derive(Debug, Clone, Default)]
pub struct MockVoiceEmbedding;

#[async_trait]
impl VoiceEmbeddingClient for MockVoiceEmbedding {
    fn name(&self) -> &str {
        "mock"
    }

    async fn embed(&self, _audio: Bytes, _mime_type: &str) -> Result<Vec<f32>> {
        Ok(vec![0.1; VOICE_EMBEDDING_DIM])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use komuchi_core::models::RecordingMode;

    #[tokio::test]
    async fn mock_transcription_embeds_filename() {
        let result = MockTranscription
            .transcribe(Bytes::from_static(b"audio"), "audio/mpeg", "call.mp3")
            .await
            .unwrap();

        assert_eq!(result.text, "Mock transcript: call.mp3");
        assert_eq!(result.segments.len(), 1);
        assert_eq!(result.segments[0].speaker.as_deref(), Some("speaker_0"));
        assert_eq!(result.language, "en");
        assert_eq!(result.duration_seconds, 5.0);
    }

    #[tokio::test]
    async fn mock_debrief_returns_two_sections() {
        let result = MockDebrief
            .generate(DebriefRequest {
                transcript_text: "Hello world".to_string(),
                mode: RecordingMode::General,
                title: "Standup".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(result.sections.len(), 2);
        assert_eq!(result.sections[0].title, "Summary");
        assert_eq!(result.sections[1].title, "Key Points");
        assert!(result.markdown.contains("Standup"));
    }

    #[tokio::test]
    async fn mock_chat_answers_fixed_text() {
        let reply = MockChat.complete(&[ChatTurn::user("Hi")]).await.unwrap();
        assert_eq!(reply, "Mock AI response");
    }

    #[tokio::test]
    async fn mock_embedding_has_required_dimension() {
        let embedding = MockVoiceEmbedding
            .embed(Bytes::from_static(b"audio"), "audio/wav")
            .await
            .unwrap();

        assert_eq!(embedding.len(), VOICE_EMBEDDING_DIM);
        assert!(embedding.iter().all(|v| (*v - 0.1).abs() < f32::EPSILON));
    }
}
