use std::sync::Arc;

use bytes::Bytes;
use uuid::Uuid;

use komuchi_ai::{VoiceEmbeddingClient, VOICE_EMBEDDING_DIM};
use komuchi_core::validation::is_allowed_recording_mime;
use komuchi_core::AppError;
use komuchi_db::UserRepository;

/// Voice profile enrollment: embeds a voice sample through the diarization
/// client and stores the embedding on the user.
#[derive(Clone)]
pub struct VoiceProfileService {
    users: UserRepository,
    embeddings: Arc<dyn VoiceEmbeddingClient>,
}

impl VoiceProfileService {
    pub fn new(users: UserRepository, embeddings: Arc<dyn VoiceEmbeddingClient>) -> Self {
        Self { users, embeddings }
    }

    /// Whether the user has an enrolled voice profile.
    pub async fn status(&self, user_id: Uuid) -> Result<bool, AppError> {
        let user = self
            .users
            .get(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User not found: {}", user_id)))?;
        Ok(user.has_voice_profile)
    }

    /// Embed a voice sample and store it as the user's profile. Replaces any
    /// existing enrollment.
    #[tracing::instrument(skip(self, audio), fields(user_id = %user_id, mime_type = %mime_type, audio_size = audio.len()))]
    pub async fn enroll(
        &self,
        user_id: Uuid,
        audio: Bytes,
        mime_type: &str,
    ) -> Result<(), AppError> {
        if !is_allowed_recording_mime(mime_type) {
            return Err(AppError::InvalidFileType(format!(
                "Unsupported mime type: {}",
                mime_type
            )));
        }
        if audio.is_empty() {
            return Err(AppError::Validation("audio sample is empty".to_string()));
        }

        let embedding = self
            .embeddings
            .embed(audio, mime_type)
            .await
            .map_err(|e| AppError::Provider(format!("Voice embedding failed: {}", e)))?;

        if embedding.len() != VOICE_EMBEDDING_DIM {
            return Err(AppError::Validation(format!(
                "Voice embedding must have {} dimensions, got {}",
                VOICE_EMBEDDING_DIM,
                embedding.len()
            )));
        }

        self.users
            .set_voice_profile(user_id, &embedding)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User not found: {}", user_id)))?;

        tracing::info!("Voice profile enrolled");
        Ok(())
    }

    /// Clear the user's voice profile and embedding.
    pub async fn delete(&self, user_id: Uuid) -> Result<(), AppError> {
        self.users
            .clear_voice_profile(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User not found: {}", user_id)))?;

        tracing::info!(user_id = %user_id, "Voice profile deleted");
        Ok(())
    }
}
