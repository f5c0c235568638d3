use std::sync::Arc;

use chrono::NaiveDate;
use uuid::Uuid;

use komuchi_ai::{ChatProvider, ChatTurn};
use komuchi_core::models::{ChatMessage, ChatRole, ChatSession};
use komuchi_core::AppError;
use komuchi_db::{ChatRepository, RecordingRepository};

use crate::services::context::ContextService;

/// Which conversation a chat request addresses: one calendar day or one
/// recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatScope {
    Day(NaiveDate),
    Recording(Uuid),
}

/// Result of an opener request. `message` is present only when a new opener
/// was generated.
#[derive(Debug, Clone)]
pub struct Opener {
    pub already_has_opener: bool,
    pub message: Option<ChatMessage>,
}

const OPENER_SYSTEM_PROMPT: &str =
    "You are a reflective journaling companion. Open the conversation with one short, \
     specific question or observation grounded in the provided context. If there is no \
     context, ask a gentle general question about the user's day.";

/// Chat sessions and messages, plus opener generation through the chat
/// provider.
#[derive(Clone)]
pub struct ChatService {
    sessions: ChatRepository,
    recordings: RecordingRepository,
    context: ContextService,
    chat_provider: Arc<dyn ChatProvider>,
}

impl ChatService {
    pub fn new(
        sessions: ChatRepository,
        recordings: RecordingRepository,
        context: ContextService,
        chat_provider: Arc<dyn ChatProvider>,
    ) -> Self {
        Self {
            sessions,
            recordings,
            context,
            chat_provider,
        }
    }

    /// Get or create the user's session for a calendar day, with its messages
    /// in order.
    #[tracing::instrument(skip(self), fields(user_id = %user_id, date = %date))]
    pub async fn get_or_create_day_session(
        &self,
        user_id: Uuid,
        date: NaiveDate,
    ) -> Result<(ChatSession, Vec<ChatMessage>), AppError> {
        let session = self.sessions.get_or_create_day_session(user_id, date).await?;
        let messages = self.sessions.list_messages(session.id).await?;
        Ok((session, messages))
    }

    /// Get or create the session scoped to one of the user's recordings.
    /// Recordings owned by other users are NotFound.
    #[tracing::instrument(skip(self), fields(user_id = %user_id, recording_id = %recording_id))]
    pub async fn get_or_create_recording_session(
        &self,
        user_id: Uuid,
        recording_id: Uuid,
    ) -> Result<(ChatSession, Vec<ChatMessage>), AppError> {
        self.recordings
            .get_for_user(recording_id, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Recording not found: {}", recording_id)))?;

        let session = self
            .sessions
            .get_or_create_recording_session(user_id, recording_id)
            .await?;
        let messages = self.sessions.list_messages(session.id).await?;
        Ok((session, messages))
    }

    pub async fn add_message(
        &self,
        session_id: Uuid,
        role: ChatRole,
        content: String,
    ) -> Result<ChatMessage, AppError> {
        self.sessions
            .get_session(session_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Chat session not found: {}", session_id)))?;
        self.sessions.add_message(session_id, role, content).await
    }

    /// Generate the assistant's opening message for a session. Idempotent: if
    /// an assistant message already exists, reports that instead of calling
    /// the provider again.
    #[tracing::instrument(skip(self), fields(user_id = %user_id))]
    pub async fn generate_opener(
        &self,
        user_id: Uuid,
        scope: ChatScope,
    ) -> Result<Opener, AppError> {
        let (session, _) = match scope {
            ChatScope::Day(date) => self.get_or_create_day_session(user_id, date).await?,
            ChatScope::Recording(id) => self.get_or_create_recording_session(user_id, id).await?,
        };

        if self.sessions.has_assistant_message(session.id).await? {
            return Ok(Opener {
                already_has_opener: true,
                message: None,
            });
        }

        let context = match scope {
            ChatScope::Day(date) => self.context.day_context(user_id, date).await?.context,
            ChatScope::Recording(id) => {
                self.context.recording_context(id, user_id).await?.context
            }
        };

        let turns = build_opener_turns(&context);
        let content = self
            .chat_provider
            .complete(&turns)
            .await
            .map_err(|e| AppError::Provider(format!("Chat completion failed: {}", e)))?;

        let message = self
            .sessions
            .add_message(session.id, ChatRole::Assistant, content)
            .await?;

        tracing::info!(session_id = %session.id, "Opener generated");

        Ok(Opener {
            already_has_opener: false,
            message: Some(message),
        })
    }
}

fn build_opener_turns(context: &str) -> Vec<ChatTurn> {
    let user_content = if context.is_empty() {
        "No recordings yet for this conversation. Start the conversation.".to_string()
    } else {
        format!(
            "Context from recordings:\n\n{}\n\nStart the conversation.",
            context
        )
    };
    vec![
        ChatTurn::system(OPENER_SYSTEM_PROMPT),
        ChatTurn::user(user_content),
    ]
}
