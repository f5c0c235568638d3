use chrono::{NaiveDate, Utc};
use komuchi_core::models::{ChatMessage, ChatRole, ChatSession};
use komuchi_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

/// Repository for chat sessions and their messages
///
/// Sessions are unique per `(user_id, session_date)` and per
/// `(user_id, recording_id)`; the get-or-create methods lean on those partial
/// unique indexes so concurrent first requests converge on one row.
#[derive(Clone)]
pub struct ChatRepository {
    pool: PgPool,
}

impl ChatRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_or_create_day_session(
        &self,
        user_id: Uuid,
        date: NaiveDate,
    ) -> Result<ChatSession, AppError> {
        let now = Utc::now();
        let session = sqlx::query_as::<Postgres, ChatSession>(
            r#"
            INSERT INTO chat_sessions (id, user_id, session_date, recording_id, created_at, updated_at)
            VALUES ($1, $2, $3, NULL, $4, $4)
            ON CONFLICT (user_id, session_date) WHERE session_date IS NOT NULL
            DO UPDATE SET updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(date)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(session)
    }

    pub async fn get_or_create_recording_session(
        &self,
        user_id: Uuid,
        recording_id: Uuid,
    ) -> Result<ChatSession, AppError> {
        let now = Utc::now();
        let session = sqlx::query_as::<Postgres, ChatSession>(
            r#"
            INSERT INTO chat_sessions (id, user_id, session_date, recording_id, created_at, updated_at)
            VALUES ($1, $2, NULL, $3, $4, $4)
            ON CONFLICT (user_id, recording_id) WHERE recording_id IS NOT NULL
            DO UPDATE SET updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(recording_id)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(session)
    }

    pub async fn get_session(&self, id: Uuid) -> Result<Option<ChatSession>, AppError> {
        let session =
            sqlx::query_as::<Postgres, ChatSession>("SELECT * FROM chat_sessions WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(session)
    }

    #[tracing::instrument(skip(self, content), fields(db.table = "chat_messages", db.operation = "insert", session_id = %session_id))]
    pub async fn add_message(
        &self,
        session_id: Uuid,
        role: ChatRole,
        content: String,
    ) -> Result<ChatMessage, AppError> {
        let message = sqlx::query_as::<Postgres, ChatMessage>(
            r#"
            INSERT INTO chat_messages (id, session_id, role, content, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(session_id)
        .bind(role)
        .bind(&content)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(message)
    }

    pub async fn list_messages(&self, session_id: Uuid) -> Result<Vec<ChatMessage>, AppError> {
        let messages = sqlx::query_as::<Postgres, ChatMessage>(
            "SELECT * FROM chat_messages WHERE session_id = $1 ORDER BY created_at ASC",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }

    /// True when the session already holds an assistant turn; the opener
    /// endpoint uses this to stay idempotent.
    pub async fn has_assistant_message(&self, session_id: Uuid) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM chat_messages
                WHERE session_id = $1 AND role = 'assistant'
            )
            "#,
        )
        .bind(session_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }
}
