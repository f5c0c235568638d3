use chrono::Utc;
use komuchi_core::models::User;
use komuchi_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

/// Repository for user accounts and their voice profiles
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, email: String) -> Result<User, AppError> {
        let now = Utc::now();
        let user = sqlx::query_as::<Postgres, User>(
            r#"
            INSERT INTO users (id, email, has_voice_profile, created_at, updated_at)
            VALUES ($1, $2, FALSE, $3, $3)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<Postgres, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<Postgres, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Insert the user if the email is new, otherwise return the existing row.
    pub async fn get_or_create(&self, email: String) -> Result<User, AppError> {
        let now = Utc::now();
        let user = sqlx::query_as::<Postgres, User>(
            r#"
            INSERT INTO users (id, email, has_voice_profile, created_at, updated_at)
            VALUES ($1, $2, FALSE, $3, $3)
            ON CONFLICT (email) DO UPDATE SET updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    #[tracing::instrument(skip(self, embedding), fields(db.table = "users", db.operation = "update", db.record_id = %id))]
    pub async fn set_voice_profile(
        &self,
        id: Uuid,
        embedding: &[f32],
    ) -> Result<Option<User>, AppError> {
        let embedding_json = serde_json::to_value(embedding)?;
        let user = sqlx::query_as::<Postgres, User>(
            r#"
            UPDATE users
            SET has_voice_profile = TRUE, voice_embedding = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(embedding_json)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "update", db.record_id = %id))]
    pub async fn clear_voice_profile(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<Postgres, User>(
            r#"
            UPDATE users
            SET has_voice_profile = FALSE, voice_embedding = NULL, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let rows_affected = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(rows_affected > 0)
    }
}
