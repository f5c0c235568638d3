use uuid::Uuid;

use komuchi_core::models::User;
use komuchi_core::validation::is_valid_email;
use komuchi_core::AppError;
use komuchi_db::UserRepository;

/// Account management. Users are keyed by email; lookups by id come from the
/// `x-user-id` header.
#[derive(Clone)]
pub struct UserService {
    users: UserRepository,
}

impl UserService {
    pub fn new(users: UserRepository) -> Self {
        Self { users }
    }

    /// Create a user with a validated email address.
    #[tracing::instrument(skip(self))]
    pub async fn create_user(&self, email: &str) -> Result<User, AppError> {
        let email = email.trim();
        if !is_valid_email(email) {
            return Err(AppError::Validation(format!(
                "Invalid email address: {}",
                email
            )));
        }

        let user = self.users.create(email.to_string()).await?;
        tracing::info!(user_id = %user.id, "User created");
        Ok(user)
    }

    pub async fn get_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        self.users.get(id).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        self.users.get_by_email(email.trim()).await
    }

    /// Look up a user by email, creating them on first sight. Idempotent.
    #[tracing::instrument(skip(self))]
    pub async fn get_or_create_user(&self, email: &str) -> Result<User, AppError> {
        let email = email.trim();
        if !is_valid_email(email) {
            return Err(AppError::Validation(format!(
                "Invalid email address: {}",
                email
            )));
        }

        self.users.get_or_create(email.to_string()).await
    }

    pub async fn delete_user(&self, id: Uuid) -> Result<(), AppError> {
        if !self.users.delete(id).await? {
            return Err(AppError::NotFound(format!("User not found: {}", id)));
        }
        tracing::info!(user_id = %id, "User deleted");
        Ok(())
    }
}
