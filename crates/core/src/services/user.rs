//! User service.

use chrono::Utc;
use polling_common::{AppError, AppResult, IdGenerator};
use polling_db::{entities::user, repositories::UserRepository};
use sea_orm::Set;
use tracing::info;

/// User service for business logic.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub const fn new(user_repo: UserRepository) -> Self {
        Self {
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create an administrator named `username` with a fresh token, unless
    /// a user of that name already exists.
    ///
    /// Returns the new user, or `None` when nothing was created.
    pub async fn ensure_admin(&self, username: &str) -> AppResult<Option<user::Model>> {
        if username.trim().is_empty() {
            return Err(AppError::Validation("Username is required.".to_string()));
        }
        if self.user_repo.find_by_username(username).await?.is_some() {
            return Ok(None);
        }

        let model = user::ActiveModel {
            id: Set(self.id_gen.generate()),
            username: Set(username.to_string()),
            token: Set(Some(self.id_gen.generate_token())),
            is_admin: Set(true),
            created_at: Set(Utc::now().into()),
        };

        let admin = self.user_repo.create(model).await?;
        info!(user_id = %admin.id, username = %admin.username, "Administrator created");
        Ok(Some(admin))
    }

    /// Authenticate by API token.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<user::Model> {
        if token.is_empty() {
            return Err(AppError::Unauthorized);
        }
        self.user_repo
            .find_by_token(token)
            .await?
            .ok_or(AppError::Unauthorized)
    }
}
