//! Role provisioning.

use chrono::Utc;
use polling_common::AppResult;
use polling_db::{entities::role, repositories::RoleRepository};
use sea_orm::Set;
use tracing::{debug, info};

/// Default name of the role granted to people who take part in polls.
pub const DEFAULT_POLLING_USER_ROLE: &str = "Polling User";

/// Role service.
#[derive(Clone)]
pub struct RoleService {
    role_repo: RoleRepository,
    polling_user_role: String,
}

impl RoleService {
    /// Create a new role service provisioning `polling_user_role`.
    #[must_use]
    pub fn new(role_repo: RoleRepository, polling_user_role: impl Into<String>) -> Self {
        Self {
            role_repo,
            polling_user_role: polling_user_role.into(),
        }
    }

    /// Create the polling user role unless it already exists.
    ///
    /// Returns `true` when the role was created.
    pub async fn ensure_polling_user_role(&self) -> AppResult<bool> {
        if self.role_repo.exists(&self.polling_user_role).await? {
            debug!(role = %self.polling_user_role, "Role already present");
            return Ok(false);
        }

        self.role_repo
            .create(role::ActiveModel {
                name: Set(self.polling_user_role.clone()),
                desk_access: Set(true),
                disabled: Set(false),
                is_custom: Set(true),
                created_at: Set(Utc::now().into()),
            })
            .await?;

        info!(role = %self.polling_user_role, "Role provisioned");
        Ok(true)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn polling_user() -> role::Model {
        role::Model {
            name: DEFAULT_POLLING_USER_ROLE.to_string(),
            desk_access: true,
            disabled: false,
            is_custom: true,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_creates_missing_role() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<role::Model>::new()])
            .append_query_results([[polling_user()]])
            .into_connection();

        let service = RoleService::new(RoleRepository::new(Arc::new(db)), DEFAULT_POLLING_USER_ROLE);

        assert!(service.ensure_polling_user_role().await.unwrap());
    }

    #[tokio::test]
    async fn test_existing_role_is_left_alone() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[polling_user()]])
            .into_connection();

        let service = RoleService::new(RoleRepository::new(Arc::new(db)), DEFAULT_POLLING_USER_ROLE);

        assert!(!service.ensure_polling_user_role().await.unwrap());
    }
}
