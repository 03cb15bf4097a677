//! Poll repository.

use std::sync::Arc;

use crate::entities::{Poll, PollOption, poll, poll_option};
use polling_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    TransactionTrait, sea_query::Expr,
};

/// Changes to apply to a poll's option list.
#[derive(Debug, Default)]
pub struct OptionChanges {
    /// Options to delete.
    pub remove_ids: Vec<String>,
    /// Surviving options and their new display position.
    pub reorder: Vec<(String, i32)>,
    /// Options to add.
    pub insert: Vec<poll_option::ActiveModel>,
}

impl OptionChanges {
    /// Whether applying these changes would touch the database.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.remove_ids.is_empty() && self.reorder.is_empty() && self.insert.is_empty()
    }
}

/// Poll repository for database operations.
///
/// Options are owned by their poll, so they are read and written here too.
#[derive(Clone)]
pub struct PollRepository {
    db: Arc<DatabaseConnection>,
}

impl PollRepository {
    /// Create a new poll repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a poll by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<poll::Model>> {
        Poll::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a poll by ID, returning error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<poll::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::PollNotFound(id.to_string()))
    }

    /// List all polls, newest first.
    pub async fn find_all(&self) -> AppResult<Vec<poll::Model>> {
        Poll::find()
            .order_by_desc(poll::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a poll together with its options in one transaction.
    pub async fn create_with_options(
        &self,
        model: poll::ActiveModel,
        options: Vec<poll_option::ActiveModel>,
    ) -> AppResult<poll::Model> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let poll = model
            .insert(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if !options.is_empty() {
            PollOption::insert_many(options)
                .exec_without_returning(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(poll)
    }

    /// Update a poll and apply option changes in one transaction.
    pub async fn update_with_options(
        &self,
        model: poll::ActiveModel,
        changes: OptionChanges,
    ) -> AppResult<poll::Model> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let poll = model
            .update(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if !changes.remove_ids.is_empty() {
            PollOption::delete_many()
                .filter(poll_option::Column::Id.is_in(changes.remove_ids))
                .exec(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }

        for (id, idx) in changes.reorder {
            PollOption::update_many()
                .col_expr(poll_option::Column::Idx, Expr::value(idx))
                .filter(poll_option::Column::Id.eq(id))
                .exec(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }

        if !changes.insert.is_empty() {
            PollOption::insert_many(changes.insert)
                .exec_without_returning(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(poll)
    }

    /// Get a poll's options in display order.
    pub async fn find_options(&self, poll_id: &str) -> AppResult<Vec<poll_option::Model>> {
        PollOption::find()
            .filter(poll_option::Column::PollId.eq(poll_id))
            .order_by_asc(poll_option::Column::Idx)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a poll's option texts sorted lexicographically.
    pub async fn find_option_texts(&self, poll_id: &str) -> AppResult<Vec<String>> {
        let options = PollOption::find()
            .filter(poll_option::Column::PollId.eq(poll_id))
            .order_by_asc(poll_option::Column::OptionText)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(options.into_iter().map(|o| o.option_text).collect())
    }

    /// Find a poll's option by its text.
    pub async fn find_option(
        &self,
        poll_id: &str,
        option_text: &str,
    ) -> AppResult<Option<poll_option::Model>> {
        PollOption::find()
            .filter(poll_option::Column::PollId.eq(poll_id))
            .filter(poll_option::Column::OptionText.eq(option_text))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get every option of every poll.
    pub async fn find_all_options(&self) -> AppResult<Vec<poll_option::Model>> {
        PollOption::find()
            .order_by_asc(poll_option::Column::PollId)
            .order_by_asc(poll_option::Column::Idx)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
