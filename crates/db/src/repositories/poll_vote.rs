//! Poll vote repository.

use std::sync::Arc;

use crate::entities::{
    PollOption, PollVote, poll_option,
    poll_vote::{self, DocStatus},
};
use chrono::Utc;
use polling_common::{AppError, AppResult};
use sea_orm::{
    ActiveEnum, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, TransactionTrait, sea_query::Expr,
};

/// Poll vote repository for database operations.
#[derive(Clone)]
pub struct PollVoteRepository {
    db: Arc<DatabaseConnection>,
}

impl PollVoteRepository {
    /// Create a new poll vote repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a vote by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<poll_vote::Model>> {
        PollVote::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a vote by ID, returning error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<poll_vote::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::VoteNotFound(id.to_string()))
    }

    /// Create a new vote.
    pub async fn create(&self, model: poll_vote::ActiveModel) -> AppResult<poll_vote::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a vote.
    pub async fn update(&self, model: poll_vote::ActiveModel) -> AppResult<poll_vote::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a vote.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        PollVote::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Check if a voter already has a submitted vote on a poll.
    pub async fn has_submitted_vote(&self, poll_id: &str, voter_id: &str) -> AppResult<bool> {
        let count = PollVote::find()
            .filter(poll_vote::Column::PollId.eq(poll_id))
            .filter(poll_vote::Column::VoterId.eq(voter_id))
            .filter(poll_vote::Column::Docstatus.eq(DocStatus::Submitted))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(count > 0)
    }

    /// List votes, optionally restricted to an owner and/or a poll, newest first.
    pub async fn find_filtered(
        &self,
        owner_id: Option<&str>,
        poll_id: Option<&str>,
    ) -> AppResult<Vec<poll_vote::Model>> {
        let mut query = PollVote::find();
        if let Some(owner_id) = owner_id {
            query = query.filter(poll_vote::Column::OwnerId.eq(owner_id));
        }
        if let Some(poll_id) = poll_id {
            query = query.filter(poll_vote::Column::PollId.eq(poll_id));
        }

        query
            .order_by_desc(poll_vote::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Mark a draft vote submitted and count it towards its option.
    ///
    /// Both writes happen in one transaction. If the vote is no longer a
    /// draft the result is [`AppError::Conflict`]; if no option of the poll
    /// carries the vote's text the result is [`AppError::NotFound`]. Either
    /// way nothing is written.
    pub async fn submit_and_increment(&self, vote: &poll_vote::Model) -> AppResult<()> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let now = Utc::now().fixed_offset();
        let marked = PollVote::update_many()
            .col_expr(
                poll_vote::Column::Docstatus,
                Expr::value(DocStatus::Submitted.into_value()),
            )
            .col_expr(poll_vote::Column::SubmittedAt, Expr::value(now))
            .col_expr(poll_vote::Column::UpdatedAt, Expr::value(now))
            .filter(poll_vote::Column::Id.eq(&vote.id))
            .filter(poll_vote::Column::Docstatus.eq(DocStatus::Draft))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if marked.rows_affected == 0 {
            txn.rollback()
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            return Err(AppError::Conflict(format!(
                "Vote {} is no longer a draft",
                vote.id
            )));
        }

        let incremented = PollOption::update_many()
            .col_expr(
                poll_option::Column::VoteCount,
                Expr::col(poll_option::Column::VoteCount).add(1),
            )
            .filter(poll_option::Column::PollId.eq(&vote.poll_id))
            .filter(poll_option::Column::OptionText.eq(&vote.option_text))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if incremented.rows_affected == 0 {
            txn.rollback()
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            return Err(AppError::NotFound(format!(
                "Poll option not found: {}",
                vote.option_text
            )));
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Cancel a submitted vote and create its replacement draft in one transaction.
    pub async fn amend(
        &self,
        vote_id: &str,
        replacement: poll_vote::ActiveModel,
    ) -> AppResult<poll_vote::Model> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let cancelled = PollVote::update_many()
            .col_expr(
                poll_vote::Column::Docstatus,
                Expr::value(DocStatus::Cancelled.into_value()),
            )
            .col_expr(
                poll_vote::Column::UpdatedAt,
                Expr::value(Utc::now().fixed_offset()),
            )
            .filter(poll_vote::Column::Id.eq(vote_id))
            .filter(poll_vote::Column::Docstatus.eq(DocStatus::Submitted))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if cancelled.rows_affected == 0 {
            txn.rollback()
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            return Err(AppError::Conflict(format!(
                "Vote {vote_id} is no longer submitted"
            )));
        }

        let draft = replacement
            .insert(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(draft)
    }
}
