//! Vote service: the draft → submitted workflow and its eligibility gates.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use polling_common::{AppError, AppResult, IdGenerator};
use polling_db::{
    entities::{
        poll::{self, PollStatus},
        poll_vote::{self, DocStatus},
    },
    repositories::{PollRepository, PollVoteRepository},
};
use sea_orm::Set;
use tracing::{debug, info, warn};

use super::audience::{AudiencePolicy, OpenAudience};
use super::permission::{Actor, VoteAction, check_ownership};

/// Input for creating a draft vote.
#[derive(Debug, Clone)]
pub struct CreateVoteInput {
    pub poll_id: String,
    /// Defaults to the acting user.
    pub voter_id: Option<String>,
    pub option_text: String,
}

/// Vote service.
#[derive(Clone)]
pub struct VoteService {
    poll_repo: PollRepository,
    vote_repo: PollVoteRepository,
    audience: Arc<dyn AudiencePolicy>,
    timezone: Tz,
    id_gen: IdGenerator,
}

/// Whether a poll's status accepts votes.
#[must_use]
pub fn poll_is_active(poll: &poll::Model) -> bool {
    poll.status == PollStatus::Active
}

/// Whether `today` is on or before the poll's end date. Polls without an end date never expire.
#[must_use]
pub fn is_valid_date(poll: &poll::Model, today: NaiveDate) -> bool {
    poll.end_date.is_none_or(|end| end >= today)
}

fn validate_mandatory_fields(poll_id: &str, voter_id: &str, option_text: &str) -> AppResult<()> {
    if poll_id.trim().is_empty() {
        return Err(AppError::Validation(
            "Poll is required to cast a vote.".to_string(),
        ));
    }
    if voter_id.trim().is_empty() {
        return Err(AppError::Validation(
            "User is required to cast a vote.".to_string(),
        ));
    }
    if option_text.trim().is_empty() {
        return Err(AppError::Validation(
            "Option is required to cast a vote.".to_string(),
        ));
    }
    Ok(())
}

impl VoteService {
    /// Create a new vote service that admits every voter and dates polls in UTC.
    #[must_use]
    pub fn new(poll_repo: PollRepository, vote_repo: PollVoteRepository) -> Self {
        Self {
            poll_repo,
            vote_repo,
            audience: Arc::new(OpenAudience),
            timezone: Tz::UTC,
            id_gen: IdGenerator::new(),
        }
    }

    /// Replace the target-audience policy.
    #[must_use]
    pub fn with_audience_policy(mut self, audience: Arc<dyn AudiencePolicy>) -> Self {
        self.audience = audience;
        self
    }

    /// Use `timezone` to decide what the current date is.
    #[must_use]
    pub const fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.timezone).date_naive()
    }

    /// Create a draft vote owned by `actor`.
    pub async fn create_draft(
        &self,
        actor: &Actor,
        input: CreateVoteInput,
    ) -> AppResult<poll_vote::Model> {
        let voter_id = input.voter_id.unwrap_or_else(|| actor.id.clone());
        validate_mandatory_fields(&input.poll_id, &voter_id, &input.option_text)?;

        if !actor.is_admin && voter_id != actor.id {
            return Err(AppError::Forbidden(
                "You can only cast votes for yourself.".to_string(),
            ));
        }

        self.poll_repo.get_by_id(&input.poll_id).await?;
        self.ensure_option_exists(&input.poll_id, &input.option_text)
            .await?;

        let model = poll_vote::ActiveModel {
            id: Set(self.id_gen.generate()),
            poll_id: Set(input.poll_id),
            voter_id: Set(voter_id),
            owner_id: Set(actor.id.clone()),
            option_text: Set(input.option_text),
            docstatus: Set(DocStatus::Draft),
            amended_from: Set(None),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
            submitted_at: Set(None),
        };

        let vote = self.vote_repo.create(model).await?;
        debug!(vote_id = %vote.id, poll_id = %vote.poll_id, actor = %actor.id, "Draft vote created");
        Ok(vote)
    }

    async fn ensure_option_exists(&self, poll_id: &str, option_text: &str) -> AppResult<()> {
        if self
            .poll_repo
            .find_option(poll_id, option_text)
            .await?
            .is_none()
        {
            return Err(AppError::Validation(
                "The selected option is not part of this poll.".to_string(),
            ));
        }
        Ok(())
    }

    /// Change the option of a draft vote.
    pub async fn update_draft(
        &self,
        actor: &Actor,
        vote_id: &str,
        option_text: String,
    ) -> AppResult<poll_vote::Model> {
        let vote = self.vote_repo.get_by_id(vote_id).await?;
        check_ownership(actor, &vote.owner_id, VoteAction::Modify)?;

        if vote.docstatus != DocStatus::Draft {
            return Err(AppError::Validation(
                "Only draft votes can be modified.".to_string(),
            ));
        }
        validate_mandatory_fields(&vote.poll_id, &vote.voter_id, &option_text)?;
        self.ensure_option_exists(&vote.poll_id, &option_text)
            .await?;

        let mut active: poll_vote::ActiveModel = vote.into();
        active.option_text = Set(option_text);
        active.updated_at = Set(Some(Utc::now().into()));

        let vote = self.vote_repo.update(active).await?;
        debug!(vote_id = %vote.id, actor = %actor.id, "Draft vote modified");
        Ok(vote)
    }

    /// Submit a draft vote.
    pub async fn submit(&self, actor: &Actor, vote_id: &str) -> AppResult<poll_vote::Model> {
        let vote = self.vote_repo.get_by_id(vote_id).await?;
        self.submit_draft(actor, vote).await
    }

    /// Create and submit a vote for `actor` in one call.
    ///
    /// A rejected submission removes the draft again.
    pub async fn cast_vote(
        &self,
        actor: &Actor,
        poll_id: &str,
        option_text: &str,
    ) -> AppResult<poll_vote::Model> {
        let draft = self
            .create_draft(
                actor,
                CreateVoteInput {
                    poll_id: poll_id.to_string(),
                    voter_id: None,
                    option_text: option_text.to_string(),
                },
            )
            .await?;
        let draft_id = draft.id.clone();

        match self.submit_draft(actor, draft).await {
            Ok(vote) => Ok(vote),
            Err(err) => {
                if let Err(cleanup) = self.vote_repo.delete(&draft_id).await {
                    warn!(vote_id = %draft_id, error = %cleanup, "Failed to remove rejected draft");
                }
                Err(err)
            }
        }
    }

    async fn submit_draft(
        &self,
        actor: &Actor,
        mut vote: poll_vote::Model,
    ) -> AppResult<poll_vote::Model> {
        check_ownership(actor, &vote.owner_id, VoteAction::Submit)?;

        if vote.docstatus != DocStatus::Draft {
            return Err(AppError::Validation(
                "Only draft votes can be submitted.".to_string(),
            ));
        }

        let poll = self.poll_repo.get_by_id(&vote.poll_id).await?;
        if let Err(err) = self.check_eligibility(&poll, &vote.voter_id).await {
            warn!(vote_id = %vote.id, poll_id = %poll.id, voter = %vote.voter_id, error = %err, "Vote rejected");
            return Err(err);
        }

        self.vote_repo.submit_and_increment(&vote).await?;

        let now = Utc::now().fixed_offset();
        vote.docstatus = DocStatus::Submitted;
        vote.submitted_at = Some(now);
        vote.updated_at = Some(now);

        info!(
            vote_id = %vote.id,
            poll_id = %vote.poll_id,
            voter = %vote.voter_id,
            option = %vote.option_text,
            "Vote submitted"
        );
        Ok(vote)
    }

    /// Run the eligibility gates in order, stopping at the first failure:
    /// target audience, active status, end date, then duplicate vote.
    pub async fn check_eligibility(&self, poll: &poll::Model, voter_id: &str) -> AppResult<()> {
        if !self.audience.is_in_target_audience(poll, voter_id).await? {
            return Err(AppError::Ineligible(
                "You are not in the target audience for this poll.".to_string(),
            ));
        }

        if !poll_is_active(poll) {
            return Err(AppError::Ineligible(
                "This poll is not active for voting.".to_string(),
            ));
        }

        if !is_valid_date(poll, self.today()) {
            return Err(AppError::Ineligible(
                "This poll date is expired.".to_string(),
            ));
        }

        if self.vote_repo.has_submitted_vote(&poll.id, voter_id).await? {
            return Err(AppError::Ineligible(
                "You have already voted in this poll.".to_string(),
            ));
        }

        Ok(())
    }

    /// Cancel a submitted vote and return a new draft that replaces it.
    ///
    /// The cancelled vote stays counted; the replacement only counts once it
    /// passes the submit gate again.
    pub async fn amend_vote(&self, actor: &Actor, vote_id: &str) -> AppResult<poll_vote::Model> {
        let vote = self.vote_repo.get_by_id(vote_id).await?;
        check_ownership(actor, &vote.owner_id, VoteAction::Amend)?;

        if vote.docstatus != DocStatus::Submitted {
            return Err(AppError::Validation(
                "Only submitted votes can be amended.".to_string(),
            ));
        }

        let replacement = poll_vote::ActiveModel {
            id: Set(self.id_gen.generate()),
            poll_id: Set(vote.poll_id.clone()),
            voter_id: Set(vote.voter_id.clone()),
            owner_id: Set(vote.owner_id.clone()),
            option_text: Set(vote.option_text.clone()),
            docstatus: Set(DocStatus::Draft),
            amended_from: Set(Some(vote.id.clone())),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
            submitted_at: Set(None),
        };

        let draft = self.vote_repo.amend(&vote.id, replacement).await?;
        info!(vote_id = %vote.id, amended_by = %draft.id, actor = %actor.id, "Vote amended");
        Ok(draft)
    }

    /// Delete a draft or cancelled vote. Submitted votes have to be amended instead.
    pub async fn delete_vote(&self, actor: &Actor, vote_id: &str) -> AppResult<()> {
        let vote = self.vote_repo.get_by_id(vote_id).await?;
        check_ownership(actor, &vote.owner_id, VoteAction::Delete)?;

        if vote.docstatus == DocStatus::Submitted {
            return Err(AppError::Validation(
                "Submitted votes cannot be deleted; amend them instead.".to_string(),
            ));
        }

        self.vote_repo.delete(&vote.id).await?;
        info!(vote_id = %vote.id, actor = %actor.id, "Vote deleted");
        Ok(())
    }

    /// Read a single vote.
    pub async fn get_vote(&self, actor: &Actor, vote_id: &str) -> AppResult<poll_vote::Model> {
        let vote = self.vote_repo.get_by_id(vote_id).await?;
        check_ownership(actor, &vote.owner_id, VoteAction::Read)?;
        Ok(vote)
    }

    /// List the votes `actor` may see: their own, or all of them for an administrator.
    pub async fn list_votes(
        &self,
        actor: &Actor,
        poll_id: Option<&str>,
    ) -> AppResult<Vec<poll_vote::Model>> {
        let owner_filter = (!actor.is_admin).then_some(actor.id.as_str());
        self.vote_repo.find_filtered(owner_filter, poll_id).await
    }
}
