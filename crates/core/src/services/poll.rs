//! Poll service.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use chrono::{NaiveDate, Utc};
use polling_common::{AppError, AppResult, IdGenerator};
use polling_db::{
    entities::{
        poll::{self, PollStatus},
        poll_option,
    },
    repositories::{OptionChanges, PollRepository},
};
use regex::Regex;
use sea_orm::Set;
use serde::Serialize;
use tracing::{debug, info};

use super::permission::{Actor, require_admin};

// Letters, digits, underscore, hyphen and space only.
#[allow(clippy::unwrap_used)]
static TITLE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_\- ]+$").unwrap());

const TITLE_MESSAGE: &str = "Title cannot contain special characters. Only letters, numbers, spaces, hyphens, and underscores are allowed.";

const MAX_OPTION_LEN: usize = 256;

/// Check a poll title against the allowed character set.
pub fn validate_title(title: &str) -> AppResult<()> {
    if title.trim().is_empty() {
        return Err(AppError::Validation("Title is required.".to_string()));
    }
    if !TITLE_RE.is_match(title) {
        return Err(AppError::Validation(TITLE_MESSAGE.to_string()));
    }
    Ok(())
}

/// Trim option texts and reject empty lists, blanks, over-long texts and duplicates.
pub fn normalize_options(options: &[String]) -> AppResult<Vec<String>> {
    if options.is_empty() {
        return Err(AppError::Validation(
            "A poll needs at least one option.".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    let mut normalized = Vec::with_capacity(options.len());
    for option in options {
        let text = option.trim();
        if text.is_empty() {
            return Err(AppError::Validation(
                "Poll options cannot be empty.".to_string(),
            ));
        }
        if text.chars().count() > MAX_OPTION_LEN {
            return Err(AppError::Validation(format!(
                "Poll option is too long (max {MAX_OPTION_LEN} chars)."
            )));
        }
        if !seen.insert(text.to_string()) {
            return Err(AppError::Validation(format!(
                "Duplicate poll option: {text}"
            )));
        }
        normalized.push(text.to_string());
    }
    Ok(normalized)
}

/// Input for creating a poll.
#[derive(Debug, Clone)]
pub struct CreatePollInput {
    pub title: String,
    pub status: PollStatus,
    pub end_date: Option<NaiveDate>,
    pub options: Vec<String>,
}

/// Input for updating a poll. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdatePollInput {
    pub title: Option<String>,
    pub status: Option<PollStatus>,
    /// `Some(None)` clears the end date.
    pub end_date: Option<Option<NaiveDate>>,
    /// Replaces the option list; surviving texts keep their counts.
    pub options: Option<Vec<String>>,
}

/// A poll with its options in display order.
#[derive(Debug, Clone, Serialize)]
pub struct PollWithOptions {
    pub poll: poll::Model,
    pub options: Vec<poll_option::Model>,
}

/// Poll service for administration and lookups.
#[derive(Clone)]
pub struct PollService {
    poll_repo: PollRepository,
    id_gen: IdGenerator,
}

impl PollService {
    /// Create a new poll service.
    #[must_use]
    pub const fn new(poll_repo: PollRepository) -> Self {
        Self {
            poll_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a poll with its options.
    pub async fn create_poll(
        &self,
        actor: &Actor,
        input: CreatePollInput,
    ) -> AppResult<PollWithOptions> {
        require_admin(actor)?;
        validate_title(&input.title)?;
        let texts = normalize_options(&input.options)?;

        let poll_id = self.id_gen.generate();
        let now = Utc::now();

        let model = poll::ActiveModel {
            id: Set(poll_id.clone()),
            title: Set(input.title),
            status: Set(input.status),
            end_date: Set(input.end_date),
            created_by: Set(actor.id.clone()),
            created_at: Set(now.into()),
            updated_at: Set(None),
        };

        let options: Vec<poll_option::Model> = texts
            .into_iter()
            .enumerate()
            .map(|(i, text)| poll_option::Model {
                id: self.id_gen.generate(),
                poll_id: poll_id.clone(),
                idx: i as i32,
                option_text: text,
                vote_count: 0,
            })
            .collect();

        let poll = self
            .poll_repo
            .create_with_options(model, options.iter().map(to_active).collect())
            .await?;

        info!(poll_id = %poll.id, actor = %actor.id, options = options.len(), "Poll created");

        Ok(PollWithOptions { poll, options })
    }

    /// Update a poll's title, status, end date or options.
    pub async fn update_poll(
        &self,
        actor: &Actor,
        poll_id: &str,
        input: UpdatePollInput,
    ) -> AppResult<PollWithOptions> {
        require_admin(actor)?;

        let poll = self.poll_repo.get_by_id(poll_id).await?;

        if let Some(ref title) = input.title {
            validate_title(title)?;
        }

        let changes = match input.options {
            Some(ref options) => {
                let texts = normalize_options(options)?;
                let current = self.poll_repo.find_options(poll_id).await?;
                self.plan_option_changes(poll_id, &current, texts)
            }
            None => OptionChanges::default(),
        };

        let mut active: poll::ActiveModel = poll.into();
        if let Some(title) = input.title {
            active.title = Set(title);
        }
        if let Some(status) = input.status {
            active.status = Set(status);
        }
        if let Some(end_date) = input.end_date {
            active.end_date = Set(end_date);
        }
        active.updated_at = Set(Some(Utc::now().into()));

        let options_changed = !changes.is_empty();
        let poll = self.poll_repo.update_with_options(active, changes).await?;
        let options = self.poll_repo.find_options(poll_id).await?;

        info!(poll_id = %poll.id, actor = %actor.id, options_changed, "Poll updated");

        Ok(PollWithOptions { poll, options })
    }

    /// Work out which options to drop, reorder and add so the poll ends up
    /// with exactly `texts`, in that order.
    fn plan_option_changes(
        &self,
        poll_id: &str,
        current: &[poll_option::Model],
        texts: Vec<String>,
    ) -> OptionChanges {
        let wanted: HashMap<&str, i32> = texts
            .iter()
            .enumerate()
            .map(|(i, t)| (t.as_str(), i as i32))
            .collect();
        let existing: HashMap<&str, &poll_option::Model> = current
            .iter()
            .map(|o| (o.option_text.as_str(), o))
            .collect();

        let mut changes = OptionChanges::default();

        for option in current {
            match wanted.get(option.option_text.as_str()) {
                None => changes.remove_ids.push(option.id.clone()),
                Some(&idx) if idx != option.idx => changes.reorder.push((option.id.clone(), idx)),
                Some(_) => {}
            }
        }

        for (i, text) in texts.iter().enumerate() {
            if !existing.contains_key(text.as_str()) {
                changes.insert.push(poll_option::ActiveModel {
                    id: Set(self.id_gen.generate()),
                    poll_id: Set(poll_id.to_string()),
                    idx: Set(i as i32),
                    option_text: Set(text.clone()),
                    vote_count: Set(0),
                });
            }
        }

        changes
    }

    /// Get a poll with its options.
    pub async fn get_poll(&self, poll_id: &str) -> AppResult<PollWithOptions> {
        let poll = self.poll_repo.get_by_id(poll_id).await?;
        let options = self.poll_repo.find_options(poll_id).await?;
        Ok(PollWithOptions { poll, options })
    }

    /// List all polls.
    pub async fn list_polls(&self) -> AppResult<Vec<poll::Model>> {
        self.poll_repo.find_all().await
    }

    /// Option texts of a poll, sorted lexicographically.
    pub async fn get_poll_options(&self, poll_id: &str) -> AppResult<Vec<String>> {
        self.poll_repo.get_by_id(poll_id).await?;
        let texts = self.poll_repo.find_option_texts(poll_id).await?;
        debug!(poll_id = %poll_id, count = texts.len(), "Loaded poll options");
        Ok(texts)
    }
}

fn to_active(option: &poll_option::Model) -> poll_option::ActiveModel {
    poll_option::ActiveModel {
        id: Set(option.id.clone()),
        poll_id: Set(option.poll_id.clone()),
        idx: Set(option.idx),
        option_text: Set(option.option_text.clone()),
        vote_count: Set(option.vote_count),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn create_test_poll(id: &str) -> poll::Model {
        poll::Model {
            id: id.to_string(),
            title: "Lunch Options".to_string(),
            status: PollStatus::Active,
            end_date: None,
            created_by: "root".to_string(),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_option(id: &str, idx: i32, text: &str, votes: i32) -> poll_option::Model {
        poll_option::Model {
            id: id.to_string(),
            poll_id: "p1".to_string(),
            idx,
            option_text: text.to_string(),
            vote_count: votes,
        }
    }

    fn service(db: MockDatabase) -> PollService {
        PollService::new(PollRepository::new(Arc::new(db.into_connection())))
    }

    fn lunch_input() -> CreatePollInput {
        CreatePollInput {
            title: "Lunch Options".to_string(),
            status: PollStatus::Active,
            end_date: None,
            options: vec!["Pizza".to_string(), "Salad".to_string()],
        }
    }

    #[test]
    fn test_validate_title_accepts_allowed_characters() {
        assert!(validate_title("Lunch Options").is_ok());
        assert!(validate_title("team-offsite_2025").is_ok());
    }

    #[test]
    fn test_validate_title_rejects_special_characters() {
        for title in ["Lunch?", "Pizza & Salad", "caf\u{e9}", "a/b", "tab\there"] {
            let err = validate_title(title).unwrap_err();
            assert!(
                matches!(err, AppError::Validation(ref msg) if msg == TITLE_MESSAGE),
                "{title} should be rejected"
            );
        }
    }

    #[test]
    fn test_validate_title_rejects_blank() {
        assert!(matches!(validate_title("   "), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_normalize_options() {
        let options = vec![" Pizza ".to_string(), "Salad".to_string()];
        assert_eq!(normalize_options(&options).unwrap(), vec!["Pizza", "Salad"]);

        assert!(normalize_options(&[]).is_err());
        assert!(normalize_options(&["".to_string()]).is_err());
        assert!(normalize_options(&["A".to_string(), " A".to_string()]).is_err());
        assert!(normalize_options(&["x".repeat(MAX_OPTION_LEN + 1)]).is_err());
    }

    #[tokio::test]
    async fn test_create_poll_requires_admin() {
        let service = service(MockDatabase::new(DatabaseBackend::Postgres));

        let result = service
            .create_poll(&Actor::user("alice"), lunch_input())
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_create_poll_rejects_bad_title_before_touching_db() {
        let service = service(MockDatabase::new(DatabaseBackend::Postgres));
        let input = CreatePollInput {
            title: "Lunch!".to_string(),
            ..lunch_input()
        };

        let result = service.create_poll(&Actor::admin("root"), input).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_poll() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_poll("p1")]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 2,
            }]);

        let created = service(db)
            .create_poll(&Actor::admin("root"), lunch_input())
            .await
            .unwrap();

        let texts: Vec<_> = created.options.iter().map(|o| o.option_text.as_str()).collect();
        assert_eq!(texts, vec!["Pizza", "Salad"]);
        assert!(created.options.iter().all(|o| o.vote_count == 0));
        assert_eq!(created.options[1].idx, 1);
    }

    #[test]
    fn test_plan_option_changes_keeps_surviving_options() {
        let service = service(MockDatabase::new(DatabaseBackend::Postgres));
        let current = vec![
            create_test_option("o1", 0, "Pizza", 3),
            create_test_option("o2", 1, "Salad", 1),
            create_test_option("o3", 2, "Soup", 0),
        ];

        let changes = service.plan_option_changes(
            "p1",
            &current,
            vec!["Salad".to_string(), "Pizza".to_string(), "Tacos".to_string()],
        );

        assert_eq!(changes.remove_ids, vec!["o3".to_string()]);
        assert_eq!(
            changes.reorder,
            vec![("o1".to_string(), 1), ("o2".to_string(), 0)]
        );
        assert_eq!(changes.insert.len(), 1);
    }

    #[test]
    fn test_plan_option_changes_noop_for_same_list() {
        let service = service(MockDatabase::new(DatabaseBackend::Postgres));
        let current = vec![
            create_test_option("o1", 0, "Pizza", 3),
            create_test_option("o2", 1, "Salad", 1),
        ];

        let changes =
            service.plan_option_changes("p1", &current, vec!["Pizza".into(), "Salad".into()]);

        assert!(changes.is_empty());
    }

    #[tokio::test]
    async fn test_update_poll_status_only() {
        let mut inactive = create_test_poll("p1");
        inactive.status = PollStatus::Inactive;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_poll("p1")]])
            .append_query_results([[inactive.clone()]])
            .append_query_results([[create_test_option("o1", 0, "Pizza", 1)]]);

        let updated = service(db)
            .update_poll(
                &Actor::admin("root"),
                "p1",
                UpdatePollInput {
                    status: Some(PollStatus::Inactive),
                    ..UpdatePollInput::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.poll.status, PollStatus::Inactive);
        assert_eq!(updated.options.len(), 1);
    }

    #[tokio::test]
    async fn test_update_poll_unknown_poll() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<poll::Model>::new()]);

        let result = service(db)
            .update_poll(&Actor::admin("root"), "nope", UpdatePollInput::default())
            .await;

        assert!(matches!(result, Err(AppError::PollNotFound(_))));
    }

    #[tokio::test]
    async fn test_get_poll_options_sorted() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_poll("p1")]])
            .append_query_results([[
                create_test_option("o1", 0, "Pizza", 0),
                create_test_option("o2", 1, "Salad", 0),
            ]]);

        let texts = service(db).get_poll_options("p1").await.unwrap();

        assert_eq!(texts, vec!["Pizza", "Salad"]);
    }
}
