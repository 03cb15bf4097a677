//! Poll result service.
//!
//! Results are projected from the stored option counts on every read and
//! never persisted.

use std::collections::HashMap;

use polling_common::AppResult;
use polling_db::{
    entities::{poll, poll_option},
    repositories::PollRepository,
};
use serde::Serialize;
use tracing::debug;

/// Per-option tally.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionResult {
    pub option_text: String,
    pub vote_count: i64,
    pub percentage: f64,
}

/// Full result of a poll.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PollResult {
    /// Poll ID.
    pub name: String,
    pub poll_title: String,
    pub total_votes: i64,
    pub options: Vec<OptionResult>,
}

/// Lightweight listing entry without the per-option breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PollResultSummary {
    pub name: String,
    pub poll_title: String,
    pub total_votes: i64,
}

/// Round to one decimal place, ties to even.
fn round1(value: f64) -> f64 {
    (value * 10.0).round_ties_even() / 10.0
}

/// Compute the total and per-option percentages from stored counts.
#[must_use]
pub fn tally(options: &[poll_option::Model]) -> (i64, Vec<OptionResult>) {
    let total: i64 = options.iter().map(|o| i64::from(o.vote_count)).sum();

    let results = options
        .iter()
        .map(|o| {
            let count = i64::from(o.vote_count);
            let percentage = if total > 0 {
                round1(count as f64 / total as f64 * 100.0)
            } else {
                0.0
            };
            OptionResult {
                option_text: o.option_text.clone(),
                vote_count: count,
                percentage,
            }
        })
        .collect();

    (total, results)
}

/// Poll result service.
#[derive(Clone)]
pub struct PollResultService {
    poll_repo: PollRepository,
}

impl PollResultService {
    /// Create a new poll result service.
    #[must_use]
    pub const fn new(poll_repo: PollRepository) -> Self {
        Self { poll_repo }
    }

    /// Tally a single poll, options in display order.
    pub async fn get_poll_result(&self, poll_id: &str) -> AppResult<PollResult> {
        let poll = self.poll_repo.get_by_id(poll_id).await?;
        let options = self.poll_repo.find_options(poll_id).await?;
        let (total_votes, options) = tally(&options);

        debug!(poll_id = %poll.id, total_votes, "Poll result computed");

        Ok(PollResult {
            name: poll.id,
            poll_title: poll.title,
            total_votes,
            options,
        })
    }

    /// Totals for every poll, newest poll first.
    pub async fn list_poll_results(&self) -> AppResult<Vec<PollResultSummary>> {
        let polls = self.poll_repo.find_all().await?;
        let options = self.poll_repo.find_all_options().await?;
        Ok(summarize(polls, &options))
    }
}

fn summarize(polls: Vec<poll::Model>, options: &[poll_option::Model]) -> Vec<PollResultSummary> {
    let mut totals: HashMap<&str, i64> = HashMap::new();
    for option in options {
        *totals.entry(option.poll_id.as_str()).or_default() += i64::from(option.vote_count);
    }

    polls
        .into_iter()
        .map(|poll| PollResultSummary {
            total_votes: totals.get(poll.id.as_str()).copied().unwrap_or(0),
            name: poll.id,
            poll_title: poll.title,
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use polling_common::AppError;
    use polling_db::entities::poll::PollStatus;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn option(poll_id: &str, idx: i32, text: &str, count: i32) -> poll_option::Model {
        poll_option::Model {
            id: format!("{poll_id}-{idx}"),
            poll_id: poll_id.to_string(),
            idx,
            option_text: text.to_string(),
            vote_count: count,
        }
    }

    fn counts(counts: &[i32]) -> Vec<poll_option::Model> {
        counts
            .iter()
            .enumerate()
            .map(|(i, c)| option("p1", i32::try_from(i).unwrap(), &format!("opt{i}"), *c))
            .collect()
    }

    fn percentages(counts_in: &[i32]) -> (i64, Vec<f64>) {
        let (total, results) = tally(&counts(counts_in));
        (total, results.into_iter().map(|r| r.percentage).collect())
    }

    fn create_test_poll(id: &str, title: &str) -> poll::Model {
        poll::Model {
            id: id.to_string(),
            title: title.to_string(),
            status: PollStatus::Active,
            end_date: None,
            created_by: "root".to_string(),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[test]
    fn test_tally_single_vote() {
        assert_eq!(percentages(&[1, 0]), (1, vec![100.0, 0.0]));
    }

    #[test]
    fn test_tally_even_split() {
        assert_eq!(percentages(&[1, 1]), (2, vec![50.0, 50.0]));
    }

    #[test]
    fn test_tally_no_votes() {
        assert_eq!(percentages(&[0, 0]), (0, vec![0.0, 0.0]));
    }

    #[test]
    fn test_tally_rounds_to_one_decimal() {
        assert_eq!(percentages(&[1, 2]), (3, vec![33.3, 66.7]));
        assert_eq!(percentages(&[1, 1, 1]), (3, vec![33.3, 33.3, 33.3]));
    }

    #[test]
    fn test_tally_rounds_ties_to_even() {
        assert_eq!(percentages(&[1, 15]), (16, vec![6.2, 93.8]));
        assert_eq!(percentages(&[1, 79]), (80, vec![1.2, 98.8]));
    }

    #[test]
    fn test_tally_counts_sum_to_total() {
        let (total, results) = tally(&counts(&[3, 5, 0, 2]));
        assert_eq!(total, results.iter().map(|r| r.vote_count).sum::<i64>());
        let sum: f64 = results.iter().map(|r| r.percentage).sum();
        assert!((sum - 100.0).abs() < 0.5);
    }

    #[test]
    fn test_tally_empty_poll() {
        let (total, results) = tally(&[]);
        assert_eq!(total, 0);
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_get_poll_result() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_poll("p1", "Lunch Options")]])
            .append_query_results([vec![
                option("p1", 0, "Pizza", 1),
                option("p1", 1, "Salad", 1),
            ]])
            .into_connection();

        let service = PollResultService::new(PollRepository::new(Arc::new(db)));
        let result = service.get_poll_result("p1").await.unwrap();

        assert_eq!(result.name, "p1");
        assert_eq!(result.poll_title, "Lunch Options");
        assert_eq!(result.total_votes, 2);
        assert_eq!(result.options[0].option_text, "Pizza");
        assert!((result.options[0].percentage - 50.0).abs() < f64::EPSILON);
        assert!((result.options[1].percentage - 50.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_get_poll_result_unknown_poll() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<poll::Model>::new()])
            .into_connection();

        let service = PollResultService::new(PollRepository::new(Arc::new(db)));
        let result = service.get_poll_result("nope").await;

        assert!(matches!(result, Err(AppError::PollNotFound(_))));
    }

    #[tokio::test]
    async fn test_list_poll_results() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![
                create_test_poll("p2", "Dinner"),
                create_test_poll("p1", "Lunch Options"),
            ]])
            .append_query_results([vec![
                option("p1", 0, "Pizza", 1),
                option("p1", 1, "Salad", 2),
            ]])
            .into_connection();

        let service = PollResultService::new(PollRepository::new(Arc::new(db)));
        let results = service.list_poll_results().await.unwrap();

        assert_eq!(
            results,
            vec![
                PollResultSummary {
                    name: "p2".to_string(),
                    poll_title: "Dinner".to_string(),
                    total_votes: 0,
                },
                PollResultSummary {
                    name: "p1".to_string(),
                    poll_title: "Lunch Options".to_string(),
                    total_votes: 3,
                },
            ]
        );
    }
}
