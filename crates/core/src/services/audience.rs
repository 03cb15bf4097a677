//! Target-audience hook consulted before a vote is accepted.

use async_trait::async_trait;
use polling_common::AppResult;
use polling_db::entities::poll;

/// Decides whether a voter belongs to a poll's intended audience.
#[async_trait]
pub trait AudiencePolicy: Send + Sync {
    /// Returns `true` when `voter_id` may vote on `poll`.
    async fn is_in_target_audience(&self, poll: &poll::Model, voter_id: &str) -> AppResult<bool>;
}

/// Admits every voter.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenAudience;

#[async_trait]
impl AudiencePolicy for OpenAudience {
    async fn is_in_target_audience(&self, _poll: &poll::Model, _voter_id: &str) -> AppResult<bool> {
        Ok(true)
    }
}
