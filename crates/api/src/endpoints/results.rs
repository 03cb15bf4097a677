//! Poll result endpoints.

use axum::{Json, Router, extract::State, routing::post};
use polling_common::AppResult;
use polling_core::{OptionResult, PollResult, PollResultSummary};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{middleware::AppState, response::ApiResponse};

/// Poll result response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollResultResponse {
    pub name: String,
    pub poll_title: String,
    pub total_votes: i64,
    pub options: Vec<OptionResultResponse>,
}

/// Per-option result.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionResultResponse {
    pub option_text: String,
    pub vote_count: i64,
    pub percentage: f64,
}

/// Result listing entry.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollResultSummaryResponse {
    pub name: String,
    pub poll_title: String,
    pub total_votes: i64,
}

impl From<OptionResult> for OptionResultResponse {
    fn from(o: OptionResult) -> Self {
        Self {
            option_text: o.option_text,
            vote_count: o.vote_count,
            percentage: o.percentage,
        }
    }
}

impl From<PollResult> for PollResultResponse {
    fn from(r: PollResult) -> Self {
        Self {
            name: r.name,
            poll_title: r.poll_title,
            total_votes: r.total_votes,
            options: r.options.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<PollResultSummary> for PollResultSummaryResponse {
    fn from(s: PollResultSummary) -> Self {
        Self {
            name: s.name,
            poll_title: s.poll_title,
            total_votes: s.total_votes,
        }
    }
}

/// Show result request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ShowResultRequest {
    #[validate(length(min = 1, max = 64))]
    pub poll_id: String,
}

/// Tally one poll.
async fn show(
    State(state): State<AppState>,
    Json(req): Json<ShowResultRequest>,
) -> AppResult<ApiResponse<PollResultResponse>> {
    req.validate()?;
    let result = state.result_service.get_poll_result(&req.poll_id).await?;
    Ok(ApiResponse::ok(result.into()))
}

/// Totals for every poll.
async fn list(
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<PollResultSummaryResponse>>> {
    let results = state.result_service.list_poll_results().await?;
    Ok(ApiResponse::ok(results.into_iter().map(Into::into).collect()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/show", post(show))
        .route("/list", post(list))
}
