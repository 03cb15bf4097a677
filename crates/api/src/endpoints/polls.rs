//! Poll endpoints.

use axum::{Json, Router, extract::State, routing::post};
use chrono::NaiveDate;
use polling_common::AppResult;
use polling_core::{CreatePollInput, PollWithOptions, UpdatePollInput};
use polling_db::entities::{
    poll::{self, PollStatus},
    poll_option,
};
use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

// ==================== Request/Response Types ====================

/// Poll response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollResponse {
    pub id: String,
    pub title: String,
    pub status: PollStatus,
    pub end_date: Option<NaiveDate>,
    pub created_by: String,
    pub created_at: String,
    pub updated_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<PollOptionResponse>>,
}

impl From<poll::Model> for PollResponse {
    fn from(p: poll::Model) -> Self {
        Self {
            id: p.id,
            title: p.title,
            status: p.status,
            end_date: p.end_date,
            created_by: p.created_by,
            created_at: p.created_at.to_rfc3339(),
            updated_at: p.updated_at.map(|t| t.to_rfc3339()),
            options: None,
        }
    }
}

impl From<PollWithOptions> for PollResponse {
    fn from(p: PollWithOptions) -> Self {
        let options = p.options.into_iter().map(Into::into).collect();
        Self {
            options: Some(options),
            ..p.poll.into()
        }
    }
}

/// Poll option response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollOptionResponse {
    pub id: String,
    pub idx: i32,
    pub option_text: String,
    pub vote_count: i32,
}

impl From<poll_option::Model> for PollOptionResponse {
    fn from(o: poll_option::Model) -> Self {
        Self {
            id: o.id,
            idx: o.idx,
            option_text: o.option_text,
            vote_count: o.vote_count,
        }
    }
}

/// Create poll request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePollRequest {
    #[validate(length(min = 1, max = 140))]
    pub title: String,
    #[serde(default)]
    pub status: PollStatus,
    pub end_date: Option<NaiveDate>,
    #[validate(length(min = 1, max = 100))]
    pub options: Vec<String>,
}

/// Update poll request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePollRequest {
    #[validate(length(min = 1, max = 64))]
    pub poll_id: String,
    #[validate(length(min = 1, max = 140))]
    pub title: Option<String>,
    pub status: Option<PollStatus>,
    /// Absent keeps the end date, `null` clears it.
    #[serde(default, deserialize_with = "deserialize_some")]
    pub end_date: Option<Option<NaiveDate>>,
    #[validate(length(min = 1, max = 100))]
    pub options: Option<Vec<String>>,
}

/// Request naming a single poll.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PollIdRequest {
    #[validate(length(min = 1, max = 64))]
    pub poll_id: String,
}

fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

// ==================== Handlers ====================

/// Create a poll.
async fn create(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CreatePollRequest>,
) -> AppResult<ApiResponse<PollResponse>> {
    req.validate()?;

    let poll = state
        .poll_service
        .create_poll(
            &actor,
            CreatePollInput {
                title: req.title,
                status: req.status,
                end_date: req.end_date,
                options: req.options,
            },
        )
        .await?;

    Ok(ApiResponse::ok(poll.into()))
}

/// Update a poll.
async fn update(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<UpdatePollRequest>,
) -> AppResult<ApiResponse<PollResponse>> {
    req.validate()?;

    let poll = state
        .poll_service
        .update_poll(
            &actor,
            &req.poll_id,
            UpdatePollInput {
                title: req.title,
                status: req.status,
                end_date: req.end_date,
                options: req.options,
            },
        )
        .await?;

    Ok(ApiResponse::ok(poll.into()))
}

/// Show a poll with its options.
async fn show(
    State(state): State<AppState>,
    Json(req): Json<PollIdRequest>,
) -> AppResult<ApiResponse<PollResponse>> {
    req.validate()?;
    let poll = state.poll_service.get_poll(&req.poll_id).await?;
    Ok(ApiResponse::ok(poll.into()))
}

/// List polls.
async fn list(State(state): State<AppState>) -> AppResult<ApiResponse<Vec<PollResponse>>> {
    let polls = state.poll_service.list_polls().await?;
    Ok(ApiResponse::ok(polls.into_iter().map(Into::into).collect()))
}

/// Option texts of a poll, sorted.
async fn options(
    State(state): State<AppState>,
    Json(req): Json<PollIdRequest>,
) -> AppResult<ApiResponse<Vec<String>>> {
    req.validate()?;
    let options = state.poll_service.get_poll_options(&req.poll_id).await?;
    Ok(ApiResponse::ok(options))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create", post(create))
        .route("/update", post(update))
        .route("/show", post(show))
        .route("/list", post(list))
        .route("/options", post(options))
}
