//! Vote endpoints.

use axum::{Json, Router, extract::State, routing::post};
use polling_common::AppResult;
use polling_core::CreateVoteInput;
use polling_db::entities::poll_vote::{self, DocStatus};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

// ==================== Request/Response Types ====================

/// Vote response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteResponse {
    pub id: String,
    pub poll_id: String,
    pub voter_id: String,
    pub owner_id: String,
    pub option_text: String,
    pub docstatus: DocStatus,
    pub amended_from: Option<String>,
    pub created_at: String,
    pub submitted_at: Option<String>,
}

impl From<poll_vote::Model> for VoteResponse {
    fn from(v: poll_vote::Model) -> Self {
        Self {
            id: v.id,
            poll_id: v.poll_id,
            voter_id: v.voter_id,
            owner_id: v.owner_id,
            option_text: v.option_text,
            docstatus: v.docstatus,
            amended_from: v.amended_from,
            created_at: v.created_at.to_rfc3339(),
            submitted_at: v.submitted_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Create draft request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateVoteRequest {
    #[validate(length(max = 64))]
    pub poll_id: String,
    #[validate(length(max = 64))]
    pub voter_id: Option<String>,
    #[validate(length(max = 256))]
    pub option_text: String,
}

/// Change the option of a draft.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVoteRequest {
    #[validate(length(min = 1, max = 64))]
    pub vote_id: String,
    #[validate(length(max = 256))]
    pub option_text: String,
}

/// Create-and-submit request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CastVoteRequest {
    #[validate(length(max = 64))]
    pub poll_id: String,
    #[validate(length(max = 256))]
    pub option_text: String,
}

/// Request naming a single vote.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct VoteIdRequest {
    #[validate(length(min = 1, max = 64))]
    pub vote_id: String,
}

/// List votes request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListVotesRequest {
    pub poll_id: Option<String>,
}

// ==================== Handlers ====================

/// Create a draft vote.
async fn create(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CreateVoteRequest>,
) -> AppResult<ApiResponse<VoteResponse>> {
    req.validate()?;

    let vote = state
        .vote_service
        .create_draft(
            &actor,
            CreateVoteInput {
                poll_id: req.poll_id,
                voter_id: req.voter_id,
                option_text: req.option_text,
            },
        )
        .await?;

    Ok(ApiResponse::ok(vote.into()))
}

/// Modify a draft vote.
async fn update(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<UpdateVoteRequest>,
) -> AppResult<ApiResponse<VoteResponse>> {
    req.validate()?;

    let vote = state
        .vote_service
        .update_draft(&actor, &req.vote_id, req.option_text)
        .await?;

    Ok(ApiResponse::ok(vote.into()))
}

/// Submit a draft vote.
async fn submit(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<VoteIdRequest>,
) -> AppResult<ApiResponse<VoteResponse>> {
    req.validate()?;
    let vote = state.vote_service.submit(&actor, &req.vote_id).await?;
    Ok(ApiResponse::ok(vote.into()))
}

/// Create and submit a vote in one step.
async fn cast(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CastVoteRequest>,
) -> AppResult<ApiResponse<VoteResponse>> {
    req.validate()?;

    let vote = state
        .vote_service
        .cast_vote(&actor, &req.poll_id, &req.option_text)
        .await?;

    Ok(ApiResponse::ok(vote.into()))
}

/// Cancel a submitted vote and open an amended draft.
async fn amend(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<VoteIdRequest>,
) -> AppResult<ApiResponse<VoteResponse>> {
    req.validate()?;
    let draft = state.vote_service.amend_vote(&actor, &req.vote_id).await?;
    Ok(ApiResponse::ok(draft.into()))
}

/// Delete a vote.
async fn delete(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<VoteIdRequest>,
) -> AppResult<ApiResponse<()>> {
    req.validate()?;
    state.vote_service.delete_vote(&actor, &req.vote_id).await?;
    Ok(ApiResponse::ok(()))
}

/// Show a vote.
async fn show(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<VoteIdRequest>,
) -> AppResult<ApiResponse<VoteResponse>> {
    req.validate()?;
    let vote = state.vote_service.get_vote(&actor, &req.vote_id).await?;
    Ok(ApiResponse::ok(vote.into()))
}

/// List visible votes. The body is optional.
async fn list(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    req: Option<Json<ListVotesRequest>>,
) -> AppResult<ApiResponse<Vec<VoteResponse>>> {
    let req = req.map(|Json(req)| req).unwrap_or_default();
    let votes = state
        .vote_service
        .list_votes(&actor, req.poll_id.as_deref())
        .await?;

    Ok(ApiResponse::ok(votes.into_iter().map(Into::into).collect()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create", post(create))
        .route("/update", post(update))
        .route("/submit", post(submit))
        .route("/cast", post(cast))
        .route("/amend", post(amend))
        .route("/delete", post(delete))
        .route("/show", post(show))
        .route("/list", post(list))
}
