//! API integration tests.
//!
//! These tests drive the router against a mock database.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
    middleware,
};
use chrono::Utc;
use polling_api::{AppState, auth_middleware, router as api_router};
use polling_core::{PollResultService, PollService, UserService, VoteService};
use polling_db::{
    entities::{
        poll::{self, PollStatus},
        poll_option,
        poll_vote::{self, DocStatus},
        user,
    },
    repositories::{PollRepository, PollVoteRepository, UserRepository},
};
use sea_orm::{DatabaseBackend, MockDatabase};
use serde_json::{Value, json};
use tower::ServiceExt;

/// Create test app state on top of a prepared mock database.
fn create_test_state(db: MockDatabase) -> AppState {
    let db = Arc::new(db.into_connection());

    let poll_repo = PollRepository::new(Arc::clone(&db));
    let vote_repo = PollVoteRepository::new(Arc::clone(&db));
    let user_repo = UserRepository::new(db);

    AppState {
        user_service: UserService::new(user_repo),
        poll_service: PollService::new(poll_repo.clone()),
        vote_service: VoteService::new(poll_repo.clone(), vote_repo),
        result_service: PollResultService::new(poll_repo),
    }
}

/// Create the test router, with token resolution in front of it.
fn create_test_router(db: MockDatabase) -> Router {
    let state = create_test_state(db);
    api_router()
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}

fn empty_db() -> MockDatabase {
    MockDatabase::new(DatabaseBackend::Postgres)
}

fn post(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method("POST")
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_as(uri: &str, token: &str, body: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method("POST")
        .header("Content-Type", "application/json")
        .header("Authorization", format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn test_user(id: &str, is_admin: bool) -> user::Model {
    user::Model {
        id: id.to_string(),
        username: id.to_string(),
        token: Some(format!("{id}-token")),
        is_admin,
        created_at: Utc::now().into(),
    }
}

fn lunch_poll() -> poll::Model {
    poll::Model {
        id: "p1".to_string(),
        title: "Lunch Options".to_string(),
        status: PollStatus::Active,
        end_date: None,
        created_by: "root".to_string(),
        created_at: Utc::now().into(),
        updated_at: None,
    }
}

fn option(idx: i32, text: &str, vote_count: i32) -> poll_option::Model {
    poll_option::Model {
        id: format!("o{idx}"),
        poll_id: "p1".to_string(),
        idx,
        option_text: text.to_string(),
        vote_count,
    }
}

#[tokio::test]
async fn test_unknown_endpoint_returns_404() {
    let app = create_test_router(empty_db());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/nonexistent/endpoint")
                .method("GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_vote_without_token_is_unauthorized() {
    let app = create_test_router(empty_db());

    let response = app
        .oneshot(post("/votes/cast", r#"{"pollId":"p1","optionText":"Pizza"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_unknown_token_is_unauthorized() {
    let db = empty_db().append_query_results([Vec::<user::Model>::new()]);
    let app = create_test_router(db);

    let response = app
        .oneshot(post_as("/votes/list", "bogus", "{}"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_list_own_votes() {
    let vote = poll_vote::Model {
        id: "v1".to_string(),
        poll_id: "p1".to_string(),
        voter_id: "alice".to_string(),
        owner_id: "alice".to_string(),
        option_text: "Pizza".to_string(),
        docstatus: DocStatus::Submitted,
        amended_from: None,
        created_at: Utc::now().into(),
        updated_at: None,
        submitted_at: Some(Utc::now().into()),
    };
    let db = empty_db()
        .append_query_results([[test_user("alice", false)]])
        .append_query_results([[vote]]);
    let app = create_test_router(db);

    let response = app
        .oneshot(post_as("/votes/list", "alice-token", r#"{"pollId":"p1"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"][0]["id"], "v1");
    assert_eq!(body["data"][0]["docstatus"], "submitted");
}

#[tokio::test]
async fn test_list_votes_without_body() {
    let db = empty_db()
        .append_query_results([[test_user("alice", false)]])
        .append_query_results([Vec::<poll_vote::Model>::new()]);
    let app = create_test_router(db);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/votes/list")
                .method("POST")
                .header("Authorization", "Bearer alice-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({ "data": [] }));
}

#[tokio::test]
async fn test_drafting_for_someone_else_is_forbidden() {
    let db = empty_db().append_query_results([[test_user("alice", false)]]);
    let app = create_test_router(db);

    let response = app
        .oneshot(post_as(
            "/votes/create",
            "alice-token",
            r#"{"pollId":"p1","voterId":"bob","optionText":"Pizza"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_non_admin_cannot_create_poll() {
    let db = empty_db().append_query_results([[test_user("alice", false)]]);
    let app = create_test_router(db);

    let response = app
        .oneshot(post_as(
            "/polls/create",
            "alice-token",
            r#"{"title":"Lunch Options","options":["Pizza","Salad"]}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_create_poll_rejects_special_characters() {
    let db = empty_db().append_query_results([[test_user("root", true)]]);
    let app = create_test_router(db);

    let response = app
        .oneshot(post_as(
            "/polls/create",
            "root-token",
            r#"{"title":"Lunch & Dinner","options":["Pizza"]}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_show_result() {
    let db = empty_db()
        .append_query_results([[lunch_poll()]])
        .append_query_results([vec![option(0, "Pizza", 1), option(1, "Salad", 1)]]);
    let app = create_test_router(db);

    let response = app
        .oneshot(post("/results/show", r#"{"pollId":"p1"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(
        body["data"],
        json!({
            "name": "p1",
            "pollTitle": "Lunch Options",
            "totalVotes": 2,
            "options": [
                { "optionText": "Pizza", "voteCount": 1, "percentage": 50.0 },
                { "optionText": "Salad", "voteCount": 1, "percentage": 50.0 },
            ],
        })
    );
}

#[tokio::test]
async fn test_list_results_empty() {
    let db = empty_db()
        .append_query_results([Vec::<poll::Model>::new()])
        .append_query_results([Vec::<poll_option::Model>::new()]);
    let app = create_test_router(db);

    let response = app.oneshot(post("/results/list", "{}")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({ "data": [] }));
}

#[tokio::test]
async fn test_options_of_unknown_poll() {
    let db = empty_db().append_query_results([Vec::<poll::Model>::new()]);
    let app = create_test_router(db);

    let response = app
        .oneshot(post("/polls/options", r#"{"pollId":"nope"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "POLL_NOT_FOUND");
}

#[tokio::test]
async fn test_invalid_json_returns_error() {
    let app = create_test_router(empty_db());

    let response = app
        .oneshot(post("/results/show", "invalid json"))
        .await
        .unwrap();

    assert!(
        response.status() == StatusCode::BAD_REQUEST
            || response.status() == StatusCode::UNPROCESSABLE_ENTITY
    );
}
