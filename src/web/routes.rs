use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use super::AppState;
use crate::auth::{AuthGate, Viewer};
use crate::db::NewIdea;
use crate::error::AppError;
use crate::feed::{self, PageRequest};

/// Create the router with the idea, like and comment routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/ideas", get(list_ideas).post(create_idea))
        .route("/api/ideas/:id", get(idea_detail).put(update_idea))
        .route("/api/ideas/:id/like", post(toggle_like))
        .route(
            "/api/ideas/:id/comments",
            get(list_comments).post(add_comment),
        )
        .route("/healthz", get(health))
}

async fn health() -> &'static str {
    "OK"
}

// ========== Ideas ==========

/// Raw feed query. Values stay strings so that garbage falls back to the
/// defaults instead of rejecting the request. `category` and `sort` may be
/// sent by clients and are ignored.
#[derive(Debug, Deserialize)]
pub struct FeedParams {
    page: Option<String>,
    limit: Option<String>,
}

async fn list_ideas(
    State(state): State<AppState>,
    viewer: Viewer,
    Query(params): Query<FeedParams>,
) -> Result<Json<feed::FeedPage>, AppError> {
    let request = PageRequest::from_query(
        params.page.as_deref(),
        params.limit.as_deref(),
        state.config.default_page_limit,
        state.config.max_page_limit,
    );

    Ok(Json(feed::list_feed(state.db.pool(), &viewer, request).await?))
}

async fn idea_detail(
    State(state): State<AppState>,
    viewer: Viewer,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Value>, AppError> {
    let idea = feed::get_idea(state.db.pool(), &viewer, idea_id(id)?).await?;
    Ok(Json(json!({ "idea": idea })))
}

async fn create_idea(
    State(state): State<AppState>,
    viewer: Viewer,
    body: Result<Json<NewIdea>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    viewer.require_auth()?;
    let Json(body) = body?;

    let idea = feed::create_idea(state.db.pool(), &viewer, body).await?;
    Ok(Json(json!({ "message": "idea created", "idea": idea })))
}

async fn update_idea(
    State(state): State<AppState>,
    viewer: Viewer,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<NewIdea>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    viewer.require_auth()?;
    let id = idea_id(id)?;
    let Json(body) = body?;

    feed::update_idea(state.db.pool(), &viewer, id, body).await?;
    Ok(Json(json!({ "message": "idea updated" })))
}

/// A path id that is not an integer cannot name an idea.
fn idea_id(path: Result<Path<i64>, PathRejection>) -> Result<i64, AppError> {
    path.map(|Path(id)| id)
        .map_err(|_| AppError::not_found("idea not found"))
}

// ========== Likes ==========

async fn toggle_like(
    State(state): State<AppState>,
    viewer: Viewer,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Value>, AppError> {
    viewer.require_auth()?;
    let toggle = feed::toggle_like(state.db.pool(), &viewer, idea_id(id)?).await?;
    let message = if toggle.liked { "like added" } else { "like removed" };

    Ok(Json(json!({
        "liked": toggle.liked,
        "likes_count": toggle.likes_count,
        "message": message,
    })))
}

// ========== Comments ==========

#[derive(Debug, Deserialize)]
pub struct CommentBody {
    #[serde(default)]
    content: String,
}

async fn add_comment(
    State(state): State<AppState>,
    viewer: Viewer,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<CommentBody>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    viewer.require_auth()?;
    let id = idea_id(id)?;
    let Json(body) = body?;

    let comment = feed::add_comment(
        state.db.pool(),
        &viewer,
        id,
        &body.content,
        state.config.max_comment_length,
    )
    .await?;

    Ok(Json(json!({ "message": "comment added", "comment": comment })))
}

async fn list_comments(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Value>, AppError> {
    let comments = feed::list_comments(state.db.pool(), idea_id(id)?).await?;
    Ok(Json(json!({ "comments": comments })))
}
