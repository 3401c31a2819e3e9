use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

use super::AppState;
use crate::auth::{
    self, clear_session_cookie, session_cookie, Credentials, Registration, SignedIn, Viewer,
};
use crate::error::AppError;

/// Create the router with the account routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/register", post(register))
        .route("/api/login", post(login))
        .route("/api/logout", post(logout))
        .route("/api/user", get(current_user))
}

/// POST /api/register - Create an account and start a session.
async fn register(
    State(state): State<AppState>,
    form: Result<Json<Registration>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(form) = form?;
    let signed_in = auth::register(state.db.pool(), form, state.config.session_ttl).await?;
    Ok(signed_in_response(&state, signed_in, "account created"))
}

/// POST /api/login - Start a session.
async fn login(
    State(state): State<AppState>,
    form: Result<Json<Credentials>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(form) = form?;
    let signed_in = auth::login(state.db.pool(), form, state.config.session_ttl).await?;
    Ok(signed_in_response(&state, signed_in, "logged in"))
}

/// POST /api/logout - End the current session and clear the cookie.
async fn logout(State(state): State<AppState>, viewer: Viewer) -> Result<Response, AppError> {
    auth::logout(state.db.pool(), &viewer).await?;

    Ok((
        [(header::SET_COOKIE, clear_session_cookie())],
        Json(json!({ "message": "logged out" })),
    )
        .into_response())
}

/// GET /api/user - The signed-in user, or null.
async fn current_user(
    State(state): State<AppState>,
    viewer: Viewer,
) -> Result<Json<serde_json::Value>, AppError> {
    let user = auth::current_user(state.db.pool(), &viewer).await?;
    Ok(Json(json!({ "user": user })))
}

fn signed_in_response(state: &AppState, signed_in: SignedIn, message: &str) -> Response {
    let cookie = session_cookie(
        &signed_in.token,
        state.config.session_ttl.num_seconds(),
        state.config.cookie_secure,
    );

    (
        [(header::SET_COOKIE, cookie)],
        Json(json!({ "message": message, "user": signed_in.user })),
    )
        .into_response()
}
