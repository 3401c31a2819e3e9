//! Registration, login, logout and current-user lookup.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::SqlitePool;

use super::gate::{AuthGate, Viewer};
use super::password::{hash_password, validate_password_strength, verify_password};
use super::session::generate_session_token;
use crate::db::{self as queries, is_unique_violation, NewUser, PublicUser};
use crate::error::AppError;

/// Registration form.
#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Login form.
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// A freshly created session for a user.
#[derive(Debug, Clone)]
pub struct SignedIn {
    pub user: PublicUser,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

const INVALID_CREDENTIALS: &str = "invalid email or password";

/// Create an account and sign it in.
pub async fn register(
    pool: &SqlitePool,
    registration: Registration,
    session_ttl: chrono::Duration,
) -> Result<SignedIn, AppError> {
    let username = registration.username.trim();
    let email = registration.email.trim();

    if username.is_empty() {
        return Err(AppError::validation("username is required"));
    }
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::validation("a valid email is required"));
    }
    validate_password_strength(&registration.password)?;

    let new_user = NewUser {
        username: username.to_string(),
        email: email.to_string(),
        password_hash: hash_password(&registration.password)?,
    };

    let user_id = match queries::create_user(pool, &new_user).await {
        Ok(id) => id,
        Err(e) if is_unique_violation(&e) => {
            return Err(AppError::validation("username or email already in use"));
        }
        Err(e) => return Err(e.into()),
    };
    tracing::info!(user_id, username, "Registered user");

    start_session(pool, user_id, session_ttl).await
}

/// Check credentials and sign the user in.
///
/// Unknown email and wrong password produce the same error.
pub async fn login(
    pool: &SqlitePool,
    credentials: Credentials,
    session_ttl: chrono::Duration,
) -> Result<SignedIn, AppError> {
    let email = credentials.email.trim();
    if email.is_empty() || credentials.password.is_empty() {
        return Err(AppError::validation(INVALID_CREDENTIALS));
    }

    let Some(user) = queries::get_user_by_email(pool, email).await? else {
        return Err(AppError::validation(INVALID_CREDENTIALS));
    };

    if !verify_password(&credentials.password, &user.password_hash)? {
        tracing::info!(user_id = user.id, "Rejected login with wrong password");
        return Err(AppError::validation(INVALID_CREDENTIALS));
    }

    tracing::info!(user_id = user.id, "User logged in");
    start_session(pool, user.id, session_ttl).await
}

/// End the viewer's session, if it came from one.
pub async fn logout(pool: &SqlitePool, viewer: &Viewer) -> Result<(), AppError> {
    if let Some(token) = viewer.session_token() {
        queries::delete_session(pool, token).await?;
        tracing::info!(user_id = viewer.current_user_id(), "User logged out");
    }
    Ok(())
}

/// The viewer's own profile, or `None` when anonymous.
pub async fn current_user(
    pool: &SqlitePool,
    viewer: &impl AuthGate,
) -> Result<Option<PublicUser>, AppError> {
    let Some(user_id) = viewer.current_user_id() else {
        return Ok(None);
    };
    Ok(queries::get_user_by_id(pool, user_id)
        .await?
        .map(PublicUser::from))
}

async fn start_session(
    pool: &SqlitePool,
    user_id: i64,
    session_ttl: chrono::Duration,
) -> Result<SignedIn, AppError> {
    let token = generate_session_token();
    let expires_at = Utc::now()
        .checked_add_signed(session_ttl)
        .ok_or_else(|| anyhow::anyhow!("session lifetime {session_ttl} is out of range"))?;
    queries::create_session(pool, user_id, &token, &expires_at.to_rfc3339()).await?;

    let user = queries::get_user_by_id(pool, user_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("user {user_id} vanished while signing in"))?;

    Ok(SignedIn {
        user: user.into(),
        token,
        expires_at,
    })
}
