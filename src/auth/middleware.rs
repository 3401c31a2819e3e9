use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use super::gate::Viewer;
use super::session::token_from_cookie_header;
use crate::db as queries;
use crate::error::AppError;

/// Resolves the session cookie into a [`Viewer`].
///
/// A missing, unknown, or expired session yields an anonymous viewer, and
/// handlers decide via [`super::AuthGate::require_auth`] whether that is
/// acceptable. Only a failed session lookup rejects the request.
#[async_trait]
impl<S> FromRequestParts<S> for Viewer
where
    S: Send + Sync,
    SqlitePool: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let pool = SqlitePool::from_ref(state);

        let token = parts
            .headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|h| h.to_str().ok())
            .find_map(token_from_cookie_header);

        let Some(token) = token else {
            return Ok(Viewer::anonymous());
        };

        let Some(session) = queries::get_session_by_token(&pool, token).await? else {
            return Ok(Viewer::anonymous());
        };

        if is_expired(&session.expires_at, Utc::now()) {
            if let Err(e) = queries::delete_session(&pool, token).await {
                tracing::warn!("Failed to delete expired session: {e:#}");
            }
            return Ok(Viewer::anonymous());
        }

        if let Err(e) = queries::update_session_last_used(&pool, session.id).await {
            tracing::debug!("Failed to touch session: {e:#}");
        }

        Ok(Viewer::with_session(session.user_id, session.token))
    }
}

/// An unparsable expiry counts as expired.
fn is_expired(expires_at: &str, now: DateTime<Utc>) -> bool {
    DateTime::parse_from_rfc3339(expires_at).map_or(true, |expiry| expiry <= now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_is_expired() {
        let now = Utc::now();
        assert!(is_expired(&(now - Duration::minutes(1)).to_rfc3339(), now));
        assert!(!is_expired(&(now + Duration::days(7)).to_rfc3339(), now));
        assert!(is_expired("garbage", now));
    }
}
