use serde::Serialize;
use sqlx::SqlitePool;

use crate::auth::AuthGate;
use crate::db::{count_likes_for_idea, delete_like, idea_exists, insert_like_if_absent};
use crate::error::AppError;

/// Result of a like toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LikeToggle {
    /// Whether the viewer likes the idea after this call.
    pub liked: bool,
    /// Like rows for the idea after this call.
    pub likes_count: i64,
}

/// Flip the viewer's like on an idea.
///
/// The insert is attempted first; if the (user, idea) row already exists the
/// insert is ignored and the row is deleted instead. Calling twice therefore
/// likes and then unlikes. Two racing calls cannot both insert, since the
/// UNIQUE constraint sends the loser down the delete branch.
pub async fn toggle_like(
    pool: &SqlitePool,
    viewer: &impl AuthGate,
    idea_id: i64,
) -> Result<LikeToggle, AppError> {
    let user_id = viewer.require_auth()?;

    if !idea_exists(pool, idea_id).await? {
        return Err(AppError::not_found("idea not found"));
    }

    let liked = if insert_like_if_absent(pool, user_id, idea_id).await? {
        true
    } else {
        delete_like(pool, user_id, idea_id).await?;
        false
    };

    let likes_count = count_likes_for_idea(pool, idea_id).await?;
    tracing::info!(idea_id, user_id, liked, likes_count, "Toggled like");

    Ok(LikeToggle { liked, likes_count })
}
