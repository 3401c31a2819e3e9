use sqlx::SqlitePool;

use crate::auth::AuthGate;
use crate::db::{
    get_comment_with_author, get_comments_for_idea, idea_exists, insert_comment,
    CommentWithAuthor,
};
use crate::error::AppError;

/// Append a comment by the authenticated viewer to an idea.
///
/// Content is trimmed before validation and storage. Returns the stored
/// comment with the author's username and avatar.
pub async fn add_comment(
    pool: &SqlitePool,
    viewer: &impl AuthGate,
    idea_id: i64,
    content: &str,
    max_length: usize,
) -> Result<CommentWithAuthor, AppError> {
    let user_id = viewer.require_auth()?;
    let content = validate_content(content, max_length)?;

    if !idea_exists(pool, idea_id).await? {
        return Err(AppError::not_found("idea not found"));
    }

    let comment_id = insert_comment(pool, user_id, idea_id, content).await?;
    tracing::info!(comment_id, idea_id, user_id, "Added comment");

    get_comment_with_author(pool, comment_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("comment {comment_id} vanished after insert").into())
}

/// All comments on an idea, oldest first. Unknown ideas have no comments.
pub async fn list_comments(
    pool: &SqlitePool,
    idea_id: i64,
) -> Result<Vec<CommentWithAuthor>, AppError> {
    Ok(get_comments_for_idea(pool, idea_id).await?)
}

fn validate_content(content: &str, max_length: usize) -> Result<&str, AppError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(AppError::validation("comment content cannot be empty"));
    }
    if content.chars().count() > max_length {
        return Err(AppError::validation(format!(
            "comment content cannot exceed {max_length} characters"
        )));
    }
    Ok(content)
}
