use anyhow::{Context, Result};
use sqlx::SqlitePool;

use super::models::{CommentWithAuthor, IdeaView, NewIdea, NewUser, Session, User};

/// Viewer id bound for anonymous requests. No user row ever has id 0, so the
/// `user_liked` probe is always false for it.
pub const ANONYMOUS_VIEWER_ID: i64 = 0;

/// Idea columns plus author profile and aggregates, in one statement.
///
/// The first bind is the viewer id. Likes and comments are grouped per idea
/// before the LEFT JOIN; joining the raw rows would multiply the two counts.
const IDEA_VIEW_SELECT: &str = r"
    SELECT
        i.id, i.user_id, i.title, i.description, i.category, i.image_url,
        i.created_at, i.updated_at,
        u.username, u.avatar,
        COALESCE(lc.likes_count, 0) AS likes_count,
        COALESCE(cc.comments_count, 0) AS comments_count,
        EXISTS(
            SELECT 1 FROM likes vl WHERE vl.user_id = ? AND vl.idea_id = i.id
        ) AS user_liked
    FROM ideas i
    JOIN users u ON u.id = i.user_id
    LEFT JOIN (
        SELECT idea_id, COUNT(*) AS likes_count FROM likes GROUP BY idea_id
    ) lc ON lc.idea_id = i.id
    LEFT JOIN (
        SELECT idea_id, COUNT(*) AS comments_count FROM comments GROUP BY idea_id
    ) cc ON cc.idea_id = i.id
";

const COMMENT_WITH_AUTHOR_SELECT: &str = r"
    SELECT c.id, c.user_id, c.idea_id, c.content, c.created_at, u.username, u.avatar
    FROM comments c
    JOIN users u ON u.id = c.user_id
";

/// Whether an error chain bottoms out in a SQLite UNIQUE constraint failure.
#[must_use]
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.downcast_ref::<sqlx::Error>()
        .and_then(|e| e.as_database_error())
        .is_some_and(|db_err| db_err.is_unique_violation())
}

// ========== Users ==========

/// Create a new user.
pub async fn create_user(pool: &SqlitePool, user: &NewUser) -> Result<i64> {
    let result = sqlx::query(
        r"
        INSERT INTO users (username, email, password_hash)
        VALUES (?, ?, ?)
        ",
    )
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.password_hash)
    .execute(pool)
    .await
    .context("Failed to create user")?;

    Ok(result.last_insert_rowid())
}

/// Get a user by ID.
pub async fn get_user_by_id(pool: &SqlitePool, id: i64) -> Result<Option<User>> {
    sqlx::query_as("SELECT * FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch user by id")
}

/// Get a user by email.
pub async fn get_user_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>> {
    sqlx::query_as("SELECT * FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch user by email")
}

// ========== Sessions ==========

/// Create a new session.
pub async fn create_session(
    pool: &SqlitePool,
    user_id: i64,
    token: &str,
    expires_at: &str,
) -> Result<i64> {
    let result = sqlx::query(
        r"
        INSERT INTO sessions (user_id, token, expires_at)
        VALUES (?, ?, ?)
        ",
    )
    .bind(user_id)
    .bind(token)
    .bind(expires_at)
    .execute(pool)
    .await
    .context("Failed to create session")?;

    Ok(result.last_insert_rowid())
}

/// Get a session by token.
pub async fn get_session_by_token(pool: &SqlitePool, token: &str) -> Result<Option<Session>> {
    sqlx::query_as("SELECT * FROM sessions WHERE token = ?")
        .bind(token)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch session by token")
}

/// Update session last_used_at.
pub async fn update_session_last_used(pool: &SqlitePool, session_id: i64) -> Result<()> {
    sqlx::query("UPDATE sessions SET last_used_at = datetime('now') WHERE id = ?")
        .bind(session_id)
        .execute(pool)
        .await
        .context("Failed to update session last_used")?;
    Ok(())
}

/// Delete a session.
pub async fn delete_session(pool: &SqlitePool, token: &str) -> Result<()> {
    sqlx::query("DELETE FROM sessions WHERE token = ?")
        .bind(token)
        .execute(pool)
        .await
        .context("Failed to delete session")?;
    Ok(())
}

/// Delete sessions whose RFC 3339 expiry is before `now` (also RFC 3339).
pub async fn delete_expired_sessions(pool: &SqlitePool, now: &str) -> Result<u64> {
    let result = sqlx::query("DELETE FROM sessions WHERE expires_at < ?")
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to delete expired sessions")?;
    Ok(result.rows_affected())
}

// ========== Ideas ==========

/// Insert an idea owned by `user_id`.
pub async fn insert_idea(pool: &SqlitePool, user_id: i64, idea: &NewIdea) -> Result<i64> {
    let result = sqlx::query(
        r"
        INSERT INTO ideas (user_id, title, description, category, image_url)
        VALUES (?, ?, ?, ?, ?)
        ",
    )
    .bind(user_id)
    .bind(&idea.title)
    .bind(&idea.description)
    .bind(&idea.category)
    .bind(&idea.image_url)
    .execute(pool)
    .await
    .context("Failed to insert idea")?;

    Ok(result.last_insert_rowid())
}

/// Update an idea if and only if `user_id` owns it.
///
/// Returns false when the idea is missing or owned by someone else.
pub async fn update_idea_owned(
    pool: &SqlitePool,
    idea_id: i64,
    user_id: i64,
    idea: &NewIdea,
) -> Result<bool> {
    let result = sqlx::query(
        r"
        UPDATE ideas
        SET title = ?, description = ?, category = ?, image_url = ?,
            updated_at = datetime('now')
        WHERE id = ? AND user_id = ?
        ",
    )
    .bind(&idea.title)
    .bind(&idea.description)
    .bind(&idea.category)
    .bind(&idea.image_url)
    .bind(idea_id)
    .bind(user_id)
    .execute(pool)
    .await
    .context("Failed to update idea")?;

    Ok(result.rows_affected() > 0)
}

/// Check whether an idea exists.
pub async fn idea_exists(pool: &SqlitePool, idea_id: i64) -> Result<bool> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM ideas WHERE id = ?")
        .bind(idea_id)
        .fetch_optional(pool)
        .await
        .context("Failed to check idea existence")?;
    Ok(row.is_some())
}

/// Count all ideas.
pub async fn count_ideas(pool: &SqlitePool) -> Result<i64> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM ideas")
        .fetch_one(pool)
        .await
        .context("Failed to count ideas")?;
    Ok(row.0)
}

/// Get one idea with author profile and aggregates as seen by `viewer_id`.
pub async fn get_idea_view(
    pool: &SqlitePool,
    idea_id: i64,
    viewer_id: Option<i64>,
) -> Result<Option<IdeaView>> {
    let sql = format!("{IDEA_VIEW_SELECT} WHERE i.id = ?");
    sqlx::query_as(&sql)
        .bind(viewer_id.unwrap_or(ANONYMOUS_VIEWER_ID))
        .bind(idea_id)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch idea")
}

/// Get a window of ideas, newest first, as seen by `viewer_id`.
pub async fn list_idea_views(
    pool: &SqlitePool,
    viewer_id: Option<i64>,
    limit: i64,
    offset: i64,
) -> Result<Vec<IdeaView>> {
    let sql = format!("{IDEA_VIEW_SELECT} ORDER BY i.created_at DESC, i.id DESC LIMIT ? OFFSET ?");
    sqlx::query_as(&sql)
        .bind(viewer_id.unwrap_or(ANONYMOUS_VIEWER_ID))
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
        .context("Failed to list ideas")
}

// ========== Likes ==========

/// Insert a like row unless one already exists for (user, idea).
///
/// Returns true when a row was created. The UNIQUE constraint turns a
/// concurrent duplicate into a no-op instead of a second row.
pub async fn insert_like_if_absent(pool: &SqlitePool, user_id: i64, idea_id: i64) -> Result<bool> {
    let result = sqlx::query("INSERT OR IGNORE INTO likes (user_id, idea_id) VALUES (?, ?)")
        .bind(user_id)
        .bind(idea_id)
        .execute(pool)
        .await
        .context("Failed to insert like")?;
    Ok(result.rows_affected() == 1)
}

/// Delete the like row for (user, idea). Returns true when a row was removed.
pub async fn delete_like(pool: &SqlitePool, user_id: i64, idea_id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM likes WHERE user_id = ? AND idea_id = ?")
        .bind(user_id)
        .bind(idea_id)
        .execute(pool)
        .await
        .context("Failed to delete like")?;
    Ok(result.rows_affected() > 0)
}

/// Count like rows referencing an idea.
pub async fn count_likes_for_idea(pool: &SqlitePool, idea_id: i64) -> Result<i64> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM likes WHERE idea_id = ?")
        .bind(idea_id)
        .fetch_one(pool)
        .await
        .context("Failed to count likes")?;
    Ok(row.0)
}

// ========== Comments ==========

/// Insert a comment.
pub async fn insert_comment(
    pool: &SqlitePool,
    user_id: i64,
    idea_id: i64,
    content: &str,
) -> Result<i64> {
    let result = sqlx::query(
        r"
        INSERT INTO comments (user_id, idea_id, content)
        VALUES (?, ?, ?)
        ",
    )
    .bind(user_id)
    .bind(idea_id)
    .bind(content)
    .execute(pool)
    .await
    .context("Failed to insert comment")?;

    Ok(result.last_insert_rowid())
}

/// Get a specific comment with author info.
pub async fn get_comment_with_author(
    pool: &SqlitePool,
    comment_id: i64,
) -> Result<Option<CommentWithAuthor>> {
    let sql = format!("{COMMENT_WITH_AUTHOR_SELECT} WHERE c.id = ?");
    sqlx::query_as(&sql)
        .bind(comment_id)
        .fetch_optional(pool)
        .await
        .context("Failed to get comment")
}

/// Get all comments for an idea with author info, oldest first.
pub async fn get_comments_for_idea(
    pool: &SqlitePool,
    idea_id: i64,
) -> Result<Vec<CommentWithAuthor>> {
    let sql = format!(
        "{COMMENT_WITH_AUTHOR_SELECT} WHERE c.idea_id = ? ORDER BY c.created_at ASC, c.id ASC"
    );
    sqlx::query_as(&sql)
        .bind(idea_id)
        .fetch_all(pool)
        .await
        .context("Failed to get comments for idea")
}
