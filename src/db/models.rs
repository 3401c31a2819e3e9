use serde::{Deserialize, Serialize};

/// A registered account.
///
/// The password hash is never serialized.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub avatar: String,
    pub created_at: String,
}

/// The fields of a user that are returned to that user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub avatar: String,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            avatar: user.avatar,
        }
    }
}

/// Data for registering a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// A login session.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Session {
    pub id: i64,
    pub user_id: i64,
    pub token: String,
    pub created_at: String,
    pub expires_at: String,
    pub last_used_at: Option<String>,
}

/// Editable fields of an idea, used for both creation and update.
///
/// Missing fields deserialize as empty so they fail validation rather than
/// JSON parsing.
#[derive(Debug, Clone, Deserialize)]
pub struct NewIdea {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// An idea as seen by one viewer: the idea row, its author's public
/// profile, and the derived like/comment aggregates.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct IdeaView {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: String,
    pub category: String,
    pub image_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub username: String,
    pub avatar: String,
    pub likes_count: i64,
    pub comments_count: i64,
    pub user_liked: bool,
}

/// A comment joined with its author's public profile.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CommentWithAuthor {
    pub id: i64,
    pub user_id: i64,
    pub idea_id: i64,
    pub content: String,
    pub created_at: String,
    pub username: String,
    pub avatar: String,
}
