use sqlx::SqlitePool;

use crate::auth::AuthGate;
use crate::db::{get_idea_view, insert_idea, update_idea_owned, IdeaView, NewIdea};
use crate::error::AppError;

/// Fetch one idea with counts and the viewer's like state.
pub async fn get_idea(
    pool: &SqlitePool,
    viewer: &impl AuthGate,
    idea_id: i64,
) -> Result<IdeaView, AppError> {
    get_idea_view(pool, idea_id, viewer.current_user_id())
        .await?
        .ok_or_else(|| AppError::not_found("idea not found"))
}

/// Create an idea owned by the authenticated viewer.
pub async fn create_idea(
    pool: &SqlitePool,
    viewer: &impl AuthGate,
    idea: NewIdea,
) -> Result<IdeaView, AppError> {
    let user_id = viewer.require_auth()?;
    let idea = normalize(idea)?;

    let idea_id = insert_idea(pool, user_id, &idea).await?;
    tracing::info!(idea_id, user_id, category = %idea.category, "Created idea");

    get_idea_view(pool, idea_id, Some(user_id))
        .await?
        .ok_or_else(|| anyhow::anyhow!("idea {idea_id} vanished after insert").into())
}

/// Replace an idea's editable fields. Only the owner may do this; for anyone
/// else the idea is reported as not found.
pub async fn update_idea(
    pool: &SqlitePool,
    viewer: &impl AuthGate,
    idea_id: i64,
    idea: NewIdea,
) -> Result<(), AppError> {
    let user_id = viewer.require_auth()?;
    let idea = normalize(idea)?;

    if !update_idea_owned(pool, idea_id, user_id, &idea).await? {
        return Err(AppError::not_found(
            "idea not found or you do not have permission to edit it",
        ));
    }

    tracing::info!(idea_id, user_id, "Updated idea");
    Ok(())
}

/// Trim every field, require title/description/category, and store an empty
/// image reference as absent.
fn normalize(idea: NewIdea) -> Result<NewIdea, AppError> {
    let required = |value: String, field: &str| {
        let value = value.trim().to_string();
        if value.is_empty() {
            Err(AppError::validation(format!("{field} cannot be empty")))
        } else {
            Ok(value)
        }
    };

    Ok(NewIdea {
        title: required(idea.title, "title")?,
        description: required(idea.description, "description")?,
        category: required(idea.category, "category")?,
        image_url: idea
            .image_url
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty()),
    })
}
