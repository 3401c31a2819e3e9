use serde::Serialize;
use sqlx::SqlitePool;

use crate::auth::AuthGate;
use crate::db::{count_ideas, list_idea_views, IdeaView};
use crate::error::AppError;

/// A validated page/limit window over the idea feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl PageRequest {
    /// Build a request, replacing a zero page with 1 and a zero limit with 1.
    #[must_use]
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: page.max(1),
            limit: limit.max(1),
        }
    }

    /// Build a request from raw query values.
    ///
    /// A missing, unparsable, or non-positive `page` becomes 1; the same for
    /// `limit` becomes `default_limit`. `limit` is clamped to `max_limit`.
    #[must_use]
    pub fn from_query(
        page: Option<&str>,
        limit: Option<&str>,
        default_limit: u32,
        max_limit: u32,
    ) -> Self {
        let page = parse_positive(page).unwrap_or(1);
        let limit = parse_positive(limit)
            .unwrap_or(default_limit)
            .min(max_limit);
        Self::new(page, limit)
    }

    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// Rows to skip: `(page - 1) * limit`.
    #[must_use]
    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.limit)
    }
}

fn parse_positive(raw: Option<&str>) -> Option<u32> {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|v| *v > 0)
        .map(|v| u32::try_from(v).unwrap_or(u32::MAX))
}

/// Page metadata returned alongside a feed window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    #[serde(rename = "totalPages")]
    pub total_pages: i64,
}

impl Pagination {
    #[must_use]
    pub fn new(request: PageRequest, total: i64) -> Self {
        let limit = i64::from(request.limit);
        Self {
            page: request.page,
            limit: request.limit,
            total,
            total_pages: (total.max(0) + limit - 1) / limit,
        }
    }
}

/// One window of the idea feed.
#[derive(Debug, Clone, Serialize)]
pub struct FeedPage {
    pub ideas: Vec<IdeaView>,
    pub pagination: Pagination,
}

/// List ideas newest first, windowed by `request`, as seen by `viewer`.
///
/// A page past the end yields an empty `ideas` list, not an error. `total`
/// always counts every idea.
pub async fn list_feed(
    pool: &SqlitePool,
    viewer: &impl AuthGate,
    request: PageRequest,
) -> Result<FeedPage, AppError> {
    let ideas = list_idea_views(
        pool,
        viewer.current_user_id(),
        i64::from(request.limit),
        request.offset(),
    )
    .await?;
    let total = count_ideas(pool).await?;

    tracing::debug!(
        page = request.page,
        limit = request.limit,
        returned = ideas.len(),
        total,
        "Listed idea feed"
    );

    Ok(FeedPage {
        ideas,
        pagination: Pagination::new(request, total),
    })
}
