//! Idea feed and social interactions: the aggregated idea view, feed
//! pagination, like toggling, and comment threads.
//!
//! Every operation takes the acting identity as an [`AuthGate`](crate::auth::AuthGate)
//! and returns [`AppError`](crate::error::AppError).

pub mod comments;
pub mod ideas;
pub mod likes;
pub mod pagination;

pub use comments::{add_comment, list_comments};
pub use ideas::{create_idea, get_idea, update_idea};
pub use likes::{toggle_like, LikeToggle};
pub use pagination::{list_feed, FeedPage, PageRequest, Pagination};
