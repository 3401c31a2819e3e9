use crate::error::AppError;

/// Source of the acting user's identity for a single request.
///
/// Services receive the gate as a parameter instead of reading session state
/// themselves, so the same operation can be driven by an HTTP session, a
/// test, or any other caller that knows who is acting.
pub trait AuthGate {
    /// The authenticated user's id, or `None` for an anonymous viewer.
    fn current_user_id(&self) -> Option<i64>;

    /// The authenticated user's id.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] for an anonymous viewer.
    fn require_auth(&self) -> Result<i64, AppError> {
        self.current_user_id().ok_or(AppError::Unauthorized)
    }
}

/// The identity making the current request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Viewer {
    user_id: Option<i64>,
    session_token: Option<String>,
}

impl Viewer {
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn user(user_id: i64) -> Self {
        Self {
            user_id: Some(user_id),
            session_token: None,
        }
    }

    pub(crate) fn with_session(user_id: i64, token: String) -> Self {
        Self {
            user_id: Some(user_id),
            session_token: Some(token),
        }
    }

    /// The token of the session this viewer was resolved from, if any.
    #[must_use]
    pub fn session_token(&self) -> Option<&str> {
        self.session_token.as_deref()
    }
}

impl AuthGate for Viewer {
    fn current_user_id(&self) -> Option<i64> {
        self.user_id
    }
}
