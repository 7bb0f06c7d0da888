use crate::core::EntityId;
use crate::error::{AppError, AppResult};

/// Who is making the current request.
///
/// Built once per request by the viewer-context middleware. Public routes
/// read it optionally; protected routes call `require_user`.
#[derive(Debug, Clone)]
pub struct ViewerContext {
    pub request_id: String,
    pub user_id: Option<EntityId>,
    pub username: Option<String>,
    /// Set when a token was presented but could not be accepted.
    pub auth_failure: Option<String>,
}

impl ViewerContext {
    pub fn anonymous(request_id: String) -> Self {
        Self {
            request_id,
            user_id: None,
            username: None,
            auth_failure: None,
        }
    }

    pub fn authenticated_user(user_id: EntityId, username: String, request_id: String) -> Self {
        Self {
            request_id,
            user_id: Some(user_id),
            username: Some(username),
            auth_failure: None,
        }
    }

    pub fn rejected(request_id: String, reason: impl Into<String>) -> Self {
        Self {
            auth_failure: Some(reason.into()),
            ..Self::anonymous(request_id)
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }

    pub fn require_user(&self) -> AppResult<EntityId> {
        match (self.user_id, &self.auth_failure) {
            (Some(id), _) => Ok(id),
            (None, Some(reason)) => Err(AppError::Unauthorized(reason.clone())),
            (None, None) => Err(AppError::Unauthorized("Unauthorized request".to_string())),
        }
    }
}
