// ViewerContext Middleware - resolves the access token into a request-scoped viewer

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::infrastructure::{
    database::DatabaseInterface, security::TokenService, viewer::ViewerContext,
};

/// Cookie carrying the access token for browser clients
pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";

/// Application state that can authenticate a request
pub trait HasViewerAuth {
    fn tokens(&self) -> &TokenService;
    fn database(&self) -> &Arc<dyn DatabaseInterface>;
}

/// Inserts an `Arc<ViewerContext>` into the request extensions.
///
/// Never rejects by itself: a bad token produces a viewer that carries the
/// failure, and only handlers that require a user turn that into a 401.
pub async fn viewer_context_middleware<T>(
    State(app_state): State<T>,
    mut request: Request,
    next: Next,
) -> Response
where
    T: HasViewerAuth + Clone + Send + Sync + 'static,
{
    let request_id = format!("req-{}", Uuid::new_v4());
    let viewer = match extract_token(request.headers()) {
        Some(token) => resolve_viewer(&app_state, &token, request_id).await,
        None => ViewerContext::anonymous(request_id),
    };

    request.extensions_mut().insert(Arc::new(viewer));
    next.run(request).await
}

async fn resolve_viewer<T: HasViewerAuth>(state: &T, token: &str, request_id: String) -> ViewerContext {
    let claims = match state.tokens().verify(token) {
        Ok(claims) => claims,
        Err(_) => return ViewerContext::rejected(request_id, "Invalid access token"),
    };
    let Ok(user_id) = claims.user_id() else {
        return ViewerContext::rejected(request_id, "Invalid access token");
    };

    match state.database().get_user(user_id).await {
        Ok(Some(user)) => {
            debug!("{} authenticated as {}", request_id, user.username);
            ViewerContext::authenticated_user(user.id, user.username, request_id)
        }
        Ok(None) => ViewerContext::rejected(request_id, "Invalid access token"),
        Err(e) => {
            warn!("Viewer lookup failed for {}: {}", user_id, e);
            ViewerContext::rejected(request_id, "Invalid access token")
        }
    }
}

/// Bearer token from `Authorization`, falling back to the access-token cookie.
fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(value) = headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        if let Some(token) = value.strip_prefix("Bearer ") {
            let token = token.trim();
            if !token.is_empty() {
                return Some(token.to_string());
            }
        }
    }
    token_from_cookie(headers)
}

fn token_from_cookie(headers: &HeaderMap) -> Option<String> {
    let prefix = format!("{}=", ACCESS_TOKEN_COOKIE);
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|cookie| cookie.trim().strip_prefix(prefix.as_str()))
        .find(|token| !token.is_empty())
        .map(str::to_string)
}

/// `Set-Cookie` value that stores the access token.
pub fn access_token_cookie(token: &str, max_age_secs: u64) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        ACCESS_TOKEN_COOKIE, token, max_age_secs
    )
}

/// `Set-Cookie` value that clears the access token.
pub fn clear_access_token_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", ACCESS_TOKEN_COOKIE)
}
