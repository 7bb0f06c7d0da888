// HTTP surface: every resource router nested under /api/v1

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{HeaderValue, Method, StatusCode},
    middleware,
    routing::get,
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::warn;

use crate::app_state::AppState;
use crate::domains::{comment, like, playlist, subscription, tweet, user, video};
use crate::error::AppResult;
use crate::infrastructure::viewer_context_middleware;
use crate::response::ApiResponse;

pub const API_PREFIX: &str = "/api/v1";

pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .nest("/users", user::routes())
        .nest("/videos", video::routes())
        .nest("/comments", comment::routes())
        .nest("/likes", like::routes())
        .nest("/tweets", tweet::routes())
        .nest("/playlists", playlist::routes())
        .nest("/subscriptions", subscription::routes());

    Router::new()
        .nest(API_PREFIX, api)
        .route("/healthz", get(health))
        .nest_service("/media", ServeDir::new(&state.config.media.root))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            viewer_context_middleware::<AppState>,
        ))
        .layer(DefaultBodyLimit::max(state.config.media.max_upload_bytes))
        .layer(cors_layer(state.config.server.cors_origin.as_deref()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let Some(origin) = origin else {
        return CorsLayer::permissive();
    };
    match HeaderValue::from_str(origin) {
        Ok(origin) => CorsLayer::new()
            .allow_origin(AllowOrigin::exact(origin))
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
            ])
            .allow_headers([
                axum::http::header::AUTHORIZATION,
                axum::http::header::CONTENT_TYPE,
            ])
            .allow_credentials(true),
        Err(_) => {
            warn!("Ignoring unparsable CORS_ORIGIN {:?}; allowing any origin", origin);
            CorsLayer::permissive()
        }
    }
}

async fn health(State(state): State<AppState>) -> AppResult<ApiResponse<()>> {
    state.database.health_check().await?;
    Ok(ApiResponse::message(StatusCode::OK, "OK"))
}
