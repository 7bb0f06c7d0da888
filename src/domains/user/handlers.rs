use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::app_state::AppState;
use crate::core::parse_id;
use crate::domains::user::service::{LoginRequest, RegisterRequest};
use crate::error::AppResult;
use crate::infrastructure::middleware::{access_token_cookie, clear_access_token_cookie, Vc};
use crate::models::{ChannelProfile, PopulatedVideo, User};
use crate::response::ApiResponse;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginData {
    user: User,
    access_token: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/current-user", get(current_user))
        .route("/history", get(watch_history))
        .route("/c/{userId}", get(channel_profile))
}

async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> AppResult<ApiResponse<User>> {
    let user = state.users.register(request).await?;
    Ok(ApiResponse::created(user, "User registered successfully"))
}

async fn login(State(state): State<AppState>, Json(request): Json<LoginRequest>) -> AppResult<Response> {
    let session = state.users.login(request).await?;
    let cookie = access_token_cookie(&session.access_token, state.users.token_ttl_secs());
    let body = ApiResponse::ok(
        LoginData {
            user: session.user,
            access_token: session.access_token,
        },
        "User logged in successfully",
    );
    Ok(([(header::SET_COOKIE, cookie)], body).into_response())
}

async fn logout(vc: Vc) -> AppResult<Response> {
    vc.require_user()?;
    let body = ApiResponse::<()>::message(StatusCode::OK, "User logged out");
    Ok(([(header::SET_COOKIE, clear_access_token_cookie())], body).into_response())
}

async fn current_user(State(state): State<AppState>, vc: Vc) -> AppResult<ApiResponse<User>> {
    let user = state.users.current_user(vc.require_user()?).await?;
    Ok(ApiResponse::ok(user, "User fetched successfully"))
}

async fn watch_history(State(state): State<AppState>, vc: Vc) -> AppResult<ApiResponse<Vec<PopulatedVideo>>> {
    let history = state.users.watch_history(vc.require_user()?).await?;
    Ok(ApiResponse::ok(history, "Watch history fetched successfully"))
}

async fn channel_profile(
    State(state): State<AppState>,
    vc: Vc,
    Path(user_id): Path<String>,
) -> AppResult<ApiResponse<ChannelProfile>> {
    let channel_id = parse_id(&user_id, "user")?;
    let profile = state.users.channel_profile(channel_id, vc.user_id).await?;
    Ok(ApiResponse::ok(profile, "User channel fetched successfully"))
}
