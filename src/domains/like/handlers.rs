use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};

use crate::app_state::AppState;
use crate::core::parse_id;
use crate::domains::like::service::LikeToggle;
use crate::error::AppResult;
use crate::infrastructure::middleware::Vc;
use crate::models::LikeKind;
use crate::response::ApiResponse;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/likeVideo/{videoId}", post(toggle_video_like))
        .route("/likeComment/{commentId}", post(toggle_comment_like))
        .route("/likeTweet/{tweetId}", post(toggle_tweet_like))
        .route("/likedVideos", get(liked_videos))
}

async fn toggle(state: &AppState, vc: &Vc, kind: LikeKind, raw_id: &str) -> AppResult<Response> {
    let actor = vc.require_user()?;
    let target = parse_id(raw_id, kind.as_str())?;
    Ok(match state.likes.toggle_like(actor, kind, target).await? {
        LikeToggle::Added(like) => ApiResponse::created(like, "Like added successfully").into_response(),
        LikeToggle::Removed => ApiResponse::accepted("Like removed successfully").into_response(),
    })
}

async fn toggle_video_like(State(state): State<AppState>, vc: Vc, Path(id): Path<String>) -> AppResult<Response> {
    toggle(&state, &vc, LikeKind::Video, &id).await
}

async fn toggle_comment_like(State(state): State<AppState>, vc: Vc, Path(id): Path<String>) -> AppResult<Response> {
    toggle(&state, &vc, LikeKind::Comment, &id).await
}

async fn toggle_tweet_like(State(state): State<AppState>, vc: Vc, Path(id): Path<String>) -> AppResult<Response> {
    toggle(&state, &vc, LikeKind::Tweet, &id).await
}

async fn liked_videos(State(state): State<AppState>, vc: Vc) -> AppResult<Response> {
    let actor = vc.require_user()?;
    let liked = state.likes.liked_videos(actor).await?;
    Ok(if liked.is_empty() {
        ApiResponse::not_found_empty("No liked videos found").into_response()
    } else {
        ApiResponse::ok(liked, "Liked videos retrieved successfully").into_response()
    })
}
