use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;

use crate::app_state::AppState;
use crate::core::parse_id;
use crate::error::AppResult;
use crate::infrastructure::middleware::Vc;
use crate::models::{Comment, PageRequest};
use crate::response::ApiResponse;

#[derive(Debug, Default, Deserialize)]
pub struct CommentPageParams {
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CommentBody {
    pub content: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/{videoId}", get(list_comments).post(add_comment))
        .route("/c/{commentId}", put(update_comment).delete(delete_comment))
}

async fn list_comments(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    Query(params): Query<CommentPageParams>,
) -> AppResult<Response> {
    let video = parse_id(&video_id, "video")?;
    let page = PageRequest::parse(params.page.as_deref(), params.limit.as_deref())?;
    Ok(match state.comments.list_comments(video, page).await? {
        Some(page) => ApiResponse::ok(page, "Comments retrieved successfully").into_response(),
        None => ApiResponse::not_found_empty("No comments found for this video").into_response(),
    })
}

async fn add_comment(
    State(state): State<AppState>,
    vc: Vc,
    Path(video_id): Path<String>,
    Json(body): Json<CommentBody>,
) -> AppResult<ApiResponse<Comment>> {
    let owner = vc.require_user()?;
    let video = parse_id(&video_id, "video")?;
    let comment = state
        .comments
        .add_comment(owner, video, body.content.as_deref())
        .await?;
    Ok(ApiResponse::created(comment, "Comment added successfully"))
}

async fn update_comment(
    State(state): State<AppState>,
    vc: Vc,
    Path(comment_id): Path<String>,
    Json(body): Json<CommentBody>,
) -> AppResult<ApiResponse<Comment>> {
    let actor = vc.require_user()?;
    let id = parse_id(&comment_id, "comment")?;
    let comment = state
        .comments
        .update_comment(actor, id, body.content.as_deref())
        .await?;
    Ok(ApiResponse::ok(comment, "Comment updated successfully"))
}

async fn delete_comment(
    State(state): State<AppState>,
    vc: Vc,
    Path(comment_id): Path<String>,
) -> AppResult<ApiResponse<()>> {
    let actor = vc.require_user()?;
    let id = parse_id(&comment_id, "comment")?;
    state.comments.delete_comment(actor, id).await?;
    Ok(ApiResponse::message(StatusCode::OK, "Comment deleted successfully"))
}
