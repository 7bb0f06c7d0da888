use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
    Router,
};
use tracing::debug;

use crate::app_state::AppState;
use crate::core::parse_id;
use crate::domains::video::service::{
    ListVideosParams, MediaUpload, PublishVideoInput, UpdateVideoInput,
};
use crate::error::AppResult;
use crate::infrastructure::middleware::Vc;
use crate::models::{PopulatedVideo, Video, VideoPage};
use crate::response::ApiResponse;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/search", get(list_videos))
        .route("/publish", post(publish_video))
        .route(
            "/{videoId}",
            get(get_video).patch(update_video).delete(delete_video),
        )
        .route("/{videoId}/publish", patch(toggle_publish))
}

/// Text and file parts of a video form. Unknown parts are skipped.
#[derive(Default)]
struct VideoForm {
    title: Option<String>,
    description: Option<String>,
    duration: Option<String>,
    video_file: Option<MediaUpload>,
    thumbnail: Option<MediaUpload>,
}

async fn read_video_form(mut multipart: Multipart) -> AppResult<VideoForm> {
    let mut form = VideoForm::default();
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "title" => form.title = Some(field.text().await?),
            "description" => form.description = Some(field.text().await?),
            "duration" => form.duration = Some(field.text().await?),
            "videoFile" | "thumbnail" => {
                let file_name = field.file_name().unwrap_or(name.as_str()).to_string();
                let upload = MediaUpload {
                    file_name,
                    bytes: field.bytes().await?,
                };
                if name == "videoFile" {
                    form.video_file = Some(upload);
                } else {
                    form.thumbnail = Some(upload);
                }
            }
            other => debug!("Ignoring multipart field {:?}", other),
        }
    }
    Ok(form)
}

async fn list_videos(
    State(state): State<AppState>,
    Query(params): Query<ListVideosParams>,
) -> AppResult<ApiResponse<VideoPage>> {
    let page = state.videos.list_videos(params).await?;
    Ok(ApiResponse::ok(page, "Videos retrieved successfully"))
}

async fn publish_video(
    State(state): State<AppState>,
    vc: Vc,
    multipart: Multipart,
) -> AppResult<ApiResponse<Video>> {
    let owner = vc.require_user()?;
    let form = read_video_form(multipart).await?;
    let video = state
        .videos
        .publish_video(
            owner,
            PublishVideoInput {
                title: form.title,
                description: form.description,
                duration: form.duration,
                video_file: form.video_file,
                thumbnail: form.thumbnail,
            },
        )
        .await?;
    Ok(ApiResponse::created(video, "Video published successfully"))
}

async fn get_video(
    State(state): State<AppState>,
    vc: Vc,
    Path(video_id): Path<String>,
) -> AppResult<ApiResponse<PopulatedVideo>> {
    let id = parse_id(&video_id, "video")?;
    let video = state.videos.get_video(id, vc.user_id).await?;
    Ok(ApiResponse::ok(video, "Video retrieved successfully"))
}

async fn update_video(
    State(state): State<AppState>,
    vc: Vc,
    Path(video_id): Path<String>,
    multipart: Multipart,
) -> AppResult<ApiResponse<Video>> {
    let actor = vc.require_user()?;
    let id = parse_id(&video_id, "video")?;
    let form = read_video_form(multipart).await?;
    let video = state
        .videos
        .update_video(
            actor,
            id,
            UpdateVideoInput {
                title: form.title,
                description: form.description,
                thumbnail: form.thumbnail,
            },
        )
        .await?;
    Ok(ApiResponse::ok(video, "Video updated successfully"))
}

async fn delete_video(
    State(state): State<AppState>,
    vc: Vc,
    Path(video_id): Path<String>,
) -> AppResult<ApiResponse<()>> {
    let actor = vc.require_user()?;
    let id = parse_id(&video_id, "video")?;
    state.videos.delete_video(actor, id).await?;
    Ok(ApiResponse::message(StatusCode::OK, "Video deleted successfully"))
}

async fn toggle_publish(
    State(state): State<AppState>,
    vc: Vc,
    Path(video_id): Path<String>,
) -> AppResult<ApiResponse<Video>> {
    let actor = vc.require_user()?;
    let id = parse_id(&video_id, "video")?;
    let video = state.videos.toggle_publish(actor, id).await?;
    let message = if video.is_published {
        "Video is now published"
    } else {
        "Video is now unpublished"
    };
    Ok(ApiResponse::ok(video, message))
}
