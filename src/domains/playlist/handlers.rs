use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

use crate::app_state::AppState;
use crate::core::parse_id;
use crate::domains::playlist::service::PlaylistBody;
use crate::error::AppResult;
use crate::infrastructure::middleware::Vc;
use crate::models::{Playlist, PopulatedPlaylist};
use crate::response::ApiResponse;

// `{id}` is a user id for GET and a playlist id for PUT/DELETE.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/create", post(create_playlist))
        .route(
            "/{id}",
            get(user_playlists).put(update_playlist).delete(delete_playlist),
        )
        .route("/playlist/{playlistId}", get(get_playlist))
        .route("/add-video/{playlistId}/{videoId}", post(add_video))
        .route("/remove-video/{playlistId}/{videoId}", post(remove_video))
}

async fn create_playlist(
    State(state): State<AppState>,
    vc: Vc,
    Json(body): Json<PlaylistBody>,
) -> AppResult<ApiResponse<Playlist>> {
    let owner = vc.require_user()?;
    let playlist = state.playlists.create_playlist(owner, body).await?;
    Ok(ApiResponse::created(playlist, "Playlist created successfully"))
}

async fn user_playlists(State(state): State<AppState>, vc: Vc, Path(user_id): Path<String>) -> AppResult<Response> {
    vc.require_user()?;
    let owner = parse_id(&user_id, "user")?;
    let playlists = state.playlists.user_playlists(owner).await?;
    Ok(if playlists.is_empty() {
        ApiResponse::not_found_empty("No playlists found for this user").into_response()
    } else {
        ApiResponse::ok(playlists, "User playlists retrieved successfully").into_response()
    })
}

async fn get_playlist(
    State(state): State<AppState>,
    vc: Vc,
    Path(playlist_id): Path<String>,
) -> AppResult<ApiResponse<PopulatedPlaylist>> {
    vc.require_user()?;
    let id = parse_id(&playlist_id, "playlist")?;
    let playlist = state.playlists.get_playlist(id).await?;
    Ok(ApiResponse::ok(playlist, "Playlist retrieved successfully"))
}

async fn add_video(
    State(state): State<AppState>,
    vc: Vc,
    Path((playlist_id, video_id)): Path<(String, String)>,
) -> AppResult<ApiResponse<Playlist>> {
    let actor = vc.require_user()?;
    let playlist_id = parse_id(&playlist_id, "playlist")?;
    let video_id = parse_id(&video_id, "video")?;
    let playlist = state.playlists.add_video(actor, playlist_id, video_id).await?;
    Ok(ApiResponse::ok(playlist, "Video added to playlist successfully"))
}

async fn remove_video(
    State(state): State<AppState>,
    vc: Vc,
    Path((playlist_id, video_id)): Path<(String, String)>,
) -> AppResult<ApiResponse<Playlist>> {
    let actor = vc.require_user()?;
    let playlist_id = parse_id(&playlist_id, "playlist")?;
    let video_id = parse_id(&video_id, "video")?;
    let playlist = state.playlists.remove_video(actor, playlist_id, video_id).await?;
    Ok(ApiResponse::ok(playlist, "Video removed from playlist successfully"))
}

async fn update_playlist(
    State(state): State<AppState>,
    vc: Vc,
    Path(playlist_id): Path<String>,
    Json(body): Json<PlaylistBody>,
) -> AppResult<ApiResponse<Playlist>> {
    let actor = vc.require_user()?;
    let id = parse_id(&playlist_id, "playlist")?;
    let playlist = state.playlists.update_playlist(actor, id, body).await?;
    Ok(ApiResponse::ok(playlist, "Playlist updated successfully"))
}

async fn delete_playlist(
    State(state): State<AppState>,
    vc: Vc,
    Path(playlist_id): Path<String>,
) -> AppResult<ApiResponse<()>> {
    let actor = vc.require_user()?;
    let id = parse_id(&playlist_id, "playlist")?;
    state.playlists.delete_playlist(actor, id).await?;
    Ok(ApiResponse::message(StatusCode::OK, "Playlist deleted successfully"))
}
