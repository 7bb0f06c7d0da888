use serde::Serialize;

use crate::core::{EntityId, Timestamp};
use crate::models::video::Video;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    #[serde(rename = "_id")]
    pub id: EntityId,
    pub name: String,
    pub description: String,
    /// Ordered; duplicates are kept out by the playlist service.
    pub videos: Vec<EntityId>,
    pub owner: EntityId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Playlist {
    pub fn contains(&self, video: EntityId) -> bool {
        self.videos.contains(&video)
    }
}

#[derive(Debug, Clone)]
pub struct NewPlaylist {
    pub name: String,
    pub description: String,
    pub owner: EntityId,
}

/// Playlist with its video references resolved. References to videos that
/// no longer exist are dropped.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulatedPlaylist {
    #[serde(rename = "_id")]
    pub id: EntityId,
    pub name: String,
    pub description: String,
    pub videos: Vec<Video>,
    pub owner: EntityId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl PopulatedPlaylist {
    pub fn new(playlist: Playlist, videos: Vec<Video>) -> Self {
        Self {
            id: playlist.id,
            name: playlist.name,
            description: playlist.description,
            videos,
            owner: playlist.owner,
            created_at: playlist.created_at,
            updated_at: playlist.updated_at,
        }
    }
}
