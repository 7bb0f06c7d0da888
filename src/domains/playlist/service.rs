use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use crate::core::EntityId;
use crate::domains::non_blank;
use crate::error::{AppError, AppResult};
use crate::infrastructure::DatabaseInterface;
use crate::models::{NewPlaylist, Playlist, PopulatedPlaylist};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlaylistBody {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Clone)]
pub struct PlaylistService {
    database: Arc<dyn DatabaseInterface>,
}

impl PlaylistService {
    pub fn new(database: Arc<dyn DatabaseInterface>) -> Self {
        Self { database }
    }

    pub async fn create_playlist(&self, owner: EntityId, body: PlaylistBody) -> AppResult<Playlist> {
        let (Some(name), Some(description)) = (
            non_blank(body.name.as_deref()),
            non_blank(body.description.as_deref()),
        ) else {
            return Err(AppError::BadRequest("Name and description are required".to_string()));
        };

        if self.database.find_playlist_by_name(owner, name).await?.is_some() {
            return Err(AppError::Validation(
                "Playlist with this name already exists".to_string(),
            ));
        }

        let playlist = self
            .database
            .create_playlist(NewPlaylist {
                name: name.to_string(),
                description: description.to_string(),
                owner,
            })
            .await?;
        info!("User {} created playlist {}", owner, playlist.id);
        Ok(playlist)
    }

    /// A user's playlists, oldest first, with their videos resolved.
    pub async fn user_playlists(&self, owner: EntityId) -> AppResult<Vec<PopulatedPlaylist>> {
        let playlists = self.database.list_playlists_by_owner(owner).await?;
        let mut populated = Vec::with_capacity(playlists.len());
        for playlist in playlists {
            populated.push(self.populate(playlist).await?);
        }
        Ok(populated)
    }

    pub async fn get_playlist(&self, id: EntityId) -> AppResult<PopulatedPlaylist> {
        let playlist = self.find(id).await?;
        self.populate(playlist).await
    }

    pub async fn add_video(&self, actor: EntityId, playlist_id: EntityId, video_id: EntityId) -> AppResult<Playlist> {
        let mut playlist = self.owned_playlist(actor, playlist_id, "modify").await?;
        if self.database.get_video(video_id).await?.is_none() {
            return Err(AppError::NotFound("Video not found".to_string()));
        }
        if playlist.contains(video_id) {
            return Err(AppError::Validation(
                "Video already exists in the playlist".to_string(),
            ));
        }
        playlist.videos.push(video_id);
        self.database.save_playlist(&playlist).await
    }

    pub async fn remove_video(&self, actor: EntityId, playlist_id: EntityId, video_id: EntityId) -> AppResult<Playlist> {
        let mut playlist = self.owned_playlist(actor, playlist_id, "modify").await?;
        if !playlist.contains(video_id) {
            return Err(AppError::NotFound("Video not found in the playlist".to_string()));
        }
        playlist.videos.retain(|id| *id != video_id);
        self.database.save_playlist(&playlist).await
    }

    /// Blank or missing fields keep their current value.
    pub async fn update_playlist(&self, actor: EntityId, id: EntityId, body: PlaylistBody) -> AppResult<Playlist> {
        let mut playlist = self.owned_playlist(actor, id, "update").await?;
        if let Some(name) = non_blank(body.name.as_deref()) {
            playlist.name = name.to_string();
        }
        if let Some(description) = non_blank(body.description.as_deref()) {
            playlist.description = description.to_string();
        }
        self.database.save_playlist(&playlist).await
    }

    pub async fn delete_playlist(&self, actor: EntityId, id: EntityId) -> AppResult<()> {
        self.owned_playlist(actor, id, "delete").await?;
        self.database.delete_playlist(id).await?;
        info!("User {} deleted playlist {}", actor, id);
        Ok(())
    }

    async fn find(&self, id: EntityId) -> AppResult<Playlist> {
        self.database
            .get_playlist(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Playlist not found".to_string()))
    }

    async fn owned_playlist(&self, actor: EntityId, id: EntityId, action: &str) -> AppResult<Playlist> {
        let playlist = self.find(id).await?;
        if playlist.owner != actor {
            return Err(AppError::Forbidden(format!(
                "You do not have permission to {} this playlist",
                action
            )));
        }
        Ok(playlist)
    }

    async fn populate(&self, playlist: Playlist) -> AppResult<PopulatedPlaylist> {
        let found = self.database.get_videos_by_ids(&playlist.videos).await?;
        let mut by_id: HashMap<_, _> = found.into_iter().map(|video| (video.id, video)).collect();
        let videos = playlist
            .videos
            .iter()
            .filter_map(|id| by_id.remove(id))
            .collect();
        Ok(PopulatedPlaylist::new(playlist, videos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::test_support::{memory_db, seed_user};
    use crate::models::NewVideo;

    fn body(name: &str, description: &str) -> PlaylistBody {
        PlaylistBody {
            name: Some(name.to_string()),
            description: Some(description.to_string()),
        }
    }

    async fn video(db: &Arc<dyn DatabaseInterface>, owner: EntityId, title: &str) -> EntityId {
        db.create_video(NewVideo {
            video_file: "memory://v".to_string(),
            thumbnail: "memory://t".to_string(),
            owner,
            title: title.to_string(),
            description: "d".to_string(),
            duration: 1.0,
        })
        .await
        .unwrap()
        .id
    }

    #[tokio::test]
    async fn duplicate_video_is_rejected() {
        let db = memory_db().await;
        let playlists = PlaylistService::new(db.clone());
        let user = seed_user(&db, "a").await;
        let v1 = video(&db, user, "v1").await;

        let playlist = playlists.create_playlist(user, body("Favs", "x")).await.unwrap();
        playlists.add_video(user, playlist.id, v1).await.unwrap();
        match playlists.add_video(user, playlist.id, v1).await {
            Err(AppError::Validation(msg)) => assert_eq!(msg, "Video already exists in the playlist"),
            other => panic!("unexpected: {:?}", other.map(|p| p.id)),
        }

        let stored = playlists.get_playlist(playlist.id).await.unwrap();
        assert_eq!(stored.videos.len(), 1);
        assert_eq!(stored.videos[0].id, v1);
    }

    #[tokio::test]
    async fn create_rejects_blank_and_duplicate_names() {
        let db = memory_db().await;
        let playlists = PlaylistService::new(db.clone());
        let user = seed_user(&db, "a").await;
        let other = seed_user(&db, "b").await;

        assert!(matches!(
            playlists.create_playlist(user, body(" ", "x")).await,
            Err(AppError::BadRequest(_))
        ));
        playlists.create_playlist(user, body("Favs", "x")).await.unwrap();
        assert!(matches!(
            playlists.create_playlist(user, body("Favs", "y")).await,
            Err(AppError::Validation(_))
        ));
        // Names are scoped per owner.
        playlists.create_playlist(other, body("Favs", "x")).await.unwrap();
    }

    #[tokio::test]
    async fn remove_and_ownership() {
        let db = memory_db().await;
        let playlists = PlaylistService::new(db.clone());
        let owner = seed_user(&db, "owner").await;
        let stranger = seed_user(&db, "stranger").await;
        let (v1, v2) = (video(&db, owner, "v1").await, video(&db, owner, "v2").await);
        let playlist = playlists.create_playlist(owner, body("Mix", "m")).await.unwrap();

        assert!(matches!(
            playlists.add_video(stranger, playlist.id, v1).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            playlists.add_video(owner, playlist.id, EntityId::new(9)).await,
            Err(AppError::NotFound(_))
        ));

        playlists.add_video(owner, playlist.id, v1).await.unwrap();
        playlists.add_video(owner, playlist.id, v2).await.unwrap();
        let after = playlists.remove_video(owner, playlist.id, v1).await.unwrap();
        assert_eq!(after.videos, vec![v2]);
        assert!(matches!(
            playlists.remove_video(owner, playlist.id, v1).await,
            Err(AppError::NotFound(_))
        ));

        let renamed = playlists
            .update_playlist(owner, playlist.id, PlaylistBody { name: Some("Mix 2".into()), description: None })
            .await
            .unwrap();
        assert_eq!(renamed.name, "Mix 2");
        assert_eq!(renamed.description, "m");

        assert!(matches!(
            playlists.delete_playlist(stranger, playlist.id).await,
            Err(AppError::Forbidden(_))
        ));
        playlists.delete_playlist(owner, playlist.id).await.unwrap();
        assert!(playlists.user_playlists(owner).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn deleted_videos_drop_out_of_populated_playlists() {
        let db = memory_db().await;
        let playlists = PlaylistService::new(db.clone());
        let owner = seed_user(&db, "owner").await;
        let (v1, v2) = (video(&db, owner, "v1").await, video(&db, owner, "v2").await);
        let playlist = playlists.create_playlist(owner, body("Mix", "m")).await.unwrap();
        playlists.add_video(owner, playlist.id, v2).await.unwrap();
        playlists.add_video(owner, playlist.id, v1).await.unwrap();
        db.delete_video(v2).await.unwrap();

        let listed = playlists.user_playlists(owner).await.unwrap();
        let ids: Vec<_> = listed[0].videos.iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![v1]);
    }
}
