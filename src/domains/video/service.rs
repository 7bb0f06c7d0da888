use axum::body::Bytes;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::core::{parse_id, EntityId};
use crate::domains::non_blank;
use crate::error::{AppError, AppResult};
use crate::infrastructure::{DatabaseInterface, MediaStorage};
use crate::models::{
    NewVideo, PageRequest, PopulatedVideo, SortDirection, Video, VideoPage, VideoQuery, VideoSort,
    VideoSortField,
};

/// Raw query string of the video listing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListVideosParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub query: Option<String>,
    pub sort_by: Option<String>,
    pub sort_type: Option<String>,
    pub user_id: Option<String>,
}

/// A file part of a multipart form.
#[derive(Debug, Clone)]
pub struct MediaUpload {
    pub file_name: String,
    pub bytes: Bytes,
}

#[derive(Debug, Clone, Default)]
pub struct PublishVideoInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub duration: Option<String>,
    pub video_file: Option<MediaUpload>,
    pub thumbnail: Option<MediaUpload>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateVideoInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail: Option<MediaUpload>,
}

#[derive(Clone)]
pub struct VideoService {
    database: Arc<dyn DatabaseInterface>,
    media: Arc<dyn MediaStorage>,
}

impl VideoService {
    pub fn new(database: Arc<dyn DatabaseInterface>, media: Arc<dyn MediaStorage>) -> Self {
        Self { database, media }
    }

    pub async fn list_videos(&self, params: ListVideosParams) -> AppResult<VideoPage> {
        let page = PageRequest::parse(params.page.as_deref(), params.limit.as_deref())?;
        let owner = match non_blank(params.user_id.as_deref()) {
            Some(raw) => Some(parse_id(raw, "user")?),
            None => None,
        };
        let sort = match non_blank(params.sort_by.as_deref()) {
            Some(field) => VideoSort {
                field: VideoSortField::parse(field)?,
                direction: SortDirection::from_sort_type(params.sort_type.as_deref()),
            },
            None => VideoSort::default(),
        };

        let query = VideoQuery {
            owner,
            search: non_blank(params.query.as_deref()).map(str::to_string),
            sort,
            offset: page.offset(),
            limit: page.limit,
        };
        let (videos, total) = self.database.list_videos(&query).await?;

        Ok(VideoPage {
            videos,
            total_videos: total,
            total_pages: page.total_pages(total),
            current_page: page.page,
        })
    }

    pub async fn publish_video(&self, owner: EntityId, input: PublishVideoInput) -> AppResult<Video> {
        let title = non_blank(input.title.as_deref())
            .ok_or_else(|| AppError::BadRequest("Title is required".to_string()))?
            .to_string();
        let description = non_blank(input.description.as_deref())
            .ok_or_else(|| AppError::BadRequest("Description is required".to_string()))?
            .to_string();
        let duration = parse_duration(input.duration.as_deref())?;

        if self.database.get_user(owner).await?.is_none() {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        let video_file = input
            .video_file
            .filter(|file| !file.bytes.is_empty())
            .ok_or_else(|| AppError::BadRequest("Video file is required".to_string()))?;
        let thumbnail = input
            .thumbnail
            .filter(|file| !file.bytes.is_empty())
            .ok_or_else(|| AppError::BadRequest("Thumbnail is required".to_string()))?;

        // No rollback: a stored video file stays behind if the thumbnail fails.
        let video_url = self.upload(&video_file, "Video upload failed").await?;
        let thumbnail_url = self.upload(&thumbnail, "Thumbnail upload failed").await?;

        let video = self
            .database
            .create_video(NewVideo {
                video_file: video_url,
                thumbnail: thumbnail_url,
                owner,
                title,
                description,
                duration,
            })
            .await?;

        info!("User {} published video {}", owner, video.id);
        Ok(video)
    }

    /// Load a video, then record the view.
    ///
    /// The view counter and the viewer's watch history are a separate write
    /// step; if it fails the read still succeeds with the stored count.
    pub async fn get_video(&self, id: EntityId, viewer: Option<EntityId>) -> AppResult<PopulatedVideo> {
        let mut video = self
            .database
            .get_populated_video(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Video not found".to_string()))?;

        match self.record_view(id, viewer).await {
            Ok(Some(views)) => video.views = views,
            Ok(None) => {}
            Err(e) => warn!("Failed to record view of video {}: {}", id, e),
        }
        Ok(video)
    }

    async fn record_view(&self, id: EntityId, viewer: Option<EntityId>) -> AppResult<Option<i64>> {
        let views = self.database.increment_video_views(id).await?;
        if let Some(viewer) = viewer {
            self.database.record_watch(viewer, id).await?;
        }
        Ok(views)
    }

    pub async fn update_video(&self, actor: EntityId, id: EntityId, input: UpdateVideoInput) -> AppResult<Video> {
        let mut video = self.owned_video(actor, id, "update").await?;

        if let Some(title) = non_blank(input.title.as_deref()) {
            video.title = title.to_string();
        }
        if let Some(description) = non_blank(input.description.as_deref()) {
            video.description = description.to_string();
        }
        if let Some(thumbnail) = input.thumbnail.filter(|file| !file.bytes.is_empty()) {
            video.thumbnail = self.upload(&thumbnail, "Thumbnail upload failed").await?;
        }

        self.database.save_video(&video).await
    }

    pub async fn delete_video(&self, actor: EntityId, id: EntityId) -> AppResult<()> {
        self.owned_video(actor, id, "delete").await?;
        self.database.delete_video(id).await?;
        info!("User {} deleted video {}", actor, id);
        Ok(())
    }

    pub async fn toggle_publish(&self, actor: EntityId, id: EntityId) -> AppResult<Video> {
        let mut video = self
            .owned_video(actor, id, "change the publish status of")
            .await?;
        video.is_published = !video.is_published;
        self.database.save_video(&video).await
    }

    async fn owned_video(&self, actor: EntityId, id: EntityId, action: &str) -> AppResult<Video> {
        let video = self
            .database
            .get_video(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Video not found".to_string()))?;
        if video.owner != actor {
            return Err(AppError::Forbidden(format!(
                "You are not authorized to {} this video",
                action
            )));
        }
        Ok(video)
    }

    async fn upload(&self, file: &MediaUpload, failure: &str) -> AppResult<String> {
        match self.media.upload(&file.bytes, &file.file_name).await {
            Ok(stored) if !stored.secure_url.is_empty() => Ok(stored.secure_url),
            Ok(_) => Err(AppError::UploadFailed(failure.to_string())),
            Err(e) => {
                warn!("{}: {}", failure, e);
                Err(AppError::UploadFailed(failure.to_string()))
            }
        }
    }
}

fn parse_duration(raw: Option<&str>) -> AppResult<f64> {
    match non_blank(raw) {
        None => Ok(0.0),
        Some(value) => value
            .parse::<f64>()
            .ok()
            .filter(|d| d.is_finite() && *d >= 0.0)
            .ok_or_else(|| AppError::BadRequest("Invalid duration".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::test_support::{memory_db, seed_user};
    use crate::infrastructure::MemoryMediaStorage;

    fn upload(name: &str) -> Option<MediaUpload> {
        Some(MediaUpload {
            file_name: name.to_string(),
            bytes: Bytes::from_static(b"payload"),
        })
    }

    fn publish_input(title: &str) -> PublishVideoInput {
        PublishVideoInput {
            title: Some(title.to_string()),
            description: Some("about".to_string()),
            duration: Some("42.5".to_string()),
            video_file: upload("clip.mp4"),
            thumbnail: upload("thumb.png"),
        }
    }

    async fn service_with(media: Arc<dyn MediaStorage>) -> (VideoService, Arc<dyn DatabaseInterface>) {
        let db = memory_db().await;
        (VideoService::new(db.clone(), media), db)
    }

    #[tokio::test]
    async fn publish_validates_in_order() {
        let (videos, db) = service_with(Arc::new(MemoryMediaStorage::new())).await;
        let owner = seed_user(&db, "owner").await;

        let mut input = publish_input("t");
        input.title = Some(" ".to_string());
        input.video_file = None;
        match videos.publish_video(owner, input).await {
            Err(AppError::BadRequest(msg)) => assert_eq!(msg, "Title is required"),
            other => panic!("unexpected: {:?}", other.map(|v| v.id)),
        }

        let mut input = publish_input("t");
        input.thumbnail = None;
        match videos.publish_video(owner, input).await {
            Err(AppError::BadRequest(msg)) => assert_eq!(msg, "Thumbnail is required"),
            other => panic!("unexpected: {:?}", other.map(|v| v.id)),
        }

        let ghost = videos.publish_video(EntityId::new(77), publish_input("t")).await;
        assert!(matches!(ghost, Err(AppError::NotFound(_))));

        let video = videos.publish_video(owner, publish_input("Intro")).await.unwrap();
        assert_eq!(video.views, 0);
        assert!(video.is_published);
        assert_eq!(video.duration, 42.5);
    }

    #[tokio::test]
    async fn thumbnail_upload_failure_fails_publish() {
        let media = Arc::new(MemoryMediaStorage::failing_after(1));
        let (videos, db) = service_with(media.clone()).await;
        let owner = seed_user(&db, "owner").await;

        match videos.publish_video(owner, publish_input("t")).await {
            Err(AppError::UploadFailed(msg)) => assert_eq!(msg, "Thumbnail upload failed"),
            other => panic!("unexpected: {:?}", other.map(|v| v.id)),
        }
        assert_eq!(media.uploaded_count(), 1);
        let (_, total) = db.list_videos(&VideoQuery { limit: 10, ..VideoQuery::default() }).await.unwrap();
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn get_video_counts_views_and_history() {
        let (videos, db) = service_with(Arc::new(MemoryMediaStorage::new())).await;
        let owner = seed_user(&db, "owner").await;
        let viewer = seed_user(&db, "viewer").await;
        let video = videos.publish_video(owner, publish_input("Intro")).await.unwrap();

        let first = videos.get_video(video.id, None).await.unwrap();
        assert_eq!(first.views, 1);
        assert_eq!(first.owner.as_ref().unwrap().username, "owner");

        let second = videos.get_video(video.id, Some(viewer)).await.unwrap();
        assert_eq!(second.views, 2);
        let history = db.get_user(viewer).await.unwrap().unwrap().watch_history;
        assert_eq!(history, vec![video.id]);

        assert!(matches!(
            videos.get_video(EntityId::new(12345), None).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn owner_checks_and_publish_toggle() {
        let (videos, db) = service_with(Arc::new(MemoryMediaStorage::new())).await;
        let owner = seed_user(&db, "owner").await;
        let stranger = seed_user(&db, "stranger").await;
        let video = videos.publish_video(owner, publish_input("Intro")).await.unwrap();

        let update = UpdateVideoInput {
            title: Some("Renamed".to_string()),
            description: Some("  ".to_string()),
            thumbnail: None,
        };
        assert!(matches!(
            videos.update_video(stranger, video.id, update.clone()).await,
            Err(AppError::Forbidden(_))
        ));
        let updated = videos.update_video(owner, video.id, update).await.unwrap();
        assert_eq!(updated.title, "Renamed");
        assert_eq!(updated.description, "about");

        let hidden = videos.toggle_publish(owner, video.id).await.unwrap();
        assert!(!hidden.is_published);
        let shown = videos.toggle_publish(owner, video.id).await.unwrap();
        assert!(shown.is_published);

        assert!(matches!(
            videos.delete_video(stranger, video.id).await,
            Err(AppError::Forbidden(_))
        ));
        videos.delete_video(owner, video.id).await.unwrap();
        assert!(db.get_video(video.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_rejects_bad_params() {
        let (videos, _) = service_with(Arc::new(MemoryMediaStorage::new())).await;
        let bad_sort = ListVideosParams {
            sort_by: Some("title".to_string()),
            ..ListVideosParams::default()
        };
        assert!(matches!(videos.list_videos(bad_sort).await, Err(AppError::BadRequest(_))));

        let bad_user = ListVideosParams {
            user_id: Some("abc".to_string()),
            ..ListVideosParams::default()
        };
        match videos.list_videos(bad_user).await {
            Err(AppError::BadRequest(msg)) => assert_eq!(msg, "Invalid user ID"),
            other => panic!("unexpected: {:?}", other.map(|p| p.total_videos)),
        }
    }

    #[tokio::test]
    async fn list_with_maximal_limit_returns_one_page() {
        let (videos, db) = service_with(Arc::new(MemoryMediaStorage::new())).await;
        let owner = seed_user(&db, "owner").await;
        videos.publish_video(owner, publish_input("first")).await.unwrap();
        videos.publish_video(owner, publish_input("second")).await.unwrap();

        let page = videos
            .list_videos(ListVideosParams {
                limit: Some(i64::MAX.to_string()),
                ..ListVideosParams::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total_videos, 2);
        assert_eq!(page.videos.len(), 2);
        assert_eq!(page.total_pages, 1);
    }

    #[test]
    fn duration_parsing() {
        assert_eq!(parse_duration(None).unwrap(), 0.0);
        assert_eq!(parse_duration(Some("3.5")).unwrap(), 3.5);
        assert!(parse_duration(Some("-1")).is_err());
        assert!(parse_duration(Some("long")).is_err());
    }
}
