use std::sync::Arc;
use tracing::debug;

use crate::core::EntityId;
use crate::error::AppResult;
use crate::infrastructure::DatabaseInterface;
use crate::models::{Like, LikeKind, LikedVideo};

/// Outcome of flipping a like.
#[derive(Debug, Clone)]
pub enum LikeToggle {
    Added(Like),
    Removed,
}

#[derive(Clone)]
pub struct LikeService {
    database: Arc<dyn DatabaseInterface>,
}

impl LikeService {
    pub fn new(database: Arc<dyn DatabaseInterface>) -> Self {
        Self { database }
    }

    /// Delete-if-present, otherwise insert-if-absent. The target is not
    /// required to exist.
    pub async fn toggle_like(&self, actor: EntityId, kind: LikeKind, target: EntityId) -> AppResult<LikeToggle> {
        if self.database.delete_like(actor, kind, target).await? {
            debug!("User {} unliked {} {}", actor, kind.as_str(), target);
            return Ok(LikeToggle::Removed);
        }
        let like = self.database.insert_like(actor, kind, target).await?;
        debug!("User {} liked {} {}", actor, kind.as_str(), target);
        Ok(LikeToggle::Added(like))
    }

    pub async fn liked_videos(&self, actor: EntityId) -> AppResult<Vec<LikedVideo>> {
        self.database.list_liked_videos(actor).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::test_support::{memory_db, seed_user};
    use crate::models::NewVideo;

    #[tokio::test]
    async fn toggling_twice_restores_state() {
        let db = memory_db().await;
        let likes = LikeService::new(db.clone());
        let (actor, tweet) = (EntityId::new(3), EntityId::new(4));

        assert!(matches!(
            likes.toggle_like(actor, LikeKind::Tweet, tweet).await.unwrap(),
            LikeToggle::Added(_)
        ));
        assert!(db.find_like(actor, LikeKind::Tweet, tweet).await.unwrap().is_some());

        assert!(matches!(
            likes.toggle_like(actor, LikeKind::Tweet, tweet).await.unwrap(),
            LikeToggle::Removed
        ));
        assert!(db.find_like(actor, LikeKind::Tweet, tweet).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn kinds_are_independent() {
        let likes = LikeService::new(memory_db().await);
        let (actor, target) = (EntityId::new(1), EntityId::new(2));
        likes.toggle_like(actor, LikeKind::Video, target).await.unwrap();
        assert!(matches!(
            likes.toggle_like(actor, LikeKind::Comment, target).await.unwrap(),
            LikeToggle::Added(_)
        ));
    }

    #[tokio::test]
    async fn liked_videos_include_summary_or_null() {
        let db = memory_db().await;
        let likes = LikeService::new(db.clone());
        let fan = seed_user(&db, "fan").await;
        let video = db
            .create_video(NewVideo {
                video_file: "memory://v".to_string(),
                thumbnail: "memory://t".to_string(),
                owner: fan,
                title: "liked".to_string(),
                description: "d".to_string(),
                duration: 1.0,
            })
            .await
            .unwrap();

        likes.toggle_like(fan, LikeKind::Video, video.id).await.unwrap();
        likes.toggle_like(fan, LikeKind::Video, EntityId::new(999)).await.unwrap();
        likes.toggle_like(fan, LikeKind::Tweet, EntityId::new(5)).await.unwrap();

        let liked = likes.liked_videos(fan).await.unwrap();
        assert_eq!(liked.len(), 2);
        assert!(liked[0].video.is_none());
        assert_eq!(liked[1].video.as_ref().unwrap().title, "liked");
    }
}
