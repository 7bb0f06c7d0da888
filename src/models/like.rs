use serde::{Deserialize, Serialize};

use crate::core::{EntityId, Timestamp};
use crate::error::{AppError, AppResult};

/// What a like points at. Exactly one target per like record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LikeKind {
    Video,
    Comment,
    Tweet,
}

impl LikeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            LikeKind::Video => "video",
            LikeKind::Comment => "comment",
            LikeKind::Tweet => "tweet",
        }
    }

    pub fn parse(raw: &str) -> AppResult<Self> {
        match raw {
            "video" => Ok(LikeKind::Video),
            "comment" => Ok(LikeKind::Comment),
            "tweet" => Ok(LikeKind::Tweet),
            other => Err(AppError::DatabaseError(format!("Unknown like target kind: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Like {
    #[serde(rename = "_id")]
    pub id: EntityId,
    pub liked_by: EntityId,
    pub kind: LikeKind,
    pub target: EntityId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoSummary {
    #[serde(rename = "_id")]
    pub id: EntityId,
    pub title: String,
    pub description: String,
    pub thumbnail: String,
}

/// A video like with the video projected. `video` is null when the video
/// was deleted after being liked.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikedVideo {
    #[serde(rename = "_id")]
    pub id: EntityId,
    pub liked_by: EntityId,
    pub video: Option<VideoSummary>,
    pub created_at: Timestamp,
}
