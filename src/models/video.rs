use serde::Serialize;

use crate::core::{EntityId, Timestamp};
use crate::error::{AppError, AppResult};
use crate::models::user::OwnerSummary;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    #[serde(rename = "_id")]
    pub id: EntityId,
    pub video_file: String,
    pub thumbnail: String,
    pub owner: EntityId,
    pub title: String,
    pub description: String,
    pub duration: f64,
    pub views: i64,
    pub is_published: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct NewVideo {
    pub video_file: String,
    pub thumbnail: String,
    pub owner: EntityId,
    pub title: String,
    pub description: String,
    pub duration: f64,
}

/// A video with its owner reference replaced by the owner's summary.
/// `owner` is null when the owning account no longer exists.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulatedVideo {
    #[serde(rename = "_id")]
    pub id: EntityId,
    pub video_file: String,
    pub thumbnail: String,
    pub owner: Option<OwnerSummary>,
    pub title: String,
    pub description: String,
    pub duration: f64,
    pub views: i64,
    pub is_published: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl PopulatedVideo {
    pub fn new(video: Video, owner: Option<OwnerSummary>) -> Self {
        Self {
            id: video.id,
            video_file: video.video_file,
            thumbnail: video.thumbnail,
            owner,
            title: video.title,
            description: video.description,
            duration: video.duration,
            views: video.views,
            is_published: video.is_published,
            created_at: video.created_at,
            updated_at: video.updated_at,
        }
    }

    pub fn owner_id(&self) -> Option<EntityId> {
        self.owner.as_ref().map(|owner| owner.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoSortField {
    CreatedAt,
    Views,
    Likes,
}

impl VideoSortField {
    /// Only the allow-listed keys are accepted.
    pub fn parse(raw: &str) -> AppResult<Self> {
        match raw {
            "createdAt" => Ok(Self::CreatedAt),
            "views" => Ok(Self::Views),
            "likes" => Ok(Self::Likes),
            _ => Err(AppError::BadRequest("Invalid sortBy field".to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    /// `desc` sorts descending; anything else ascending.
    pub fn from_sort_type(raw: Option<&str>) -> Self {
        match raw {
            Some("desc") => Self::Descending,
            _ => Self::Ascending,
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoSort {
    pub field: VideoSortField,
    pub direction: SortDirection,
}

impl Default for VideoSort {
    fn default() -> Self {
        Self {
            field: VideoSortField::CreatedAt,
            direction: SortDirection::Descending,
        }
    }
}

/// Filter, sort and window for a video listing.
#[derive(Debug, Clone, Default)]
pub struct VideoQuery {
    pub owner: Option<EntityId>,
    /// Case-insensitive substring matched against title or description.
    pub search: Option<String>,
    pub sort: VideoSort,
    pub offset: i64,
    pub limit: i64,
}
