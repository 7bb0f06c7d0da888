use std::sync::Arc;
use tracing::info;

use crate::core::EntityId;
use crate::domains::non_blank;
use crate::error::{AppError, AppResult};
use crate::infrastructure::DatabaseInterface;
use crate::models::{Comment, CommentPage, PageRequest};

#[derive(Clone)]
pub struct CommentService {
    database: Arc<dyn DatabaseInterface>,
}

impl CommentService {
    pub fn new(database: Arc<dyn DatabaseInterface>) -> Self {
        Self { database }
    }

    /// One page of a video's comments, newest first. `None` when the page is empty.
    pub async fn list_comments(&self, video: EntityId, page: PageRequest) -> AppResult<Option<CommentPage>> {
        let (comments, total) = self
            .database
            .list_comments(video, page.offset(), page.limit)
            .await?;
        if comments.is_empty() {
            return Ok(None);
        }
        Ok(Some(CommentPage::new(comments, total, page)))
    }

    pub async fn add_comment(&self, owner: EntityId, video: EntityId, content: Option<&str>) -> AppResult<Comment> {
        let content = require_content(content)?;
        let comment = self.database.create_comment(video, owner, content).await?;
        info!("User {} commented on video {}", owner, video);
        Ok(comment)
    }

    // Ownership is part of the lookup, so another user's comment reads as missing.
    pub async fn update_comment(&self, actor: EntityId, id: EntityId, content: Option<&str>) -> AppResult<Comment> {
        let content = require_content(content)?;
        self.database
            .update_comment_owned(id, actor, content)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(
                    "Comment not found or you do not have permission to update it".to_string(),
                )
            })
    }

    pub async fn delete_comment(&self, actor: EntityId, id: EntityId) -> AppResult<()> {
        self.database
            .delete_comment_owned(id, actor)
            .await?
            .map(|_| ())
            .ok_or_else(|| {
                AppError::NotFound(
                    "Comment not found or you do not have permission to delete it".to_string(),
                )
            })
    }
}

fn require_content(content: Option<&str>) -> AppResult<&str> {
    non_blank(content).ok_or_else(|| AppError::BadRequest("Comment content cannot be empty".to_string()))
}
