// Page windows and the paginated result shapes returned by list endpoints

use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::models::comment::Comment;
use crate::models::video::PopulatedVideo;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageRequest {
    /// Parse raw `page`/`limit` query values. Missing values take the
    /// defaults; anything that is not a positive integer is rejected.
    pub fn parse(page: Option<&str>, limit: Option<&str>) -> AppResult<Self> {
        let page = parse_positive(page, DEFAULT_PAGE)
            .ok_or_else(|| AppError::BadRequest("Invalid page number".to_string()))?;
        let limit = parse_positive(limit, DEFAULT_LIMIT)
            .ok_or_else(|| AppError::BadRequest("Invalid page size".to_string()))?;
        Ok(Self { page, limit })
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    pub fn total_pages(&self, total: i64) -> i64 {
        if total <= 0 {
            0
        } else {
            (total - 1) / self.limit + 1
        }
    }
}

fn parse_positive(raw: Option<&str>, default: i64) -> Option<i64> {
    match raw.map(str::trim) {
        None | Some("") => Some(default),
        Some(value) => value.parse::<i64>().ok().filter(|n| *n >= 1),
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoPage {
    pub videos: Vec<PopulatedVideo>,
    pub total_videos: i64,
    pub total_pages: i64,
    pub current_page: i64,
}

/// Comment listing with the full set of paging hints.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentPage {
    pub comments: Vec<Comment>,
    pub total_comments: i64,
    pub limit: i64,
    pub page: i64,
    pub total_pages: i64,
    pub paging_counter: i64,
    pub has_prev_page: bool,
    pub has_next_page: bool,
    pub prev_page: Option<i64>,
    pub next_page: Option<i64>,
}

impl CommentPage {
    pub fn new(comments: Vec<Comment>, total: i64, request: PageRequest) -> Self {
        let total_pages = request.total_pages(total).max(1);
        let has_prev_page = request.page > 1;
        let has_next_page = request.page < total_pages;
        Self {
            comments,
            total_comments: total,
            limit: request.limit,
            page: request.page,
            total_pages,
            paging_counter: request.offset() + 1,
            has_prev_page,
            has_next_page,
            prev_page: has_prev_page.then(|| request.page - 1),
            next_page: has_next_page.then(|| request.page + 1),
        }
    }
}
