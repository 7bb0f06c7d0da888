use serde::Serialize;

use crate::core::{EntityId, Timestamp};

/// Registered account. The password hash never leaves the server.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: EntityId,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar: Option<String>,
    pub cover_image: Option<String>,
    /// Most recent first, no duplicates.
    pub watch_history: Vec<EntityId>,
    #[serde(skip)]
    pub password_hash: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar: Option<String>,
    pub cover_image: Option<String>,
    pub password_hash: String,
}

/// The `owner` projection embedded in videos, tweets and subscriber lists.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OwnerSummary {
    #[serde(rename = "_id")]
    pub id: EntityId,
    pub username: String,
    pub avatar: Option<String>,
}

/// Public channel page for a user.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelProfile {
    #[serde(rename = "_id")]
    pub id: EntityId,
    pub username: String,
    pub full_name: String,
    pub avatar: Option<String>,
    pub cover_image: Option<String>,
    pub subscribers_count: i64,
    pub channels_subscribed_to_count: i64,
    pub is_subscribed: bool,
}

/// Move `video` to the front of `history`, dropping any earlier occurrence.
pub fn push_watch_history(history: &mut Vec<EntityId>, video: EntityId) {
    history.retain(|id| *id != video);
    history.insert(0, video);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[i64]) -> Vec<EntityId> {
        raw.iter().copied().map(EntityId::new).collect()
    }

    #[test]
    fn rewatch_moves_to_front() {
        let mut history = ids(&[3, 2, 1]);
        push_watch_history(&mut history, EntityId::new(1));
        assert_eq!(history, ids(&[1, 3, 2]));
    }

    #[test]
    fn new_video_is_prepended() {
        let mut history = Vec::new();
        push_watch_history(&mut history, EntityId::new(9));
        push_watch_history(&mut history, EntityId::new(8));
        assert_eq!(history, ids(&[8, 9]));
    }
}
