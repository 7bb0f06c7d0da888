use serde::Serialize;

use crate::core::{EntityId, Timestamp};
use crate::models::user::OwnerSummary;

/// Directed "follows" edge: `subscriber` follows `channel`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    #[serde(rename = "_id")]
    pub id: EntityId,
    pub subscriber: EntityId,
    pub channel: EntityId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Row of a channel's subscriber list.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscriber {
    #[serde(rename = "_id")]
    pub id: EntityId,
    pub subscriber: Option<OwnerSummary>,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSummary {
    #[serde(rename = "_id")]
    pub id: EntityId,
    pub username: String,
    pub full_name: String,
    pub avatar: Option<String>,
}

/// Row of a user's subscribed-channels list.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribedChannel {
    #[serde(rename = "_id")]
    pub id: EntityId,
    pub channel: Option<ChannelSummary>,
    pub created_at: Timestamp,
}
