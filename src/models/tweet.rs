use serde::Serialize;

use crate::core::{EntityId, Timestamp};
use crate::models::user::OwnerSummary;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tweet {
    #[serde(rename = "_id")]
    pub id: EntityId,
    pub content: String,
    pub owner: EntityId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulatedTweet {
    #[serde(rename = "_id")]
    pub id: EntityId,
    pub content: String,
    pub owner: Option<OwnerSummary>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
