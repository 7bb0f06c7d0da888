use serde::Serialize;

use crate::core::{EntityId, Timestamp};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(rename = "_id")]
    pub id: EntityId,
    pub content: String,
    pub video: EntityId,
    pub owner: EntityId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
