// Domain-Driven Organization - one module per resource
// Each domain owns a service (the operations) and its axum handlers.

pub mod comment;
pub mod like;
pub mod playlist;
pub mod subscription;
pub mod tweet;
pub mod user;
pub mod video;

/// Trimmed value, or None when missing or blank.
pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use crate::core::EntityId;
    use crate::infrastructure::{DatabaseInterface, SqliteDatabase};
    use crate::models::NewUser;

    pub async fn memory_db() -> Arc<dyn DatabaseInterface> {
        Arc::new(SqliteDatabase::new_in_memory().await.unwrap())
    }

    pub async fn seed_user(db: &Arc<dyn DatabaseInterface>, username: &str) -> EntityId {
        db.create_user(NewUser {
            username: username.to_string(),
            email: format!("{}@example.com", username),
            full_name: username.to_string(),
            avatar: None,
            cover_image: None,
            password_hash: "not-a-real-hash".to_string(),
        })
        .await
        .unwrap()
        .id
    }
}
