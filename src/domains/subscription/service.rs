use std::sync::Arc;
use tracing::info;

use crate::core::EntityId;
use crate::error::{AppError, AppResult};
use crate::infrastructure::DatabaseInterface;
use crate::models::{SubscribedChannel, Subscriber, Subscription};

/// Outcome of flipping a subscription.
#[derive(Debug, Clone)]
pub enum SubscriptionToggle {
    Subscribed(Subscription),
    Unsubscribed,
}

#[derive(Clone)]
pub struct SubscriptionService {
    database: Arc<dyn DatabaseInterface>,
}

impl SubscriptionService {
    pub fn new(database: Arc<dyn DatabaseInterface>) -> Self {
        Self { database }
    }

    pub async fn toggle_subscription(&self, actor: EntityId, channel: EntityId) -> AppResult<SubscriptionToggle> {
        if self.database.get_user(channel).await?.is_none() {
            return Err(AppError::NotFound("Channel not found".to_string()));
        }
        if actor == channel {
            return Err(AppError::BadRequest(
                "You cannot subscribe to your own channel".to_string(),
            ));
        }

        if self.database.delete_subscription(actor, channel).await? {
            info!("User {} unsubscribed from {}", actor, channel);
            return Ok(SubscriptionToggle::Unsubscribed);
        }
        let subscription = self.database.insert_subscription(actor, channel).await?;
        info!("User {} subscribed to {}", actor, channel);
        Ok(SubscriptionToggle::Subscribed(subscription))
    }

    /// Only the channel owner may list its subscribers.
    pub async fn channel_subscribers(&self, actor: EntityId, channel: EntityId) -> AppResult<Vec<Subscriber>> {
        if self.database.get_user(channel).await?.is_none() {
            return Err(AppError::NotFound("Channel not found".to_string()));
        }
        if actor != channel {
            return Err(AppError::Forbidden(
                "You are not authorized to view subscribers of this channel".to_string(),
            ));
        }
        self.database.list_subscribers(channel).await
    }

    /// Only the subscriber may list the channels they follow.
    pub async fn subscribed_channels(&self, actor: EntityId, subscriber: EntityId) -> AppResult<Vec<SubscribedChannel>> {
        if self.database.get_user(subscriber).await?.is_none() {
            return Err(AppError::NotFound("Subscriber not found".to_string()));
        }
        if actor != subscriber {
            return Err(AppError::Forbidden(
                "You are not authorized to view subscribed channels of this user".to_string(),
            ));
        }
        self.database.list_subscribed_channels(subscriber).await
    }
}
