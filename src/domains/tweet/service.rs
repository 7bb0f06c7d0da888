use std::sync::Arc;
use tracing::info;

use crate::core::EntityId;
use crate::domains::non_blank;
use crate::error::{AppError, AppResult};
use crate::infrastructure::DatabaseInterface;
use crate::models::{PopulatedTweet, Tweet};

#[derive(Clone)]
pub struct TweetService {
    database: Arc<dyn DatabaseInterface>,
}

impl TweetService {
    pub fn new(database: Arc<dyn DatabaseInterface>) -> Self {
        Self { database }
    }

    pub async fn create_tweet(&self, owner: EntityId, content: Option<&str>) -> AppResult<Tweet> {
        let content = require_content(content)?;
        self.require_user(owner).await?;
        let tweet = self.database.create_tweet(owner, content).await?;
        info!("User {} tweeted {}", owner, tweet.id);
        Ok(tweet)
    }

    /// A user's tweets, newest first.
    pub async fn user_tweets(&self, owner: EntityId) -> AppResult<Vec<PopulatedTweet>> {
        self.require_user(owner).await?;
        self.database.list_tweets_by_owner(owner).await
    }

    pub async fn update_tweet(&self, actor: EntityId, id: EntityId, content: Option<&str>) -> AppResult<Tweet> {
        let content = require_content(content)?;
        let mut tweet = self.owned_tweet(actor, id, "update").await?;
        tweet.content = content.to_string();
        self.database.save_tweet(&tweet).await
    }

    pub async fn delete_tweet(&self, actor: EntityId, id: EntityId) -> AppResult<()> {
        self.owned_tweet(actor, id, "delete").await?;
        self.database.delete_tweet(id).await?;
        Ok(())
    }

    async fn require_user(&self, id: EntityId) -> AppResult<()> {
        match self.database.get_user(id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::NotFound("User not found".to_string())),
        }
    }

    async fn owned_tweet(&self, actor: EntityId, id: EntityId, action: &str) -> AppResult<Tweet> {
        let tweet = self
            .database
            .get_tweet(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Tweet not found".to_string()))?;
        if tweet.owner != actor {
            return Err(AppError::Forbidden(format!(
                "You are not authorized to {} this tweet",
                action
            )));
        }
        Ok(tweet)
    }
}

fn require_content(content: Option<&str>) -> AppResult<&str> {
    non_blank(content).ok_or_else(|| AppError::BadRequest("Content cannot be empty".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::test_support::{memory_db, seed_user};

    #[tokio::test]
    async fn create_requires_existing_owner_and_content() {
        let db = memory_db().await;
        let tweets = TweetService::new(db.clone());
        let author = seed_user(&db, "author").await;

        assert!(matches!(
            tweets.create_tweet(author, Some("\n\t")).await,
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            tweets.create_tweet(EntityId::new(404), Some("hi")).await,
            Err(AppError::NotFound(_))
        ));

        tweets.create_tweet(author, Some("first")).await.unwrap();
        tweets.create_tweet(author, Some("second")).await.unwrap();
        let listed = tweets.user_tweets(author).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].content, "second");
        assert_eq!(listed[0].owner.as_ref().unwrap().username, "author");
    }

    #[tokio::test]
    async fn strangers_are_forbidden() {
        let db = memory_db().await;
        let tweets = TweetService::new(db.clone());
        let author = seed_user(&db, "author").await;
        let stranger = seed_user(&db, "stranger").await;
        let tweet = tweets.create_tweet(author, Some("mine")).await.unwrap();

        assert!(matches!(
            tweets.update_tweet(stranger, tweet.id, Some("yours")).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            tweets.delete_tweet(stranger, tweet.id).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            tweets.delete_tweet(author, EntityId::new(1)).await,
            Err(AppError::NotFound(_))
        ));

        let edited = tweets.update_tweet(author, tweet.id, Some("edited")).await.unwrap();
        assert_eq!(edited.content, "edited");
        tweets.delete_tweet(author, tweet.id).await.unwrap();
        assert!(tweets.user_tweets(author).await.unwrap().is_empty());
    }
}
