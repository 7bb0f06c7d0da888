// Database Interface - document operations for every collection
// Handlers and services only ever see this trait; SqliteDatabase implements it.

use async_trait::async_trait;

use crate::core::EntityId;
use crate::error::AppResult;
use crate::models::{
    Comment, Like, LikeKind, LikedVideo, NewPlaylist, NewUser, NewVideo, Playlist, PopulatedTweet,
    PopulatedVideo, SubscribedChannel, Subscriber, Subscription, Tweet, User, Video, VideoQuery,
};

/// Document store used by the request handlers.
///
/// Every call is a single round trip (or a short transaction for the
/// read-modify-write helpers). Nothing here enforces ownership: callers
/// check it before mutating, except for the `*_owned` comment operations
/// whose filter includes the owner.
#[async_trait]
pub trait DatabaseInterface: Send + Sync {
    /// Cheap connectivity probe for health checks.
    async fn health_check(&self) -> AppResult<()>;

    // Users
    async fn create_user(&self, user: NewUser) -> AppResult<User>;
    async fn get_user(&self, id: EntityId) -> AppResult<Option<User>>;
    /// Lookup by username or email, case-insensitive.
    async fn find_user_by_login(&self, username_or_email: &str) -> AppResult<Option<User>>;
    async fn username_or_email_taken(&self, username: &str, email: &str) -> AppResult<bool>;
    /// Move `video` to the front of the user's watch history.
    /// Returns false when the user does not exist.
    async fn record_watch(&self, user: EntityId, video: EntityId) -> AppResult<bool>;

    // Videos
    async fn create_video(&self, video: NewVideo) -> AppResult<Video>;
    async fn get_video(&self, id: EntityId) -> AppResult<Option<Video>>;
    async fn get_populated_video(&self, id: EntityId) -> AppResult<Option<PopulatedVideo>>;
    /// Videos for the given ids in no particular order; missing ids are skipped.
    async fn get_videos_by_ids(&self, ids: &[EntityId]) -> AppResult<Vec<Video>>;
    async fn get_populated_videos_by_ids(&self, ids: &[EntityId]) -> AppResult<Vec<PopulatedVideo>>;
    /// One window of a filtered, sorted listing plus the filter's total count.
    async fn list_videos(&self, query: &VideoQuery) -> AppResult<(Vec<PopulatedVideo>, i64)>;
    /// Persist the mutable fields of `video` and bump `updated_at`.
    async fn save_video(&self, video: &Video) -> AppResult<Video>;
    /// Returns the new view count, or None when the video is gone.
    async fn increment_video_views(&self, id: EntityId) -> AppResult<Option<i64>>;
    async fn delete_video(&self, id: EntityId) -> AppResult<bool>;

    // Comments
    async fn create_comment(&self, video: EntityId, owner: EntityId, content: &str) -> AppResult<Comment>;
    /// Newest first.
    async fn list_comments(&self, video: EntityId, offset: i64, limit: i64) -> AppResult<(Vec<Comment>, i64)>;
    async fn update_comment_owned(&self, id: EntityId, owner: EntityId, content: &str) -> AppResult<Option<Comment>>;
    async fn delete_comment_owned(&self, id: EntityId, owner: EntityId) -> AppResult<Option<Comment>>;

    // Likes
    async fn find_like(&self, liked_by: EntityId, kind: LikeKind, target: EntityId) -> AppResult<Option<Like>>;
    /// Delete-if-present. Returns true when a like was removed.
    async fn delete_like(&self, liked_by: EntityId, kind: LikeKind, target: EntityId) -> AppResult<bool>;
    /// Insert-if-absent. Returns the stored like either way.
    async fn insert_like(&self, liked_by: EntityId, kind: LikeKind, target: EntityId) -> AppResult<Like>;
    /// Newest first.
    async fn list_liked_videos(&self, liked_by: EntityId) -> AppResult<Vec<LikedVideo>>;

    // Tweets
    async fn create_tweet(&self, owner: EntityId, content: &str) -> AppResult<Tweet>;
    async fn get_tweet(&self, id: EntityId) -> AppResult<Option<Tweet>>;
    /// Newest first.
    async fn list_tweets_by_owner(&self, owner: EntityId) -> AppResult<Vec<PopulatedTweet>>;
    async fn save_tweet(&self, tweet: &Tweet) -> AppResult<Tweet>;
    async fn delete_tweet(&self, id: EntityId) -> AppResult<bool>;

    // Playlists
    async fn create_playlist(&self, playlist: NewPlaylist) -> AppResult<Playlist>;
    async fn get_playlist(&self, id: EntityId) -> AppResult<Option<Playlist>>;
    async fn find_playlist_by_name(&self, owner: EntityId, name: &str) -> AppResult<Option<Playlist>>;
    /// Oldest first.
    async fn list_playlists_by_owner(&self, owner: EntityId) -> AppResult<Vec<Playlist>>;
    async fn save_playlist(&self, playlist: &Playlist) -> AppResult<Playlist>;
    async fn delete_playlist(&self, id: EntityId) -> AppResult<bool>;

    // Subscriptions
    async fn find_subscription(&self, subscriber: EntityId, channel: EntityId) -> AppResult<Option<Subscription>>;
    /// Delete-if-present. Returns true when a subscription was removed.
    async fn delete_subscription(&self, subscriber: EntityId, channel: EntityId) -> AppResult<bool>;
    /// Insert-if-absent. Returns the stored subscription either way.
    async fn insert_subscription(&self, subscriber: EntityId, channel: EntityId) -> AppResult<Subscription>;
    /// Newest first.
    async fn list_subscribers(&self, channel: EntityId) -> AppResult<Vec<Subscriber>>;
    /// Newest first.
    async fn list_subscribed_channels(&self, subscriber: EntityId) -> AppResult<Vec<SubscribedChannel>>;
    async fn count_subscribers(&self, channel: EntityId) -> AppResult<i64>;
    async fn count_subscriptions(&self, subscriber: EntityId) -> AppResult<i64>;
}
