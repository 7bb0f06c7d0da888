use std::sync::Arc;

use crate::{
    config::Config,
    domains::{
        comment::CommentService, like::LikeService, playlist::PlaylistService,
        subscription::SubscriptionService, tweet::TweetService, user::UserService,
        video::VideoService,
    },
    error::AppResult,
    infrastructure::{
        DatabaseInterface, HasViewerAuth, LocalMediaStorage, MediaStorage, SqliteDatabase,
        TokenService,
    },
};

/// Everything a request handler can reach. Built once by the entry point.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub database: Arc<dyn DatabaseInterface>,
    pub tokens: TokenService,
    pub users: UserService,
    pub videos: VideoService,
    pub comments: CommentService,
    pub likes: LikeService,
    pub tweets: TweetService,
    pub playlists: PlaylistService,
    pub subscriptions: SubscriptionService,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        // Initialize database
        let database = SqliteDatabase::connect(&config.database, config.server.node_id).await?;
        let database: Arc<dyn DatabaseInterface> = Arc::new(database);

        let media: Arc<dyn MediaStorage> = Arc::new(LocalMediaStorage::new(&config.media));

        Ok(Self::from_parts(config, database, media)?)
    }

    /// Assemble state around an existing store and media backend.
    pub fn from_parts(
        config: Config,
        database: Arc<dyn DatabaseInterface>,
        media: Arc<dyn MediaStorage>,
    ) -> AppResult<Self> {
        let tokens = TokenService::new(&config.auth)?;

        Ok(Self {
            users: UserService::new(database.clone(), tokens.clone()),
            videos: VideoService::new(database.clone(), media),
            comments: CommentService::new(database.clone()),
            likes: LikeService::new(database.clone()),
            tweets: TweetService::new(database.clone()),
            playlists: PlaylistService::new(database.clone()),
            subscriptions: SubscriptionService::new(database.clone()),
            config: Arc::new(config),
            database,
            tokens,
        })
    }
}

impl HasViewerAuth for AppState {
    fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    fn database(&self) -> &Arc<dyn DatabaseInterface> {
        &self.database
    }
}
