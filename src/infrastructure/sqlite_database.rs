use async_trait::async_trait;
use sqlx::{
    sqlite::{Sqlite, SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow},
    QueryBuilder, Row,
};
use std::path::Path;
use std::str::FromStr;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::core::{EntityId, Timestamp};
use crate::error::{AppError, AppResult};
use crate::infrastructure::database::DatabaseInterface;
use crate::infrastructure::id_generator::IdGenerator;
use crate::models::{
    push_watch_history, ChannelSummary, Comment, Like, LikeKind, LikedVideo, NewPlaylist, NewUser,
    NewVideo, OwnerSummary, Playlist, PopulatedTweet, PopulatedVideo, SubscribedChannel,
    Subscriber, Subscription, Tweet, User, Video, VideoQuery, VideoSortField, VideoSummary,
};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY,
        username TEXT NOT NULL UNIQUE,
        email TEXT NOT NULL UNIQUE,
        full_name TEXT NOT NULL,
        avatar TEXT,
        cover_image TEXT,
        password_hash TEXT NOT NULL,
        watch_history TEXT NOT NULL DEFAULT '[]',
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS videos (
        id INTEGER PRIMARY KEY,
        video_file TEXT NOT NULL,
        thumbnail TEXT NOT NULL,
        owner_id INTEGER NOT NULL,
        title TEXT NOT NULL,
        description TEXT NOT NULL,
        title_search TEXT NOT NULL DEFAULT '',
        description_search TEXT NOT NULL DEFAULT '',
        duration REAL NOT NULL DEFAULT 0,
        views INTEGER NOT NULL DEFAULT 0,
        is_published INTEGER NOT NULL DEFAULT 1,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS comments (
        id INTEGER PRIMARY KEY,
        content TEXT NOT NULL,
        video_id INTEGER NOT NULL,
        owner_id INTEGER NOT NULL,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL
    )
    "#,
    // One row per (actor, target): the toggle relies on this constraint.
    r#"
    CREATE TABLE IF NOT EXISTS likes (
        id INTEGER PRIMARY KEY,
        liked_by INTEGER NOT NULL,
        target_kind TEXT NOT NULL,
        target_id INTEGER NOT NULL,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL,
        UNIQUE(liked_by, target_kind, target_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS tweets (
        id INTEGER PRIMARY KEY,
        content TEXT NOT NULL,
        owner_id INTEGER NOT NULL,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS playlists (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        description TEXT NOT NULL,
        videos TEXT NOT NULL DEFAULT '[]',
        owner_id INTEGER NOT NULL,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS subscriptions (
        id INTEGER PRIMARY KEY,
        subscriber_id INTEGER NOT NULL,
        channel_id INTEGER NOT NULL,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL,
        UNIQUE(subscriber_id, channel_id)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_videos_owner ON videos(owner_id)",
    "CREATE INDEX IF NOT EXISTS idx_videos_created ON videos(created_at)",
    "CREATE INDEX IF NOT EXISTS idx_comments_video ON comments(video_id, created_at DESC)",
    "CREATE INDEX IF NOT EXISTS idx_likes_target ON likes(target_kind, target_id)",
    "CREATE INDEX IF NOT EXISTS idx_tweets_owner ON tweets(owner_id, created_at DESC)",
    "CREATE INDEX IF NOT EXISTS idx_playlists_owner ON playlists(owner_id, name)",
    "CREATE INDEX IF NOT EXISTS idx_subscriptions_channel ON subscriptions(channel_id)",
];

const USER_COLUMNS: &str = "id, username, email, full_name, avatar, cover_image, password_hash, \
     watch_history, created_at, updated_at";
const VIDEO_COLUMNS: &str = "v.id, v.video_file, v.thumbnail, v.owner_id, v.title, v.description, \
     v.duration, v.views, v.is_published, v.created_at, v.updated_at";
const VIDEO_RETURNING: &str = "id, video_file, thumbnail, owner_id, title, description, duration, \
     views, is_published, created_at, updated_at";
const VIDEO_OWNER_JOIN: &str =
    "u.id AS owner_user_id, u.username AS owner_username, u.avatar AS owner_avatar \
     FROM videos v LEFT JOIN users u ON u.id = v.owner_id";
const COMMENT_COLUMNS: &str = "id, content, video_id, owner_id, created_at, updated_at";
const LIKE_COLUMNS: &str = "id, liked_by, target_kind, target_id, created_at, updated_at";
const TWEET_COLUMNS: &str = "id, content, owner_id, created_at, updated_at";
const PLAYLIST_COLUMNS: &str = "id, name, description, videos, owner_id, created_at, updated_at";
const SUBSCRIPTION_COLUMNS: &str = "id, subscriber_id, channel_id, created_at, updated_at";

/// SQLite implementation of the document store
pub struct SqliteDatabase {
    pool: SqlitePool,
    ids: IdGenerator,
}

impl SqliteDatabase {
    pub async fn connect(config: &DatabaseConfig, node_id: u16) -> AppResult<Self> {
        ensure_parent_dir(&config.url)?;
        let options = SqliteConnectOptions::from_str(&config.url)
            .map_err(|e| {
                AppError::ConfigurationError(format!("Invalid database url {}: {}", config.url, e))
            })?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to connect to {}: {}", config.url, e)))?;

        let db = Self {
            pool,
            ids: IdGenerator::new(node_id)?,
        };
        db.initialize().await?;
        info!("Connected to document store at {}", config.url);
        Ok(db)
    }

    /// Private in-memory database for tests.
    pub async fn new_in_memory() -> AppResult<Self> {
        // Keep exactly one connection alive: each new connection to
        // sqlite::memory: would see a fresh, empty database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to connect to in-memory SQLite: {}", e))
            })?;

        let db = Self {
            pool,
            ids: IdGenerator::new(0)?,
        };
        db.initialize().await?;
        Ok(db)
    }

    /// Create collections and indexes if they do not exist yet.
    pub async fn initialize(&self) -> AppResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| AppError::DatabaseError(format!("Failed to apply schema: {}", e)))?;
        }
        Ok(())
    }

    async fn fetch_like(&self, liked_by: EntityId, kind: LikeKind, target: EntityId) -> AppResult<Option<Like>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM likes WHERE liked_by = ? AND target_kind = ? AND target_id = ?",
            LIKE_COLUMNS
        ))
        .bind(liked_by)
        .bind(kind.as_str())
        .bind(target)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(like_from_row).transpose()
    }

    async fn fetch_subscription(&self, subscriber: EntityId, channel: EntityId) -> AppResult<Option<Subscription>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM subscriptions WHERE subscriber_id = ? AND channel_id = ?",
            SUBSCRIPTION_COLUMNS
        ))
        .bind(subscriber)
        .bind(channel)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(subscription_from_row).transpose()
    }
}

#[async_trait]
impl DatabaseInterface for SqliteDatabase {
    async fn health_check(&self) -> AppResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Database health check failed: {}", e)))?;
        Ok(())
    }

    // ---- users ----

    async fn create_user(&self, user: NewUser) -> AppResult<User> {
        let id = self.ids.next_id();
        let now = Timestamp::now();
        sqlx::query(
            "INSERT INTO users (id, username, email, full_name, avatar, cover_image, password_hash, \
             watch_history, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, '[]', ?, ?)",
        )
        .bind(id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.full_name)
        .bind(&user.avatar)
        .bind(&user.cover_image)
        .bind(&user.password_hash)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                AppError::Conflict("User with email or username already exists".to_string())
            }
            other => AppError::from(other),
        })?;

        Ok(User {
            id,
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            avatar: user.avatar,
            cover_image: user.cover_image,
            watch_history: Vec::new(),
            password_hash: user.password_hash,
            created_at: now,
            updated_at: now,
        })
    }

    async fn get_user(&self, id: EntityId) -> AppResult<Option<User>> {
        let row = sqlx::query(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_user_by_login(&self, username_or_email: &str) -> AppResult<Option<User>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM users WHERE lower(username) = lower(?1) OR lower(email) = lower(?1)",
            USER_COLUMNS
        ))
        .bind(username_or_email)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn username_or_email_taken(&self, username: &str, email: &str) -> AppResult<bool> {
        let row = sqlx::query(
            "SELECT 1 FROM users WHERE lower(username) = lower(?) OR lower(email) = lower(?) LIMIT 1",
        )
        .bind(username)
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.is_some())
    }

    async fn record_watch(&self, user: EntityId, video: EntityId) -> AppResult<bool> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("SELECT watch_history FROM users WHERE id = ?")
            .bind(user)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(row) = row else {
            return Ok(false);
        };

        let mut history = decode_ids(&row.try_get::<String, _>("watch_history")?)?;
        push_watch_history(&mut history, video);

        sqlx::query("UPDATE users SET watch_history = ?, updated_at = ? WHERE id = ?")
            .bind(encode_ids(&history)?)
            .bind(Timestamp::now())
            .bind(user)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }

    // ---- videos ----

    async fn create_video(&self, video: NewVideo) -> AppResult<Video> {
        let id = self.ids.next_id();
        let now = Timestamp::now();
        sqlx::query(
            "INSERT INTO videos (id, video_file, thumbnail, owner_id, title, description, \
             title_search, description_search, duration, views, is_published, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 0, 1, ?, ?)",
        )
        .bind(id)
        .bind(&video.video_file)
        .bind(&video.thumbnail)
        .bind(video.owner)
        .bind(&video.title)
        .bind(&video.description)
        .bind(video.title.to_lowercase())
        .bind(video.description.to_lowercase())
        .bind(video.duration)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Video {
            id,
            video_file: video.video_file,
            thumbnail: video.thumbnail,
            owner: video.owner,
            title: video.title,
            description: video.description,
            duration: video.duration,
            views: 0,
            is_published: true,
            created_at: now,
            updated_at: now,
        })
    }

    async fn get_video(&self, id: EntityId) -> AppResult<Option<Video>> {
        let row = sqlx::query(&format!("SELECT {} FROM videos v WHERE v.id = ?", VIDEO_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(video_from_row).transpose()
    }

    async fn get_populated_video(&self, id: EntityId) -> AppResult<Option<PopulatedVideo>> {
        let row = sqlx::query(&format!(
            "SELECT {}, {} WHERE v.id = ?",
            VIDEO_COLUMNS, VIDEO_OWNER_JOIN
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(populated_video_from_row).transpose()
    }

    async fn get_videos_by_ids(&self, ids: &[EntityId]) -> AppResult<Vec<Video>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut qb = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {} FROM videos v WHERE v.id IN (",
            VIDEO_COLUMNS
        ));
        let mut separated = qb.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        let rows = qb.build().fetch_all(&self.pool).await?;
        rows.iter().map(video_from_row).collect()
    }

    async fn get_populated_videos_by_ids(&self, ids: &[EntityId]) -> AppResult<Vec<PopulatedVideo>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut qb = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {}, {} WHERE v.id IN (",
            VIDEO_COLUMNS, VIDEO_OWNER_JOIN
        ));
        let mut separated = qb.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        let rows = qb.build().fetch_all(&self.pool).await?;
        rows.iter().map(populated_video_from_row).collect()
    }

    async fn list_videos(&self, query: &VideoQuery) -> AppResult<(Vec<PopulatedVideo>, i64)> {
        let mut qb = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {}, {} WHERE 1 = 1",
            VIDEO_COLUMNS, VIDEO_OWNER_JOIN
        ));
        push_video_filter(&mut qb, query);

        let direction = query.sort.direction.as_sql();
        let sort_key = match query.sort.field {
            VideoSortField::CreatedAt => "v.created_at",
            VideoSortField::Views => "v.views",
            VideoSortField::Likes => {
                "(SELECT COUNT(*) FROM likes l WHERE l.target_kind = 'video' AND l.target_id = v.id)"
            }
        };
        qb.push(format!(" ORDER BY {} {}, v.id {}", sort_key, direction, direction));
        qb.push(" LIMIT ");
        qb.push_bind(query.limit);
        qb.push(" OFFSET ");
        qb.push_bind(query.offset);

        let rows = qb.build().fetch_all(&self.pool).await?;
        let videos = rows
            .iter()
            .map(populated_video_from_row)
            .collect::<AppResult<Vec<_>>>()?;

        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM videos v WHERE 1 = 1");
        push_video_filter(&mut count, query);
        let total: i64 = count.build().fetch_one(&self.pool).await?.try_get(0)?;

        Ok((videos, total))
    }

    async fn save_video(&self, video: &Video) -> AppResult<Video> {
        let row = sqlx::query(&format!(
            "UPDATE videos SET title = ?, description = ?, title_search = ?, description_search = ?, \
             thumbnail = ?, video_file = ?, duration = ?, is_published = ?, updated_at = ? \
             WHERE id = ? RETURNING {}",
            VIDEO_RETURNING
        ))
        .bind(&video.title)
        .bind(&video.description)
        .bind(video.title.to_lowercase())
        .bind(video.description.to_lowercase())
        .bind(&video.thumbnail)
        .bind(&video.video_file)
        .bind(video.duration)
        .bind(video.is_published)
        .bind(Timestamp::now())
        .bind(video.id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => video_from_row(&row),
            None => Err(AppError::NotFound("Video not found".to_string())),
        }
    }

    async fn increment_video_views(&self, id: EntityId) -> AppResult<Option<i64>> {
        let row = sqlx::query("UPDATE videos SET views = views + 1 WHERE id = ? RETURNING views")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|row| row.try_get::<i64, _>("views"))
            .transpose()
            .map_err(AppError::from)
    }

    async fn delete_video(&self, id: EntityId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM videos WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ---- comments ----

    async fn create_comment(&self, video: EntityId, owner: EntityId, content: &str) -> AppResult<Comment> {
        let id = self.ids.next_id();
        let now = Timestamp::now();
        sqlx::query(
            "INSERT INTO comments (id, content, video_id, owner_id, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(content)
        .bind(video)
        .bind(owner)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Comment {
            id,
            content: content.to_string(),
            video,
            owner,
            created_at: now,
            updated_at: now,
        })
    }

    async fn list_comments(&self, video: EntityId, offset: i64, limit: i64) -> AppResult<(Vec<Comment>, i64)> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM comments WHERE video_id = ? \
             ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
            COMMENT_COLUMNS
        ))
        .bind(video)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        let comments = rows.iter().map(comment_from_row).collect::<AppResult<Vec<_>>>()?;

        let total: i64 = sqlx::query("SELECT COUNT(*) FROM comments WHERE video_id = ?")
            .bind(video)
            .fetch_one(&self.pool)
            .await?
            .try_get(0)?;

        Ok((comments, total))
    }

    async fn update_comment_owned(&self, id: EntityId, owner: EntityId, content: &str) -> AppResult<Option<Comment>> {
        let row = sqlx::query(&format!(
            "UPDATE comments SET content = ?, updated_at = ? WHERE id = ? AND owner_id = ? RETURNING {}",
            COMMENT_COLUMNS
        ))
        .bind(content)
        .bind(Timestamp::now())
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(comment_from_row).transpose()
    }

    async fn delete_comment_owned(&self, id: EntityId, owner: EntityId) -> AppResult<Option<Comment>> {
        let row = sqlx::query(&format!(
            "DELETE FROM comments WHERE id = ? AND owner_id = ? RETURNING {}",
            COMMENT_COLUMNS
        ))
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(comment_from_row).transpose()
    }

    // ---- likes ----

    async fn find_like(&self, liked_by: EntityId, kind: LikeKind, target: EntityId) -> AppResult<Option<Like>> {
        self.fetch_like(liked_by, kind, target).await
    }

    async fn delete_like(&self, liked_by: EntityId, kind: LikeKind, target: EntityId) -> AppResult<bool> {
        let result = sqlx::query(
            "DELETE FROM likes WHERE liked_by = ? AND target_kind = ? AND target_id = ?",
        )
        .bind(liked_by)
        .bind(kind.as_str())
        .bind(target)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_like(&self, liked_by: EntityId, kind: LikeKind, target: EntityId) -> AppResult<Like> {
        let now = Timestamp::now();
        sqlx::query(
            "INSERT INTO likes (id, liked_by, target_kind, target_id, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?) \
             ON CONFLICT(liked_by, target_kind, target_id) DO NOTHING",
        )
        .bind(self.ids.next_id())
        .bind(liked_by)
        .bind(kind.as_str())
        .bind(target)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.fetch_like(liked_by, kind, target)
            .await?
            .ok_or_else(|| AppError::Internal("Like vanished right after insert".to_string()))
    }

    async fn list_liked_videos(&self, liked_by: EntityId) -> AppResult<Vec<LikedVideo>> {
        let rows = sqlx::query(
            "SELECT l.id, l.liked_by, l.created_at, v.id AS video_id, v.title, v.description, v.thumbnail \
             FROM likes l LEFT JOIN videos v ON v.id = l.target_id \
             WHERE l.liked_by = ? AND l.target_kind = 'video' \
             ORDER BY l.created_at DESC, l.id DESC",
        )
        .bind(liked_by)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let video_id: Option<EntityId> = row.try_get("video_id")?;
                let video = match video_id {
                    Some(id) => Some(VideoSummary {
                        id,
                        title: row.try_get("title")?,
                        description: row.try_get("description")?,
                        thumbnail: row.try_get("thumbnail")?,
                    }),
                    None => None,
                };
                Ok(LikedVideo {
                    id: row.try_get("id")?,
                    liked_by: row.try_get("liked_by")?,
                    video,
                    created_at: row.try_get("created_at")?,
                })
            })
            .collect()
    }

    // ---- tweets ----

    async fn create_tweet(&self, owner: EntityId, content: &str) -> AppResult<Tweet> {
        let id = self.ids.next_id();
        let now = Timestamp::now();
        sqlx::query(
            "INSERT INTO tweets (id, content, owner_id, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(content)
        .bind(owner)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Tweet {
            id,
            content: content.to_string(),
            owner,
            created_at: now,
            updated_at: now,
        })
    }

    async fn get_tweet(&self, id: EntityId) -> AppResult<Option<Tweet>> {
        let row = sqlx::query(&format!("SELECT {} FROM tweets WHERE id = ?", TWEET_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(tweet_from_row).transpose()
    }

    async fn list_tweets_by_owner(&self, owner: EntityId) -> AppResult<Vec<PopulatedTweet>> {
        let rows = sqlx::query(
            "SELECT t.id, t.content, t.created_at, t.updated_at, \
             u.id AS owner_user_id, u.username AS owner_username, u.avatar AS owner_avatar \
             FROM tweets t LEFT JOIN users u ON u.id = t.owner_id \
             WHERE t.owner_id = ? ORDER BY t.created_at DESC, t.id DESC",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(PopulatedTweet {
                    id: row.try_get("id")?,
                    content: row.try_get("content")?,
                    owner: owner_from_row(row, "owner_user_id", "owner_username", "owner_avatar")?,
                    created_at: row.try_get("created_at")?,
                    updated_at: row.try_get("updated_at")?,
                })
            })
            .collect()
    }

    async fn save_tweet(&self, tweet: &Tweet) -> AppResult<Tweet> {
        let row = sqlx::query(&format!(
            "UPDATE tweets SET content = ?, updated_at = ? WHERE id = ? RETURNING {}",
            TWEET_COLUMNS
        ))
        .bind(&tweet.content)
        .bind(Timestamp::now())
        .bind(tweet.id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => tweet_from_row(&row),
            None => Err(AppError::NotFound("Tweet not found".to_string())),
        }
    }

    async fn delete_tweet(&self, id: EntityId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM tweets WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ---- playlists ----

    async fn create_playlist(&self, playlist: NewPlaylist) -> AppResult<Playlist> {
        let id = self.ids.next_id();
        let now = Timestamp::now();
        sqlx::query(
            "INSERT INTO playlists (id, name, description, videos, owner_id, created_at, updated_at) \
             VALUES (?, ?, ?, '[]', ?, ?, ?)",
        )
        .bind(id)
        .bind(&playlist.name)
        .bind(&playlist.description)
        .bind(playlist.owner)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Playlist {
            id,
            name: playlist.name,
            description: playlist.description,
            videos: Vec::new(),
            owner: playlist.owner,
            created_at: now,
            updated_at: now,
        })
    }

    async fn get_playlist(&self, id: EntityId) -> AppResult<Option<Playlist>> {
        let row = sqlx::query(&format!("SELECT {} FROM playlists WHERE id = ?", PLAYLIST_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(playlist_from_row).transpose()
    }

    async fn find_playlist_by_name(&self, owner: EntityId, name: &str) -> AppResult<Option<Playlist>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM playlists WHERE owner_id = ? AND name = ? LIMIT 1",
            PLAYLIST_COLUMNS
        ))
        .bind(owner)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(playlist_from_row).transpose()
    }

    async fn list_playlists_by_owner(&self, owner: EntityId) -> AppResult<Vec<Playlist>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM playlists WHERE owner_id = ? ORDER BY created_at ASC, id ASC",
            PLAYLIST_COLUMNS
        ))
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(playlist_from_row).collect()
    }

    async fn save_playlist(&self, playlist: &Playlist) -> AppResult<Playlist> {
        let row = sqlx::query(&format!(
            "UPDATE playlists SET name = ?, description = ?, videos = ?, updated_at = ? \
             WHERE id = ? RETURNING {}",
            PLAYLIST_COLUMNS
        ))
        .bind(&playlist.name)
        .bind(&playlist.description)
        .bind(encode_ids(&playlist.videos)?)
        .bind(Timestamp::now())
        .bind(playlist.id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => playlist_from_row(&row),
            None => Err(AppError::NotFound("Playlist not found".to_string())),
        }
    }

    async fn delete_playlist(&self, id: EntityId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM playlists WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ---- subscriptions ----

    async fn find_subscription(&self, subscriber: EntityId, channel: EntityId) -> AppResult<Option<Subscription>> {
        self.fetch_subscription(subscriber, channel).await
    }

    async fn delete_subscription(&self, subscriber: EntityId, channel: EntityId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM subscriptions WHERE subscriber_id = ? AND channel_id = ?")
            .bind(subscriber)
            .bind(channel)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_subscription(&self, subscriber: EntityId, channel: EntityId) -> AppResult<Subscription> {
        let now = Timestamp::now();
        sqlx::query(
            "INSERT INTO subscriptions (id, subscriber_id, channel_id, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?) ON CONFLICT(subscriber_id, channel_id) DO NOTHING",
        )
        .bind(self.ids.next_id())
        .bind(subscriber)
        .bind(channel)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.fetch_subscription(subscriber, channel)
            .await?
            .ok_or_else(|| AppError::Internal("Subscription vanished right after insert".to_string()))
    }

    async fn list_subscribers(&self, channel: EntityId) -> AppResult<Vec<Subscriber>> {
        let rows = sqlx::query(
            "SELECT s.id, s.created_at, \
             u.id AS owner_user_id, u.username AS owner_username, u.avatar AS owner_avatar \
             FROM subscriptions s LEFT JOIN users u ON u.id = s.subscriber_id \
             WHERE s.channel_id = ? ORDER BY s.created_at DESC, s.id DESC",
        )
        .bind(channel)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(Subscriber {
                    id: row.try_get("id")?,
                    subscriber: owner_from_row(row, "owner_user_id", "owner_username", "owner_avatar")?,
                    created_at: row.try_get("created_at")?,
                })
            })
            .collect()
    }

    async fn list_subscribed_channels(&self, subscriber: EntityId) -> AppResult<Vec<SubscribedChannel>> {
        let rows = sqlx::query(
            "SELECT s.id, s.created_at, \
             u.id AS channel_user_id, u.username, u.full_name, u.avatar \
             FROM subscriptions s LEFT JOIN users u ON u.id = s.channel_id \
             WHERE s.subscriber_id = ? ORDER BY s.created_at DESC, s.id DESC",
        )
        .bind(subscriber)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let channel_id: Option<EntityId> = row.try_get("channel_user_id")?;
                let channel = match channel_id {
                    Some(id) => Some(ChannelSummary {
                        id,
                        username: row.try_get("username")?,
                        full_name: row.try_get("full_name")?,
                        avatar: row.try_get("avatar")?,
                    }),
                    None => None,
                };
                Ok(SubscribedChannel {
                    id: row.try_get("id")?,
                    channel,
                    created_at: row.try_get("created_at")?,
                })
            })
            .collect()
    }

    async fn count_subscribers(&self, channel: EntityId) -> AppResult<i64> {
        let total: i64 = sqlx::query("SELECT COUNT(*) FROM subscriptions WHERE channel_id = ?")
            .bind(channel)
            .fetch_one(&self.pool)
            .await?
            .try_get(0)?;
        Ok(total)
    }

    async fn count_subscriptions(&self, subscriber: EntityId) -> AppResult<i64> {
        let total: i64 = sqlx::query("SELECT COUNT(*) FROM subscriptions WHERE subscriber_id = ?")
            .bind(subscriber)
            .fetch_one(&self.pool)
            .await?
            .try_get(0)?;
        Ok(total)
    }
}

// ---- helpers ----

/// Create the directory holding a file-backed database, if any.
fn ensure_parent_dir(url: &str) -> AppResult<()> {
    let Some(rest) = url.strip_prefix("sqlite:") else {
        return Ok(());
    };
    let path = rest.trim_start_matches("//");
    let path = path.split('?').next().unwrap_or_default();
    if path.is_empty() || path == ":memory:" {
        return Ok(());
    }
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::ConfigurationError(format!(
                    "Cannot create database directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }
    Ok(())
}

fn push_video_filter(qb: &mut QueryBuilder<'_, Sqlite>, query: &VideoQuery) {
    if let Some(owner) = query.owner {
        qb.push(" AND v.owner_id = ");
        qb.push_bind(owner);
    }
    if let Some(search) = query.search.as_deref() {
        let pattern = like_pattern(search);
        // SQLite's lower() folds ASCII only; the *_search columns hold Unicode-lowercased copies.
        qb.push(" AND (v.title_search LIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" ESCAPE '\\' OR v.description_search LIKE ");
        qb.push_bind(pattern);
        qb.push(" ESCAPE '\\')");
    }
}

/// `%needle%` with LIKE wildcards in the needle escaped.
fn like_pattern(search: &str) -> String {
    let mut pattern = String::with_capacity(search.len() + 2);
    pattern.push('%');
    for ch in search.to_lowercase().chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

fn encode_ids(ids: &[EntityId]) -> AppResult<String> {
    Ok(serde_json::to_string(ids)?)
}

fn decode_ids(raw: &str) -> AppResult<Vec<EntityId>> {
    Ok(serde_json::from_str(raw)?)
}

fn user_from_row(row: &SqliteRow) -> AppResult<User> {
    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        full_name: row.try_get("full_name")?,
        avatar: row.try_get("avatar")?,
        cover_image: row.try_get("cover_image")?,
        watch_history: decode_ids(&row.try_get::<String, _>("watch_history")?)?,
        password_hash: row.try_get("password_hash")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn video_from_row(row: &SqliteRow) -> AppResult<Video> {
    Ok(Video {
        id: row.try_get("id")?,
        video_file: row.try_get("video_file")?,
        thumbnail: row.try_get("thumbnail")?,
        owner: row.try_get("owner_id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        duration: row.try_get("duration")?,
        views: row.try_get("views")?,
        is_published: row.try_get("is_published")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn owner_from_row(row: &SqliteRow, id: &str, username: &str, avatar: &str) -> AppResult<Option<OwnerSummary>> {
    let owner_id: Option<EntityId> = row.try_get(id)?;
    match owner_id {
        Some(owner_id) => Ok(Some(OwnerSummary {
            id: owner_id,
            username: row.try_get(username)?,
            avatar: row.try_get(avatar)?,
        })),
        None => Ok(None),
    }
}

fn populated_video_from_row(row: &SqliteRow) -> AppResult<PopulatedVideo> {
    let owner = owner_from_row(row, "owner_user_id", "owner_username", "owner_avatar")?;
    Ok(PopulatedVideo::new(video_from_row(row)?, owner))
}

fn comment_from_row(row: &SqliteRow) -> AppResult<Comment> {
    Ok(Comment {
        id: row.try_get("id")?,
        content: row.try_get("content")?,
        video: row.try_get("video_id")?,
        owner: row.try_get("owner_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn like_from_row(row: &SqliteRow) -> AppResult<Like> {
    Ok(Like {
        id: row.try_get("id")?,
        liked_by: row.try_get("liked_by")?,
        kind: LikeKind::parse(row.try_get::<&str, _>("target_kind")?)?,
        target: row.try_get("target_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn tweet_from_row(row: &SqliteRow) -> AppResult<Tweet> {
    Ok(Tweet {
        id: row.try_get("id")?,
        content: row.try_get("content")?,
        owner: row.try_get("owner_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn playlist_from_row(row: &SqliteRow) -> AppResult<Playlist> {
    Ok(Playlist {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        videos: decode_ids(&row.try_get::<String, _>("videos")?)?,
        owner: row.try_get("owner_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn subscription_from_row(row: &SqliteRow) -> AppResult<Subscription> {
    Ok(Subscription {
        id: row.try_get("id")?,
        subscriber: row.try_get("subscriber_id")?,
        channel: row.try_get("channel_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
