use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use crate::core::EntityId;
use crate::domains::non_blank;
use crate::error::{AppError, AppResult};
use crate::infrastructure::{hash_password, verify_password, DatabaseInterface, TokenService};
use crate::models::{ChannelProfile, NewUser, PopulatedVideo, User};

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub password: Option<String>,
    pub avatar: Option<String>,
    pub cover_image: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// A successful login: the user and a freshly signed access token.
#[derive(Debug, Clone)]
pub struct LoginSession {
    pub user: User,
    pub access_token: String,
}

#[derive(Clone)]
pub struct UserService {
    database: Arc<dyn DatabaseInterface>,
    tokens: TokenService,
}

impl UserService {
    pub fn new(database: Arc<dyn DatabaseInterface>, tokens: TokenService) -> Self {
        Self { database, tokens }
    }

    pub async fn register(&self, request: RegisterRequest) -> AppResult<User> {
        let (Some(username), Some(email), Some(full_name), Some(password)) = (
            non_blank(request.username.as_deref()),
            non_blank(request.email.as_deref()),
            non_blank(request.full_name.as_deref()),
            non_blank(request.password.as_deref()),
        ) else {
            return Err(AppError::BadRequest("All fields are required".to_string()));
        };

        if !EMAIL_RE.is_match(email) {
            return Err(AppError::BadRequest("Invalid email address".to_string()));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::BadRequest(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        let username = username.to_lowercase();
        if self.database.username_or_email_taken(&username, email).await? {
            return Err(AppError::Conflict(
                "User with email or username already exists".to_string(),
            ));
        }

        let user = self
            .database
            .create_user(NewUser {
                username,
                email: email.to_string(),
                full_name: full_name.to_string(),
                avatar: non_blank(request.avatar.as_deref()).map(str::to_string),
                cover_image: non_blank(request.cover_image.as_deref()).map(str::to_string),
                password_hash: hash_password(password)?,
            })
            .await?;

        info!("Registered user {} ({})", user.username, user.id);
        Ok(user)
    }

    pub async fn login(&self, request: LoginRequest) -> AppResult<LoginSession> {
        let login = non_blank(request.username.as_deref())
            .or_else(|| non_blank(request.email.as_deref()))
            .ok_or_else(|| AppError::BadRequest("Username or email is required".to_string()))?;
        let password = request
            .password
            .as_deref()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| AppError::BadRequest("Password is required".to_string()))?;

        let invalid = || AppError::Unauthorized("Invalid user credentials".to_string());
        let user = self.database.find_user_by_login(login).await?.ok_or_else(invalid)?;
        if !verify_password(password, &user.password_hash)? {
            return Err(invalid());
        }

        let access_token = self.tokens.issue(user.id, &user.username)?;
        info!("User {} logged in", user.username);
        Ok(LoginSession { user, access_token })
    }

    pub fn token_ttl_secs(&self) -> u64 {
        self.tokens.ttl_secs()
    }

    pub async fn current_user(&self, user_id: EntityId) -> AppResult<User> {
        self.database
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    /// Watched videos, most recent first. Deleted videos are skipped.
    pub async fn watch_history(&self, user_id: EntityId) -> AppResult<Vec<PopulatedVideo>> {
        let user = self.current_user(user_id).await?;
        let videos = self
            .database
            .get_populated_videos_by_ids(&user.watch_history)
            .await?;

        let mut by_id: HashMap<EntityId, PopulatedVideo> =
            videos.into_iter().map(|video| (video.id, video)).collect();
        Ok(user
            .watch_history
            .iter()
            .filter_map(|id| by_id.remove(id))
            .collect())
    }

    pub async fn channel_profile(&self, channel_id: EntityId, viewer: Option<EntityId>) -> AppResult<ChannelProfile> {
        let user = self
            .database
            .get_user(channel_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Channel does not exist".to_string()))?;

        let subscribers_count = self.database.count_subscribers(user.id).await?;
        let channels_subscribed_to_count = self.database.count_subscriptions(user.id).await?;
        let is_subscribed = match viewer {
            Some(viewer) => self.database.find_subscription(viewer, user.id).await?.is_some(),
            None => false,
        };

        Ok(ChannelProfile {
            id: user.id,
            username: user.username,
            full_name: user.full_name,
            avatar: user.avatar,
            cover_image: user.cover_image,
            subscribers_count,
            channels_subscribed_to_count,
            is_subscribed,
        })
    }
}
