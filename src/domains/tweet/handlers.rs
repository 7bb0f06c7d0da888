use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;

use crate::app_state::AppState;
use crate::core::{parse_id, EntityId};
use crate::error::AppResult;
use crate::infrastructure::middleware::Vc;
use crate::models::{PopulatedTweet, Tweet};
use crate::response::ApiResponse;

#[derive(Debug, Default, Deserialize)]
pub struct TweetBody {
    pub content: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/create", post(create_tweet))
        .route("/", get(own_tweets))
        .route("/user/{userId}", get(user_tweets))
        .route("/{tweetId}", put(update_tweet).delete(delete_tweet))
}

async fn create_tweet(
    State(state): State<AppState>,
    vc: Vc,
    Json(body): Json<TweetBody>,
) -> AppResult<ApiResponse<Tweet>> {
    let owner = vc.require_user()?;
    let tweet = state.tweets.create_tweet(owner, body.content.as_deref()).await?;
    Ok(ApiResponse::created(tweet, "Tweet created successfully"))
}

async fn own_tweets(State(state): State<AppState>, vc: Vc) -> AppResult<Response> {
    let owner = vc.require_user()?;
    list_tweets(&state, owner).await
}

async fn user_tweets(State(state): State<AppState>, vc: Vc, Path(user_id): Path<String>) -> AppResult<Response> {
    vc.require_user()?;
    let owner = parse_id(&user_id, "user")?;
    list_tweets(&state, owner).await
}

async fn list_tweets(state: &AppState, owner: EntityId) -> AppResult<Response> {
    let tweets = state.tweets.user_tweets(owner).await?;
    Ok(if tweets.is_empty() {
        ApiResponse::new(
            StatusCode::NOT_FOUND,
            Some(Vec::<PopulatedTweet>::new()),
            "No tweets found for this user",
        )
        .into_response()
    } else {
        ApiResponse::ok(tweets, "Tweets retrieved successfully").into_response()
    })
}

async fn update_tweet(
    State(state): State<AppState>,
    vc: Vc,
    Path(tweet_id): Path<String>,
    Json(body): Json<TweetBody>,
) -> AppResult<ApiResponse<Tweet>> {
    let actor = vc.require_user()?;
    let id = parse_id(&tweet_id, "tweet")?;
    let tweet = state
        .tweets
        .update_tweet(actor, id, body.content.as_deref())
        .await?;
    Ok(ApiResponse::ok(tweet, "Tweet updated successfully"))
}

async fn delete_tweet(
    State(state): State<AppState>,
    vc: Vc,
    Path(tweet_id): Path<String>,
) -> AppResult<ApiResponse<()>> {
    let actor = vc.require_user()?;
    let id = parse_id(&tweet_id, "tweet")?;
    state.tweets.delete_tweet(actor, id).await?;
    Ok(ApiResponse::message(StatusCode::OK, "Tweet deleted successfully"))
}
