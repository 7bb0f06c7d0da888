use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};

use crate::app_state::AppState;
use crate::core::parse_id;
use crate::domains::subscription::service::SubscriptionToggle;
use crate::error::AppResult;
use crate::infrastructure::middleware::Vc;
use crate::models::{SubscribedChannel, Subscriber};
use crate::response::ApiResponse;

// One path parameter name for all three routes: `{id}` is the channel for
// the first two and the subscriber for the last.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/{id}", post(toggle_subscription))
        .route("/{id}/subscribers", get(channel_subscribers))
        .route("/{id}/subscriptions", get(subscribed_channels))
}

async fn toggle_subscription(State(state): State<AppState>, vc: Vc, Path(channel_id): Path<String>) -> AppResult<Response> {
    let actor = vc.require_user()?;
    let channel = parse_id(&channel_id, "channel")?;
    Ok(match state.subscriptions.toggle_subscription(actor, channel).await? {
        SubscriptionToggle::Subscribed(subscription) => {
            ApiResponse::created(subscription, "Subscribed successfully").into_response()
        }
        SubscriptionToggle::Unsubscribed => {
            ApiResponse::<()>::message(StatusCode::OK, "Unsubscribed successfully").into_response()
        }
    })
}

async fn channel_subscribers(
    State(state): State<AppState>,
    vc: Vc,
    Path(channel_id): Path<String>,
) -> AppResult<ApiResponse<Vec<Subscriber>>> {
    let actor = vc.require_user()?;
    let channel = parse_id(&channel_id, "channel")?;
    let subscribers = state.subscriptions.channel_subscribers(actor, channel).await?;
    let message = if subscribers.is_empty() {
        "No subscribers found for this channel"
    } else {
        "Subscribers retrieved successfully"
    };
    Ok(ApiResponse::ok(subscribers, message))
}

async fn subscribed_channels(
    State(state): State<AppState>,
    vc: Vc,
    Path(subscriber_id): Path<String>,
) -> AppResult<ApiResponse<Vec<SubscribedChannel>>> {
    let actor = vc.require_user()?;
    let subscriber = parse_id(&subscriber_id, "subscriber")?;
    let channels = state.subscriptions.subscribed_channels(actor, subscriber).await?;
    let message = if channels.is_empty() {
        "No subscribed channels found for this user"
    } else {
        "Subscribed channels retrieved successfully"
    };
    Ok(ApiResponse::ok(channels, message))
}
