use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use vidstream::{
    api::build_router,
    app_state::AppState,
    config::Config,
    infrastructure::{MemoryMediaStorage, SqliteDatabase},
};

const BOUNDARY: &str = "vidstream-test-boundary";

async fn test_app() -> Router {
    let database = SqliteDatabase::new_in_memory().await.unwrap();
    let state = AppState::from_parts(
        Config::for_tests(),
        Arc::new(database),
        Arc::new(MemoryMediaStorage::new()),
    )
    .unwrap();
    build_router(state)
}

async fn send(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    into_json(app.clone().oneshot(request).await.unwrap()).await
}

async fn into_json(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

/// Register and log in; returns (access token, user id).
async fn signup(app: &Router, username: &str) -> (String, String) {
    let (status, _) = send(
        app,
        Method::POST,
        "/api/v1/users/register",
        None,
        Some(json!({
            "username": username,
            "email": format!("{}@example.com", username),
            "fullName": username,
            "password": "password123",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        app,
        Method::POST,
        "/api/v1/users/login",
        None,
        Some(json!({ "username": username, "password": "password123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    (
        body["data"]["accessToken"].as_str().unwrap().to_string(),
        body["data"]["user"]["_id"].as_str().unwrap().to_string(),
    )
}

fn multipart_body(fields: &[(&str, &str)], files: &[(&str, &str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }
    for (name, file_name, bytes) in files {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                BOUNDARY, name, file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

async fn publish(app: &Router, token: &str, title: &str) -> String {
    let body = multipart_body(
        &[("title", title), ("description", "a test video"), ("duration", "12")],
        &[("videoFile", "clip.mp4", b"video-bytes"), ("thumbnail", "thumb.png", b"png-bytes")],
    );
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/videos/publish")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap();
    let (status, body) = into_json(app.clone().oneshot(request).await.unwrap()).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["message"], "Video published successfully");
    body["data"]["_id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_check_responds() {
    let app = test_app().await;
    let (status, body) = send(&app, Method::GET, "/healthz", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], 200);
}

#[tokio::test]
async fn protected_routes_require_a_valid_token() {
    let app = test_app().await;

    let (status, body) = send(&app, Method::GET, "/api/v1/users/current-user", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Unauthorized request");
    assert!(body["data"].is_null());

    let (status, body) = send(&app, Method::GET, "/api/v1/users/current-user", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid access token");

    // Public listings ignore a bad token.
    let (status, body) = send(&app, Method::GET, "/api/v1/videos/search", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["totalVideos"], 0);
}

#[tokio::test]
async fn login_sets_cookie_that_authenticates() {
    let app = test_app().await;
    signup(&app, "cookie").await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/users/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({"email": "cookie@example.com", "password": "password123"}).to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("accessToken="));

    let request = Request::builder()
        .uri("/api/v1/users/current-user")
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap();
    let (status, body) = into_json(app.clone().oneshot(request).await.unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], "cookie");
    assert!(body["data"].get("passwordHash").is_none());
}

#[tokio::test]
async fn malformed_ids_are_rejected() {
    let app = test_app().await;
    let (token, _) = signup(&app, "ids").await;

    let (status, body) = send(&app, Method::GET, "/api/v1/videos/not-an-id", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid video ID");

    let (status, body) = send(&app, Method::POST, "/api/v1/likes/likeTweet/-5", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid tweet ID");
}

#[tokio::test]
async fn like_toggle_twice_returns_to_unliked() {
    let app = test_app().await;
    let (token, _) = signup(&app, "liker").await;
    let video = publish(&app, &token, "likeable").await;
    let uri = format!("/api/v1/likes/likeVideo/{}", video);

    let (status, body) = send(&app, Method::POST, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Like added successfully");
    assert_eq!(body["data"]["target"], video);

    let (status, body) = send(&app, Method::GET, "/api/v1/likes/likedVideos", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["video"]["title"], "likeable");

    let (status, body) = send(&app, Method::POST, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["status"], 202);
    assert!(body["data"].is_null());

    let (status, body) = send(&app, Method::GET, "/api/v1/likes/likedVideos", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "No liked videos found");
}

#[tokio::test]
async fn subscription_toggle_twice_returns_to_unsubscribed() {
    let app = test_app().await;
    let (fan_token, fan_id) = signup(&app, "fan").await;
    let (channel_token, channel_id) = signup(&app, "channel").await;
    let uri = format!("/api/v1/subscriptions/{}", channel_id);

    let (status, body) = send(&app, Method::POST, &uri, Some(&fan_token), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["channel"], channel_id);

    let subscribers = format!("/api/v1/subscriptions/{}/subscribers", channel_id);
    let (status, body) = send(&app, Method::GET, &subscribers, Some(&channel_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["subscriber"]["_id"], fan_id);
    let (status, _) = send(&app, Method::GET, &subscribers, Some(&fan_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, Method::POST, &uri, Some(&fan_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Unsubscribed successfully");

    let (status, body) = send(&app, Method::GET, &subscribers, Some(&channel_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!([]));
    assert_eq!(body["message"], "No subscribers found for this channel");

    let channel = format!("/api/v1/users/c/{}", channel_id);
    let (status, body) = send(&app, Method::GET, &channel, Some(&fan_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["subscribersCount"], 0);
    assert_eq!(body["data"]["isSubscribed"], false);
}

#[tokio::test]
async fn videos_sorted_by_views_descending() {
    let app = test_app().await;
    let (token, user_id) = signup(&app, "creator").await;
    let mut ids = Vec::new();
    for title in ["one", "two", "three"] {
        ids.push(publish(&app, &token, title).await);
    }
    for (id, views) in ids.iter().zip([1, 3, 2]) {
        for _ in 0..views {
            let (status, _) = send(&app, Method::GET, &format!("/api/v1/videos/{}", id), None, None).await;
            assert_eq!(status, StatusCode::OK);
        }
    }

    let uri = format!("/api/v1/videos/search?sortBy=views&sortType=desc&userId={}", user_id);
    let (status, body) = send(&app, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    let views: Vec<i64> = body["data"]["videos"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["views"].as_i64().unwrap())
        .collect();
    assert_eq!(views, vec![3, 2, 1]);
    assert!(views.windows(2).all(|w| w[0] >= w[1]));
    assert_eq!(body["data"]["totalVideos"], 3);
    assert_eq!(body["data"]["totalPages"], 1);
    assert_eq!(body["data"]["videos"][0]["owner"]["username"], "creator");

    let (status, body) = send(&app, Method::GET, "/api/v1/videos/search?sortBy=title", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid sortBy field");

    let (_, body) = send(&app, Method::GET, "/api/v1/videos/search?query=THR", None, None).await;
    assert_eq!(body["data"]["totalVideos"], 1);
}

#[tokio::test]
async fn watching_records_history_for_signed_in_viewers() {
    let app = test_app().await;
    let (token, _) = signup(&app, "watcher").await;
    let first = publish(&app, &token, "first").await;
    let second = publish(&app, &token, "second").await;

    for id in [&first, &second, &first] {
        send(&app, Method::GET, &format!("/api/v1/videos/{}", id), Some(&token), None).await;
    }

    let (status, body) = send(&app, Method::GET, "/api/v1/users/history", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<_> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["title"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(titles, vec!["first", "second"]);
}

#[tokio::test]
async fn comment_pages_are_newest_first() {
    let app = test_app().await;
    let (token, _) = signup(&app, "talker").await;
    let video = publish(&app, &token, "discussed").await;
    let uri = format!("/api/v1/comments/{}", video);

    let (status, body) = send(&app, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "No comments found for this video");

    for i in 1..=25 {
        let (status, _) = send(
            &app,
            Method::POST,
            &uri,
            Some(&token),
            Some(json!({ "content": format!("comment {}", i) })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(&app, Method::GET, &format!("{}?page=2&limit=10", uri), None, None).await;
    assert_eq!(status, StatusCode::OK);
    let page = &body["data"];
    let contents: Vec<_> = page["comments"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["content"].as_str().unwrap().to_string())
        .collect();
    let expected: Vec<_> = (6..=15).rev().map(|i| format!("comment {}", i)).collect();
    assert_eq!(contents, expected);
    assert_eq!(page["totalComments"], 25);
    assert_eq!(page["totalPages"], 3);
    assert_eq!(page["hasNextPage"], true);
    assert_eq!(page["prevPage"], 1);

    let (status, body) = send(&app, Method::GET, &format!("{}?page=0", uri), None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid page number");
}

#[tokio::test]
async fn tweet_strangers_are_forbidden_but_comment_strangers_see_not_found() {
    let app = test_app().await;
    let (owner, _) = signup(&app, "owner").await;
    let (stranger, _) = signup(&app, "stranger").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/tweets/create",
        Some(&owner),
        Some(json!({ "content": "hello world" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let tweet = body["data"]["_id"].as_str().unwrap().to_string();

    let tweet_uri = format!("/api/v1/tweets/{}", tweet);
    let (status, body) = send(&app, Method::PUT, &tweet_uri, Some(&stranger), Some(json!({"content": "mine now"}))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "You are not authorized to update this tweet");
    let (status, _) = send(&app, Method::DELETE, &tweet_uri, Some(&stranger), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let video = publish(&app, &owner, "commented").await;
    let (_, body) = send(
        &app,
        Method::POST,
        &format!("/api/v1/comments/{}", video),
        Some(&owner),
        Some(json!({ "content": "first!" })),
    )
    .await;
    let comment = body["data"]["_id"].as_str().unwrap().to_string();

    let comment_uri = format!("/api/v1/comments/c/{}", comment);
    let (status, body) = send(&app, Method::PUT, &comment_uri, Some(&stranger), Some(json!({"content": "edited"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body["message"],
        "Comment not found or you do not have permission to update it"
    );
    let (status, _) = send(&app, Method::DELETE, &comment_uri, Some(&stranger), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::DELETE, &comment_uri, Some(&owner), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, Method::GET, "/api/v1/tweets", Some(&owner), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["owner"]["username"], "owner");
    let (status, body) = send(&app, Method::GET, "/api/v1/tweets", Some(&stranger), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn playlist_rejects_duplicate_video() {
    let app = test_app().await;
    let (token, user_id) = signup(&app, "curator").await;
    let video = publish(&app, &token, "V1").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/playlists/create",
        Some(&token),
        Some(json!({ "name": "Favs", "description": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let playlist = body["data"]["_id"].as_str().unwrap().to_string();

    let add = format!("/api/v1/playlists/add-video/{}/{}", playlist, video);
    let (status, _) = send(&app, Method::POST, &add, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = send(&app, Method::POST, &add, Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Video already exists in the playlist");

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/v1/playlists/playlist/{}", playlist),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["videos"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["videos"][0]["_id"], video);

    let (status, body) = send(&app, Method::GET, &format!("/api/v1/playlists/{}", user_id), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["name"], "Favs");

    let remove = format!("/api/v1/playlists/remove-video/{}/{}", playlist, video);
    let (status, _) = send(&app, Method::POST, &remove, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = send(&app, Method::POST, &remove, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Video not found in the playlist");
}

#[tokio::test]
async fn video_owner_actions() {
    let app = test_app().await;
    let (owner, _) = signup(&app, "uploader").await;
    let (stranger, _) = signup(&app, "bystander").await;
    let video = publish(&app, &owner, "mine").await;
    let toggle = format!("/api/v1/videos/{}/publish", video);

    let (status, _) = send(&app, Method::PATCH, &toggle, Some(&stranger), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, Method::PATCH, &toggle, Some(&owner), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Video is now unpublished");
    assert_eq!(body["data"]["isPublished"], false);

    let uri = format!("/api/v1/videos/{}", video);
    let (status, body) = send(&app, Method::DELETE, &uri, Some(&stranger), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "You are not authorized to delete this video");

    let (status, body) = send(&app, Method::DELETE, &uri, Some(&owner), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].is_null());

    let (status, body) = send(&app, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Video not found");
}
