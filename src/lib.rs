// Video sharing backend - users, videos, comments, likes, tweets, playlists, subscriptions

// Core types and primitives
pub mod core;

// Document store, media storage, security and request middleware
pub mod infrastructure;

// Document models shared by every domain
pub mod models;

// Domain-Driven Organization - one module per resource
pub mod domains;

// HTTP wiring
pub mod api;
pub mod app_state;
pub mod config;
pub mod response;

// Common utilities
pub mod error;

// Re-exports for convenience
pub use error::{AppError, AppResult};
