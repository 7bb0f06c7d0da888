// Core types and primitives shared by every domain

pub mod strong_types;

pub use strong_types::{current_time_millis, parse_id, EntityId, Timestamp};
