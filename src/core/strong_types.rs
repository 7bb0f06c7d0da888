// Strong Types - document IDs and timestamps used across every collection

use chrono::{DateTime, SecondsFormat};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::{AppError, AppResult};

/// Strongly-typed document ID.
///
/// IDs are positive 64-bit snowflakes (see `IdGenerator`). On the wire they
/// travel as decimal strings so that JavaScript clients never lose precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, sqlx::Type)]
#[sqlx(transparent)]
pub struct EntityId(i64);

impl EntityId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn value(self) -> i64 {
        self.0
    }

    pub fn is_valid(self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidEntityId;

impl fmt::Display for InvalidEntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("identifier must be a positive decimal integer")
    }
}

impl std::error::Error for InvalidEntityId {}

impl FromStr for EntityId {
    type Err = InvalidEntityId;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        // Reject signs, whitespace and anything i64::from_str would tolerate.
        if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(InvalidEntityId);
        }
        let id = raw.parse::<i64>().map_err(|_| InvalidEntityId)?;
        let id = EntityId(id);
        if id.is_valid() {
            Ok(id)
        } else {
            Err(InvalidEntityId)
        }
    }
}

impl Serialize for EntityId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntityIdVisitor;

        impl<'de> de::Visitor<'de> for EntityIdVisitor {
            type Value = EntityId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a positive integer id or its decimal string")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<EntityId, E> {
                v.parse().map_err(E::custom)
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<EntityId, E> {
                let id = EntityId(v);
                if id.is_valid() {
                    Ok(id)
                } else {
                    Err(E::custom(InvalidEntityId))
                }
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<EntityId, E> {
                let v = i64::try_from(v).map_err(|_| E::custom(InvalidEntityId))?;
                self.visit_i64(v)
            }
        }

        deserializer.deserialize_any(EntityIdVisitor)
    }
}

/// Parse an identifier taken from a path or query string.
///
/// `label` names the entity in the error message, e.g. `"video"` yields
/// "Invalid video ID".
pub fn parse_id(raw: &str, label: &str) -> AppResult<EntityId> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid {} ID", label)))
}

/// Milliseconds since the Unix epoch. Serialised as an RFC 3339 string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, sqlx::Type)]
#[sqlx(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(millis: i64) -> Self {
        Self(millis)
    }

    pub fn now() -> Self {
        Self(current_time_millis())
    }

    pub fn value(self) -> i64 {
        self.0
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match DateTime::from_timestamp_millis(self.0) {
            Some(dt) => serializer.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::Millis, true)),
            None => serializer.serialize_i64(self.0),
        }
    }
}

/// Current time in milliseconds since Unix epoch
pub fn current_time_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
