use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tb_core::error::{RevmapError, TicketError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("json encode failed: {message}")]
    JsonEncode { message: String },
    #[error("json decode failed: {message}")]
    JsonDecode { message: String },
    #[error("invalid timestamp: {value}")]
    InvalidTimestamp { value: String },
    #[error("value out of range: {value}")]
    OutOfRange { value: i64 },
}

impl From<DbError> for TicketError {
    fn from(err: DbError) -> Self {
        TicketError::InvalidInput {
            message: err.to_string(),
        }
    }
}

impl From<DbError> for RevmapError {
    fn from(err: DbError) -> Self {
        RevmapError::InvalidInput {
            message: err.to_string(),
        }
    }
}

pub fn to_rfc3339(value: &DateTime<Utc>) -> String {
    value.to_rfc3339()
}

pub fn from_rfc3339(value: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| DbError::InvalidTimestamp {
            value: value.to_string(),
        })
}

pub fn encode_json<T: Serialize>(value: &T) -> Result<String, DbError> {
    serde_json::to_string(value).map_err(|err| DbError::JsonEncode {
        message: err.to_string(),
    })
}

pub fn decode_json<T: DeserializeOwned>(value: &str) -> Result<T, DbError> {
    serde_json::from_str(value).map_err(|err| DbError::JsonDecode {
        message: err.to_string(),
    })
}

/// Revisions are stored as SQLite integers.
pub fn revision_from_sql(value: i64) -> Result<u32, DbError> {
    u32::try_from(value).map_err(|_| DbError::OutOfRange { value })
}
