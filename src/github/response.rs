//! Classification of GitHub response bodies.
//!
//! GitHub error payloads carry a top-level `message` field. Its presence is
//! what marks a response as an API error, whatever the HTTP status was.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{BotError, Result};

/// Decode a response body into `T`, or into `GitHubApi` when it is an error payload.
pub fn decode<T: DeserializeOwned>(body: &str) -> Result<T> {
    let value: Value = serde_json::from_str(body)?;

    if let Some(message) = value.get("message") {
        let message = match message {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        };
        return Err(BotError::GitHubApi { message });
    }

    Ok(serde_json::from_value(value)?)
}
