//! Response envelope shared by every endpoint.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::ApiError;

pub const MSG_VOTING_SUCCESSFUL: &str = "Voting successful!";
pub const MSG_VOTES_CONFIRMED: &str = "Votes confirmed!";
pub const MSG_VOTE_DELETED: &str = "Vote deleted!";
pub const MSG_BALLOT_NOT_FOUND: &str = "Ballot not found!";

/// Longest body excerpt carried in a decode error.
const BODY_EXCERPT: usize = 200;

/// `{statusCode, message, data, metadata, error}` as returned by the service.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub status_code: i64,
    /// Validation failures send an array of messages; they are joined with `"; "`.
    #[serde(default, deserialize_with = "message_text")]
    pub message: String,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub metadata: Value,
    #[serde(default)]
    pub error: Value,
}

fn message_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(s) => s,
        Value::Array(items) => items
            .iter()
            .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
            .collect::<Vec<_>>()
            .join("; "),
        other => other.to_string(),
    })
}

impl Envelope {
    pub fn parse(body: &str) -> Result<Self, ApiError> {
        serde_json::from_str(body).map_err(|e| {
            let excerpt: String = body.chars().take(BODY_EXCERPT).collect();
            ApiError::Decode(format!("{e} in body {excerpt:?}"))
        })
    }

    pub fn is_ok(&self) -> bool {
        self.status_code == 200
    }

    /// The ballot endpoint answers 404 with this message for accounts that never voted.
    pub fn is_ballot_not_found(&self) -> bool {
        self.status_code == 404 && self.message == MSG_BALLOT_NOT_FOUND
    }

    fn rejection(&self) -> ApiError {
        ApiError::Application {
            status: self.status_code,
            message: self.message.clone(),
        }
    }

    /// Require `statusCode == 200`.
    pub fn require_ok(self) -> Result<Self, ApiError> {
        if self.is_ok() {
            Ok(self)
        } else {
            Err(self.rejection())
        }
    }

    /// Require `statusCode == 200` and an exact acknowledgement message.
    pub fn require_message(self, expected: &str) -> Result<Self, ApiError> {
        if self.is_ok() && self.message == expected {
            Ok(self)
        } else {
            Err(self.rejection())
        }
    }

    /// Decode `data` into the endpoint's typed payload. Missing required fields
    /// are decode errors, never defaults.
    pub fn into_data<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        if self.data.is_null() {
            return Err(ApiError::Decode("envelope has no data".into()));
        }
        serde_json::from_value(self.data).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

/// `data` of the challenge endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct NonceData {
    pub nonce: String,
}
