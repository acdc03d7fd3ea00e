//! Voteable projects as listed by the remote service.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of a project on the remote service.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(String);

impl ProjectId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProjectId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A project submission in the current round.
///
/// Only `id` is required on the wire; the display metadata is informational
/// and `total_votes` is never mutated locally.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    #[serde(default, deserialize_with = "crate::wire::null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "crate::wire::null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "crate::wire::null_as_default")]
    pub status: String,
    #[serde(default)]
    pub project_rank: Option<i64>,
    #[serde(default)]
    pub unique_voters: Option<i64>,
    #[serde(default, deserialize_with = "crate::wire::null_as_default")]
    pub total_votes: i64,
    #[serde(default, deserialize_with = "crate::wire::null_as_default")]
    pub is_deleted: bool,
}

impl Project {
    /// Minimal project with only an id and a name, mostly for tests and fixtures.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: ProjectId::new(id),
            name: name.into(),
            description: String::new(),
            status: String::new(),
            project_rank: None,
            unique_voters: None,
            total_votes: 0,
            is_deleted: false,
        }
    }
}
