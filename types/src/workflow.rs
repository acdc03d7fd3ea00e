//! Workflow selector: what each account's unit of work does after authenticating.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::TypesError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowKind {
    /// Authenticate, read the ballot and record accounts that hold votes.
    Record,
    /// Authenticate, distribute the allowance, cast and confirm votes.
    Vote,
    /// Authenticate and withdraw every vote already cast.
    Delete,
}

impl WorkflowKind {
    pub const ALL: [WorkflowKind; 3] = [Self::Record, Self::Vote, Self::Delete];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Record => "record",
            Self::Vote => "vote",
            Self::Delete => "delete",
        }
    }

    /// Human-readable menu label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Record => "Parse Accounts Votes",
            Self::Vote => "Projects Voter",
            Self::Delete => "Votes Deleter",
        }
    }

    /// Map a 1-based interactive menu entry to a workflow.
    pub fn from_menu_choice(choice: &str) -> Result<Self, TypesError> {
        match choice.trim() {
            "1" => Ok(Self::Record),
            "2" => Ok(Self::Vote),
            "3" => Ok(Self::Delete),
            other => other.parse(),
        }
    }
}

impl fmt::Display for WorkflowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkflowKind {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "record" => Ok(Self::Record),
            "vote" => Ok(Self::Vote),
            "delete" => Ok(Self::Delete),
            _ => Err(TypesError::UnknownWorkflow(s.to_string())),
        }
    }
}
