//! Ballots: the server-side record of an account's votes for a round.

use serde::{Deserialize, Serialize};

use crate::ProjectId;

/// Project summary embedded in a cast vote.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotedProject {
    pub id: ProjectId,
    #[serde(default, deserialize_with = "crate::wire::null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "crate::wire::null_as_default")]
    pub total_votes: i64,
}

/// A vote as reported by the server after casting.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastVote {
    pub id: String,
    pub is_confirmed: bool,
    pub project: VotedProject,
    #[serde(default, deserialize_with = "crate::wire::null_as_default")]
    pub vote_count: i64,
}

/// An account's ballot for the configured round.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ballot {
    #[serde(default)]
    pub id: Option<String>,
    pub total_eligible_votes: i64,
    pub used_votes: i64,
    #[serde(default, deserialize_with = "crate::wire::null_as_default")]
    pub votes: Vec<CastVote>,
}

impl Ballot {
    /// Votes still available to cast (eligible minus used).
    pub fn allowance(&self) -> i64 {
        self.total_eligible_votes - self.used_votes
    }

    /// Ids of every vote the server has not yet confirmed, in server order.
    pub fn unconfirmed_vote_ids(&self) -> Vec<String> {
        self.votes
            .iter()
            .filter(|v| !v.is_confirmed)
            .map(|v| v.id.clone())
            .collect()
    }
}

/// Result of a ballot query.
///
/// The service answers "ballot not found" for accounts that never had a
/// ballot in the round; that is an empty state, not a failure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BallotLookup {
    Found(Ballot),
    NotFound,
}

impl BallotLookup {
    pub fn eligible(&self) -> i64 {
        match self {
            Self::Found(b) => b.total_eligible_votes,
            Self::NotFound => 0,
        }
    }

    pub fn used(&self) -> i64 {
        match self {
            Self::Found(b) => b.used_votes,
            Self::NotFound => 0,
        }
    }

    pub fn allowance(&self) -> i64 {
        match self {
            Self::Found(b) => b.allowance(),
            Self::NotFound => 0,
        }
    }

    pub fn votes(&self) -> &[CastVote] {
        match self {
            Self::Found(b) => &b.votes,
            Self::NotFound => &[],
        }
    }

    pub fn unconfirmed_vote_ids(&self) -> Vec<String> {
        match self {
            Self::Found(b) => b.unconfirmed_vote_ids(),
            Self::NotFound => Vec::new(),
        }
    }
}
