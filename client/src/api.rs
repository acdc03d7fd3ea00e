//! The remote voting service as seen by the workflows.

use std::sync::Arc;

use async_trait::async_trait;
use retrovote_network::ProxyEndpoint;
use retrovote_types::{Address, BallotLookup, Project, ProjectId};

use crate::{ApiError, BearerTokens};

/// One remote call per method, each with its own success predicate.
///
/// A single call never retries; call sites wrap methods in a
/// [`RetryPolicy`](crate::RetryPolicy).
#[async_trait]
pub trait VotingApi: Send + Sync {
    /// Fetch the challenge text to sign for `address`. Empty challenges are errors.
    async fn challenge(&self, address: &Address) -> Result<String, ApiError>;

    /// Exchange a signed challenge for session cookies.
    async fn login(&self, address: &Address, signature: &str) -> Result<BearerTokens, ApiError>;

    /// Ballot for the configured round.
    async fn ballot(&self, tokens: &BearerTokens) -> Result<BallotLookup, ApiError>;

    /// Every submission in the configured round.
    async fn projects(&self, tokens: &BearerTokens) -> Result<Vec<Project>, ApiError>;

    async fn cast_vote(
        &self,
        tokens: &BearerTokens,
        project: &ProjectId,
        count: i64,
    ) -> Result<(), ApiError>;

    /// Confirm all given votes in a single request.
    async fn confirm_votes(&self, tokens: &BearerTokens, vote_ids: &[String])
        -> Result<(), ApiError>;

    async fn delete_vote(&self, tokens: &BearerTokens, project: &ProjectId)
        -> Result<(), ApiError>;
}

/// Builds a [`VotingApi`] bound to one egress route.
///
/// Each account gets its own connection, so proxy assignment is per account.
pub trait ApiConnector: Send + Sync {
    fn connect(&self, proxy: Option<&ProxyEndpoint>) -> Result<Arc<dyn VotingApi>, ApiError>;
}
