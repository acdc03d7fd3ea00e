//! Per-account authentication state machine.
//!
//! ```text
//! Unauthenticated --challenge--> ChallengeReceived --sign--> Signed --login--> Authenticated
//!        |                              |                      |
//!        +------------------------------+----------------------+--> Failed (fatal)
//! ```
//!
//! Transient failures keep the session in its current state and are retried
//! by the [`RetryPolicy`]; only fatal failures move it to `Failed`.

use retrovote_client::{ApiError, BearerTokens, RetryPolicy, VotingApi};
use retrovote_crypto::{Account, PersonalSignature};
use retrovote_types::{Address, BallotLookup, Project, ProjectId};

use crate::WorkflowError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    ChallengeReceived,
    Signed,
    Authenticated,
    Failed,
}

/// A session that has not logged in yet.
pub struct Session<'a> {
    account: &'a Account,
    api: &'a dyn VotingApi,
    retry: &'a RetryPolicy,
    state: SessionState,
    challenge: Option<String>,
    signature: Option<PersonalSignature>,
}

impl<'a> Session<'a> {
    pub fn new(account: &'a Account, api: &'a dyn VotingApi, retry: &'a RetryPolicy) -> Self {
        Self {
            account,
            api,
            retry,
            state: SessionState::Unauthenticated,
            challenge: None,
            signature: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn address(&self) -> Address {
        self.account.address()
    }

    fn fail<E: Into<WorkflowError>>(&mut self, err: E) -> WorkflowError {
        self.state = SessionState::Failed;
        err.into()
    }

    /// Unauthenticated -> ChallengeReceived.
    pub async fn request_challenge(&mut self) -> Result<(), WorkflowError> {
        let api = self.api;
        let address = &self.account.address();
        match self
            .retry
            .run("get challenge", address, move || api.challenge(address))
            .await
        {
            Ok(challenge) => {
                self.challenge = Some(challenge);
                self.state = SessionState::ChallengeReceived;
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// ChallengeReceived -> Signed. Signing failures are fatal.
    pub fn sign(&mut self) -> Result<(), WorkflowError> {
        let Some(challenge) = self.challenge.as_deref() else {
            return Err(self.fail(ApiError::Incomplete("no challenge to sign".into())));
        };
        match self.account.sign_challenge(challenge) {
            Ok(signature) => {
                self.signature = Some(signature);
                self.state = SessionState::Signed;
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Signed -> Authenticated.
    pub async fn login(mut self) -> Result<AuthenticatedSession<'a>, WorkflowError> {
        let Some(signature) = self.signature.map(|s| s.to_hex()) else {
            return Err(self.fail(ApiError::Incomplete("challenge was never signed".into())));
        };
        let api = self.api;
        let address = &self.account.address();
        let signature = signature.as_str();
        let tokens = self
            .retry
            .run("login", address, move || api.login(address, signature))
            .await
            .map_err(|e| self.fail(e))?;

        tracing::info!("{address} | successfully authorized");
        Ok(AuthenticatedSession {
            account: self.account,
            api: self.api,
            retry: self.retry,
            tokens,
        })
    }

    /// Run every transition in order.
    pub async fn authenticate(mut self) -> Result<AuthenticatedSession<'a>, WorkflowError> {
        self.request_challenge().await?;
        self.sign()?;
        self.login().await
    }
}

/// A logged-in session. Every call carries the session cookies and goes
/// through the retry policy.
pub struct AuthenticatedSession<'a> {
    account: &'a Account,
    api: &'a dyn VotingApi,
    retry: &'a RetryPolicy,
    tokens: BearerTokens,
}

impl<'a> AuthenticatedSession<'a> {
    pub fn state(&self) -> SessionState {
        SessionState::Authenticated
    }

    pub fn address(&self) -> Address {
        self.account.address()
    }

    pub fn account(&self) -> &'a Account {
        self.account
    }

    pub fn tokens(&self) -> &BearerTokens {
        &self.tokens
    }

    pub async fn ballot(&self) -> Result<BallotLookup, ApiError> {
        let (api, tokens) = (self.api, &self.tokens);
        self.retry
            .run("get ballot", &self.address(), move || api.ballot(tokens))
            .await
    }

    pub async fn projects(&self) -> Result<Vec<Project>, ApiError> {
        let (api, tokens) = (self.api, &self.tokens);
        self.retry
            .run("list projects", &self.address(), move || api.projects(tokens))
            .await
    }

    pub async fn cast_vote(&self, project: &ProjectId, count: i64) -> Result<(), ApiError> {
        let (api, tokens) = (self.api, &self.tokens);
        self.retry
            .run("cast vote", &self.address(), move || {
                api.cast_vote(tokens, project, count)
            })
            .await
    }

    pub async fn confirm_votes(&self, vote_ids: &[String]) -> Result<(), ApiError> {
        let (api, tokens) = (self.api, &self.tokens);
        self.retry
            .run("confirm votes", &self.address(), move || {
                api.confirm_votes(tokens, vote_ids)
            })
            .await
    }

    pub async fn delete_vote(&self, project: &ProjectId) -> Result<(), ApiError> {
        let (api, tokens) = (self.api, &self.tokens);
        self.retry
            .run("delete vote", &self.address(), move || {
                api.delete_vote(tokens, project)
            })
            .await
    }
}
