//! Nullable voting service: an in-memory, scriptable stand-in for the remote API.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use retrovote_client::{ApiError, BearerTokens, VotingApi};
use retrovote_crypto::{recover_personal_signer, PersonalSignature};
use retrovote_types::{Address, Ballot, BallotLookup, CastVote, Project, ProjectId, VotedProject};

/// Which endpoint a call hit, for failure injection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallKind {
    Challenge,
    Login,
    Ballot,
    Projects,
    CastVote,
    ConfirmVotes,
    DeleteVote,
}

/// A recorded call, attributed to the account that made it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ApiCall {
    Challenge { address: Address },
    Login { address: Address },
    Ballot { address: Address },
    Projects { address: Address },
    CastVote { address: Address, project: ProjectId, count: i64 },
    ConfirmVotes { address: Address, vote_ids: Vec<String> },
    DeleteVote { address: Address, project: ProjectId },
}

impl ApiCall {
    pub fn kind(&self) -> CallKind {
        match self {
            Self::Challenge { .. } => CallKind::Challenge,
            Self::Login { .. } => CallKind::Login,
            Self::Ballot { .. } => CallKind::Ballot,
            Self::Projects { .. } => CallKind::Projects,
            Self::CastVote { .. } => CallKind::CastVote,
            Self::ConfirmVotes { .. } => CallKind::ConfirmVotes,
            Self::DeleteVote { .. } => CallKind::DeleteVote,
        }
    }

    pub fn address(&self) -> Address {
        match self {
            Self::Challenge { address }
            | Self::Login { address }
            | Self::Ballot { address }
            | Self::Projects { address }
            | Self::CastVote { address, .. }
            | Self::ConfirmVotes { address, .. }
            | Self::DeleteVote { address, .. } => *address,
        }
    }
}

#[derive(Default)]
struct State {
    projects: Vec<Project>,
    ballots: HashMap<Address, Ballot>,
    nonces: HashMap<Address, String>,
    sessions: HashMap<String, Address>,
    calls: Vec<ApiCall>,
    /// One-shot failures consumed in order, per endpoint.
    scripted: HashMap<CallKind, VecDeque<ApiError>>,
    /// Failures returned on every call of an endpoint by one account.
    persistent: HashMap<(Address, CallKind), ApiError>,
    next_nonce: u64,
    next_vote: u64,
}

impl State {
    fn injected(&mut self, address: Address, kind: CallKind) -> Result<(), ApiError> {
        if let Some(err) = self.persistent.get(&(address, kind)) {
            return Err(err.clone());
        }
        match self.scripted.get_mut(&kind).and_then(VecDeque::pop_front) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn session(&self, tokens: &BearerTokens) -> Result<Address, ApiError> {
        self.sessions
            .get(&tokens.access)
            .copied()
            .ok_or_else(|| rejected(401, "Unauthorized"))
    }
}

fn rejected(status: i64, message: &str) -> ApiError {
    ApiError::Application {
        status,
        message: message.to_string(),
    }
}

/// A deterministic voting service for tests.
///
/// Thread-safe; one instance is usually shared by every worker through a
/// [`NullConnector`](crate::NullConnector).
pub struct NullVotingApi {
    state: Mutex<State>,
    latency: Option<Duration>,
    in_flight: AtomicU64,
    max_in_flight: AtomicU64,
}

impl NullVotingApi {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            latency: None,
            in_flight: AtomicU64::new(0),
            max_in_flight: AtomicU64::new(0),
        }
    }

    /// Every call sleeps this long before answering.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn with_projects(self, projects: Vec<Project>) -> Self {
        self.state.lock().unwrap().projects = projects;
        self
    }

    /// Give `address` a ballot with `eligible` votes of which `used` are spent.
    pub fn with_ballot(self, address: Address, eligible: i64, used: i64) -> Self {
        self.set_ballot(
            address,
            Ballot {
                id: Some(format!("ballot-{address}")),
                total_eligible_votes: eligible,
                used_votes: used,
                votes: Vec::new(),
            },
        );
        self
    }

    pub fn set_ballot(&self, address: Address, ballot: Ballot) {
        self.state.lock().unwrap().ballots.insert(address, ballot);
    }

    /// The next `times` calls to `kind` (from any account) fail with `error`.
    pub fn fail_next(&self, kind: CallKind, times: usize, error: ApiError) {
        let mut state = self.state.lock().unwrap();
        let queue = state.scripted.entry(kind).or_default();
        queue.extend(std::iter::repeat(error).take(times));
    }

    /// Every call to `kind` by `address` fails with `error`.
    pub fn fail_always(&self, address: Address, kind: CallKind, error: ApiError) {
        self.state
            .lock()
            .unwrap()
            .persistent
            .insert((address, kind), error);
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn calls_of(&self, kind: CallKind) -> Vec<ApiCall> {
        self.calls().into_iter().filter(|c| c.kind() == kind).collect()
    }

    pub fn ballot_of(&self, address: &Address) -> Option<Ballot> {
        self.state.lock().unwrap().ballots.get(address).cloned()
    }

    /// Highest number of calls that were ever being served at the same time.
    pub fn max_in_flight(&self) -> u64 {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn enter(&self) {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn leave(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    async fn serve<T>(&self, op: impl FnOnce(&mut State) -> Result<T, ApiError>) -> Result<T, ApiError> {
        self.enter().await;
        let result = {
            let mut state = self.state.lock().unwrap();
            op(&mut state)
        };
        self.leave();
        result
    }
}

impl Default for NullVotingApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VotingApi for NullVotingApi {
    async fn challenge(&self, address: &Address) -> Result<String, ApiError> {
        let address = *address;
        self.serve(move |s| {
            s.calls.push(ApiCall::Challenge { address });
            s.injected(address, CallKind::Challenge)?;
            s.next_nonce += 1;
            let nonce = format!("Sign in to vote. Nonce: {:08x}", s.next_nonce);
            s.nonces.insert(address, nonce.clone());
            Ok(nonce)
        })
        .await
    }

    async fn login(&self, address: &Address, signature: &str) -> Result<BearerTokens, ApiError> {
        let address = *address;
        self.serve(move |s| {
            s.calls.push(ApiCall::Login { address });
            s.injected(address, CallKind::Login)?;
            let nonce = s
                .nonces
                .get(&address)
                .ok_or_else(|| rejected(400, "Nonce not requested"))?;
            let signer = signature
                .parse::<PersonalSignature>()
                .ok()
                .and_then(|sig| recover_personal_signer(nonce.as_bytes(), &sig).ok());
            if signer != Some(address) {
                return Err(rejected(401, "Invalid signature"));
            }
            let tokens = BearerTokens::new(format!("access-{address}"), format!("refresh-{address}"));
            s.sessions.insert(tokens.access.clone(), address);
            Ok(tokens)
        })
        .await
    }

    async fn ballot(&self, tokens: &BearerTokens) -> Result<BallotLookup, ApiError> {
        self.serve(|s| {
            let address = s.session(tokens)?;
            s.calls.push(ApiCall::Ballot { address });
            s.injected(address, CallKind::Ballot)?;
            Ok(match s.ballots.get(&address) {
                Some(ballot) => BallotLookup::Found(ballot.clone()),
                None => BallotLookup::NotFound,
            })
        })
        .await
    }

    async fn projects(&self, tokens: &BearerTokens) -> Result<Vec<Project>, ApiError> {
        self.serve(|s| {
            let address = s.session(tokens)?;
            s.calls.push(ApiCall::Projects { address });
            s.injected(address, CallKind::Projects)?;
            Ok(s.projects.clone())
        })
        .await
    }

    async fn cast_vote(
        &self,
        tokens: &BearerTokens,
        project: &ProjectId,
        count: i64,
    ) -> Result<(), ApiError> {
        self.serve(|s| {
            let address = s.session(tokens)?;
            s.calls.push(ApiCall::CastVote {
                address,
                project: project.clone(),
                count,
            });
            s.injected(address, CallKind::CastVote)?;

            let name = s
                .projects
                .iter()
                .find(|p| &p.id == project)
                .map(|p| p.name.clone())
                .ok_or_else(|| rejected(404, "Project not found"))?;
            s.next_vote += 1;
            let vote_id = format!("vote-{}", s.next_vote);

            let ballot = s
                .ballots
                .get_mut(&address)
                .ok_or_else(|| rejected(404, "Ballot not found!"))?;
            if count <= 0 || count > ballot.allowance() {
                return Err(rejected(400, "Not enough votes"));
            }
            ballot.used_votes += count;
            ballot.votes.push(CastVote {
                id: vote_id,
                is_confirmed: false,
                project: VotedProject {
                    id: project.clone(),
                    name,
                    total_votes: 0,
                },
                vote_count: count,
            });
            Ok(())
        })
        .await
    }

    async fn confirm_votes(
        &self,
        tokens: &BearerTokens,
        vote_ids: &[String],
    ) -> Result<(), ApiError> {
        self.serve(|s| {
            let address = s.session(tokens)?;
            s.calls.push(ApiCall::ConfirmVotes {
                address,
                vote_ids: vote_ids.to_vec(),
            });
            s.injected(address, CallKind::ConfirmVotes)?;

            let ballot = s
                .ballots
                .get_mut(&address)
                .ok_or_else(|| rejected(404, "Ballot not found!"))?;
            if vote_ids.iter().any(|id| !ballot.votes.iter().any(|v| &v.id == id)) {
                return Err(rejected(400, "Unknown vote"));
            }
            for vote in &mut ballot.votes {
                if vote_ids.contains(&vote.id) {
                    vote.is_confirmed = true;
                }
            }
            Ok(())
        })
        .await
    }

    async fn delete_vote(&self, tokens: &BearerTokens, project: &ProjectId) -> Result<(), ApiError> {
        self.serve(|s| {
            let address = s.session(tokens)?;
            s.calls.push(ApiCall::DeleteVote {
                address,
                project: project.clone(),
            });
            s.injected(address, CallKind::DeleteVote)?;

            let ballot = s
                .ballots
                .get_mut(&address)
                .ok_or_else(|| rejected(404, "Ballot not found!"))?;
            let before = ballot.votes.len();
            let mut released = 0;
            ballot.votes.retain(|v| {
                let keep = &v.project.id != project;
                if !keep {
                    released += v.vote_count;
                }
                keep
            });
            if ballot.votes.len() == before {
                return Err(rejected(404, "Vote not found"));
            }
            ballot.used_votes -= released;
            Ok(())
        })
        .await
    }
}
