//! The three per-account workflows: record, vote and delete.
//!
//! Each runs on an [`AuthenticatedSession`]; [`run_workflow`] authenticates
//! first and then dispatches on [`WorkflowKind`].

use std::fmt;

use rand::Rng;
use retrovote_client::{RetryPolicy, VotingApi};
use retrovote_crypto::Account;
use retrovote_types::{BallotLookup, WorkflowKind};

use crate::distribution::distribute;
use crate::recorder::EligibilityRecorder;
use crate::session::{AuthenticatedSession, Session};
use crate::WorkflowError;

/// What a successful workflow did, for logging and run statistics.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WorkflowOutcome {
    Recorded {
        eligible: i64,
        used: i64,
        unconfirmed: usize,
    },
    Voted {
        allocated: usize,
        cast: usize,
        failed: usize,
        confirmed: usize,
    },
    Deleted {
        deleted: usize,
        failed: usize,
    },
}

impl fmt::Display for WorkflowOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Recorded {
                eligible,
                used,
                unconfirmed,
            } => write!(
                f,
                "recorded (eligible {eligible}, used {used}, unconfirmed {unconfirmed})"
            ),
            Self::Voted {
                allocated,
                cast,
                failed,
                confirmed,
            } => write!(
                f,
                "voted for {cast}/{allocated} projects ({failed} failed), confirmed {confirmed} votes"
            ),
            Self::Deleted { deleted, failed } => {
                write!(f, "deleted {deleted} votes ({failed} failed)")
            }
        }
    }
}

/// Shared collaborators a workflow may need besides its session.
pub struct WorkflowDeps<'a> {
    pub recorder: &'a dyn EligibilityRecorder,
}

/// Authenticate `account` and run `kind` on it.
pub async fn run_workflow<R>(
    kind: WorkflowKind,
    account: &Account,
    api: &dyn VotingApi,
    retry: &RetryPolicy,
    deps: WorkflowDeps<'_>,
    rng: &mut R,
) -> Result<WorkflowOutcome, WorkflowError>
where
    R: Rng + Send + ?Sized,
{
    let session = Session::new(account, api, retry).authenticate().await?;
    match kind {
        WorkflowKind::Record => record_eligibility(&session, deps.recorder).await,
        WorkflowKind::Vote => vote(&session, rng).await,
        WorkflowKind::Delete => delete_votes(&session).await,
    }
}

fn log_ballot(session: &AuthenticatedSession<'_>, ballot: &BallotLookup) {
    tracing::info!(
        "{} | eligible votes: {} | already used: {} | available: {}",
        session.address(),
        ballot.eligible(),
        ballot.used(),
        ballot.allowance()
    );
}

/// Export the account if it has any eligible votes.
pub async fn record_eligibility(
    session: &AuthenticatedSession<'_>,
    recorder: &dyn EligibilityRecorder,
) -> Result<WorkflowOutcome, WorkflowError> {
    let address = session.address();
    let ballot = session.ballot().await?;
    log_ballot(session, &ballot);

    if ballot.eligible() <= 0 {
        return Err(WorkflowError::NoAvailableVotes);
    }

    recorder.record(&address, &session.account().secret_hex())?;

    let unconfirmed = ballot.unconfirmed_vote_ids().len();
    if unconfirmed > 0 {
        tracing::info!("{address} | {unconfirmed} unconfirmed votes");
    } else {
        tracing::info!("{address} | no unconfirmed votes");
    }

    Ok(WorkflowOutcome::Recorded {
        eligible: ballot.eligible(),
        used: ballot.used(),
        unconfirmed,
    })
}

/// Spend the remaining allowance across a random subset of projects, then
/// confirm every unconfirmed vote in one request.
///
/// A vote that still fails after the retry policy gives up is logged and
/// skipped; confirmation covers whatever the server recorded.
pub async fn vote<R>(
    session: &AuthenticatedSession<'_>,
    rng: &mut R,
) -> Result<WorkflowOutcome, WorkflowError>
where
    R: Rng + Send + ?Sized,
{
    let address = session.address();
    let ballot = session.ballot().await?;
    log_ballot(session, &ballot);

    let allowance = ballot.allowance();
    if allowance <= 0 {
        return Err(WorkflowError::NoAvailableVotes);
    }

    let projects = session.projects().await?;
    let allocation = distribute(allowance, &projects, rng).ok_or(WorkflowError::NoProjects)?;
    let total = allocation.len();

    let mut cast = 0;
    for (i, entry) in allocation.iter().enumerate() {
        match session.cast_vote(&entry.project, entry.count).await {
            Ok(()) => {
                cast += 1;
                tracing::info!(
                    "{address} | [{}/{total}] voted for {}: {} votes",
                    i + 1,
                    entry.project,
                    entry.count
                );
            }
            Err(e) => tracing::error!(
                "{address} | [{}/{total}] vote for {} failed: {e}",
                i + 1,
                entry.project
            ),
        }
    }

    let pending = session.ballot().await?.unconfirmed_vote_ids();
    if pending.is_empty() {
        return Err(WorkflowError::NoUnconfirmedVotes);
    }
    session.confirm_votes(&pending).await?;
    tracing::info!("{address} | confirmed {} votes", pending.len());

    Ok(WorkflowOutcome::Voted {
        allocated: total,
        cast,
        failed: total - cast,
        confirmed: pending.len(),
    })
}

/// Withdraw every vote on the ballot, one project at a time.
///
/// An account with no ballot or no votes succeeds without doing anything.
pub async fn delete_votes(
    session: &AuthenticatedSession<'_>,
) -> Result<WorkflowOutcome, WorkflowError> {
    let address = session.address();
    let ballot = session.ballot().await?;
    let votes = ballot.votes();
    if votes.is_empty() {
        tracing::info!("{address} | no votes to delete");
        return Ok(WorkflowOutcome::Deleted {
            deleted: 0,
            failed: 0,
        });
    }

    let total = votes.len();
    let mut deleted = 0;
    for (i, vote) in votes.iter().enumerate() {
        let project = &vote.project.id;
        match session.delete_vote(project).await {
            Ok(()) => {
                deleted += 1;
                tracing::info!(
                    "{address} | [{}/{total}] deleted {} votes for {project}",
                    i + 1,
                    vote.vote_count
                );
            }
            Err(e) => tracing::error!(
                "{address} | [{}/{total}] failed to delete vote for {project}: {e}",
                i + 1
            ),
        }
    }

    Ok(WorkflowOutcome::Deleted {
        deleted,
        failed: total - deleted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::MemoryRecorder;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use retrovote_client::ApiError;
    use retrovote_nullables::{ApiCall, CallKind, NullVotingApi};
    use retrovote_types::{Ballot, CastVote, Project, ProjectId, VotedProject};

    const KEY: &str = "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

    fn projects(n: usize) -> Vec<Project> {
        (0..n)
            .map(|i| Project::new(format!("p{i}"), format!("Project {i}")))
            .collect()
    }

    async fn run(
        kind: WorkflowKind,
        account: &Account,
        api: &NullVotingApi,
        recorder: &MemoryRecorder,
    ) -> Result<WorkflowOutcome, WorkflowError> {
        let retry = RetryPolicy::bounded(5);
        let mut rng = StdRng::seed_from_u64(11);
        run_workflow(
            kind,
            account,
            api,
            &retry,
            WorkflowDeps { recorder },
            &mut rng,
        )
        .await
    }

    #[tokio::test]
    async fn vote_spends_allowance_and_confirms() {
        let account = Account::from_secret(KEY).unwrap();
        let api = NullVotingApi::new()
            .with_projects(projects(3))
            .with_ballot(account.address(), 10, 3);

        let outcome = run(WorkflowKind::Vote, &account, &api, &MemoryRecorder::new())
            .await
            .unwrap();
        assert_eq!(
            outcome,
            WorkflowOutcome::Voted {
                allocated: 3,
                cast: 3,
                failed: 0,
                confirmed: 3
            }
        );

        let ballot = api.ballot_of(&account.address()).unwrap();
        assert_eq!(ballot.allowance(), 0);
        assert!(ballot.unconfirmed_vote_ids().is_empty());
    }

    #[tokio::test]
    async fn vote_continues_past_a_failed_cast() {
        let account = Account::from_secret(KEY).unwrap();
        let api = NullVotingApi::new()
            .with_projects(projects(3))
            .with_ballot(account.address(), 9, 0);
        // The first cast is rejected fatally; the other two go through.
        api.fail_next(CallKind::CastVote, 1, ApiError::Payload("bad".into()));

        let outcome = run(WorkflowKind::Vote, &account, &api, &MemoryRecorder::new())
            .await
            .unwrap();
        match outcome {
            WorkflowOutcome::Voted {
                cast,
                failed,
                confirmed,
                ..
            } => {
                assert_eq!((cast, failed, confirmed), (2, 1, 2));
            }
            other => panic!("unexpected outcome {other}"),
        }
        assert_eq!(api.calls_of(CallKind::ConfirmVotes).len(), 1);
    }

    #[tokio::test]
    async fn vote_without_allowance_or_ballot() {
        let account = Account::from_secret(KEY).unwrap();
        let spent = NullVotingApi::new()
            .with_projects(projects(3))
            .with_ballot(account.address(), 5, 5);
        assert!(matches!(
            run(WorkflowKind::Vote, &account, &spent, &MemoryRecorder::new()).await,
            Err(WorkflowError::NoAvailableVotes)
        ));

        let missing = NullVotingApi::new().with_projects(projects(3));
        assert!(matches!(
            run(WorkflowKind::Vote, &account, &missing, &MemoryRecorder::new()).await,
            Err(WorkflowError::NoAvailableVotes)
        ));
        assert!(missing.calls_of(CallKind::Projects).is_empty());
    }

    #[tokio::test]
    async fn vote_without_projects() {
        let account = Account::from_secret(KEY).unwrap();
        let api = NullVotingApi::new().with_ballot(account.address(), 5, 0);
        assert!(matches!(
            run(WorkflowKind::Vote, &account, &api, &MemoryRecorder::new()).await,
            Err(WorkflowError::NoProjects)
        ));
        assert!(api.calls_of(CallKind::CastVote).is_empty());
    }

    #[tokio::test]
    async fn vote_with_nothing_left_to_confirm() {
        let account = Account::from_secret(KEY).unwrap();
        let api = NullVotingApi::new()
            .with_projects(projects(1))
            .with_ballot(account.address(), 4, 0);
        api.fail_always(
            account.address(),
            CallKind::CastVote,
            ApiError::Payload("bad".into()),
        );
        assert!(matches!(
            run(WorkflowKind::Vote, &account, &api, &MemoryRecorder::new()).await,
            Err(WorkflowError::NoUnconfirmedVotes)
        ));
    }

    #[tokio::test]
    async fn record_exports_eligible_accounts() {
        let account = Account::from_secret(KEY).unwrap();
        let api = NullVotingApi::new().with_ballot(account.address(), 12, 12);
        let recorder = MemoryRecorder::new();

        let outcome = run(WorkflowKind::Record, &account, &api, &recorder)
            .await
            .unwrap();
        assert_eq!(
            outcome,
            WorkflowOutcome::Recorded {
                eligible: 12,
                used: 12,
                unconfirmed: 0
            }
        );
        assert_eq!(recorder.recorded(), vec![account.address()]);
    }

    #[tokio::test]
    async fn record_rejects_ineligible_accounts() {
        let account = Account::from_secret(KEY).unwrap();
        let api = NullVotingApi::new();
        let recorder = MemoryRecorder::new();

        assert!(matches!(
            run(WorkflowKind::Record, &account, &api, &recorder).await,
            Err(WorkflowError::NoAvailableVotes)
        ));
        assert!(recorder.recorded().is_empty());
    }

    #[tokio::test]
    async fn delete_withdraws_every_vote() {
        let account = Account::from_secret(KEY).unwrap();
        let address = account.address();
        let api = NullVotingApi::new().with_projects(projects(2));
        api.set_ballot(
            address,
            Ballot {
                id: Some("b".into()),
                total_eligible_votes: 6,
                used_votes: 6,
                votes: ["p0", "p1"]
                    .iter()
                    .enumerate()
                    .map(|(i, p)| CastVote {
                        id: format!("v{i}"),
                        is_confirmed: true,
                        project: VotedProject {
                            id: ProjectId::new(*p),
                            name: String::new(),
                            total_votes: 0,
                        },
                        vote_count: 3,
                    })
                    .collect(),
            },
        );

        let outcome = run(WorkflowKind::Delete, &account, &api, &MemoryRecorder::new())
            .await
            .unwrap();
        assert_eq!(outcome, WorkflowOutcome::Deleted { deleted: 2, failed: 0 });
        assert_eq!(api.ballot_of(&address).unwrap().allowance(), 6);

        let deleted: Vec<_> = api
            .calls_of(CallKind::DeleteVote)
            .into_iter()
            .map(|c| match c {
                ApiCall::DeleteVote { project, .. } => project,
                other => panic!("unexpected call {other:?}"),
            })
            .collect();
        assert_eq!(deleted, vec![ProjectId::new("p0"), ProjectId::new("p1")]);
    }

    #[tokio::test]
    async fn delete_is_a_noop_without_votes() {
        let account = Account::from_secret(KEY).unwrap();
        let api = NullVotingApi::new();
        let outcome = run(WorkflowKind::Delete, &account, &api, &MemoryRecorder::new())
            .await
            .unwrap();
        assert_eq!(outcome, WorkflowOutcome::Deleted { deleted: 0, failed: 0 });
        assert!(api.calls_of(CallKind::DeleteVote).is_empty());
    }
}
