//! Fans one workflow out over every account through a [`WorkerPool`].

use std::sync::Arc;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::SeedableRng;
use retrovote_client::{ApiConnector, RetryPolicy};
use retrovote_crypto::Account;
use retrovote_network::ProxyCycler;
use retrovote_types::{Address, WorkflowKind};
use retrovote_utils::{format_elapsed, StatsCounter};

use crate::pool::WorkerPool;
use crate::recorder::EligibilityRecorder;
use crate::workflows::{run_workflow, WorkflowDeps, WorkflowOutcome};
use crate::{DispatchError, WorkflowError};

pub const STAT_ACCOUNTS: &str = "accounts";
pub const STAT_SUCCEEDED: &str = "succeeded";
pub const STAT_FAILED: &str = "failed";
pub const STAT_VOTES_CAST: &str = "votes_cast";
pub const STAT_VOTES_CONFIRMED: &str = "votes_confirmed";
pub const STAT_VOTES_DELETED: &str = "votes_deleted";
pub const STAT_RECORDED: &str = "recorded";

const STAT_NAMES: &[&str] = &[
    STAT_ACCOUNTS,
    STAT_SUCCEEDED,
    STAT_FAILED,
    STAT_VOTES_CAST,
    STAT_VOTES_CONFIRMED,
    STAT_VOTES_DELETED,
    STAT_RECORDED,
];

/// Everything a run shares between workers.
pub struct RunContext {
    pub connector: Arc<dyn ApiConnector>,
    pub proxies: Arc<ProxyCycler>,
    pub retry: RetryPolicy,
    pub recorder: Arc<dyn EligibilityRecorder>,
    /// Fixed seed for reproducible allocations; account `i` uses `seed + i`.
    pub seed: Option<u64>,
}

impl RunContext {
    fn rng_for(&self, index: usize) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(index as u64)),
            None => StdRng::from_entropy(),
        }
    }
}

#[derive(Debug)]
pub struct AccountFailure {
    pub address: Address,
    pub error: WorkflowError,
}

/// Aggregated result of one dispatch.
#[derive(Debug)]
pub struct RunReport {
    pub workflow: WorkflowKind,
    pub total: usize,
    pub succeeded: usize,
    /// One entry per failed account, in input order.
    pub failures: Vec<AccountFailure>,
}

impl RunReport {
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct Dispatcher {
    pool: WorkerPool,
    context: Arc<RunContext>,
    stats: Arc<StatsCounter>,
}

impl Dispatcher {
    pub fn new(context: RunContext, concurrency: usize) -> Result<Self, DispatchError> {
        Ok(Self {
            pool: WorkerPool::new(concurrency)?,
            context: Arc::new(context),
            stats: Arc::new(StatsCounter::new(STAT_NAMES)),
        })
    }

    pub fn concurrency(&self) -> usize {
        self.pool.limit()
    }

    pub fn stats(&self) -> &StatsCounter {
        &self.stats
    }

    /// Run `workflow` once per account and wait for every account to finish.
    ///
    /// A failing (or panicking) account never affects the others.
    pub async fn run(&self, workflow: WorkflowKind, accounts: Vec<Account>) -> RunReport {
        let started = Instant::now();
        let addresses: Vec<Address> = accounts.iter().map(Account::address).collect();
        let total = accounts.len();
        tracing::info!(
            "starting {} for {total} accounts with {} workers",
            workflow.label(),
            self.pool.limit()
        );

        let results = self
            .pool
            .run(accounts, |index, account| {
                let context = Arc::clone(&self.context);
                let stats = Arc::clone(&self.stats);
                async move { run_account(workflow, index, account, &context, &stats).await }
            })
            .await;

        let mut succeeded = 0;
        let mut failures = Vec::new();
        for (address, result) in addresses.into_iter().zip(results) {
            match result {
                Ok(Ok(())) => succeeded += 1,
                Ok(Err(error)) => failures.push(AccountFailure { address, error }),
                Err(panic) => {
                    tracing::error!("{address} | worker panicked: {panic}");
                    self.stats.increment(STAT_FAILED);
                    failures.push(AccountFailure {
                        address,
                        error: WorkflowError::Panicked(panic),
                    });
                }
            }
        }

        tracing::info!(
            "{} finished in {}: {succeeded}/{total} succeeded ({})",
            workflow.label(),
            format_elapsed(started.elapsed()),
            self.stats.summary()
        );
        RunReport {
            workflow,
            total,
            succeeded,
            failures,
        }
    }
}

async fn run_account(
    workflow: WorkflowKind,
    index: usize,
    account: Account,
    context: &RunContext,
    stats: &StatsCounter,
) -> Result<(), WorkflowError> {
    let address = account.address();
    stats.increment(STAT_ACCOUNTS);

    let proxy = context.proxies.next();
    if let Some(proxy) = &proxy {
        tracing::debug!("{address} | using proxy {}", proxy.redacted());
    }

    let result = match context.connector.connect(proxy.as_ref()) {
        Ok(api) => {
            let mut rng = context.rng_for(index);
            let deps = WorkflowDeps {
                recorder: context.recorder.as_ref(),
            };
            run_workflow(workflow, &account, api.as_ref(), &context.retry, deps, &mut rng).await
        }
        Err(e) => Err(WorkflowError::Api(e)),
    };

    match &result {
        Ok(outcome) => {
            stats.increment(STAT_SUCCEEDED);
            tally(stats, outcome);
            tracing::info!("{address} | {outcome}");
        }
        Err(e) => {
            stats.increment(STAT_FAILED);
            tracing::error!("{address} | {e}");
        }
    }
    result.map(drop)
}

fn tally(stats: &StatsCounter, outcome: &WorkflowOutcome) {
    match outcome {
        WorkflowOutcome::Recorded { .. } => stats.increment(STAT_RECORDED),
        WorkflowOutcome::Voted {
            cast, confirmed, ..
        } => {
            stats.add(STAT_VOTES_CAST, *cast as u64);
            stats.add(STAT_VOTES_CONFIRMED, *confirmed as u64);
        }
        WorkflowOutcome::Deleted { deleted, .. } => {
            stats.add(STAT_VOTES_DELETED, *deleted as u64)
        }
    }
}
