//! Retrovote engine: everything that happens to an account after it is loaded.
//!
//! - [`session`]: challenge / sign / login state machine with retry
//! - [`distribution`]: exact random split of an allowance across projects
//! - [`workflows`]: record, vote and delete, each on an authenticated session
//! - [`pool`] and [`dispatcher`]: bounded fan-out over all accounts with
//!   per-account failure isolation
//! - [`config`]: TOML run configuration

pub mod config;
pub mod dispatcher;
pub mod distribution;
pub mod error;
pub mod pool;
pub mod recorder;
pub mod session;
pub mod workflows;

pub use config::{RetrySettings, RunConfig};
pub use dispatcher::{AccountFailure, Dispatcher, RunContext, RunReport};
pub use distribution::distribute;
pub use error::{ConfigError, DispatchError, WorkflowError};
pub use pool::WorkerPool;
pub use recorder::{EligibilityRecorder, FileRecorder, MemoryRecorder};
pub use session::{AuthenticatedSession, Session, SessionState};
pub use workflows::{run_workflow, WorkflowDeps, WorkflowOutcome};
