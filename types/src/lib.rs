//! Domain types for retrovote.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! account addresses, projects, ballots, vote allocations, and the workflow selector.

pub mod address;
pub mod allocation;
pub mod ballot;
pub mod error;
pub mod project;
pub mod workflow;

mod wire;

pub use address::Address;
pub use allocation::{AllocationEntry, VoteAllocation};
pub use ballot::{Ballot, BallotLookup, CastVote, VotedProject};
pub use error::TypesError;
pub use project::{Project, ProjectId};
pub use workflow::WorkflowKind;
