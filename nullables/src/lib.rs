//! Nullable infrastructure for deterministic testing.
//!
//! The remote voting service is abstracted behind
//! [`retrovote_client::VotingApi`]. This crate provides an in-memory
//! implementation that:
//! - Verifies login signatures and issues per-account tokens
//! - Keeps per-account ballots and a shared project list
//! - Records every call for assertions
//! - Can inject transient or persistent failures and artificial latency
//!
//! Usage: hand a [`NullConnector`] to the dispatcher instead of the HTTP one.

pub mod connector;
pub mod voting_api;

pub use connector::NullConnector;
pub use voting_api::{ApiCall, CallKind, NullVotingApi};
