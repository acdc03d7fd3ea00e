//! Client side of the remote voting service.
//!
//! Design:
//! - Every response is a JSON envelope `{statusCode, message, data, metadata, error}`
//!   decoded by [`Envelope`]; each endpoint then checks its own success predicate
//!   and decodes `data` into a typed value with required fields.
//! - [`VotingApi`] is the object-safe contract the workflows are written against;
//!   [`HttpVotingApi`] talks to the real service, test doubles live in
//!   `retrovote-nullables`.
//! - [`RetryPolicy`] wraps every call site. The default retries transient
//!   failures forever with no delay.

pub mod api;
pub mod cookies;
pub mod envelope;
pub mod error;
pub mod http;
pub mod retry;

pub use api::{ApiConnector, VotingApi};
pub use cookies::{extract_cookie_value, BearerTokens};
pub use envelope::{Envelope, NonceData, MSG_BALLOT_NOT_FOUND, MSG_VOTES_CONFIRMED, MSG_VOTE_DELETED, MSG_VOTING_SUCCESSFUL};
pub use error::ApiError;
pub use http::{HttpApiConfig, HttpConnector, HttpVotingApi};
pub use retry::RetryPolicy;
