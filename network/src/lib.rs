//! Outbound network identities for retrovote workers.
//!
//! Proxy lists arrive in many textual shapes; [`parse_proxy`] normalizes them
//! to `scheme://[user:pass@]host:port`, and [`ProxyCycler`] hands them out
//! round-robin to concurrent workers.

pub mod cycler;
pub mod error;
pub mod proxy;

pub use cycler::{load_proxies, ProxyCycler};
pub use error::ProxyError;
pub use proxy::{parse_proxy, ProxyCredentials, ProxyEndpoint, ProxyScheme};
