//! Nullable connector: every account shares one scripted service.

use std::sync::{Arc, Mutex};

use retrovote_client::{ApiConnector, ApiError, VotingApi};
use retrovote_network::ProxyEndpoint;

use crate::NullVotingApi;

/// Hands out the same [`NullVotingApi`] for every connection and remembers
/// which proxy each connection asked for.
pub struct NullConnector {
    api: Arc<NullVotingApi>,
    proxies: Mutex<Vec<Option<ProxyEndpoint>>>,
    refuse: Option<ApiError>,
}

impl NullConnector {
    pub fn new(api: Arc<NullVotingApi>) -> Self {
        Self {
            api,
            proxies: Mutex::new(Vec::new()),
            refuse: None,
        }
    }

    /// A connector whose every `connect` fails with `error`.
    pub fn refusing(api: Arc<NullVotingApi>, error: ApiError) -> Self {
        Self {
            refuse: Some(error),
            ..Self::new(api)
        }
    }

    pub fn api(&self) -> &Arc<NullVotingApi> {
        &self.api
    }

    /// Proxies requested so far, in connection order.
    pub fn proxies_seen(&self) -> Vec<Option<ProxyEndpoint>> {
        self.proxies.lock().unwrap().clone()
    }
}

impl ApiConnector for NullConnector {
    fn connect(&self, proxy: Option<&ProxyEndpoint>) -> Result<Arc<dyn VotingApi>, ApiError> {
        self.proxies.lock().unwrap().push(proxy.cloned());
        if let Some(err) = &self.refuse {
            return Err(err.clone());
        }
        Ok(Arc::clone(&self.api) as Arc<dyn VotingApi>)
    }
}
