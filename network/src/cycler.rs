//! Round-robin proxy assignment shared by all workers.

use std::sync::Mutex;

use crate::proxy::{parse_proxy, ProxyEndpoint};

/// Thread-safe round-robin source of proxy endpoints.
///
/// The cursor is the only state mutated concurrently; it is always in
/// `[0, len)` and read-and-advance happens under one lock. An empty cycler
/// yields `None`, meaning "connect directly".
#[derive(Debug)]
pub struct ProxyCycler {
    proxies: Vec<ProxyEndpoint>,
    cursor: Mutex<usize>,
}

impl ProxyCycler {
    pub fn new(proxies: Vec<ProxyEndpoint>) -> Self {
        Self {
            proxies,
            cursor: Mutex::new(0),
        }
    }

    /// A cycler with no proxies: every worker connects directly.
    pub fn direct() -> Self {
        Self::new(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.proxies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }

    /// Return the proxy under the cursor and advance it modulo the list length.
    pub fn next(&self) -> Option<ProxyEndpoint> {
        if self.proxies.is_empty() {
            return None;
        }
        // A poisoned lock still holds a valid index.
        let mut cursor = self.cursor.lock().unwrap_or_else(|e| e.into_inner());
        let proxy = self.proxies[*cursor].clone();
        *cursor = (*cursor + 1) % self.proxies.len();
        Some(proxy)
    }
}

impl Default for ProxyCycler {
    fn default() -> Self {
        Self::direct()
    }
}

/// Normalize a proxy list, logging and skipping lines that do not parse.
pub fn load_proxies<'a, I>(lines: I) -> ProxyCycler
where
    I: IntoIterator<Item = &'a str>,
{
    let mut proxies = Vec::new();
    for (idx, line) in lines.into_iter().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match parse_proxy(line) {
            Ok(p) => proxies.push(p),
            Err(e) => tracing::warn!("proxies line {} skipped: {e}", idx + 1),
        }
    }
    ProxyCycler::new(proxies)
}
