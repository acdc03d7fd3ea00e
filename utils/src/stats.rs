//! Named counters shared between concurrent workers.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// A fixed set of named counters, safe to bump from many tasks at once.
///
/// Names are registered up front; bumping an unregistered name is a no-op so
/// call sites never need to handle a missing counter.
#[derive(Debug)]
pub struct StatsCounter {
    counters: BTreeMap<&'static str, AtomicU64>,
}

impl StatsCounter {
    pub fn new(names: &[&'static str]) -> Self {
        Self {
            counters: names.iter().map(|&n| (n, AtomicU64::new(0))).collect(),
        }
    }

    pub fn increment(&self, name: &str) {
        self.add(name, 1);
    }

    pub fn add(&self, name: &str, value: u64) {
        if let Some(counter) = self.counters.get(name) {
            counter.fetch_add(value, Ordering::Relaxed);
        }
    }

    pub fn get(&self, name: &str) -> u64 {
        self.counters
            .get(name)
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Current values in name order.
    pub fn snapshot(&self) -> Vec<(&'static str, u64)> {
        self.counters
            .iter()
            .map(|(&k, v)| (k, v.load(Ordering::Relaxed)))
            .collect()
    }

    /// `name=value` pairs joined by spaces, in name order.
    pub fn summary(&self) -> String {
        self.snapshot()
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn unknown_names_are_ignored() {
        let stats = StatsCounter::new(&["cast"]);
        stats.increment("missing");
        assert_eq!(stats.get("missing"), 0);
        assert_eq!(stats.get("cast"), 0);
    }

    #[test]
    fn summary_is_sorted() {
        let stats = StatsCounter::new(&["deleted", "cast"]);
        stats.add("cast", 3);
        stats.increment("deleted");
        assert_eq!(stats.summary(), "cast=3 deleted=1");
    }

    #[test]
    fn concurrent_increments_are_not_lost() {
        let stats = Arc::new(StatsCounter::new(&["hits"]));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let s = Arc::clone(&stats);
                std::thread::spawn(move || {
                    for _ in 0..1_000 {
                        s.increment("hits");
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(stats.get("hits"), 8_000);
    }
}
