//! Node pool: selection policy over per-node backoff state.
//!
//! # Data Flow
//! ```text
//! dispatcher retry loop
//!     → select(now): round-robin over eligible nodes,
//!       else soonest-available fallback
//!     → attempt issued by the dispatcher
//!     → report_outcome(index, success, now)
//!         → backoff.rs (record_success / record_failure)
//! ```
//!
//! # Design Decisions
//! - Selection never fails: a pool always has at least one node, and when
//!   every node is backed off the soonest-available one is returned so the
//!   dispatcher keeps making forward progress
//! - Backoff state is per node and atomic; concurrent dispatch calls share
//!   the pool without a global lock
//! - The round-robin cursor is a single atomic counter

pub mod backoff;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::config::loader::ConfigError;
use crate::config::validation::ValidationError;
use crate::node::NodeHandle;
use crate::pool::backoff::{BackoffPolicy, BackoffTracker};

struct NodeSlot {
    handle: Arc<NodeHandle>,
    backoff: BackoffTracker,
}

/// Owns every node handle and its backoff tracker.
pub struct NodePool {
    slots: Vec<NodeSlot>,
    cursor: AtomicUsize,
}

impl NodePool {
    /// Build a pool. An empty node list is a configuration error, surfaced
    /// here rather than at selection time.
    pub fn new(handles: Vec<NodeHandle>, policy: BackoffPolicy) -> Result<Self, ConfigError> {
        if handles.is_empty() {
            return Err(ConfigError::Validation(vec![ValidationError::NoNodes]));
        }

        let epoch = Instant::now();
        let slots = handles
            .into_iter()
            .map(|handle| NodeSlot {
                handle: Arc::new(handle),
                backoff: BackoffTracker::new(epoch, policy),
            })
            .collect();

        Ok(Self {
            slots,
            cursor: AtomicUsize::new(0),
        })
    }

    /// Number of nodes in the pool.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Select the next node to try. Round-robin across eligible nodes; when
    /// all are backed off, the one whose window expires soonest.
    pub fn select(&self, now: Instant) -> (usize, Arc<NodeHandle>) {
        let len = self.slots.len();
        let start = self.cursor.fetch_add(1, Ordering::Relaxed);

        for i in 0..len {
            let index = (start + i) % len;
            if self.slots[index].backoff.is_eligible(now) {
                return (index, self.slots[index].handle.clone());
            }
        }

        // All nodes backed off: least-bad option.
        let index = (0..len)
            .min_by_key(|&i| self.slots[i].backoff.blocked_until_ms())
            .unwrap_or(0);
        (index, self.slots[index].handle.clone())
    }

    /// Feed an attempt's outcome back into the node's backoff state.
    pub fn report_outcome(&self, index: usize, success: bool, now: Instant) {
        let backoff = &self.slots[index].backoff;
        if success {
            backoff.record_success(now);
        } else {
            backoff.record_failure(now);
        }
    }

    /// Consecutive-failure count for one node.
    pub fn failure_count(&self, index: usize) -> u32 {
        self.slots[index].backoff.failure_count()
    }

    /// Whether one node is currently eligible for selection.
    pub fn is_eligible(&self, index: usize, now: Instant) -> bool {
        self.slots[index].backoff.is_eligible(now)
    }

    /// Time left until one node becomes eligible; zero if it already is.
    pub fn eligible_in(&self, index: usize, now: Instant) -> std::time::Duration {
        self.slots[index].backoff.eligible_in(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::NodeConfig;
    use reqwest::Client;
    use std::time::Duration;

    fn pool(count: usize, policy: BackoffPolicy) -> NodePool {
        let client = Client::new();
        let handles = (0..count)
            .map(|i| {
                NodeHandle::from_config(
                    &NodeConfig {
                        endpoint: format!("http://127.0.0.1:{}", 9984 + i),
                        headers: Default::default(),
                    },
                    client.clone(),
                )
                .unwrap()
            })
            .collect();
        NodePool::new(handles, policy).unwrap()
    }

    fn test_policy() -> BackoffPolicy {
        BackoffPolicy {
            base: Duration::from_millis(100),
            max: Duration::from_millis(400),
        }
    }

    #[test]
    fn empty_pool_is_rejected() {
        let result = NodePool::new(Vec::new(), BackoffPolicy::default());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn selection_rotates_through_eligible_nodes() {
        let pool = pool(3, test_policy());
        let now = Instant::now();

        assert_eq!(pool.select(now).0, 0);
        assert_eq!(pool.select(now).0, 1);
        assert_eq!(pool.select(now).0, 2);
        assert_eq!(pool.select(now).0, 0);
    }

    #[test]
    fn backed_off_nodes_are_skipped() {
        let pool = pool(3, test_policy());
        let now = Instant::now();

        pool.report_outcome(0, false, now);
        assert!(!pool.is_eligible(0, now));

        for _ in 0..6 {
            assert_ne!(pool.select(now).0, 0);
        }
    }

    #[test]
    fn all_blocked_falls_back_to_soonest_available() {
        let pool = pool(3, test_policy());
        let now = Instant::now();

        pool.report_outcome(0, false, now); // blocked for 100ms
        pool.report_outcome(0, false, now); // blocked for 200ms
        pool.report_outcome(1, false, now); // blocked for 100ms
        pool.report_outcome(2, false, now); // blocked for 100ms
        pool.report_outcome(2, false, now); // blocked for 200ms
        pool.report_outcome(2, false, now); // blocked for 400ms

        let (index, _) = pool.select(now);
        assert_eq!(index, 1);
    }

    #[test]
    fn success_makes_a_node_eligible_again() {
        let pool = pool(2, test_policy());
        let now = Instant::now();

        pool.report_outcome(0, false, now);
        pool.report_outcome(0, false, now);
        assert_eq!(pool.failure_count(0), 2);
        assert!(!pool.is_eligible(0, now));

        pool.report_outcome(0, true, now);
        assert_eq!(pool.failure_count(0), 0);
        assert!(pool.is_eligible(0, now));
    }
}
