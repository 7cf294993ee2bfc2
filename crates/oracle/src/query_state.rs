//! Per-query planning state.
//!
//! One `QueryState` lives for the planning of one logical query and is
//! threaded through every oracle call made for it. Load-aware oracles read
//! and update it to avoid funnelling all of a query's ranges through one
//! node. It is never shared across queries.

use std::collections::HashMap;
use std::sync::Arc;

use corelib::{NodeId, RangeId, ReplicaDescriptor};
use parking_lot::Mutex;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct QueryState {
    /// How many ranges of this query each node has been handed.
    pub ranges_per_node: HashMap<NodeId, usize>,
    /// Replica each range has been sent to.
    pub assigned_ranges: HashMap<RangeId, ReplicaDescriptor>,
}

impl QueryState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ranges_on(&self, node_id: NodeId) -> usize {
        self.ranges_per_node.get(&node_id).copied().unwrap_or(0)
    }

    pub fn assigned(&self, range_id: RangeId) -> Option<ReplicaDescriptor> {
        self.assigned_ranges.get(&range_id).copied()
    }

    /// Record that `range_id` will be read from `replica`.
    ///
    /// Re-assigning a range moves its count from the old node to the new one,
    /// so `ranges_per_node` always sums to the number of assigned ranges.
    pub fn record(&mut self, range_id: RangeId, replica: ReplicaDescriptor) {
        if let Some(prev) = self.assigned_ranges.insert(range_id, replica) {
            if let Some(count) = self.ranges_per_node.get_mut(&prev.node_id) {
                *count = count.saturating_sub(1);
            }
        }
        *self.ranges_per_node.entry(replica.node_id).or_insert(0) += 1;
    }

    pub fn reset(&mut self) {
        self.ranges_per_node.clear();
        self.assigned_ranges.clear();
    }
}

/// A `QueryState` for planners that fan one query out across threads.
///
/// Each closure passed to [`SharedQueryState::with`] runs under the lock, so
/// an oracle call and its bookkeeping are atomic with respect to the other
/// planning threads of the same query.
#[derive(Debug, Default, Clone)]
pub struct SharedQueryState {
    inner: Arc<Mutex<QueryState>>,
}

impl SharedQueryState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut QueryState) -> R) -> R {
        let mut state = self.inner.lock();
        f(&mut state)
    }

    /// Copy of the current state, for inspection once planning is done.
    pub fn snapshot(&self) -> QueryState {
        self.inner.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corelib::StoreId;

    fn replica(n: u32) -> ReplicaDescriptor {
        ReplicaDescriptor::new(NodeId(n), StoreId(n))
    }

    #[test]
    fn test_record_counts() {
        let mut qs = QueryState::new();
        qs.record(RangeId(1), replica(1));
        qs.record(RangeId(2), replica(1));
        qs.record(RangeId(3), replica(2));

        assert_eq!(qs.ranges_on(NodeId(1)), 2);
        assert_eq!(qs.ranges_on(NodeId(2)), 1);
        assert_eq!(qs.ranges_on(NodeId(3)), 0);
        assert_eq!(qs.assigned(RangeId(3)), Some(replica(2)));
    }

    #[test]
    fn test_reassign_moves_count() {
        let mut qs = QueryState::new();
        qs.record(RangeId(1), replica(1));
        qs.record(RangeId(1), replica(2));

        assert_eq!(qs.ranges_on(NodeId(1)), 0);
        assert_eq!(qs.ranges_on(NodeId(2)), 1);

        qs.reset();
        assert_eq!(qs, QueryState::default());
    }

    #[test]
    fn test_shared_state_across_threads() {
        let shared = SharedQueryState::new();
        std::thread::scope(|s| {
            for t in 0..4u64 {
                let shared = shared.clone();
                s.spawn(move || {
                    for i in 0..25u64 {
                        shared.with(|qs| qs.record(RangeId(t * 100 + i), replica((i % 3) as u32)));
                    }
                });
            }
        });

        let qs = shared.snapshot();
        assert_eq!(qs.assigned_ranges.len(), 100);
        assert_eq!(qs.ranges_per_node.values().sum::<usize>(), 100);
    }
}
