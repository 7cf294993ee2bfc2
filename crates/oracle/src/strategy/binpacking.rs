//! Load-aware replica selection.
//!
//! Ranks replicas like [`ClosestOracle`], but when several are equally close
//! it sends the range to whichever node has received the fewest ranges of the
//! current query so far. Parallel execution then fans out across nodes
//! instead of funnelling through the single closest one.
//!
//! # Algorithm (with a query state)
//!
//! 1. Strong reads go to the leaseholder.
//! 2. A range already assigned earlier in this query keeps its replica.
//! 3. Follower reads prefer the leaseholder until its node has
//!    `max_ranges_per_node` ranges of this query.
//! 4. Otherwise take the replicas tied on proximity (resolution, locality,
//!    latency) and pick the least loaded, then self, then lowest id.
//! 5. Record the pick.
//!
//! Without a query state there is no load to balance and the result is
//! exactly what `ClosestOracle` would choose.

use std::sync::Arc;

use corelib::{RangeDescriptor, ReplicaDescriptor};

use crate::config::Config;
use crate::error::{OracleError, Result};
use crate::policy::{Policy, ReadPolicy, TxnHint};
use crate::query_state::QueryState;
use crate::strategy::{
    finish, member_leaseholder, random, replicas_of, required_leaseholder, Choice, ClosestOracle, Oracle,
};

#[derive(Clone)]
pub struct BinPackingOracle {
    closest: ClosestOracle,
    max_ranges_per_node: usize,
}

impl BinPackingOracle {
    pub fn new(cfg: &Config) -> Result<Self> {
        if cfg.max_ranges_per_node == 0 {
            return Err(OracleError::InvalidConfig(
                "max_ranges_per_node must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            closest: ClosestOracle::for_policy(Policy::BIN_PACKING_CHOICE, cfg)?,
            max_ranges_per_node: cfg.max_ranges_per_node,
        })
    }

    /// Registry constructor.
    pub fn constructor(cfg: &Config) -> Result<Arc<dyn Oracle>> {
        Ok(Arc::new(Self::new(cfg)?))
    }

    fn choose(
        &self,
        desc: &RangeDescriptor,
        replicas: &[ReplicaDescriptor],
        leaseholder: Option<&ReplicaDescriptor>,
        read_policy: ReadPolicy,
        qs: &QueryState,
    ) -> Choice {
        if let Some(lh) = required_leaseholder(desc, leaseholder, read_policy) {
            return Choice::Leaseholder(lh);
        }

        if let Some(prev) = qs.assigned(desc.range_id).filter(|r| desc.contains(r)) {
            return Choice::Reused(prev);
        }

        if let Some(lh) = member_leaseholder(desc, leaseholder) {
            if qs.ranges_on(lh.node_id) < self.max_ranges_per_node {
                return Choice::Leaseholder(lh);
            }
        }

        let ranks = self.closest.ranked(replicas);
        match ranks.first() {
            Some(best) if best.is_resolved() => {
                let target = best.proximity();
                ranks
                    .iter()
                    .take_while(|r| r.proximity() == target)
                    .min_by_key(|r| (qs.ranges_on(r.replica.node_id), !r.is_self(), r.replica))
                    .map_or(Choice::Best(best.replica), |r| Choice::Best(r.replica))
            }
            _ => Choice::Fallback(least_loaded(replicas, qs)),
        }
    }
}

/// Random pick among the replicas on the least loaded nodes.
fn least_loaded(replicas: &[ReplicaDescriptor], qs: &QueryState) -> ReplicaDescriptor {
    let min_load = replicas
        .iter()
        .map(|r| qs.ranges_on(r.node_id))
        .min()
        .unwrap_or(0);
    let candidates: Vec<ReplicaDescriptor> = replicas
        .iter()
        .filter(|r| qs.ranges_on(r.node_id) == min_load)
        .copied()
        .collect();
    random::pick(&candidates)
}

impl Oracle for BinPackingOracle {
    fn choose_preferred_replica(
        &self,
        txn: Option<&TxnHint>,
        desc: &RangeDescriptor,
        leaseholder: Option<&ReplicaDescriptor>,
        read_policy: ReadPolicy,
        query_state: Option<&mut QueryState>,
    ) -> Result<ReplicaDescriptor> {
        let replicas = replicas_of(desc)?;
        let Some(qs) = query_state else {
            let choice = self.closest.choose(desc, replicas, leaseholder, read_policy);
            return Ok(finish(self.policy(), txn, desc, choice));
        };

        let choice = self.choose(desc, replicas, leaseholder, read_policy, qs);
        if !matches!(choice, Choice::Reused(_)) {
            qs.record(desc.range_id, choice.replica());
        }
        Ok(finish(self.policy(), txn, desc, choice))
    }

    fn policy(&self) -> Policy {
        Policy::BIN_PACKING_CHOICE
    }
}
