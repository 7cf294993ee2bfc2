//! Closest-replica selection.
//!
//! # Ranking
//!
//! Every candidate gets a [`ReplicaRank`]; the smallest rank wins. Keys are
//! compared in order:
//!
//! 1. Resolved before unresolved. A replica whose node descriptor gossip has
//!    not delivered yet stays a candidate, just the least preferred one.
//! 2. Deeper locality match with the planning node.
//! 3. Valid latency estimate before none, lower latency first. An invalid
//!    estimate is never read as zero.
//! 4. The planning node itself.
//! 5. Lowest node id, then store id, so the result does not depend on the
//!    order replicas are listed in.
//!
//! Locality strictly dominates latency: a same-region replica behind a slow
//! link still beats a fast replica in another region.
//!
//! If no candidate resolves at all, selection degrades to random.

use std::cmp::Reverse;
use std::sync::Arc;
use std::time::Duration;

use corelib::{LatencyEstimator, Locality, NodeDescStore, NodeId, RangeDescriptor, ReplicaDescriptor};

use crate::config::Config;
use crate::error::{OracleError, Result};
use crate::policy::{Policy, ReadPolicy, TxnHint};
use crate::query_state::QueryState;
use crate::strategy::{finish, random, replicas_of, required_leaseholder, Choice, Oracle};

/// Latency component of a rank. `Known` sorts before `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum LatencyRank {
    Known(Duration),
    Unknown,
}

/// Sort key of one candidate; smaller is better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct ReplicaRank {
    unresolved: bool,
    locality_depth: Reverse<usize>,
    latency: LatencyRank,
    not_self: bool,
    pub(crate) replica: ReplicaDescriptor,
}

impl ReplicaRank {
    pub(crate) fn is_resolved(&self) -> bool {
        !self.unresolved
    }

    /// The keys that measure distance, without the deterministic tie-breaks.
    pub(crate) fn proximity(&self) -> (bool, Reverse<usize>, LatencyRank) {
        (self.unresolved, self.locality_depth, self.latency)
    }

    pub(crate) fn is_self(&self) -> bool {
        !self.not_self
    }
}

/// Prefers the replica closest to the planning node.
#[derive(Clone)]
pub struct ClosestOracle {
    node_id: NodeId,
    locality: Locality,
    node_descs: Arc<dyn NodeDescStore>,
    latency: Option<Arc<dyn LatencyEstimator>>,
}

impl ClosestOracle {
    pub fn new(cfg: &Config) -> Result<Self> {
        Self::for_policy(Policy::CLOSEST_CHOICE, cfg)
    }

    /// Registry constructor.
    pub fn constructor(cfg: &Config) -> Result<Arc<dyn Oracle>> {
        Ok(Arc::new(Self::new(cfg)?))
    }

    /// Build the ranking core on behalf of `policy`, which is named in errors.
    pub(crate) fn for_policy(policy: Policy, cfg: &Config) -> Result<Self> {
        let node_descs = cfg
            .node_descs
            .clone()
            .ok_or(OracleError::MissingCollaborator {
                policy: policy.name(),
                collaborator: "node descriptor store",
            })?;
        Ok(Self {
            node_id: cfg.node_id,
            locality: cfg.locality.clone(),
            node_descs,
            latency: cfg.latency.clone(),
        })
    }

    fn rank(&self, replica: ReplicaDescriptor) -> ReplicaRank {
        let not_self = replica.node_id != self.node_id;
        match self.node_descs.node_descriptor(replica.node_id) {
            Some(desc) => {
                let latency = self
                    .latency
                    .as_ref()
                    .and_then(|est| est.estimate(&desc.address))
                    .map_or(LatencyRank::Unknown, LatencyRank::Known);
                ReplicaRank {
                    unresolved: false,
                    locality_depth: Reverse(self.locality.shared_prefix_len(&desc.locality)),
                    latency,
                    not_self,
                    replica,
                }
            }
            None => ReplicaRank {
                unresolved: true,
                locality_depth: Reverse(0),
                latency: LatencyRank::Unknown,
                not_self,
                replica,
            },
        }
    }

    /// Rank all candidates, best first.
    pub(crate) fn ranked(&self, replicas: &[ReplicaDescriptor]) -> Vec<ReplicaRank> {
        let mut ranks: Vec<ReplicaRank> = replicas.iter().map(|r| self.rank(*r)).collect();
        ranks.sort_unstable();
        ranks
    }

    /// The best resolved candidate, or `None` when gossip knows none of them.
    fn closest(&self, replicas: &[ReplicaDescriptor]) -> Option<ReplicaDescriptor> {
        replicas
            .iter()
            .map(|r| self.rank(*r))
            .min()
            .filter(ReplicaRank::is_resolved)
            .map(|rank| rank.replica)
    }

    /// Selection without bookkeeping; shared with the strategies built on this one.
    pub(crate) fn choose(
        &self,
        desc: &RangeDescriptor,
        replicas: &[ReplicaDescriptor],
        leaseholder: Option<&ReplicaDescriptor>,
        read_policy: ReadPolicy,
    ) -> Choice {
        if let Some(lh) = required_leaseholder(desc, leaseholder, read_policy) {
            return Choice::Leaseholder(lh);
        }
        match self.closest(replicas) {
            Some(r) => Choice::Best(r),
            None => Choice::Fallback(random::pick(replicas)),
        }
    }
}

impl Oracle for ClosestOracle {
    fn choose_preferred_replica(
        &self,
        txn: Option<&TxnHint>,
        desc: &RangeDescriptor,
        leaseholder: Option<&ReplicaDescriptor>,
        read_policy: ReadPolicy,
        _query_state: Option<&mut QueryState>,
    ) -> Result<ReplicaDescriptor> {
        let replicas = replicas_of(desc)?;
        let choice = self.choose(desc, replicas, leaseholder, read_policy);
        Ok(finish(self.policy(), txn, desc, choice))
    }

    fn policy(&self) -> Policy {
        Policy::CLOSEST_CHOICE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corelib::{InMemoryNodeDescs, NodeDescriptor, RangeId, StoreId};

    fn replica(n: u32) -> ReplicaDescriptor {
        ReplicaDescriptor::new(NodeId(n), StoreId(n))
    }

    fn store(nodes: &[(u32, &str)]) -> Arc<InMemoryNodeDescs> {
        Arc::new(
            nodes
                .iter()
                .map(|(n, loc)| {
                    NodeDescriptor::with_locality(NodeId(*n), format!("host:{}", n), loc.parse().unwrap())
                })
                .collect(),
        )
    }

    fn latencies(table: &'static [(&'static str, u64, bool)]) -> Arc<dyn LatencyEstimator> {
        Arc::new(move |addr: &str| {
            table
                .iter()
                .find(|(a, _, _)| *a == addr)
                .map(|(_, ms, valid)| (Duration::from_millis(*ms), *valid))
                .unwrap_or((Duration::ZERO, false))
        })
    }

    fn choose(oracle: &ClosestOracle, replicas: Vec<ReplicaDescriptor>) -> ReplicaDescriptor {
        let desc = RangeDescriptor::new(RangeId(1), replicas);
        oracle
            .choose_preferred_replica(None, &desc, None, ReadPolicy::FollowerRead, None)
            .unwrap()
    }

    #[test]
    fn test_requires_node_descs() {
        assert!(matches!(
            ClosestOracle::new(&Config::default()),
            Err(OracleError::MissingCollaborator { policy: "closest", .. })
        ));
    }

    #[test]
    fn test_locality_dominates_latency() {
        // n2 shares our region but is slow; n3 is fast but far away.
        let cfg = Config::new(NodeId(1), "region=us".parse().unwrap())
            .with_node_descs(store(&[(2, "region=us"), (3, "region=eu")]))
            .with_latency(latencies(&[("host:2", 50, true), ("host:3", 1, true)]));
        let oracle = ClosestOracle::new(&cfg).unwrap();

        assert_eq!(choose(&oracle, vec![replica(3), replica(2)]), replica(2));
    }

    #[test]
    fn test_deeper_locality_wins() {
        let cfg = Config::new(NodeId(1), "region=us,zone=a".parse().unwrap())
            .with_node_descs(store(&[(2, "region=us,zone=b"), (3, "region=us,zone=a")]));
        let oracle = ClosestOracle::new(&cfg).unwrap();

        assert_eq!(choose(&oracle, vec![replica(2), replica(3)]), replica(3));
    }

    #[test]
    fn test_latency_breaks_locality_ties() {
        let cfg = Config::new(NodeId(1), "region=us".parse().unwrap())
            .with_node_descs(store(&[(2, "region=eu"), (3, "region=eu")]))
            .with_latency(latencies(&[("host:2", 30, true), ("host:3", 5, true)]));
        let oracle = ClosestOracle::new(&cfg).unwrap();

        assert_eq!(choose(&oracle, vec![replica(2), replica(3)]), replica(3));
    }

    #[test]
    fn test_invalid_latency_is_not_zero() {
        // n2 has no valid estimate (reported as 0 but invalid); n3 has a real one.
        let cfg = Config::new(NodeId(1), "region=us".parse().unwrap())
            .with_node_descs(store(&[(2, "region=eu"), (3, "region=eu")]))
            .with_latency(latencies(&[("host:2", 0, false), ("host:3", 40, true)]));
        let oracle = ClosestOracle::new(&cfg).unwrap();

        assert_eq!(choose(&oracle, vec![replica(2), replica(3)]), replica(3));
    }

    #[test]
    fn test_self_then_lowest_node_id() {
        let cfg = Config::new(NodeId(3), "region=us".parse().unwrap())
            .with_node_descs(store(&[(2, "region=us"), (3, "region=us"), (4, "region=us")]));
        let oracle = ClosestOracle::new(&cfg).unwrap();
        assert_eq!(choose(&oracle, vec![replica(4), replica(2), replica(3)]), replica(3));

        let cfg = Config::new(NodeId(9), "region=us".parse().unwrap())
            .with_node_descs(store(&[(2, "region=us"), (3, "region=us"), (4, "region=us")]));
        let oracle = ClosestOracle::new(&cfg).unwrap();
        assert_eq!(choose(&oracle, vec![replica(4), replica(3), replica(2)]), replica(2));
    }

    #[test]
    fn test_unresolved_is_least_preferred() {
        // n2 is missing from gossip, even though its id is lowest.
        let cfg = Config::new(NodeId(1), "region=us".parse().unwrap())
            .with_node_descs(store(&[(5, "region=eu")]));
        let oracle = ClosestOracle::new(&cfg).unwrap();

        assert_eq!(choose(&oracle, vec![replica(2), replica(5)]), replica(5));
    }

    #[test]
    fn test_nothing_resolved_degrades_to_random() {
        let cfg = Config::new(NodeId(1), "region=us".parse().unwrap())
            .with_node_descs(store(&[]));
        let oracle = ClosestOracle::new(&cfg).unwrap();

        let replicas = vec![replica(2), replica(3), replica(4)];
        for _ in 0..20 {
            let r = choose(&oracle, replicas.clone());
            assert!(replicas.contains(&r));
        }
    }

    #[test]
    fn test_ranked_order() {
        let cfg = Config::new(NodeId(1), "region=us".parse().unwrap())
            .with_node_descs(store(&[(2, "region=eu"), (3, "region=us")]));
        let oracle = ClosestOracle::new(&cfg).unwrap();

        let ranks = oracle.ranked(&[replica(4), replica(2), replica(3)]);
        let order: Vec<_> = ranks.iter().map(|r| r.replica).collect();
        assert_eq!(order, vec![replica(3), replica(2), replica(4)]);
        assert!(!ranks[2].is_resolved());
    }
}
