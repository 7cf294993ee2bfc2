//! Replica selection strategies.
//!
//! An oracle picks the one replica of a range that a query fragment should
//! be sent to. Different strategies optimize for different goals:
//!
//! - **RandomOracle**: uniform spread, no signal needed
//! - **ClosestOracle**: locality first, latency as tie-break
//! - **BinPackingOracle**: closest, but spreads one query's ranges over nodes
//! - **LeaseholderOracle**: the leaseholder whenever it is known

pub mod binpacking;
pub mod closest;
pub mod leaseholder;
pub mod random;

pub use binpacking::BinPackingOracle;
pub use closest::ClosestOracle;
pub use leaseholder::LeaseholderOracle;
pub use random::RandomOracle;

use corelib::{RangeDescriptor, ReplicaDescriptor};
use metrics::counter;
use tracing::debug;

use crate::error::{OracleError, Result};
use crate::policy::{Policy, ReadPolicy, TxnHint};
use crate::query_state::QueryState;

/// Trait for replica selection strategies.
///
/// # Contract
///
/// - The returned replica is always one of `desc.internal_replicas`.
/// - An empty replica set fails with [`OracleError::EmptyRange`].
/// - No I/O: node descriptors and latencies come from local caches.
/// - The only side effect is on `query_state`, and only load-aware
///   strategies make it. `None` means the caller does not track load.
///
/// # Thread Safety
///
/// Implementations must be thread-safe (Send + Sync); one instance serves
/// concurrent planning of unrelated queries.
pub trait Oracle: Send + Sync + 'static {
    /// Choose the replica of `desc` to read from.
    ///
    /// # Arguments
    /// * `txn` - Transaction the plan belongs to, if any
    /// * `desc` - The range and its replica set
    /// * `leaseholder` - The replica the caller believes holds the lease
    /// * `read_policy` - Whether the read must be served by the leaseholder
    /// * `query_state` - Per-query load bookkeeping
    fn choose_preferred_replica(
        &self,
        txn: Option<&TxnHint>,
        desc: &RangeDescriptor,
        leaseholder: Option<&ReplicaDescriptor>,
        read_policy: ReadPolicy,
        query_state: Option<&mut QueryState>,
    ) -> Result<ReplicaDescriptor>;

    /// The policy this oracle implements.
    fn policy(&self) -> Policy;
}

/// Why a replica was picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Choice {
    Leaseholder(ReplicaDescriptor),
    /// Same replica as earlier in this query.
    Reused(ReplicaDescriptor),
    Best(ReplicaDescriptor),
    Random(ReplicaDescriptor),
    /// No candidate resolved; picked without scoring.
    Fallback(ReplicaDescriptor),
}

impl Choice {
    pub(crate) fn replica(&self) -> ReplicaDescriptor {
        match *self {
            Choice::Leaseholder(r)
            | Choice::Reused(r)
            | Choice::Best(r)
            | Choice::Random(r)
            | Choice::Fallback(r) => r,
        }
    }

    fn reason(&self) -> &'static str {
        match self {
            Choice::Leaseholder(_) => "leaseholder",
            Choice::Reused(_) => "reused",
            Choice::Best(_) => "best",
            Choice::Random(_) => "random",
            Choice::Fallback(_) => "fallback",
        }
    }
}

/// The non-empty replica set of `desc`.
pub(crate) fn replicas_of(desc: &RangeDescriptor) -> Result<&[ReplicaDescriptor]> {
    if desc.is_empty() {
        return Err(OracleError::EmptyRange {
            range_id: desc.range_id,
        });
    }
    Ok(desc.replicas())
}

/// The leaseholder hint, if it is actually one of the range's replicas.
pub(crate) fn member_leaseholder(
    desc: &RangeDescriptor,
    leaseholder: Option<&ReplicaDescriptor>,
) -> Option<ReplicaDescriptor> {
    let lh = leaseholder?;
    if desc.contains(lh) {
        Some(*lh)
    } else {
        debug!(range_id = %desc.range_id, leaseholder = %lh, "leaseholder hint is not a replica; ignoring");
        None
    }
}

/// The leaseholder, when the read policy forces reads onto it.
pub(crate) fn required_leaseholder(
    desc: &RangeDescriptor,
    leaseholder: Option<&ReplicaDescriptor>,
    read_policy: ReadPolicy,
) -> Option<ReplicaDescriptor> {
    if read_policy.allows_followers() {
        return None;
    }
    member_leaseholder(desc, leaseholder)
}

/// Log and count a finished selection.
pub(crate) fn finish(
    policy: Policy,
    txn: Option<&TxnHint>,
    desc: &RangeDescriptor,
    choice: Choice,
) -> ReplicaDescriptor {
    let replica = choice.replica();
    if matches!(choice, Choice::Fallback(_)) {
        counter!("replica_oracle_fallbacks_total", "policy" => policy.name()).increment(1);
        debug!(range_id = %desc.range_id, %policy, "no replica descriptor resolved; degrading selection");
    }
    counter!("replica_oracle_choices_total", "policy" => policy.name()).increment(1);
    debug!(
        range_id = %desc.range_id,
        %policy,
        %replica,
        reason = choice.reason(),
        txn = ?txn.map(|t| t.id),
        "chose replica"
    );
    replica
}
