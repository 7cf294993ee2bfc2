//! Random replica selection.
//!
//! The baseline policy: each call draws from a thread-local generator, so
//! over many ranges the chosen replicas approximate a uniform spread across
//! the cluster. Nothing about locality, latency or load is consulted.

use std::sync::Arc;

use corelib::{RangeDescriptor, ReplicaDescriptor};
use rand::Rng;

use crate::config::Config;
use crate::error::Result;
use crate::policy::{Policy, ReadPolicy, TxnHint};
use crate::query_state::QueryState;
use crate::strategy::{finish, replicas_of, required_leaseholder, Choice, Oracle};

#[derive(Debug, Clone, Default)]
pub struct RandomOracle;

impl RandomOracle {
    pub fn new() -> Self {
        Self
    }

    /// Registry constructor. Needs nothing from the config.
    pub fn constructor(_cfg: &Config) -> Result<Arc<dyn Oracle>> {
        Ok(Arc::new(Self::new()))
    }
}

/// Uniformly pick one of `replicas`, which must be non-empty.
pub(crate) fn pick(replicas: &[ReplicaDescriptor]) -> ReplicaDescriptor {
    let idx = rand::thread_rng().gen_range(0..replicas.len());
    replicas[idx]
}

impl Oracle for RandomOracle {
    fn choose_preferred_replica(
        &self,
        txn: Option<&TxnHint>,
        desc: &RangeDescriptor,
        leaseholder: Option<&ReplicaDescriptor>,
        read_policy: ReadPolicy,
        _query_state: Option<&mut QueryState>,
    ) -> Result<ReplicaDescriptor> {
        let replicas = replicas_of(desc)?;
        let choice = match required_leaseholder(desc, leaseholder, read_policy) {
            Some(lh) => Choice::Leaseholder(lh),
            None => Choice::Random(pick(replicas)),
        };
        Ok(finish(self.policy(), txn, desc, choice))
    }

    fn policy(&self) -> Policy {
        Policy::RANDOM_CHOICE
    }
}
