//! Leaseholder-first selection.
//!
//! Reads from the leaseholder whenever the caller knows it, even for
//! follower reads: the leaseholder never has to wait out closed timestamps.
//! Falls back to the closest replica when the lease is unknown.

use std::sync::Arc;

use corelib::{RangeDescriptor, ReplicaDescriptor};

use crate::config::Config;
use crate::error::Result;
use crate::policy::{Policy, ReadPolicy, TxnHint};
use crate::query_state::QueryState;
use crate::strategy::{finish, member_leaseholder, replicas_of, Choice, ClosestOracle, Oracle};

#[derive(Clone)]
pub struct LeaseholderOracle {
    closest: ClosestOracle,
}

impl LeaseholderOracle {
    pub fn new(cfg: &Config) -> Result<Self> {
        Ok(Self {
            closest: ClosestOracle::for_policy(Policy::LEASEHOLDER_CHOICE, cfg)?,
        })
    }

    pub fn constructor(cfg: &Config) -> Result<Arc<dyn Oracle>> {
        Ok(Arc::new(Self::new(cfg)?))
    }
}

impl Oracle for LeaseholderOracle {
    fn choose_preferred_replica(
        &self,
        txn: Option<&TxnHint>,
        desc: &RangeDescriptor,
        leaseholder: Option<&ReplicaDescriptor>,
        read_policy: ReadPolicy,
        _query_state: Option<&mut QueryState>,
    ) -> Result<ReplicaDescriptor> {
        let replicas = replicas_of(desc)?;
        let choice = match member_leaseholder(desc, leaseholder) {
            Some(lh) => Choice::Leaseholder(lh),
            None => self.closest.choose(desc, replicas, None, read_policy),
        };
        Ok(finish(self.policy(), txn, desc, choice))
    }

    fn policy(&self) -> Policy {
        Policy::LEASEHOLDER_CHOICE
    }
}
