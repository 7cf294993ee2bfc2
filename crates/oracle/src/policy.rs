//! Policy identifiers and read-consistency requirements.

use std::fmt;

/// Names a replica selection strategy in the registry.
///
/// Built-in policies are associated constants; additional ones are minted
/// with [`Policy::new`] and registered alongside them.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct Policy(&'static str);

impl Policy {
    /// Uniformly random replica.
    pub const RANDOM_CHOICE: Policy = Policy("random");
    /// Closest replica by locality, then latency.
    pub const CLOSEST_CHOICE: Policy = Policy("closest");
    /// Closest replicas, spread across nodes within one query.
    pub const BIN_PACKING_CHOICE: Policy = Policy("binpacking");
    /// Leaseholder when known, closest otherwise.
    pub const LEASEHOLDER_CHOICE: Policy = Policy("leaseholder");

    pub const fn new(name: &'static str) -> Self {
        Policy(name)
    }

    pub const fn name(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Which replicas may serve a read.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub enum ReadPolicy {
    /// Strongly consistent: must read from the leaseholder.
    #[default]
    Leaseholder,
    /// Lag-tolerant follower read: any replica will do.
    FollowerRead,
}

impl ReadPolicy {
    pub fn allows_followers(&self) -> bool {
        matches!(self, ReadPolicy::FollowerRead)
    }
}

/// The transaction a plan is built for, when there is one.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct TxnHint {
    pub id: u128,
}

impl TxnHint {
    pub fn new(id: u128) -> Self {
        Self { id }
    }
}

impl fmt::Display for TxnHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.id)
    }
}
