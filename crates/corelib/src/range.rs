//! Ranges and their replicas.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::node::{NodeId, StoreId};

/// Identifier of a contiguous, replicated shard of the keyspace.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RangeId(pub u64);

impl fmt::Display for RangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// One physical copy of a range, identified by (node, store).
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct ReplicaDescriptor {
    pub node_id: NodeId,
    pub store_id: StoreId,
}

impl ReplicaDescriptor {
    #[inline]
    pub fn new(node_id: NodeId, store_id: StoreId) -> Self {
        Self { node_id, store_id }
    }
}

impl fmt::Display for ReplicaDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.node_id, self.store_id)
    }
}

/// All known copies of one range.
///
/// The order of `internal_replicas` carries no meaning.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeDescriptor {
    pub range_id: RangeId,
    pub internal_replicas: Vec<ReplicaDescriptor>,
}

impl RangeDescriptor {
    pub fn new(range_id: RangeId, internal_replicas: Vec<ReplicaDescriptor>) -> Self {
        Self {
            range_id,
            internal_replicas,
        }
    }

    pub fn replicas(&self) -> &[ReplicaDescriptor] {
        &self.internal_replicas
    }

    pub fn contains(&self, replica: &ReplicaDescriptor) -> bool {
        self.internal_replicas.contains(replica)
    }

    pub fn is_empty(&self) -> bool {
        self.internal_replicas.is_empty()
    }
}
