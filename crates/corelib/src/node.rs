//! Node abstractions for the cluster.
//!
//! Nodes are identified by a compact `NodeId` that is cheap to compare and
//! hash. A `NodeDescriptor` is what the membership layer knows about a node:
//! where to reach it and where it physically lives.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::topology::Locality;

/// Compact identifier for a node in the cluster.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Identifier of one store (disk) on a node.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoreId(pub u32);

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

/// Address and placement of a cluster node, as propagated by gossip.
///
/// Keep this struct small and cheap to clone; connection state and health
/// live elsewhere.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDescriptor {
    pub node_id: NodeId,
    /// `host:port` the node serves RPCs on.
    pub address: String,
    /// Hierarchical placement (region, zone, ...).
    #[serde(default)]
    pub locality: Locality,
}

impl NodeDescriptor {
    /// Construct a descriptor with no locality information.
    pub fn new(node_id: NodeId, address: impl Into<String>) -> Self {
        Self {
            node_id,
            address: address.into(),
            locality: Locality::default(),
        }
    }

    pub fn with_locality(node_id: NodeId, address: impl Into<String>, locality: Locality) -> Self {
        Self {
            node_id,
            address: address.into(),
            locality,
        }
    }

    /// Reject descriptors that could never be dialed.
    pub fn validate(&self) -> Result<()> {
        if self.address.trim().is_empty() {
            return Err(Error::InvalidNode(format!("{} has an empty address", self.node_id)));
        }
        Ok(())
    }
}
