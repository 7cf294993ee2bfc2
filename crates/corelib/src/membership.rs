//! Cluster membership: who the nodes are and where they live.
//!
//! The oracle never asks the network. It reads a local view that gossip keeps
//! up to date, and that view may be stale or have gaps.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::trace;

use crate::error::Result;
use crate::node::{NodeDescriptor, NodeId};

/// Read access to node descriptors.
///
/// Implementations must answer from already-maintained local state and never
/// block on I/O; an unknown node is `None`, not an error.
pub trait NodeDescStore: Send + Sync + 'static {
    fn node_descriptor(&self, node_id: NodeId) -> Option<Arc<NodeDescriptor>>;
}

/// Gossip-fed descriptor cache.
///
/// Writers (gossip callbacks) and readers (query planning) run concurrently.
#[derive(Debug, Default)]
pub struct InMemoryNodeDescs {
    descs: DashMap<NodeId, Arc<NodeDescriptor>>,
}

impl InMemoryNodeDescs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the descriptor for `desc.node_id`.
    pub fn upsert(&self, desc: NodeDescriptor) -> Result<()> {
        desc.validate()?;
        trace!(node = %desc.node_id, address = %desc.address, locality = %desc.locality, "node descriptor updated");
        self.descs.insert(desc.node_id, Arc::new(desc));
        Ok(())
    }

    /// Forget a node, e.g. once it is decommissioned. Returns whether it was known.
    pub fn remove(&self, node_id: NodeId) -> bool {
        self.descs.remove(&node_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.descs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descs.is_empty()
    }
}

impl FromIterator<NodeDescriptor> for InMemoryNodeDescs {
    fn from_iter<I: IntoIterator<Item = NodeDescriptor>>(iter: I) -> Self {
        let descs = iter
            .into_iter()
            .map(|d| (d.node_id, Arc::new(d)))
            .collect::<DashMap<_, _>>();
        Self { descs }
    }
}

impl NodeDescStore for InMemoryNodeDescs {
    fn node_descriptor(&self, node_id: NodeId) -> Option<Arc<NodeDescriptor>> {
        self.descs.get(&node_id).map(|d| Arc::clone(d.value()))
    }
}
