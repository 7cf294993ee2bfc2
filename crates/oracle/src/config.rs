//! Oracle configuration.

use std::fmt;
use std::sync::Arc;

use corelib::{LatencyEstimator, Locality, NodeDescStore, NodeId};

/// Default cap on ranges the bin-packing oracle piles onto a leaseholder's
/// node within one query.
pub const DEFAULT_MAX_RANGES_PER_NODE: usize = 10;

/// Everything an oracle needs to know about the node it plans on.
///
/// Built once per node or session and shared read-only by every oracle
/// derived from it; cloning only bumps reference counts.
#[derive(Clone)]
pub struct Config {
    /// The planning node.
    pub node_id: NodeId,
    /// Where the planning node lives.
    pub locality: Locality,
    /// Gossip-backed descriptor lookup. Required by every policy except random.
    pub node_descs: Option<Arc<dyn NodeDescStore>>,
    /// Round-trip estimates; latency is ignored when absent.
    pub latency: Option<Arc<dyn LatencyEstimator>>,
    pub max_ranges_per_node: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            node_id: NodeId::default(),
            locality: Locality::default(),
            node_descs: None,
            latency: None,
            max_ranges_per_node: DEFAULT_MAX_RANGES_PER_NODE,
        }
    }
}

impl Config {
    pub fn new(node_id: NodeId, locality: Locality) -> Self {
        Self {
            node_id,
            locality,
            ..Self::default()
        }
    }

    pub fn with_node_descs(mut self, store: Arc<dyn NodeDescStore>) -> Self {
        self.node_descs = Some(store);
        self
    }

    pub fn with_latency(mut self, latency: Arc<dyn LatencyEstimator>) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn with_max_ranges_per_node(mut self, max: usize) -> Self {
        self.max_ranges_per_node = max;
        self
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("node_id", &self.node_id)
            .field("locality", &self.locality.to_string())
            .field("node_descs", &self.node_descs.is_some())
            .field("latency", &self.latency.is_some())
            .field("max_ranges_per_node", &self.max_ranges_per_node)
            .finish()
    }
}
