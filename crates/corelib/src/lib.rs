//! Core library for replica selection.
//!
//! This crate provides the cluster model the oracle reasons about:
//! - Node, store and range identifiers
//! - Replica and range descriptors
//! - Locality tiers and proximity
//! - Node-descriptor and latency caches fed by gossip and RPC

pub mod error;
pub mod membership;
pub mod network;
pub mod node;
pub mod range;
pub mod topology;

pub use error::{Error, Result};
pub use membership::{InMemoryNodeDescs, NodeDescStore};
pub use network::{LatencyCache, LatencyEstimator};
pub use node::{NodeDescriptor, NodeId, StoreId};
pub use range::{RangeDescriptor, RangeId, ReplicaDescriptor};
pub use topology::{Locality, Tier};
