//! Replica selection oracle.
//!
//! Given a range replicated across several nodes, an oracle picks the single
//! replica a query fragment should be sent to. Strategies trade off:
//! - Data locality (shared locality tiers with the planning node)
//! - Network latency (cached round-trip estimates)
//! - Load across the nodes serving one query
//!
//! Oracles are built once from a [`Config`] through the [`OracleRegistry`],
//! then called for every range a query touches.

pub mod config;
pub mod error;
pub mod policy;
pub mod query_state;
pub mod registry;
pub mod strategy;

pub use config::{Config, DEFAULT_MAX_RANGES_PER_NODE};
pub use error::{OracleError, Result};
pub use policy::{Policy, ReadPolicy, TxnHint};
pub use query_state::{QueryState, SharedQueryState};
pub use registry::{default_registry, new_oracle, OracleConstructor, OracleRegistry, OracleRegistryBuilder};
pub use strategy::{BinPackingOracle, ClosestOracle, LeaseholderOracle, Oracle, RandomOracle};
