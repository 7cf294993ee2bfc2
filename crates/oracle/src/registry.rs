//! Policy registry: maps a policy to the constructor of its oracle.
//!
//! The registry is assembled once, at startup, and is immutable afterwards.
//! New policies are added by registering them on a builder next to the
//! built-ins; nothing patches a global table at runtime.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use tracing::debug;

use crate::config::Config;
use crate::error::{OracleError, Result};
use crate::policy::Policy;
use crate::strategy::{BinPackingOracle, ClosestOracle, LeaseholderOracle, Oracle, RandomOracle};

/// Builds an oracle from a config. Invalid configs fail here, not per call.
pub type OracleConstructor = fn(&Config) -> Result<Arc<dyn Oracle>>;

const BUILT_INS: [(Policy, OracleConstructor); 4] = [
    (Policy::RANDOM_CHOICE, RandomOracle::constructor),
    (Policy::CLOSEST_CHOICE, ClosestOracle::constructor),
    (Policy::BIN_PACKING_CHOICE, BinPackingOracle::constructor),
    (Policy::LEASEHOLDER_CHOICE, LeaseholderOracle::constructor),
];

#[derive(Clone)]
pub struct OracleRegistry {
    constructors: HashMap<&'static str, (Policy, OracleConstructor)>,
}

impl OracleRegistry {
    pub fn builder() -> OracleRegistryBuilder {
        OracleRegistryBuilder::default()
    }

    /// A builder already holding the built-in policies.
    pub fn builder_with_defaults() -> OracleRegistryBuilder {
        BUILT_INS
            .iter()
            .fold(Self::builder(), |b, (policy, ctor)| b.register(*policy, *ctor))
    }

    /// Registry of the built-in policies only.
    pub fn with_defaults() -> Self {
        Self {
            constructors: BUILT_INS
                .iter()
                .map(|(policy, ctor)| (policy.name(), (*policy, *ctor)))
                .collect(),
        }
    }

    /// Construct the oracle for `policy`.
    ///
    /// # Errors
    /// - [`OracleError::UnknownPolicy`] if nothing is registered under it
    /// - whatever the policy's constructor rejects about `cfg`
    pub fn new_oracle(&self, policy: Policy, cfg: &Config) -> Result<Arc<dyn Oracle>> {
        let (_, ctor) = self
            .constructors
            .get(policy.name())
            .ok_or_else(|| OracleError::UnknownPolicy(policy.name().to_string()))?;
        debug!(%policy, node = %cfg.node_id, "constructing replica oracle");
        ctor(cfg)
    }

    /// Resolve a configured policy name.
    pub fn policy_by_name(&self, name: &str) -> Result<Policy> {
        self.constructors
            .get(name)
            .map(|(policy, _)| *policy)
            .ok_or_else(|| OracleError::UnknownPolicy(name.to_string()))
    }

    /// Registered policies, sorted by name.
    pub fn policies(&self) -> Vec<Policy> {
        let mut policies: Vec<Policy> = self.constructors.values().map(|(p, _)| *p).collect();
        policies.sort_by_key(|p| p.name());
        policies
    }
}

impl Default for OracleRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl fmt::Debug for OracleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OracleRegistry")
            .field("policies", &self.policies())
            .finish()
    }
}

#[derive(Default)]
pub struct OracleRegistryBuilder {
    entries: Vec<(Policy, OracleConstructor)>,
}

impl OracleRegistryBuilder {
    pub fn register(mut self, policy: Policy, ctor: OracleConstructor) -> Self {
        self.entries.push((policy, ctor));
        self
    }

    /// Freeze the registry. Two registrations under one name are rejected.
    pub fn build(self) -> Result<OracleRegistry> {
        let mut constructors = HashMap::with_capacity(self.entries.len());
        for (policy, ctor) in self.entries {
            if constructors.insert(policy.name(), (policy, ctor)).is_some() {
                return Err(OracleError::DuplicatePolicy(policy.name().to_string()));
            }
        }
        Ok(OracleRegistry { constructors })
    }
}

/// Process-wide registry of the built-in policies, initialised on first use.
pub fn default_registry() -> &'static OracleRegistry {
    static REGISTRY: OnceLock<OracleRegistry> = OnceLock::new();
    REGISTRY.get_or_init(OracleRegistry::with_defaults)
}

/// Construct a built-in oracle.
pub fn new_oracle(policy: Policy, cfg: &Config) -> Result<Arc<dyn Oracle>> {
    default_registry().new_oracle(policy, cfg)
}
