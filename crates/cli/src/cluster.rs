//! JSON cluster descriptions.
//!
//! A cluster file stands in for the live collaborators: its `nodes` seed the
//! gossip cache, its `latencies` seed the RPC latency cache, and its `ranges`
//! are what the planner would ask about.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use clap::ValueEnum;
use corelib::{
    InMemoryNodeDescs, LatencyCache, Locality, NodeDescriptor, NodeId, RangeDescriptor, RangeId,
    ReplicaDescriptor,
};
use oracle::{Config, ReadPolicy};
use serde::Deserialize;

/// Read policy as spelled on the command line and in cluster files.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadPolicyArg {
    Leaseholder,
    FollowerRead,
}

impl From<ReadPolicyArg> for ReadPolicy {
    fn from(arg: ReadPolicyArg) -> Self {
        match arg {
            ReadPolicyArg::Leaseholder => ReadPolicy::Leaseholder,
            ReadPolicyArg::FollowerRead => ReadPolicy::FollowerRead,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct RangeSpec {
    pub range_id: RangeId,
    pub replicas: Vec<ReplicaDescriptor>,
    #[serde(default)]
    pub leaseholder: Option<ReplicaDescriptor>,
}

impl RangeSpec {
    pub fn descriptor(&self) -> RangeDescriptor {
        RangeDescriptor::new(self.range_id, self.replicas.clone())
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct ClusterFile {
    pub self_node: NodeId,
    #[serde(default)]
    pub locality: Locality,
    #[serde(default)]
    pub policy: Option<String>,
    #[serde(default)]
    pub read_policy: Option<ReadPolicyArg>,
    #[serde(default)]
    pub max_ranges_per_node: Option<usize>,
    #[serde(default)]
    pub nodes: Vec<NodeDescriptor>,
    /// Address to latency, e.g. `"10.0.0.2:26257": "1ms"`.
    #[serde(default)]
    pub latencies: BTreeMap<String, String>,
    #[serde(default)]
    pub ranges: Vec<RangeSpec>,
}

impl ClusterFile {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading cluster file {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("parsing cluster file {}", path.display()))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Seed the collaborator caches and build the oracle config.
    pub fn config(&self) -> Result<Config> {
        let descs = InMemoryNodeDescs::new();
        for node in &self.nodes {
            descs.upsert(node.clone())?;
        }

        let latency = LatencyCache::new();
        for (address, raw) in &self.latencies {
            let sample = parse_duration(raw).with_context(|| format!("latency for {}", address))?;
            latency.record(address, sample);
        }

        let mut cfg = Config::new(self.self_node, self.locality.clone())
            .with_node_descs(Arc::new(descs))
            .with_latency(Arc::new(latency));
        if let Some(max) = self.max_ranges_per_node {
            cfg = cfg.with_max_ranges_per_node(max);
        }
        Ok(cfg)
    }
}

/// Parse `<int>ns|us|ms|s`.
pub fn parse_duration(raw: &str) -> Result<Duration> {
    let raw = raw.trim();
    let split = raw
        .find(|c: char| !c.is_ascii_digit())
        .ok_or_else(|| anyhow!("duration {:?} has no unit", raw))?;
    let (digits, unit) = raw.split_at(split);
    let value: u64 = digits
        .parse()
        .with_context(|| format!("duration {:?} has no numeric value", raw))?;
    let duration = match unit {
        "ns" => Duration::from_nanos(value),
        "us" => Duration::from_micros(value),
        "ms" => Duration::from_millis(value),
        "s" => Duration::from_secs(value),
        other => bail!("unknown duration unit {:?}", other),
    };
    Ok(duration)
}

/// Small cluster used by the unit tests of this crate.
#[cfg(test)]
pub(crate) const SAMPLE_CLUSTER: &str = r#"{
    "self_node": 1,
    "locality": "region=us-east,zone=a",
    "policy": "closest",
    "read_policy": "follower_read",
    "nodes": [
        { "node_id": 2, "address": "10.0.0.2:26257", "locality": "region=us-east,zone=b" },
        { "node_id": 3, "address": "10.0.0.3:26257", "locality": "region=eu-west,zone=a" }
    ],
    "latencies": { "10.0.0.2:26257": "3ms", "10.0.0.3:26257": "90us" },
    "ranges": [
        { "range_id": 1, "replicas": [ {"node_id": 3, "store_id": 3}, {"node_id": 2, "store_id": 2} ] },
        { "range_id": 2, "replicas": [ {"node_id": 3, "store_id": 3}, {"node_id": 4, "store_id": 4} ],
          "leaseholder": {"node_id": 4, "store_id": 4} }
    ]
}"#;
