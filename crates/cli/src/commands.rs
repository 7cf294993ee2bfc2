//! CLI subcommands.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Subcommand;
use corelib::{NodeDescStore, NodeId};
use oracle::{default_registry, Policy, QueryState, ReadPolicy};
use tracing::{info, warn};

use crate::cluster::{ClusterFile, ReadPolicyArg};

/// Policy used when neither the flag nor the cluster file names one.
const DEFAULT_POLICY: Policy = Policy::CLOSEST_CHOICE;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Choose a replica for every range in a cluster file, as one query.
    Plan {
        /// JSON cluster description.
        file: PathBuf,
        /// Overrides the file's policy.
        #[arg(long)]
        policy: Option<String>,
        /// Overrides the file's read policy.
        #[arg(long, value_enum)]
        read_policy: Option<ReadPolicyArg>,
    },
    /// List the registered selection policies.
    Policies,
}

/// Lines of output produced by a command.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub lines: Vec<String>,
}

impl fmt::Display for CommandResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

impl Command {
    pub fn execute(self) -> Result<CommandResult> {
        match self {
            Command::Plan {
                file,
                policy,
                read_policy,
            } => {
                let cluster = ClusterFile::load(&file)?;
                plan(&cluster, policy.as_deref(), read_policy)
            }
            Command::Policies => Ok(CommandResult {
                lines: default_registry()
                    .policies()
                    .iter()
                    .map(|p| p.name().to_string())
                    .collect(),
            }),
        }
    }
}

/// Run one planning pass over every range of `cluster`.
pub fn plan(
    cluster: &ClusterFile,
    policy_override: Option<&str>,
    read_policy_override: Option<ReadPolicyArg>,
) -> Result<CommandResult> {
    let registry = default_registry();
    let policy = match policy_override.or(cluster.policy.as_deref()) {
        Some(name) => registry.policy_by_name(name)?,
        None => DEFAULT_POLICY,
    };
    let read_policy: ReadPolicy = read_policy_override
        .or(cluster.read_policy)
        .map(ReadPolicy::from)
        .unwrap_or_default();

    let cfg = cluster.config()?;
    warn_unknown_nodes(cluster, &cfg);
    let oracle = registry.new_oracle(policy, &cfg)?;
    info!(%policy, ?read_policy, ranges = cluster.ranges.len(), "planning");

    let mut qs = QueryState::new();
    let mut per_node: BTreeMap<NodeId, usize> = BTreeMap::new();
    let mut lines = Vec::with_capacity(cluster.ranges.len() + 4);
    for spec in &cluster.ranges {
        let desc = spec.descriptor();
        let replica = oracle
            .choose_preferred_replica(None, &desc, spec.leaseholder.as_ref(), read_policy, Some(&mut qs))
            .with_context(|| format!("choosing replica for {}", spec.range_id))?;
        *per_node.entry(replica.node_id).or_default() += 1;
        lines.push(format!("{} -> {}", spec.range_id, replica));
    }

    lines.push(format!("-- {} ({:?})", policy, read_policy));
    for (node, count) in per_node {
        lines.push(format!("{}: {} range(s)", node, count));
    }
    Ok(CommandResult { lines })
}

/// Replica nodes missing from the descriptor store degrade selection; say so once each.
fn warn_unknown_nodes(cluster: &ClusterFile, cfg: &oracle::Config) {
    let Some(descs) = cfg.node_descs.as_ref() else {
        return;
    };
    let unknown: BTreeSet<NodeId> = cluster
        .ranges
        .iter()
        .flat_map(|r| r.replicas.iter().map(|rep| rep.node_id))
        .filter(|n| descs.node_descriptor(*n).is_none())
        .collect();
    for node in unknown {
        warn!(%node, "replica node has no descriptor; it will be ranked last");
    }
}
