//! Errors raised by oracles and the policy registry.

use corelib::RangeId;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, OracleError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OracleError {
    /// The range descriptor listed no replicas. Fatal to the planning step.
    #[error("range {range_id} has no replicas")]
    EmptyRange { range_id: RangeId },

    /// No constructor is registered under this policy.
    #[error("unknown replica oracle policy: {0}")]
    UnknownPolicy(String),

    /// Two constructors were registered under the same policy name.
    #[error("replica oracle policy registered twice: {0}")]
    DuplicatePolicy(String),

    /// The policy needs a collaborator the config does not provide.
    #[error("policy {policy} requires a {collaborator}")]
    MissingCollaborator {
        policy: &'static str,
        collaborator: &'static str,
    },

    #[error("invalid oracle config: {0}")]
    InvalidConfig(String),
}
