//! Error types for the capacity runtime.
//!
//! Every error here is a contract violation rather than a transient
//! condition: none of them should be retried.

use thiserror::Error;
use uuid::Uuid;

use crate::capacity::CapacityId;

/// Errors surfaced to code that requests or invokes a capacity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CapacityError {
    /// No skill is bound for the capacity on the given agent.
    #[error("capacity {capacity} is not implemented by agent {agent_id}")]
    UnimplementedCapacity { capacity: CapacityId, agent_id: Uuid },

    /// The owning agent of a trait has been dropped or detached.
    #[error("owner agent is unavailable")]
    OwnerUnavailable,

    /// The bound skill does not implement the expected capacity interface.
    #[error("skill {skill} bound to {capacity} does not implement {expected}")]
    IncompatibleSkill {
        capacity: CapacityId,
        skill: String,
        expected: &'static str,
    },
}

impl CapacityError {
    /// Build an [`CapacityError::UnimplementedCapacity`].
    pub fn unimplemented(capacity: CapacityId, agent_id: Uuid) -> Self {
        CapacityError::UnimplementedCapacity { capacity, agent_id }
    }

    /// The capacity this error concerns, if any.
    pub fn capacity(&self) -> Option<&CapacityId> {
        match self {
            CapacityError::UnimplementedCapacity { capacity, .. }
            | CapacityError::IncompatibleSkill { capacity, .. } => Some(capacity),
            CapacityError::OwnerUnavailable => None,
        }
    }
}

/// Registry-level miss: nothing was ever bound (or it was cleared) for the id.
///
/// Converted into [`CapacityError::UnimplementedCapacity`] at the agent
/// boundary, where the agent id is known.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no skill bound for capacity {0}")]
pub struct UnboundCapability(pub CapacityId);

impl UnboundCapability {
    /// Attach the agent id and surface as a caller-facing error.
    pub fn into_capacity_error(self, agent_id: Uuid) -> CapacityError {
        CapacityError::unimplemented(self.0, agent_id)
    }
}

/// Errors raised while loading [`RuntimeConfig`](crate::config::RuntimeConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration document is not valid YAML for the schema.
    #[error("config yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// An environment override carried an unusable value.
    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: String, value: String },
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unbound_converts_with_agent_id() {
        let id = Uuid::new_v4();
        let err = UnboundCapability(CapacityId::named("demo.Movement")).into_capacity_error(id);
        assert_eq!(
            err,
            CapacityError::UnimplementedCapacity {
                capacity: CapacityId::named("demo.Movement"),
                agent_id: id,
            }
        );
        assert_eq!(err.capacity().map(|c| c.name()), Some("demo.Movement"));
    }

    #[test]
    fn test_error_messages() {
        let id = Uuid::nil();
        let err = CapacityError::unimplemented(CapacityId::named("demo.Logging"), id);
        assert_eq!(
            err.to_string(),
            format!("capacity demo.Logging is not implemented by agent {}", id)
        );
        assert_eq!(CapacityError::OwnerUnavailable.to_string(), "owner agent is unavailable");
        assert!(CapacityError::OwnerUnavailable.capacity().is_none());
    }
}
