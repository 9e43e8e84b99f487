//! Behavior: the agent trait kind that reacts on behalf of an agent.

use std::fmt;
use std::ops::Deref;

use uuid::Uuid;

use super::AgentTrait;
use crate::agent::Agent;

const KIND: &str = "Behavior";

/// A behavior of an agent.
///
/// Dereferences to [`AgentTrait`] for owner management and capacity access.
pub struct Behavior {
    id: Uuid,
    core: AgentTrait,
}

impl Behavior {
    /// A behavior owned by `agent`.
    pub fn new(agent: &Agent) -> Self {
        Self {
            id: Uuid::new_v4(),
            core: AgentTrait::with_owner(KIND, agent),
        }
    }

    /// A behavior with no owner yet.
    pub fn detached() -> Self {
        Self {
            id: Uuid::new_v4(),
            core: AgentTrait::new(KIND),
        }
    }

    /// Unique identifier of the behavior.
    pub fn id(&self) -> Uuid {
        self.id
    }
}

impl Deref for Behavior {
    type Target = AgentTrait;

    fn deref(&self) -> &AgentTrait {
        &self.core
    }
}

impl fmt::Display for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.core, f)
    }
}

impl fmt::Debug for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Behavior")
            .field("id", &self.id)
            .field("core", &self.core)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
