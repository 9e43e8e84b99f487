//! # Agent traits
//!
//! An agent trait is a reusable slice of agent behavior that consumes
//! capacities. It never owns its agent: the back-reference is an
//! [`AgentRef`] set and cleared explicitly, so a trait can be built before
//! its agent exists and must cope with the agent going away.
//!
//! Capacity lookups are cached per trait. The cache holds registry
//! references, not skills, and every [`SkillDelegator`] handed out shares its
//! cache entry, so rebinding is observed without a lookup per call.

pub mod behavior;

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;

use crate::agent::{Agent, AgentRef};
use crate::capacity::{Capacity, CapacityId, Implements};
use crate::delegation::{CachedReference, SkillDelegator};
use crate::errors::CapacityError;
use crate::skill::{CapacityMapping, Skill};

pub use behavior::Behavior;

/// Shared state of every kind of agent trait.
pub struct AgentTrait {
    kind: &'static str,
    owner: Arc<RwLock<AgentRef>>,
    cache: DashMap<CapacityId, Arc<CachedReference>>,
}

impl AgentTrait {
    /// A trait with no owner yet.
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            owner: Arc::new(RwLock::new(AgentRef::detached())),
            cache: DashMap::new(),
        }
    }

    /// A trait owned by `agent`.
    pub fn with_owner(kind: &'static str, agent: &Agent) -> Self {
        let core = Self::new(kind);
        core.set_owner(agent);
        core
    }

    /// Kind label used in `Display` (e.g. `"Behavior"`).
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Attach the trait to `agent`.
    ///
    /// Cached capacity references belong to the previous owner and are
    /// dropped; outstanding delegators re-resolve through the new owner.
    pub fn set_owner(&self, agent: &Agent) {
        *self.owner.write() = agent.downgrade();
        self.reset_cache();
    }

    /// Detach the trait from its owner.
    pub fn clear_owner(&self) {
        *self.owner.write() = AgentRef::detached();
        self.reset_cache();
    }

    /// The owning agent, if attached and still alive.
    pub fn owner(&self) -> Option<Agent> {
        self.owner.read().upgrade()
    }

    /// The raw owner handle.
    pub fn owner_ref(&self) -> AgentRef {
        self.owner.read().clone()
    }

    fn require_owner(&self) -> Result<Agent, CapacityError> {
        self.owner().ok_or_else(|| {
            log::warn!("{} has no owner agent", self.kind);
            CapacityError::OwnerUnavailable
        })
    }

    fn reset_cache(&self) {
        for entry in self.cache.iter() {
            entry.value().reset();
        }
        self.cache.clear();
    }

    /// A delegator to whatever skill implements `C` on the owner.
    ///
    /// Uses the trait's cached reference when it is still valid, otherwise
    /// asks the owner's registry and caches the result.
    pub fn get_capacity<C: Capacity + ?Sized>(&self) -> Result<SkillDelegator<C>, CapacityError> {
        let agent = self.require_owner()?;
        let capacity = CapacityId::of::<C>();

        let cached = match self.cache.get(&capacity).map(|e| Arc::clone(e.value())) {
            Some(cached) if cached.is_valid_for(&agent) => cached,
            Some(stale) => {
                stale.replace(agent.lookup(&capacity)?, &agent);
                stale
            }
            None => {
                let cached = Arc::new(CachedReference::new(agent.lookup(&capacity)?, &agent));
                if agent.config().cache_capacities {
                    self.cache.insert(capacity, Arc::clone(&cached));
                }
                cached
            }
        };
        SkillDelegator::new(cached, Arc::clone(&self.owner))
    }

    /// The skill bound to `C` on the owner, bypassing the trait cache.
    pub fn get_skill<C: Capacity + ?Sized>(&self) -> Result<Arc<C>, CapacityError> {
        self.require_owner()?.get_skill::<C>()
    }

    /// Bind `skill` to `capacities` on the owner.
    pub fn set_skill<S: Skill>(
        &self,
        skill: Arc<S>,
        capacities: &[CapacityMapping<S>],
    ) -> Result<Arc<S>, CapacityError> {
        Ok(self.require_owner()?.set_skill(skill, capacities))
    }

    /// Bind `skill` to the single capacity `C` on the owner.
    pub fn map_skill<C, S>(&self, skill: Arc<S>) -> Result<Arc<S>, CapacityError>
    where
        C: Capacity + ?Sized,
        S: Implements<C>,
    {
        Ok(self.require_owner()?.map_skill::<C, S>(skill))
    }

    /// Clear the skill bound to `C` on the owner.
    pub fn clear_skill<C: Capacity + ?Sized>(&self) -> Result<Option<Arc<dyn Skill>>, CapacityError> {
        Ok(self.require_owner()?.clear_skill::<C>())
    }

    /// Whether the owner has a skill bound to `C`.
    pub fn has_skill<C: Capacity + ?Sized>(&self) -> Result<bool, CapacityError> {
        Ok(self.require_owner()?.has_skill::<C>())
    }

    /// Number of cached capacity references.
    pub fn cached_capacities(&self) -> usize {
        self.cache.len()
    }
}

impl fmt::Display for AgentTrait {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.owner() {
            Some(agent) => write!(f, "{} [owner = {}]", self.kind, agent.id()),
            None => write!(f, "{} [owner = none]", self.kind),
        }
    }
}

impl fmt::Debug for AgentTrait {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentTrait")
            .field("kind", &self.kind)
            .field("owner", &*self.owner.read())
            .field("cached", &self.cache.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
