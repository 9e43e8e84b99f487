//! # Capacity delegation
//!
//! [`SkillDelegator`] is the long-lived handle a trait keeps for "whatever
//! currently implements capacity `C`". It holds the trait's cached registry
//! reference and resolves the skill on every call, so a rebind that happens
//! after the handle was created is picked up on the next call without a
//! registry lookup per call.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::agent::{Agent, AgentRef};
use crate::capacity::{Capacity, CapacityId};
use crate::errors::CapacityError;
use crate::registry::{ClearableReference, SkillReference};
use crate::skill::BoundSkill;

/// A trait-side cache entry for one capacity.
///
/// Shared between the trait's cache and every delegator built from it, so a
/// re-resolution by any of them refreshes all of them. The entry remembers
/// which agent the reference came from; it is never used for another one.
pub(crate) struct CachedReference {
    entry: RwLock<CacheEntry>,
}

struct CacheEntry {
    reference: SkillReference,
    source: AgentRef,
}

impl CachedReference {
    pub(crate) fn new(reference: SkillReference, source: &Agent) -> Self {
        Self {
            entry: RwLock::new(CacheEntry {
                reference,
                source: source.downgrade(),
            }),
        }
    }

    /// Whether the entry came from `agent` and has not been cleared since.
    pub(crate) fn is_valid_for(&self, agent: &Agent) -> bool {
        let entry = self.entry.read();
        entry.source.refers_to(agent) && !entry.reference.is_cleared()
    }

    /// The bound skill, if the entry came from `agent` and is still live.
    pub(crate) fn bound_for(&self, agent: &Agent) -> Option<BoundSkill> {
        let entry = self.entry.read();
        if entry.source.refers_to(agent) {
            entry.reference.get()
        } else {
            None
        }
    }

    pub(crate) fn replace(&self, reference: SkillReference, source: &Agent) {
        *self.entry.write() = CacheEntry {
            reference,
            source: source.downgrade(),
        };
    }

    /// Drop the cached registry reference so the next use re-resolves.
    pub(crate) fn reset(&self) {
        *self.entry.write() = CacheEntry {
            reference: Arc::new(ClearableReference::empty()),
            source: AgentRef::detached(),
        };
    }
}

/// Project a bound skill onto capacity `C`.
pub(crate) fn project<C: Capacity + ?Sized>(bound: &BoundSkill) -> Result<Arc<C>, CapacityError> {
    bound.downcast::<C>().ok_or_else(|| {
        log::warn!(
            "skill {} bound to {} is a {}, not a {}",
            bound.skill().name(),
            bound.capacity(),
            bound.view_type(),
            std::any::type_name::<C>()
        );
        CapacityError::IncompatibleSkill {
            capacity: bound.capacity().clone(),
            skill: bound.skill().name().to_string(),
            expected: std::any::type_name::<C>(),
        }
    })
}

/// Call-time dispatcher to the skill bound for capacity `C`.
///
/// Obtained from [`AgentTrait::get_capacity`](crate::AgentTrait::get_capacity).
pub struct SkillDelegator<C: Capacity + ?Sized> {
    capacity: CapacityId,
    cached: Arc<CachedReference>,
    owner: Arc<RwLock<AgentRef>>,
    _capacity: PhantomData<fn() -> Arc<C>>,
}

impl<C: Capacity + ?Sized> SkillDelegator<C> {
    /// Build a delegator and check that the skill bound right now actually
    /// implements `C`.
    pub(crate) fn new(
        cached: Arc<CachedReference>,
        owner: Arc<RwLock<AgentRef>>,
    ) -> Result<Self, CapacityError> {
        let delegator = Self {
            capacity: CapacityId::of::<C>(),
            cached,
            owner,
            _capacity: PhantomData,
        };
        delegator.resolve()?;
        Ok(delegator)
    }

    /// The capacity this delegator dispatches to.
    pub fn capacity(&self) -> &CapacityId {
        &self.capacity
    }

    /// Resolve the skill currently bound for `C`.
    ///
    /// If the cached reference was cleared by a rebind or clear, or belongs
    /// to a previous owner, the owner's registry is consulted again and the
    /// cache refreshed.
    pub fn resolve(&self) -> Result<Arc<C>, CapacityError> {
        let agent = self.owner.read().upgrade().ok_or_else(|| {
            log::warn!("capacity {} requested from a detached trait", self.capacity);
            CapacityError::OwnerUnavailable
        })?;

        let bound = match self.cached.bound_for(&agent) {
            Some(bound) => bound,
            None => {
                let (fresh, bound) = agent.resolve_reference(&self.capacity)?;
                log::trace!("refreshed cached reference for {}", self.capacity);
                self.cached.replace(fresh, &agent);
                bound
            }
        };
        project::<C>(&bound)
    }

    /// Invoke `f` against the skill currently bound for `C`.
    pub fn call<R>(&self, f: impl FnOnce(&C) -> R) -> Result<R, CapacityError> {
        let skill = self.resolve()?;
        Ok(f(&skill))
    }
}

impl<C: Capacity + ?Sized> Clone for SkillDelegator<C> {
    fn clone(&self) -> Self {
        Self {
            capacity: self.capacity.clone(),
            cached: Arc::clone(&self.cached),
            owner: Arc::clone(&self.owner),
            _capacity: PhantomData,
        }
    }
}

impl<C: Capacity + ?Sized> fmt::Debug for SkillDelegator<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SkillDelegator")
            .field("capacity", &self.capacity)
            .field("owner", &*self.owner.read())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
