//! # Capacity Registry
//!
//! Per-agent mapping from capacity id to the skill currently bound for it.
//!
//! Each slot holds a shared [`ClearableReference`]. Rebinding a slot installs
//! a fresh reference and clears the old one, so every holder handed out
//! before the rebind observes the change the next time it is read and goes
//! back to the registry.
//!
//! Slots live in a sharded [`DashMap`]: lookups take a shard read lock just
//! long enough to clone an `Arc`, and writers only contend with readers of
//! the same shard. Binding several ids is applied id by id; there is no
//! batch rollback.

pub mod reference;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;

use crate::capacity::CapacityId;
use crate::errors::UnboundCapability;
use crate::skill::{BoundSkill, Skill};

pub use reference::ClearableReference;

/// Shared handle to one registry slot's current reference.
pub type SkillReference = Arc<ClearableReference<BoundSkill>>;

/// Snapshot of one binding, for introspection and logs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BindingInfo {
    /// Bound capacity.
    pub capacity: CapacityId,
    /// Name of the skill behind it.
    pub skill: String,
    /// When the binding was installed.
    pub bound_at: DateTime<Utc>,
}

/// Capacity id → currently bound skill.
#[derive(Debug, Default)]
pub struct CapacityRegistry {
    slots: DashMap<CapacityId, SkillReference>,
}

impl CapacityRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Install each binding in its slot, replacing and clearing whatever was
    /// there.
    ///
    /// Returns the displaced bindings in installation order. A displaced
    /// binding may hold the same skill as a new one (plain rebind).
    pub fn bind(&self, bindings: Vec<BoundSkill>) -> Vec<BoundSkill> {
        let mut displaced = Vec::new();
        for binding in bindings {
            let capacity = binding.capacity().clone();
            log::debug!("binding {} to {}", binding.skill().name(), capacity);
            let fresh = Arc::new(ClearableReference::new(binding));
            if let Some(previous) = self.slots.insert(capacity, fresh) {
                if let Some(old) = previous.clear() {
                    displaced.push(old);
                }
            }
        }
        displaced
    }

    /// The reference for `capacity`.
    ///
    /// Fails with [`UnboundCapability`] when nothing is bound. A reference
    /// obtained here may later read as cleared; that is distinct from never
    /// having been bound.
    pub fn lookup(&self, capacity: &CapacityId) -> Result<SkillReference, UnboundCapability> {
        log::trace!("lookup {}", capacity);
        self.slots
            .get(capacity)
            .map(|slot| Arc::clone(slot.value()))
            .ok_or_else(|| UnboundCapability(capacity.clone()))
    }

    /// Remove the binding for `capacity` and clear its reference.
    ///
    /// Returns the previously bound skill, or `None` if nothing was bound.
    pub fn clear(&self, capacity: &CapacityId) -> Option<BoundSkill> {
        let (_, reference) = self.slots.remove(capacity)?;
        let previous = reference.clear();
        if let Some(ref bound) = previous {
            log::debug!("cleared {} from {}", bound.skill().name(), capacity);
        }
        previous
    }

    /// Whether a skill is bound for `capacity`.
    pub fn contains(&self, capacity: &CapacityId) -> bool {
        self.slots.contains_key(capacity)
    }

    /// Whether `skill` is bound under any capacity.
    pub fn contains_skill(&self, skill: &Arc<dyn Skill>) -> bool {
        self.slots
            .iter()
            .any(|slot| slot.value().get().is_some_and(|bound| bound.is(skill)))
    }

    /// All currently bound capacity ids, sorted by name.
    pub fn capacities(&self) -> Vec<CapacityId> {
        let mut ids: Vec<CapacityId> = self.slots.iter().map(|slot| slot.key().clone()).collect();
        ids.sort();
        ids
    }

    /// Snapshot of all bindings, sorted by capacity name.
    pub fn bindings(&self) -> Vec<BindingInfo> {
        let mut infos: Vec<BindingInfo> = self
            .slots
            .iter()
            .filter_map(|slot| slot.value().get())
            .map(|bound| BindingInfo {
                capacity: bound.capacity().clone(),
                skill: bound.skill().name().to_string(),
                bound_at: bound.bound_at(),
            })
            .collect();
        infos.sort_by(|a, b| a.capacity.cmp(&b.capacity));
        infos
    }

    /// Number of bound capacities.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skill::{same_instance, CapacityMapping};
    use crate::test_support::{FlyingSkill, Logging, Movement, WalkingSkill};

    fn walking_binding(skill: &Arc<WalkingSkill>) -> BoundSkill {
        CapacityMapping::<WalkingSkill>::of::<dyn Movement>().bind(skill)
    }

    #[test]
    fn test_lookup_unbound() {
        let registry = CapacityRegistry::new();
        let err = registry.lookup(&CapacityId::of::<dyn Movement>()).unwrap_err();
        assert_eq!(err, UnboundCapability(CapacityId::of::<dyn Movement>()));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_bind_and_lookup() {
        let registry = CapacityRegistry::new();
        let skill = Arc::new(WalkingSkill::new());
        let displaced = registry.bind(vec![walking_binding(&skill)]);
        assert!(displaced.is_empty());

        let reference = registry.lookup(&CapacityId::of::<dyn Movement>()).unwrap();
        let bound = reference.get().unwrap();
        assert_eq!(bound.downcast::<dyn Movement>().unwrap().walk(), "walking");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_rebind_replaces_and_clears_previous_reference() {
        let registry = CapacityRegistry::new();
        let walking = Arc::new(WalkingSkill::new());
        let flying = Arc::new(FlyingSkill::new());
        let id = CapacityId::of::<dyn Movement>();

        registry.bind(vec![walking_binding(&walking)]);
        let before = registry.lookup(&id).unwrap();

        let displaced = registry.bind(vec![
            CapacityMapping::<FlyingSkill>::of::<dyn Movement>().bind(&flying)
        ]);
        assert_eq!(displaced.len(), 1);
        assert!(same_instance(displaced[0].skill(), &walking));

        assert!(before.is_cleared());
        let after = registry.lookup(&id).unwrap().get().unwrap();
        assert_eq!(after.downcast::<dyn Movement>().unwrap().walk(), "flying");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_clear_returns_previous() {
        let registry = CapacityRegistry::new();
        let skill = Arc::new(WalkingSkill::new());
        let id = CapacityId::of::<dyn Movement>();
        registry.bind(vec![walking_binding(&skill)]);
        let cached = registry.lookup(&id).unwrap();

        let previous = registry.clear(&id).unwrap();
        assert!(same_instance(previous.skill(), &skill));
        assert!(cached.is_cleared());
        assert!(registry.lookup(&id).is_err());
        assert!(!registry.contains(&id));
    }

    #[test]
    fn test_clear_unbound_is_noop() {
        let registry = CapacityRegistry::new();
        let skill = Arc::new(WalkingSkill::new());
        registry.bind(vec![walking_binding(&skill)]);

        assert!(registry.clear(&CapacityId::of::<dyn Logging>()).is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_contains_skill_tracks_aliases() {
        let registry = CapacityRegistry::new();
        let skill = Arc::new(WalkingSkill::new());
        let erased: Arc<dyn Skill> = skill.clone();
        registry.bind(vec![
            walking_binding(&skill),
            CapacityMapping::<WalkingSkill>::of::<dyn Logging>().bind(&skill),
        ]);
        assert!(registry.contains_skill(&erased));

        registry.clear(&CapacityId::of::<dyn Movement>());
        assert!(registry.contains_skill(&erased));

        registry.clear(&CapacityId::of::<dyn Logging>());
        assert!(!registry.contains_skill(&erased));
    }

    #[test]
    fn test_bindings_snapshot_sorted() {
        let registry = CapacityRegistry::new();
        let skill = Arc::new(WalkingSkill::new());
        registry.bind(vec![
            walking_binding(&skill),
            CapacityMapping::<WalkingSkill>::of::<dyn Logging>().bind(&skill),
        ]);

        let infos = registry.bindings();
        let names: Vec<&str> = infos.iter().map(|i| i.capacity.name()).collect();
        assert_eq!(names, vec!["demo.Logging", "demo.Movement"]);
        assert!(infos.iter().all(|i| i.skill.ends_with("WalkingSkill")));
        assert_eq!(
            registry.capacities(),
            vec![CapacityId::of::<dyn Logging>(), CapacityId::of::<dyn Movement>()]
        );
    }
}
