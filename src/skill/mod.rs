//! # Skills
//!
//! A skill is the concrete object behind one or more capacities. Skills are
//! created outside the registry (by agent initialization code or a provider),
//! bound to capacity ids with [`Agent::set_skill`](crate::Agent::set_skill),
//! and optionally cleared again.
//!
//! Lifecycle hooks follow the same shape as other hook traits in this crate:
//! every method has a no-op default and takes `&self`, so skills keep any
//! mutable state behind interior mutability.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::agent::{Agent, AgentRef};
use crate::capacity::{Capacity, CapacityId, Implements};

/// Type-erased capacity view. Always holds an `Arc<C>` for the capacity `C`
/// it was projected onto.
pub(crate) type CapacityView = Arc<dyn Any + Send + Sync>;

/// A concrete implementation of one or more capacities.
pub trait Skill: Send + Sync + 'static {
    /// Human-readable skill name, used in logs and errors.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Called when the skill becomes reachable on `owner`.
    ///
    /// Not called again when the skill is bound to further capacities of the
    /// same agent while it is still reachable.
    fn install(&self, owner: &AgentRef) {
        let _ = owner;
    }

    /// Called when a clear or rebind leaves the skill unreachable from the
    /// agent that installed it.
    fn uninstall(&self) {}
}

/// Non-owning back-reference a skill keeps to its agent.
///
/// Embed this in a skill and record the owner from [`Skill::install`].
#[derive(Default)]
pub struct SkillOwner {
    owner: RwLock<AgentRef>,
}

impl SkillOwner {
    /// Create an empty owner cell.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the owning agent.
    pub fn set(&self, owner: &AgentRef) {
        *self.owner.write() = owner.clone();
    }

    /// Forget the owning agent.
    pub fn clear(&self) {
        *self.owner.write() = AgentRef::detached();
    }

    /// The owning agent, if it is still alive.
    pub fn get(&self) -> Option<Agent> {
        self.owner.read().upgrade()
    }

    /// The raw weak handle.
    pub fn handle(&self) -> AgentRef {
        self.owner.read().clone()
    }
}

impl fmt::Debug for SkillOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SkillOwner")
            .field("owner", &*self.owner.read())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// CapacityMapping
// ---------------------------------------------------------------------------

/// One `capacity -> skill` mapping handed to `set_skill`.
///
/// Carries the capacity id and the typed projection of the skill onto that
/// capacity, so the registry can hand out `Arc<C>` later without reflection.
pub struct CapacityMapping<S: Skill> {
    capacity: CapacityId,
    project: fn(Arc<S>) -> CapacityView,
    expected: &'static str,
}

impl<S: Skill> CapacityMapping<S> {
    /// Map the skill `S` to the capacity `C`.
    pub fn of<C>() -> Self
    where
        C: Capacity + ?Sized,
        S: Implements<C>,
    {
        fn project<S, C>(skill: Arc<S>) -> CapacityView
        where
            C: Capacity + ?Sized,
            S: Implements<C>,
        {
            Arc::new(skill.as_capacity())
        }

        Self {
            capacity: CapacityId::of::<C>(),
            project: project::<S, C>,
            expected: std::any::type_name::<C>(),
        }
    }

    /// The capacity this mapping targets.
    pub fn capacity(&self) -> &CapacityId {
        &self.capacity
    }

    pub(crate) fn bind(&self, skill: &Arc<S>) -> BoundSkill {
        let view = (self.project)(Arc::clone(skill));
        let skill: Arc<dyn Skill> = Arc::clone(skill) as Arc<dyn Skill>;
        BoundSkill {
            capacity: self.capacity.clone(),
            skill,
            view,
            view_type: self.expected,
            bound_at: Utc::now(),
        }
    }
}

impl<S: Skill> Clone for CapacityMapping<S> {
    fn clone(&self) -> Self {
        Self {
            capacity: self.capacity.clone(),
            project: self.project,
            expected: self.expected,
        }
    }
}

impl<S: Skill> fmt::Debug for CapacityMapping<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapacityMapping")
            .field("capacity", &self.capacity)
            .field("skill", &std::any::type_name::<S>())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// BoundSkill
// ---------------------------------------------------------------------------

/// A skill as it sits in a registry slot: the skill itself plus its view onto
/// the slot's capacity.
#[derive(Clone)]
pub struct BoundSkill {
    capacity: CapacityId,
    skill: Arc<dyn Skill>,
    view: CapacityView,
    view_type: &'static str,
    bound_at: DateTime<Utc>,
}

impl BoundSkill {
    /// The capacity this binding satisfies.
    pub fn capacity(&self) -> &CapacityId {
        &self.capacity
    }

    /// The bound skill instance.
    pub fn skill(&self) -> &Arc<dyn Skill> {
        &self.skill
    }

    /// When the binding was installed.
    pub fn bound_at(&self) -> DateTime<Utc> {
        self.bound_at
    }

    /// Type name of the capacity view stored at bind time.
    pub fn view_type(&self) -> &'static str {
        self.view_type
    }

    /// The skill viewed as capacity `C`, or `None` if it was bound under a
    /// different capacity interface.
    pub fn downcast<C: Capacity + ?Sized>(&self) -> Option<Arc<C>> {
        self.view.downcast_ref::<Arc<C>>().cloned()
    }

    /// Whether this binding holds exactly `skill` (by identity).
    pub fn is(&self, skill: &Arc<dyn Skill>) -> bool {
        same_instance(&self.skill, skill)
    }
}

impl fmt::Debug for BoundSkill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundSkill")
            .field("capacity", &self.capacity)
            .field("skill", &self.skill.name())
            .field("bound_at", &self.bound_at)
            .finish()
    }
}

/// Identity comparison across differently-typed handles to the same skill.
///
/// Compares data pointers only, so an `Arc<dyn Movement>` and an
/// `Arc<dyn Logging>` projected from one skill compare equal.
pub fn same_instance<A: ?Sized, B: ?Sized>(a: &Arc<A>, b: &Arc<B>) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
