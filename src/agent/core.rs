//! Core Agent aggregate.
//!
//! Owns the capacity registry, the runtime configuration, the optional
//! dynamic skill provider, and the behaviors registered on the agent.

use std::fmt;
use std::sync::{Arc, Weak};

use std::thread::{self, ThreadId};

use parking_lot::{Mutex, RwLock};
use uuid::Uuid;

use crate::agent::providers::{BuiltinCapacitiesProvider, DynamicSkillProvider};
use crate::agent_trait::Behavior;
use crate::capacity::{Capacity, CapacityId, Implements};
use crate::config::RuntimeConfig;
use crate::delegation::project;
use crate::errors::CapacityError;
use crate::registry::{BindingInfo, CapacityRegistry, SkillReference};
use crate::skill::{same_instance, BoundSkill, CapacityMapping, Skill};

struct AgentInner {
    id: Uuid,
    parent_id: Option<Uuid>,
    config: RuntimeConfig,
    registry: CapacityRegistry,
    /// Serializes binds and clears together with their lifecycle hooks.
    writer: Mutex<()>,
    dynamic_provider: Option<Arc<dyn DynamicSkillProvider>>,
    /// Capacities a dynamic provider is currently installing, per thread.
    installing: Mutex<Vec<(CapacityId, ThreadId)>>,
    behaviors: RwLock<Vec<Arc<Behavior>>>,
}

/// An autonomous agent: identity plus the capacities it currently has.
///
/// Cloning an `Agent` clones the handle, not the agent.
#[derive(Clone)]
pub struct Agent {
    inner: Arc<AgentInner>,
}

impl Agent {
    /// Create an agent with an empty registry and default configuration.
    pub fn new(parent_id: Option<Uuid>, id: Uuid) -> Self {
        Self::builder().id(id).maybe_parent_id(parent_id).build()
    }

    /// Start building an agent.
    pub fn builder() -> AgentBuilder {
        AgentBuilder::default()
    }

    /// Unique identifier of the agent.
    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    /// Identifier of the agent that spawned this one, if any.
    pub fn parent_id(&self) -> Option<Uuid> {
        self.inner.parent_id
    }

    /// Runtime configuration.
    pub fn config(&self) -> &RuntimeConfig {
        &self.inner.config
    }

    /// A non-owning handle to this agent.
    pub fn downgrade(&self) -> AgentRef {
        AgentRef {
            id: Some(self.inner.id),
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Whether both handles refer to the same agent.
    pub fn ptr_eq(&self, other: &Agent) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    // -----------------------------------------------------------------------
    // Binding
    // -----------------------------------------------------------------------

    /// Bind `skill` to every capacity in `capacities`.
    ///
    /// Each capacity is replaced independently; previous holders of those
    /// capacities are invalidated. Returns the skill that was passed in.
    ///
    /// Binds and clears on one agent are serialized, hooks included, so a
    /// skill's install state always matches whether it is bound. Hooks must
    /// not bind or clear skills on the same agent.
    pub fn set_skill<S: Skill>(&self, skill: Arc<S>, capacities: &[CapacityMapping<S>]) -> Arc<S> {
        if capacities.is_empty() {
            log::debug!("agent {}: no capacities given for {}", self.id(), skill.name());
            return skill;
        }

        let bindings: Vec<BoundSkill> = capacities.iter().map(|m| m.bind(&skill)).collect();
        let hooks = self.inner.config.lifecycle_hooks;

        let _writer = self.inner.writer.lock();
        if hooks {
            let erased: Arc<dyn Skill> = Arc::clone(&skill) as Arc<dyn Skill>;
            if !self.inner.registry.contains_skill(&erased) {
                log::debug!("agent {}: installing {}", self.id(), skill.name());
                skill.install(&self.downgrade());
            }
        }

        let displaced = self.inner.registry.bind(bindings);
        if hooks {
            self.uninstall_orphans(displaced);
        }
        skill
    }

    /// Bind `skill` to the single capacity `C`.
    pub fn map_skill<C, S>(&self, skill: Arc<S>) -> Arc<S>
    where
        C: Capacity + ?Sized,
        S: Implements<C>,
    {
        self.set_skill(skill, &[CapacityMapping::of::<C>()])
    }

    /// Remove the skill bound to `C`.
    ///
    /// Returns the previously bound skill; `None` (and no effect) if nothing
    /// was bound.
    pub fn clear_skill<C: Capacity + ?Sized>(&self) -> Option<Arc<dyn Skill>> {
        self.clear_skill_by_id(&CapacityId::of::<C>())
    }

    /// Remove the skill bound to `capacity`.
    pub fn clear_skill_by_id(&self, capacity: &CapacityId) -> Option<Arc<dyn Skill>> {
        let _writer = self.inner.writer.lock();
        let previous = self.inner.registry.clear(capacity)?;
        let skill = Arc::clone(previous.skill());
        if self.inner.config.lifecycle_hooks {
            self.uninstall_orphans(vec![previous]);
        }
        Some(skill)
    }

    /// Run `uninstall` on displaced skills that are no longer bound anywhere.
    /// Called with the writer lock held.
    fn uninstall_orphans(&self, displaced: Vec<BoundSkill>) {
        let mut seen: Vec<Arc<dyn Skill>> = Vec::new();
        for bound in displaced {
            let skill = bound.skill();
            if seen.iter().any(|s| same_instance(s, skill)) {
                continue;
            }
            seen.push(Arc::clone(skill));
            if !self.inner.registry.contains_skill(skill) {
                log::debug!("agent {}: uninstalling {}", self.id(), skill.name());
                skill.uninstall();
            }
        }
    }

    // -----------------------------------------------------------------------
    // Lookup
    // -----------------------------------------------------------------------

    /// The registry reference for `capacity`.
    ///
    /// On a miss the dynamic skill provider (if any, and if enabled) gets one
    /// chance to install a skill. A provider that looks the same capacity up
    /// again from inside `install_skill` gets the miss, not another call.
    pub fn lookup(&self, capacity: &CapacityId) -> Result<SkillReference, CapacityError> {
        let unbound = match self.inner.registry.lookup(capacity) {
            Ok(reference) => return Ok(reference),
            Err(unbound) => unbound,
        };

        if self.inner.config.dynamic_skill_install {
            if let Some(provider) = &self.inner.dynamic_provider {
                if let Some(_guard) = InstallGuard::enter(&self.inner.installing, capacity) {
                    if provider.install_skill(self, capacity) {
                        log::debug!("agent {}: dynamically installed {}", self.id(), capacity);
                        return self
                            .inner
                            .registry
                            .lookup(capacity)
                            .map_err(|e| e.into_capacity_error(self.id()));
                    }
                } else {
                    log::warn!(
                        "agent {}: dynamic provider re-entered lookup for {}",
                        self.id(),
                        capacity
                    );
                }
            }
        }
        Err(unbound.into_capacity_error(self.id()))
    }

    /// Look `capacity` up and read the bound skill.
    ///
    /// A reference that was replaced between the lookup and the read comes
    /// back cleared; the lookup is then repeated. Only a registry miss is
    /// reported as `UnimplementedCapacity`.
    pub(crate) fn resolve_reference(
        &self,
        capacity: &CapacityId,
    ) -> Result<(SkillReference, BoundSkill), CapacityError> {
        loop {
            let reference = self.lookup(capacity)?;
            if let Some(bound) = reference.get() {
                return Ok((reference, bound));
            }
            log::trace!("agent {}: {} rebound during lookup, retrying", self.id(), capacity);
        }
    }

    /// The skill bound to `C`, viewed as `C`.
    pub fn get_skill<C: Capacity + ?Sized>(&self) -> Result<Arc<C>, CapacityError> {
        let bound = self.resolve(&CapacityId::of::<C>())?;
        project::<C>(&bound)
    }

    /// The skill instance bound to `capacity`.
    pub fn skill_of(&self, capacity: &CapacityId) -> Result<Arc<dyn Skill>, CapacityError> {
        Ok(Arc::clone(self.resolve(capacity)?.skill()))
    }

    fn resolve(&self, capacity: &CapacityId) -> Result<BoundSkill, CapacityError> {
        self.resolve_reference(capacity).map(|(_, bound)| bound)
    }

    /// Whether a skill is bound to `C`.
    pub fn has_skill<C: Capacity + ?Sized>(&self) -> bool {
        self.has_skill_id(&CapacityId::of::<C>())
    }

    /// Whether a skill is bound to `capacity`.
    pub fn has_skill_id(&self, capacity: &CapacityId) -> bool {
        self.inner.registry.contains(capacity)
    }

    /// Bound capacity ids, sorted by name.
    pub fn capacities(&self) -> Vec<CapacityId> {
        self.inner.registry.capacities()
    }

    /// Snapshot of the current bindings.
    pub fn bindings(&self) -> Vec<BindingInfo> {
        self.inner.registry.bindings()
    }

    // -----------------------------------------------------------------------
    // Behaviors
    // -----------------------------------------------------------------------

    /// Take ownership of `behavior` and make this agent its owner.
    pub fn register_behavior(&self, behavior: Behavior) -> Arc<Behavior> {
        behavior.set_owner(self);
        let behavior = Arc::new(behavior);
        self.inner.behaviors.write().push(Arc::clone(&behavior));
        log::debug!("agent {}: registered behavior {}", self.id(), behavior.id());
        behavior
    }

    /// Drop ownership of `behavior` and detach it.
    ///
    /// Returns `false` if the behavior was not registered on this agent.
    pub fn unregister_behavior(&self, behavior: &Arc<Behavior>) -> bool {
        let removed = {
            let mut behaviors = self.inner.behaviors.write();
            let before = behaviors.len();
            behaviors.retain(|b| !Arc::ptr_eq(b, behavior));
            behaviors.len() != before
        };
        if removed {
            behavior.clear_owner();
            log::debug!("agent {}: unregistered behavior {}", self.id(), behavior.id());
        }
        removed
    }

    /// Behaviors currently registered on the agent.
    pub fn behaviors(&self) -> Vec<Arc<Behavior>> {
        self.inner.behaviors.read().clone()
    }
}

impl fmt::Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("id", &self.inner.id)
            .field("parent_id", &self.inner.parent_id)
            .field("capacities", &self.inner.registry.capacities())
            .finish()
    }
}

impl fmt::Display for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Agent({})", self.inner.id)
    }
}

// ---------------------------------------------------------------------------
// AgentRef
// ---------------------------------------------------------------------------

/// Non-owning, possibly expired handle to an [`Agent`].
#[derive(Clone, Default)]
pub struct AgentRef {
    id: Option<Uuid>,
    inner: Weak<AgentInner>,
}

impl AgentRef {
    /// A handle that never resolves.
    pub fn detached() -> Self {
        Self::default()
    }

    /// The agent, if it is still alive.
    pub fn upgrade(&self) -> Option<Agent> {
        self.inner.upgrade().map(|inner| Agent { inner })
    }

    /// Id of the referenced agent, even if it has since been dropped.
    pub fn id(&self) -> Option<Uuid> {
        self.id
    }

    /// Whether the referenced agent is still alive.
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }

    /// Whether this handle points at `agent`.
    pub fn refers_to(&self, agent: &Agent) -> bool {
        std::ptr::eq(self.inner.as_ptr(), Arc::as_ptr(&agent.inner))
    }
}

/// Marks a capacity as being installed by the dynamic provider on the
/// current thread for as long as the guard lives.
struct InstallGuard<'a> {
    installing: &'a Mutex<Vec<(CapacityId, ThreadId)>>,
    entry: (CapacityId, ThreadId),
}

impl<'a> InstallGuard<'a> {
    fn enter(installing: &'a Mutex<Vec<(CapacityId, ThreadId)>>, capacity: &CapacityId) -> Option<Self> {
        let entry = (capacity.clone(), thread::current().id());
        let mut active = installing.lock();
        if active.contains(&entry) {
            return None;
        }
        active.push(entry.clone());
        Some(Self { installing, entry })
    }
}

impl Drop for InstallGuard<'_> {
    fn drop(&mut self) {
        let mut active = self.installing.lock();
        if let Some(pos) = active.iter().position(|e| *e == self.entry) {
            active.swap_remove(pos);
        }
    }
}

impl fmt::Debug for AgentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id {
            Some(id) if self.is_alive() => write!(f, "AgentRef({})", id),
            Some(id) => write!(f, "AgentRef({}, dropped)", id),
            None => f.write_str("AgentRef(detached)"),
        }
    }
}

// ---------------------------------------------------------------------------
// AgentBuilder
// ---------------------------------------------------------------------------

/// Builder for [`Agent`].
#[derive(Default)]
pub struct AgentBuilder {
    id: Option<Uuid>,
    parent_id: Option<Uuid>,
    config: RuntimeConfig,
    builtin: Vec<Box<dyn BuiltinCapacitiesProvider>>,
    dynamic_provider: Option<Arc<dyn DynamicSkillProvider>>,
}

impl AgentBuilder {
    /// Set the agent id (random v4 otherwise).
    pub fn id(mut self, id: Uuid) -> Self {
        self.id = Some(id);
        self
    }

    /// Set the parent agent id.
    pub fn parent_id(mut self, parent_id: Uuid) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    fn maybe_parent_id(mut self, parent_id: Option<Uuid>) -> Self {
        self.parent_id = parent_id;
        self
    }

    /// Set the runtime configuration.
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Add a provider of built-in skills. Providers run in insertion order
    /// during [`build`](Self::build).
    pub fn builtin_capacities(mut self, provider: impl BuiltinCapacitiesProvider + 'static) -> Self {
        self.builtin.push(Box::new(provider));
        self
    }

    /// Set the provider consulted on lookup misses.
    pub fn dynamic_skill_provider(mut self, provider: Arc<dyn DynamicSkillProvider>) -> Self {
        self.dynamic_provider = Some(provider);
        self
    }

    /// Create the agent and run the built-in providers.
    pub fn build(self) -> Agent {
        let agent = Agent {
            inner: Arc::new(AgentInner {
                id: self.id.unwrap_or_else(Uuid::new_v4),
                parent_id: self.parent_id,
                config: self.config,
                registry: CapacityRegistry::new(),
                writer: Mutex::new(()),
                dynamic_provider: self.dynamic_provider,
                installing: Mutex::new(Vec::new()),
                behaviors: RwLock::new(Vec::new()),
            }),
        };
        for provider in &self.builtin {
            provider.builtin_capacities(&agent);
        }
        log::debug!(
            "agent {} ready with {} capacities",
            agent.id(),
            agent.inner.registry.len()
        );
        agent
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
