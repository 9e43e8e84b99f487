//! Skill providers consulted by an agent.
//!
//! A [`BuiltinCapacitiesProvider`] runs once, while the agent is being built,
//! and performs the initial batch of bindings. A [`DynamicSkillProvider`] is
//! asked on demand when a capacity lookup misses.

use crate::agent::Agent;
use crate::capacity::CapacityId;

/// Installs an agent's initial skills before the agent is handed out.
///
/// Closures of shape `Fn(&Agent)` implement this trait.
pub trait BuiltinCapacitiesProvider: Send + Sync {
    /// Bind the built-in skills on `agent`.
    fn builtin_capacities(&self, agent: &Agent);
}

impl<F> BuiltinCapacitiesProvider for F
where
    F: Fn(&Agent) + Send + Sync,
{
    fn builtin_capacities(&self, agent: &Agent) {
        self(agent)
    }
}

/// Installs skills lazily, the first time a capacity is requested.
///
/// Closures of shape `Fn(&Agent, &CapacityId) -> bool` implement this trait.
pub trait DynamicSkillProvider: Send + Sync {
    /// Try to bind a skill for `capacity` on `agent`.
    ///
    /// Returns `true` if a skill was installed. The agent retries the lookup
    /// once after a `true` return.
    ///
    /// Implementations must not look `capacity` up again on `agent` before
    /// binding it. Such a nested lookup is not forwarded to the provider a
    /// second time; it fails with `UnimplementedCapacity`.
    fn install_skill(&self, agent: &Agent, capacity: &CapacityId) -> bool;
}

impl<F> DynamicSkillProvider for F
where
    F: Fn(&Agent, &CapacityId) -> bool + Send + Sync,
{
    fn install_skill(&self, agent: &Agent, capacity: &CapacityId) -> bool {
        self(agent, capacity)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use crate::config::RuntimeConfig;
    use crate::errors::CapacityError;
    use crate::test_support::{Logging, Movement, WalkingSkill};

    struct OnDemandWalking {
        calls: AtomicUsize,
    }

    impl DynamicSkillProvider for OnDemandWalking {
        fn install_skill(&self, agent: &Agent, capacity: &CapacityId) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if *capacity == CapacityId::of::<dyn Movement>() {
                agent.map_skill::<dyn Movement, _>(Arc::new(WalkingSkill::new()));
                true
            } else {
                false
            }
        }
    }

    #[test]
    fn test_builtin_provider_runs_before_build_returns() {
        let agent = Agent::builder()
            .builtin_capacities(|agent: &Agent| {
                agent.map_skill::<dyn Movement, _>(Arc::new(WalkingSkill::new()));
            })
            .build();
        assert!(agent.has_skill::<dyn Movement>());
        assert_eq!(agent.get_skill::<dyn Movement>().unwrap().walk(), "walking");
    }

    #[test]
    fn test_dynamic_provider_installs_on_miss() {
        let provider = Arc::new(OnDemandWalking {
            calls: AtomicUsize::new(0),
        });
        let agent = Agent::builder()
            .dynamic_skill_provider(Arc::clone(&provider) as Arc<dyn DynamicSkillProvider>)
            .build();
        assert!(!agent.has_skill::<dyn Movement>());

        assert_eq!(agent.get_skill::<dyn Movement>().unwrap().walk(), "walking");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);

        // Now bound; the provider is not consulted again.
        agent.get_skill::<dyn Movement>().unwrap();
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_dynamic_provider_declines() {
        let agent = Agent::builder()
            .dynamic_skill_provider(Arc::new(|_: &Agent, _: &CapacityId| false))
            .build();
        let err = agent.get_skill::<dyn Logging>().err().unwrap();
        assert_eq!(
            err,
            CapacityError::unimplemented(CapacityId::of::<dyn Logging>(), agent.id())
        );
    }

    #[test]
    fn test_dynamic_install_disabled_by_config() {
        let provider = Arc::new(OnDemandWalking {
            calls: AtomicUsize::new(0),
        });
        let agent = Agent::builder()
            .config(RuntimeConfig {
                dynamic_skill_install: false,
                ..RuntimeConfig::default()
            })
            .dynamic_skill_provider(Arc::clone(&provider) as Arc<dyn DynamicSkillProvider>)
            .build();

        assert!(agent.get_skill::<dyn Movement>().is_err());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_reentrant_provider_gets_the_miss() {
        let nested = Arc::new(parking_lot::Mutex::new(None));
        let seen = Arc::clone(&nested);
        let agent = Agent::builder()
            .dynamic_skill_provider(Arc::new(move |agent: &Agent, capacity: &CapacityId| {
                *seen.lock() = Some(agent.lookup(capacity).err());
                false
            }))
            .build();

        let err = agent.get_skill::<dyn Movement>().err();
        let expected = CapacityError::unimplemented(CapacityId::of::<dyn Movement>(), agent.id());
        assert_eq!(err, Some(expected.clone()));
        assert_eq!(*nested.lock(), Some(Some(expected)));

        // The guard is released once the provider returns.
        assert!(agent.get_skill::<dyn Movement>().is_err());
    }
}
