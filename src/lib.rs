//! # Agent Capacities
//!
//! Capacity/skill runtime for autonomous agents.
//!
//! An [`Agent`] exposes abstract capacities (object-safe traits tagged with
//! [`Capacity`]) and binds each of them at runtime to a concrete [`Skill`].
//! Agent traits such as [`Behavior`] reach capacities through a
//! [`SkillDelegator`] that resolves the bound skill on every call, so skills
//! can be replaced while behaviors keep their handles.
//!
//! ```
//! use std::sync::Arc;
//! use agent_capacities::{impl_capacity, impl_skill, Agent, Behavior, Skill};
//!
//! pub trait Movement: Send + Sync {
//!     fn walk(&self) -> String;
//! }
//! impl_capacity!(Movement, "demo.Movement");
//!
//! struct WalkingSkill;
//! impl Skill for WalkingSkill {}
//! impl Movement for WalkingSkill {
//!     fn walk(&self) -> String { "walking".into() }
//! }
//! impl_skill!(WalkingSkill => Movement);
//!
//! struct FlyingSkill;
//! impl Skill for FlyingSkill {}
//! impl Movement for FlyingSkill {
//!     fn walk(&self) -> String { "flying".into() }
//! }
//! impl_skill!(FlyingSkill => Movement);
//!
//! let agent = Agent::builder().build();
//! agent.map_skill::<dyn Movement, _>(Arc::new(WalkingSkill));
//!
//! let behavior = agent.register_behavior(Behavior::detached());
//! let movement = behavior.get_capacity::<dyn Movement>().unwrap();
//! assert_eq!(movement.call(|m| m.walk()).unwrap(), "walking");
//!
//! agent.map_skill::<dyn Movement, _>(Arc::new(FlyingSkill));
//! assert_eq!(movement.call(|m| m.walk()).unwrap(), "flying");
//! ```

pub mod agent;
pub mod agent_trait;
pub mod capacity;
pub mod config;
pub mod delegation;
pub mod errors;
pub mod registry;
pub mod skill;

#[cfg(test)]
mod test_support;

pub use agent::{Agent, AgentBuilder, AgentRef, BuiltinCapacitiesProvider, DynamicSkillProvider};
pub use agent_trait::{AgentTrait, Behavior};
pub use capacity::{Capacity, CapacityId, Implements};
pub use config::RuntimeConfig;
pub use delegation::SkillDelegator;
pub use errors::{CapacityError, ConfigError, UnboundCapability};
pub use registry::{BindingInfo, CapacityRegistry, ClearableReference, SkillReference};
pub use skill::{same_instance, BoundSkill, CapacityMapping, Skill, SkillOwner};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
