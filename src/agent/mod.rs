//! # Agents
//!
//! The [`Agent`] is the aggregate root: it owns the capacity registry and the
//! behaviors registered on it, and exposes the bind/clear/lookup surface the
//! rest of the runtime goes through.
//!
//! `Agent` is a cheap, clonable strong handle. Traits and skills keep an
//! [`AgentRef`] instead, which never keeps the agent alive.

pub mod core;
pub mod providers;

pub use self::core::{Agent, AgentBuilder, AgentRef};
pub use self::providers::{BuiltinCapacitiesProvider, DynamicSkillProvider};
