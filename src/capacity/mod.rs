//! # Capacities
//!
//! A capacity is an abstract operation set an agent may need. In this crate a
//! capacity is an ordinary object-safe Rust trait; the trait object type
//! (`dyn Movement`) is tagged with [`Capacity`] so it can be used as a
//! registry key, and concrete skills declare which capacities they satisfy
//! through [`Implements`].
//!
//! ```
//! use std::sync::Arc;
//! use agent_capacities::{impl_capacity, impl_skill, Skill};
//!
//! pub trait Movement: Send + Sync {
//!     fn walk(&self) -> String;
//! }
//! impl_capacity!(Movement, "demo.Movement");
//!
//! struct WalkingSkill;
//! impl Movement for WalkingSkill {
//!     fn walk(&self) -> String { "walking".into() }
//! }
//! impl Skill for WalkingSkill {}
//! impl_skill!(WalkingSkill => Movement);
//!
//! use agent_capacities::{Capacity, Implements};
//! let view: Arc<dyn Movement> = Arc::new(WalkingSkill).as_capacity();
//! assert_eq!(view.walk(), "walking");
//! assert_eq!(<dyn Movement as Capacity>::NAME, "demo.Movement");
//! ```

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::skill::Skill;

/// Marker for capacity trait objects.
///
/// Implemented for `dyn SomeCapacity`, never for concrete skills. The `NAME`
/// is the stable identity used as the registry key; two trait types that
/// declare the same name share one registry slot, and a mismatch between
/// them is reported as an incompatible skill at dispatch time.
pub trait Capacity: Send + Sync + 'static {
    /// Stable, fully-qualified capacity name.
    const NAME: &'static str;

    /// Registry key for this capacity.
    fn id() -> CapacityId {
        CapacityId::named(Self::NAME)
    }
}

/// A skill's projection onto one capacity.
///
/// This is the explicit stand-in for a runtime cast: the implementation is
/// almost always `self` (unsizing `Arc<Skill>` to `Arc<dyn Capacity>`), see
/// [`impl_skill!`](crate::impl_skill).
pub trait Implements<C: Capacity + ?Sized>: Skill {
    /// View this skill as the capacity `C`.
    fn as_capacity(self: Arc<Self>) -> Arc<C>;
}

/// Identifier of a capacity inside a registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CapacityId(Cow<'static, str>);

impl CapacityId {
    /// Identifier for the capacity type `C`.
    pub fn of<C: Capacity + ?Sized>() -> Self {
        C::id()
    }

    /// Identifier from a bare name (e.g. coming from configuration or logs).
    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        CapacityId(name.into())
    }

    /// The capacity name.
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CapacityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for CapacityId {
    fn from(name: &'static str) -> Self {
        CapacityId::named(name)
    }
}

// ---------------------------------------------------------------------------
// Helper macros
// ---------------------------------------------------------------------------

/// Declare a trait as a capacity.
///
/// ```ignore
/// impl_capacity!(Movement);                   // name = "<module path>::Movement"
/// impl_capacity!(Movement, "demo.Movement");  // explicit name
/// ```
#[macro_export]
macro_rules! impl_capacity {
    ($cap:path) => {
        impl $crate::capacity::Capacity for dyn $cap {
            const NAME: &'static str = concat!(module_path!(), "::", stringify!($cap));
        }
    };
    ($cap:path, $name:expr) => {
        impl $crate::capacity::Capacity for dyn $cap {
            const NAME: &'static str = $name;
        }
    };
}

/// Declare the capacities a skill type implements.
///
/// The skill must already implement each capacity trait and [`Skill`].
///
/// ```ignore
/// impl_skill!(WalkingSkill => Movement, Logging);
/// ```
#[macro_export]
macro_rules! impl_skill {
    ($skill:ty => $($cap:path),+ $(,)?) => {
        $(
            impl $crate::capacity::Implements<dyn $cap> for $skill {
                fn as_capacity(self: ::std::sync::Arc<Self>) -> ::std::sync::Arc<dyn $cap> {
                    self
                }
            }
        )+
    };
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{LegacyMovement, Logging, Movement, WalkingSkill};

    #[test]
    fn test_capacity_id_from_type() {
        assert_eq!(CapacityId::of::<dyn Movement>().name(), "demo.Movement");
        assert_eq!(CapacityId::of::<dyn Logging>(), CapacityId::named("demo.Logging"));
    }

    #[test]
    fn test_shared_name_shares_id() {
        assert_eq!(
            CapacityId::of::<dyn Movement>(),
            CapacityId::of::<dyn LegacyMovement>()
        );
    }

    #[test]
    fn test_default_name_uses_module_path() {
        pub trait Unnamed: Send + Sync {}
        impl_capacity!(Unnamed);
        let name = <dyn Unnamed as Capacity>::NAME;
        assert!(name.ends_with("::Unnamed"));
        assert!(name.starts_with("agent_capacities::capacity"));
    }

    #[test]
    fn test_implements_projection() {
        let skill = Arc::new(WalkingSkill::new());
        let movement: Arc<dyn Movement> = Arc::clone(&skill).as_capacity();
        assert_eq!(movement.walk(), "walking");
        assert_eq!(Arc::strong_count(&skill), 2);
    }

    #[test]
    fn test_display_and_serde() {
        let id = CapacityId::named("demo.Movement");
        assert_eq!(id.to_string(), "demo.Movement");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"demo.Movement\"");
        let back: CapacityId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
