//! Shared fixtures for unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::agent::AgentRef;
use crate::skill::{Skill, SkillOwner};
use crate::{impl_capacity, impl_skill};

pub trait Movement: Send + Sync {
    fn walk(&self) -> String;
}
impl_capacity!(Movement, "demo.Movement");

/// Older revision of `Movement`, registered under the same name.
pub trait LegacyMovement: Send + Sync {
    fn stride(&self) -> u32;
}
impl_capacity!(LegacyMovement, "demo.Movement");

pub trait Logging: Send + Sync {
    fn info(&self, message: &str) -> String;
}
impl_capacity!(Logging, "demo.Logging");

/// Walks, logs, and records its lifecycle.
#[derive(Debug, Default)]
pub struct WalkingSkill {
    pub owner: SkillOwner,
    pub installs: AtomicUsize,
    pub uninstalls: AtomicUsize,
}

impl WalkingSkill {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Skill for WalkingSkill {
    fn install(&self, owner: &AgentRef) {
        self.owner.set(owner);
        self.installs.fetch_add(1, Ordering::SeqCst);
    }

    fn uninstall(&self) {
        self.owner.clear();
        self.uninstalls.fetch_add(1, Ordering::SeqCst);
    }
}

impl Movement for WalkingSkill {
    fn walk(&self) -> String {
        "walking".to_string()
    }
}

impl Logging for WalkingSkill {
    fn info(&self, message: &str) -> String {
        format!("[walking] {}", message)
    }
}

impl_skill!(WalkingSkill => Movement, Logging);

#[derive(Debug, Default)]
pub struct FlyingSkill;

impl FlyingSkill {
    pub fn new() -> Self {
        FlyingSkill
    }
}

impl Skill for FlyingSkill {}

impl Movement for FlyingSkill {
    fn walk(&self) -> String {
        "flying".to_string()
    }
}

impl_skill!(FlyingSkill => Movement);

#[derive(Debug, Default)]
pub struct LegacySkill;

impl Skill for LegacySkill {}

impl LegacyMovement for LegacySkill {
    fn stride(&self) -> u32 {
        1
    }
}

impl_skill!(LegacySkill => LegacyMovement);

/// Route `log` output through `env_logger` for tests that want it.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn test_fixture_names() {
    assert!(WalkingSkill::new().name().ends_with("WalkingSkill"));
    assert_eq!(LegacySkill.stride(), 1);
}
