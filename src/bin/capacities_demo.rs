//! agent-capacities demo binary.
//!
//! Builds an agent with a walking skill, attaches a behavior, and rebinds the
//! movement capacity to a flying skill while the behavior keeps its handle.
//!
//! # Environment Variables
//!
//! - `CAPACITIES_DYNAMIC_INSTALL`: enable the dynamic skill provider (default: true)
//! - `CAPACITIES_TRAIT_CACHE`: cache capacity references in agent traits (default: true)
//! - `CAPACITIES_LIFECYCLE_HOOKS`: run skill install/uninstall hooks (default: true)
//! - `RUST_LOG`: Tracing filter (default: "info,agent_capacities=debug")
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin capacities-demo
//! ```

use std::sync::Arc;

use agent_capacities::{
    impl_capacity, impl_skill, Agent, AgentRef, Behavior, CapacityId, CapacityMapping,
    RuntimeConfig, Skill, SkillOwner,
};

pub trait Movement: Send + Sync {
    fn move_towards(&self, target: &str) -> String;
}
impl_capacity!(Movement, "demo.Movement");

pub trait Logging: Send + Sync {
    fn info(&self, message: &str);
}
impl_capacity!(Logging, "demo.Logging");

#[derive(Default)]
struct WalkingSkill {
    owner: SkillOwner,
}

impl Skill for WalkingSkill {
    fn install(&self, owner: &AgentRef) {
        self.owner.set(owner);
        tracing::info!("walking skill installed on {:?}", owner);
    }

    fn uninstall(&self) {
        self.owner.clear();
        tracing::info!("walking skill uninstalled");
    }
}

impl Movement for WalkingSkill {
    fn move_towards(&self, target: &str) -> String {
        format!("walking towards {}", target)
    }
}

impl_skill!(WalkingSkill => Movement);

struct FlyingSkill;

impl Skill for FlyingSkill {}

impl Movement for FlyingSkill {
    fn move_towards(&self, target: &str) -> String {
        format!("flying towards {}", target)
    }
}

impl_skill!(FlyingSkill => Movement);

struct ConsoleLogging;

impl Skill for ConsoleLogging {}

impl Logging for ConsoleLogging {
    fn info(&self, message: &str) {
        tracing::info!(target: "demo", "{}", message);
    }
}

impl_skill!(ConsoleLogging => Logging);

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,agent_capacities=debug".into()),
        )
        .init();

    let config = RuntimeConfig::from_env()?;
    tracing::info!(
        "agent-capacities v{} ({:?})",
        agent_capacities::VERSION,
        config
    );

    let agent = Agent::builder()
        .config(config)
        .builtin_capacities(|agent: &Agent| {
            agent.set_skill(
                Arc::new(WalkingSkill::default()),
                &[CapacityMapping::of::<dyn Movement>()],
            );
        })
        .dynamic_skill_provider(Arc::new(|agent: &Agent, capacity: &CapacityId| {
            if *capacity == CapacityId::of::<dyn Logging>() {
                agent.map_skill::<dyn Logging, _>(Arc::new(ConsoleLogging));
                true
            } else {
                false
            }
        }))
        .build();
    tracing::info!("built {}", agent);

    let behavior = agent.register_behavior(Behavior::detached());
    tracing::info!("registered {}", behavior);

    let movement = behavior.get_capacity::<dyn Movement>()?;
    let logging = behavior.get_capacity::<dyn Logging>()?;

    let line = movement.call(|m| m.move_towards("the river"))?;
    logging.call(|l| l.info(&line))?;

    agent.map_skill::<dyn Movement, _>(Arc::new(FlyingSkill));
    let line = movement.call(|m| m.move_towards("the mountain"))?;
    logging.call(|l| l.info(&line))?;

    println!("{}", serde_json::to_string_pretty(&agent.bindings())?);

    agent.clear_skill::<dyn Movement>();
    match movement.call(|m| m.move_towards("nowhere")) {
        Ok(line) => tracing::warn!("unexpected movement after clear: {}", line),
        Err(e) => tracing::info!("movement cleared: {}", e),
    }

    agent.unregister_behavior(&behavior);
    drop(agent);
    match logging.call(|l| l.info("still here?")) {
        Ok(()) => tracing::warn!("owner still reachable after drop"),
        Err(e) => tracing::info!("owner gone: {}", e),
    }

    Ok(())
}
