//! Feeds brain outputs into agent state machines.

use std::sync::atomic::{AtomicUsize, Ordering};

use evo_ecs::World;
use evo_system::{ParallelBounds, QueryCache, System, SystemResult};
use rayon::prelude::*;
use tracing::debug;

use crate::{AgentFsmComponent, OutputComponent};

/// For every entity holding both an [`OutputComponent`] and an
/// [`AgentFsmComponent`]: decode the outputs onto the agent's blackboard,
/// then tick its state machine.
///
/// Agents are processed in parallel; each agent's own batches then run on
/// the same worker pool.
#[derive(Default)]
pub struct BrainDecisionSystem {
    cache:            QueryCache<(OutputComponent, AgentFsmComponent)>,
    min_len:          usize,
    last_transitions: usize,
}

impl BrainDecisionSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transitions fired during the most recent tick.
    pub fn last_transitions(&self) -> usize {
        self.last_transitions
    }
}

impl System for BrainDecisionSystem {
    fn name(&self) -> &'static str {
        "brain-decision"
    }

    fn initialize(&mut self, bounds: &ParallelBounds) {
        self.min_len = bounds.min_entities_per_task;
    }

    fn pre_execute(&mut self, world: &World) -> SystemResult<()> {
        self.cache.resolve(world);
        Ok(())
    }

    fn execute(&mut self, _world: &World, _dt: f32) -> SystemResult<()> {
        let Some((outputs, agents)) = self.cache.views() else {
            return Ok(());
        };
        let fired = AtomicUsize::new(0);
        self.cache
            .entities()
            .par_iter()
            .with_min_len(self.min_len.max(1))
            .try_for_each(|id| -> SystemResult<()> {
                let (Some(output), Some(agent)) = (outputs.get(id), agents.get(id)) else {
                    return Ok(());
                };
                let agent = agent.read();
                agent.blackboard().sense(&output.read());
                let records = agent.tick()?;
                fired.fetch_add(records.len(), Ordering::Relaxed);
                Ok(())
            })?;
        self.last_transitions = fired.into_inner();
        Ok(())
    }

    fn post_execute(&mut self, _world: &World) -> SystemResult<()> {
        if self.last_transitions > 0 {
            debug!(transitions = self.last_transitions, agents = self.cache.entities().len(), "agents decided");
        }
        Ok(())
    }
}
