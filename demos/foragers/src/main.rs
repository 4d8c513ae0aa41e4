//! foragers — herbivores, scavengers, and carnivores on an open plain.
//!
//! A sensor system stands in for the brain evaluator: it writes each agent's
//! `OutputComponent` from the distance to the nearest food patch and the
//! nearest predator.  Decisions, steering, and movement all come from
//! `evo-agent`.
//!
//! Set `RUST_LOG=info` for the periodic census, `RUST_LOG=foragers=info,evo_fsm=debug`
//! to watch individual transitions.

use std::time::Instant;

use anyhow::Result;
use tracing::info;

use evo_agent::{
    AgentFsmComponent, AgentState, BlackboardComponent, BrainDecisionSystem, Diet, InputComponent,
    MovementSystem, NeuralNetComponent, NeuronLayer, OutputComponent, Position, SteeringSystem, Velocity,
    spawn_agent,
};
use evo_core::{EcsConfig, EntityId, EntityRng, SimRng};
use evo_ecs::{World, WorldBuilder};
use evo_fsm::FsmEnum;
use evo_system::{
    ParallelBounds, QueryCache, SchedulerBuilder, System, SystemResult, TickObserver, TickReport,
};

// ── Constants ─────────────────────────────────────────────────────────────────

const AGENT_COUNT:     usize = 240;
const FOOD_PATCHES:    usize = 16;
const WORLD_SIZE:      f32   = 100.0;
const TICKS:           u64   = 300;
const DT:              f32   = 0.5;
const SEED:            u64   = 42;
const START_ENERGY:    f32   = 60.0;
const CENSUS_INTERVAL: u64   = 50;
/// Sensor inputs and sense outputs of the (external) brain.
const BRAIN_SHAPE:     (usize, usize) = (3, 4);

// ── Application components ────────────────────────────────────────────────────

/// Flag marking carnivores, so prey can sense them.
struct Predator;

/// Per-agent sensor noise.
struct Jitter(EntityRng);

// ── Sensor stand-in ───────────────────────────────────────────────────────────

type SensorQuery = (Position, OutputComponent, InputComponent, BlackboardComponent, Jitter);

struct Sensors {
    cache:     QueryCache<SensorQuery>,
    food:      Vec<[f32; 2]>,
    predators: Vec<(EntityId, [f32; 2])>,
    min_len:   usize,
}

impl Sensors {
    fn new(food: Vec<[f32; 2]>) -> Self {
        Self { cache: QueryCache::new(), food, predators: Vec::new(), min_len: 1 }
    }
}

/// Unit direction and distance from `from` to the closest of `targets`.
fn nearest(from: [f32; 2], targets: impl Iterator<Item = [f32; 2]>) -> ([f32; 2], f32) {
    targets
        .map(|t| {
            let d = [t[0] - from[0], t[1] - from[1]];
            let len = (d[0] * d[0] + d[1] * d[1]).sqrt();
            let dir = if len > f32::EPSILON { [d[0] / len, d[1] / len] } else { [0.0, 0.0] };
            (dir, len)
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .unwrap_or(([0.0, 0.0], f32::INFINITY))
}

impl System for Sensors {
    fn name(&self) -> &'static str {
        "sensors"
    }

    fn initialize(&mut self, bounds: &ParallelBounds) {
        self.min_len = bounds.min_entities_per_task;
    }

    fn pre_execute(&mut self, world: &World) -> SystemResult<()> {
        self.cache.resolve(world);
        self.predators.clear();
        for e in world.entities_with_flags::<(Predator,)>() {
            let p = world.get_component::<Position>(e)?.get_cloned();
            self.predators.push((e, [p.x, p.y]));
        }
        Ok(())
    }

    fn execute(&mut self, _world: &World, _dt: f32) -> SystemResult<()> {
        let (food, predators) = (&self.food, &self.predators);
        self.cache.par_for_each(self.min_len, |id, (positions, outputs, inputs, boards, jitter)| {
            let (Some(pos), Some(out), Some(inp), Some(board), Some(jit)) = (
                positions.get(&id),
                outputs.get(&id),
                inputs.get(&id),
                boards.get(&id),
                jitter.get(&id),
            ) else {
                return;
            };
            let here = {
                let p = pos.read();
                [p.x, p.y]
            };
            let is_predator = predators.iter().any(|(p, _)| *p == id);

            let (food_dir, food_dist) = nearest(here, food.iter().copied());
            let (threat_dir, threat_dist) = if is_predator {
                ([0.0, 0.0], f32::INFINITY)
            } else {
                nearest(here, predators.iter().map(|(_, at)| *at))
            };

            let noise: f32 = jit.write().0.gen_range(-0.05..0.05);
            let food_signal = (1.0 / (1.0 + food_dist * 0.2) + noise).max(0.0);
            let threat_signal = 1.0 / (1.0 + threat_dist * 0.3);
            let heading = if threat_signal > food_signal { threat_dir } else { food_dir };

            *out.write() = OutputComponent::new(vec![vec![food_signal, threat_signal, heading[0], heading[1]]]);
            let energy = board.read().0.vitals().energy;
            inp.write().inputs = vec![vec![energy, food_dist.min(WORLD_SIZE), threat_dist.min(WORLD_SIZE)]];
        });
        Ok(())
    }
}

// ── Census observer ───────────────────────────────────────────────────────────

struct Census<'w> {
    world:    &'w World,
    interval: u64,
}

impl TickObserver for Census<'_> {
    fn on_tick_end(&mut self, report: &TickReport) {
        if report.tick.0 % self.interval != 0 {
            return;
        }
        let Some(agents) = self.world.get_components::<AgentFsmComponent>() else {
            return;
        };
        let mut counts = [0usize; AgentState::COUNT];
        for handle in agents.values() {
            counts[handle.read().state().index()] += 1;
        }
        let census = counts
            .iter()
            .enumerate()
            .filter(|(_, n)| **n > 0)
            .filter_map(|(i, n)| AgentState::from_index(i).map(|s| format!("{}={n}", s.name())))
            .collect::<Vec<_>>()
            .join(" ");
        info!(tick = %report.tick, elapsed = ?report.elapsed, %census, "census");
    }
}

// ── Setup ─────────────────────────────────────────────────────────────────────

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn diet_for(i: usize) -> Diet {
    match i % 6 {
        0 => Diet::Carnivore,
        1 | 2 => Diet::Scavenger,
        _ => Diet::Herbivore,
    }
}

fn random_brain(rng: &mut SimRng) -> NeuralNetComponent {
    let (inputs, outputs) = BRAIN_SHAPE;
    let layer = NeuronLayer {
        weights: (0..outputs)
            .map(|_| (0..inputs).map(|_| rng.gen_range(-1.0..1.0)).collect())
            .collect(),
        biases:  vec![0.0; outputs],
    };
    NeuralNetComponent { layers: vec![layer], fitness: Vec::new() }
}

fn populate(world: &World, rng: &mut SimRng) -> Result<()> {
    for i in 0..AGENT_COUNT {
        let diet = diet_for(i);
        let e = spawn_agent(world, diet, START_ENERGY)?;
        world.add_component(e, Position {
            x: rng.gen_range(0.0..WORLD_SIZE),
            y: rng.gen_range(0.0..WORLD_SIZE),
        })?;
        world.add_component(e, Velocity::default())?;
        world.add_component(e, OutputComponent::default())?;
        world.add_component(e, InputComponent::default())?;
        world.add_component(e, random_brain(rng))?;
        world.add_component(e, Jitter(EntityRng::new(SEED, e)))?;
        if diet == Diet::Carnivore {
            world.add_flag(e, Predator)?;
        }
    }
    Ok(())
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    init_tracing();

    let workers = std::thread::available_parallelism().map_or(4, |n| n.get()).min(evo_core::config::DEFAULT_MAX_WORKERS);
    let config = EcsConfig { min_entities_per_task: 16, ..EcsConfig::default().with_seed(SEED).with_max_workers(workers) };
    let world = WorldBuilder::new(config)
        .register_component::<Position>()
        .register_component::<Velocity>()
        .register_component::<OutputComponent>()
        .register_component::<InputComponent>()
        .register_component::<AgentFsmComponent>()
        .register_component::<BlackboardComponent>()
        .register_flag::<Predator>()
        .build()?;

    let mut rng = SimRng::new(SEED);
    let food: Vec<[f32; 2]> = (0..FOOD_PATCHES)
        .map(|_| [rng.gen_range(0.0..WORLD_SIZE), rng.gen_range(0.0..WORLD_SIZE)])
        .collect();
    populate(&world, &mut rng)?;

    let mut scheduler = SchedulerBuilder::new()
        .system(Sensors::new(food))
        .system(BrainDecisionSystem::new())
        .system(SteeringSystem::default())
        .system(MovementSystem::default())
        .build(&world)?;
    info!(
        agents = world.entity_count(),
        workers = world.pool().workers(),
        systems = ?scheduler.system_names(),
        "world ready"
    );

    let t0 = Instant::now();
    let mut census = Census { world: &world, interval: CENSUS_INTERVAL };
    scheduler.run_ticks(TICKS, &world, DT, &mut census)?;
    let elapsed = t0.elapsed();

    // Fitness for the (external) genetic algorithm: lifetime energy eaten.
    let mut rows: Vec<(Diet, usize, usize, f32, f32)> = Diet::ALL.iter().map(|&d| (d, 0, 0, 0.0, 0.0)).collect();
    for e in world.entities_with::<(AgentFsmComponent, NeuralNetComponent)>() {
        let agent = world.get_component::<AgentFsmComponent>(e)?;
        let agent = agent.read();
        let eaten = agent.blackboard().vitals().eaten;
        world.get_component::<NeuralNetComponent>(e)?.write().record_fitness(eaten);

        if let Some(row) = rows.iter_mut().find(|r| r.0 == agent.diet()) {
            row.1 += 1;
            row.2 += usize::from(agent.is_alive());
            row.3 += eaten;
            row.4 = row.4.max(eaten);
        }
    }

    println!("Simulated {TICKS} ticks of {AGENT_COUNT} agents in {:.3} s", elapsed.as_secs_f64());
    println!();
    println!("{:<10} {:>6} {:>6} {:>10} {:>10}", "Diet", "Count", "Alive", "Mean eat", "Best eat");
    println!("{}", "-".repeat(46));
    for (diet, count, alive, total, best) in rows {
        let mean = if count > 0 { total / count as f32 } else { 0.0 };
        println!("{:<10} {:>6} {:>6} {:>10.1} {:>10.1}", diet.to_string(), count, alive, mean, best);
    }

    Ok(())
}
