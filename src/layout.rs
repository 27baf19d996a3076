//! Layout driver: play/pause state machine around the force engine
//!
//! Each running tick performs one iteration:
//!
//! 1. every node's speed is set to the current temperature
//! 2. pending directions are cleared and the forces accumulate new ones
//! 3. directions are normalized, then jittered to break symmetric ties
//! 4. unlocked nodes step by `direction * temperature`
//!
//! The temperature is left entirely to the caller; there is no cooling
//! schedule. Jitter comes from a seeded generator that is re-seeded on every
//! `play()`, so replaying from the same positions gives the same layout.

use std::time::Instant;

use rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing::{debug, info};

use crate::config::LayoutConfig;
use crate::entity::{SpaceEdge, SpaceNode};
use crate::forces::Force;
use crate::store::EntityStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhysicsMode {
    Play,
    Pause,
}

/// Iteration bookkeeping for the force simulation
#[derive(Debug, Clone)]
pub struct LayoutDriver {
    mode: PhysicsMode,
    iterations: u32,
    max_iterations: u32,
    bounded: bool,
    temperature: f32,
    jitter: f32,
    seed: u64,
    rng: SmallRng,
    last_update: Option<Instant>,
}

impl LayoutDriver {
    pub fn new(config: &LayoutConfig) -> Self {
        Self {
            mode: PhysicsMode::Pause,
            iterations: 0,
            max_iterations: config.max_iterations,
            bounded: config.bounded,
            temperature: config.temperature,
            jitter: config.jitter,
            seed: config.seed,
            rng: SmallRng::seed_from_u64(config.seed),
            last_update: None,
        }
    }

    /// Start (or restart) a run from iteration 1
    pub fn play(&mut self) {
        info!(temperature = self.temperature, "layout playing");
        self.mode = PhysicsMode::Play;
        self.iterations = 1;
        self.last_update = None;
        self.rng = SmallRng::seed_from_u64(self.seed);
    }

    pub fn pause(&mut self) {
        if self.mode == PhysicsMode::Play {
            info!(iterations = self.iterations, "layout paused");
        }
        self.mode = PhysicsMode::Pause;
    }

    pub fn mode(&self) -> PhysicsMode {
        self.mode
    }

    pub fn is_running(&self) -> bool {
        self.mode == PhysicsMode::Play
    }

    /// Counter of the next iteration to run (0 before the first `play()`)
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    pub fn set_max_iterations(&mut self, max_iterations: u32, bounded: bool) {
        self.max_iterations = max_iterations;
        self.bounded = bounded;
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn set_temperature(&mut self, temperature: f32) {
        info!(temperature, "layout temperature changed");
        self.temperature = temperature;
    }

    /// Whether the next tick would run an iteration
    pub fn can_step(&self) -> bool {
        self.mode == PhysicsMode::Play
            && self.iterations >= 1
            && (!self.bounded || self.iterations <= self.max_iterations)
    }

    /// Run one iteration if playing and under the bound.
    ///
    /// Returns `true` when node positions changed.
    pub fn step<F: Force + ?Sized>(
        &mut self,
        forces: &F,
        nodes: &mut EntityStore<SpaceNode>,
        edges: &EntityStore<SpaceEdge>,
    ) -> bool {
        if !self.can_step() {
            return false;
        }
        let started = *self.last_update.get_or_insert_with(Instant::now);

        nodes.set_speed(self.temperature);
        nodes.reset_directions();
        forces.apply(nodes, edges);
        nodes.normalize_directions();
        nodes.randomize_directions(&mut self.rng, self.jitter);
        nodes.update();

        if self.bounded {
            let mean = started.elapsed() / self.iterations;
            let remaining = mean * self.max_iterations.saturating_sub(self.iterations);
            debug!(
                iteration = self.iterations,
                max = self.max_iterations,
                mean_ms = mean.as_millis() as u64,
                remaining_ms = remaining.as_millis() as u64,
                "layout iteration"
            );
        }

        self.iterations += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ForceConfig;
    use crate::forces::GraphForces;
    use glam::Vec3;

    fn triangle() -> (EntityStore<SpaceNode>, EntityStore<SpaceEdge>) {
        let mut nodes = EntityStore::new();
        let a = nodes.add(SpaceNode::new("a").with_position(Vec3::new(0.0, 0.0, 0.0)));
        let b = nodes.add(SpaceNode::new("b").with_position(Vec3::new(1.0, 0.0, 0.0)));
        let c = nodes.add(SpaceNode::new("c").with_position(Vec3::new(0.0, 1.0, 0.5)));
        let mut edges = EntityStore::new();
        edges.add(SpaceEdge::new(a, b));
        edges.add(SpaceEdge::new(b, c));
        (nodes, edges)
    }

    fn positions(nodes: &EntityStore<SpaceNode>) -> Vec<Vec3> {
        nodes.iter().map(|(_, n)| n.position).collect()
    }

    #[test]
    fn starts_paused_and_does_nothing() {
        let (mut nodes, edges) = triangle();
        let before = positions(&nodes);
        let mut driver = LayoutDriver::new(&LayoutConfig::default());
        let forces = GraphForces::from_config(&ForceConfig::default());

        assert_eq!(driver.mode(), PhysicsMode::Pause);
        assert!(!driver.step(&forces, &mut nodes, &edges));
        assert_eq!(positions(&nodes), before);
        assert_eq!(driver.iterations(), 0);
    }

    #[test]
    fn play_resets_counter_to_one() {
        let (mut nodes, edges) = triangle();
        let mut driver = LayoutDriver::new(&LayoutConfig::default());
        let forces = GraphForces::from_config(&ForceConfig::default());

        driver.play();
        assert_eq!(driver.iterations(), 1);
        for _ in 0..5 {
            assert!(driver.step(&forces, &mut nodes, &edges));
        }
        assert_eq!(driver.iterations(), 6);

        driver.pause();
        assert!(!driver.step(&forces, &mut nodes, &edges));
        assert_eq!(driver.iterations(), 6);

        driver.play();
        assert_eq!(driver.iterations(), 1);
    }

    #[test]
    fn bounded_run_stops_at_max_iterations() {
        let (mut nodes, edges) = triangle();
        let config = LayoutConfig {
            max_iterations: 3,
            bounded: true,
            ..LayoutConfig::default()
        };
        let mut driver = LayoutDriver::new(&config);
        let forces = GraphForces::from_config(&ForceConfig::default());

        driver.play();
        let steps = (0..10)
            .filter(|_| driver.step(&forces, &mut nodes, &edges))
            .count();
        assert_eq!(steps, 3);
        assert!(driver.is_running());
    }

    #[test]
    fn unbounded_run_ignores_max_iterations() {
        let (mut nodes, edges) = triangle();
        let config = LayoutConfig {
            max_iterations: 2,
            bounded: false,
            ..LayoutConfig::default()
        };
        let mut driver = LayoutDriver::new(&config);
        let forces = GraphForces::from_config(&ForceConfig::default());

        driver.play();
        let steps = (0..10)
            .filter(|_| driver.step(&forces, &mut nodes, &edges))
            .count();
        assert_eq!(steps, 10);
    }

    #[test]
    fn each_unlocked_node_moves_about_one_temperature() {
        let (mut nodes, edges) = triangle();
        let config = LayoutConfig {
            temperature: 0.5,
            jitter: 0.0,
            ..LayoutConfig::default()
        };
        let mut driver = LayoutDriver::new(&config);
        let forces = GraphForces::from_config(&ForceConfig::default());
        let before = positions(&nodes);

        driver.play();
        driver.step(&forces, &mut nodes, &edges);

        for (old, new) in before.iter().zip(positions(&nodes)) {
            assert!(((new - *old).length() - 0.5).abs() < 1e-4);
        }
    }

    #[test]
    fn locked_node_never_moves() {
        let (mut nodes, edges) = triangle();
        nodes.get_mut(1).unwrap().locked = true;
        let pinned = nodes.get(1).unwrap().position;
        let mut driver = LayoutDriver::new(&LayoutConfig::default());
        let forces = GraphForces::from_config(&ForceConfig::default());

        driver.play();
        for _ in 0..20 {
            driver.step(&forces, &mut nodes, &edges);
        }
        assert_eq!(nodes.get(1).unwrap().position, pinned);
    }

    #[test]
    fn replay_from_same_state_is_deterministic() {
        let forces = GraphForces::from_config(&ForceConfig::default());
        let mut driver = LayoutDriver::new(&LayoutConfig::default());

        let (mut first, edges) = triangle();
        driver.play();
        for _ in 0..10 {
            driver.step(&forces, &mut first, &edges);
        }
        driver.pause();

        let (mut second, edges) = triangle();
        driver.play();
        for _ in 0..10 {
            driver.step(&forces, &mut second, &edges);
        }

        assert_eq!(positions(&first), positions(&second));
    }

    #[test]
    fn temperature_is_caller_controlled() {
        let mut driver = LayoutDriver::new(&LayoutConfig::default());
        assert_eq!(driver.temperature(), 0.2);
        driver.set_temperature(1.5);
        driver.play();
        assert_eq!(driver.temperature(), 1.5);
    }
}
