//! The simulation driver.
//!
//! [`ClothSimulator`] owns the particle grid, the constraint set and the
//! per-frame scene inputs, and runs the fixed pipeline once per substep:
//!
//! 1. force accumulation
//! 2. Verlet integration
//! 3. constraint projection, then per-constraint damping and tearing
//! 4. collision against primitives, then self-collision
//!
//! Normals are refreshed once per frame after the last substep.

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::collision::{self, CollisionPrimitive};
use crate::config::SimulationConfig;
use crate::constraints::{grid_constraints, Constraint, ConstraintSet};
use crate::error::{ClothError, ClothResult};
use crate::forces::registry::{CustomForce, ForceRegistry};
use crate::forces::wind::WindField;
use crate::forces::{self, ForceInputs};
use crate::grid::SpatialHashGrid;
use crate::integrator::integrate;
use crate::normals;
use crate::particle::{Particle, ParticleSet};
use crate::persist;
use crate::quality::{AdaptiveQuality, StepStats};

/// Lifecycle of a simulator.
///
/// `Uninitialized → Initialized → Running ⇄ Paused`, and `Shutdown` from
/// anywhere. Shutdown is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SimulationState {
    Uninitialized,
    Initialized,
    Running,
    Paused,
    Shutdown,
}

/// Hash table size for self-collision buckets.
const SELF_COLLISION_TABLE: usize = 4096;

/// Mutable state that exists only between initialize/load and shutdown.
#[derive(Clone, Debug)]
struct Cloth {
    particles: ParticleSet,
    constraints: ConstraintSet,
    /// External force per particle for the current frame.
    impulses: Vec<Vec3>,
    grid: SpatialHashGrid,
}

impl Cloth {
    fn new(particles: ParticleSet, constraints: Vec<Constraint>, cell_size: f32) -> Self {
        let count = particles.count;
        Self {
            particles,
            constraints: ConstraintSet::new(constraints),
            impulses: vec![Vec3::ZERO; count],
            grid: SpatialHashGrid::new(cell_size, SELF_COLLISION_TABLE.min(count.max(1) * 2)),
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
struct FrameTimer(std::time::Instant);

#[cfg(not(target_arch = "wasm32"))]
impl FrameTimer {
    fn start() -> Self {
        Self(std::time::Instant::now())
    }

    fn elapsed_ms(&self) -> Option<f32> {
        Some(self.0.elapsed().as_secs_f32() * 1000.0)
    }
}

/// No monotonic clock in the browser without JS glue; the host measures
/// and reports through [`ClothSimulator::record_frame_time`].
#[cfg(target_arch = "wasm32")]
struct FrameTimer;

#[cfg(target_arch = "wasm32")]
impl FrameTimer {
    fn start() -> Self {
        Self
    }

    fn elapsed_ms(&self) -> Option<f32> {
        None
    }
}

/// A single cloth patch and everything acting on it.
#[derive(Clone, Debug)]
pub struct ClothSimulator {
    state: SimulationState,
    config: SimulationConfig,
    cloth: Option<Cloth>,
    primitives: Vec<CollisionPrimitive>,
    wind: Vec<WindField>,
    forces: ForceRegistry,
    quality: AdaptiveQuality,
    time: f32,
}

impl Default for ClothSimulator {
    fn default() -> Self {
        Self::new()
    }
}

impl ClothSimulator {
    pub fn new() -> Self {
        let config = SimulationConfig::default();
        Self {
            state: SimulationState::Uninitialized,
            quality: Self::quality_for(&config),
            config,
            cloth: None,
            primitives: Vec::new(),
            wind: Vec::new(),
            forces: ForceRegistry::new(),
            time: 0.0,
        }
    }

    /// A default-configured simulator with a `width x height` grid, initialized.
    pub fn with_grid(width: usize, height: usize, spacing: f32) -> ClothResult<Self> {
        let mut sim = Self::new();
        sim.initialize(SimulationConfig::with_grid(width, height, spacing))?;
        Ok(sim)
    }

    fn quality_for(config: &SimulationConfig) -> AdaptiveQuality {
        let mut quality = AdaptiveQuality::new(
            config.substeps.max(1),
            config.solver_iterations,
            config.frame_budget_ms,
        );
        quality.min_iterations = quality.min_iterations.min(config.solver_iterations);
        quality.enabled = config.adaptive_quality;
        quality
    }

    fn invalid(&self, operation: &'static str) -> ClothError {
        ClothError::InvalidState { operation, state: self.state }
    }

    fn cloth(&self, operation: &'static str) -> ClothResult<&Cloth> {
        match &self.cloth {
            Some(cloth) => Ok(cloth),
            None => Err(self.invalid(operation)),
        }
    }

    fn cloth_mut(&mut self, operation: &'static str) -> ClothResult<&mut Cloth> {
        let state = self.state;
        self.cloth
            .as_mut()
            .ok_or(ClothError::InvalidState { operation, state })
    }

    fn transition(&mut self, to: SimulationState) {
        tracing::info!(from = ?self.state, to = ?to, "simulation state change");
        self.state = to;
    }

    // ---- lifecycle ----

    /// Allocate the grid and its structural constraints.
    ///
    /// Only valid while Uninitialized. A rejected config leaves the simulator
    /// Uninitialized.
    pub fn initialize(&mut self, config: SimulationConfig) -> ClothResult<()> {
        if self.state != SimulationState::Uninitialized {
            return Err(self.invalid("initialize"));
        }
        config.validate()?;

        let particles =
            ParticleSet::grid(config.width, config.height, config.spacing, config.particle_mass);
        let constraints = grid_constraints(&particles, &config);
        tracing::info!(
            width = config.width,
            height = config.height,
            constraints = constraints.len(),
            "cloth initialized"
        );
        self.cloth = Some(Cloth::new(particles, constraints, config.self_collision_radius()));
        self.quality = Self::quality_for(&config);
        self.config = config;
        self.time = 0.0;
        self.transition(SimulationState::Initialized);
        Ok(())
    }

    pub fn start(&mut self) -> ClothResult<()> {
        if self.state != SimulationState::Initialized {
            return Err(self.invalid("start"));
        }
        self.transition(SimulationState::Running);
        Ok(())
    }

    pub fn pause(&mut self) -> ClothResult<()> {
        if self.state != SimulationState::Running {
            return Err(self.invalid("pause"));
        }
        self.transition(SimulationState::Paused);
        Ok(())
    }

    pub fn resume(&mut self) -> ClothResult<()> {
        if self.state != SimulationState::Paused {
            return Err(self.invalid("resume"));
        }
        self.transition(SimulationState::Running);
        Ok(())
    }

    /// Release all state. Idempotent.
    pub fn shutdown(&mut self) {
        if self.state == SimulationState::Shutdown {
            return;
        }
        self.cloth = None;
        self.primitives.clear();
        self.wind.clear();
        self.forces = ForceRegistry::new();
        self.transition(SimulationState::Shutdown);
    }

    /// Back to the rest lattice with zero velocity, without reallocating.
    ///
    /// Restores the constraint list captured at the last initialize/load and
    /// drops pending impulses. Pins and the lifecycle state are kept.
    pub fn reset(&mut self) -> ClothResult<()> {
        let cloth = self.cloth_mut("reset")?;
        cloth.particles.reset_to_rest();
        cloth.constraints.restore_initial();
        cloth.impulses.fill(Vec3::ZERO);
        self.time = 0.0;
        tracing::info!("cloth reset");
        Ok(())
    }

    pub fn state(&self) -> SimulationState {
        self.state
    }

    /// Simulated seconds since initialize/load/reset.
    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    // ---- stepping ----

    /// Advance by one external frame of `dt` seconds.
    ///
    /// Only valid while Running. `dt == 0` changes nothing. Impulses applied
    /// since the last frame act on every substep of this one and are then
    /// cleared.
    pub fn update(&mut self, dt: f32) -> ClothResult<StepStats> {
        if self.state != SimulationState::Running {
            return Err(self.invalid("update"));
        }
        if !(dt.is_finite() && dt >= 0.0) {
            return Err(ClothError::config(format!("frame time must be finite and non-negative, got {dt}")));
        }

        let timer = FrameTimer::start();
        let substeps = self.quality.substeps().max(1);
        let iterations = self.quality.iterations();
        let mut stats = StepStats {
            substeps,
            iterations,
            ..StepStats::default()
        };

        let config = &self.config;
        let Some(cloth) = self.cloth.as_mut() else {
            return Err(ClothError::InvalidState { operation: "update", state: self.state });
        };

        if dt > 0.0 {
            let sub_dt = dt / substeps as f32;
            let self_radius = config.self_collision_radius();

            for substep in 0..substeps {
                let inputs = ForceInputs {
                    gravity: config.gravity,
                    wind: &self.wind,
                    external: &cloth.impulses,
                    custom: &self.forces,
                    time: self.time + substep as f32 * sub_dt,
                };
                forces::accumulate(&mut cloth.particles, &inputs);
                integrate(&mut cloth.particles, sub_dt, config.global_damping);

                let solved = cloth
                    .constraints
                    .solve(&mut cloth.particles, iterations, config.colored_solve);
                cloth.constraints.apply_damping(&mut cloth.particles);
                if let Some(factor) = config.tear_factor {
                    stats.torn += cloth.constraints.tear(&cloth.particles, factor) as u32;
                }

                let contacts = collision::resolve_primitives(
                    &mut cloth.particles,
                    &self.primitives,
                    config.friction,
                    sub_dt,
                );
                stats.contacts += contacts.contacts;
                if config.self_collision {
                    stats.self_contacts += collision::resolve_self_collisions(
                        &mut cloth.particles,
                        cloth.constraints.as_slice(),
                        &mut cloth.grid,
                        self_radius,
                    );
                }

                if substep == 0 {
                    stats.degenerate_skipped = solved.degenerate + contacts.degenerate;
                }
            }

            normals::recompute(&mut cloth.particles);
            cloth.impulses.fill(Vec3::ZERO);
            self.time += dt;
        }

        stats.particle_count = cloth.particles.count as u32;
        stats.constraint_count = cloth.constraints.len() as u32;
        if let Some(ms) = timer.elapsed_ms() {
            stats.total_ms = ms;
            stats.over_budget = ms > self.config.frame_budget_ms;
            self.quality.record(ms);
        }
        Ok(stats)
    }

    /// Advance by one frame of the configured `time_step`.
    pub fn step(&mut self) -> ClothResult<StepStats> {
        self.update(self.config.time_step)
    }

    /// Whether `update` times itself. Where it cannot, the host reports
    /// frame times through [`ClothSimulator::record_frame_time`].
    pub const fn measures_frame_time() -> bool {
        cfg!(not(target_arch = "wasm32"))
    }

    /// Feed an externally measured frame time to adaptive quality.
    pub fn record_frame_time(&mut self, ms: f32) {
        self.quality.record(ms);
    }

    // ---- particles ----

    pub fn particle(&self, x: usize, y: usize) -> ClothResult<Particle> {
        self.cloth("read particle")?.particles.get(x, y)
    }

    pub fn particle_count(&self) -> usize {
        self.cloth.as_ref().map_or(0, |c| c.particles.count)
    }

    /// Current positions in grid order. Empty before initialization.
    pub fn positions(&self) -> &[Vec3] {
        self.cloth.as_ref().map_or(&[], |c| &c.particles.position)
    }

    /// Unit normals from the last frame, in grid order.
    pub fn normals(&self) -> &[Vec3] {
        self.cloth.as_ref().map_or(&[], |c| &c.particles.normal)
    }

    pub fn particles(&self) -> Option<&ParticleSet> {
        self.cloth.as_ref().map(|c| &c.particles)
    }

    pub fn set_pinned(&mut self, x: usize, y: usize, pinned: bool) -> ClothResult<()> {
        let particles = &mut self.cloth_mut("pin particle")?.particles;
        let index = particles.checked_index(x, y)?;
        particles.set_pinned(index, pinned)
    }

    pub fn is_pinned(&self, x: usize, y: usize) -> ClothResult<bool> {
        let particles = &self.cloth("read particle")?.particles;
        Ok(particles.pinned[particles.checked_index(x, y)?])
    }

    /// Add `force` to particle `(x, y)` for the next frame.
    pub fn apply_impulse(&mut self, x: usize, y: usize, force: Vec3) -> ClothResult<()> {
        let index = self.cloth("apply impulse")?.particles.checked_index(x, y)?;
        self.apply_impulse_at(index, force)
    }

    /// Add `force` to particle `index` for the next frame.
    pub fn apply_impulse_at(&mut self, index: usize, force: Vec3) -> ClothResult<()> {
        let cloth = self.cloth_mut("apply impulse")?;
        let len = cloth.impulses.len();
        let slot = cloth
            .impulses
            .get_mut(index)
            .ok_or(ClothError::Index { what: "particle", index, len })?;
        *slot += force;
        Ok(())
    }

    /// Σ |position - previous|² over free particles.
    pub fn kinetic_energy_proxy(&self) -> f32 {
        self.cloth.as_ref().map_or(0.0, |c| c.particles.kinetic_energy_proxy())
    }

    // ---- constraints ----

    pub fn constraints(&self) -> &[Constraint] {
        self.cloth.as_ref().map_or(&[], |c| c.constraints.as_slice())
    }

    /// Validate and append a constraint. Returns its index.
    pub fn add_constraint(&mut self, constraint: Constraint) -> ClothResult<usize> {
        let cloth = self.cloth_mut("add constraint")?;
        cloth.constraints.add(constraint, &cloth.particles)
    }

    pub fn remove_constraint(&mut self, index: usize) -> ClothResult<Constraint> {
        self.cloth_mut("remove constraint")?.constraints.remove(index)
    }

    // ---- scene inputs ----

    /// Returns the primitive's index.
    pub fn add_collision_primitive(&mut self, primitive: CollisionPrimitive) -> usize {
        if let Some(reason) = primitive.degeneracy() {
            tracing::warn!(reason, "degenerate collision primitive added; it will be ignored");
        }
        self.primitives.push(primitive);
        self.primitives.len() - 1
    }

    pub fn remove_collision_primitive(&mut self, index: usize) -> ClothResult<CollisionPrimitive> {
        if index >= self.primitives.len() {
            return Err(ClothError::Index {
                what: "collision primitive",
                index,
                len: self.primitives.len(),
            });
        }
        Ok(self.primitives.remove(index))
    }

    pub fn clear_collision_primitives(&mut self) {
        self.primitives.clear();
    }

    pub fn collision_primitives(&self) -> &[CollisionPrimitive] {
        &self.primitives
    }

    /// Mutable access, e.g. to move kinematic primitives between frames.
    pub fn collision_primitives_mut(&mut self) -> &mut [CollisionPrimitive] {
        &mut self.primitives
    }

    pub fn set_wind_fields(&mut self, fields: Vec<WindField>) {
        self.wind = fields;
    }

    pub fn add_wind_field(&mut self, field: WindField) {
        self.wind.push(field);
    }

    pub fn clear_wind_fields(&mut self) {
        self.wind.clear();
    }

    pub fn wind_fields(&self) -> &[WindField] {
        &self.wind
    }

    /// Register a named force strategy, replacing any with the same name.
    pub fn register_force(&mut self, name: impl Into<String>, force: CustomForce) -> Option<CustomForce> {
        self.forces.register(name, force)
    }

    pub fn unregister_force(&mut self, name: &str) -> Option<CustomForce> {
        self.forces.unregister(name)
    }

    pub fn force_registry(&self) -> &ForceRegistry {
        &self.forces
    }

    // ---- tuning ----

    pub fn set_gravity(&mut self, gravity: Vec3) -> ClothResult<()> {
        if !gravity.is_finite() {
            return Err(ClothError::config(format!("gravity must be finite, got {gravity}")));
        }
        self.config.gravity = gravity;
        Ok(())
    }

    /// Change the stiffness of every Distance constraint, generated or not.
    pub fn set_stiffness(&mut self, stiffness: f32) -> ClothResult<()> {
        if !(0.0..=1.0).contains(&stiffness) {
            return Err(ClothError::config(format!("stiffness must be in [0, 1], got {stiffness}")));
        }
        self.config.stiffness = stiffness;
        if let Some(cloth) = self.cloth.as_mut() {
            cloth.constraints.set_distance_stiffness(stiffness);
        }
        Ok(())
    }

    pub fn set_iterations(&mut self, iterations: u32) {
        self.config.solver_iterations = iterations;
        self.quality.min_iterations = self.quality.min_iterations.min(iterations);
        self.quality.set_limits(self.config.substeps.max(1), iterations);
    }

    /// 0 is treated as 1.
    pub fn set_substeps(&mut self, substeps: u32) {
        self.config.substeps = substeps.max(1);
        self.quality.set_limits(self.config.substeps, self.config.solver_iterations);
    }

    pub fn enable_self_collision(&mut self, enabled: bool) {
        self.config.self_collision = enabled;
    }

    pub fn set_adaptive_quality(&mut self, enabled: bool) {
        self.config.adaptive_quality = enabled;
        self.quality.enabled = enabled;
    }

    /// Global Verlet velocity retention, in (0, 1].
    pub fn set_damping(&mut self, damping: f32) -> ClothResult<()> {
        if !(damping > 0.0 && damping <= 1.0) {
            return Err(ClothError::config(format!("damping must be in (0, 1], got {damping}")));
        }
        self.config.global_damping = damping;
        Ok(())
    }

    pub fn set_friction(&mut self, friction: f32) -> ClothResult<()> {
        if !(0.0..=1.0).contains(&friction) {
            return Err(ClothError::config(format!("friction must be in [0, 1], got {friction}")));
        }
        self.config.friction = friction;
        Ok(())
    }

    /// Frame length used by [`ClothSimulator::step`].
    pub fn set_time_step(&mut self, time_step: f32) -> ClothResult<()> {
        if !(time_step.is_finite() && time_step > 0.0) {
            return Err(ClothError::config(format!("time step must be positive, got {time_step}")));
        }
        self.config.time_step = time_step;
        Ok(())
    }

    /// Change the uniform default mass. Pinned particles stay pinned.
    pub fn set_mass(&mut self, mass: f32) -> ClothResult<()> {
        if !(mass.is_finite() && mass > 0.0) {
            return Err(ClothError::config(format!("particle mass must be positive, got {mass}")));
        }
        self.config.particle_mass = mass;
        if let Some(cloth) = self.cloth.as_mut() {
            cloth.particles.set_mass(mass);
        }
        Ok(())
    }

    // ---- persistence ----

    pub fn save(&self, path: impl AsRef<Path>) -> ClothResult<()> {
        let cloth = self.cloth("save")?;
        let path = path.as_ref();
        persist::save(path, &cloth.particles, cloth.constraints.as_slice())?;
        tracing::info!(path = %path.display(), "simulation saved");
        Ok(())
    }

    /// Replace the simulation with the contents of `path`.
    ///
    /// The file is fully validated first; on any error the current state is
    /// untouched. Loading into an Uninitialized simulator initializes it with
    /// the default config and the file's grid.
    pub fn load(&mut self, path: impl AsRef<Path>) -> ClothResult<()> {
        if self.state == SimulationState::Shutdown {
            return Err(self.invalid("load"));
        }
        let path = path.as_ref();
        let snapshot = persist::load(path)?;

        let base = if self.state == SimulationState::Uninitialized {
            SimulationConfig::default()
        } else {
            self.config.clone()
        };
        let config = SimulationConfig {
            width: snapshot.width(),
            height: snapshot.height(),
            spacing: snapshot.spacing(),
            particle_mass: snapshot.particle_mass(),
            ..base
        };
        config
            .validate()
            .map_err(|e| ClothError::format(format!("file describes an invalid grid: {e}")))?;

        let count = snapshot.particles.count;
        self.cloth = Some(Cloth::new(
            snapshot.particles,
            snapshot.constraints,
            config.self_collision_radius(),
        ));
        self.config = config;
        self.time = 0.0;
        tracing::info!(path = %path.display(), particles = count, "simulation loaded");

        if self.state == SimulationState::Uninitialized {
            self.quality = Self::quality_for(&self.config);
            self.transition(SimulationState::Initialized);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_transitions() {
        let mut sim = ClothSimulator::new();
        assert!(matches!(sim.start(), Err(ClothError::InvalidState { .. })));
        sim.initialize(SimulationConfig::with_grid(3, 3, 1.0)).unwrap();
        assert_eq!(sim.state(), SimulationState::Initialized);
        assert!(sim.pause().is_err());
        sim.start().unwrap();
        sim.pause().unwrap();
        assert!(sim.pause().is_err());
        sim.resume().unwrap();
        assert_eq!(sim.state(), SimulationState::Running);
        sim.shutdown();
        sim.shutdown();
        assert_eq!(sim.state(), SimulationState::Shutdown);
        assert!(sim.initialize(SimulationConfig::default()).is_err());
    }

    #[test]
    fn test_bad_config_stays_uninitialized() {
        let mut sim = ClothSimulator::new();
        let err = sim.initialize(SimulationConfig::with_grid(0, 3, 1.0)).unwrap_err();
        assert!(matches!(err, ClothError::Configuration(_)));
        assert_eq!(sim.state(), SimulationState::Uninitialized);
        assert!(sim.particles().is_none());
    }

    #[test]
    fn test_zero_dt_is_noop() {
        let mut sim = ClothSimulator::with_grid(3, 3, 1.0).unwrap();
        sim.start().unwrap();
        let before = sim.positions().to_vec();
        let stats = sim.update(0.0).unwrap();
        assert_eq!(sim.positions(), &before[..]);
        assert_eq!(stats.particle_count, 9);
        assert_eq!(sim.time(), 0.0);
    }

    #[test]
    fn test_negative_dt_rejected() {
        let mut sim = ClothSimulator::with_grid(2, 2, 1.0).unwrap();
        sim.start().unwrap();
        assert!(matches!(sim.update(-1.0), Err(ClothError::Configuration(_))));
        assert!(sim.update(f32::NAN).is_err());
    }

    #[test]
    fn test_impulse_cleared_after_frame() {
        let mut sim = ClothSimulator::with_grid(2, 2, 1.0).unwrap();
        sim.set_gravity(Vec3::ZERO).unwrap();
        sim.start().unwrap();
        sim.apply_impulse(1, 1, Vec3::new(0.0, 0.0, 100.0)).unwrap();
        sim.update(1.0 / 60.0).unwrap();
        let z = sim.particle(1, 1).unwrap().position.z;
        assert!(z > 0.0);
        assert!(sim.cloth.as_ref().unwrap().impulses.iter().all(|f| *f == Vec3::ZERO));
    }

    #[test]
    fn test_impulse_index_checked() {
        let mut sim = ClothSimulator::with_grid(2, 2, 1.0).unwrap();
        assert!(matches!(sim.apply_impulse(2, 0, Vec3::X), Err(ClothError::Index { .. })));
        assert!(matches!(sim.apply_impulse_at(4, Vec3::X), Err(ClothError::Index { .. })));
    }

    #[test]
    fn test_native_update_records_its_own_frame_time() {
        assert!(ClothSimulator::measures_frame_time());
        let mut sim = ClothSimulator::with_grid(4, 4, 0.1).unwrap();
        sim.set_adaptive_quality(true);
        sim.start().unwrap();
        assert_eq!(sim.quality.average_ms(), 0.0);

        let stats = sim.update(1.0 / 60.0).unwrap();
        // One sample into an empty average leaves alpha * sample.
        assert!((sim.quality.average_ms() - stats.total_ms * 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_tuning_setters_validate() {
        let mut sim = ClothSimulator::with_grid(2, 2, 1.0).unwrap();
        sim.set_damping(0.9).unwrap();
        sim.set_friction(0.0).unwrap();
        sim.set_time_step(0.01).unwrap();
        assert_eq!(sim.config().global_damping, 0.9);
        assert_eq!(sim.config().friction, 0.0);
        assert_eq!(sim.config().time_step, 0.01);

        assert!(matches!(sim.set_damping(0.0), Err(ClothError::Configuration(_))));
        assert!(sim.set_damping(1.01).is_err());
        assert!(sim.set_friction(-0.1).is_err());
        assert!(sim.set_friction(f32::NAN).is_err());
        assert!(sim.set_time_step(0.0).is_err());
        assert!(sim.set_time_step(f32::INFINITY).is_err());
        assert_eq!(sim.config().global_damping, 0.9, "rejected values leave the config alone");
        assert!(sim.config().validate().is_ok());
    }

    #[test]
    fn test_set_stiffness_rewrites_distance_constraints() {
        let mut sim = ClothSimulator::with_grid(3, 3, 1.0).unwrap();
        sim.set_stiffness(0.3).unwrap();
        assert!(sim
            .constraints()
            .iter()
            .filter(|c| matches!(c.kind, crate::constraints::ConstraintKind::Distance { .. }))
            .all(|c| c.stiffness == 0.3));
        assert!(sim.set_stiffness(1.5).is_err());
    }

    #[test]
    fn test_remove_primitive_out_of_range() {
        let mut sim = ClothSimulator::new();
        assert_eq!(sim.add_collision_primitive(CollisionPrimitive::sphere(Vec3::ZERO, 1.0)), 0);
        assert!(matches!(sim.remove_collision_primitive(1), Err(ClothError::Index { .. })));
        assert!(sim.remove_collision_primitive(0).is_ok());
    }
}
