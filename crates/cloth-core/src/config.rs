use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::{ClothError, ClothResult};

/// Simulation parameters for one cloth patch.
///
/// Loaded from JSON with [`SimulationConfig::from_json_str`]; missing fields
/// fall back to [`Default`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Particles per row.
    pub width: usize,
    /// Particles per column.
    pub height: usize,
    /// Rest distance between adjacent particles.
    pub spacing: f32,
    /// Frame length in seconds for fixed-rate stepping with `ClothSimulator::step`.
    pub time_step: f32,
    pub substeps: u32,
    pub solver_iterations: u32,
    pub gravity: Vec3,
    /// Verlet velocity retention per substep, in (0, 1]. 1.0 is lossless.
    pub global_damping: f32,
    /// Tangential velocity loss on contact, in [0, 1].
    pub friction: f32,
    pub self_collision: bool,
    /// Minimum distance kept between non-connected particles when
    /// `self_collision` is on. `None` means half the grid spacing.
    pub self_collision_radius: Option<f32>,
    /// Uniform default particle mass.
    pub particle_mass: f32,
    /// Stiffness of generated Distance constraints.
    pub stiffness: f32,
    /// Stiffness of generated Bend constraints.
    pub bend_stiffness: f32,
    /// Damping of generated constraints.
    pub constraint_damping: f32,
    /// Generate diagonal Bend constraints at initialization.
    pub bending: bool,
    /// Remove Distance constraints stretched past `tear_factor * rest_length`.
    pub tear_factor: Option<f32>,
    /// Solve constraints in graph-colored batches.
    pub colored_solve: bool,
    /// Frame time budget in milliseconds.
    pub frame_budget_ms: f32,
    /// Let the driver trade iterations/substeps for frame time.
    pub adaptive_quality: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            width: 10,
            height: 10,
            spacing: 0.1,
            time_step: 1.0 / 60.0,
            substeps: 4,
            solver_iterations: 20,
            gravity: Vec3::new(0.0, -9.81, 0.0),
            global_damping: 0.99,
            friction: 0.2,
            self_collision: false,
            self_collision_radius: None,
            particle_mass: 1.0,
            stiffness: 1.0,
            bend_stiffness: 0.5,
            constraint_damping: 0.1,
            bending: true,
            tear_factor: None,
            colored_solve: false,
            frame_budget_ms: 16.0,
            adaptive_quality: false,
        }
    }
}

impl SimulationConfig {
    /// Default config with the given grid dimensions.
    pub fn with_grid(width: usize, height: usize, spacing: f32) -> Self {
        Self {
            width,
            height,
            spacing,
            ..Self::default()
        }
    }

    /// Parse a config from JSON. The result is validated.
    pub fn from_json_str(json: &str) -> ClothResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| ClothError::config(format!("malformed config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_string(&self) -> ClothResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ClothError::config(format!("cannot encode config: {e}")))
    }

    /// Effective self-collision separation.
    pub fn self_collision_radius(&self) -> f32 {
        self.self_collision_radius.unwrap_or(self.spacing * 0.5)
    }

    /// Check every numeric field. Grid dimensions and spacing must be positive.
    pub fn validate(&self) -> ClothResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ClothError::config(format!(
                "grid dimensions must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        if self.width.checked_mul(self.height).map_or(true, |n| n > u32::MAX as usize) {
            return Err(ClothError::config(format!(
                "grid {}x{} is too large",
                self.width, self.height
            )));
        }
        if !(self.spacing.is_finite() && self.spacing > 0.0) {
            return Err(ClothError::config(format!(
                "spacing must be positive, got {}",
                self.spacing
            )));
        }
        if !(self.time_step.is_finite() && self.time_step > 0.0) {
            return Err(ClothError::config(format!(
                "time step must be positive, got {}",
                self.time_step
            )));
        }
        if !(self.particle_mass.is_finite() && self.particle_mass > 0.0) {
            return Err(ClothError::config(format!(
                "particle mass must be positive, got {}",
                self.particle_mass
            )));
        }
        if !(self.global_damping > 0.0 && self.global_damping <= 1.0) {
            return Err(ClothError::config(format!(
                "global damping must be in (0, 1], got {}",
                self.global_damping
            )));
        }
        for (name, value) in [
            ("friction", self.friction),
            ("stiffness", self.stiffness),
            ("bend stiffness", self.bend_stiffness),
            ("constraint damping", self.constraint_damping),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ClothError::config(format!(
                    "{name} must be in [0, 1], got {value}"
                )));
            }
        }
        if !self.gravity.is_finite() {
            return Err(ClothError::config("gravity must be finite"));
        }
        if let Some(radius) = self.self_collision_radius {
            if !(radius.is_finite() && radius > 0.0) {
                return Err(ClothError::config(format!(
                    "self-collision radius must be positive, got {radius}"
                )));
            }
        }
        if let Some(factor) = self.tear_factor {
            if !(factor.is_finite() && factor > 1.0) {
                return Err(ClothError::config(format!(
                    "tear factor must be greater than 1, got {factor}"
                )));
            }
        }
        if !(self.frame_budget_ms.is_finite() && self.frame_budget_ms > 0.0) {
            return Err(ClothError::config(format!(
                "frame budget must be positive, got {}",
                self.frame_budget_ms
            )));
        }
        Ok(())
    }
}
