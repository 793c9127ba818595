use serde::{Deserialize, Serialize};

use crate::config::SimulationConfig;

/// Tuning preset for a kind of deformable surface.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClothPreset {
    pub stiffness: f32,
    pub bend_stiffness: f32,
    pub bending: bool,
    pub constraint_damping: f32,
    pub global_damping: f32,
    pub particle_mass: f32,
    pub friction: f32,
    pub solver_iterations: u32,
}

impl ClothPreset {
    /// Squishy, heavily damped body.
    pub const SOFT_BODY: Self = Self {
        stiffness: 0.6,
        bend_stiffness: 0.3,
        bending: true,
        constraint_damping: 0.2,
        global_damping: 0.97,
        particle_mass: 2.0,
        friction: 0.4,
        solver_iterations: 10,
    };

    /// Light strands: stiff along the strand, free to bend.
    pub const HAIR: Self = Self {
        stiffness: 1.0,
        bend_stiffness: 0.05,
        bending: false,
        constraint_damping: 0.05,
        global_damping: 0.98,
        particle_mass: 0.1,
        friction: 0.1,
        solver_iterations: 30,
    };

    /// Clothing fabric.
    pub const FABRIC: Self = Self {
        stiffness: 0.95,
        bend_stiffness: 0.4,
        bending: true,
        constraint_damping: 0.1,
        global_damping: 0.99,
        particle_mass: 1.0,
        friction: 0.3,
        solver_iterations: 20,
    };

    /// Stiff, lightly damped sheet that ripples in wind.
    pub const FLAG: Self = Self {
        stiffness: 1.0,
        bend_stiffness: 0.7,
        bending: true,
        constraint_damping: 0.02,
        global_damping: 0.995,
        particle_mass: 0.5,
        friction: 0.1,
        solver_iterations: 25,
    };

    /// Overwrite the material fields of `config`; grid and timing are kept.
    pub fn apply_to(&self, config: &mut SimulationConfig) {
        config.stiffness = self.stiffness;
        config.bend_stiffness = self.bend_stiffness;
        config.bending = self.bending;
        config.constraint_damping = self.constraint_damping;
        config.global_damping = self.global_damping;
        config.particle_mass = self.particle_mass;
        config.friction = self.friction;
        config.solver_iterations = self.solver_iterations;
    }
}
