//! Per-substep force accumulation.
//!
//! Gravity, wind, per-frame impulses and registered custom strategies are
//! summed into `ParticleSet::force`. The buffer is overwritten every substep,
//! so nothing carries over between frames.

pub mod registry;
pub mod wind;

use glam::Vec3;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::particle::ParticleSet;
use registry::{ForceRegistry, ParticleSample};
use wind::WindField;

/// Everything the accumulator needs besides the particles.
pub struct ForceInputs<'a> {
    pub gravity: Vec3,
    pub wind: &'a [WindField],
    /// Per-particle external force for this frame (same length as the set).
    pub external: &'a [Vec3],
    pub custom: &'a ForceRegistry,
    pub time: f32,
}

/// Force on one free particle.
#[inline]
fn particle_force(
    index: usize,
    position: Vec3,
    previous: Vec3,
    mass: f32,
    inputs: &ForceInputs<'_>,
) -> Vec3 {
    let mut force = inputs.gravity * mass;
    for wind in inputs.wind {
        force += wind.force_at(position, inputs.time);
    }
    force += inputs.external[index];
    if !inputs.custom.is_empty() {
        let sample = ParticleSample {
            index,
            position,
            displacement: position - previous,
            mass,
        };
        force += inputs.custom.evaluate(&sample, inputs.time);
    }
    force
}

/// Overwrite `particles.force` with this substep's forces.
///
/// Pinned particles (inverse mass 0) get zero force.
pub fn accumulate(particles: &mut ParticleSet, inputs: &ForceInputs<'_>) {
    debug_assert_eq!(inputs.external.len(), particles.count);

    let position = &particles.position;
    let previous = &particles.previous;
    let mass = &particles.mass;
    let inv_mass = &particles.inv_mass;

    let compute = |(i, out): (usize, &mut Vec3)| {
        *out = if inv_mass[i] == 0.0 {
            Vec3::ZERO
        } else {
            particle_force(i, position[i], previous[i], mass[i], inputs)
        };
    };

    #[cfg(feature = "parallel")]
    particles.force.par_iter_mut().enumerate().for_each(compute);

    #[cfg(not(feature = "parallel"))]
    particles.force.iter_mut().enumerate().for_each(compute);
}
