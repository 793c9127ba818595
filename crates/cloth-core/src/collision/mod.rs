//! Collision response against rigid primitives and the cloth itself.
//!
//! Runs after constraint projection in every substep. Penetrating particles
//! are moved out by exactly the penetration depth; their implicit velocity
//! then loses its inward normal part and a `friction` share of its
//! tangential part.

pub mod primitive;
pub mod self_collision;

pub use primitive::{CollisionPrimitive, Contact, Shape};
pub use self_collision::resolve_self_collisions;

use glam::Vec3;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::particle::ParticleSet;

/// Counters from one collision pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ContactStats {
    pub contacts: u32,
    /// Primitives skipped because their geometry is degenerate.
    pub degenerate: u32,
}

impl std::ops::AddAssign for ContactStats {
    fn add_assign(&mut self, rhs: Self) {
        self.contacts += rhs.contacts;
        self.degenerate += rhs.degenerate;
    }
}

/// Push one free particle out of `primitive` and apply the velocity response.
///
/// `dt` is the substep length, used to turn the primitive's surface velocity
/// into a per-substep displacement. Returns true on contact.
#[inline]
pub fn resolve_particle(
    position: &mut Vec3,
    previous: &mut Vec3,
    primitive: &CollisionPrimitive,
    friction: f32,
    dt: f32,
) -> bool {
    let Some(contact) = primitive.contact(*position) else {
        return false;
    };
    let n = contact.normal;
    let surface = primitive.surface_velocity() * dt;

    let relative = (*position - *previous) - surface;
    let normal_speed = relative.dot(n);
    let tangential = relative - n * normal_speed;
    let normal_part = if normal_speed < 0.0 { Vec3::ZERO } else { n * normal_speed };
    let response = normal_part + tangential * (1.0 - friction) + surface;

    *position += n * contact.depth;
    *previous = *position - response;
    true
}

/// Resolve every free particle against every primitive, in list order.
pub fn resolve_primitives(
    particles: &mut ParticleSet,
    primitives: &[CollisionPrimitive],
    friction: f32,
    dt: f32,
) -> ContactStats {
    let mut stats = ContactStats::default();
    for (index, primitive) in primitives.iter().enumerate() {
        if let Some(reason) = primitive.degeneracy() {
            tracing::debug!(index, reason, "skipping degenerate collision primitive");
            stats.degenerate += 1;
            continue;
        }
        stats.contacts += resolve_one(particles, primitive, friction, dt);
    }
    stats
}

#[cfg(feature = "parallel")]
fn resolve_one(particles: &mut ParticleSet, primitive: &CollisionPrimitive, friction: f32, dt: f32) -> u32 {
    particles
        .position
        .par_iter_mut()
        .zip(particles.previous.par_iter_mut())
        .zip(particles.inv_mass.par_iter())
        .map(|((pos, prev), &w)| {
            (w > 0.0 && resolve_particle(pos, prev, primitive, friction, dt)) as u32
        })
        .sum()
}

#[cfg(not(feature = "parallel"))]
fn resolve_one(particles: &mut ParticleSet, primitive: &CollisionPrimitive, friction: f32, dt: f32) -> u32 {
    let mut contacts = 0;
    for i in 0..particles.count {
        if particles.inv_mass[i] <= 0.0 {
            continue;
        }
        let (pos, prev) = (&mut particles.position[i], &mut particles.previous[i]);
        if resolve_particle(pos, prev, primitive, friction, dt) {
            contacts += 1;
        }
    }
    contacts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inward_velocity_removed() {
        let floor = CollisionPrimitive::plane(Vec3::ZERO, Vec3::Y);
        let mut pos = Vec3::new(0.0, -0.1, 0.0);
        let mut prev = Vec3::new(0.0, 0.1, 0.0);
        assert!(resolve_particle(&mut pos, &mut prev, &floor, 0.0, 0.01));
        assert_eq!(pos.y, 0.0);
        assert!((pos - prev).y.abs() < 1e-6);
    }

    #[test]
    fn test_friction_scales_tangential_velocity() {
        let floor = CollisionPrimitive::plane(Vec3::ZERO, Vec3::Y);
        let mut pos = Vec3::new(1.0, -0.1, 0.0);
        let mut prev = Vec3::new(0.0, 0.0, 0.0);
        resolve_particle(&mut pos, &mut prev, &floor, 0.25, 0.01);
        let v = pos - prev;
        assert!((v.x - 0.75).abs() < 1e-6);
        assert!(v.y.abs() < 1e-6);
    }

    #[test]
    fn test_kinematic_surface_drags_particle() {
        let belt = CollisionPrimitive::plane(Vec3::ZERO, Vec3::Y).moving(Vec3::new(10.0, 0.0, 0.0));
        let mut pos = Vec3::new(0.0, -0.01, 0.0);
        let mut prev = pos;
        resolve_particle(&mut pos, &mut prev, &belt, 1.0, 0.1);
        // Full friction: the particle matches the surface velocity.
        assert!(((pos - prev).x - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_pinned_particles_not_moved() {
        let mut particles = ParticleSet::grid(2, 1, 1.0, 1.0);
        particles.set_pinned(0, true).unwrap();
        let sphere = CollisionPrimitive::sphere(Vec3::ZERO, 0.5);
        let stats = resolve_primitives(&mut particles, &[sphere], 0.0, 0.01);
        assert_eq!(particles.position[0], Vec3::ZERO);
        assert_eq!(stats.contacts, 0);
    }

    #[test]
    fn test_degenerate_primitive_skipped() {
        let mut particles = ParticleSet::grid(2, 1, 1.0, 1.0);
        let bad = CollisionPrimitive::sphere(Vec3::ZERO, -1.0);
        let stats = resolve_primitives(&mut particles, &[bad], 0.0, 0.01);
        assert_eq!(stats, ContactStats { contacts: 0, degenerate: 1 });
        assert_eq!(particles.position[0], Vec3::ZERO);
    }
}
