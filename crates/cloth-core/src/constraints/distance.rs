use glam::Vec3;

use super::Projection;
use crate::particle::ParticleSet;

/// Squared lengths below this are treated as coincident particles.
const MIN_LENGTH_SQ: f32 = 1e-12;

/// Position corrections for one distance-style pair, or why there are none.
///
/// With `d = p_b - p_a` and `c = (|d| - rest) / |d|`, endpoint A moves by
/// `d * c * w_a / (w_a + w_b) * stiffness` and B by the mirrored amount,
/// pulling the pair toward `rest`. Corrections are split by inverse mass, so
/// a pinned endpoint (w = 0) never moves.
#[inline]
pub fn pair_correction(
    p_a: Vec3,
    p_b: Vec3,
    w_a: f32,
    w_b: f32,
    rest: f32,
    stiffness: f32,
) -> Result<(Vec3, Vec3), Projection> {
    let w_sum = w_a + w_b;
    if w_sum <= 0.0 {
        return Err(Projection::Fixed);
    }
    let d = p_b - p_a;
    let len_sq = d.length_squared();
    if len_sq < MIN_LENGTH_SQ {
        return Err(Projection::Degenerate);
    }
    let len = len_sq.sqrt();
    let c = (len - rest) / len * stiffness;
    Ok((d * (c * w_a / w_sum), -d * (c * w_b / w_sum)))
}

/// Project one distance-style pair in place (Gauss–Seidel).
pub fn project_pair(
    particles: &mut ParticleSet,
    a: usize,
    b: usize,
    rest: f32,
    stiffness: f32,
) -> Projection {
    match pair_correction(
        particles.position[a],
        particles.position[b],
        particles.inv_mass[a],
        particles.inv_mass[b],
        rest,
        stiffness,
    ) {
        Ok((da, db)) => {
            particles.position[a] += da;
            particles.position[b] += db;
            Projection::Applied
        }
        Err(skipped) => skipped,
    }
}

/// Remove the fraction `damping` of the pair's relative implicit velocity
/// along the constraint axis.
///
/// Only previous positions are edited, so the constraint's current
/// satisfaction is unchanged.
pub fn damp_pair(particles: &mut ParticleSet, a: usize, b: usize, damping: f32) {
    let w_a = particles.inv_mass[a];
    let w_b = particles.inv_mass[b];
    let w_sum = w_a + w_b;
    if w_sum <= 0.0 || damping <= 0.0 {
        return;
    }
    let d = particles.position[b] - particles.position[a];
    let len_sq = d.length_squared();
    if len_sq < MIN_LENGTH_SQ {
        return;
    }
    let n = d / len_sq.sqrt();
    let v_a = particles.position[a] - particles.previous[a];
    let v_b = particles.position[b] - particles.previous[b];
    let closing = (v_b - v_a).dot(n) * damping;

    // Raising v_a and lowering v_b along n shrinks the relative velocity.
    particles.previous[a] -= n * (closing * w_a / w_sum);
    particles.previous[b] += n * (closing * w_b / w_sum);
}
