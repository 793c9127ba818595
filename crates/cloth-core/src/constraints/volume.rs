//! Area preservation for a grid-aligned quad.
//!
//! The constraint pair `(a, b)` names opposite corners of a quad in grid
//! coordinates; the other two corners are `(x_b, y_a)` and `(x_a, y_b)`.
//! Its measure is the quad's vector area `½ |(p2 - p0) × (p3 - p1)|`.

use glam::Vec3;

use super::Projection;
use crate::particle::ParticleSet;

const MIN_AREA: f32 = 1e-10;

/// Particle indices of the quad spanned by `a` and `b`, in winding order.
#[inline]
pub fn quad_corners(width: usize, a: usize, b: usize) -> [usize; 4] {
    let (xa, ya) = (a % width, a / width);
    let (xb, yb) = (b % width, b / width);
    [a, ya * width + xb, b, yb * width + xa]
}

/// Vector area of a planar or skew quad.
#[inline]
pub fn quad_area(p: [Vec3; 4]) -> f32 {
    0.5 * (p[2] - p[0]).cross(p[3] - p[1]).length()
}

/// Corner corrections that move the quad area toward `rest_area`.
///
/// Corners are scaled about their centroid by `sqrt(rest / current)`; each
/// corner takes the share `w_i / w_max` of its correction, so pinned corners
/// stay put and lighter corners move most.
pub fn quad_correction(
    p: [Vec3; 4],
    w: [f32; 4],
    rest_area: f32,
    stiffness: f32,
) -> Result<[Vec3; 4], Projection> {
    let w_max = w.iter().copied().fold(0.0_f32, f32::max);
    if w_max <= 0.0 {
        return Err(Projection::Fixed);
    }
    let area = quad_area(p);
    if area < MIN_AREA {
        return Err(Projection::Degenerate);
    }
    let scale = (rest_area / area).sqrt();
    let centroid = (p[0] + p[1] + p[2] + p[3]) * 0.25;

    let mut out = [Vec3::ZERO; 4];
    for i in 0..4 {
        let target = centroid + (p[i] - centroid) * scale;
        out[i] = (target - p[i]) * (stiffness * w[i] / w_max);
    }
    Ok(out)
}

/// Project one volume constraint in place.
pub fn project_volume(
    particles: &mut ParticleSet,
    a: usize,
    b: usize,
    rest_area: f32,
    stiffness: f32,
) -> Projection {
    let corners = quad_corners(particles.width, a, b);
    let p = corners.map(|i| particles.position[i]);
    let w = corners.map(|i| particles.inv_mass[i]);
    match quad_correction(p, w, rest_area, stiffness) {
        Ok(deltas) => {
            for (&i, delta) in corners.iter().zip(deltas) {
                particles.position[i] += delta;
            }
            Projection::Applied
        }
        Err(skipped) => skipped,
    }
}

/// Current area of the quad spanned by `a` and `b`.
pub fn current_area(particles: &ParticleSet, a: usize, b: usize) -> f32 {
    let corners = quad_corners(particles.width, a, b);
    quad_area(corners.map(|i| particles.position[i]))
}
