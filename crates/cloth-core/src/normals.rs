//! Per-particle surface normals for rendering.
//!
//! Every grid cell is split into two triangles; each particle's normal is
//! the normalized sum of the area-weighted face normals around it. The rest
//! lattice faces +Z.

use glam::Vec3;

use crate::particle::ParticleSet;

/// Triangles of cell `(x, y)`, wound so the rest lattice faces +Z.
#[inline]
fn cell_triangles(width: usize, x: usize, y: usize) -> [[usize; 3]; 2] {
    let tl = y * width + x;
    let tr = tl + 1;
    let bl = tl + width;
    let br = bl + 1;
    [[tl, bl, tr], [tr, bl, br]]
}

/// Index triples for the whole grid, in the winding used for normals.
pub fn grid_triangles(width: usize, height: usize) -> Vec<[u32; 3]> {
    let mut out = Vec::with_capacity(2 * width.saturating_sub(1) * height.saturating_sub(1));
    for y in 0..height.saturating_sub(1) {
        for x in 0..width.saturating_sub(1) {
            for tri in cell_triangles(width, x, y) {
                out.push(tri.map(|i| i as u32));
            }
        }
    }
    out
}

/// Recompute `particles.normal` from current positions.
///
/// Particles whose surrounding faces have collapsed keep their previous
/// normal.
pub fn recompute(particles: &mut ParticleSet) {
    let (w, h) = (particles.width, particles.height);
    let mut accum = vec![Vec3::ZERO; particles.count];

    for y in 0..h.saturating_sub(1) {
        for x in 0..w.saturating_sub(1) {
            for [a, b, c] in cell_triangles(w, x, y) {
                let pa = particles.position[a];
                // Magnitude is twice the triangle area.
                let n = (particles.position[b] - pa).cross(particles.position[c] - pa);
                accum[a] += n;
                accum[b] += n;
                accum[c] += n;
            }
        }
    }

    for (normal, sum) in particles.normal.iter_mut().zip(accum) {
        if let Some(n) = sum.try_normalize() {
            *normal = n;
        }
    }
}
