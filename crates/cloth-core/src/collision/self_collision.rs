//! Particle-particle separation within the cloth.

use std::collections::HashSet;

use crate::constraints::Constraint;
use crate::grid::SpatialHashGrid;
use crate::particle::ParticleSet;

const MIN_SEPARATION: f32 = 1e-6;

/// Unordered pair key.
#[inline]
fn pair_key(a: u32, b: u32) -> (u32, u32) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Push apart particles closer than `radius` that no constraint connects.
///
/// Candidate pairs come from `grid`, rebuilt here with cell size `radius`.
/// Displacement is split by inverse mass. Returns the number of pairs
/// separated.
pub fn resolve_self_collisions(
    particles: &mut ParticleSet,
    constraints: &[Constraint],
    grid: &mut SpatialHashGrid,
    radius: f32,
) -> u32 {
    if !(radius > 0.0) || particles.count < 2 {
        return 0;
    }
    let connected: HashSet<(u32, u32)> = constraints.iter().map(|c| pair_key(c.a, c.b)).collect();

    if grid.cell_size() != radius {
        grid.set_cell_size(radius);
    }
    grid.build(&particles.position);

    let radius_sq = radius * radius;
    let mut candidates: Vec<(u32, u32)> = Vec::new();
    for i in 0..particles.count {
        let p = particles.position[i];
        let i = i as u32;
        grid.query_neighbors(p, |j| {
            if j <= i {
                return;
            }
            if (particles.position[j as usize] - p).length_squared() >= radius_sq {
                return;
            }
            if particles.inv_mass[i as usize] + particles.inv_mass[j as usize] <= 0.0 {
                return;
            }
            if !connected.contains(&(i, j)) {
                candidates.push((i, j));
            }
        });
    }
    candidates.sort_unstable();
    candidates.dedup();

    let mut separated = 0;
    for (i, j) in candidates {
        let (i, j) = (i as usize, j as usize);
        let d = particles.position[j] - particles.position[i];
        let dist = d.length();
        if dist >= radius || dist < MIN_SEPARATION {
            continue;
        }
        let (wi, wj) = (particles.inv_mass[i], particles.inv_mass[j]);
        let n = d / dist;
        let overlap = radius - dist;
        let w_sum = wi + wj;
        particles.position[i] -= n * (overlap * wi / w_sum);
        particles.position[j] += n * (overlap * wj / w_sum);
        separated += 1;
    }
    separated
}
