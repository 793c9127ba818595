use crate::particle::ParticleSet;

/// Advance every particle by one position-Verlet substep.
///
/// `next = x + (x - x_prev) * damping + f * w * dt²`
///
/// Velocity lives implicitly in `x - x_prev`. Pinned particles get
/// `x_prev = x` so they never build up implicit velocity.
pub fn integrate(particles: &mut ParticleSet, dt: f32, damping: f32) {
    let dt_sq = dt * dt;
    for i in 0..particles.count {
        let x = particles.position[i];
        let w = particles.inv_mass[i];
        if w == 0.0 {
            particles.previous[i] = x;
            continue;
        }
        let velocity = (x - particles.previous[i]) * damping;
        particles.previous[i] = x;
        particles.position[i] = x + velocity + particles.force[i] * w * dt_sq;
    }
}
