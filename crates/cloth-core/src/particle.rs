use glam::Vec3;

use crate::error::{ClothError, ClothResult};

/// Read-only snapshot of one particle, handed to the renderer.
#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
    pub position: Vec3,
    pub previous_position: Vec3,
    pub force: Vec3,
    pub mass: f32,
    pub inv_mass: f32,
    pub pinned: bool,
    pub normal: Vec3,
    /// Grid neighbors (left, right, up, down where present).
    pub neighbors: Vec<u32>,
}

impl Particle {
    /// Implicit velocity per substep.
    pub fn displacement(&self) -> Vec3 {
        self.position - self.previous_position
    }
}

/// SoA particle storage laid out as a `width x height` grid.
///
/// Particle `(x, y)` lives at `y * width + x`. Indices never change for the
/// lifetime of the set.
#[derive(Clone, Debug)]
pub struct ParticleSet {
    pub count: usize,
    pub width: usize,
    pub height: usize,
    pub spacing: f32,
    pub position: Vec<Vec3>,
    /// Position at the previous substep; `position - previous` is the implicit velocity.
    pub previous: Vec<Vec3>,
    /// Force accumulated for the current substep.
    pub force: Vec<Vec3>,
    pub mass: Vec<f32>,
    /// 0.0 = pinned / infinite mass.
    pub inv_mass: Vec<f32>,
    pub pinned: Vec<bool>,
    /// Lattice position the grid was created at.
    pub rest_position: Vec<Vec3>,
    /// Derived surface normal, refreshed once per frame.
    pub normal: Vec<Vec3>,
    pub neighbors: Vec<Vec<u32>>,
    default_mass: f32,
}

impl ParticleSet {
    /// Allocate a `width x height` lattice hanging down from the origin.
    ///
    /// Particle `(x, y)` rests at `(x * spacing, -y * spacing, 0)` with zero
    /// initial velocity.
    pub fn grid(width: usize, height: usize, spacing: f32, mass: f32) -> Self {
        let count = width * height;
        let mut rest_position = Vec::with_capacity(count);
        let mut neighbors = Vec::with_capacity(count);

        for y in 0..height {
            for x in 0..width {
                rest_position.push(Vec3::new(x as f32 * spacing, -(y as f32) * spacing, 0.0));

                let mut adj = Vec::with_capacity(4);
                if x > 0 {
                    adj.push((y * width + x - 1) as u32);
                }
                if x + 1 < width {
                    adj.push((y * width + x + 1) as u32);
                }
                if y > 0 {
                    adj.push(((y - 1) * width + x) as u32);
                }
                if y + 1 < height {
                    adj.push(((y + 1) * width + x) as u32);
                }
                neighbors.push(adj);
            }
        }

        Self {
            count,
            width,
            height,
            spacing,
            position: rest_position.clone(),
            previous: rest_position.clone(),
            force: vec![Vec3::ZERO; count],
            mass: vec![mass; count],
            inv_mass: vec![1.0 / mass; count],
            pinned: vec![false; count],
            rest_position,
            normal: vec![Vec3::Z; count],
            neighbors,
            default_mass: mass,
        }
    }

    pub fn default_mass(&self) -> f32 {
        self.default_mass
    }

    /// Grid index of `(x, y)`, or `None` if out of range.
    #[inline]
    pub fn index_of(&self, x: usize, y: usize) -> Option<usize> {
        (x < self.width && y < self.height).then(|| y * self.width + x)
    }

    /// Like [`index_of`](Self::index_of) but reports an `Index` error.
    pub fn checked_index(&self, x: usize, y: usize) -> ClothResult<usize> {
        if x >= self.width {
            return Err(ClothError::Index { what: "column", index: x, len: self.width });
        }
        if y >= self.height {
            return Err(ClothError::Index { what: "row", index: y, len: self.height });
        }
        Ok(y * self.width + x)
    }

    /// `(x, y)` grid coordinates of a particle index.
    #[inline]
    pub fn coords_of(&self, index: usize) -> (usize, usize) {
        (index % self.width, index / self.width)
    }

    /// Bounds-checked snapshot of particle `(x, y)`.
    pub fn get(&self, x: usize, y: usize) -> ClothResult<Particle> {
        let i = self.checked_index(x, y)?;
        Ok(self.snapshot(i))
    }

    /// Snapshot by flat index. Panics if `i` is out of range.
    pub fn snapshot(&self, i: usize) -> Particle {
        Particle {
            position: self.position[i],
            previous_position: self.previous[i],
            force: self.force[i],
            mass: self.mass[i],
            inv_mass: self.inv_mass[i],
            pinned: self.pinned[i],
            normal: self.normal[i],
            neighbors: self.neighbors[i].clone(),
        }
    }

    /// Pin (inverse mass 0) or unpin (default mass) a particle.
    pub fn set_pinned(&mut self, index: usize, pinned: bool) -> ClothResult<()> {
        if index >= self.count {
            return Err(ClothError::Index { what: "particle", index, len: self.count });
        }
        self.pinned[index] = pinned;
        if pinned {
            self.inv_mass[index] = 0.0;
            self.previous[index] = self.position[index];
        } else {
            self.mass[index] = self.default_mass;
            self.inv_mass[index] = 1.0 / self.default_mass;
        }
        Ok(())
    }

    /// Change the uniform default mass. Pinned particles keep inverse mass 0.
    pub fn set_mass(&mut self, mass: f32) {
        self.default_mass = mass;
        for i in 0..self.count {
            self.mass[i] = mass;
            self.inv_mass[i] = if self.pinned[i] { 0.0 } else { 1.0 / mass };
        }
    }

    /// Put every particle back on its rest lattice with zero velocity.
    /// Pins are kept.
    pub fn reset_to_rest(&mut self) {
        self.position.copy_from_slice(&self.rest_position);
        self.previous.copy_from_slice(&self.rest_position);
        self.force.fill(Vec3::ZERO);
        self.normal.fill(Vec3::Z);
    }

    /// Σ |position - previous|² over free particles.
    pub fn kinetic_energy_proxy(&self) -> f32 {
        (0..self.count)
            .filter(|&i| self.inv_mass[i] > 0.0)
            .map(|i| (self.position[i] - self.previous[i]).length_squared())
            .sum()
    }
}
