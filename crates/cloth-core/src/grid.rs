use glam::Vec3;

/// Uniform spatial hash for particle-particle proximity queries.
///
/// Built with a counting sort: count particles per bucket, prefix-sum into
/// bucket starts, then scatter indices. Rebuilding is O(N) and reuses every
/// buffer.
#[derive(Clone, Debug)]
pub struct SpatialHashGrid {
    cell_size: f32,
    inv_cell_size: f32,
    table_size: usize,
    /// Particles per bucket (reused as scatter cursor during build).
    bucket_count: Vec<u32>,
    /// Offset of each bucket's first entry in `sorted`.
    bucket_start: Vec<u32>,
    /// Particle indices grouped by bucket.
    sorted: Vec<u32>,
    /// Bucket of each particle from the last build.
    particle_bucket: Vec<u32>,
}

impl SpatialHashGrid {
    /// `cell_size` should be at least the query radius so that a 3x3x3
    /// neighbourhood covers it.
    pub fn new(cell_size: f32, table_size: usize) -> Self {
        let table_size = table_size.max(1);
        Self {
            cell_size,
            inv_cell_size: 1.0 / cell_size,
            table_size,
            bucket_count: vec![0; table_size],
            bucket_start: vec![0; table_size],
            sorted: Vec::new(),
            particle_bucket: Vec::new(),
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn set_cell_size(&mut self, cell_size: f32) {
        self.cell_size = cell_size;
        self.inv_cell_size = 1.0 / cell_size;
    }

    /// Bucket all `positions`.
    pub fn build(&mut self, positions: &[Vec3]) {
        let count = positions.len();
        self.sorted.resize(count, 0);
        self.particle_bucket.resize(count, 0);
        self.bucket_count.fill(0);

        for (i, &p) in positions.iter().enumerate() {
            let (cx, cy, cz) = self.cell_coords(p);
            let h = self.hash_cell(cx, cy, cz);
            self.particle_bucket[i] = h as u32;
            self.bucket_count[h] += 1;
        }

        let mut running = 0u32;
        for (start, &n) in self.bucket_start.iter_mut().zip(&self.bucket_count) {
            *start = running;
            running += n;
        }

        self.bucket_count.fill(0);
        for i in 0..count {
            let h = self.particle_bucket[i] as usize;
            let slot = self.bucket_start[h] + self.bucket_count[h];
            self.sorted[slot as usize] = i as u32;
            self.bucket_count[h] += 1;
        }
    }

    /// Call `visit` for every particle bucketed in the 27 cells around `pos`.
    ///
    /// Hash collisions can report distant particles and, when two neighbour
    /// cells share a bucket, the same particle twice; callers do their own
    /// distance test and must tolerate repeats.
    pub fn query_neighbors<F: FnMut(u32)>(&self, pos: Vec3, mut visit: F) {
        let (cx, cy, cz) = self.cell_coords(pos);
        for dx in -1..=1_i32 {
            for dy in -1..=1_i32 {
                for dz in -1..=1_i32 {
                    let h = self.hash_cell(cx + dx, cy + dy, cz + dz);
                    let start = self.bucket_start[h] as usize;
                    let end = start + self.bucket_count[h] as usize;
                    for &idx in &self.sorted[start..end] {
                        visit(idx);
                    }
                }
            }
        }
    }

    #[inline]
    fn hash_cell(&self, cx: i32, cy: i32, cz: i32) -> usize {
        let h = (cx as u32).wrapping_mul(73856093)
            ^ (cy as u32).wrapping_mul(19349663)
            ^ (cz as u32).wrapping_mul(83492791);
        (h as usize) % self.table_size
    }

    #[inline]
    fn cell_coords(&self, pos: Vec3) -> (i32, i32, i32) {
        (
            (pos.x * self.inv_cell_size).floor() as i32,
            (pos.y * self.inv_cell_size).floor() as i32,
            (pos.z * self.inv_cell_size).floor() as i32,
        )
    }
}
