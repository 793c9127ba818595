//! Graph coloring for parallel-safe constraint projection.
//!
//! Greedy coloring with a per-particle `u64` color mask. Constraints in the
//! same batch touch disjoint particles, so a batch can be projected
//! concurrently without write conflicts.

/// Partition `items` into batches with no shared particle.
///
/// `touched(item)` lists the particles an item writes. Items keep their
/// relative order inside each batch. Items that would need more than 64
/// colors get a batch of their own.
pub fn color_batches<F>(items: &[usize], particle_count: usize, touched: F) -> Vec<Vec<usize>>
where
    F: Fn(usize) -> Vec<u32>,
{
    let mut used: Vec<u64> = vec![0; particle_count];
    let mut batches: Vec<Vec<usize>> = Vec::new();
    let mut overflow: Vec<Vec<usize>> = Vec::new();

    for &item in items {
        let particles = touched(item);
        let mask = particles.iter().fold(0u64, |m, &p| m | used[p as usize]);

        if mask == u64::MAX {
            overflow.push(vec![item]);
            continue;
        }

        let color = (!mask).trailing_zeros() as usize;
        for &p in &particles {
            used[p as usize] |= 1u64 << color;
        }
        if batches.len() <= color {
            batches.resize_with(color + 1, Vec::new);
        }
        batches[color].push(item);
    }

    batches.extend(overflow);
    batches
}
