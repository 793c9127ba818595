//! Binary save/load of a simulation.
//!
//! Layout: one [`Header`], `particle_count` [`ParticleRecord`]s, then
//! `constraint_count` [`ConstraintRecord`]s. Records are fixed-size
//! `#[repr(C)]` structs written in native byte order, which is little-endian
//! on every target the crate is built for.
//!
//! Decoding builds a complete [`Snapshot`] before returning, so a rejected
//! file never leaves partial state behind.

use std::path::Path;

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use crate::constraints::{Constraint, ConstraintKind};
use crate::error::{ClothError, ClothResult};
use crate::particle::ParticleSet;

pub const MAGIC: [u8; 4] = *b"CLTH";
pub const VERSION: u32 = 1;

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct Header {
    pub magic: [u8; 4],
    pub version: u32,
    pub width: u32,
    pub height: u32,
    pub spacing: f32,
    pub particle_mass: f32,
    pub particle_count: u32,
    pub constraint_count: u32,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct ParticleRecord {
    pub position: [f32; 3],
    pub previous: [f32; 3],
    pub inverse_mass: f32,
    /// 0 or 1.
    pub pinned: u32,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct ConstraintRecord {
    pub a: u32,
    pub b: u32,
    /// See [`ConstraintKind::tag`].
    pub kind: u32,
    pub rest_value: f32,
    pub stiffness: f32,
    pub damping: f32,
}

const HEADER_SIZE: usize = std::mem::size_of::<Header>();
const PARTICLE_SIZE: usize = std::mem::size_of::<ParticleRecord>();
const CONSTRAINT_SIZE: usize = std::mem::size_of::<ConstraintRecord>();

/// A fully decoded and validated simulation file.
#[derive(Clone, Debug)]
pub struct Snapshot {
    pub particles: ParticleSet,
    pub constraints: Vec<Constraint>,
}

impl Snapshot {
    pub fn width(&self) -> usize {
        self.particles.width
    }

    pub fn height(&self) -> usize {
        self.particles.height
    }

    pub fn spacing(&self) -> f32 {
        self.particles.spacing
    }

    pub fn particle_mass(&self) -> f32 {
        self.particles.default_mass()
    }
}

/// Serialize particles and constraints.
pub fn encode(particles: &ParticleSet, constraints: &[Constraint]) -> Vec<u8> {
    let header = Header {
        magic: MAGIC,
        version: VERSION,
        width: particles.width as u32,
        height: particles.height as u32,
        spacing: particles.spacing,
        particle_mass: particles.default_mass(),
        particle_count: particles.count as u32,
        constraint_count: constraints.len() as u32,
    };

    let mut bytes = Vec::with_capacity(
        HEADER_SIZE + particles.count * PARTICLE_SIZE + constraints.len() * CONSTRAINT_SIZE,
    );
    bytes.extend_from_slice(bytemuck::bytes_of(&header));

    for i in 0..particles.count {
        let record = ParticleRecord {
            position: particles.position[i].to_array(),
            previous: particles.previous[i].to_array(),
            inverse_mass: particles.inv_mass[i],
            pinned: particles.pinned[i] as u32,
        };
        bytes.extend_from_slice(bytemuck::bytes_of(&record));
    }

    for c in constraints {
        let record = ConstraintRecord {
            a: c.a,
            b: c.b,
            kind: c.kind.tag(),
            rest_value: c.kind.rest_value(),
            stiffness: c.stiffness,
            damping: c.damping,
        };
        bytes.extend_from_slice(bytemuck::bytes_of(&record));
    }

    bytes
}

fn finite3(v: [f32; 3]) -> Option<Vec3> {
    let v = Vec3::from_array(v);
    v.is_finite().then_some(v)
}

/// Parse and validate a simulation file.
pub fn decode(bytes: &[u8]) -> ClothResult<Snapshot> {
    if bytes.len() < HEADER_SIZE {
        return Err(ClothError::format(format!(
            "file is {} bytes, shorter than the {HEADER_SIZE}-byte header",
            bytes.len()
        )));
    }
    let header: Header = bytemuck::pod_read_unaligned(&bytes[..HEADER_SIZE]);

    if header.magic != MAGIC {
        return Err(ClothError::format("bad magic"));
    }
    if header.version != VERSION {
        return Err(ClothError::format(format!("unsupported version {}", header.version)));
    }
    if header.width == 0 || header.height == 0 {
        return Err(ClothError::format(format!(
            "grid dimensions must be positive, got {}x{}",
            header.width, header.height
        )));
    }
    if !(header.spacing.is_finite() && header.spacing > 0.0) {
        return Err(ClothError::format(format!("invalid spacing {}", header.spacing)));
    }
    if !(header.particle_mass.is_finite() && header.particle_mass > 0.0) {
        return Err(ClothError::format(format!("invalid particle mass {}", header.particle_mass)));
    }
    let width = header.width as usize;
    let height = header.height as usize;
    if width.checked_mul(height) != Some(header.particle_count as usize) {
        return Err(ClothError::format(format!(
            "{}x{} grid does not hold {} particles",
            width, height, header.particle_count
        )));
    }

    let particle_count = header.particle_count as usize;
    let constraint_count = header.constraint_count as usize;
    let expected = particle_count
        .checked_mul(PARTICLE_SIZE)
        .and_then(|p| constraint_count.checked_mul(CONSTRAINT_SIZE).map(|c| (p, c)))
        .and_then(|(p, c)| p.checked_add(c))
        .and_then(|body| body.checked_add(HEADER_SIZE));
    if expected != Some(bytes.len()) {
        return Err(ClothError::format(format!(
            "file is {} bytes, header describes {}",
            bytes.len(),
            expected.map_or_else(|| "an impossible size".to_string(), |n| n.to_string())
        )));
    }

    let particle_bytes = &bytes[HEADER_SIZE..HEADER_SIZE + particle_count * PARTICLE_SIZE];
    let constraint_bytes = &bytes[HEADER_SIZE + particle_count * PARTICLE_SIZE..];

    let mut particles = ParticleSet::grid(width, height, header.spacing, header.particle_mass);
    for (i, chunk) in particle_bytes.chunks_exact(PARTICLE_SIZE).enumerate() {
        let record: ParticleRecord = bytemuck::pod_read_unaligned(chunk);
        let (Some(position), Some(previous)) = (finite3(record.position), finite3(record.previous)) else {
            return Err(ClothError::format(format!("particle {i} has a non-finite position")));
        };
        if !(record.inverse_mass.is_finite() && record.inverse_mass >= 0.0) {
            return Err(ClothError::format(format!(
                "particle {i} has invalid inverse mass {}",
                record.inverse_mass
            )));
        }
        let pinned = match record.pinned {
            0 => false,
            1 => true,
            other => return Err(ClothError::format(format!("particle {i} has pinned flag {other}"))),
        };

        particles.position[i] = position;
        particles.pinned[i] = pinned;
        if pinned {
            particles.previous[i] = position;
            particles.inv_mass[i] = 0.0;
        } else {
            particles.previous[i] = previous;
            particles.inv_mass[i] = record.inverse_mass;
            if record.inverse_mass > 0.0 {
                particles.mass[i] = 1.0 / record.inverse_mass;
            }
        }
    }

    let mut constraints = Vec::with_capacity(constraint_count);
    for (i, chunk) in constraint_bytes.chunks_exact(CONSTRAINT_SIZE).enumerate() {
        let record: ConstraintRecord = bytemuck::pod_read_unaligned(chunk);
        let kind = ConstraintKind::from_tag(record.kind, record.rest_value)
            .ok_or_else(|| ClothError::format(format!("constraint {i} has unknown kind {}", record.kind)))?;
        if !(record.stiffness.is_finite() && record.damping.is_finite()) {
            return Err(ClothError::format(format!("constraint {i} has non-finite parameters")));
        }
        let constraint = Constraint {
            a: record.a,
            b: record.b,
            kind,
            stiffness: record.stiffness,
            damping: record.damping,
        };
        constraint
            .validate(&particles)
            .map_err(|e| ClothError::format(format!("constraint {i}: {e}")))?;
        constraints.push(constraint);
    }

    Ok(Snapshot { particles, constraints })
}

/// Write particles and constraints to `path`.
pub fn save(path: impl AsRef<Path>, particles: &ParticleSet, constraints: &[Constraint]) -> ClothResult<()> {
    std::fs::write(path, encode(particles, constraints))?;
    Ok(())
}

/// Read and validate the file at `path`.
pub fn load(path: impl AsRef<Path>) -> ClothResult<Snapshot> {
    let bytes = std::fs::read(path)?;
    decode(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (ParticleSet, Vec<Constraint>) {
        let mut particles = ParticleSet::grid(3, 2, 0.5, 2.0);
        particles.set_pinned(0, true).unwrap();
        particles.position[4] += Vec3::new(0.1, -0.2, 0.3);
        let constraints = vec![
            Constraint::distance(0, 1, 0.5, 0.9).with_damping(0.1),
            Constraint::bend(0, 4, 0.7, 0.5),
            Constraint::volume(1, 5, 0.25, 1.0),
        ];
        (particles, constraints)
    }

    #[test]
    fn test_record_sizes() {
        assert_eq!(HEADER_SIZE, 32);
        assert_eq!(PARTICLE_SIZE, 32);
        assert_eq!(CONSTRAINT_SIZE, 24);
    }

    #[test]
    fn test_decode_restores_state() {
        let (particles, constraints) = sample();
        let snapshot = decode(&encode(&particles, &constraints)).unwrap();
        assert_eq!((snapshot.width(), snapshot.height()), (3, 2));
        assert_eq!(snapshot.particle_mass(), 2.0);
        assert_eq!(snapshot.particles.position, particles.position);
        assert_eq!(snapshot.particles.pinned, particles.pinned);
        assert_eq!(snapshot.constraints, constraints);
    }

    #[test]
    fn test_truncated_file_rejected() {
        let (particles, constraints) = sample();
        let bytes = encode(&particles, &constraints);
        assert!(matches!(decode(&bytes[..bytes.len() - 1]), Err(ClothError::Format(_))));
        assert!(matches!(decode(&bytes[..10]), Err(ClothError::Format(_))));
    }

    #[test]
    fn test_bad_magic_rejected() {
        let (particles, constraints) = sample();
        let mut bytes = encode(&particles, &constraints);
        bytes[0] = b'X';
        assert!(matches!(decode(&bytes), Err(ClothError::Format(_))));
    }

    #[test]
    fn test_out_of_range_constraint_rejected() {
        let (particles, _) = sample();
        let bad = [Constraint::distance(0, 1, 0.5, 1.0)];
        let mut bytes = encode(&particles, &bad);
        let at = HEADER_SIZE + particles.count * PARTICLE_SIZE + 4;
        bytes[at..at + 4].copy_from_slice(&99u32.to_ne_bytes());
        assert!(matches!(decode(&bytes), Err(ClothError::Format(_))));
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let (particles, _) = sample();
        let mut bytes = encode(&particles, &[Constraint::distance(0, 1, 0.5, 1.0)]);
        let at = HEADER_SIZE + particles.count * PARTICLE_SIZE + 8;
        bytes[at..at + 4].copy_from_slice(&7u32.to_ne_bytes());
        assert!(matches!(decode(&bytes), Err(ClothError::Format(_))));
    }

    #[test]
    fn test_count_mismatch_rejected() {
        let (particles, constraints) = sample();
        let mut bytes = encode(&particles, &constraints);
        // width field
        bytes[8..12].copy_from_slice(&4u32.to_ne_bytes());
        assert!(matches!(decode(&bytes), Err(ClothError::Format(_))));
    }
}
