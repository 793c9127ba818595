//! Constraint relaxation.
//!
//! Constraints are kept in one list in insertion order. Each solver
//! iteration projects every Distance constraint, then every Bend, then every
//! Volume (Gauss–Seidel, in place). After the iterations of a substep the
//! per-constraint damping pass runs, and overstretched Distance constraints
//! may tear.

pub mod bend;
pub mod coloring;
pub mod distance;
pub mod volume;

use glam::Vec3;
use serde::{Deserialize, Serialize};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::config::SimulationConfig;
use crate::error::{ClothError, ClothResult};
use crate::particle::ParticleSet;

/// Outcome of projecting one constraint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Projection {
    Applied,
    /// Every particle involved is pinned.
    Fixed,
    /// Zero-length pair or collapsed quad; skipped.
    Degenerate,
}

/// Per-kind rest data.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum ConstraintKind {
    Distance { rest_length: f32 },
    /// Span between the opposite corners of two adjacent edges.
    Bend { rest_length: f32 },
    /// Area of the grid-aligned quad with opposite corners `a` and `b`.
    Volume { rest_area: f32 },
}

impl ConstraintKind {
    /// Wire tag: 0 Distance, 1 Bend, 2 Volume.
    pub fn tag(&self) -> u32 {
        match self {
            ConstraintKind::Distance { .. } => 0,
            ConstraintKind::Bend { .. } => 1,
            ConstraintKind::Volume { .. } => 2,
        }
    }

    pub fn rest_value(&self) -> f32 {
        match *self {
            ConstraintKind::Distance { rest_length } => rest_length,
            ConstraintKind::Bend { rest_length } => rest_length,
            ConstraintKind::Volume { rest_area } => rest_area,
        }
    }

    pub fn from_tag(tag: u32, rest: f32) -> Option<Self> {
        match tag {
            0 => Some(ConstraintKind::Distance { rest_length: rest }),
            1 => Some(ConstraintKind::Bend { rest_length: rest }),
            2 => Some(ConstraintKind::Volume { rest_area: rest }),
            _ => None,
        }
    }
}

/// A relationship between two particles that the solver restores.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    pub a: u32,
    pub b: u32,
    pub kind: ConstraintKind,
    /// Fraction of the full correction applied per iteration, in [0, 1].
    pub stiffness: f32,
    /// Fraction of relative axial velocity removed per substep, in [0, 1].
    pub damping: f32,
}

impl Constraint {
    pub fn distance(a: u32, b: u32, rest_length: f32, stiffness: f32) -> Self {
        Self { a, b, kind: ConstraintKind::Distance { rest_length }, stiffness, damping: 0.0 }
    }

    pub fn bend(a: u32, b: u32, rest_length: f32, stiffness: f32) -> Self {
        Self { a, b, kind: ConstraintKind::Bend { rest_length }, stiffness, damping: 0.0 }
    }

    /// Bend whose rest span is derived from a hinge angle and its two edge lengths.
    pub fn bend_from_angle(a: u32, b: u32, edges: (f32, f32), angle: f32, stiffness: f32) -> Self {
        Self::bend(a, b, bend::span_from_angle(edges.0, edges.1, angle), stiffness)
    }

    pub fn volume(a: u32, b: u32, rest_area: f32, stiffness: f32) -> Self {
        Self { a, b, kind: ConstraintKind::Volume { rest_area }, stiffness, damping: 0.0 }
    }

    pub fn with_damping(mut self, damping: f32) -> Self {
        self.damping = damping;
        self
    }

    /// Rest fold angle of a Bend constraint whose hinge edges have the given
    /// lengths. `None` for other kinds.
    pub fn bend_angle(&self, edges: (f32, f32)) -> Option<f32> {
        match self.kind {
            ConstraintKind::Bend { rest_length } => {
                Some(bend::angle_from_span(edges.0, edges.1, rest_length))
            }
            _ => None,
        }
    }

    /// Particles this constraint writes.
    pub fn touched(&self, width: usize) -> Vec<u32> {
        match self.kind {
            ConstraintKind::Volume { .. } => {
                volume::quad_corners(width, self.a as usize, self.b as usize)
                    .iter()
                    .map(|&i| i as u32)
                    .collect()
            }
            _ => vec![self.a, self.b],
        }
    }

    /// Check indices and parameters against a particle set.
    pub fn validate(&self, particles: &ParticleSet) -> ClothResult<()> {
        for index in [self.a as usize, self.b as usize] {
            if index >= particles.count {
                return Err(ClothError::Index { what: "particle", index, len: particles.count });
            }
        }
        if self.a == self.b {
            return Err(ClothError::config(format!(
                "constraint endpoints must differ, got {} twice",
                self.a
            )));
        }
        if !(0.0..=1.0).contains(&self.stiffness) {
            return Err(ClothError::config(format!(
                "constraint stiffness must be in [0, 1], got {}",
                self.stiffness
            )));
        }
        if !(0.0..=1.0).contains(&self.damping) {
            return Err(ClothError::config(format!(
                "constraint damping must be in [0, 1], got {}",
                self.damping
            )));
        }
        let rest = self.kind.rest_value();
        if !(rest.is_finite() && rest >= 0.0) {
            return Err(ClothError::config(format!(
                "constraint rest value must be finite and non-negative, got {rest}"
            )));
        }
        if let ConstraintKind::Volume { .. } = self.kind {
            let (xa, ya) = particles.coords_of(self.a as usize);
            let (xb, yb) = particles.coords_of(self.b as usize);
            if xa == xb || ya == yb {
                return Err(ClothError::config(format!(
                    "volume corners {} and {} do not span a quad",
                    self.a, self.b
                )));
            }
        }
        Ok(())
    }
}

/// Structural constraints for a freshly created grid.
///
/// Horizontal and vertical Distance constraints first, then (with
/// `config.bending`) both diagonals of every cell as Bend constraints.
pub fn grid_constraints(particles: &ParticleSet, config: &SimulationConfig) -> Vec<Constraint> {
    let (w, h) = (particles.width, particles.height);
    let rest_of = |a: usize, b: usize| (particles.rest_position[b] - particles.rest_position[a]).length();
    let mut out = Vec::new();

    for y in 0..h {
        for x in 0..w.saturating_sub(1) {
            let a = y * w + x;
            out.push(
                Constraint::distance(a as u32, (a + 1) as u32, rest_of(a, a + 1), config.stiffness)
                    .with_damping(config.constraint_damping),
            );
        }
    }
    for y in 0..h.saturating_sub(1) {
        for x in 0..w {
            let a = y * w + x;
            out.push(
                Constraint::distance(a as u32, (a + w) as u32, rest_of(a, a + w), config.stiffness)
                    .with_damping(config.constraint_damping),
            );
        }
    }

    if config.bending {
        for y in 0..h.saturating_sub(1) {
            for x in 0..w.saturating_sub(1) {
                let tl = y * w + x;
                let tr = tl + 1;
                let bl = tl + w;
                let br = bl + 1;
                out.push(
                    Constraint::bend(tl as u32, br as u32, rest_of(tl, br), config.bend_stiffness)
                        .with_damping(config.constraint_damping),
                );
                out.push(
                    Constraint::bend(tr as u32, bl as u32, rest_of(tr, bl), config.bend_stiffness)
                        .with_damping(config.constraint_damping),
                );
            }
        }
    }

    out
}

/// Counters from one call to [`ConstraintSet::solve`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SolveStats {
    /// Constraints skipped as degenerate (counted once per solve).
    pub degenerate: u32,
}

#[derive(Clone, Copy)]
enum Pass {
    Distance,
    Bend,
    Volume,
}

impl Pass {
    const ORDER: [Pass; 3] = [Pass::Distance, Pass::Bend, Pass::Volume];

    fn matches(self, kind: &ConstraintKind) -> bool {
        matches!(
            (self, kind),
            (Pass::Distance, ConstraintKind::Distance { .. })
                | (Pass::Bend, ConstraintKind::Bend { .. })
                | (Pass::Volume, ConstraintKind::Volume { .. })
        )
    }
}

/// Corrections computed for one constraint without touching the particles.
#[cfg_attr(not(feature = "parallel"), allow(dead_code))]
enum Correction {
    Pair { a: usize, b: usize, da: Vec3, db: Vec3 },
    Quad { corners: [usize; 4], deltas: [Vec3; 4] },
    Skipped(Projection),
}

/// The constraint list plus what the solver derives from it.
#[derive(Clone, Debug, Default)]
pub struct ConstraintSet {
    constraints: Vec<Constraint>,
    /// List captured at initialize/load, restored by `reset`.
    initial: Vec<Constraint>,
    /// Colored batches per pass, rebuilt lazily after edits.
    batches: Option<[Vec<Vec<usize>>; 3]>,
}

impl ConstraintSet {
    pub fn new(constraints: Vec<Constraint>) -> Self {
        Self {
            initial: constraints.clone(),
            constraints,
            batches: None,
        }
    }

    pub fn as_slice(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Constraint> {
        self.constraints.get(index)
    }

    /// Validate and append. Returns the new constraint's index.
    pub fn add(&mut self, constraint: Constraint, particles: &ParticleSet) -> ClothResult<usize> {
        constraint.validate(particles)?;
        self.constraints.push(constraint);
        self.batches = None;
        Ok(self.constraints.len() - 1)
    }

    /// Remove by index, keeping the order of the rest.
    pub fn remove(&mut self, index: usize) -> ClothResult<Constraint> {
        if index >= self.constraints.len() {
            return Err(ClothError::Index {
                what: "constraint",
                index,
                len: self.constraints.len(),
            });
        }
        self.batches = None;
        Ok(self.constraints.remove(index))
    }

    /// Set the stiffness of every Distance constraint.
    pub fn set_distance_stiffness(&mut self, stiffness: f32) {
        for c in &mut self.constraints {
            if let ConstraintKind::Distance { .. } = c.kind {
                c.stiffness = stiffness;
            }
        }
    }

    /// Put back the list captured at initialize/load.
    pub fn restore_initial(&mut self) {
        self.constraints.clear();
        self.constraints.extend_from_slice(&self.initial);
        self.batches = None;
    }

    /// Run `iterations` relaxation passes.
    pub fn solve(&mut self, particles: &mut ParticleSet, iterations: u32, colored: bool) -> SolveStats {
        let mut stats = SolveStats::default();
        if colored {
            self.ensure_batches(particles);
        }

        let mut skipped = Vec::new();
        for iteration in 0..iterations {
            skipped.clear();
            for (slot, pass) in Pass::ORDER.into_iter().enumerate() {
                match (&self.batches, colored) {
                    (Some(batches), true) => {
                        solve_batches(&self.constraints, &batches[slot], particles, &mut skipped)
                    }
                    _ => solve_sequential(&self.constraints, pass, particles, &mut skipped),
                }
            }
            if iteration == 0 {
                for &index in &skipped {
                    let c = &self.constraints[index];
                    tracing::warn!(
                        index,
                        kind = ?c.kind,
                        a = c.a,
                        b = c.b,
                        "skipping degenerate constraint"
                    );
                }
                stats.degenerate = skipped.len() as u32;
            }
        }
        stats
    }

    /// Per-constraint damping of relative axial velocity.
    pub fn apply_damping(&self, particles: &mut ParticleSet) {
        for c in &self.constraints {
            if c.damping <= 0.0 {
                continue;
            }
            if let ConstraintKind::Distance { .. } | ConstraintKind::Bend { .. } = c.kind {
                distance::damp_pair(particles, c.a as usize, c.b as usize, c.damping);
            }
        }
    }

    /// Remove Distance constraints stretched beyond `factor * rest_length`.
    /// Returns how many tore.
    pub fn tear(&mut self, particles: &ParticleSet, factor: f32) -> usize {
        let before = self.constraints.len();
        self.constraints.retain(|c| match c.kind {
            ConstraintKind::Distance { rest_length } => {
                let len = (particles.position[c.b as usize] - particles.position[c.a as usize]).length();
                let torn = len > rest_length * factor;
                if torn {
                    tracing::debug!(a = c.a, b = c.b, len, rest_length, "constraint torn");
                }
                !torn
            }
            _ => true,
        });
        let torn = before - self.constraints.len();
        if torn > 0 {
            self.batches = None;
        }
        torn
    }

    fn ensure_batches(&mut self, particles: &ParticleSet) {
        if self.batches.is_some() {
            return;
        }
        let constraints = &self.constraints;
        let width = particles.width;
        let color = |pass: Pass| {
            let items: Vec<usize> = (0..constraints.len())
                .filter(|&i| pass.matches(&constraints[i].kind))
                .collect();
            coloring::color_batches(&items, particles.count, |i| constraints[i].touched(width))
        };
        self.batches = Some([color(Pass::Distance), color(Pass::Bend), color(Pass::Volume)]);
    }
}

/// Partition all constraints into batches whose members share no particle.
///
/// Each batch holds one kind only, and batches come in Distance, Bend,
/// Volume order.
pub fn color_constraints(constraints: &[Constraint], particles: &ParticleSet) -> Vec<Vec<usize>> {
    Pass::ORDER
        .into_iter()
        .flat_map(|pass| {
            let items: Vec<usize> = (0..constraints.len())
                .filter(|&i| pass.matches(&constraints[i].kind))
                .collect();
            coloring::color_batches(&items, particles.count, |i| constraints[i].touched(particles.width))
        })
        .collect()
}

fn project(c: &Constraint, particles: &mut ParticleSet) -> Projection {
    let (a, b) = (c.a as usize, c.b as usize);
    match c.kind {
        ConstraintKind::Distance { rest_length } => {
            distance::project_pair(particles, a, b, rest_length, c.stiffness)
        }
        ConstraintKind::Bend { rest_length } => {
            bend::project_bend(particles, a, b, rest_length, c.stiffness)
        }
        ConstraintKind::Volume { rest_area } => {
            volume::project_volume(particles, a, b, rest_area, c.stiffness)
        }
    }
}

/// Indices of degenerate constraints are pushed onto `skipped`.
fn solve_sequential(
    constraints: &[Constraint],
    pass: Pass,
    particles: &mut ParticleSet,
    skipped: &mut Vec<usize>,
) {
    for (i, c) in constraints.iter().enumerate().filter(|(_, c)| pass.matches(&c.kind)) {
        if project(c, particles) == Projection::Degenerate {
            skipped.push(i);
        }
    }
}

#[cfg_attr(not(feature = "parallel"), allow(dead_code))]
fn correction(c: &Constraint, particles: &ParticleSet) -> Correction {
    let (a, b) = (c.a as usize, c.b as usize);
    match c.kind {
        ConstraintKind::Distance { rest_length: rest } | ConstraintKind::Bend { rest_length: rest } => {
            match distance::pair_correction(
                particles.position[a],
                particles.position[b],
                particles.inv_mass[a],
                particles.inv_mass[b],
                rest,
                c.stiffness,
            ) {
                Ok((da, db)) => Correction::Pair { a, b, da, db },
                Err(skipped) => Correction::Skipped(skipped),
            }
        }
        ConstraintKind::Volume { rest_area } => {
            let corners = volume::quad_corners(particles.width, a, b);
            match volume::quad_correction(
                corners.map(|i| particles.position[i]),
                corners.map(|i| particles.inv_mass[i]),
                rest_area,
                c.stiffness,
            ) {
                Ok(deltas) => Correction::Quad { corners, deltas },
                Err(skipped) => Correction::Skipped(skipped),
            }
        }
    }
}

/// Project colored batches. Batches share no particles, so with the
/// `parallel` feature each batch's corrections are computed concurrently and
/// then applied; the result matches projecting the batch sequentially.
fn solve_batches(
    constraints: &[Constraint],
    batches: &[Vec<usize>],
    particles: &mut ParticleSet,
    skipped: &mut Vec<usize>,
) {
    for batch in batches {
        #[cfg(feature = "parallel")]
        {
            let view: &ParticleSet = particles;
            let corrections: Vec<Correction> =
                batch.par_iter().map(|&i| correction(&constraints[i], view)).collect();
            for (&i, corr) in batch.iter().zip(corrections) {
                match corr {
                    Correction::Pair { a, b, da, db } => {
                        particles.position[a] += da;
                        particles.position[b] += db;
                    }
                    Correction::Quad { corners, deltas } => {
                        for (&i, d) in corners.iter().zip(deltas) {
                            particles.position[i] += d;
                        }
                    }
                    Correction::Skipped(Projection::Degenerate) => skipped.push(i),
                    Correction::Skipped(_) => {}
                }
            }
        }

        #[cfg(not(feature = "parallel"))]
        for &i in batch {
            if project(&constraints[i], particles) == Projection::Degenerate {
                skipped.push(i);
            }
        }
    }
}
