//! Bend constraints.
//!
//! A bend links the two opposite corners of adjacent structural edges:
//!
//! ```text
//!   a---h
//!       |
//!       b
//! ```
//!
//! With the edge lengths `|a-h|` and `|h-b|` held by distance constraints,
//! the corner-to-corner span `|a-b|` fixes the fold angle at the hinge `h`.
//! The constraint stores that span and projects it like a distance, which
//! keeps the correction inverse-mass weighted and order-independent of the
//! hinge particle.

use super::{distance, Projection};
use crate::particle::ParticleSet;

/// Fold angle at the hinge (radians) for edges `edge_a`, `edge_b` and span `span`.
///
/// Law of cosines. Degenerate edges return 0.
pub fn angle_from_span(edge_a: f32, edge_b: f32, span: f32) -> f32 {
    if edge_a <= 0.0 || edge_b <= 0.0 {
        return 0.0;
    }
    let cos = (edge_a * edge_a + edge_b * edge_b - span * span) / (2.0 * edge_a * edge_b);
    cos.clamp(-1.0, 1.0).acos()
}

/// Span between the opposite corners for a given hinge angle.
pub fn span_from_angle(edge_a: f32, edge_b: f32, angle: f32) -> f32 {
    (edge_a * edge_a + edge_b * edge_b - 2.0 * edge_a * edge_b * angle.cos())
        .max(0.0)
        .sqrt()
}

/// Project one bend in place.
#[inline]
pub fn project_bend(
    particles: &mut ParticleSet,
    a: usize,
    b: usize,
    rest_span: f32,
    stiffness: f32,
) -> Projection {
    distance::project_pair(particles, a, b, rest_span, stiffness)
}
