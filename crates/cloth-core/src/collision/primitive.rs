//! Analytical collision primitives.
//!
//! Each shape answers one question: is a point inside, and if so, which way
//! out and how far. The resolver matches on the shape tag; there is no
//! dynamic dispatch.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Squared lengths below this count as zero.
const EPS_SQ: f32 = 1e-12;

/// Shape of a collision primitive, in primitive-local space.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Sphere { radius: f32 },
    /// Oriented box. `rotation` is identity for an axis-aligned box.
    Box { half_extents: Vec3, rotation: Quat },
    /// Infinite plane through the primitive position. Points on the side
    /// `normal` points to are outside.
    Plane { normal: Vec3 },
    /// Two-sided triangle shell of the given half-thickness.
    Mesh { triangles: Vec<[Vec3; 3]>, thickness: f32 },
}

/// A rigid obstacle the cloth collides with.
///
/// Owned by the caller and copied in; the simulator keeps no reference to
/// scene data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CollisionPrimitive {
    pub shape: Shape,
    pub position: Vec3,
    /// Kinematic primitives move; friction acts on velocity relative to them.
    pub kinematic: bool,
    /// Surface velocity of a kinematic primitive (ignored when static).
    pub velocity: Vec3,
}

/// Penetration of one point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Contact {
    /// Unit direction out of the primitive.
    pub normal: Vec3,
    /// Distance to move along `normal` to reach the surface.
    pub depth: f32,
}

impl CollisionPrimitive {
    fn fixed(shape: Shape, position: Vec3) -> Self {
        Self { shape, position, kinematic: false, velocity: Vec3::ZERO }
    }

    pub fn sphere(center: Vec3, radius: f32) -> Self {
        Self::fixed(Shape::Sphere { radius }, center)
    }

    pub fn aabb(center: Vec3, half_extents: Vec3) -> Self {
        Self::fixed(Shape::Box { half_extents, rotation: Quat::IDENTITY }, center)
    }

    pub fn oriented_box(center: Vec3, half_extents: Vec3, rotation: Quat) -> Self {
        Self::fixed(Shape::Box { half_extents, rotation }, center)
    }

    pub fn plane(point: Vec3, normal: Vec3) -> Self {
        Self::fixed(Shape::Plane { normal }, point)
    }

    /// Triangle soup relative to `origin`.
    pub fn mesh(origin: Vec3, triangles: Vec<[Vec3; 3]>, thickness: f32) -> Self {
        Self::fixed(Shape::Mesh { triangles, thickness }, origin)
    }

    /// Mark as kinematic, moving at `velocity`.
    pub fn moving(mut self, velocity: Vec3) -> Self {
        self.kinematic = true;
        self.velocity = velocity;
        self
    }

    /// Surface velocity used for friction.
    #[inline]
    pub fn surface_velocity(&self) -> Vec3 {
        if self.kinematic {
            self.velocity
        } else {
            Vec3::ZERO
        }
    }

    /// Why this primitive cannot collide, if it cannot.
    pub fn degeneracy(&self) -> Option<&'static str> {
        if !self.position.is_finite() {
            return Some("non-finite position");
        }
        match &self.shape {
            Shape::Sphere { radius } if !(*radius > 0.0) => Some("sphere radius is not positive"),
            Shape::Box { half_extents, .. } if !(half_extents.min_element() > 0.0) => {
                Some("box half extent is not positive")
            }
            Shape::Box { rotation, .. } if rotation.length_squared() < EPS_SQ => {
                Some("box rotation is zero")
            }
            Shape::Plane { normal } if normal.length_squared() < EPS_SQ => Some("plane normal is zero"),
            Shape::Mesh { thickness, .. } if !(*thickness > 0.0) => Some("mesh thickness is not positive"),
            Shape::Mesh { triangles, .. } if !triangles.iter().any(|t| triangle_normal(t).is_some()) => {
                Some("mesh has no non-degenerate triangle")
            }
            _ => None,
        }
    }

    /// Penetration of `p`, if any.
    pub fn contact(&self, p: Vec3) -> Option<Contact> {
        match &self.shape {
            Shape::Sphere { radius } => sphere_contact(self.position, *radius, p),
            Shape::Box { half_extents, rotation } => {
                box_contact(self.position, *half_extents, *rotation, p)
            }
            Shape::Plane { normal } => plane_contact(self.position, *normal, p),
            Shape::Mesh { triangles, thickness } => {
                let local = p - self.position;
                triangles
                    .iter()
                    .filter_map(|t| triangle_contact(t, *thickness, local))
                    .max_by(|a, b| a.depth.total_cmp(&b.depth))
            }
        }
    }
}

fn sphere_contact(center: Vec3, radius: f32, p: Vec3) -> Option<Contact> {
    let d = p - center;
    let dist_sq = d.length_squared();
    if dist_sq >= radius * radius {
        return None;
    }
    if dist_sq <= EPS_SQ {
        // At the center every direction is equally short; push up.
        return Some(Contact { normal: Vec3::Y, depth: radius });
    }
    let dist = dist_sq.sqrt();
    Some(Contact { normal: d / dist, depth: radius - dist })
}

fn box_contact(center: Vec3, half: Vec3, rotation: Quat, p: Vec3) -> Option<Contact> {
    let rotation = rotation.normalize();
    let local = rotation.inverse() * (p - center);
    let clamped = local.clamp(-half, half);
    if clamped != local {
        return None; // outside: the clamp moved the point
    }

    // Inside: leave through the nearest face.
    let gap = half - local.abs();
    let axis = if gap.x <= gap.y && gap.x <= gap.z {
        0
    } else if gap.y <= gap.z {
        1
    } else {
        2
    };
    let depth = gap[axis];
    if depth <= 0.0 {
        return None; // on the surface
    }
    let mut normal = Vec3::ZERO;
    normal[axis] = if local[axis] >= 0.0 { 1.0 } else { -1.0 };
    Some(Contact { normal: rotation * normal, depth })
}

fn plane_contact(point: Vec3, normal: Vec3, p: Vec3) -> Option<Contact> {
    let n = normal.try_normalize()?;
    let signed = (p - point).dot(n);
    (signed < 0.0).then(|| Contact { normal: n, depth: -signed })
}

fn triangle_normal(t: &[Vec3; 3]) -> Option<Vec3> {
    (t[1] - t[0]).cross(t[2] - t[0]).try_normalize()
}

/// Barycentric coordinates of `p` projected onto the plane of `t`.
pub fn barycentric(t: &[Vec3; 3], p: Vec3) -> Option<Vec3> {
    let v0 = t[1] - t[0];
    let v1 = t[2] - t[0];
    let v2 = p - t[0];
    let d00 = v0.dot(v0);
    let d01 = v0.dot(v1);
    let d11 = v1.dot(v1);
    let d20 = v2.dot(v0);
    let d21 = v2.dot(v1);
    let denom = d00 * d11 - d01 * d01;
    if denom.abs() < EPS_SQ {
        return None;
    }
    let v = (d11 * d20 - d01 * d21) / denom;
    let w = (d00 * d21 - d01 * d20) / denom;
    Some(Vec3::new(1.0 - v - w, v, w))
}

fn triangle_contact(t: &[Vec3; 3], thickness: f32, p: Vec3) -> Option<Contact> {
    let n = triangle_normal(t)?;
    let bary = barycentric(t, p)?;
    if bary.min_element() < 0.0 {
        return None; // projects outside the triangle
    }
    let signed = (p - t[0]).dot(n);
    if signed.abs() >= thickness {
        return None;
    }
    let side = if signed >= 0.0 { 1.0 } else { -1.0 };
    Some(Contact { normal: n * side, depth: thickness - signed.abs() })
}
