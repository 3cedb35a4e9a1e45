//! Tapered clock hands lying in the dial plane.

use nalgebra::Vector3;

use super::{Mesh, Topology, Vertex};

/// Dimensions of one hand.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct HandShape {
    /// Distance from the pivot to the tip.
    pub(crate) length: f32,
    /// Overhang behind the pivot.
    pub(crate) tail: f32,
    pub(crate) base_width: f32,
    pub(crate) tip_width: f32,
    /// Height above the dial plane; each hand gets its own layer.
    pub(crate) lift: f32,
    pub(crate) color: [f32; 3],
}

pub(crate) const HOUR_HAND: HandShape = HandShape {
    length: 0.5,
    tail: 0.08,
    base_width: 0.05,
    tip_width: 0.02,
    lift: 0.01,
    color: [0.12, 0.12, 0.15],
};

pub(crate) const MINUTE_HAND: HandShape = HandShape {
    length: 0.75,
    tail: 0.1,
    base_width: 0.035,
    tip_width: 0.012,
    lift: 0.02,
    color: [0.12, 0.12, 0.15],
};

pub(crate) const SECOND_HAND: HandShape = HandShape {
    length: 0.82,
    tail: 0.18,
    base_width: 0.01,
    tip_width: 0.006,
    lift: 0.03,
    color: [0.85, 0.1, 0.1],
};

/// Builds a hand pointing at `angle` radians clockwise from twelve o'clock.
///
/// The hand is a four-vertex strip facing `+z`: base left, base right, tip
/// left, tip right.
pub(crate) fn hand(shape: &HandShape, angle: f32) -> Mesh {
    let (sin, cos) = angle.sin_cos();
    let along = Vector3::new(sin, cos, 0.0);
    let right = Vector3::new(cos, -sin, 0.0);
    let lift = Vector3::new(0.0, 0.0, shape.lift);

    let base = lift - along * shape.tail;
    let tip = lift + along * shape.length;
    let half_base = right * (shape.base_width * 0.5);
    let half_tip = right * (shape.tip_width * 0.5);

    let mut mesh = Mesh::with_capacity(Topology::TriangleStrip, 4);
    for (position, tex_coord) in [
        (base - half_base, [0.0, 0.0]),
        (base + half_base, [1.0, 0.0]),
        (tip - half_tip, [0.0, 1.0]),
        (tip + half_tip, [1.0, 1.0]),
    ] {
        mesh.push(Vertex::new(position, Vector3::z(), shape.color, tex_coord));
    }
    mesh
}
