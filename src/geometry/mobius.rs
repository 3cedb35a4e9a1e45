//! Parametric Möbius strip forming the dial ring.
//!
//! The strip is a ribbon of half-width `h` whose centre line is a circle of
//! radius `R` in the clock plane. Its cross-section turns by `n/2` radians per
//! radian travelled around the ring, so `n` is the number of half twists.

use std::f32::consts::PI;

use nalgebra::Vector3;

use super::{Mesh, Topology, Vertex};

/// Gradient colours walked around the strip, two per half loop.
pub(crate) const PALETTE: [[f32; 3]; 4] = [
    [0.0, 0.0, 1.0],
    [0.0, 1.0, 0.0],
    [1.0, 1.0, 0.0],
    [1.0, 0.0, 0.0],
];

/// Palette offset used for the back side of the strip.
pub(crate) const BACK_PALETTE_OFFSET: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct StripParams {
    /// Radius of the strip's centre line.
    pub(crate) radius: f32,
    /// Half of the ribbon width.
    pub(crate) half_width: f32,
    pub(crate) half_twists: u32,
    /// Samples per half loop.
    pub(crate) steps: u32,
    /// Phase subtracted from the twist; animating it makes the twist travel.
    pub(crate) torsion: f32,
    /// First palette entry of the gradient.
    pub(crate) palette_offset: usize,
}

impl Default for StripParams {
    fn default() -> Self {
        Self {
            radius: 1.0,
            half_width: 0.1,
            half_twists: 3,
            steps: 30,
            torsion: 0.0,
            palette_offset: 0,
        }
    }
}

impl StripParams {
    /// Point on the surface at ring angle `t` and cross-section coordinate
    /// `u` (`+1` outer edge, `-1` inner edge).
    pub(crate) fn point(&self, t: f32, u: f32) -> Vector3<f32> {
        let tau = self.twist_rate() * t - self.torsion;
        let r = self.radius + u * self.half_width * tau.cos();
        Vector3::new(r * t.sin(), r * t.cos(), u * self.half_width * tau.sin())
    }

    /// Surface normal from the analytic partial derivatives.
    pub(crate) fn normal(&self, t: f32, u: f32) -> Vector3<f32> {
        let k = self.twist_rate();
        let h = self.half_width;
        let tau = k * t - self.torsion;
        let (sin_t, cos_t) = t.sin_cos();
        let (sin_tau, cos_tau) = tau.sin_cos();
        let r = self.radius + u * h * cos_tau;

        let d_t = Vector3::new(
            -u * h * k * sin_tau * sin_t + r * cos_t,
            -u * h * k * sin_tau * cos_t - r * sin_t,
            u * h * k * cos_tau,
        );
        let d_u = Vector3::new(h * cos_tau * sin_t, h * cos_tau * cos_t, h * sin_tau);

        d_t.cross(&d_u).normalize()
    }

    fn twist_rate(&self) -> f32 {
        self.half_twists as f32 * 0.5
    }

    /// Colour at fraction `s` of half loop `half`.
    fn color(&self, half: usize, s: f32) -> [f32; 3] {
        let from = PALETTE[(self.palette_offset + half) % PALETTE.len()];
        let to = PALETTE[(self.palette_offset + half + 1) % PALETTE.len()];
        std::array::from_fn(|c| (1.0 - s) * from[c] + s * to[c])
    }
}

/// Builds the strip as a triangle strip alternating outer and inner edge.
///
/// Each half loop is sampled `steps + 1` times so the gradient restarts
/// cleanly at six o'clock; the duplicated samples only add degenerate
/// triangles.
pub(crate) fn strip(params: &StripParams) -> Mesh {
    let steps = params.steps.max(1);
    let mut mesh = Mesh::with_capacity(Topology::TriangleStrip, 4 * (steps as usize + 1));

    for half in 0..2usize {
        for k in 0..=steps {
            let s = k as f32 / steps as f32;
            let t = (half as f32 + s) * PI;
            let color = params.color(half, s);
            let along = (half as f32 + s) * 0.5;

            for (u, across) in [(1.0, 0.0), (-1.0, 1.0)] {
                mesh.push(Vertex::new(
                    params.point(t, u),
                    params.normal(t, u),
                    color,
                    [along, across],
                ));
            }
        }
    }

    mesh
}
