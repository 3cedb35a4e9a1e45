//! Surfaces of revolution: the face disc, rim, hubcap and frisbee case.
//!
//! A profile curve in the `(r, z)` half plane is swept around the `z` axis.
//! The sweep uses the clock convention (`x = r sin φ`, `y = r cos φ`) so
//! angle zero sits at twelve o'clock like the strip and the hands.

use std::f32::consts::{FRAC_PI_2, PI, TAU};

use nalgebra::{Vector2, Vector3};

use super::{Mesh, Topology, Vertex};

/// One sample of a lathe profile with its normal in the `(r, z)` plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ProfilePoint {
    pub(crate) r: f32,
    pub(crate) z: f32,
    pub(crate) normal: Vector2<f32>,
}

impl ProfilePoint {
    pub(crate) fn new(r: f32, z: f32, normal: Vector2<f32>) -> Self {
        Self { r, z, normal }
    }

    /// Derives normals from the polyline tangent, rotated by `(-dz, dr)`.
    ///
    /// Walking the profile so that the outside lies to the right of the
    /// direction of travel yields outward normals.
    pub(crate) fn from_polyline(points: &[(f32, f32)]) -> Vec<ProfilePoint> {
        let last = points.len().saturating_sub(1);
        (0..points.len())
            .map(|i| {
                let (r0, z0) = points[i.saturating_sub(1)];
                let (r1, z1) = points[(i + 1).min(last)];
                let normal = Vector2::new(-(z1 - z0), r1 - r0)
                    .try_normalize(f32::EPSILON)
                    .unwrap_or_else(Vector2::y);
                let (r, z) = points[i];
                ProfilePoint::new(r, z, normal)
            })
            .collect()
    }
}

/// Sweeps `profile` around the `z` axis into a triangle list.
///
/// Texture coordinates run `j / segments` around the axis and
/// `i / (len - 1)` along the profile.
pub(crate) fn lathe(profile: &[ProfilePoint], segments: u32) -> Mesh {
    if profile.len() < 2 || segments == 0 {
        return Mesh::new(Topology::TriangleList);
    }

    let rows = profile.len() - 1;
    let mut mesh = Mesh::with_capacity(Topology::TriangleList, rows * segments as usize * 6);
    let vertex = |i: usize, j: u32| {
        let point = &profile[i];
        let phi = TAU * j as f32 / segments as f32;
        let (sin, cos) = phi.sin_cos();
        let position = Vector3::new(point.r * sin, point.r * cos, point.z);
        let normal = Vector3::new(point.normal.x * sin, point.normal.x * cos, point.normal.y)
            .normalize();
        let tex_coord = [j as f32 / segments as f32, i as f32 / rows as f32];
        Vertex::new(position, normal, [1.0; 3], tex_coord)
    };

    for i in 0..rows {
        for j in 0..segments {
            let quad = [vertex(i, j), vertex(i, j + 1), vertex(i + 1, j), vertex(i + 1, j + 1)];
            for corner in [0, 1, 2, 2, 1, 3] {
                mesh.push(quad[corner]);
            }
        }
    }

    mesh
}

/// Flat clock face of radius `radius` in the plane `z`, facing `+z`.
///
/// Texture coordinates are a planar projection so a square dial image maps
/// onto the disc with twelve o'clock at the top edge.
pub(crate) fn disc(radius: f32, z: f32, rings: u32, segments: u32) -> Mesh {
    let rings = rings.max(1);
    let profile: Vec<_> = (0..=rings)
        .map(|k| ProfilePoint::new(radius * k as f32 / rings as f32, z, Vector2::y()))
        .collect();
    lathe(&profile, segments).map_tex_coords(|p| {
        [0.5 + 0.5 * p.x / radius, 0.5 - 0.5 * p.y / radius]
    })
}

/// Torus ring of tube radius `tube_radius` centred on a circle of radius
/// `center_radius` in the plane `z`.
pub(crate) fn rim(center_radius: f32, tube_radius: f32, z: f32, segments: u32, sides: u32) -> Mesh {
    let sides = sides.max(3);
    let profile: Vec<_> = (0..=sides)
        .map(|k| {
            let psi = TAU * k as f32 / sides as f32;
            let (sin, cos) = psi.sin_cos();
            ProfilePoint::new(
                center_radius + tube_radius * cos,
                z - tube_radius * sin,
                Vector2::new(cos, -sin),
            )
        })
        .collect();
    lathe(&profile, segments)
}

/// Hemispherical cap of radius `radius` sitting on the plane `z`.
pub(crate) fn hubcap(radius: f32, z: f32, segments: u32, rings: u32) -> Mesh {
    let rings = rings.max(1);
    let profile: Vec<_> = (0..=rings)
        .map(|k| {
            let theta = FRAC_PI_2 * k as f32 / rings as f32;
            let (sin, cos) = theta.sin_cos();
            ProfilePoint::new(radius * sin, z + radius * cos, Vector2::new(sin, cos))
        })
        .collect();
    lathe(&profile, segments)
}

/// Frisbee-shaped case behind the dial.
///
/// The front edge is a rounded lip of radius `lip` around `radius`; behind it
/// the shell curves back to a flat centre `depth` behind the dial plane.
pub(crate) fn frisbee(radius: f32, depth: f32, lip: f32, segments: u32, rings: u32) -> Mesh {
    let rings = rings.max(2);
    let lip_steps = (rings / 2).max(2);

    // Over the lip from its inner front edge, then inward along the back.
    let lip_arc = (0..=lip_steps).map(|k| {
        let psi = PI - 1.5 * PI * k as f32 / lip_steps as f32;
        (radius + lip * psi.cos(), lip * psi.sin())
    });
    let shell = (1..=rings).map(|k| {
        let s = k as f32 / rings as f32;
        let fall = 1.0 - (1.0 - s) * (1.0 - s);
        (radius * (1.0 - s), -lip - (depth - lip) * fall)
    });
    let polyline: Vec<_> = lip_arc.chain(shell).collect();

    lathe(&ProfilePoint::from_polyline(&polyline), segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::tests::{assert_close, assert_well_formed};

    #[test]
    fn short_profiles_and_zero_segments_are_empty() {
        let point = ProfilePoint::new(1.0, 0.0, Vector2::y());
        assert!(lathe(&[point], 16).is_empty());
        assert!(lathe(&[point, point], 0).is_empty());
    }

    #[test]
    fn lathe_emits_two_triangles_per_quad() {
        let mesh = disc(1.0, 0.0, 3, 8);
        assert_eq!(mesh.len(), 3 * 8 * 6);
        assert_eq!(mesh.topology, Topology::TriangleList);
    }

    #[test]
    fn disc_faces_forward_with_planar_texture() {
        let mesh = disc(0.9, -0.01, 4, 24);
        assert_well_formed(&mesh);
        for vertex in &mesh.vertices {
            assert_close(vertex.position[2], -0.01, 1e-6);
            assert_close(vertex.normal[2], 1.0, 1e-6);
        }
        let top = mesh
            .vertices
            .iter()
            .find(|v| (v.position[1] - 0.9).abs() < 1e-6)
            .map(|v| v.tex_coord);
        assert_eq!(top, Some([0.5, 0.0]));
    }

    #[test]
    fn rim_surface_keeps_tube_distance() {
        let mesh = rim(1.2, 0.05, 0.0, 32, 12);
        assert_well_formed(&mesh);
        for vertex in &mesh.vertices {
            let p = vertex.position();
            let ring = (p.x * p.x + p.y * p.y).sqrt();
            let tube = ((ring - 1.2).powi(2) + p.z * p.z).sqrt();
            assert_close(tube, 0.05, 1e-5);
        }
    }

    #[test]
    fn rim_normals_point_away_from_the_tube_centre() {
        let mesh = rim(1.2, 0.05, 0.0, 16, 8);
        for vertex in &mesh.vertices {
            let p = vertex.position();
            let ring = Vector3::new(p.x, p.y, 0.0).normalize() * 1.2;
            assert!((p - ring).normalize().dot(&vertex.normal()) > 0.999);
        }
    }

    #[test]
    fn hubcap_is_a_dome_over_its_base() {
        let mesh = hubcap(0.04, 0.03, 16, 6);
        assert_well_formed(&mesh);
        let top = mesh.vertices.iter().map(|v| v.position[2]).fold(f32::MIN, f32::max);
        assert_close(top, 0.07, 1e-6);
        assert!(mesh.vertices.iter().all(|v| v.position[2] >= 0.03 - 1e-6));
    }

    #[test]
    fn frisbee_spans_from_lip_to_back() {
        let mesh = frisbee(1.3, 0.3, 0.04, 48, 12);
        assert_well_formed(&mesh);
        let max_r = mesh
            .vertices
            .iter()
            .map(|v| v.position[0].hypot(v.position[1]))
            .fold(0.0, f32::max);
        let min_z = mesh.vertices.iter().map(|v| v.position[2]).fold(f32::MAX, f32::min);
        assert_close(max_r, 1.34, 1e-4);
        assert_close(min_z, -0.3, 1e-5);
    }

    #[test]
    fn frisbee_back_faces_away_from_the_dial() {
        let mesh = frisbee(1.3, 0.3, 0.04, 24, 8);
        let centre = mesh
            .vertices
            .iter()
            .find(|v| v.position[0].abs() < 1e-6 && v.position[1].abs() < 1e-6)
            .map(|v| v.normal());
        assert!(centre.is_some_and(|n| n.z < -0.99));
    }

    #[test]
    fn polyline_normals_fall_back_for_repeated_points() {
        let points = ProfilePoint::from_polyline(&[(0.5, 0.0), (0.5, 0.0)]);
        assert_eq!(points[0].normal, Vector2::y());
    }
}
