//! Procedural geometry for the clock.
//!
//! Every shape is regenerated from closed-form formulas each frame, so meshes
//! are plain vertex lists without indices. Submodules build the individual
//! parts: the Möbius strip, the hands and the lathed shapes (face disc, rim,
//! hubcap and case).

pub(crate) mod hands;
pub(crate) mod lathe;
pub(crate) mod mobius;

use iced::widget::shader::wgpu;
use nalgebra::Vector3;

/// Triangles smaller than this (twice the area) are treated as degenerate.
const DEGENERATE_AREA: f32 = 1e-9;

/// GPU vertex layout shared by every shape.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub(crate) struct Vertex {
    pub(crate) position: [f32; 3],
    pub(crate) normal: [f32; 3],
    pub(crate) color: [f32; 3],
    pub(crate) tex_coord: [f32; 2],
}

impl Vertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x3,
        2 => Float32x3,
        3 => Float32x2,
    ];

    pub(crate) fn new(position: Vector3<f32>, normal: Vector3<f32>, color: [f32; 3], tex_coord: [f32; 2]) -> Self {
        Self {
            position: position.into(),
            normal: normal.into(),
            color,
            tex_coord,
        }
    }

    /// Buffer layout matching the `@location`s in `shader.wgsl`.
    pub(crate) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }

    pub(crate) fn position(&self) -> Vector3<f32> {
        Vector3::from(self.position)
    }

    #[cfg(test)]
    pub(crate) fn normal(&self) -> Vector3<f32> {
        Vector3::from(self.normal)
    }
}

/// How the vertex list of a [`Mesh`] is assembled into triangles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Topology {
    TriangleList,
    TriangleStrip,
}

impl Topology {
    pub(crate) const ALL: [Topology; 2] = [Topology::TriangleList, Topology::TriangleStrip];
}

impl From<Topology> for wgpu::PrimitiveTopology {
    fn from(topology: Topology) -> Self {
        match topology {
            Topology::TriangleList => wgpu::PrimitiveTopology::TriangleList,
            Topology::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
        }
    }
}

/// Non-indexed mesh produced for a single frame.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Mesh {
    pub(crate) topology: Topology,
    pub(crate) vertices: Vec<Vertex>,
}

impl Mesh {
    pub(crate) fn new(topology: Topology) -> Self {
        Self {
            topology,
            vertices: Vec::new(),
        }
    }

    pub(crate) fn with_capacity(topology: Topology, capacity: usize) -> Self {
        Self {
            topology,
            vertices: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn push(&mut self, vertex: Vertex) {
        self.vertices.push(vertex);
    }

    pub(crate) fn len(&self) -> usize {
        self.vertices.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Paints every vertex with the same colour.
    pub(crate) fn with_color(mut self, color: [f32; 3]) -> Self {
        for vertex in &mut self.vertices {
            vertex.color = color;
        }
        self
    }

    /// Recomputes texture coordinates from vertex positions.
    pub(crate) fn map_tex_coords(mut self, f: impl Fn(Vector3<f32>) -> [f32; 2]) -> Self {
        for vertex in &mut self.vertices {
            vertex.tex_coord = f(vertex.position());
        }
        self
    }

    /// Iterates the non-degenerate triangles described by the topology.
    ///
    /// Strip triangles are returned with the winding the rasterizer uses, i.e.
    /// every odd triangle has its first two vertices swapped, so all triangles
    /// of a consistently wound strip face the same way.
    pub(crate) fn triangles(&self) -> impl Iterator<Item = [Vertex; 3]> + '_ {
        let v = &self.vertices;
        let count = match self.topology {
            Topology::TriangleList => v.len() / 3,
            Topology::TriangleStrip => v.len().saturating_sub(2),
        };
        (0..count)
            .map(move |k| match self.topology {
                Topology::TriangleList => [v[3 * k], v[3 * k + 1], v[3 * k + 2]],
                Topology::TriangleStrip if k % 2 == 0 => [v[k], v[k + 1], v[k + 2]],
                Topology::TriangleStrip => [v[k + 1], v[k], v[k + 2]],
            })
            .filter(|[a, b, c]| face_normal(a, b, c).norm() > DEGENERATE_AREA)
    }
}

/// Unnormalized normal of a counter-clockwise triangle.
pub(crate) fn face_normal(a: &Vertex, b: &Vertex, c: &Vertex) -> Vector3<f32> {
    (b.position() - a.position()).cross(&(c.position() - a.position()))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn assert_close(actual: f32, expected: f32, tolerance: f32) {
        assert!(
            (actual - expected).abs() <= tolerance,
            "expected {expected}, got {actual} (tolerance {tolerance})"
        );
    }

    /// Checks unit normals and that triangle winding agrees with them.
    pub(crate) fn assert_well_formed(mesh: &Mesh) {
        assert!(!mesh.is_empty(), "mesh has no vertices");
        for vertex in &mesh.vertices {
            assert_close(vertex.normal().norm(), 1.0, 1e-4);
        }
        let mut checked = 0;
        for [a, b, c] in mesh.triangles() {
            let facing = face_normal(&a, &b, &c);
            let average = a.normal() + b.normal() + c.normal();
            assert!(
                facing.dot(&average) > 0.0,
                "triangle {:?} {:?} {:?} is wound against its normals",
                a.position,
                b.position,
                c.position
            );
            checked += 1;
        }
        assert!(checked > 0, "mesh has no proper triangles");
    }

    fn vertex(x: f32, y: f32) -> Vertex {
        Vertex::new(Vector3::new(x, y, 0.0), Vector3::z(), [1.0; 3], [0.0; 2])
    }

    #[test]
    fn vertex_layout_matches_struct_size() {
        assert_eq!(std::mem::size_of::<Vertex>(), 44);
        assert_eq!(Vertex::layout().array_stride, 44);
    }

    #[test]
    fn strip_triangles_keep_a_single_winding() {
        let mut mesh = Mesh::new(Topology::TriangleStrip);
        for (x, y) in [(0.0, 1.0), (0.0, 0.0), (1.0, 1.0), (1.0, 0.0), (2.0, 1.0)] {
            mesh.push(vertex(x, y));
        }
        let triangles: Vec<_> = mesh.triangles().collect();
        assert_eq!(triangles.len(), 3);
        assert_well_formed(&mesh);
    }

    #[test]
    fn degenerate_triangles_are_skipped() {
        let mut mesh = Mesh::new(Topology::TriangleList);
        for (x, y) in [(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (0.0, 0.0), (1.0, 0.0), (0.0, 1.0)] {
            mesh.push(vertex(x, y));
        }
        assert_eq!(mesh.triangles().count(), 1);
    }

    #[test]
    fn with_color_and_tex_coords_rewrite_every_vertex() {
        let mut mesh = Mesh::new(Topology::TriangleList);
        mesh.push(vertex(0.5, -0.5));
        let mesh = mesh
            .with_color([0.25, 0.5, 0.75])
            .map_tex_coords(|p| [p.x, p.y]);
        assert_eq!(mesh.vertices[0].color, [0.25, 0.5, 0.75]);
        assert_eq!(mesh.vertices[0].tex_coord, [0.5, -0.5]);
    }
}
