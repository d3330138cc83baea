//! Mesh hand-off types.
//!
//! A triangulated depth map exports to these. Fields are public for writers.

use nalgebra::Point3;

/// RGB color with 8-bit components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VertexColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl VertexColor {
    /// Create a new color from RGB components.
    #[inline]
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// A mesh vertex: world-space position plus its sampled color.
#[derive(Debug, Clone, PartialEq)]
pub struct Vertex {
    /// World-space position.
    pub position: Point3<f64>,

    /// Color sampled from the frame.
    pub color: Option<VertexColor>,
}

impl Vertex {
    /// Create a new vertex with only position set.
    #[inline]
    pub fn new(position: Point3<f64>) -> Self {
        Self {
            position,
            color: None,
        }
    }

    /// Create a vertex with position and color.
    #[inline]
    pub fn with_color(position: Point3<f64>, color: VertexColor) -> Self {
        Self {
            position,
            color: Some(color),
        }
    }
}

/// A triangle mesh with indexed vertices and faces.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    /// Vertex data.
    pub vertices: Vec<Vertex>,

    /// Triangle faces as indices into the vertex array, in the winding the
    /// depth map emits them.
    pub faces: Vec<[u32; 3]>,
}

impl Mesh {
    /// Create a new empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mesh with pre-allocated capacity.
    pub fn with_capacity(vertex_count: usize, face_count: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count),
            faces: Vec::with_capacity(face_count),
        }
    }

    /// Number of vertices in the mesh.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of faces (triangles) in the mesh.
    #[inline]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Compute the axis-aligned bounding box.
    /// Returns (min_corner, max_corner) or None if mesh is empty.
    pub fn bounds(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let first = self.vertices.first()?.position;
        let (mut min, mut max) = (first, first);

        for vertex in &self.vertices[1..] {
            let p = &vertex.position;
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            min.z = min.z.min(p.z);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
            max.z = max.z.max(p.z);
        }

        Some((min, max))
    }
}
