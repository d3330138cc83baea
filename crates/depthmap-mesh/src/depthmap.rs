//! The depth map grid and its construction from a projected point cloud.
//!
//! A [`Depthmap`] is an arena of vertices addressed through a fixed
//! `stride * height` grid. Each cell either holds a vertex id or is empty.
//! Vertices are only allocated during construction; later operations move
//! them or rewire which cells reference them.

use nalgebra::{Matrix4, Point3};
use tracing::{debug, info, trace};

use crate::camera::{CameraModel, ImageFrame, sensor_to_world_point};
use crate::color::ColorCodec;
use crate::error::{DepthmapError, DepthmapResult};
use crate::merge::QuadRect;
use crate::params::{CollisionPolicy, DepthmapParams};
use crate::tracing_ext::{OperationTimer, log_depthmap_stats};
use crate::{Mesh, Vertex};

/// Raw sample stored in cells that never received a point.
pub const EMPTY_SAMPLE: Point3<f64> = Point3::new(-1.0, -1.0, -1.0);

/// Counters collected while projecting a point cloud.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectionStats {
    /// Points offered to the projector.
    pub input_points: usize,
    /// Points that allocated a vertex.
    pub projected: usize,
    /// Points that fell outside the frame or the grid.
    pub out_of_bounds: usize,
    /// Cell entries replaced by a later point.
    pub overwritten: usize,
    /// Points dropped because the collision policy kept the occupant.
    pub rejected: usize,
}

/// Grid-anchored vertex arena built from one scan frame.
#[derive(Debug, Clone)]
pub struct Depthmap {
    pub(crate) stride: usize,
    pub(crate) height: usize,
    pub(crate) map: Vec<Option<u32>>,
    pub(crate) vecmap: Vec<Point3<f64>>,
    pub(crate) vertices: Vec<Point3<f64>>,
    pub(crate) depth: Vec<f64>,
    pub(crate) colors: Vec<u32>,
    pub(crate) indices: Vec<u32>,
    pub(crate) rects: Vec<QuadRect>,
    pub(crate) last_margin: usize,
    pub(crate) matrix: Matrix4<f64>,
    pub(crate) tolerance: f64,
    pub(crate) stats: ProjectionStats,
}

impl Depthmap {
    /// Allocate an empty grid.
    fn empty(
        stride: usize,
        height: usize,
        matrix: Matrix4<f64>,
        tolerance: f64,
        capacity: usize,
    ) -> Self {
        let cells = stride * height;
        Self {
            stride,
            height,
            map: vec![None; cells],
            vecmap: vec![EMPTY_SAMPLE; cells],
            vertices: Vec::with_capacity(capacity),
            depth: Vec::with_capacity(capacity),
            colors: Vec::with_capacity(capacity),
            indices: Vec::new(),
            rects: Vec::new(),
            last_margin: 0,
            matrix,
            tolerance,
            stats: ProjectionStats::default(),
        }
    }

    /// Project a sensor-space point cloud onto the frame's downscaled grid.
    ///
    /// Each point is moved to world space, projected through the camera and
    /// kept if its pixel lies on the frame. The pixel's color is encoded with
    /// `codec`, the world position becomes a vertex, and the sensor-space Z
    /// becomes the vertex depth. No triangles are produced.
    ///
    /// # Errors
    ///
    /// Returns an error if `params` is invalid or the frame is smaller than one
    /// grid cell.
    pub fn build<C: ColorCodec>(
        frame: &ImageFrame<'_>,
        points: &[Point3<f64>],
        camera: &CameraModel,
        codec: &C,
        params: &DepthmapParams,
    ) -> DepthmapResult<Self> {
        params.validate()?;
        let _timer = OperationTimer::new("depthmap_build");

        let (width, height) = (frame.width(), frame.height());
        let scale = params.map_scale as usize;
        let stride = width as usize / scale;
        let grid_height = height as usize / scale;
        if stride == 0 || grid_height == 0 {
            return Err(DepthmapError::EmptyGrid {
                width,
                height,
                map_scale: params.map_scale,
            });
        }

        let mut depthmap = Self::empty(
            stride,
            grid_height,
            camera.sensor_to_world,
            params.surface_tolerance,
            points.len(),
        );
        let mut stats = ProjectionStats {
            input_points: points.len(),
            ..ProjectionStats::default()
        };

        for point in points {
            let world = camera.sensor_to_world_point(point);
            let (px, py) = camera.project_to_pixel(&world, width, height);
            if !px.is_finite() || !py.is_finite() {
                stats.out_of_bounds += 1;
                continue;
            }

            // Truncates toward zero, so (-1, 0) lands on pixel 0.
            let (x, y) = (px as i64, py as i64);
            if !frame.contains(x, y) {
                stats.out_of_bounds += 1;
                continue;
            }
            let (x, y) = (x as u32, y as u32);

            let (gx, gy) = (x as usize / scale, y as usize / scale);
            if gx >= stride || gy >= grid_height {
                stats.out_of_bounds += 1;
                continue;
            }
            let cell = gy * stride + gx;

            if let Some(occupant) = depthmap.map[cell] {
                let keep_new = match params.collision {
                    CollisionPolicy::LastWins => true,
                    CollisionPolicy::FirstWins => false,
                    CollisionPolicy::Nearest => {
                        point.z.abs() < depthmap.depth[occupant as usize].abs()
                    }
                };
                if !keep_new {
                    stats.rejected += 1;
                    continue;
                }
                trace!(x = gx, y = gy, occupant, "Cell overwritten");
                stats.overwritten += 1;
            }

            let id = depthmap.vertices.len() as u32;
            depthmap.colors.push(codec.encode(frame.rgb_at(x, y)));
            depthmap.map[cell] = Some(id);
            depthmap.vecmap[cell] = *point;
            depthmap.depth.push(point.z);
            depthmap.vertices.push(world);
            stats.projected += 1;
        }

        depthmap.stats = stats;
        info!(
            stride,
            height = grid_height,
            input_points = stats.input_points,
            projected = stats.projected,
            out_of_bounds = stats.out_of_bounds,
            overwritten = stats.overwritten,
            rejected = stats.rejected,
            "Projected point cloud onto depth map"
        );
        log_depthmap_stats(&depthmap, "after projection");

        Ok(depthmap)
    }

    /// Build a depth map from samples that are already organized in a grid.
    ///
    /// `samples` holds one optional sensor-space point per cell in row-major
    /// order. Vertex ids are assigned in that order. There is no color frame,
    /// so every vertex gets color code 0.
    ///
    /// # Errors
    ///
    /// Returns an error if `params` is invalid, the grid is empty, or the sample
    /// count differs from `stride * height`.
    pub fn from_grid(
        stride: usize,
        height: usize,
        samples: &[Option<Point3<f64>>],
        sensor_to_world: Matrix4<f64>,
        params: &DepthmapParams,
    ) -> DepthmapResult<Self> {
        params.validate()?;
        if stride == 0 || height == 0 {
            return Err(DepthmapError::GridSizeMismatch {
                stride,
                height,
                expected: 0,
                actual: samples.len(),
            });
        }
        if samples.len() != stride * height {
            return Err(DepthmapError::GridSizeMismatch {
                stride,
                height,
                expected: stride * height,
                actual: samples.len(),
            });
        }

        let mut depthmap = Self::empty(
            stride,
            height,
            sensor_to_world,
            params.surface_tolerance,
            samples.len(),
        );
        for (cell, sample) in samples.iter().enumerate() {
            let Some(point) = sample else { continue };
            depthmap.map[cell] = Some(depthmap.vertices.len() as u32);
            depthmap.vecmap[cell] = *point;
            depthmap.depth.push(point.z);
            depthmap.vertices.push(sensor_to_world_point(&sensor_to_world, point));
            depthmap.colors.push(0);
        }

        let projected = depthmap.vertices.len();
        depthmap.stats = ProjectionStats {
            input_points: projected,
            projected,
            ..ProjectionStats::default()
        };
        debug!(stride, height, vertices = projected, "Built depth map from grid samples");

        Ok(depthmap)
    }

    /// Triangulate with `params.margin`, then smooth `params.smooth_iterations` times.
    pub fn process(&mut self, params: &DepthmapParams) {
        self.make_surface(params.margin);
        self.smooth_surface(params.smooth_iterations);
    }

    /// Grid width in cells.
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Grid height in cells.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Vertex id stored at `(x, y)`, or `None` if the cell is empty or off the grid.
    #[inline]
    pub fn cell(&self, x: usize, y: usize) -> Option<u32> {
        if x >= self.stride || y >= self.height {
            return None;
        }
        self.map[y * self.stride + x]
    }

    /// Sensor-space sample stored at `(x, y)`.
    ///
    /// Cells that never received a point hold [`EMPTY_SAMPLE`]. Cells cleared
    /// by a merge keep their last sample.
    pub fn raw_point(&self, x: usize, y: usize) -> Option<Point3<f64>> {
        if x >= self.stride || y >= self.height {
            return None;
        }
        Some(self.vecmap[y * self.stride + x])
    }

    /// World-space vertex positions.
    #[inline]
    pub fn vertices(&self) -> &[Point3<f64>] {
        &self.vertices
    }

    /// Per-vertex sensor-space depth used for the discontinuity test.
    #[inline]
    pub fn depth(&self) -> &[f64] {
        &self.depth
    }

    /// Per-vertex encoded colors.
    #[inline]
    pub fn colors(&self) -> &[u32] {
        &self.colors
    }

    /// Flattened triangle list, three vertex ids per triangle.
    #[inline]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Triangles as vertex id triplets.
    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }

    /// Number of triangles in the current triangulation.
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Merged quads, in merge order.
    #[inline]
    pub fn rects(&self) -> &[QuadRect] {
        &self.rects
    }

    /// Margin used by the last surface rebuild.
    #[inline]
    pub fn last_margin(&self) -> usize {
        self.last_margin
    }

    /// Sensor-to-world transform of the frame.
    #[inline]
    pub fn sensor_to_world(&self) -> &Matrix4<f64> {
        &self.matrix
    }

    /// Depth discontinuity tolerance.
    #[inline]
    pub fn surface_tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Projection counters from construction.
    #[inline]
    pub fn projection_stats(&self) -> ProjectionStats {
        self.stats
    }

    /// Number of cells holding a vertex.
    pub fn occupied_cells(&self) -> usize {
        self.map.iter().filter(|c| c.is_some()).count()
    }

    /// Number of distinct vertices referenced by the grid.
    pub fn referenced_vertex_count(&self) -> usize {
        let mut seen = vec![false; self.vertices.len()];
        let mut count = 0;
        for id in self.map.iter().flatten() {
            let slot = &mut seen[*id as usize];
            if !*slot {
                *slot = true;
                count += 1;
            }
        }
        count
    }

    /// The 2x2 window whose bottom-right cell is `(x, y)`, as
    /// `[top-left, top-right, bottom-left, bottom-right]`.
    ///
    /// Requires `1 <= x < stride` and `1 <= y < height`.
    #[inline]
    pub(crate) fn window(&self, x: usize, y: usize) -> [Option<u32>; 4] {
        let s = self.stride;
        [
            self.map[(y - 1) * s + x - 1],
            self.map[(y - 1) * s + x],
            self.map[y * s + x - 1],
            self.map[y * s + x],
        ]
    }

    /// Export the triangulated vertices as a compact mesh.
    ///
    /// Only vertices referenced by a triangle are kept, renumbered in order of
    /// first use. Colors are decoded with `codec`.
    pub fn to_mesh<C: ColorCodec>(&self, codec: &C) -> Mesh {
        let mut remap: Vec<Option<u32>> = vec![None; self.vertices.len()];
        let mut mesh = Mesh::with_capacity(self.vertices.len(), self.triangle_count());

        for triangle in self.triangles() {
            let mut face = [0u32; 3];
            for (slot, id) in face.iter_mut().zip(triangle) {
                let idx = id as usize;
                *slot = *remap[idx].get_or_insert_with(|| {
                    let new_id = mesh.vertices.len() as u32;
                    mesh.vertices.push(Vertex::with_color(
                        self.vertices[idx],
                        codec.decode(self.colors[idx]),
                    ));
                    new_id
                });
            }
            mesh.faces.push(face);
        }

        debug!(
            vertices = mesh.vertex_count(),
            faces = mesh.face_count(),
            "Exported depth map mesh"
        );
        mesh
    }
}

/// Run the whole single-frame pipeline: project, triangulate, smooth, export.
pub fn depthmap_to_mesh<C: ColorCodec>(
    frame: &ImageFrame<'_>,
    points: &[Point3<f64>],
    camera: &CameraModel,
    codec: &C,
    params: &DepthmapParams,
) -> DepthmapResult<Mesh> {
    let mut depthmap = Depthmap::build(frame, points, camera, codec, params)?;
    depthmap.process(params);
    Ok(depthmap.to_mesh(codec))
}
