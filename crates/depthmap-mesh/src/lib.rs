//! Depth map meshing for single-frame colored point clouds.
//!
//! A [`Depthmap`] projects the points of one scan frame onto the frame's
//! camera image, downscaled into a grid. Each grid cell holds at most one
//! vertex. From there the grid can be:
//!
//! - **Triangulated**: two triangles per 2x2 window, skipping depth
//!   discontinuities ([`Depthmap::make_surface`])
//! - **Merged**: flat rectangular regions collapse into a single quad
//!   ([`Depthmap::join`])
//! - **Smoothed**: depth is averaged over continuous neighboring windows
//!   ([`Depthmap::smooth_surface`])
//! - **Exported**: referenced vertices and triangles become a [`Mesh`]
//!
//! # Coordinate Spaces
//!
//! Input points are in **sensor space**. The camera's `sensor_to_world`
//! matrix places them in world space, where vertices live. Projection then
//! uses `world_to_uv` and the pinhole [`Intrinsics`]. The discontinuity test
//! always runs on sensor-space Z.
//!
//! # Quick Start
//!
//! ```
//! use depthmap_mesh::{
//!     CameraModel, Depthmap, DepthmapParams, ImageFrame, Intrinsics, PackedRgb,
//! };
//! use nalgebra::{Matrix4, Point3};
//!
//! // A 4x4 RGBA frame and one point per pixel, one unit in front of the sensor.
//! let rgba = vec![200u8; 4 * 4 * 4];
//! let frame = ImageFrame::new(4, 4, &rgba)?;
//! let camera = CameraModel::new(
//!     Matrix4::identity(),
//!     Matrix4::identity(),
//!     Intrinsics::new(1.0, 1.0, 0.5, 0.5),
//! );
//! let points: Vec<_> = (0..4)
//!     .flat_map(|y| (0..4).map(move |x| Point3::new(x as f64, y as f64, 1.0)))
//!     .collect();
//!
//! let params = DepthmapParams::default();
//! let mut depthmap = Depthmap::build(&frame, &points, &camera, &PackedRgb, &params)?;
//! depthmap.make_surface(0);
//! assert_eq!(depthmap.triangle_count(), 18);
//!
//! let mesh = depthmap.to_mesh(&PackedRgb);
//! assert_eq!(mesh.vertex_count(), 16);
//! # Ok::<(), depthmap_mesh::DepthmapError>(())
//! ```
//!
//! # Error Handling
//!
//! Construction returns [`DepthmapResult`]. Grid operations do not fail:
//! [`Depthmap::join`] reports rejection as `false`, and
//! [`Depthmap::try_join`] says why.
//!
//! ```
//! use depthmap_mesh::{Depthmap, DepthmapParams, ErrorCode};
//! use nalgebra::{Matrix4, Point3};
//!
//! let samples = vec![Some(Point3::new(0.0, 0.0, 1.0)), None, None, None];
//! let mut depthmap =
//!     Depthmap::from_grid(2, 2, &samples, Matrix4::identity(), &DepthmapParams::default())?;
//!
//! match depthmap.try_join(0, 0, 1, 1) {
//!     Ok(report) => println!("merged into {:?}", report.corners),
//!     Err(e) if e.code() == ErrorCode::EmptyCorner => println!("corner missing: {:?}", e.cell()),
//!     Err(e) => println!("other: {e}"),
//! }
//! # Ok::<(), depthmap_mesh::DepthmapError>(())
//! ```

mod camera;
mod color;
mod depthmap;
mod error;
mod merge;
mod params;
mod smooth;
mod surface;
pub mod tracing_ext;
mod types;

pub use camera::{CameraModel, ImageFrame, Intrinsics, sensor_to_world_point};
pub use color::{ColorCodec, PackedRgb};
pub use depthmap::{Depthmap, EMPTY_SAMPLE, ProjectionStats, depthmap_to_mesh};
pub use error::{DepthmapError, DepthmapResult, ErrorCode};
pub use merge::{JoinReport, QuadRect};
pub use params::{CollisionPolicy, DEFAULT_SURFACE_TOLERANCE, DepthmapParams};
pub use types::{Mesh, Vertex, VertexColor};
