//! Camera pose, intrinsics, and the borrowed color frame.
//!
//! Both matrix applications divide by the *absolute value* of the homogeneous
//! component, so points with a negative `w` (or `z·w` for the UV transform)
//! keep their sign instead of being mirrored.

use nalgebra::{Matrix4, Point3, Vector4};

use crate::VertexColor;
use crate::error::{DepthmapError, DepthmapResult};

/// Pinhole intrinsics in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intrinsics {
    /// Focal length in pixels (x direction).
    pub fx: f64,
    /// Focal length in pixels (y direction).
    pub fy: f64,
    /// Principal point x-coordinate in pixels.
    pub cx: f64,
    /// Principal point y-coordinate in pixels.
    pub cy: f64,
}

impl Intrinsics {
    /// Create intrinsics from focal lengths and principal point.
    pub const fn new(fx: f64, fy: f64, cx: f64, cy: f64) -> Self {
        Self { fx, fy, cx, cy }
    }
}

/// Calibration and pose of the camera that captured one scan frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraModel {
    /// Sensor space to world space.
    pub sensor_to_world: Matrix4<f64>,
    /// World space to normalized camera UV space.
    pub world_to_uv: Matrix4<f64>,
    /// Pixel intrinsics.
    pub intrinsics: Intrinsics,
}

impl CameraModel {
    /// Create a camera model.
    pub fn new(
        sensor_to_world: Matrix4<f64>,
        world_to_uv: Matrix4<f64>,
        intrinsics: Intrinsics,
    ) -> Self {
        Self {
            sensor_to_world,
            world_to_uv,
            intrinsics,
        }
    }

    /// Transform a sensor-space sample to world space.
    #[inline]
    pub fn sensor_to_world_point(&self, point: &Point3<f64>) -> Point3<f64> {
        sensor_to_world_point(&self.sensor_to_world, point)
    }

    /// Project a world-space point to fractional pixel coordinates of a
    /// `width`x`height` frame.
    ///
    /// Non-finite results are returned as-is; callers decide whether they land
    /// on the image.
    pub fn project_to_pixel(&self, world: &Point3<f64>, width: u32, height: u32) -> (f64, f64) {
        let (w, h) = (f64::from(width), f64::from(height));
        let t = self.world_to_uv * world.to_homogeneous();
        let divisor = (t.z * t.w).abs();

        let mut u = t.x / divisor;
        let mut v = t.y / divisor;
        u *= self.intrinsics.fx / w;
        v *= self.intrinsics.fy / h;
        u += self.intrinsics.cx / w;
        v += self.intrinsics.cy / h;

        (u * w, v * h)
    }
}

/// Apply a sensor-to-world matrix with an absolute homogeneous divide.
pub fn sensor_to_world_point(matrix: &Matrix4<f64>, point: &Point3<f64>) -> Point3<f64> {
    let w: Vector4<f64> = matrix * point.to_homogeneous();
    let scale = w.w.abs();
    Point3::new(w.x / scale, w.y / scale, w.z / scale)
}

/// Borrowed RGBA8 frame.
///
/// Only the first three bytes of each 4-byte pixel are read.
#[derive(Debug, Clone, Copy)]
pub struct ImageFrame<'a> {
    width: u32,
    height: u32,
    data: &'a [u8],
}

impl<'a> ImageFrame<'a> {
    /// Wrap a decoded RGBA buffer.
    pub fn new(width: u32, height: u32, data: &'a [u8]) -> DepthmapResult<Self> {
        let expected = width as usize * height as usize * 4;
        if data.len() < expected {
            return Err(DepthmapError::image_buffer_too_small(width, height, data.len()));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Frame width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Frame height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Whether `(x, y)` addresses a pixel of this frame.
    #[inline]
    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < i64::from(self.width) && y < i64::from(self.height)
    }

    /// Color of the pixel at `(x, y)`. Panics if out of range.
    #[inline]
    pub fn rgb_at(&self, x: u32, y: u32) -> VertexColor {
        let index = (y as usize * self.width as usize + x as usize) * 4;
        VertexColor::new(self.data[index], self.data[index + 1], self.data[index + 2])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_homogeneous_divide() {
        let mut m = Matrix4::identity();
        m[(3, 3)] = -2.0;
        let p = sensor_to_world_point(&m, &Point3::new(2.0, -4.0, 6.0));
        // Signs survive the divide.
        assert_eq!(p, Point3::new(1.0, -2.0, 3.0));
    }

    #[test]
    fn test_project_identity_camera() {
        // UV transform maps (x, y, z) to (x, y, 1, 1), intrinsics are pixel units.
        let mut uv = Matrix4::zeros();
        uv[(0, 0)] = 1.0;
        uv[(1, 1)] = 1.0;
        uv[(2, 3)] = 1.0;
        uv[(3, 3)] = 1.0;
        let camera =
            CameraModel::new(Matrix4::identity(), uv, Intrinsics::new(1.0, 1.0, 0.5, 0.5));

        let (px, py) = camera.project_to_pixel(&Point3::new(2.0, 3.0, 1.0), 4, 4);
        assert!((px - 2.5).abs() < 1e-12);
        assert!((py - 3.5).abs() < 1e-12);
    }

    #[test]
    fn test_negative_depth_is_not_mirrored() {
        let camera = CameraModel::new(
            Matrix4::identity(),
            Matrix4::identity(),
            Intrinsics::new(1.0, 1.0, 0.0, 0.0),
        );
        let (px, py) = camera.project_to_pixel(&Point3::new(2.0, 3.0, -1.0), 8, 8);
        assert!((px - 2.0).abs() < 1e-12);
        assert!((py - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_frame_rejects_short_buffer() {
        let data = vec![0u8; 15];
        let err = ImageFrame::new(2, 2, &data).unwrap_err();
        assert_eq!(err.code(), crate::ErrorCode::ImageBufferTooSmall);
    }

    #[test]
    fn test_frame_sampling() {
        let data: Vec<u8> = (0..16).collect();
        let frame = ImageFrame::new(2, 2, &data).unwrap();
        assert_eq!(frame.rgb_at(1, 1), VertexColor::new(12, 13, 14));
        assert!(frame.contains(1, 0));
        assert!(!frame.contains(2, 0));
        assert!(!frame.contains(-1, 0));
    }
}
