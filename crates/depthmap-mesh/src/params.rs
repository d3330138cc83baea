//! Depth map construction and processing parameters.

use crate::error::{DepthmapError, DepthmapResult};

/// Default fraction of the local mean depth two samples may differ by and
/// still be triangulated together.
pub const DEFAULT_SURFACE_TOLERANCE: f64 = 0.075;

/// What to do when several points land in the same grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollisionPolicy {
    /// The later point replaces the cell entry. Every in-bounds point still
    /// allocates a vertex, so replaced vertices stay in the arrays
    /// unreferenced.
    #[default]
    LastWins,

    /// The first point keeps the cell; later points are dropped without
    /// allocating a vertex.
    FirstWins,

    /// The point with the smallest absolute sensor-space Z keeps the cell.
    /// Losing newcomers are not allocated; displaced occupants stay
    /// allocated but unreferenced.
    Nearest,
}

/// Parameters for building and processing a depth map.
#[derive(Debug, Clone, PartialEq)]
pub struct DepthmapParams {
    /// Integer downscale from image pixels to grid cells.
    pub map_scale: u32,

    /// Depth discontinuity tolerance, as a fraction of the mean depth of the
    /// three samples tested.
    pub surface_tolerance: f64,

    /// Cell collision policy during projection.
    pub collision: CollisionPolicy,

    /// Border width excluded from triangulation.
    pub margin: usize,

    /// Smoothing iterations applied by [`Depthmap::process`](crate::Depthmap::process).
    pub smooth_iterations: usize,
}

impl Default for DepthmapParams {
    fn default() -> Self {
        Self {
            map_scale: 1,
            surface_tolerance: DEFAULT_SURFACE_TOLERANCE,
            collision: CollisionPolicy::LastWins,
            margin: 0,
            smooth_iterations: 0,
        }
    }
}

impl DepthmapParams {
    /// Coarse grid for quick previews.
    pub fn preview() -> Self {
        Self {
            map_scale: 4,
            smooth_iterations: 1,
            ..Self::default()
        }
    }

    /// One cell per pixel, lightly smoothed, with the outermost ring skipped.
    pub fn full_resolution() -> Self {
        Self {
            map_scale: 1,
            margin: 1,
            smooth_iterations: 2,
            ..Self::default()
        }
    }

    /// Set the downscale factor.
    pub fn with_map_scale(mut self, map_scale: u32) -> Self {
        self.map_scale = map_scale;
        self
    }

    /// Set the surface tolerance.
    pub fn with_surface_tolerance(mut self, tolerance: f64) -> Self {
        self.surface_tolerance = tolerance;
        self
    }

    /// Set the collision policy.
    pub fn with_collision(mut self, collision: CollisionPolicy) -> Self {
        self.collision = collision;
        self
    }

    /// Set the triangulation margin.
    pub fn with_margin(mut self, margin: usize) -> Self {
        self.margin = margin;
        self
    }

    /// Set the smoothing iteration count.
    pub fn with_smooth_iterations(mut self, iterations: usize) -> Self {
        self.smooth_iterations = iterations;
        self
    }

    /// Check that the parameters can build a depth map.
    pub fn validate(&self) -> DepthmapResult<()> {
        if self.map_scale == 0 {
            return Err(DepthmapError::InvalidMapScale);
        }
        if !self.surface_tolerance.is_finite() || self.surface_tolerance <= 0.0 {
            return Err(DepthmapError::InvalidTolerance {
                value: self.surface_tolerance,
            });
        }
        Ok(())
    }
}
