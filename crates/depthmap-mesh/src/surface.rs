//! Surface validation and grid triangulation.

use tracing::{debug, info};

use crate::Depthmap;
use crate::tracing_ext::OperationTimer;

impl Depthmap {
    /// Whether three vertex ids form a continuous surface patch.
    ///
    /// All three must be present and distinct, and every pairwise depth
    /// difference must be strictly below `surface_tolerance` times their mean
    /// depth. The test scales with distance: far samples may differ by more.
    pub fn is_surface(&self, a: Option<u32>, b: Option<u32>, c: Option<u32>) -> bool {
        let (Some(a), Some(b), Some(c)) = (a, b, c) else {
            return false;
        };
        if a == b || b == c || c == a {
            return false;
        }

        let mut d = [
            self.depth[a as usize],
            self.depth[b as usize],
            self.depth[c as usize],
        ];
        // Summed in sorted order so argument order cannot change the limit.
        d.sort_by(f64::total_cmp);
        let limit = self.tolerance * (d[0] + d[1] + d[2]) / 3.0;

        (d[0] - d[1]).abs() < limit && (d[0] - d[2]).abs() < limit && (d[1] - d[2]).abs() < limit
    }

    /// Rebuild the triangle list from the grid and the merged quads.
    ///
    /// Cells within `margin` of the border are never triangulated directly.
    /// Every 2x2 window `a b / c d` contributes `(c, b, a)` and `(b, c, d)` when
    /// they pass [`is_surface`](Self::is_surface). Each merged quad then
    /// contributes the same two triangles from its corners without testing.
    /// The margin is remembered for rebuilds after later merges.
    pub fn make_surface(&mut self, margin: usize) {
        let _timer = OperationTimer::with_context("make_surface", self.stride, self.height);
        self.last_margin = margin;
        self.indices.clear();

        let mut rejected = 0usize;
        let start = margin.saturating_add(1);
        for x in start..self.stride.saturating_sub(margin) {
            for y in start..self.height.saturating_sub(margin) {
                let [a, b, c, d] = self.window(x, y);
                if self.is_surface(a, b, c) {
                    self.indices.extend(ids([c, b, a]));
                } else {
                    rejected += 1;
                }
                if self.is_surface(b, c, d) {
                    self.indices.extend(ids([b, c, d]));
                } else {
                    rejected += 1;
                }
            }
        }
        let grid_triangles = self.indices.len() / 3;

        for rect in &self.rects {
            self.indices.extend([rect.c, rect.b, rect.a, rect.b, rect.c, rect.d]);
        }

        debug!(margin, rejected, "Grid windows scanned");
        info!(
            grid_triangles,
            quad_triangles = self.rects.len() * 2,
            "Surface built"
        );
    }
}

/// Unwrap ids that already passed [`Depthmap::is_surface`].
#[inline]
fn ids(cells: [Option<u32>; 3]) -> impl Iterator<Item = u32> {
    cells.into_iter().flatten()
}

#[cfg(test)]
mod tests {
    use crate::{Depthmap, DepthmapParams};
    use nalgebra::{Matrix4, Point3};

    fn grid(stride: usize, height: usize, depth: impl Fn(usize, usize) -> Option<f64>) -> Depthmap {
        let samples: Vec<_> = (0..stride * height)
            .map(|i| {
                let (x, y) = (i % stride, i / stride);
                depth(x, y).map(|z| Point3::new(x as f64, y as f64, z))
            })
            .collect();
        let params = DepthmapParams::default();
        Depthmap::from_grid(stride, height, &samples, Matrix4::identity(), &params).unwrap()
    }

    #[test]
    fn test_is_surface_rejects_empty_and_duplicates() {
        let dm = grid(3, 1, |_, _| Some(1.0));
        assert!(dm.is_surface(Some(0), Some(1), Some(2)));
        assert!(!dm.is_surface(None, Some(1), Some(2)));
        assert!(!dm.is_surface(Some(0), Some(0), Some(2)));
        assert!(!dm.is_surface(Some(2), Some(1), Some(2)));
    }

    #[test]
    fn test_is_surface_threshold_scales_with_depth() {
        // 0.07 apart: fine around depth 1.0 ...
        let near = grid(3, 1, |x, _| Some([1.0, 1.07, 1.0][x]));
        assert!(near.is_surface(Some(0), Some(1), Some(2)));

        // ... but a discontinuity around depth 0.5.
        let close = grid(3, 1, |x, _| Some([0.5, 0.57, 0.5][x]));
        assert!(!close.is_surface(Some(0), Some(1), Some(2)));

        // 0.5 apart at depth 10 still passes.
        let far = grid(3, 1, |x, _| Some([10.0, 10.5, 10.0][x]));
        assert!(far.is_surface(Some(0), Some(1), Some(2)));
    }

    #[test]
    fn test_make_surface_full_grid() {
        let mut dm = grid(4, 4, |_, _| Some(1.0));
        dm.make_surface(0);
        assert_eq!(dm.triangle_count(), 18);

        // Rebuilding does not accumulate.
        dm.make_surface(0);
        assert_eq!(dm.triangle_count(), 18);
    }

    #[test]
    fn test_make_surface_winding() {
        let mut dm = grid(2, 2, |_, _| Some(1.0));
        dm.make_surface(0);
        let triangles: Vec<_> = dm.triangles().collect();
        assert_eq!(triangles, vec![[2, 1, 0], [1, 2, 3]]);
    }

    #[test]
    fn test_make_surface_margin() {
        let mut dm = grid(6, 6, |_, _| Some(1.0));
        dm.make_surface(1);
        // Windows with bottom-right corner in 2..5 on both axes.
        assert_eq!(dm.triangle_count(), 2 * 3 * 3);
        assert_eq!(dm.last_margin(), 1);

        dm.make_surface(3);
        assert_eq!(dm.triangle_count(), 0);
    }

    #[test]
    fn test_make_surface_huge_margin() {
        let mut dm = grid(4, 4, |_, _| Some(1.0));
        dm.make_surface(usize::MAX);
        assert_eq!(dm.triangle_count(), 0);
        assert_eq!(dm.last_margin(), usize::MAX);
    }

    #[test]
    fn test_make_surface_skips_discontinuity() {
        // Right column is a far background.
        let mut dm = grid(3, 2, |x, _| Some(if x == 2 { 5.0 } else { 1.0 }));
        dm.make_surface(0);
        assert_eq!(dm.triangle_count(), 2);
    }

    #[test]
    fn test_make_surface_skips_holes() {
        let mut dm = grid(3, 3, |x, y| if (x, y) == (1, 1) { None } else { Some(1.0) });
        dm.make_surface(0);
        // Only windows with the hole at `a` or `d` keep a triangle.
        assert_eq!(dm.triangle_count(), 2);
    }
}
