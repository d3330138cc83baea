//! Adaptive quad merging.
//!
//! A merge collapses a rectangular grid region onto its four corner vertices.
//! The region's inner cells are emptied and its border cells are rewired to
//! the nearest corner by quadrant, so the quad still shares edges with the
//! surrounding triangulation. No vertices are created.

use tracing::{debug, info, warn};

use crate::Depthmap;
use crate::error::{DepthmapError, DepthmapResult};
use crate::tracing_ext::OperationTimer;

/// Corner vertex ids of a merged quad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QuadRect {
    /// Top-left corner.
    pub a: u32,
    /// Top-right corner.
    pub b: u32,
    /// Bottom-left corner.
    pub c: u32,
    /// Bottom-right corner.
    pub d: u32,
}

impl QuadRect {
    /// The two triangles emitted for this quad, in surface winding.
    pub fn triangles(&self) -> [[u32; 3]; 2] {
        [[self.c, self.b, self.a], [self.b, self.c, self.d]]
    }
}

/// Outcome of an applied merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinReport {
    /// Corners of the new quad.
    pub corners: QuadRect,
    /// Index entries before the rebuild.
    pub removed_entries: usize,
    /// Index entries after the rebuild.
    pub emitted_entries: usize,
    /// Net entry change expected for a region of this size, `6·w·h − 24`.
    pub expected_delta: i64,
    /// Whether the observed change matched `expected_delta`.
    pub consistent: bool,
}

impl JoinReport {
    /// Observed net change in index entries.
    pub fn actual_delta(&self) -> i64 {
        self.removed_entries as i64 - self.emitted_entries as i64
    }
}

impl Depthmap {
    /// Merge the region `(x1, y1)`-`(x2, y2)` into one quad.
    ///
    /// Returns `true` only if the merge was applied *and* the triangle count
    /// changed by exactly the amount expected for the region size. A `false`
    /// after the preconditions held means the rebuilt triangulation around the
    /// region is not the expected one; the merge is still applied in that case.
    /// Use [`try_join`](Self::try_join) to tell the two apart.
    pub fn join(&mut self, x1: usize, y1: usize, x2: usize, y2: usize) -> bool {
        match self.try_join(x1, y1, x2, y2) {
            Ok(report) => report.consistent,
            Err(err) => {
                debug!(x1, y1, x2, y2, code = %err.code(), "Merge rejected: {}", err);
                false
            }
        }
    }

    /// Merge the region `(x1, y1)`-`(x2, y2)` into one quad and rebuild the
    /// surface with the last margin.
    ///
    /// # Errors
    ///
    /// The grid is left untouched if the region leaves the grid, its corners
    /// are not ordered, or any cell inside it (corners included) is empty.
    pub fn try_join(
        &mut self,
        x1: usize,
        y1: usize,
        x2: usize,
        y2: usize,
    ) -> DepthmapResult<JoinReport> {
        if x2 >= self.stride || y2 >= self.height {
            return Err(DepthmapError::RegionOutOfBounds {
                x1,
                y1,
                x2,
                y2,
                stride: self.stride,
                height: self.height,
            });
        }
        if x1 > x2 || y1 > y2 {
            return Err(DepthmapError::InvalidRegion { x1, y1, x2, y2 });
        }

        let corner =
            |x: usize, y: usize| self.cell(x, y).ok_or_else(|| DepthmapError::empty_corner(x, y));
        let corners = QuadRect {
            a: corner(x1, y1)?,
            b: corner(x2, y1)?,
            c: corner(x1, y2)?,
            d: corner(x2, y2)?,
        };
        for x in x1..=x2 {
            for y in y1..=y2 {
                if self.map[y * self.stride + x].is_none() {
                    return Err(DepthmapError::empty_interior(x, y));
                }
            }
        }

        let _timer = OperationTimer::with_context("join", x2 - x1 + 1, y2 - y1 + 1);
        let stride = self.stride;
        for y in y1..=y2 {
            self.map[y * stride + x1..=y * stride + x2].fill(None);
        }

        let QuadRect { a, b, c, d } = corners;
        let xm = (x1 + x2) / 2;
        for x in x1..=x2 {
            self.map[y1 * stride + x] = Some(if x < xm { a } else { b });
            self.map[y2 * stride + x] = Some(if x < xm { c } else { d });
        }
        let ym = (y1 + y2) / 2;
        for y in y1..=y2 {
            self.map[y * stride + x1] = Some(if y < ym { a } else { c });
            self.map[y * stride + x2] = Some(if y < ym { b } else { d });
        }

        let removed_entries = self.indices.len();
        self.rects.push(corners);
        self.make_surface(self.last_margin);
        let emitted_entries = self.indices.len();

        let cells = ((x2 - x1 + 1) * (y2 - y1 + 1)) as i64;
        let expected_delta = cells * 6 - 24;
        let report = JoinReport {
            corners,
            removed_entries,
            emitted_entries,
            expected_delta,
            consistent: removed_entries as i64 - emitted_entries as i64 == expected_delta,
        };

        if report.consistent {
            info!(x1, y1, x2, y2, quads = self.rects.len(), "Region merged");
        } else {
            warn!(
                x1,
                y1,
                x2,
                y2,
                expected_delta,
                actual_delta = report.actual_delta(),
                "Merged region changed the triangle count unexpectedly"
            );
        }
        Ok(report)
    }
}
