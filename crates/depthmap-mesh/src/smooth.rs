//! Depth smoothing over validated surface patches.

use tracing::{debug, info};

use crate::Depthmap;
use crate::camera::sensor_to_world_point;
use crate::tracing_ext::OperationTimer;

impl Depthmap {
    /// Average sensor-space depth over neighboring surface windows, then move
    /// every referenced vertex to its smoothed world position.
    ///
    /// Each iteration looks at every interior cell that holds a vertex. Of the
    /// four 2x2 windows containing the cell, only those whose two triangles
    /// both pass [`is_surface`](Self::is_surface) contribute; the cell's new
    /// Z is the mean of all samples in those windows. All new values are
    /// computed before any is written. Cells with no contributing window keep
    /// their Z.
    ///
    /// The validator keeps using the depths recorded at projection, and the
    /// triangulation is not rebuilt.
    pub fn smooth_surface(&mut self, iterations: usize) {
        let _timer = OperationTimer::with_context("smooth_surface", self.stride, self.height);
        let (stride, height) = (self.stride, self.height);
        let mut scratch: Vec<Option<f64>> = vec![None; stride * height];

        for iteration in 0..iterations {
            scratch.fill(None);

            for x in 1..stride.saturating_sub(1) {
                for y in 1..height.saturating_sub(1) {
                    if self.map[y * stride + x].is_none() {
                        continue;
                    }

                    let mut count = 0usize;
                    let mut sum = 0.0;
                    for i in x..=x + 1 {
                        for j in y..=y + 1 {
                            let [a, b, c, d] = self.window(i, j);
                            if !(self.is_surface(a, b, c) && self.is_surface(b, c, d)) {
                                continue;
                            }
                            for k in i - 1..=i {
                                for l in j - 1..=j {
                                    let cell = l * stride + k;
                                    if self.map[cell].is_some() {
                                        sum += self.vecmap[cell].z;
                                        count += 1;
                                    }
                                }
                            }
                        }
                    }
                    if count > 0 {
                        scratch[y * stride + x] = Some(sum / count as f64);
                    }
                }
            }

            let mut updated = 0usize;
            for (sample, value) in self.vecmap.iter_mut().zip(&scratch) {
                if let Some(z) = value {
                    sample.z = *z;
                    updated += 1;
                }
            }
            debug!(iteration, updated, "Smoothing pass applied");
        }

        // x-major, so a vertex shared by several cells takes the last one's sample.
        for x in 0..stride {
            for y in 0..height {
                let cell = y * stride + x;
                if let Some(id) = self.map[cell] {
                    self.vertices[id as usize] =
                        sensor_to_world_point(&self.matrix, &self.vecmap[cell]);
                }
            }
        }

        info!(iterations, "Surface smoothed");
    }
}
