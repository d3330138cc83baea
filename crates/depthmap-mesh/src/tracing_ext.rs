//! Tracing helpers for depth map operations.
//!
//! Operations emit structured events through `tracing`. Install any
//! subscriber to see them:
//!
//! ```rust,ignore
//! use tracing_subscriber::{fmt, prelude::*, EnvFilter};
//!
//! tracing_subscriber::registry()
//!     .with(fmt::layer())
//!     .with(EnvFilter::from_default_env())
//!     .init();
//!
//! // RUST_LOG=depthmap_mesh=debug for per-pass output
//! ```
//!
//! # Targets
//!
//! - `depthmap_mesh::timing`: operation start and duration
//! - `depthmap_mesh::state`: grid occupancy snapshots
//!
//! Everything else logs under the module path.

use std::time::Instant;
use tracing::span::EnteredSpan;
use tracing::{debug, info};

use crate::Depthmap;

/// Logs the duration of an operation when dropped.
///
/// The operation's span stays entered for the timer's lifetime, so events
/// logged in between nest under it.
///
/// ```rust,ignore
/// let _timer = OperationTimer::with_context("make_surface", stride, height);
/// // ... work ...
/// ```
pub struct OperationTimer {
    name: &'static str,
    start: Instant,
    _span: EnteredSpan,
}

impl OperationTimer {
    /// Start timing `name`.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!("depthmap_operation", operation = name).entered();
        debug!(target: "depthmap_mesh::timing", operation = name, "Starting operation");
        Self {
            name,
            start: Instant::now(),
            _span: span,
        }
    }

    /// Start timing `name` over a grid (or region) of `width` by `height` cells.
    pub fn with_context(name: &'static str, width: usize, height: usize) -> Self {
        let span = tracing::info_span!(
            "depthmap_operation",
            operation = name,
            width = width,
            height = height
        )
        .entered();
        debug!(
            target: "depthmap_mesh::timing",
            operation = name,
            width = width,
            height = height,
            "Starting operation"
        );
        Self {
            name,
            start: Instant::now(),
            _span: span,
        }
    }

    /// Milliseconds since the timer started.
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for OperationTimer {
    fn drop(&mut self) {
        let elapsed_ms = self.elapsed_ms();
        info!(
            target: "depthmap_mesh::timing",
            operation = self.name,
            elapsed_ms = format!("{:.2}", elapsed_ms),
            "Operation completed"
        );
    }
}

/// Log grid occupancy and triangulation size at debug level.
pub fn log_depthmap_stats(depthmap: &Depthmap, context: &str) {
    let cells = depthmap.stride() * depthmap.height();
    let occupied = depthmap.occupied_cells();
    let fill = if cells > 0 {
        occupied as f64 / cells as f64 * 100.0
    } else {
        0.0
    };

    debug!(
        target: "depthmap_mesh::state",
        context = context,
        stride = depthmap.stride(),
        height = depthmap.height(),
        occupied = occupied,
        fill_percent = format!("{:.1}", fill),
        vertices = depthmap.vertices().len(),
        referenced = depthmap.referenced_vertex_count(),
        triangles = depthmap.triangle_count(),
        quads = depthmap.rects().len(),
        "Depth map state"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DepthmapParams;
    use nalgebra::{Matrix4, Point3};

    #[test]
    fn test_operation_timer() {
        let timer = OperationTimer::with_context("test_operation", 4, 4);
        std::thread::sleep(std::time::Duration::from_millis(10));
        assert!(timer.elapsed_ms() >= 10.0);
    }

    #[test]
    fn test_operation_timer_enters_span() {
        let subscriber = tracing_subscriber::registry();
        tracing::subscriber::with_default(subscriber, || {
            let timer = OperationTimer::new("nested");
            let current = tracing::Span::current();
            assert_eq!(current.metadata().map(|m| m.name()), Some("depthmap_operation"));
            drop(timer);
            assert!(tracing::Span::current().is_none());
        });
    }

    #[test]
    fn test_log_depthmap_stats() {
        let samples = vec![Some(Point3::new(0.0, 0.0, 1.0)), None];
        let params = DepthmapParams::default();
        let dm = Depthmap::from_grid(2, 1, &samples, Matrix4::identity(), &params).unwrap();
        // Only checks that logging does not panic.
        log_depthmap_stats(&dm, "test");
    }
}
