//! Error types for depth map construction and grid operations.
//!
//! Every error carries:
//! - A machine-readable error code
//! - The grid location or input value that triggered it
//! - A help message rendered by miette
//!
//! # Error Codes
//!
//! Each error has a unique code in the format `DEPTH-XXXX`:
//! - `DEPTH-1xxx`: Input errors (image buffer, downscale factor, tolerances)
//! - `DEPTH-2xxx`: Region errors (rejected quad merges)
//!
//! # Example
//!
//! ```
//! use depthmap_mesh::{DepthmapError, ErrorCode};
//!
//! let err = DepthmapError::empty_corner(3, 4);
//! assert_eq!(err.code(), ErrorCode::EmptyCorner);
//! assert_eq!(err.code().as_str(), "DEPTH-2003");
//! ```

use miette::Diagnostic;
use thiserror::Error;

/// Result type alias for depth map operations.
pub type DepthmapResult<T> = Result<T, DepthmapError>;

/// Machine-readable error codes for depth map operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Input errors (1xxx)
    /// DEPTH-1001: Downscale factor is zero
    InvalidMapScale = 1001,
    /// DEPTH-1002: Downscaled grid has no cells
    EmptyGrid = 1002,
    /// DEPTH-1003: RGBA buffer is shorter than width * height * 4
    ImageBufferTooSmall = 1003,
    /// DEPTH-1004: Surface tolerance is not a positive finite number
    InvalidTolerance = 1004,
    /// DEPTH-1005: Pre-gridded sample count does not match the grid
    GridSizeMismatch = 1005,

    // Region errors (2xxx)
    /// DEPTH-2001: Region extends past the grid
    RegionOutOfBounds = 2001,
    /// DEPTH-2002: Region corners are not ordered
    InvalidRegion = 2002,
    /// DEPTH-2003: A region corner has no vertex
    EmptyCorner = 2003,
    /// DEPTH-2004: A cell inside the region has no vertex
    EmptyInterior = 2004,
}

impl ErrorCode {
    /// Returns the error code as a string in the format `DEPTH-XXXX`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidMapScale => "DEPTH-1001",
            ErrorCode::EmptyGrid => "DEPTH-1002",
            ErrorCode::ImageBufferTooSmall => "DEPTH-1003",
            ErrorCode::InvalidTolerance => "DEPTH-1004",
            ErrorCode::GridSizeMismatch => "DEPTH-1005",
            ErrorCode::RegionOutOfBounds => "DEPTH-2001",
            ErrorCode::InvalidRegion => "DEPTH-2002",
            ErrorCode::EmptyCorner => "DEPTH-2003",
            ErrorCode::EmptyInterior => "DEPTH-2004",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors that can occur while building or editing a depth map.
#[derive(Debug, Error, Diagnostic)]
pub enum DepthmapError {
    /// Downscale factor of zero.
    #[error("map scale must be at least 1")]
    #[diagnostic(
        code(depthmap::input::map_scale),
        help("Use a map scale of 1 to keep one grid cell per image pixel")
    )]
    InvalidMapScale,

    /// Image is smaller than one downscaled cell.
    #[error("image of {width}x{height} pixels yields an empty grid at map scale {map_scale}")]
    #[diagnostic(
        code(depthmap::input::empty_grid),
        help("Lower the map scale or supply a larger image")
    )]
    EmptyGrid {
        width: u32,
        height: u32,
        map_scale: u32,
    },

    /// RGBA buffer does not cover every pixel.
    #[error("image buffer holds {actual} bytes, but {width}x{height} RGBA needs {expected}")]
    #[diagnostic(
        code(depthmap::input::image_buffer),
        help("The image collaborator must provide 4 bytes per pixel in RGBA order")
    )]
    ImageBufferTooSmall {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    /// Surface tolerance is unusable.
    #[error("surface tolerance must be positive and finite, got {value}")]
    #[diagnostic(
        code(depthmap::input::tolerance),
        help("The default tolerance is 0.075 (7.5% of the local mean depth)")
    )]
    InvalidTolerance { value: f64 },

    /// Pre-gridded samples do not match the grid dimensions.
    #[error("expected {expected} grid samples for a {stride}x{height} grid, got {actual}")]
    #[diagnostic(
        code(depthmap::input::grid_size),
        help("Supply one optional sample per cell in row-major order")
    )]
    GridSizeMismatch {
        stride: usize,
        height: usize,
        expected: usize,
        actual: usize,
    },

    /// Merge region extends past the grid.
    #[error("region ({x1}, {y1})-({x2}, {y2}) exceeds the {stride}x{height} grid")]
    #[diagnostic(
        code(depthmap::region::out_of_bounds),
        help("Region coordinates are rejected, never clamped")
    )]
    RegionOutOfBounds {
        x1: usize,
        y1: usize,
        x2: usize,
        y2: usize,
        stride: usize,
        height: usize,
    },

    /// Merge region corners are not top-left / bottom-right.
    #[error("region ({x1}, {y1})-({x2}, {y2}) is not ordered")]
    #[diagnostic(
        code(depthmap::region::invalid),
        help("Pass the top-left corner first and the bottom-right corner second")
    )]
    InvalidRegion {
        x1: usize,
        y1: usize,
        x2: usize,
        y2: usize,
    },

    /// One of the four region corners holds no vertex.
    #[error("region corner ({x}, {y}) is empty")]
    #[diagnostic(
        code(depthmap::region::empty_corner),
        help("Quads can only be merged where all four corners were sampled")
    )]
    EmptyCorner { x: usize, y: usize },

    /// A cell within the region holds no vertex.
    #[error("cell ({x}, {y}) inside the region is empty")]
    #[diagnostic(
        code(depthmap::region::empty_interior),
        help("Merge smaller regions that lie entirely on sampled cells")
    )]
    EmptyInterior { x: usize, y: usize },
}

impl DepthmapError {
    /// Returns the machine-readable error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            DepthmapError::InvalidMapScale => ErrorCode::InvalidMapScale,
            DepthmapError::EmptyGrid { .. } => ErrorCode::EmptyGrid,
            DepthmapError::ImageBufferTooSmall { .. } => ErrorCode::ImageBufferTooSmall,
            DepthmapError::InvalidTolerance { .. } => ErrorCode::InvalidTolerance,
            DepthmapError::GridSizeMismatch { .. } => ErrorCode::GridSizeMismatch,
            DepthmapError::RegionOutOfBounds { .. } => ErrorCode::RegionOutOfBounds,
            DepthmapError::InvalidRegion { .. } => ErrorCode::InvalidRegion,
            DepthmapError::EmptyCorner { .. } => ErrorCode::EmptyCorner,
            DepthmapError::EmptyInterior { .. } => ErrorCode::EmptyInterior,
        }
    }

    /// Grid cell the error refers to, if any.
    pub fn cell(&self) -> Option<(usize, usize)> {
        match self {
            DepthmapError::EmptyCorner { x, y } | DepthmapError::EmptyInterior { x, y } => {
                Some((*x, *y))
            }
            _ => None,
        }
    }

    /// Create an EmptyCorner error.
    pub fn empty_corner(x: usize, y: usize) -> Self {
        DepthmapError::EmptyCorner { x, y }
    }

    /// Create an EmptyInterior error.
    pub fn empty_interior(x: usize, y: usize) -> Self {
        DepthmapError::EmptyInterior { x, y }
    }

    /// Create an ImageBufferTooSmall error.
    pub fn image_buffer_too_small(width: u32, height: u32, actual: usize) -> Self {
        DepthmapError::ImageBufferTooSmall {
            width,
            height,
            expected: width as usize * height as usize * 4,
            actual,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = DepthmapError::empty_interior(2, 3);
        assert_eq!(err.code(), ErrorCode::EmptyInterior);
        assert_eq!(err.code().as_str(), "DEPTH-2004");
        assert_eq!(DepthmapError::InvalidMapScale.code().to_string(), "DEPTH-1001");
    }

    #[test]
    fn test_cell_location() {
        assert_eq!(DepthmapError::empty_corner(5, 7).cell(), Some((5, 7)));
        assert_eq!(DepthmapError::InvalidMapScale.cell(), None);
    }

    #[test]
    fn test_error_display() {
        let err = DepthmapError::image_buffer_too_small(4, 2, 10);
        let display = format!("{}", err);
        assert!(display.contains("10 bytes"));
        assert!(display.contains("4x2"));
        assert!(display.contains("32"));
    }
}
