//! Error types for the linear-algebra engine.
//!
//! Every fallible operation reports the failure at the point of detection;
//! nothing is corrected silently.

use thiserror::Error;

/// Main error type for array and matrix operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    /// Operand shapes are incompatible for an elementwise operation.
    #[error("shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// Matrix dimensions do not agree for a product or a square-only operation.
    #[error("dimension mismatch: {context} with shapes {left:?} and {right:?}")]
    DimensionMismatch {
        context: &'static str,
        left: Vec<usize>,
        right: Vec<usize>,
    },

    /// Coordinate or slice bound outside the array's shape.
    #[error("index {index:?} out of range for shape {shape:?}")]
    IndexOutOfRange { index: Vec<i64>, shape: Vec<usize> },

    /// An operation produced a NaN or infinite value.
    #[error("numerical instability in {op}: produced {value}")]
    NumericalInstability { op: &'static str, value: f64 },
}

/// Result type alias for math operations.
pub type Result<T> = std::result::Result<T, MathError>;

impl MathError {
    /// Creates a shape-mismatch error from two shapes.
    #[must_use]
    pub fn shape_mismatch(expected: &[usize], actual: &[usize]) -> Self {
        Self::ShapeMismatch {
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        }
    }

    /// Creates a dimension-mismatch error for a named matrix operation.
    #[must_use]
    pub fn dimension_mismatch(context: &'static str, left: &[usize], right: &[usize]) -> Self {
        Self::DimensionMismatch {
            context,
            left: left.to_vec(),
            right: right.to_vec(),
        }
    }

    /// Creates an out-of-range error from a signed coordinate.
    #[must_use]
    pub fn index_out_of_range(index: &[i64], shape: &[usize]) -> Self {
        Self::IndexOutOfRange {
            index: index.to_vec(),
            shape: shape.to_vec(),
        }
    }
}
