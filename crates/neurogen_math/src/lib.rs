//! # Neurogen Math
//!
//! The linear-algebra engine behind the neurogen learning crates: a dense
//! row-major N-dimensional array over `f64` with rank-specialized views.
//!
//! - [`NdArray`]: storage, indexing (negative indices wrap), inclusive-box
//!   slicing, elementwise arithmetic, and a deliberate crop-or-pad `reshape`
//! - [`Vector`] (rank 1): dot products and norms
//! - [`Matrix`] (rank 2): naive and Strassen multiplication, transpose,
//!   trace, cofactor determinant
//! - [`Tensor`] (any rank): elementwise algebra only
//! - [`calculus`]: numeric derivatives and quadrature
//!
//! All stochastic operations take an injected `rand::Rng`; there is no global
//! random source.
//!
//! ## Example
//!
//! ```
//! use neurogen_math::{Matrix, Vector};
//!
//! let a = Matrix::from_rows(&[&[1.0, 2.0], &[3.0, 4.0]]).unwrap();
//! let x = Vector::from_slice(&[1.0, -1.0]);
//! let y = Matrix::mat_vec_mul(&a, &x).unwrap();
//! assert_eq!(y.to_vec(), vec![-1.0, -1.0]);
//! ```

/// Numeric derivative and quadrature helpers
pub mod calculus;
/// Error taxonomy for array and matrix operations
pub mod error;
/// Rank-2 view with matrix algebra
pub mod matrix;
/// Dense N-dimensional array storage
pub mod ndarray;
/// Arbitrary-rank elementwise view
pub mod tensor;
/// Rank-1 view with vector-space operations
pub mod vector;

pub use error::{MathError, Result};
pub use matrix::{Matrix, STRASSEN_CUTOFF};
pub use ndarray::{NdArray, EPSILON};
pub use tensor::Tensor;
pub use vector::Vector;
