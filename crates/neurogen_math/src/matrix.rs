//! Rank-2 view over [`NdArray`] with matrix algebra.
//!
//! Shape is `[rows, cols]`, row-major. The multiply kernels are a naive
//! triple loop and a Strassen divide-and-conquer variant that agrees with it
//! elementwise within floating tolerance for every operand shape.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

use crate::error::{MathError, Result};
use crate::ndarray::{NdArray, EPSILON};
use crate::vector::Vector;

/// Operand element count below which `strassen_mul` falls back to the naive
/// kernel (64×64 operands and smaller).
pub const STRASSEN_CUTOFF: usize = 64 * 64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix(NdArray);

impl Matrix {
    #[must_use]
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self(NdArray::zeros(&[rows, cols]))
    }

    #[must_use]
    pub fn ones(rows: usize, cols: usize) -> Self {
        Self(NdArray::ones(&[rows, cols]))
    }

    #[must_use]
    pub fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n, n);
        for i in 0..n {
            m[(i, i)] = 1.0;
        }
        m
    }

    /// Rectangular diagonal matrix from a value list.
    #[must_use]
    pub fn diag(values: &[f64], rows: usize, cols: usize) -> Self {
        let mut m = Self::zeros(rows, cols);
        for (i, &v) in values.iter().enumerate().take(rows.min(cols)) {
            m[(i, i)] = v;
        }
        m
    }

    /// Creates a matrix from a flat row-major buffer.
    pub fn from_vec(data: Vec<f64>, rows: usize, cols: usize) -> Result<Self> {
        Ok(Self(NdArray::from_vec(data, &[rows, cols])?))
    }

    /// Creates a matrix from row slices; all rows must have equal length.
    pub fn from_rows(rows: &[&[f64]]) -> Result<Self> {
        let cols = rows.first().map_or(0, |r| r.len());
        let mut data = Vec::with_capacity(rows.len() * cols);
        for row in rows {
            if row.len() != cols {
                return Err(MathError::shape_mismatch(&[cols], &[row.len()]));
            }
            data.extend_from_slice(row);
        }
        Self::from_vec(data, rows.len(), cols)
    }

    /// Wraps a rank-2 array; fails for any other rank.
    pub fn from_ndarray(array: NdArray) -> Result<Self> {
        if array.rank() != 2 {
            return Err(MathError::shape_mismatch(&[array.len(), 1], array.shape()));
        }
        Ok(Self(array))
    }

    /// Uniform random matrix with per-element bounds.
    pub fn random<R: Rng + ?Sized>(min: &Matrix, max: &Matrix, rng: &mut R) -> Result<Self> {
        let mut m = Self::zeros(min.rows(), min.cols());
        m.0.randomize_within(&min.0, &max.0, rng)?;
        Ok(m)
    }

    /// Gaussian random matrix with scalar mean and standard deviation.
    pub fn random_normal<R: Rng + ?Sized>(
        mean: f64,
        std_dev: f64,
        rows: usize,
        cols: usize,
        rng: &mut R,
    ) -> Result<Self> {
        let mut m = Self::zeros(rows, cols);
        m.0.randomize_normal(mean, std_dev, rng)?;
        Ok(m)
    }

    /// Uniform random matrix with scalar bounds.
    #[must_use]
    pub fn random_uniform<R: Rng + ?Sized>(
        min: f64,
        max: f64,
        rows: usize,
        cols: usize,
        rng: &mut R,
    ) -> Self {
        let mut m = Self::zeros(rows, cols);
        m.0.randomize(min, max, rng);
        m
    }

    #[must_use]
    pub fn rows(&self) -> usize {
        self.0.shape()[0]
    }

    #[must_use]
    pub fn cols(&self) -> usize {
        self.0.shape()[1]
    }

    /// Total number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        self.0.as_slice()
    }

    #[must_use]
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        self.0.as_mut_slice()
    }

    #[must_use]
    pub fn as_ndarray(&self) -> &NdArray {
        &self.0
    }

    pub fn into_ndarray(self) -> NdArray {
        self.0
    }

    /// Signed-coordinate element access, wrapping from the end of each axis.
    pub fn get(&self, i: i64, j: i64) -> Result<f64> {
        self.0.get(&[i, j])
    }

    pub fn set(&mut self, i: i64, j: i64, value: f64) -> Result<()> {
        self.0.set(&[i, j], value)
    }

    #[must_use]
    pub fn row(&self, i: usize) -> Vector {
        let start = i * self.cols();
        Vector::from_slice(&self.as_slice()[start..start + self.cols()])
    }

    #[must_use]
    pub fn column(&self, j: usize) -> Vector {
        let cols = self.cols();
        Vector::from_vec(
            (0..self.rows())
                .map(|i| self.as_slice()[i * cols + j])
                .collect(),
        )
    }

    /// Crop-or-pad resize per the [`NdArray::reshape`] contract.
    pub fn resize(&mut self, rows: usize, cols: usize) {
        self.0
            .reshape(&[rows, cols])
            .expect("rank-2 reshape cannot fail");
    }

    pub fn fill(&mut self, value: f64) {
        self.0.fill(value);
    }

    pub fn map(&mut self, f: impl Fn(f64) -> f64) {
        self.0.map(f);
    }

    pub fn scale(&mut self, c: f64) {
        self.0.scale(c);
    }

    pub fn add_assign(&mut self, other: &Matrix) -> Result<()> {
        self.0.add_assign(&other.0)
    }

    pub fn sub_assign(&mut self, other: &Matrix) -> Result<()> {
        self.0.sub_assign(&other.0)
    }

    pub fn add(&self, other: &Matrix) -> Result<Matrix> {
        let mut out = self.clone();
        out.add_assign(other)?;
        Ok(out)
    }

    pub fn sub(&self, other: &Matrix) -> Result<Matrix> {
        let mut out = self.clone();
        out.sub_assign(other)?;
        Ok(out)
    }

    /// Elementwise product.
    pub fn hadamard(&self, other: &Matrix) -> Result<Matrix> {
        let mut out = self.clone();
        out.0.hadamard_assign(&other.0)?;
        Ok(out)
    }

    fn check_inner_dims(a: &Matrix, b: &Matrix, context: &'static str) -> Result<()> {
        if a.cols() != b.rows() {
            return Err(MathError::dimension_mismatch(
                context,
                a.0.shape(),
                b.0.shape(),
            ));
        }
        Ok(())
    }

    /// Naive O(mnp) matrix product.
    pub fn matmul(a: &Matrix, b: &Matrix) -> Result<Matrix> {
        Self::check_inner_dims(a, b, "matmul")?;
        let (m, n, p) = (a.rows(), a.cols(), b.cols());
        let mut c = Matrix::zeros(m, p);

        let lhs = a.as_slice();
        let rhs = b.as_slice();
        let out = c.as_mut_slice();
        for i in 0..m {
            for k in 0..n {
                let aik = lhs[i * n + k];
                for j in 0..p {
                    out[i * p + j] += aik * rhs[k * p + j];
                }
            }
        }
        Ok(c)
    }

    /// Strassen divide-and-conquer product.
    ///
    /// Pads both operands to a common even square size, recurses on the four
    /// quadrants with seven sub-products, recombines, and crops the result
    /// back to `m x p`. Falls back to [`Matrix::matmul`] once both operands
    /// are smaller than [`STRASSEN_CUTOFF`] elements.
    pub fn strassen_mul(a: &Matrix, b: &Matrix) -> Result<Matrix> {
        Self::strassen_mul_with_cutoff(a, b, STRASSEN_CUTOFF)
    }

    /// [`Matrix::strassen_mul`] with a caller-chosen fallback threshold.
    pub fn strassen_mul_with_cutoff(a: &Matrix, b: &Matrix, cutoff: usize) -> Result<Matrix> {
        Self::check_inner_dims(a, b, "strassen_mul")?;

        let (m, n, p) = (a.rows(), a.cols(), b.cols());
        let size = m.max(n).max(p);
        if size <= 2 || (a.len() < cutoff && b.len() < cutoff) {
            return Self::matmul(a, b);
        }

        let s = if size % 2 == 1 { size + 1 } else { size };
        let half = s / 2;

        let mut ap = Matrix::zeros(s, s);
        let mut bp = Matrix::zeros(s, s);
        ap.0
            .set_slice(a.as_slice(), &[(0, m as i64 - 1), (0, n as i64 - 1)])?;
        bp.0
            .set_slice(b.as_slice(), &[(0, n as i64 - 1), (0, p as i64 - 1)])?;

        let a11 = ap.quadrant(0, 0, half)?;
        let a12 = ap.quadrant(0, half, half)?;
        let a21 = ap.quadrant(half, 0, half)?;
        let a22 = ap.quadrant(half, half, half)?;
        let b11 = bp.quadrant(0, 0, half)?;
        let b12 = bp.quadrant(0, half, half)?;
        let b21 = bp.quadrant(half, 0, half)?;
        let b22 = bp.quadrant(half, half, half)?;

        let m1 = Self::strassen_mul_with_cutoff(&a11.add(&a22)?, &b11.add(&b22)?, cutoff)?;
        let m2 = Self::strassen_mul_with_cutoff(&a21.add(&a22)?, &b11, cutoff)?;
        let m3 = Self::strassen_mul_with_cutoff(&a11, &b12.sub(&b22)?, cutoff)?;
        let m4 = Self::strassen_mul_with_cutoff(&a22, &b21.sub(&b11)?, cutoff)?;
        let m5 = Self::strassen_mul_with_cutoff(&a11.add(&a12)?, &b22, cutoff)?;
        let m6 = Self::strassen_mul_with_cutoff(&a21.sub(&a11)?, &b11.add(&b12)?, cutoff)?;
        let m7 = Self::strassen_mul_with_cutoff(&a12.sub(&a22)?, &b21.add(&b22)?, cutoff)?;

        let mut c11 = m1.add(&m4)?;
        c11.sub_assign(&m5)?;
        c11.add_assign(&m7)?;
        let c12 = m3.add(&m5)?;
        let c21 = m2.add(&m4)?;
        let mut c22 = m1.sub(&m2)?;
        c22.add_assign(&m3)?;
        c22.add_assign(&m6)?;

        let h = half as i64;
        let s64 = s as i64;
        let mut cp = Matrix::zeros(s, s);
        cp.0.set_slice(c11.as_slice(), &[(0, h - 1), (0, h - 1)])?;
        cp.0.set_slice(c12.as_slice(), &[(0, h - 1), (h, s64 - 1)])?;
        cp.0.set_slice(c21.as_slice(), &[(h, s64 - 1), (0, h - 1)])?;
        cp.0.set_slice(c22.as_slice(), &[(h, s64 - 1), (h, s64 - 1)])?;

        if m == s && p == s {
            return Ok(cp);
        }
        let cropped = cp
            .0
            .slice(&[(0, m as i64 - 1), (0, p as i64 - 1)])?;
        Matrix::from_vec(cropped, m, p)
    }

    fn quadrant(&self, row: usize, col: usize, half: usize) -> Result<Matrix> {
        let data = self.0.slice(&[
            (row as i64, (row + half) as i64 - 1),
            (col as i64, (col + half) as i64 - 1),
        ])?;
        Matrix::from_vec(data, half, half)
    }

    /// Matrix-vector product.
    pub fn mat_vec_mul(a: &Matrix, x: &Vector) -> Result<Vector> {
        if a.cols() != x.len() {
            return Err(MathError::dimension_mismatch(
                "mat_vec_mul",
                a.0.shape(),
                &[x.len()],
            ));
        }
        let (m, n) = (a.rows(), a.cols());
        let lhs = a.as_slice();
        let rhs = x.as_slice();
        let mut out = Vector::zeros(m);
        for i in 0..m {
            let mut sum = 0.0;
            for j in 0..n {
                sum += lhs[i * n + j] * rhs[j];
            }
            out[i] = sum;
        }
        Ok(out)
    }

    #[must_use]
    pub fn transpose(&self) -> Matrix {
        let (m, n) = (self.rows(), self.cols());
        let mut t = Matrix::zeros(n, m);
        let src = self.as_slice();
        let dst = t.as_mut_slice();
        for i in 0..m {
            for j in 0..n {
                dst[j * m + i] = src[i * n + j];
            }
        }
        t
    }

    fn check_square(&self, context: &'static str) -> Result<()> {
        if self.rows() != self.cols() {
            return Err(MathError::dimension_mismatch(
                context,
                self.0.shape(),
                self.0.shape(),
            ));
        }
        Ok(())
    }

    /// Sum of the main diagonal; square matrices only.
    pub fn trace(&self) -> Result<f64> {
        self.check_square("trace")?;
        let n = self.cols();
        Ok((0..n).map(|i| self.as_slice()[i * n + i]).sum())
    }

    /// Determinant by cofactor (Laplace) expansion along row 0, with closed
    /// forms for 1x1 and 2x2.
    ///
    /// Exponential in the matrix order; intended for small matrices only.
    pub fn determinant(&self) -> Result<f64> {
        self.check_square("determinant")?;
        let det = self.cofactor_determinant();
        if !det.is_finite() {
            return Err(MathError::NumericalInstability {
                op: "determinant",
                value: det,
            });
        }
        Ok(det)
    }

    fn cofactor_determinant(&self) -> f64 {
        let n = self.rows();
        let data = self.as_slice();
        match n {
            0 => 1.0,
            1 => data[0],
            2 => data[0] * data[3] - data[1] * data[2],
            _ => {
                let mut det = 0.0;
                for k in 0..n {
                    let mut minor = Matrix::zeros(n - 1, n - 1);
                    {
                        let sub = minor.as_mut_slice();
                        for i in 1..n {
                            for j in 0..n {
                                if j == k {
                                    continue;
                                }
                                let jj = if j < k { j } else { j - 1 };
                                sub[(i - 1) * (n - 1) + jj] = data[i * n + j];
                            }
                        }
                    }
                    let sign = if k % 2 == 0 { 1.0 } else { -1.0 };
                    det += sign * data[k] * minor.cofactor_determinant();
                }
                det
            }
        }
    }

    /// Off-diagonal equality check within [`EPSILON`].
    #[must_use]
    pub fn is_symmetric(&self) -> bool {
        if self.rows() != self.cols() {
            return false;
        }
        let n = self.rows();
        let data = self.as_slice();
        for i in 0..n {
            for j in (i + 1)..n {
                if (data[i * n + j] - data[j * n + i]).abs() >= EPSILON {
                    return false;
                }
            }
        }
        true
    }

    /// Frobenius norm.
    #[must_use]
    pub fn norm(&self) -> f64 {
        self.as_slice().iter().map(|e| e * e).sum::<f64>().sqrt()
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = f64;

    fn index(&self, (i, j): (usize, usize)) -> &f64 {
        &self.as_slice()[i * self.0.shape()[1] + j]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut f64 {
        let cols = self.0.shape()[1];
        &mut self.as_mut_slice()[i * cols + j]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn assert_close(a: &Matrix, b: &Matrix, tol: f64) {
        assert_eq!(a.rows(), b.rows());
        assert_eq!(a.cols(), b.cols());
        for (x, y) in a.as_slice().iter().zip(b.as_slice().iter()) {
            assert!((x - y).abs() < tol, "{x} != {y}");
        }
    }

    #[test]
    fn test_matmul_known_product() {
        let a = Matrix::from_rows(&[&[1.0, 2.0], &[3.0, 4.0]]).unwrap();
        let b = Matrix::from_rows(&[&[5.0, 6.0], &[7.0, 8.0]]).unwrap();
        let c = Matrix::matmul(&a, &b).unwrap();
        assert_eq!(c.as_slice(), &[19.0, 22.0, 43.0, 50.0]);
    }

    #[test]
    fn test_matmul_dimension_mismatch() {
        let a = Matrix::zeros(2, 3);
        let b = Matrix::zeros(2, 3);
        assert!(matches!(
            Matrix::matmul(&a, &b),
            Err(MathError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_strassen_matches_naive_square() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let a = Matrix::random_uniform(-1.0, 1.0, 8, 8, &mut rng);
        let b = Matrix::random_uniform(-1.0, 1.0, 8, 8, &mut rng);
        let naive = Matrix::matmul(&a, &b).unwrap();
        let fast = Matrix::strassen_mul_with_cutoff(&a, &b, 1).unwrap();
        assert_close(&naive, &fast, 1e-9);
    }

    #[test]
    fn test_strassen_matches_naive_rectangular_odd() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for &(m, n, p) in &[(3, 5, 2), (7, 3, 9), (1, 4, 6), (5, 5, 5)] {
            let a = Matrix::random_uniform(-2.0, 2.0, m, n, &mut rng);
            let b = Matrix::random_uniform(-2.0, 2.0, n, p, &mut rng);
            let naive = Matrix::matmul(&a, &b).unwrap();
            let fast = Matrix::strassen_mul_with_cutoff(&a, &b, 1).unwrap();
            assert_close(&naive, &fast, 1e-9);
        }
    }

    #[test]
    fn test_strassen_default_cutoff_small_input() {
        let a = Matrix::identity(4);
        let b = Matrix::from_rows(&[
            &[1.0, 0.0, 0.0, 0.0],
            &[0.0, 2.0, 0.0, 0.0],
            &[0.0, 0.0, 3.0, 0.0],
            &[0.0, 0.0, 0.0, 4.0],
        ])
        .unwrap();
        let c = Matrix::strassen_mul(&a, &b).unwrap();
        assert_close(&c, &b, 1e-12);
    }

    #[test]
    fn test_mat_vec_mul() {
        let a = Matrix::from_rows(&[&[1.0, 2.0], &[3.0, 4.0]]).unwrap();
        let x = Vector::from_slice(&[1.0, 1.0]);
        let y = Matrix::mat_vec_mul(&a, &x).unwrap();
        assert_eq!(y.to_vec(), vec![3.0, 7.0]);
        assert!(Matrix::mat_vec_mul(&a, &Vector::zeros(3)).is_err());
    }

    #[test]
    fn test_transpose_involution() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let a = Matrix::random_uniform(-1.0, 1.0, 3, 5, &mut rng);
        assert_eq!(a.transpose().transpose(), a);
    }

    #[test]
    fn test_trace() {
        let a = Matrix::from_rows(&[&[1.0, 2.0], &[3.0, 4.0]]).unwrap();
        assert_eq!(a.trace().unwrap(), 5.0);
        assert!(Matrix::zeros(2, 3).trace().is_err());
    }

    #[test]
    fn test_determinant_identity() {
        for n in 1..=5 {
            assert!((Matrix::identity(n).determinant().unwrap() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_determinant_singular() {
        // Duplicate rows.
        let a = Matrix::from_rows(&[&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]])
            .unwrap();
        assert!(a.determinant().unwrap().abs() < 1e-12);
    }

    #[test]
    fn test_determinant_2x2_closed_form() {
        let a = Matrix::from_rows(&[&[3.0, 8.0], &[4.0, 6.0]]).unwrap();
        assert_eq!(a.determinant().unwrap(), -14.0);
    }

    #[test]
    fn test_is_symmetric() {
        let sym = Matrix::from_rows(&[&[1.0, 2.0], &[2.0, 1.0]]).unwrap();
        let asym = Matrix::from_rows(&[&[1.0, 2.0], &[3.0, 1.0]]).unwrap();
        assert!(sym.is_symmetric());
        assert!(!asym.is_symmetric());
        assert!(!Matrix::zeros(2, 3).is_symmetric());
    }

    #[test]
    fn test_frobenius_norm() {
        let a = Matrix::from_rows(&[&[3.0, 0.0], &[0.0, 4.0]]).unwrap();
        assert!((a.norm() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_row_column_extraction() {
        let a = Matrix::from_rows(&[&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]]).unwrap();
        assert_eq!(a.row(1).to_vec(), vec![4.0, 5.0, 6.0]);
        assert_eq!(a.column(2).to_vec(), vec![3.0, 6.0]);
    }

    #[test]
    fn test_diag() {
        let d = Matrix::diag(&[1.0, 2.0, 3.0], 2, 3);
        assert_eq!(d.as_slice(), &[1.0, 0.0, 0.0, 0.0, 2.0, 0.0]);
    }
}
