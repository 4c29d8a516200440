//! Rank-1 view over [`NdArray`] with vector-space operations.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

use crate::error::{MathError, Result};
use crate::ndarray::{NdArray, EPSILON};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vector(NdArray);

impl Vector {
    #[must_use]
    pub fn zeros(n: usize) -> Self {
        Self(NdArray::zeros(&[n]))
    }

    #[must_use]
    pub fn ones(n: usize) -> Self {
        Self(NdArray::ones(&[n]))
    }

    #[must_use]
    pub fn from_slice(data: &[f64]) -> Self {
        Self(NdArray::from_vec(data.to_vec(), &[data.len()]).expect("length matches shape"))
    }

    #[must_use]
    pub fn from_vec(data: Vec<f64>) -> Self {
        let n = data.len();
        Self(NdArray::from_vec(data, &[n]).expect("length matches shape"))
    }

    /// Wraps a rank-1 array; fails for any other rank.
    pub fn from_ndarray(array: NdArray) -> Result<Self> {
        if array.rank() != 1 {
            return Err(MathError::shape_mismatch(&[array.len()], array.shape()));
        }
        Ok(Self(array))
    }

    /// Uniform random vector with per-element bounds.
    pub fn random<R: Rng + ?Sized>(min: &Vector, max: &Vector, rng: &mut R) -> Result<Self> {
        let mut v = Self::zeros(min.len());
        v.0.randomize_within(&min.0, &max.0, rng)?;
        Ok(v)
    }

    /// Gaussian random vector with scalar mean and standard deviation.
    pub fn random_normal<R: Rng + ?Sized>(
        mean: f64,
        std_dev: f64,
        n: usize,
        rng: &mut R,
    ) -> Result<Self> {
        let mut v = Self::zeros(n);
        v.0.randomize_normal(mean, std_dev, rng)?;
        Ok(v)
    }

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

    #[must_use]
    pub fn to_vec(&self) -> Vec<f64> {
        self.0.to_vec()
    }

    /// Signed-index element access, wrapping from the end.
    pub fn get(&self, index: i64) -> Result<f64> {
        self.0.get_flat(index)
    }

    pub fn set(&mut self, index: i64, value: f64) -> Result<()> {
        self.0.set_flat(index, value)
    }

    /// Crop-or-pad resize; shrinking truncates, growing zero-pads.
    pub fn resize(&mut self, n: usize) {
        self.0.reshape(&[n]).expect("rank-1 reshape cannot fail");
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

    pub fn add_assign(&mut self, other: &Vector) -> Result<()> {
        self.0.add_assign(&other.0)
    }

    pub fn sub_assign(&mut self, other: &Vector) -> Result<()> {
        self.0.sub_assign(&other.0)
    }

    pub fn hadamard_assign(&mut self, other: &Vector) -> Result<()> {
        self.0.hadamard_assign(&other.0)
    }

    /// Out-of-place sum.
    pub fn add(&self, other: &Vector) -> Result<Vector> {
        let mut out = self.clone();
        out.add_assign(other)?;
        Ok(out)
    }

    /// Out-of-place difference.
    pub fn sub(&self, other: &Vector) -> Result<Vector> {
        let mut out = self.clone();
        out.sub_assign(other)?;
        Ok(out)
    }

    /// Out-of-place elementwise product.
    pub fn hadamard(&self, other: &Vector) -> Result<Vector> {
        let mut out = self.clone();
        out.hadamard_assign(other)?;
        Ok(out)
    }

    /// Inner product.
    pub fn dot(&self, other: &Vector) -> Result<f64> {
        if self.len() != other.len() {
            return Err(MathError::shape_mismatch(
                self.0.shape(),
                other.0.shape(),
            ));
        }
        Ok(self
            .as_slice()
            .iter()
            .zip(other.as_slice().iter())
            .map(|(a, b)| a * b)
            .sum())
    }

    /// Euclidean (L2) norm.
    #[must_use]
    pub fn norm(&self) -> f64 {
        self.as_slice().iter().map(|e| e * e).sum::<f64>().sqrt()
    }

    /// p-norm for `p >= 1`.
    #[must_use]
    pub fn p_norm(&self, p: f64) -> f64 {
        self.as_slice()
            .iter()
            .map(|e| e.abs().powf(p))
            .sum::<f64>()
            .powf(1.0 / p)
    }

    /// Maximum (infinity) norm.
    #[must_use]
    pub fn max_norm(&self) -> f64 {
        self.as_slice().iter().fold(0.0, |acc, e| acc.max(e.abs()))
    }

    /// Normalized copy; fails on (numerically) zero vectors.
    pub fn unit(&self) -> Result<Vector> {
        let norm = self.norm();
        if norm < EPSILON {
            return Err(MathError::NumericalInstability {
                op: "unit",
                value: norm,
            });
        }
        let mut out = self.clone();
        out.scale(1.0 / norm);
        Ok(out)
    }

    #[must_use]
    pub fn is_unit(&self) -> bool {
        (self.norm() - 1.0).abs() < EPSILON
    }

    pub fn is_orthogonal_to(&self, other: &Vector) -> Result<bool> {
        Ok(self.dot(other)?.abs() < EPSILON)
    }

    pub fn into_ndarray(self) -> NdArray {
        self.0
    }
}

impl Index<usize> for Vector {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.as_slice()[index]
    }
}

impl IndexMut<usize> for Vector {
    fn index_mut(&mut self, index: usize) -> &mut f64 {
        &mut self.as_mut_slice()[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_dot_product() {
        let a = Vector::from_slice(&[1.0, 2.0, 3.0]);
        let b = Vector::from_slice(&[4.0, 5.0, 6.0]);
        assert_eq!(a.dot(&b).unwrap(), 32.0);
    }

    #[test]
    fn test_dot_length_mismatch() {
        let a = Vector::zeros(3);
        let b = Vector::zeros(4);
        assert!(a.dot(&b).is_err());
    }

    #[test]
    fn test_norms() {
        let v = Vector::from_slice(&[3.0, 4.0]);
        assert!((v.norm() - 5.0).abs() < 1e-12);
        assert!((v.p_norm(1.0) - 7.0).abs() < 1e-12);
        assert!((v.max_norm() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_unit_vector() {
        let v = Vector::from_slice(&[3.0, 4.0]);
        let u = v.unit().unwrap();
        assert!(u.is_unit());
        assert!(Vector::zeros(2).unit().is_err());
    }

    #[test]
    fn test_orthogonality() {
        let a = Vector::from_slice(&[1.0, 0.0]);
        let b = Vector::from_slice(&[0.0, 1.0]);
        assert!(a.is_orthogonal_to(&b).unwrap());
        assert!(!a.is_orthogonal_to(&a).unwrap());
    }

    #[test]
    fn test_resize_crop_or_pad() {
        let mut v = Vector::from_slice(&[1.0, 2.0, 3.0]);
        v.resize(5);
        assert_eq!(v.to_vec(), vec![1.0, 2.0, 3.0, 0.0, 0.0]);
        v.resize(2);
        assert_eq!(v.to_vec(), vec![1.0, 2.0]);
    }

    #[test]
    fn test_random_within_bounds() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let min = Vector::from_slice(&[-1.0, 0.0, 5.0]);
        let max = Vector::from_slice(&[0.0, 1.0, 6.0]);
        let v = Vector::random(&min, &max, &mut rng).unwrap();
        for i in 0..3 {
            assert!(v[i] >= min[i] && v[i] < max[i]);
        }
    }

    #[test]
    fn test_from_ndarray_rejects_matrices() {
        let arr = NdArray::zeros(&[2, 2]);
        assert!(Vector::from_ndarray(arr).is_err());
    }
}
