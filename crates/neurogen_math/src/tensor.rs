//! Arbitrary-rank view over [`NdArray`] restricted to elementwise algebra.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{MathError, Result};
use crate::ndarray::NdArray;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tensor(NdArray);

impl Tensor {
    #[must_use]
    pub fn zeros(shape: &[usize]) -> Self {
        Self(NdArray::zeros(shape))
    }

    #[must_use]
    pub fn ones(shape: &[usize]) -> Self {
        Self(NdArray::ones(shape))
    }

    pub fn from_vec(data: Vec<f64>, shape: &[usize]) -> Result<Self> {
        Ok(Self(NdArray::from_vec(data, shape)?))
    }

    /// Wraps an array of rank >= 1.
    pub fn from_ndarray(array: NdArray) -> Result<Self> {
        if array.rank() == 0 {
            return Err(MathError::shape_mismatch(&[1], array.shape()));
        }
        Ok(Self(array))
    }

    /// Uniform random tensor with per-element bounds.
    pub fn random<R: Rng + ?Sized>(min: &Tensor, max: &Tensor, rng: &mut R) -> Result<Self> {
        let mut t = Self::zeros(min.shape());
        t.0.randomize_within(&min.0, &max.0, rng)?;
        Ok(t)
    }

    #[must_use]
    pub fn shape(&self) -> &[usize] {
        self.0.shape()
    }

    #[must_use]
    pub fn rank(&self) -> usize {
        self.0.rank()
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
    pub fn as_ndarray(&self) -> &NdArray {
        &self.0
    }

    #[must_use]
    pub fn as_ndarray_mut(&mut self) -> &mut NdArray {
        &mut self.0
    }

    pub fn into_ndarray(self) -> NdArray {
        self.0
    }

    pub fn get(&self, coords: &[i64]) -> Result<f64> {
        self.0.get(coords)
    }

    pub fn set(&mut self, coords: &[i64], value: f64) -> Result<()> {
        self.0.set(coords, value)
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

    pub fn add(&self, other: &Tensor) -> Result<Tensor> {
        let mut out = self.clone();
        out.0.add_assign(&other.0)?;
        Ok(out)
    }

    pub fn sub(&self, other: &Tensor) -> Result<Tensor> {
        let mut out = self.clone();
        out.0.sub_assign(&other.0)?;
        Ok(out)
    }

    pub fn hadamard(&self, other: &Tensor) -> Result<Tensor> {
        let mut out = self.clone();
        out.0.hadamard_assign(&other.0)?;
        Ok(out)
    }
}
