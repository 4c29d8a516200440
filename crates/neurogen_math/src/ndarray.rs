//! Dense N-dimensional array over `f64`.
//!
//! Storage is a flat row-major buffer plus a shape; the invariant
//! `data.len() == shape.iter().product()` holds after every mutation.
//! Per-axis indices may be negative, wrapping from the end of that axis.
//!
//! `reshape` is deliberately a per-axis crop-or-pad, not a relabeling: every
//! coordinate of the new shape copies the element at the same coordinate of
//! the old shape when it exists and zero-fills otherwise. Shrinking an axis
//! truncates it, growing an axis pads it with zeros. Topology edits in the
//! learning engine depend on this contract; do not normalize it.

use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::error::{MathError, Result};

/// Comparison tolerance for floating-point equality checks.
pub const EPSILON: f64 = 1e-5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NdArray {
    data: Vec<f64>,
    shape: Vec<usize>,
}

impl NdArray {
    /// Creates a zero-filled array of the given shape.
    #[must_use]
    pub fn zeros(shape: &[usize]) -> Self {
        Self {
            data: vec![0.0; shape.iter().product()],
            shape: shape.to_vec(),
        }
    }

    /// Creates an array filled with ones.
    #[must_use]
    pub fn ones(shape: &[usize]) -> Self {
        let mut arr = Self::zeros(shape);
        arr.fill(1.0);
        arr
    }

    /// Creates an array from a flat row-major buffer.
    pub fn from_vec(data: Vec<f64>, shape: &[usize]) -> Result<Self> {
        let expected: usize = shape.iter().product();
        if data.len() != expected {
            return Err(MathError::shape_mismatch(shape, &[data.len()]));
        }
        Ok(Self {
            data,
            shape: shape.to_vec(),
        })
    }

    #[must_use]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    #[must_use]
    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Total number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    #[must_use]
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<f64> {
        self.data.clone()
    }

    /// Maps a signed coordinate to a flat row-major index.
    ///
    /// Negative per-axis indices wrap from the end of that axis.
    fn resolve_index(&self, coords: &[i64]) -> Result<usize> {
        if coords.len() != self.rank() {
            return Err(MathError::index_out_of_range(coords, &self.shape));
        }

        let mut index = 0usize;
        for (axis, &c) in coords.iter().enumerate() {
            let dim = self.shape[axis] as i64;
            let c = if c < 0 { c + dim } else { c };
            if c < 0 || c >= dim {
                return Err(MathError::index_out_of_range(coords, &self.shape));
            }
            index = index * self.shape[axis] + c as usize;
        }
        Ok(index)
    }

    /// Reads the element at a signed coordinate.
    pub fn get(&self, coords: &[i64]) -> Result<f64> {
        Ok(self.data[self.resolve_index(coords)?])
    }

    /// Writes the element at a signed coordinate.
    pub fn set(&mut self, coords: &[i64], value: f64) -> Result<()> {
        let index = self.resolve_index(coords)?;
        self.data[index] = value;
        Ok(())
    }

    /// Reads an element by signed flat index, wrapping from the end.
    pub fn get_flat(&self, index: i64) -> Result<f64> {
        let len = self.data.len() as i64;
        let i = if index < 0 { index + len } else { index };
        if i < 0 || i >= len {
            return Err(MathError::index_out_of_range(&[index], &self.shape));
        }
        Ok(self.data[i as usize])
    }

    /// Writes an element by signed flat index, wrapping from the end.
    pub fn set_flat(&mut self, index: i64, value: f64) -> Result<()> {
        let len = self.data.len() as i64;
        let i = if index < 0 { index + len } else { index };
        if i < 0 || i >= len {
            return Err(MathError::index_out_of_range(&[index], &self.shape));
        }
        self.data[i as usize] = value;
        Ok(())
    }

    /// Resolves an inclusive `[a, b]` box, returning per-axis `(start, end)`.
    fn resolve_range(&self, range: &[(i64, i64)]) -> Result<Vec<(usize, usize)>> {
        if range.len() != self.rank() {
            let flat: Vec<i64> = range.iter().map(|r| r.0).collect();
            return Err(MathError::index_out_of_range(&flat, &self.shape));
        }

        let mut resolved = Vec::with_capacity(range.len());
        for (axis, &(a, b)) in range.iter().enumerate() {
            let dim = self.shape[axis] as i64;
            let a = if a < 0 { a + dim } else { a };
            let b = if b < 0 { b + dim } else { b };
            if a < 0 || b < a || b >= dim {
                return Err(MathError::index_out_of_range(&[a, b], &self.shape));
            }
            resolved.push((a as usize, b as usize));
        }
        Ok(resolved)
    }

    /// Extracts the elements of an inclusive `[a, b]` box, in row-major order.
    pub fn slice(&self, range: &[(i64, i64)]) -> Result<Vec<f64>> {
        let boxed = self.resolve_range(range)?;
        let volume: usize = boxed.iter().map(|&(a, b)| b - a + 1).product();

        let mut out = Vec::with_capacity(volume);
        let mut coord: Vec<usize> = boxed.iter().map(|&(a, _)| a).collect();
        for _ in 0..volume {
            let mut index = 0usize;
            for (axis, &c) in coord.iter().enumerate() {
                index = index * self.shape[axis] + c;
            }
            out.push(self.data[index]);
            Self::advance(&mut coord, &boxed);
        }
        Ok(out)
    }

    /// Overwrites an inclusive `[a, b]` box with a row-major buffer.
    ///
    /// Fails if the buffer's length differs from the box volume.
    pub fn set_slice(&mut self, values: &[f64], range: &[(i64, i64)]) -> Result<()> {
        let boxed = self.resolve_range(range)?;
        let dims: Vec<usize> = boxed.iter().map(|&(a, b)| b - a + 1).collect();
        let volume: usize = dims.iter().product();
        if values.len() != volume {
            return Err(MathError::shape_mismatch(&dims, &[values.len()]));
        }

        let mut coord: Vec<usize> = boxed.iter().map(|&(a, _)| a).collect();
        for &value in values {
            let mut index = 0usize;
            for (axis, &c) in coord.iter().enumerate() {
                index = index * self.shape[axis] + c;
            }
            self.data[index] = value;
            Self::advance(&mut coord, &boxed);
        }
        Ok(())
    }

    /// Odometer step over an inclusive box, last axis fastest.
    fn advance(coord: &mut [usize], boxed: &[(usize, usize)]) {
        for axis in (0..coord.len()).rev() {
            if coord[axis] < boxed[axis].1 {
                coord[axis] += 1;
                return;
            }
            coord[axis] = boxed[axis].0;
        }
    }

    /// Crop-or-pad reshape (see the module docs).
    ///
    /// The new shape must have the same rank as the current one.
    pub fn reshape(&mut self, new_shape: &[usize]) -> Result<()> {
        if new_shape.len() != self.rank() {
            return Err(MathError::shape_mismatch(new_shape, &self.shape));
        }

        let new_len: usize = new_shape.iter().product();
        let mut data = vec![0.0; new_len];
        let mut coord = vec![0usize; new_shape.len()];

        for slot in data.iter_mut() {
            let in_bounds = coord
                .iter()
                .zip(self.shape.iter())
                .all(|(&c, &dim)| c < dim);
            if in_bounds {
                let mut index = 0usize;
                for (axis, &c) in coord.iter().enumerate() {
                    index = index * self.shape[axis] + c;
                }
                *slot = self.data[index];
            }

            for axis in (0..coord.len()).rev() {
                coord[axis] += 1;
                if coord[axis] < new_shape[axis] {
                    break;
                }
                coord[axis] = 0;
            }
        }

        self.data = data;
        self.shape = new_shape.to_vec();
        Ok(())
    }

    /// Reshapes to the other array's shape, then copies its elements.
    pub fn copy_from(&mut self, other: &NdArray) -> Result<()> {
        self.reshape(&other.shape)?;
        self.data.copy_from_slice(&other.data);
        Ok(())
    }

    /// Sets every element to `value`.
    pub fn fill(&mut self, value: f64) {
        self.data.iter_mut().for_each(|e| *e = value);
    }

    /// Applies `f` to every element in place.
    pub fn map(&mut self, f: impl Fn(f64) -> f64) {
        self.data.iter_mut().for_each(|e| *e = f(*e));
    }

    fn check_same_shape(&self, other: &NdArray) -> Result<()> {
        if self.shape != other.shape {
            return Err(MathError::shape_mismatch(&self.shape, &other.shape));
        }
        Ok(())
    }

    /// Elementwise in-place addition.
    pub fn add_assign(&mut self, other: &NdArray) -> Result<()> {
        self.check_same_shape(other)?;
        for (a, b) in self.data.iter_mut().zip(other.data.iter()) {
            *a += b;
        }
        Ok(())
    }

    /// Elementwise in-place subtraction.
    pub fn sub_assign(&mut self, other: &NdArray) -> Result<()> {
        self.check_same_shape(other)?;
        for (a, b) in self.data.iter_mut().zip(other.data.iter()) {
            *a -= b;
        }
        Ok(())
    }

    /// Multiplies every element by `c`.
    pub fn scale(&mut self, c: f64) {
        self.data.iter_mut().for_each(|e| *e *= c);
    }

    /// Negates every element.
    pub fn negate(&mut self) {
        self.scale(-1.0);
    }

    /// Elementwise in-place product.
    pub fn hadamard_assign(&mut self, other: &NdArray) -> Result<()> {
        self.check_same_shape(other)?;
        for (a, b) in self.data.iter_mut().zip(other.data.iter()) {
            *a *= b;
        }
        Ok(())
    }

    /// Fills every element with a uniform draw from `[min, max)`.
    pub fn randomize<R: Rng + ?Sized>(&mut self, min: f64, max: f64, rng: &mut R) {
        self.data
            .iter_mut()
            .for_each(|e| *e = min + (max - min) * rng.gen::<f64>());
    }

    /// Fills every element with a draw from `N(mean, std_dev)`.
    pub fn randomize_normal<R: Rng + ?Sized>(
        &mut self,
        mean: f64,
        std_dev: f64,
        rng: &mut R,
    ) -> Result<()> {
        let normal = Normal::new(mean, std_dev).map_err(|_| MathError::NumericalInstability {
            op: "randomize_normal",
            value: std_dev,
        })?;
        self.data.iter_mut().for_each(|e| *e = normal.sample(rng));
        Ok(())
    }

    /// Per-element uniform draws from `[min[i], max[i])`.
    pub fn randomize_within<R: Rng + ?Sized>(
        &mut self,
        min: &NdArray,
        max: &NdArray,
        rng: &mut R,
    ) -> Result<()> {
        self.check_same_shape(min)?;
        self.check_same_shape(max)?;
        for ((e, &lo), &hi) in self.data.iter_mut().zip(min.data.iter()).zip(max.data.iter()) {
            *e = lo + (hi - lo) * rng.gen::<f64>();
        }
        Ok(())
    }

    /// Per-element draws from `N(mean[i], std_dev[i])`.
    pub fn randomize_normal_within<R: Rng + ?Sized>(
        &mut self,
        mean: &NdArray,
        std_dev: &NdArray,
        rng: &mut R,
    ) -> Result<()> {
        self.check_same_shape(mean)?;
        self.check_same_shape(std_dev)?;
        for ((e, &mu), &sigma) in self
            .data
            .iter_mut()
            .zip(mean.data.iter())
            .zip(std_dev.data.iter())
        {
            let normal = Normal::new(mu, sigma).map_err(|_| MathError::NumericalInstability {
                op: "randomize_normal_within",
                value: sigma,
            })?;
            *e = normal.sample(rng);
        }
        Ok(())
    }
}
