//! Ordered `(input, target)` sample store with shuffling and batching.

use neurogen_math::Vector;
use rand::Rng;

use crate::error::{LearnError, Result};

/// One supervised training pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub input: Vector,
    pub target: Vector,
}

impl Sample {
    #[must_use]
    pub fn new(input: Vector, target: Vector) -> Self {
        Self { input, target }
    }
}

/// Ordered sample list plus a read cursor; shuffling resets the cursor.
#[derive(Debug, Clone, Default)]
pub struct DataSet {
    samples: Vec<Sample>,
    cursor: usize,
}

impl DataSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a data set by pairing inputs with targets; extra entries on
    /// the longer side are dropped.
    #[must_use]
    pub fn from_pairs(inputs: &[Vector], targets: &[Vector]) -> Self {
        let mut set = Self::new();
        set.extend(inputs, targets);
        set
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn push(&mut self, input: Vector, target: Vector) {
        self.samples.push(Sample::new(input, target));
    }

    pub fn extend(&mut self, inputs: &[Vector], targets: &[Vector]) {
        for (x, y) in inputs.iter().zip(targets.iter()) {
            self.push(x.clone(), y.clone());
        }
    }

    pub fn clear(&mut self) {
        self.samples.clear();
        self.cursor = 0;
    }

    /// Fisher-Yates shuffle; resets the read cursor to 0.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for i in (1..self.samples.len()).rev() {
            let j = rng.gen_range(0..=i);
            self.samples.swap(i, j);
        }
        self.cursor = 0;
    }

    fn check_batch_size(&self, batch_size: usize) -> Result<()> {
        if self.is_empty() {
            return Err(LearnError::EmptyDataSet);
        }
        if batch_size == 0 || batch_size > self.len() {
            return Err(LearnError::invalid_configuration(format!(
                "batch size {batch_size} invalid for data set of {} samples",
                self.len()
            )));
        }
        Ok(())
    }

    /// Reads the next `batch_size` samples at the cursor, reshuffling first
    /// when fewer than `batch_size` samples remain.
    pub fn next_batch<R: Rng + ?Sized>(
        &mut self,
        batch_size: usize,
        rng: &mut R,
    ) -> Result<Vec<Sample>> {
        self.check_batch_size(batch_size)?;
        if self.cursor + batch_size > self.len() {
            self.shuffle(rng);
        }
        let batch = self.samples[self.cursor..self.cursor + batch_size].to_vec();
        self.cursor += batch_size;
        Ok(batch)
    }

    /// Shuffles and partitions one epoch into complete batches; a trailing
    /// remainder smaller than `batch_size` is left for the next epoch's
    /// shuffle.
    pub fn epoch_batches<R: Rng + ?Sized>(
        &mut self,
        batch_size: usize,
        rng: &mut R,
    ) -> Result<Vec<Vec<Sample>>> {
        self.check_batch_size(batch_size)?;
        self.shuffle(rng);

        let mut epoch = Vec::with_capacity(self.len() / batch_size);
        while self.cursor + batch_size <= self.len() {
            epoch.push(self.next_batch(batch_size, rng)?);
        }
        Ok(epoch)
    }
}
