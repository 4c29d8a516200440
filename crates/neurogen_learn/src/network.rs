//! Feedforward neural network over [`Matrix`] weights and [`Vector`] biases.
//!
//! A layer is `(width, activation)`: one shared activation for N identical
//! slots. `weights[i]` has shape `(width(i), width(i+1))` and `biases[i]`
//! length `width(i+1)`; `weights.len() == biases.len() == depth - 1` holds
//! after every topology edit. Entries introduced by an edit are re-sampled
//! from the configured weight distribution, never zero-initialized.

use neurogen_math::{Matrix, MathError, Vector};
use rand::Rng;
use serde::{Deserialize, Serialize};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use std::time::Instant;

use crate::activation::Activation;
use crate::dataset::{DataSet, Sample};
use crate::error::{LearnError, Result};
use crate::metrics::TrainingMetrics;

/// One network layer: a width and the activation shared by all its units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layer {
    pub width: usize,
    pub activation: Activation,
}

/// Distribution used to sample fresh weight and bias entries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum WeightInit {
    Uniform { min: f64, max: f64 },
    Gaussian { mean: f64, std_dev: f64 },
}

impl Default for WeightInit {
    fn default() -> Self {
        Self::Gaussian {
            mean: 0.0,
            std_dev: 1.0,
        }
    }
}

impl WeightInit {
    fn sample_matrix<R: Rng + ?Sized>(
        &self,
        rows: usize,
        cols: usize,
        rng: &mut R,
    ) -> Result<Matrix> {
        match *self {
            Self::Uniform { min, max } => Ok(Matrix::random_uniform(min, max, rows, cols, rng)),
            Self::Gaussian { mean, std_dev } => {
                Ok(Matrix::random_normal(mean, std_dev, rows, cols, rng)?)
            }
        }
    }

    fn sample_vector<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Result<Vector> {
        let m = self.sample_matrix(1, n, rng)?;
        Ok(Vector::from_vec(m.into_ndarray().to_vec()))
    }
}

/// Layered feedforward network with backpropagation and minibatch SGD.
#[derive(Debug, Clone)]
pub struct FeedForwardNetwork {
    layers: Vec<Layer>,
    weights: Vec<Matrix>,
    biases: Vec<Vector>,
    init: WeightInit,
}

impl FeedForwardNetwork {
    /// Builds a network with the given layer widths. The input layer is
    /// always `Identity`; every subsequent layer uses `activation`.
    pub fn new<R: Rng + ?Sized>(
        widths: &[usize],
        activation: Activation,
        rng: &mut R,
    ) -> Result<Self> {
        Self::with_init(widths, activation, WeightInit::default(), rng)
    }

    /// [`FeedForwardNetwork::new`] with an explicit sampling distribution.
    pub fn with_init<R: Rng + ?Sized>(
        widths: &[usize],
        activation: Activation,
        init: WeightInit,
        rng: &mut R,
    ) -> Result<Self> {
        if widths.len() < 2 {
            return Err(LearnError::invalid_configuration(
                "a network needs at least an input and an output layer",
            ));
        }
        if widths.iter().any(|&w| w == 0) {
            return Err(LearnError::invalid_configuration(
                "layer widths must be positive",
            ));
        }

        let layers: Vec<Layer> = widths
            .iter()
            .enumerate()
            .map(|(i, &width)| Layer {
                width,
                activation: if i == 0 {
                    Activation::Identity
                } else {
                    activation
                },
            })
            .collect();

        let mut weights = Vec::with_capacity(widths.len() - 1);
        let mut biases = Vec::with_capacity(widths.len() - 1);
        for pair in widths.windows(2) {
            weights.push(init.sample_matrix(pair[0], pair[1], rng)?);
            biases.push(init.sample_vector(pair[1], rng)?);
        }

        Ok(Self {
            layers,
            weights,
            biases,
            init,
        })
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.layers.len()
    }

    #[must_use]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    #[must_use]
    pub fn layer_width(&self, layer: usize) -> usize {
        self.layers[layer].width
    }

    #[must_use]
    pub fn input_width(&self) -> usize {
        self.layers[0].width
    }

    #[must_use]
    pub fn output_width(&self) -> usize {
        self.layers[self.depth() - 1].width
    }

    /// Weight matrices, one per adjacent layer pair.
    #[must_use]
    pub fn weights(&self) -> &[Matrix] {
        &self.weights
    }

    #[must_use]
    pub fn biases(&self) -> &[Vector] {
        &self.biases
    }

    /// Mutable weight access; callers must keep shapes consistent.
    #[must_use]
    pub fn weights_mut(&mut self) -> &mut [Matrix] {
        &mut self.weights
    }

    #[must_use]
    pub fn biases_mut(&mut self) -> &mut [Vector] {
        &mut self.biases
    }

    /// The input layer's activation cannot be changed.
    pub fn set_layer_activation(&mut self, layer: usize, activation: Activation) -> Result<()> {
        if layer == 0 {
            return Err(LearnError::invalid_configuration(
                "the input layer's activation is fixed",
            ));
        }
        if layer >= self.depth() {
            return Err(LearnError::invalid_configuration(format!(
                "no layer {layer} in a network of depth {}",
                self.depth()
            )));
        }
        self.layers[layer].activation = activation;
        Ok(())
    }

    /// Forward pass: `v <- f(Wᵢᵗ·v + bᵢ)` per layer; returns the output
    /// activation vector (always `output_width` long).
    pub fn activate(&self, input: &Vector) -> Result<Vector> {
        if input.len() != self.input_width() {
            return Err(LearnError::Math(MathError::shape_mismatch(
                &[self.input_width()],
                &[input.len()],
            )));
        }

        let mut v = input.clone();
        for i in 0..self.depth() - 1 {
            let mut z = Matrix::mat_vec_mul(&self.weights[i].transpose(), &v)?;
            z.add_assign(&self.biases[i])?;
            let activation = self.layers[i + 1].activation;
            z.map(|x| activation.apply(x));
            v = z;
        }
        Ok(v)
    }

    /// Reverse-mode gradients of the half-squared error against a single
    /// `(x, y)` pair: per-layer weight and bias gradients, outermost first.
    pub fn backprop(&self, x: &Vector, y: &Vector) -> Result<(Vec<Matrix>, Vec<Vector>)> {
        if y.len() != self.output_width() {
            return Err(LearnError::Math(MathError::shape_mismatch(
                &[self.output_width()],
                &[y.len()],
            )));
        }

        let n = self.weights.len();
        let mut pre_activations = Vec::with_capacity(n);
        let mut activations = Vec::with_capacity(n + 1);
        activations.push(x.clone());

        for i in 0..n {
            let mut z = Matrix::mat_vec_mul(&self.weights[i].transpose(), &activations[i])?;
            z.add_assign(&self.biases[i])?;
            let activation = self.layers[i + 1].activation;
            let mut a = z.clone();
            a.map(|v| activation.apply(v));
            pre_activations.push(z);
            activations.push(a);
        }

        // delta_L = (a_L - y) .* f'(z_L)
        let mut delta = activations[n].sub(y)?;
        let output_activation = self.layers[n].activation;
        let mut df = pre_activations[n - 1].clone();
        df.map(|v| output_activation.derivative(v));
        delta.hadamard_assign(&df)?;

        let mut grad_weights: Vec<Matrix> = Vec::with_capacity(n);
        let mut grad_biases: Vec<Vector> = Vec::with_capacity(n);
        for i in (0..n).rev() {
            grad_weights.push(outer_product(&activations[i], &delta));
            grad_biases.push(delta.clone());

            if i > 0 {
                // delta_l = (W_{l+1} * delta_{l+1}) .* f'(z_l)
                let propagated = Matrix::mat_vec_mul(&self.weights[i], &delta)?;
                let activation = self.layers[i].activation;
                let mut df = pre_activations[i - 1].clone();
                df.map(|v| activation.derivative(v));
                delta = propagated.hadamard(&df)?;
            }
        }
        grad_weights.reverse();
        grad_biases.reverse();
        Ok((grad_weights, grad_biases))
    }

    /// One gradient step over a minibatch: gradients are summed across
    /// samples, then applied scaled by `learning_rate / batch_len`.
    ///
    /// With the `parallel` feature, per-sample backprop fans out across the
    /// rayon pool; every task fills its own gradient buffers, which are
    /// reduced into the shared accumulator only after all tasks finish.
    pub fn train_mini_batch(&mut self, batch: &[Sample], learning_rate: f64) -> Result<()> {
        if batch.is_empty() {
            return Err(LearnError::EmptyDataSet);
        }

        #[cfg(feature = "parallel")]
        let per_sample: Vec<(Vec<Matrix>, Vec<Vector>)> = {
            let net = &*self;
            batch
                .par_iter()
                .map(|sample| net.backprop(&sample.input, &sample.target))
                .collect::<Result<Vec<_>>>()?
        };

        #[cfg(not(feature = "parallel"))]
        let per_sample: Vec<(Vec<Matrix>, Vec<Vector>)> = batch
            .iter()
            .map(|sample| self.backprop(&sample.input, &sample.target))
            .collect::<Result<Vec<_>>>()?;

        let mut sum_weights: Vec<Matrix> = self
            .weights
            .iter()
            .map(|w| Matrix::zeros(w.rows(), w.cols()))
            .collect();
        let mut sum_biases: Vec<Vector> =
            self.biases.iter().map(|b| Vector::zeros(b.len())).collect();

        for (grad_w, grad_b) in &per_sample {
            for (acc, g) in sum_weights.iter_mut().zip(grad_w.iter()) {
                acc.add_assign(g)?;
            }
            for (acc, g) in sum_biases.iter_mut().zip(grad_b.iter()) {
                acc.add_assign(g)?;
            }
        }

        let step = learning_rate / batch.len() as f64;
        for (w, mut g) in self.weights.iter_mut().zip(sum_weights) {
            g.scale(step);
            w.sub_assign(&g)?;
        }
        for (b, mut g) in self.biases.iter_mut().zip(sum_biases) {
            g.scale(step);
            b.sub_assign(&g)?;
        }
        Ok(())
    }

    /// Mean squared error over `samples`, averaged across samples and
    /// output components.
    pub fn mean_squared_error(&self, samples: &[Sample]) -> Result<f64> {
        if samples.is_empty() {
            return Err(LearnError::EmptyDataSet);
        }
        let mut total = 0.0;
        let mut terms = 0usize;
        for sample in samples {
            let output = self.activate(&sample.input)?;
            let diff = output.sub(&sample.target)?;
            total += diff.dot(&diff)?;
            terms += diff.len();
        }
        Ok(total / terms as f64)
    }

    /// Minibatch stochastic gradient descent: each epoch reshuffles the data
    /// set into complete batches and steps through all of them.
    pub fn sgd<R: Rng + ?Sized>(
        &mut self,
        data: &mut DataSet,
        epochs: usize,
        batch_size: usize,
        learning_rate: f64,
        rng: &mut R,
    ) -> Result<()> {
        self.sgd_instrumented(data, epochs, batch_size, learning_rate, rng, None)
    }

    /// [`sgd`] recording per-epoch duration, batch count and mean loss into
    /// `metrics`. The loss is an extra full forward pass over `data` after
    /// each epoch.
    ///
    /// [`sgd`]: FeedForwardNetwork::sgd
    pub fn sgd_with_metrics<R: Rng + ?Sized>(
        &mut self,
        data: &mut DataSet,
        epochs: usize,
        batch_size: usize,
        learning_rate: f64,
        rng: &mut R,
        metrics: &TrainingMetrics,
    ) -> Result<()> {
        self.sgd_instrumented(data, epochs, batch_size, learning_rate, rng, Some(metrics))
    }

    fn sgd_instrumented<R: Rng + ?Sized>(
        &mut self,
        data: &mut DataSet,
        epochs: usize,
        batch_size: usize,
        learning_rate: f64,
        rng: &mut R,
        metrics: Option<&TrainingMetrics>,
    ) -> Result<()> {
        for epoch in 0..epochs {
            let started = Instant::now();
            let batches = data.epoch_batches(batch_size, rng)?;
            for batch in &batches {
                self.train_mini_batch(batch, learning_rate)?;
            }
            match metrics {
                Some(m) => {
                    let loss = self.mean_squared_error(data.samples())?;
                    m.record_epoch(started.elapsed(), batches.len(), loss);
                }
                None => tracing::info!(
                    epoch = epoch + 1,
                    epochs = epochs,
                    batches = batches.len(),
                    batch_size = batch_size,
                    learning_rate = learning_rate,
                    "SGD epoch complete"
                ),
            }
        }
        Ok(())
    }

    /// Inserts a layer so it becomes `layers[index]`; valid between the
    /// input and output layers. The surrounding weight matrices and the new
    /// layer's bias are re-sampled.
    pub fn add_layer<R: Rng + ?Sized>(
        &mut self,
        index: usize,
        width: usize,
        activation: Activation,
        rng: &mut R,
    ) -> Result<()> {
        if index == 0 || index >= self.depth() {
            return Err(LearnError::invalid_configuration(format!(
                "layer insert position {index} must be between the input and output layers"
            )));
        }
        if width == 0 {
            return Err(LearnError::invalid_configuration(
                "layer width must be positive",
            ));
        }

        let prev_width = self.layers[index - 1].width;
        let next_width = self.layers[index].width;

        self.weights[index - 1] = self.init.sample_matrix(prev_width, width, rng)?;
        self.weights
            .insert(index, self.init.sample_matrix(width, next_width, rng)?);
        self.biases
            .insert(index - 1, self.init.sample_vector(width, rng)?);
        self.layers.insert(index, Layer { width, activation });
        Ok(())
    }

    /// Removes a hidden layer; the input and output layers cannot be
    /// removed. The weight matrix bridging the gap is re-sampled.
    pub fn remove_layer<R: Rng + ?Sized>(&mut self, index: usize, rng: &mut R) -> Result<()> {
        if index == 0 || index >= self.depth() - 1 {
            return Err(LearnError::invalid_configuration(
                "cannot remove the input or output layer",
            ));
        }

        let prev_width = self.layers[index - 1].width;
        let next_width = self.layers[index + 1].width;

        self.weights.remove(index);
        self.weights[index - 1] = self.init.sample_matrix(prev_width, next_width, rng)?;
        self.biases.remove(index - 1);
        self.layers.remove(index);
        Ok(())
    }

    /// Widens a layer by `n` units; existing entries are preserved and every
    /// newly introduced weight/bias entry is re-sampled.
    pub fn add_units<R: Rng + ?Sized>(&mut self, layer: usize, n: usize, rng: &mut R) -> Result<()> {
        if layer >= self.depth() {
            return Err(LearnError::invalid_configuration(format!(
                "no layer {layer} in a network of depth {}",
                self.depth()
            )));
        }
        if n == 0 {
            return Ok(());
        }

        let old_width = self.layers[layer].width;
        let new_width = old_width + n;

        if layer > 0 {
            let incoming = &self.weights[layer - 1];
            let mut grown = self.init.sample_matrix(incoming.rows(), new_width, rng)?;
            grown
                .as_mut_slice()
                .chunks_mut(new_width)
                .zip(incoming.as_slice().chunks(old_width))
                .for_each(|(dst, src)| dst[..old_width].copy_from_slice(src));
            self.weights[layer - 1] = grown;

            let mut bias = self.init.sample_vector(new_width, rng)?;
            bias.as_mut_slice()[..old_width].copy_from_slice(self.biases[layer - 1].as_slice());
            self.biases[layer - 1] = bias;
        }

        if layer < self.depth() - 1 {
            let outgoing = &self.weights[layer];
            let cols = outgoing.cols();
            let mut grown = self.init.sample_matrix(new_width, cols, rng)?;
            grown.as_mut_slice()[..old_width * cols]
                .copy_from_slice(outgoing.as_slice());
            self.weights[layer] = grown;
        }

        self.layers[layer].width = new_width;
        Ok(())
    }

    /// Narrows a layer by up to `n` units, never below width 1; the adjacent
    /// weight matrices and bias shrink by crop-or-pad resize.
    pub fn remove_units(&mut self, layer: usize, n: usize) -> Result<()> {
        if layer >= self.depth() {
            return Err(LearnError::invalid_configuration(format!(
                "no layer {layer} in a network of depth {}",
                self.depth()
            )));
        }

        let old_width = self.layers[layer].width;
        let new_width = old_width.saturating_sub(n).max(1);
        if new_width == old_width {
            return Ok(());
        }

        if layer > 0 {
            let rows = self.weights[layer - 1].rows();
            self.weights[layer - 1].resize(rows, new_width);
            self.biases[layer - 1].resize(new_width);
        }
        if layer < self.depth() - 1 {
            let cols = self.weights[layer].cols();
            self.weights[layer].resize(new_width, cols);
        }

        self.layers[layer].width = new_width;
        Ok(())
    }

    /// Grows or shrinks a layer to exactly `width`.
    pub fn set_layer_width<R: Rng + ?Sized>(
        &mut self,
        layer: usize,
        width: usize,
        rng: &mut R,
    ) -> Result<()> {
        if width == 0 {
            return Err(LearnError::invalid_configuration(
                "layer width must be positive",
            ));
        }
        let current = self.layer_width(layer);
        if width > current {
            self.add_units(layer, width - current, rng)
        } else {
            self.remove_units(layer, current - width)
        }
    }

    /// Total number of weight and bias parameters.
    #[must_use]
    pub fn parameter_count(&self) -> usize {
        self.weights.iter().map(Matrix::len).sum::<usize>()
            + self.biases.iter().map(Vector::len).sum::<usize>()
    }

    /// Flattens all parameters into one gene vector, per connection layer:
    /// the weight matrix in row-major order, then that layer's biases.
    #[must_use]
    pub fn flatten_parameters(&self) -> Vector {
        let mut flat = Vec::with_capacity(self.parameter_count());
        for (w, b) in self.weights.iter().zip(self.biases.iter()) {
            flat.extend_from_slice(w.as_slice());
            flat.extend_from_slice(b.as_slice());
        }
        Vector::from_vec(flat)
    }

    /// Writes a flat parameter vector back, in [`flatten_parameters`] order.
    ///
    /// [`flatten_parameters`]: FeedForwardNetwork::flatten_parameters
    pub fn load_parameters(&mut self, params: &Vector) -> Result<()> {
        if params.len() != self.parameter_count() {
            return Err(LearnError::ParameterCountMismatch {
                expected: self.parameter_count(),
                actual: params.len(),
            });
        }

        let mut offset = 0;
        let src = params.as_slice();
        for (w, b) in self.weights.iter_mut().zip(self.biases.iter_mut()) {
            let len = w.len();
            w.as_mut_slice().copy_from_slice(&src[offset..offset + len]);
            offset += len;
            let len = b.len();
            b.as_mut_slice().copy_from_slice(&src[offset..offset + len]);
            offset += len;
        }
        Ok(())
    }

    /// Serializable topology + parameters for caller-side persistence.
    #[must_use]
    pub fn snapshot(&self) -> NetworkSnapshot {
        NetworkSnapshot {
            layer_widths: self.layers.iter().map(|l| l.width).collect(),
            activations: self.layers.iter().map(|l| l.activation).collect(),
            parameters: self.flatten_parameters().to_vec(),
        }
    }

    /// Reconstructs a network from a snapshot.
    pub fn from_snapshot(snapshot: &NetworkSnapshot) -> Result<Self> {
        if snapshot.layer_widths.len() < 2
            || snapshot.layer_widths.len() != snapshot.activations.len()
        {
            return Err(LearnError::invalid_configuration(
                "snapshot topology is malformed",
            ));
        }

        let layers: Vec<Layer> = snapshot
            .layer_widths
            .iter()
            .zip(snapshot.activations.iter())
            .map(|(&width, &activation)| Layer { width, activation })
            .collect();
        let weights: Vec<Matrix> = snapshot
            .layer_widths
            .windows(2)
            .map(|pair| Matrix::zeros(pair[0], pair[1]))
            .collect();
        let biases: Vec<Vector> = snapshot.layer_widths[1..]
            .iter()
            .map(|&w| Vector::zeros(w))
            .collect();

        let mut network = Self {
            layers,
            weights,
            biases,
            init: WeightInit::default(),
        };
        network.load_parameters(&Vector::from_slice(&snapshot.parameters))?;
        Ok(network)
    }
}

/// Outer product `u ⊗ v` as a `(u.len(), v.len())` matrix.
fn outer_product(u: &Vector, v: &Vector) -> Matrix {
    let (m, p) = (u.len(), v.len());
    let mut out = Matrix::zeros(m, p);
    let dst = out.as_mut_slice();
    for (i, &a) in u.as_slice().iter().enumerate() {
        for (j, &b) in v.as_slice().iter().enumerate() {
            dst[i * p + j] = a * b;
        }
    }
    out
}

/// Topology and flat parameters of a network, serializable by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSnapshot {
    pub layer_widths: Vec<usize>,
    pub activations: Vec<Activation>,
    pub parameters: Vec<f64>,
}

impl NetworkSnapshot {
    /// Hex-encoded JSON form.
    #[must_use]
    pub fn to_hex(&self) -> String {
        match serde_json::to_vec(self) {
            Ok(bytes) => hex::encode(bytes),
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize network snapshot");
                String::new()
            }
        }
    }

    pub fn from_hex(hex_str: &str) -> anyhow::Result<Self> {
        let bytes =
            hex::decode(hex_str).map_err(|e| anyhow::anyhow!("Invalid hex encoding: {}", e))?;
        if bytes.is_empty() {
            return Err(anyhow::anyhow!("Empty hex string"));
        }
        let snapshot = serde_json::from_slice(&bytes)
            .map_err(|e| anyhow::anyhow!("Failed to deserialize snapshot: {}", e))?;
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn check_shapes(net: &FeedForwardNetwork) {
        assert_eq!(net.weights().len(), net.depth() - 1);
        assert_eq!(net.biases().len(), net.depth() - 1);
        for i in 0..net.depth() - 1 {
            assert_eq!(net.weights()[i].rows(), net.layer_width(i));
            assert_eq!(net.weights()[i].cols(), net.layer_width(i + 1));
            assert_eq!(net.biases()[i].len(), net.layer_width(i + 1));
        }
    }

    #[test]
    fn test_construction_shapes() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let net = FeedForwardNetwork::new(&[3, 5, 2], Activation::Sigmoid, &mut rng).unwrap();
        assert_eq!(net.depth(), 3);
        assert_eq!(net.layers()[0].activation, Activation::Identity);
        assert_eq!(net.layers()[1].activation, Activation::Sigmoid);
        check_shapes(&net);
    }

    #[test]
    fn test_rejects_degenerate_topologies() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        assert!(FeedForwardNetwork::new(&[3], Activation::Sigmoid, &mut rng).is_err());
        assert!(FeedForwardNetwork::new(&[3, 0, 2], Activation::Sigmoid, &mut rng).is_err());
    }

    #[test]
    fn test_activate_output_width() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let net = FeedForwardNetwork::new(&[4, 7, 3], Activation::Tanh, &mut rng).unwrap();
        let out = net.activate(&Vector::zeros(4)).unwrap();
        assert_eq!(out.len(), 3);
        assert!(net.activate(&Vector::zeros(5)).is_err());
    }

    #[test]
    fn test_fixed_2_2_1_sigmoid_scenario() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut net = FeedForwardNetwork::new(&[2, 2, 1], Activation::Sigmoid, &mut rng).unwrap();
        net.set_layer_activation(2, Activation::Identity).unwrap();
        for w in net.weights_mut() {
            w.fill(1.0);
        }
        for b in net.biases_mut() {
            b.fill(0.0);
        }

        let out = net.activate(&Vector::from_slice(&[1.0, 0.0])).unwrap();
        // Hidden: sigmoid(1) twice; output: their sum under identity.
        let sigmoid_one = 1.0 / (1.0 + (-1.0f64).exp());
        assert_eq!(out.len(), 1);
        assert!((out[0] - 2.0 * sigmoid_one).abs() < 1e-15);

        // Bit-for-bit reproducible.
        let again = net.activate(&Vector::from_slice(&[1.0, 0.0])).unwrap();
        assert_eq!(out.to_vec(), again.to_vec());
    }

    #[test]
    fn test_input_activation_is_locked() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut net = FeedForwardNetwork::new(&[2, 2], Activation::Sigmoid, &mut rng).unwrap();
        assert!(net.set_layer_activation(0, Activation::Relu).is_err());
        assert!(net.set_layer_activation(1, Activation::Relu).is_ok());
    }

    #[test]
    fn test_add_remove_layer_keeps_shapes() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut net = FeedForwardNetwork::new(&[3, 2], Activation::Sigmoid, &mut rng).unwrap();

        net.add_layer(1, 4, Activation::Relu, &mut rng).unwrap();
        assert_eq!(net.depth(), 3);
        assert_eq!(net.layer_width(1), 4);
        check_shapes(&net);
        net.activate(&Vector::zeros(3)).unwrap();

        net.remove_layer(1, &mut rng).unwrap();
        assert_eq!(net.depth(), 2);
        check_shapes(&net);
        net.activate(&Vector::zeros(3)).unwrap();

        assert!(net.remove_layer(0, &mut rng).is_err());
        assert!(net.remove_layer(1, &mut rng).is_err());
    }

    #[test]
    fn test_add_units_preserves_existing_entries() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut net = FeedForwardNetwork::new(&[2, 3, 2], Activation::Sigmoid, &mut rng).unwrap();
        let old_incoming = net.weights()[0].clone();
        let old_outgoing = net.weights()[1].clone();
        let old_bias = net.biases()[0].clone();

        net.add_units(1, 2, &mut rng).unwrap();
        assert_eq!(net.layer_width(1), 5);
        check_shapes(&net);

        for i in 0..2 {
            for j in 0..3 {
                assert_eq!(net.weights()[0][(i, j)], old_incoming[(i, j)]);
            }
        }
        for i in 0..3 {
            for j in 0..2 {
                assert_eq!(net.weights()[1][(i, j)], old_outgoing[(i, j)]);
            }
            assert_eq!(net.biases()[0][i], old_bias[i]);
        }
    }

    #[test]
    fn test_new_unit_entries_are_sampled_not_zero() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut net = FeedForwardNetwork::new(&[2, 2, 2], Activation::Sigmoid, &mut rng).unwrap();
        net.add_units(1, 3, &mut rng).unwrap();

        // Freshly introduced incoming columns: all-zero would mean the edit
        // zero-initialized instead of sampling.
        let fresh: Vec<f64> = (0..2)
            .flat_map(|i| (2..5).map(move |j| (i, j)))
            .map(|(i, j)| net.weights()[0][(i, j)])
            .collect();
        assert!(fresh.iter().any(|&v| v != 0.0));
    }

    #[test]
    fn test_remove_units_floors_at_one() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut net = FeedForwardNetwork::new(&[2, 3, 2], Activation::Sigmoid, &mut rng).unwrap();
        net.remove_units(1, 10).unwrap();
        assert_eq!(net.layer_width(1), 1);
        check_shapes(&net);
        net.activate(&Vector::zeros(2)).unwrap();
    }

    #[test]
    fn test_set_layer_width() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut net = FeedForwardNetwork::new(&[2, 3, 2], Activation::Sigmoid, &mut rng).unwrap();
        net.set_layer_width(1, 6, &mut rng).unwrap();
        assert_eq!(net.layer_width(1), 6);
        net.set_layer_width(1, 2, &mut rng).unwrap();
        assert_eq!(net.layer_width(1), 2);
        check_shapes(&net);
    }

    #[test]
    fn test_flatten_load_roundtrip() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let net = FeedForwardNetwork::new(&[3, 4, 2], Activation::Tanh, &mut rng).unwrap();
        let params = net.flatten_parameters();
        assert_eq!(params.len(), net.parameter_count());
        assert_eq!(net.parameter_count(), 3 * 4 + 4 + 4 * 2 + 2);

        let mut other = FeedForwardNetwork::new(&[3, 4, 2], Activation::Tanh, &mut rng).unwrap();
        other.load_parameters(&params).unwrap();
        let x = Vector::from_slice(&[0.1, -0.2, 0.3]);
        assert_eq!(
            net.activate(&x).unwrap().to_vec(),
            other.activate(&x).unwrap().to_vec()
        );

        assert!(other.load_parameters(&Vector::zeros(5)).is_err());
    }

    #[test]
    fn test_snapshot_hex_roundtrip() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let net = FeedForwardNetwork::new(&[2, 3, 1], Activation::Sigmoid, &mut rng).unwrap();
        let hex = net.snapshot().to_hex();
        let restored =
            FeedForwardNetwork::from_snapshot(&NetworkSnapshot::from_hex(&hex).unwrap()).unwrap();

        let x = Vector::from_slice(&[0.5, -0.5]);
        assert_eq!(
            net.activate(&x).unwrap().to_vec(),
            restored.activate(&x).unwrap().to_vec()
        );
    }

    #[test]
    fn test_train_mini_batch_reduces_loss() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut net = FeedForwardNetwork::new(&[1, 1], Activation::Identity, &mut rng).unwrap();
        let batch = vec![Sample::new(
            Vector::from_slice(&[1.0]),
            Vector::from_slice(&[2.0]),
        )];

        let loss = |net: &FeedForwardNetwork| {
            let out = net.activate(&batch[0].input).unwrap();
            (out[0] - 2.0).powi(2)
        };

        let before = loss(&net);
        for _ in 0..50 {
            net.train_mini_batch(&batch, 0.1).unwrap();
        }
        let after = loss(&net);
        assert!(after < before * 0.01, "loss {before} -> {after}");
    }

    #[test]
    fn test_sgd_runs_over_epochs() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut net = FeedForwardNetwork::new(&[1, 1], Activation::Identity, &mut rng).unwrap();
        let xs: Vec<Vector> = (0..8).map(|i| Vector::from_slice(&[i as f64 / 8.0])).collect();
        let ys: Vec<Vector> = xs
            .iter()
            .map(|x| Vector::from_slice(&[0.5 * x[0]]))
            .collect();
        let mut data = DataSet::from_pairs(&xs, &ys);

        let mse = |net: &FeedForwardNetwork| -> f64 {
            xs.iter()
                .zip(ys.iter())
                .map(|(x, y)| (net.activate(x).unwrap()[0] - y[0]).powi(2))
                .sum::<f64>()
                / xs.len() as f64
        };

        let before = mse(&net);
        net.sgd(&mut data, 40, 4, 0.5, &mut rng).unwrap();
        assert!(mse(&net) < before * 0.1);
    }

    #[test]
    fn test_sgd_with_metrics_records_epochs() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut net = FeedForwardNetwork::new(&[1, 1], Activation::Identity, &mut rng).unwrap();
        let xs: Vec<Vector> = (0..8).map(|i| Vector::from_slice(&[i as f64 / 8.0])).collect();
        let ys: Vec<Vector> = xs
            .iter()
            .map(|x| Vector::from_slice(&[0.5 * x[0]]))
            .collect();
        let mut data = DataSet::from_pairs(&xs, &ys);

        let before = net.mean_squared_error(data.samples()).unwrap();
        let metrics = TrainingMetrics::new();
        net.sgd_with_metrics(&mut data, 5, 4, 0.5, &mut rng, &metrics)
            .unwrap();

        assert_eq!(metrics.epoch_count(), 5);
        assert!(metrics.last_loss().is_finite());
        assert!(metrics.last_loss() < before);
    }
}
