//! Derivative-free network training via the genetic algorithm.
//!
//! [`EvoNetwork`] couples a [`FeedForwardNetwork`] with a
//! [`GeneticAlgorithm`] whose individuals are the network's flattened
//! parameters. Fitness writes a candidate gene vector into a network copy,
//! runs it over a fixed evaluation set, and scores `1 / (1 + MSE)`. The
//! gene layout is exactly [`FeedForwardNetwork::flatten_parameters`] order,
//! so per-gene bounds are built layer by layer, weights then biases.

use neurogen_math::Vector;
use rand::Rng;
use serde::{Deserialize, Serialize};

use std::time::Instant;

use crate::dataset::{DataSet, Sample};
use crate::error::{LearnError, Result};
use crate::genetic::{GaConfig, GeneDistribution, GeneticAlgorithm};
use crate::metrics::TrainingMetrics;
use crate::network::FeedForwardNetwork;

/// Initial sampling and mutation ranges for evolved parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EvoInit {
    /// Separate global bounds for weight genes and bias genes.
    Uniform {
        weight_bounds: (f64, f64),
        bias_bounds: (f64, f64),
        min_delta: f64,
        max_delta: f64,
    },
    Gaussian {
        mean: f64,
        std_dev: f64,
        mean_delta: f64,
        std_dev_delta: f64,
    },
}

/// Hyperparameters for evolving a network's parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvoConfig {
    pub population_count: usize,
    pub cross_points: usize,
    pub cross_offset: usize,
    pub mutation_rate: f64,
    pub elite_count: usize,
    pub init: EvoInit,
}

/// A network whose parameter space is searched by a genetic algorithm.
#[derive(Debug, Clone)]
pub struct EvoNetwork {
    network: FeedForwardNetwork,
    algorithm: GeneticAlgorithm,
    config: EvoConfig,
}

impl EvoNetwork {
    /// Wraps a network and populates the search over its parameter space.
    pub fn new<R: Rng + ?Sized>(
        network: FeedForwardNetwork,
        config: EvoConfig,
        rng: &mut R,
    ) -> Result<Self> {
        let algorithm = GeneticAlgorithm::new(ga_config(&network, &config), rng)?;
        Ok(Self {
            network,
            algorithm,
            config,
        })
    }

    #[must_use]
    pub fn network(&self) -> &FeedForwardNetwork {
        &self.network
    }

    /// Mutable network access for topology edits; call
    /// [`EvoNetwork::resync`] afterwards before evolving again.
    #[must_use]
    pub fn network_mut(&mut self) -> &mut FeedForwardNetwork {
        &mut self.network
    }

    #[must_use]
    pub fn algorithm(&self) -> &GeneticAlgorithm {
        &self.algorithm
    }

    /// Best fitness of the latest evaluated generation.
    #[must_use]
    pub fn best_fitness(&self) -> Option<f64> {
        self.algorithm.best().and_then(|i| i.fitness)
    }

    /// Rebuilds the population after a topology change; the old population
    /// is discarded because its gene layout no longer matches the network.
    pub fn resync<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<()> {
        self.algorithm = GeneticAlgorithm::new(ga_config(&self.network, &self.config), rng)?;
        Ok(())
    }

    /// Runs `generations` of evolution against `data`, then loads the best
    /// individual's genes into the wrapped network.
    ///
    /// Fails with [`LearnError::ParameterCountMismatch`] when the network's
    /// topology has changed since the last (re)sync.
    pub fn evolve<R: Rng + ?Sized>(
        &mut self,
        data: &DataSet,
        generations: usize,
        rng: &mut R,
    ) -> Result<()> {
        self.evolve_instrumented(data, generations, rng, None)
    }

    /// [`evolve`] recording per-generation duration and best fitness into
    /// `metrics`.
    ///
    /// [`evolve`]: EvoNetwork::evolve
    pub fn evolve_with_metrics<R: Rng + ?Sized>(
        &mut self,
        data: &DataSet,
        generations: usize,
        rng: &mut R,
        metrics: &TrainingMetrics,
    ) -> Result<()> {
        self.evolve_instrumented(data, generations, rng, Some(metrics))
    }

    fn evolve_instrumented<R: Rng + ?Sized>(
        &mut self,
        data: &DataSet,
        generations: usize,
        rng: &mut R,
        metrics: Option<&TrainingMetrics>,
    ) -> Result<()> {
        if data.is_empty() {
            return Err(LearnError::EmptyDataSet);
        }
        let gene_count = self.algorithm.config().gene_count;
        if gene_count != self.network.parameter_count() {
            return Err(LearnError::ParameterCountMismatch {
                expected: self.network.parameter_count(),
                actual: gene_count,
            });
        }

        let template = self.network.clone();
        let samples: Vec<Sample> = data.samples().to_vec();
        let fitness = move |genes: &Vector| -> Result<f64> {
            let mut candidate = template.clone();
            candidate.load_parameters(genes)?;
            let mse = candidate.mean_squared_error(&samples)?;
            Ok(1.0 / (1.0 + mse))
        };

        match metrics {
            None => self.algorithm.run(generations, &fitness, rng)?,
            Some(m) => {
                for _ in 0..generations {
                    let started = Instant::now();
                    self.algorithm.step(&fitness, rng)?;
                    let best = self.best_fitness().unwrap_or(f64::NAN);
                    m.record_generation(started.elapsed(), best);
                }
            }
        }
        self.finish(&fitness)?;
        tracing::info!(
            generations = generations,
            best_fitness = self.best_fitness(),
            "evolution finished"
        );
        Ok(())
    }

    /// Epoch-style evolution: each epoch reshuffles `data` into complete
    /// batches and runs one generation per batch, scoring individuals
    /// against that batch only. Cheaper per generation than [`evolve`] and
    /// noisier, like minibatch SGD versus full-batch descent.
    ///
    /// [`evolve`]: EvoNetwork::evolve
    pub fn evolve_epochs<R: Rng + ?Sized>(
        &mut self,
        data: &mut DataSet,
        epochs: usize,
        batch_size: usize,
        rng: &mut R,
    ) -> Result<()> {
        let gene_count = self.algorithm.config().gene_count;
        if gene_count != self.network.parameter_count() {
            return Err(LearnError::ParameterCountMismatch {
                expected: self.network.parameter_count(),
                actual: gene_count,
            });
        }

        for epoch in 0..epochs {
            let batches = data.epoch_batches(batch_size, rng)?;
            let generations = batches.len();
            for batch in batches {
                let template = self.network.clone();
                let fitness = move |genes: &Vector| -> Result<f64> {
                    let mut candidate = template.clone();
                    candidate.load_parameters(genes)?;
                    let mse = candidate.mean_squared_error(&batch)?;
                    Ok(1.0 / (1.0 + mse))
                };
                self.algorithm.step(&fitness, rng)?;
            }
            tracing::info!(
                epoch = epoch + 1,
                epochs = epochs,
                generations = generations,
                "evolution epoch complete"
            );
        }

        let template = self.network.clone();
        let samples: Vec<Sample> = data.samples().to_vec();
        let fitness = move |genes: &Vector| -> Result<f64> {
            let mut candidate = template.clone();
            candidate.load_parameters(genes)?;
            let mse = candidate.mean_squared_error(&samples)?;
            Ok(1.0 / (1.0 + mse))
        };
        self.finish(&fitness)
    }

    /// Scores the final population against `fitness` and writes the best
    /// genes back into the wrapped network.
    fn finish<F>(&mut self, fitness: &F) -> Result<()>
    where
        F: Fn(&Vector) -> Result<f64> + Sync,
    {
        self.algorithm.fit(fitness)?;
        let best = self.algorithm.best_fit(1)[0].genes.clone();
        self.network.load_parameters(&best)
    }
}

/// Mean squared error of a network over an evaluation set; see
/// [`FeedForwardNetwork::mean_squared_error`].
pub fn mean_squared_error(network: &FeedForwardNetwork, samples: &[Sample]) -> Result<f64> {
    network.mean_squared_error(samples)
}

fn ga_config(network: &FeedForwardNetwork, config: &EvoConfig) -> GaConfig {
    let gene_count = network.parameter_count();
    let distribution = match config.init {
        EvoInit::Uniform {
            weight_bounds,
            bias_bounds,
            min_delta,
            max_delta,
        } => {
            // Bounds follow flatten order: per layer, weight genes then
            // bias genes.
            let mut min = Vec::with_capacity(gene_count);
            let mut max = Vec::with_capacity(gene_count);
            for (w, b) in network.weights().iter().zip(network.biases()) {
                min.extend(std::iter::repeat(weight_bounds.0).take(w.len()));
                max.extend(std::iter::repeat(weight_bounds.1).take(w.len()));
                min.extend(std::iter::repeat(bias_bounds.0).take(b.len()));
                max.extend(std::iter::repeat(bias_bounds.1).take(b.len()));
            }
            GeneDistribution::Uniform {
                min: Vector::from_vec(min),
                max: Vector::from_vec(max),
                min_delta,
                max_delta,
            }
        }
        EvoInit::Gaussian {
            mean,
            std_dev,
            mean_delta,
            std_dev_delta,
        } => GeneDistribution::Gaussian {
            mean,
            std_dev,
            mean_delta,
            std_dev_delta,
        },
    };

    GaConfig {
        population_count: config.population_count,
        gene_count,
        cross_points: config.cross_points,
        cross_offset: config.cross_offset,
        mutation_rate: config.mutation_rate,
        elite_count: config.elite_count,
        distribution,
    }
}
