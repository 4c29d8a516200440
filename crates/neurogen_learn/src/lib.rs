//! # Neurogen Learn
//!
//! The learning engine built on [`neurogen_math`]: feedforward networks
//! trained by backpropagation, and a genetic algorithm that can search the
//! same parameter space derivative-free.
//!
//! - [`activation`]: named `(f, df)` activation pairs with a numeric
//!   derivative fallback
//! - [`network`]: layered [`FeedForwardNetwork`] with topology editing,
//!   backprop, and minibatch SGD
//! - [`dataset`]: shuffled `(input, target)` sample batching
//! - [`genetic`]: roulette selection, multi-point crossover, mutation, and
//!   elitism over flat gene vectors
//! - [`evo`]: [`EvoNetwork`] bridging network parameters and genes
//!
//! Every stochastic operation takes an injected `rand::Rng`; fitness
//! functions are injected per call. With the `parallel` feature (default),
//! per-sample backprop and per-individual fitness evaluation fan out across
//! the rayon pool.
//!
//! ## Example
//!
//! ```
//! use neurogen_learn::activation::Activation;
//! use neurogen_learn::network::FeedForwardNetwork;
//! use neurogen_math::Vector;
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let mut rng = ChaCha8Rng::seed_from_u64(42);
//! let net = FeedForwardNetwork::new(&[2, 4, 1], Activation::Sigmoid, &mut rng).unwrap();
//! let out = net.activate(&Vector::from_slice(&[1.0, 0.0])).unwrap();
//! assert_eq!(out.len(), 1);
//! ```

/// Activation functions as `(f, df)` pairs
pub mod activation;
/// Configuration management for training runs
pub mod config;
/// Sample storage, shuffling, and batching
pub mod dataset;
/// Error taxonomy for training and evolution
pub mod error;
/// Genetic parameter search over networks
pub mod evo;
/// Generational genetic algorithm
pub mod genetic;
/// Training metrics collection and structured logging
pub mod metrics;
/// Feedforward network with backprop and SGD
pub mod network;

pub use activation::{Activation, Operation};
pub use config::TrainingConfig;
pub use dataset::{DataSet, Sample};
pub use error::{LearnError, Result};
pub use evo::{EvoConfig, EvoInit, EvoNetwork};
pub use genetic::{GaConfig, GeneDistribution, GeneticAlgorithm, Individual};
pub use metrics::{init_logging, TrainingMetrics};
pub use network::{FeedForwardNetwork, Layer, NetworkSnapshot, WeightInit};
