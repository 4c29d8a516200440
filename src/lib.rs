//! # Neurogen
//!
//! Facade over the neurogen workspace: a small numerical engine for
//! evolving and training feedforward neural networks.
//!
//! - [`math`] re-exports [`neurogen_math`]: dense `f64` arrays, vectors,
//!   matrices (naive and Strassen multiplication, cofactor determinant),
//!   and numeric calculus helpers
//! - [`learn`] re-exports [`neurogen_learn`]: activations, feedforward
//!   networks with backprop and minibatch SGD, datasets, a genetic
//!   algorithm, and the evolutionary network bridge
//!
//! ## Example
//!
//! ```
//! use neurogen::learn::activation::Activation;
//! use neurogen::learn::network::FeedForwardNetwork;
//! use neurogen::math::Vector;
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let mut rng = ChaCha8Rng::seed_from_u64(42);
//! let net = FeedForwardNetwork::new(&[3, 5, 2], Activation::Tanh, &mut rng).unwrap();
//! let out = net.activate(&Vector::zeros(3)).unwrap();
//! assert_eq!(out.len(), 2);
//! ```

pub use neurogen_learn as learn;
pub use neurogen_math as math;

pub use neurogen_learn::{init_logging, LearnError, TrainingConfig};
pub use neurogen_math::MathError;
