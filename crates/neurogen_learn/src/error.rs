//! Error types for the learning engine.

use neurogen_math::MathError;
use thiserror::Error;

/// Main error type for network training and evolutionary search.
#[derive(Error, Debug)]
pub enum LearnError {
    /// A hyperparameter or topology request that cannot be honored.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A flat parameter vector whose length disagrees with the network.
    #[error("parameter count mismatch: network has {expected} parameters, got {actual}")]
    ParameterCountMismatch { expected: usize, actual: usize },

    /// Batch or fitness evaluation requested on an empty data set.
    #[error("data set is empty")]
    EmptyDataSet,

    /// A caller-supplied fitness function failed; fatal, never retried here.
    #[error("fitness evaluation failed: {0}")]
    FitnessEvaluation(String),

    /// Underlying linear-algebra failure.
    #[error(transparent)]
    Math(#[from] MathError),
}

/// Result type alias for learning operations.
pub type Result<T> = std::result::Result<T, LearnError>;

impl LearnError {
    /// Creates an invalid-configuration error.
    #[must_use]
    pub fn invalid_configuration<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    /// Creates a fitness-evaluation error.
    #[must_use]
    pub fn fitness<S: Into<String>>(msg: S) -> Self {
        Self::FitnessEvaluation(msg.into())
    }
}
