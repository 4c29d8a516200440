//! Configuration management for training runs.
//!
//! Strongly-typed configuration structures that map to a `training.toml`
//! file. A run is described by the network topology, the gradient-descent
//! hyperparameters, and the evolutionary-search hyperparameters; defaults
//! are hardcoded in the `Default` impls and overridden by the file.
//!
//! ## Example `training.toml`
//!
//! ```toml
//! [network]
//! layer_widths = [4, 8, 2]
//! activation = "Sigmoid"
//!
//! [sgd]
//! epochs = 100
//! batch_size = 16
//! learning_rate = 0.05
//!
//! [evolution]
//! population_count = 32
//! mutation_rate = 0.1
//! ```

use serde::{Deserialize, Serialize};

use crate::activation::Activation;
use crate::evo::{EvoConfig, EvoInit};
use crate::network::WeightInit;

/// Network topology and weight initialization.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct NetworkConfig {
    pub layer_widths: Vec<usize>,
    pub activation: Activation,
    pub init: WeightInit,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            layer_widths: vec![2, 4, 1],
            activation: Activation::Sigmoid,
            init: WeightInit::default(),
        }
    }
}

/// Minibatch gradient-descent hyperparameters.
#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub struct SgdConfig {
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
}

impl Default for SgdConfig {
    fn default() -> Self {
        Self {
            epochs: 100,
            batch_size: 16,
            learning_rate: 0.05,
        }
    }
}

/// Full description of one training run.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TrainingConfig {
    pub network: NetworkConfig,
    pub sgd: SgdConfig,
    pub evolution: EvoConfig,
    pub seed: Option<u64>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            sgd: SgdConfig::default(),
            evolution: EvoConfig {
                population_count: 32,
                cross_points: 1,
                cross_offset: 0,
                mutation_rate: 0.1,
                elite_count: 2,
                init: EvoInit::Uniform {
                    weight_bounds: (-1.0, 1.0),
                    bias_bounds: (-1.0, 1.0),
                    min_delta: -0.2,
                    max_delta: 0.2,
                },
            },
            seed: None,
        }
    }
}

impl TrainingConfig {
    /// Validates all configuration parameters.
    ///
    /// Returns `Ok(())` if all parameters are valid, or `Err` with a
    /// description of the first validation failure.
    pub fn validate(&self) -> anyhow::Result<()> {
        // Network validation
        anyhow::ensure!(
            self.network.layer_widths.len() >= 2,
            "Network needs at least an input and an output layer"
        );
        anyhow::ensure!(
            self.network.layer_widths.iter().all(|&w| w > 0),
            "Layer widths must be positive"
        );
        if let WeightInit::Gaussian { std_dev, .. } = self.network.init {
            anyhow::ensure!(
                std_dev.is_finite() && std_dev >= 0.0,
                "Weight standard deviation must be finite and non-negative"
            );
        }

        // SGD validation
        anyhow::ensure!(self.sgd.epochs > 0, "Epoch count must be positive");
        anyhow::ensure!(self.sgd.batch_size > 0, "Batch size must be positive");
        anyhow::ensure!(
            self.sgd.learning_rate > 0.0 && self.sgd.learning_rate.is_finite(),
            "Learning rate must be positive and finite"
        );

        // Evolution validation
        anyhow::ensure!(
            self.evolution.population_count > 0,
            "Population count must be positive"
        );
        anyhow::ensure!(
            self.evolution.elite_count <= self.evolution.population_count,
            "Elite count cannot exceed population count"
        );
        anyhow::ensure!(
            (0.0..=1.0).contains(&self.evolution.mutation_rate),
            "Mutation rate must be in [0.0, 1.0]"
        );
        match self.evolution.init {
            EvoInit::Uniform {
                weight_bounds,
                bias_bounds,
                min_delta,
                max_delta,
            } => {
                anyhow::ensure!(
                    weight_bounds.0 <= weight_bounds.1,
                    "Weight bounds must satisfy min <= max"
                );
                anyhow::ensure!(
                    bias_bounds.0 <= bias_bounds.1,
                    "Bias bounds must satisfy min <= max"
                );
                anyhow::ensure!(
                    min_delta <= max_delta,
                    "Mutation deltas must satisfy min <= max"
                );
            }
            EvoInit::Gaussian {
                std_dev,
                std_dev_delta,
                ..
            } => {
                anyhow::ensure!(
                    std_dev.is_finite() && std_dev >= 0.0,
                    "Gene standard deviation must be finite and non-negative"
                );
                anyhow::ensure!(
                    std_dev_delta.is_finite() && std_dev_delta >= 0.0,
                    "Mutation standard deviation must be finite and non-negative"
                );
            }
        }

        Ok(())
    }

    /// Loads and validates configuration from TOML content.
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config = toml::from_str::<Self>(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Stable digest of the hyperparameters, for tagging runs and
    /// detecting configuration drift between checkpoints.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(format!("{:?}", self.network).as_bytes());
        hasher.update(format!("{:?}", self.sgd).as_bytes());
        hasher.update(format!("{:?}", self.evolution).as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        let config = TrainingConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_topology() {
        let config = TrainingConfig {
            network: NetworkConfig {
                layer_widths: vec![3],
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = TrainingConfig {
            network: NetworkConfig {
                layer_widths: vec![3, 0, 2],
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_learning_rate() {
        let config = TrainingConfig {
            sgd: SgdConfig {
                learning_rate: 0.0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_mutation_rate() {
        let mut config = TrainingConfig::default();
        config.evolution.mutation_rate = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_toml_roundtrip() {
        let toml = r#"
            seed = 42

            [network]
            layer_widths = [4, 8, 2]
            activation = "Tanh"

            [network.init.Gaussian]
            mean = 0.0
            std_dev = 0.5

            [sgd]
            epochs = 10
            batch_size = 4
            learning_rate = 0.1

            [evolution]
            population_count = 16
            cross_points = 2
            cross_offset = 0
            mutation_rate = 0.05
            elite_count = 1

            [evolution.init.Gaussian]
            mean = 0.0
            std_dev = 1.0
            mean_delta = 0.0
            std_dev_delta = 0.1
        "#;
        let config = TrainingConfig::from_toml(toml).unwrap();
        assert_eq!(config.network.layer_widths, vec![4, 8, 2]);
        assert_eq!(config.network.activation, Activation::Tanh);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.evolution.population_count, 16);
    }

    #[test]
    fn test_from_toml_rejects_invalid() {
        let toml = r#"
            [network]
            layer_widths = [4]
            activation = "Tanh"

            [network.init.Gaussian]
            mean = 0.0
            std_dev = 0.5

            [sgd]
            epochs = 10
            batch_size = 4
            learning_rate = 0.1

            [evolution]
            population_count = 16
            cross_points = 2
            cross_offset = 0
            mutation_rate = 0.05
            elite_count = 1

            [evolution.init.Gaussian]
            mean = 0.0
            std_dev = 1.0
            mean_delta = 0.0
            std_dev_delta = 0.1
        "#;
        assert!(TrainingConfig::from_toml(toml).is_err());
    }

    #[test]
    fn test_fingerprint_consistency() {
        let config1 = TrainingConfig::default();
        let config2 = TrainingConfig::default();
        assert_eq!(config1.fingerprint(), config2.fingerprint());

        let mut changed = TrainingConfig::default();
        changed.sgd.learning_rate = 0.2;
        assert_ne!(config1.fingerprint(), changed.fingerprint());
    }
}
