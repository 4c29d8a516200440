//! Generational genetic algorithm over flat gene vectors.
//!
//! The lifecycle is populate, then per generation: fit, crossover, mutate,
//! replace. Fitness is injected per call rather than stored, so one
//! algorithm instance can be driven by different objectives and the
//! evaluation can fan out across threads.

use neurogen_math::Vector;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::error::{LearnError, Result};

/// Attempts to draw a second, distinct parent before accepting a duplicate.
const PARENT_REDRAW_LIMIT: usize = 8;

/// How genes are sampled at populate time and perturbed at mutate time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GeneDistribution {
    /// Per-gene bounds; mutation draws uniformly from `[value + min_delta,
    /// value + max_delta]` truncated into the global bounds. Zero deltas
    /// resample the gene anywhere within its global bounds instead.
    Uniform {
        min: Vector,
        max: Vector,
        min_delta: f64,
        max_delta: f64,
    },
    /// Scalar Gaussian; mutation adds a draw from
    /// `N(mean_delta, std_dev_delta)`.
    Gaussian {
        mean: f64,
        std_dev: f64,
        mean_delta: f64,
        std_dev_delta: f64,
    },
}

/// Hyperparameters of one [`GeneticAlgorithm`] instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaConfig {
    pub population_count: usize,
    pub gene_count: usize,
    /// 0 means uniform per-gene crossover.
    pub cross_points: usize,
    /// Rotation applied to gene indices before segment assignment.
    pub cross_offset: usize,
    /// Per-gene mutation probability in `[0, 1]`.
    pub mutation_rate: f64,
    /// Individuals carried verbatim into the next generation.
    pub elite_count: usize,
    pub distribution: GeneDistribution,
}

impl GaConfig {
    pub fn validate(&self) -> Result<()> {
        if self.population_count == 0 {
            return Err(LearnError::invalid_configuration(
                "population count must be positive",
            ));
        }
        if self.gene_count == 0 {
            return Err(LearnError::invalid_configuration(
                "gene count must be positive",
            ));
        }
        if self.elite_count > self.population_count {
            return Err(LearnError::invalid_configuration(format!(
                "elite count {} exceeds population count {}",
                self.elite_count, self.population_count
            )));
        }
        if self.cross_points >= self.gene_count {
            return Err(LearnError::invalid_configuration(format!(
                "{} cross points cannot partition {} genes",
                self.cross_points, self.gene_count
            )));
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(LearnError::invalid_configuration(format!(
                "mutation rate {} outside [0, 1]",
                self.mutation_rate
            )));
        }
        match &self.distribution {
            GeneDistribution::Uniform {
                min,
                max,
                min_delta,
                max_delta,
            } => {
                if min.len() != self.gene_count || max.len() != self.gene_count {
                    return Err(LearnError::invalid_configuration(format!(
                        "bound vectors of lengths {} and {} for {} genes",
                        min.len(),
                        max.len(),
                        self.gene_count
                    )));
                }
                if min
                    .as_slice()
                    .iter()
                    .zip(max.as_slice())
                    .any(|(lo, hi)| lo > hi)
                {
                    return Err(LearnError::invalid_configuration(
                        "uniform bounds must satisfy min <= max per gene",
                    ));
                }
                if min_delta > max_delta {
                    return Err(LearnError::invalid_configuration(
                        "mutation deltas must satisfy min_delta <= max_delta",
                    ));
                }
            }
            GeneDistribution::Gaussian {
                std_dev,
                std_dev_delta,
                ..
            } => {
                if !(std_dev.is_finite() && *std_dev >= 0.0) {
                    return Err(LearnError::invalid_configuration(format!(
                        "standard deviation {std_dev} must be finite and non-negative"
                    )));
                }
                if !(std_dev_delta.is_finite() && *std_dev_delta >= 0.0) {
                    return Err(LearnError::invalid_configuration(format!(
                        "mutation standard deviation {std_dev_delta} must be finite and non-negative"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// A gene vector plus the fitness from the latest evaluation, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Individual {
    pub genes: Vector,
    pub fitness: Option<f64>,
}

impl Individual {
    #[must_use]
    pub fn new(genes: Vector) -> Self {
        Self {
            genes,
            fitness: None,
        }
    }
}

/// Population state machine; see the module docs for the generation cycle.
#[derive(Debug, Clone)]
pub struct GeneticAlgorithm {
    config: GaConfig,
    population: Vec<Individual>,
    /// Cumulative roulette table aligned with the population order; empty
    /// until the first `fit`.
    proportions: Vec<f64>,
    generation: usize,
}

impl GeneticAlgorithm {
    /// Validates the configuration and samples the initial population.
    pub fn new<R: Rng + ?Sized>(config: GaConfig, rng: &mut R) -> Result<Self> {
        config.validate()?;
        let population = (0..config.population_count)
            .map(|_| Ok(Individual::new(sample_genes(&config, rng)?)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            config,
            population,
            proportions: Vec::new(),
            generation: 0,
        })
    }

    #[must_use]
    pub fn config(&self) -> &GaConfig {
        &self.config
    }

    #[must_use]
    pub fn generation(&self) -> usize {
        self.generation
    }

    #[must_use]
    pub fn population(&self) -> &[Individual] {
        &self.population
    }

    /// Cumulative selection table from the latest `fit`; non-decreasing,
    /// last entry 1.
    #[must_use]
    pub fn fitness_proportions(&self) -> &[f64] {
        &self.proportions
    }

    /// Best individual of the latest evaluated generation.
    #[must_use]
    pub fn best(&self) -> Option<&Individual> {
        self.population.iter().filter(|i| i.fitness.is_some()).max_by(
            |a, b| {
                a.fitness
                    .unwrap_or(f64::NEG_INFINITY)
                    .total_cmp(&b.fitness.unwrap_or(f64::NEG_INFINITY))
            },
        )
    }

    /// Top `n` individuals by fitness; only meaningful after `fit`, which
    /// leaves the population sorted descending.
    #[must_use]
    pub fn best_fit(&self, n: usize) -> &[Individual] {
        &self.population[..n.min(self.population.len())]
    }

    /// Evaluates every individual, sorts the population by descending
    /// fitness, and rebuilds the roulette selection table.
    ///
    /// A fitness error is fatal and leaves the population unevaluated.
    pub fn fit<F>(&mut self, fitness: &F) -> Result<()>
    where
        F: Fn(&Vector) -> Result<f64> + Sync,
    {
        Self::evaluate(&mut self.population, fitness)?;
        self.population.sort_by(|a, b| {
            b.fitness
                .unwrap_or(f64::NEG_INFINITY)
                .total_cmp(&a.fitness.unwrap_or(f64::NEG_INFINITY))
        });
        self.rebuild_proportions();
        Ok(())
    }

    /// Scores every individual in place; a fitness error or non-finite
    /// score is fatal.
    fn evaluate<F>(individuals: &mut [Individual], fitness: &F) -> Result<()>
    where
        F: Fn(&Vector) -> Result<f64> + Sync,
    {
        #[cfg(feature = "parallel")]
        let scores: Vec<f64> = individuals
            .par_iter()
            .map(|ind| fitness(&ind.genes))
            .collect::<Result<Vec<_>>>()?;

        #[cfg(not(feature = "parallel"))]
        let scores: Vec<f64> = individuals
            .iter()
            .map(|ind| fitness(&ind.genes))
            .collect::<Result<Vec<_>>>()?;

        if let Some(bad) = scores.iter().find(|s| !s.is_finite()) {
            return Err(LearnError::fitness(format!(
                "fitness function returned non-finite score {bad}"
            )));
        }

        for (ind, score) in individuals.iter_mut().zip(scores) {
            ind.fitness = Some(score);
        }
        Ok(())
    }

    /// Shifts scores so the minimum is non-negative, cumulates, and
    /// normalizes to 1. An all-zero table degenerates to uniform selection.
    fn rebuild_proportions(&mut self) {
        let scores: Vec<f64> = self
            .population
            .iter()
            .map(|i| i.fitness.unwrap_or(0.0))
            .collect();

        let min = scores.iter().copied().fold(f64::INFINITY, f64::min);
        let shift = if min < 0.0 {
            -min + neurogen_math::EPSILON
        } else {
            0.0
        };

        let total: f64 = scores.iter().map(|s| s + shift).sum();
        let n = scores.len();
        self.proportions.clear();
        self.proportions.reserve(n);

        let mut acc = 0.0;
        for s in &scores {
            acc += if total > 0.0 {
                (s + shift) / total
            } else {
                1.0 / n as f64
            };
            self.proportions.push(acc);
        }
        if let Some(last) = self.proportions.last_mut() {
            *last = 1.0;
        }
    }

    /// Roulette draw: uniform `r` in `[0, 1)`, first individual whose
    /// cumulative proportion reaches `r`.
    pub fn select_index<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        let r = rng.gen::<f64>();
        self.proportions
            .iter()
            .position(|&p| p >= r)
            .unwrap_or(self.population.len() - 1)
    }

    /// Multi-point crossover of two parents into two children.
    ///
    /// With `cross_points == 0` every gene's origin is a coin flip; otherwise
    /// the index space is cut into `cross_points + 1` equal segments whose
    /// origin alternates between parents, with indices rotated by
    /// `cross_offset` first.
    pub fn crossover<R: Rng + ?Sized>(
        &self,
        a: &Vector,
        b: &Vector,
        rng: &mut R,
    ) -> (Vector, Vector) {
        let n = self.config.gene_count;
        let mut child_a = a.clone();
        let mut child_b = b.clone();

        if self.config.cross_points == 0 {
            for k in 0..n {
                if rng.gen::<bool>() {
                    child_a[k] = b[k];
                    child_b[k] = a[k];
                }
            }
            return (child_a, child_b);
        }

        let segments = self.config.cross_points + 1;
        let segment_len = n.div_ceil(segments);
        for k in 0..n {
            let rotated = (k + self.config.cross_offset) % n;
            if (rotated / segment_len) % 2 == 1 {
                child_a[k] = b[k];
                child_b[k] = a[k];
            }
        }
        (child_a, child_b)
    }

    /// Mutates genes in place: each gene changes with probability
    /// `mutation_rate`, per the configured distribution.
    pub fn mutate<R: Rng + ?Sized>(&self, genes: &mut Vector, rng: &mut R) -> Result<()> {
        match &self.config.distribution {
            GeneDistribution::Uniform {
                min,
                max,
                min_delta,
                max_delta,
            } => {
                // Zero deltas mean "resample anywhere in the global bounds".
                let resample = *min_delta == 0.0 && *max_delta == 0.0;
                for k in 0..genes.len() {
                    if rng.gen::<f64>() >= self.config.mutation_rate {
                        continue;
                    }
                    let (lo, hi) = if resample {
                        (min[k], max[k])
                    } else {
                        // The delta window is truncated into the global
                        // bounds before the draw.
                        (
                            (genes[k] + min_delta).clamp(min[k], max[k]),
                            (genes[k] + max_delta).clamp(min[k], max[k]),
                        )
                    };
                    genes[k] = lo + (hi - lo) * rng.gen::<f64>();
                }
            }
            GeneDistribution::Gaussian {
                mean_delta,
                std_dev_delta,
                ..
            } => {
                let normal = Normal::new(*mean_delta, *std_dev_delta).map_err(|e| {
                    LearnError::invalid_configuration(format!("mutation distribution: {e}"))
                })?;
                for k in 0..genes.len() {
                    if rng.gen::<f64>() < self.config.mutation_rate {
                        genes[k] += normal.sample(rng);
                    }
                }
            }
        }
        Ok(())
    }

    /// One full generation: fit, breed by roulette selection and crossover,
    /// mutate and score the offspring, then replace the population with the
    /// `elite_count` best elders displacing the worst-scored offspring.
    pub fn step<F, R>(&mut self, fitness: &F, rng: &mut R) -> Result<()>
    where
        F: Fn(&Vector) -> Result<f64> + Sync,
        R: Rng + ?Sized,
    {
        self.fit(fitness)?;

        let count = self.config.population_count;
        let mut offspring: Vec<Individual> = Vec::with_capacity(count);
        while offspring.len() < count {
            let first = self.select_index(rng);
            let mut second = self.select_index(rng);
            for _ in 0..PARENT_REDRAW_LIMIT {
                if second != first {
                    break;
                }
                second = self.select_index(rng);
            }

            let (child_a, child_b) = self.crossover(
                &self.population[first].genes,
                &self.population[second].genes,
                rng,
            );
            offspring.push(Individual::new(child_a));
            if offspring.len() < count {
                offspring.push(Individual::new(child_b));
            }
        }

        for child in &mut offspring {
            self.mutate(&mut child.genes, rng)?;
        }

        // Offspring are scored and sorted ascending, so the elders displace
        // the worst-scored children, never the strongest.
        let elites = self.config.elite_count;
        if elites > 0 {
            Self::evaluate(&mut offspring, fitness)?;
            offspring.sort_by(|a, b| {
                a.fitness
                    .unwrap_or(f64::NEG_INFINITY)
                    .total_cmp(&b.fitness.unwrap_or(f64::NEG_INFINITY))
            });
            for i in 0..elites {
                offspring[i] = self.population[i].clone();
            }
        }

        let best = self.population[0].fitness.unwrap_or(f64::NAN);
        self.population = offspring;
        self.generation += 1;
        tracing::debug!(
            generation = self.generation,
            best_fitness = best,
            "generation replaced"
        );
        Ok(())
    }

    /// Runs `generations` full steps.
    pub fn run<F, R>(&mut self, generations: usize, fitness: &F, rng: &mut R) -> Result<()>
    where
        F: Fn(&Vector) -> Result<f64> + Sync,
        R: Rng + ?Sized,
    {
        for _ in 0..generations {
            self.step(fitness, rng)?;
        }
        Ok(())
    }
}

fn sample_genes<R: Rng + ?Sized>(config: &GaConfig, rng: &mut R) -> Result<Vector> {
    match &config.distribution {
        GeneDistribution::Uniform { min, max, .. } => Ok(Vector::random(min, max, rng)?),
        GeneDistribution::Gaussian { mean, std_dev, .. } => Ok(Vector::random_normal(
            *mean,
            *std_dev,
            config.gene_count,
            rng,
        )?),
    }
}
