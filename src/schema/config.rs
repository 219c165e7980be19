//! Configuration types for the genetic route search.

use serde::{Deserialize, Serialize};

/// Top-level search configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Number of individuals in every generation.
    #[serde(default = "default_population_size")]
    pub population_size: usize,
    /// Probability of mutating each interior gene (0.0-1.0).
    #[serde(default = "default_mutation_rate")]
    pub mutation_rate: f32,
    /// Probability of recombining two parents instead of copying the first (0.0-1.0).
    #[serde(default = "default_crossover_rate")]
    pub crossover_rate: f32,
    /// Maximum number of evaluated generations.
    #[serde(default = "default_max_generations")]
    pub max_generations: usize,
    /// Number of best individuals copied unchanged into the next generation.
    #[serde(default = "default_elitism_count")]
    pub elitism_count: usize,
    /// Stop after this many consecutive generations without a change in best fitness.
    #[serde(default = "default_stagnation_limit")]
    pub stagnation_limit: usize,
    /// Best fitness differences at or below this value count as "unchanged".
    #[serde(default)]
    pub stagnation_tolerance: f32,
    /// Stop early once best fitness reaches this value.
    #[serde(default)]
    pub target_fitness: Option<f32>,
    /// Upper bound on random walk steps during initialization.
    #[serde(default)]
    pub max_walk_steps: Option<usize>,
    /// Parent selection strategy.
    #[serde(default)]
    pub selection: SelectionMethod,
    /// Chromosome representation strategy.
    #[serde(default)]
    pub representation: Representation,
    /// Fitness scaling.
    #[serde(default)]
    pub fitness: FitnessConfig,
    /// Random seed for reproducibility.
    #[serde(default)]
    pub random_seed: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            population_size: default_population_size(),
            mutation_rate: default_mutation_rate(),
            crossover_rate: default_crossover_rate(),
            max_generations: default_max_generations(),
            elitism_count: default_elitism_count(),
            stagnation_limit: default_stagnation_limit(),
            stagnation_tolerance: 0.0,
            target_fitness: None,
            max_walk_steps: None,
            selection: SelectionMethod::default(),
            representation: Representation::default(),
            fitness: FitnessConfig::default(),
            random_seed: None,
        }
    }
}

fn default_population_size() -> usize {
    20
}
fn default_mutation_rate() -> f32 {
    0.05
}
fn default_crossover_rate() -> f32 {
    1.0
}
fn default_max_generations() -> usize {
    1000
}
fn default_elitism_count() -> usize {
    2
}
fn default_stagnation_limit() -> usize {
    50
}

/// Parent selection method.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "method")]
pub enum SelectionMethod {
    /// Fitness-proportionate sampling over a cumulative distribution.
    RouletteWheel,
    /// Probability proportional to rank (best has rank N).
    RankBased,
    /// Best of `size` uniformly drawn individuals.
    Tournament {
        #[serde(default = "default_tournament_size")]
        size: usize,
    },
    /// Both parents drawn uniformly; elitism supplies the selection pressure.
    UniformPairs,
}

impl Default for SelectionMethod {
    fn default() -> Self {
        Self::RouletteWheel
    }
}

fn default_tournament_size() -> usize {
    3
}

/// How routes are encoded as chromosomes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "type")]
pub enum Representation {
    /// Routes grow and shrink freely; recombination repairs broken links
    /// and mutation follows the predecessor's neighbors.
    #[default]
    VariableLength,
    /// Every route has exactly `chromosome_length` genes; mutation picks
    /// any waypoint in the graph.
    FixedLength { chromosome_length: usize },
}

/// Fitness scaling parameters.
///
/// `fitness = scale * validity / (length + goal_distance + epsilon)`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitnessConfig {
    /// Numerator of the reciprocal score.
    #[serde(default = "default_fitness_scale")]
    pub scale: f32,
    /// Floor added to the denominator.
    #[serde(default = "default_fitness_epsilon")]
    pub epsilon: f32,
}

impl Default for FitnessConfig {
    fn default() -> Self {
        Self {
            scale: default_fitness_scale(),
            epsilon: default_fitness_epsilon(),
        }
    }
}

fn default_fitness_scale() -> f32 {
    1.0
}
fn default_fitness_epsilon() -> f32 {
    1e-6
}

impl SearchConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.population_size == 0 {
            return Err(ConfigError::EmptyPopulation);
        }
        if let Representation::FixedLength { chromosome_length } = self.representation
            && chromosome_length < 2
        {
            return Err(ConfigError::InvalidChromosomeLength(chromosome_length));
        }
        if self.max_generations == 0 {
            return Err(ConfigError::NoGenerations);
        }
        if self.stagnation_limit == 0 {
            return Err(ConfigError::NoStagnationLimit);
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(ConfigError::InvalidRate {
                name: "mutation_rate",
                value: self.mutation_rate,
            });
        }
        if !(0.0..=1.0).contains(&self.crossover_rate) {
            return Err(ConfigError::InvalidRate {
                name: "crossover_rate",
                value: self.crossover_rate,
            });
        }
        if !self.stagnation_tolerance.is_finite() || self.stagnation_tolerance < 0.0 {
            return Err(ConfigError::InvalidTolerance(self.stagnation_tolerance));
        }
        if let SelectionMethod::Tournament { size: 0 } = self.selection {
            return Err(ConfigError::EmptyTournament);
        }
        if !self.fitness.scale.is_finite() || self.fitness.scale <= 0.0 {
            return Err(ConfigError::InvalidFitnessScale(self.fitness.scale));
        }
        if !self.fitness.epsilon.is_finite() || self.fitness.epsilon <= 0.0 {
            return Err(ConfigError::InvalidEpsilon(self.fitness.epsilon));
        }
        Ok(())
    }

    /// Elitism clamped to the population size.
    #[inline]
    pub fn effective_elitism(&self) -> usize {
        self.elitism_count.min(self.population_size)
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Population size must be non-zero")]
    EmptyPopulation,
    #[error("Chromosome length must be at least 2, got {0}")]
    InvalidChromosomeLength(usize),
    #[error("Maximum generations must be non-zero")]
    NoGenerations,
    #[error("Stagnation limit must be non-zero")]
    NoStagnationLimit,
    #[error("{name} must be within [0, 1], got {value}")]
    InvalidRate { name: &'static str, value: f32 },
    #[error("Stagnation tolerance must be finite and non-negative, got {0}")]
    InvalidTolerance(f32),
    #[error("Tournament size must be non-zero")]
    EmptyTournament,
    #[error("Fitness scale must be positive, got {0}")]
    InvalidFitnessScale(f32),
    #[error("Fitness epsilon must be positive, got {0}")]
    InvalidEpsilon(f32),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = SearchConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.population_size, 20);
        assert_eq!(config.elitism_count, 2);
        assert_eq!(config.stagnation_limit, 50);
    }

    #[test]
    fn test_zero_population_rejected() {
        let config = SearchConfig {
            population_size: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::EmptyPopulation));
    }

    #[test]
    fn test_chromosome_length_rejected() {
        for len in [0, 1] {
            let config = SearchConfig {
                representation: Representation::FixedLength {
                    chromosome_length: len,
                },
                ..Default::default()
            };
            assert_eq!(
                config.validate(),
                Err(ConfigError::InvalidChromosomeLength(len))
            );
        }
    }

    #[test]
    fn test_rates_rejected() {
        let config = SearchConfig {
            mutation_rate: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidRate {
                name: "mutation_rate",
                ..
            })
        ));

        let config = SearchConfig {
            crossover_rate: -0.1,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidRate {
                name: "crossover_rate",
                ..
            })
        ));
    }

    #[test]
    fn test_effective_elitism() {
        let config = SearchConfig {
            population_size: 3,
            elitism_count: 10,
            ..Default::default()
        };
        assert_eq!(config.effective_elitism(), 3);
    }

    #[test]
    fn test_serialization() {
        let config = SearchConfig {
            selection: SelectionMethod::Tournament { size: 4 },
            representation: Representation::FixedLength {
                chromosome_length: 6,
            },
            random_seed: Some(9),
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let parsed: SearchConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.selection, config.selection);
        assert_eq!(parsed.representation, config.representation);
        assert_eq!(parsed.random_seed, Some(9));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let parsed: SearchConfig =
            serde_json::from_str(r#"{"population_size": 64, "selection": {"method": "UniformPairs"}}"#)
                .unwrap();
        assert_eq!(parsed.population_size, 64);
        assert_eq!(parsed.selection, SelectionMethod::UniformPairs);
        assert_eq!(parsed.max_generations, 1000);
        assert_eq!(parsed.representation, Representation::VariableLength);
    }
}
