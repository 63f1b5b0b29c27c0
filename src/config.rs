//! Search parameters.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::error::ConfigError;

/// Parameters of a μ+λ NSGA-II run.
///
/// Every field has a default, so only the ones that differ need to be set:
/// ```
/// # use ruleorder::SearchConfig;
/// let config = SearchConfig::builder()
///   .population_size(100)
///   .generations(50)
///   .build();
/// assert!(config.validate().is_ok());
/// assert_eq!(config.offspring_count(), 200);
/// ```
#[derive(TypedBuilder, Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SearchConfig {
  /// Number of individuals kept between generations (μ).
  #[builder(default = 50)]
  pub population_size: usize,
  /// Number of generations to run.
  #[builder(default = 30)]
  pub generations: usize,
  /// Probability that an offspring is created by crossover.
  #[builder(default = 0.7)]
  pub crossover_probability: f64,
  /// Probability that an offspring is created by mutation.
  #[builder(default = 0.3)]
  pub mutation_probability: f64,
  /// Per-position swap probability of the mutation operator.
  #[builder(default = 0.05)]
  pub mutation_index_probability: f64,
  /// Offspring per generation as a multiple of `population_size` (λ / μ).
  #[builder(default = 2)]
  pub offspring_multiplier: usize,
  /// Seed of the random number generator.
  #[builder(default = 42)]
  pub seed: u64,
  /// Evaluate offspring batches on the rayon thread pool.
  #[builder(default = false)]
  pub parallel: bool,
}

impl Default for SearchConfig {
  fn default() -> Self {
    Self::builder().build()
  }
}

impl SearchConfig {
  /// Returns the number of offspring created per generation (λ).
  pub fn offspring_count(&self) -> usize {
    self.population_size.saturating_mul(self.offspring_multiplier)
  }

  /// Checks that every parameter is within its domain.
  pub fn validate(&self) -> Result<(), ConfigError> {
    positive("population_size", self.population_size)?;
    positive("generations", self.generations)?;
    positive("offspring_multiplier", self.offspring_multiplier)?;
    probability("crossover_probability", self.crossover_probability)?;
    probability("mutation_probability", self.mutation_probability)?;
    probability(
      "mutation_index_probability",
      self.mutation_index_probability,
    )?;
    let sum = self.crossover_probability + self.mutation_probability;
    if sum > 1.0 {
      return Err(ConfigError::InvalidValue {
        field: "mutation_probability",
        reason: format!(
          "crossover and mutation probabilities sum to {sum}, must not \
           exceed 1"
        ),
      });
    }
    Ok(())
  }
}

fn positive(field: &'static str, value: usize) -> Result<(), ConfigError> {
  if value == 0 {
    return Err(ConfigError::InvalidValue {
      field,
      reason: "must be positive".into(),
    });
  }
  Ok(())
}

/// Checks that `value` is a probability, i.e. lies in `[0, 1]`.
pub(crate) fn probability(
  field: &'static str,
  value: f64,
) -> Result<(), ConfigError> {
  if !(0.0..=1.0).contains(&value) {
    return Err(ConfigError::InvalidValue {
      field,
      reason: format!("{value} is not a probability"),
    });
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn invalid_field(config: SearchConfig) -> &'static str {
    match config.validate() {
      Err(ConfigError::InvalidValue { field, .. }) => field,
      Ok(()) => panic!("{config:?} must be invalid"),
    }
  }

  #[test]
  fn test_defaults() {
    let config = SearchConfig::default();
    assert_eq!(config.population_size, 50);
    assert_eq!(config.generations, 30);
    assert_eq!(config.crossover_probability, 0.7);
    assert_eq!(config.mutation_probability, 0.3);
    assert_eq!(config.mutation_index_probability, 0.05);
    assert_eq!(config.offspring_multiplier, 2);
    assert_eq!(config.seed, 42);
    assert!(!config.parallel);
    assert_eq!(config.offspring_count(), 100);
    assert!(config.validate().is_ok());
  }

  #[test]
  fn test_validation_rejects_out_of_range_values() {
    let b = SearchConfig::builder;
    assert_eq!(
      invalid_field(b().population_size(0).build()),
      "population_size"
    );
    assert_eq!(invalid_field(b().generations(0).build()), "generations");
    assert_eq!(
      invalid_field(b().offspring_multiplier(0).build()),
      "offspring_multiplier"
    );
    assert_eq!(
      invalid_field(b().crossover_probability(1.5).build()),
      "crossover_probability"
    );
    assert_eq!(
      invalid_field(b().mutation_index_probability(f64::NAN).build()),
      "mutation_index_probability"
    );
    assert_eq!(
      invalid_field(
        b().crossover_probability(0.8).mutation_probability(0.3).build()
      ),
      "mutation_probability"
    );
  }

  #[test]
  fn test_boundary_probabilities_are_valid() {
    let config = SearchConfig::builder()
      .crossover_probability(1.0)
      .mutation_probability(0.0)
      .mutation_index_probability(1.0)
      .build();
    assert!(config.validate().is_ok());
  }
}
