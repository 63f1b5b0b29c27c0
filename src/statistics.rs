//! Per-generation population statistics.

use itertools::{Itertools, MinMaxResult};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::individual::Individual;

/// Minimum, mean and maximum of one objective over a population.
///
/// All three are `NaN` for a population without evaluated members.
#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ObjectiveStats {
  /// Smallest value.
  pub min: f64,
  /// Arithmetic mean.
  pub avg: f64,
  /// Largest value.
  pub max: f64,
}

impl ObjectiveStats {
  /// Computes statistics of given values.
  pub fn of<I>(values: I) -> Self
  where
    I: IntoIterator<Item = f64>,
  {
    let values: Vec<f64> = values.into_iter().collect();
    let (min, max) = match values.iter().copied().minmax_by(f64::total_cmp) {
      MinMaxResult::NoElements => return Self::empty(),
      MinMaxResult::OneElement(v) => (v, v),
      MinMaxResult::MinMax(min, max) => (min, max),
    };
    let avg = values.iter().sum::<f64>() / values.len() as f64;
    Self { min, avg, max }
  }

  fn empty() -> Self {
    Self {
      min: f64::NAN,
      avg: f64::NAN,
      max: f64::NAN,
    }
  }
}

/// Statistics recorded after a generation.
#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GenerationStats {
  /// Generation number, `0` for the initial population.
  pub generation: usize,
  /// Number of fitness evaluations performed in this generation.
  pub evaluations: usize,
  /// Statistics of `avg_checks`.
  pub avg_checks: ObjectiveStats,
  /// Statistics of `throughput`.
  pub throughput: ObjectiveStats,
}

impl GenerationStats {
  /// Computes statistics over the evaluated members of `population`.
  pub fn compute(
    generation: usize,
    evaluations: usize,
    population: &[Individual],
  ) -> Self {
    let fitnesses: Vec<_> =
      population.iter().filter_map(Individual::fitness).collect();
    if fitnesses.len() != population.len() {
      warn!(
        generation,
        skipped = population.len() - fitnesses.len(),
        "statistics skip unevaluated individuals"
      );
    }
    Self {
      generation,
      evaluations,
      avg_checks: ObjectiveStats::of(fitnesses.iter().map(|f| f.avg_checks)),
      throughput: ObjectiveStats::of(fitnesses.iter().map(|f| f.throughput)),
    }
  }
}

/// Ordered record of per-generation statistics.
#[derive(Clone, PartialEq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Logbook {
  entries: Vec<GenerationStats>,
}

impl Logbook {
  /// Creates an empty logbook.
  pub fn new() -> Self {
    Self::default()
  }

  /// Appends an entry.
  pub fn record(&mut self, stats: GenerationStats) {
    self.entries.push(stats);
  }

  /// Returns all entries in recording order.
  pub fn entries(&self) -> &[GenerationStats] {
    &self.entries
  }

  /// Returns the number of recorded generations.
  pub fn len(&self) -> usize {
    self.entries.len()
  }

  /// Returns `true` if nothing was recorded.
  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// Returns the latest entry.
  pub fn last(&self) -> Option<&GenerationStats> {
    self.entries.last()
  }

  /// Returns the total number of evaluations over all generations.
  pub fn total_evaluations(&self) -> usize {
    self.entries.iter().map(|e| e.evaluations).sum()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{score::Fitness, workload::RuleId};

  fn evaluated(checks: f64, throughput: f64) -> Individual {
    let mut ind = Individual::new(vec![RuleId(0)]);
    ind.set_fitness(Fitness::new(checks, throughput));
    ind
  }

  #[test]
  fn test_objective_stats() {
    let stats = ObjectiveStats::of([3.0, 1.0, 2.0]);
    assert_eq!(
      stats,
      ObjectiveStats {
        min: 1.0,
        avg: 2.0,
        max: 3.0
      }
    );

    let single = ObjectiveStats::of([4.0]);
    assert_eq!((single.min, single.avg, single.max), (4.0, 4.0, 4.0));

    let empty = ObjectiveStats::of(Vec::new());
    assert!(empty.min.is_nan() && empty.avg.is_nan() && empty.max.is_nan());
  }

  #[test]
  fn test_generation_stats_per_objective() {
    let population =
      vec![evaluated(1.0, 30.0), evaluated(3.0, 10.0), evaluated(2.0, 20.0)];
    let stats = GenerationStats::compute(4, 6, &population);
    assert_eq!(stats.generation, 4);
    assert_eq!(stats.evaluations, 6);
    assert_eq!((stats.avg_checks.min, stats.avg_checks.max), (1.0, 3.0));
    assert_eq!(stats.throughput.avg, 20.0);
  }

  #[test]
  fn test_logbook() {
    let mut logbook = Logbook::new();
    assert!(logbook.is_empty() && logbook.last().is_none());
    for generation in 0..3 {
      logbook.record(GenerationStats::compute(
        generation,
        generation + 1,
        &[evaluated(1.0, 1.0)],
      ));
    }
    assert_eq!(logbook.len(), 3);
    assert_eq!(logbook.last().map(|e| e.generation), Some(2));
    assert_eq!(logbook.total_evaluations(), 6);
    assert!(logbook
      .entries()
      .iter()
      .enumerate()
      .all(|(i, e)| e.generation == i));
  }
}
