//! Search drivers and their results.

use std::cmp::Ordering;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
  error::Result,
  individual::Individual,
  score::Fitness,
  statistics::Logbook,
};

pub mod nsga;

/// Represents an abstract optimizer.
pub trait Optimizer: Sized {
  /// Runs `Optimizer` until the generation budget is spent, then returns
  /// the final population together with its Pareto front and statistics.
  fn optimize(self) -> Result<SearchResult>;
}

/// Outcome of a search run.
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SearchResult {
  /// The last population.
  pub population: Vec<Individual>,
  /// One entry per generation, generation `0` included.
  pub logbook: Logbook,
  /// Non-dominated members of the last population, in population order.
  pub pareto_front: Vec<Individual>,
}

impl SearchResult {
  /// Returns the front member with the highest throughput. Ties go to the
  /// lower `avg_checks`, then to the earlier member.
  pub fn best_by_throughput(&self) -> Option<&Individual> {
    self.best_by(|a, b| {
      b.throughput
        .total_cmp(&a.throughput)
        .then(a.avg_checks.total_cmp(&b.avg_checks))
    })
  }

  /// Returns the front member with the lowest `avg_checks`. Ties go to the
  /// higher throughput, then to the earlier member.
  pub fn best_by_checks(&self) -> Option<&Individual> {
    self.best_by(|a, b| {
      a.avg_checks
        .total_cmp(&b.avg_checks)
        .then(b.throughput.total_cmp(&a.throughput))
    })
  }

  // `min_by` keeps the first of equal elements
  fn best_by<F>(&self, mut cmp: F) -> Option<&Individual>
  where
    F: FnMut(&Fitness, &Fitness) -> Ordering,
  {
    self
      .pareto_front
      .iter()
      .filter_map(|i| i.fitness().map(|f| (i, f)))
      .min_by(|(_, a), (_, b)| cmp(a, b))
      .map(|(i, _)| i)
  }
}
