//! Candidate rule orderings and population initialization.

use rand::seq::SliceRandom;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{score::Fitness, workload::RuleId, SearchRng};

/// A candidate solution: a permutation of all rule identifiers together with
/// its lazily computed fitness.
///
/// The permutation can only be changed through [`Individual::genes_mut`],
/// which resets the fitness, so a stale fitness can never survive a
/// modification.
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Individual {
  genes: Vec<RuleId>,
  fitness: Option<Fitness>,
}

impl Individual {
  /// Creates an unevaluated individual from a rule ordering.
  pub fn new(genes: Vec<RuleId>) -> Self {
    Self {
      genes,
      fitness: None,
    }
  }

  /// Returns the rule ordering.
  pub fn genes(&self) -> &[RuleId] {
    &self.genes
  }

  /// Returns a mutable view of the rule ordering and invalidates fitness.
  pub fn genes_mut(&mut self) -> &mut [RuleId] {
    self.fitness = None;
    &mut self.genes
  }

  /// Consumes the individual and returns its rule ordering.
  pub fn into_genes(self) -> Vec<RuleId> {
    self.genes
  }

  /// Returns the fitness, if this individual has been evaluated.
  pub fn fitness(&self) -> Option<Fitness> {
    self.fitness
  }

  /// Returns `true` if fitness is set.
  pub fn is_evaluated(&self) -> bool {
    self.fitness.is_some()
  }

  /// Sets fitness computed for the current ordering.
  pub fn set_fitness(&mut self, fitness: Fitness) {
    self.fitness = Some(fitness);
  }

  /// Resets fitness to unset.
  pub fn invalidate(&mut self) {
    self.fitness = None;
  }
}

/// Creates `size` individuals, each an independent uniformly random
/// permutation of `rule_ids`.
pub fn initial_population(
  rule_ids: &[RuleId],
  size: usize,
  rng: &mut SearchRng,
) -> Vec<Individual> {
  (0..size)
    .map(|_| {
      let mut genes = rule_ids.to_vec();
      genes.shuffle(rng);
      Individual::new(genes)
    })
    .collect()
}

/// Returns `true` if `genes` holds every rule of `rule_ids` exactly once.
pub fn is_permutation_of(genes: &[RuleId], rule_ids: &[RuleId]) -> bool {
  let mut a = genes.to_vec();
  let mut b = rule_ids.to_vec();
  a.sort_unstable();
  b.sort_unstable();
  a == b
}

#[cfg(test)]
mod tests {
  use rand::SeedableRng;

  use super::*;

  fn rule_ids(n: u32) -> Vec<RuleId> {
    (0..n).map(RuleId).collect()
  }

  #[test]
  fn test_genes_mut_invalidates_fitness() {
    let mut ind = Individual::new(rule_ids(3));
    ind.set_fitness(Fitness::new(1.0, 2.0));
    assert!(ind.is_evaluated());
    ind.genes_mut().swap(0, 2);
    assert_eq!(ind.fitness(), None);
    assert_eq!(ind.genes(), &[RuleId(2), RuleId(1), RuleId(0)]);
  }

  #[test]
  fn test_initial_population_is_made_of_permutations() {
    let ids = rule_ids(20);
    let mut rng = SearchRng::seed_from_u64(7);
    let population = initial_population(&ids, 30, &mut rng);
    assert_eq!(population.len(), 30);
    assert!(population
      .iter()
      .all(|ind| is_permutation_of(ind.genes(), &ids) && !ind.is_evaluated()));
    // with 20! possible orderings, identical shuffles mean a broken rng
    assert_ne!(population[0].genes(), population[1].genes());
  }

  #[test]
  fn test_initial_population_is_seeded() {
    let ids = rule_ids(10);
    let a = initial_population(&ids, 5, &mut SearchRng::seed_from_u64(42));
    let b = initial_population(&ids, 5, &mut SearchRng::seed_from_u64(42));
    assert_eq!(a, b);
  }

  #[test]
  fn test_is_permutation_of() {
    let ids = rule_ids(3);
    assert!(is_permutation_of(&[RuleId(2), RuleId(0), RuleId(1)], &ids));
    assert!(!is_permutation_of(&[RuleId(2), RuleId(2), RuleId(1)], &ids));
    assert!(!is_permutation_of(&[RuleId(2), RuleId(0)], &ids));
  }
}
