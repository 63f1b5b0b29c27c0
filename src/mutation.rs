//! Mutation operators for rule orderings.

use rand::Rng;

use crate::{
  config::probability, error::ConfigError, individual::Individual, SearchRng,
};

/// An operator that mutates a single individual in place.
///
/// Implementations must keep the ordering a permutation and must go through
/// [`Individual::genes_mut`] so that fitness is invalidated.
///
/// # Examples
/// ```
/// # use ruleorder::{Individual, SearchRng};
/// // reverses the whole ordering
/// let m = |i: &mut Individual, _: &mut SearchRng| i.genes_mut().reverse();
/// # fn takes_mutation<M: ruleorder::mutation::Mutation>(_: M) {}
/// # takes_mutation(m);
/// ```
///
/// **Note that you always can implement this trait instead of using closures.**
pub trait Mutation {
  /// Mutates given individual.
  fn mutate(&self, individual: &mut Individual, rng: &mut SearchRng);
}

impl<F> Mutation for F
where
  F: Fn(&mut Individual, &mut SearchRng),
{
  fn mutate(&self, individual: &mut Individual, rng: &mut SearchRng) {
    self(individual, rng)
  }
}

/// Shuffles indices of an ordering: every position, with probability
/// `indpb`, swaps its rule with another randomly chosen position.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct ShuffleIndexes {
  indpb: f64,
}

impl ShuffleIndexes {
  /// Creates the operator with per-position swap probability `indpb`.
  ///
  /// # Errors
  ///
  /// Fails if `indpb` is `NaN` or lies outside of `[0, 1]`.
  pub fn new(indpb: f64) -> Result<Self, ConfigError> {
    probability("indpb", indpb)?;
    Ok(Self { indpb })
  }

  /// Returns per-position swap probability.
  pub fn indpb(&self) -> f64 {
    self.indpb
  }
}

impl Default for ShuffleIndexes {
  fn default() -> Self {
    Self { indpb: 0.05 }
  }
}

impl Mutation for ShuffleIndexes {
  fn mutate(&self, individual: &mut Individual, rng: &mut SearchRng) {
    let genes = individual.genes_mut();
    let size = genes.len();
    if size < 2 {
      return;
    }
    for i in 0..size {
      if rng.gen::<f64>() < self.indpb {
        // any position but `i`
        let mut j = rng.gen_range(0..size - 1);
        if j >= i {
          j += 1;
        }
        genes.swap(i, j);
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use proptest::prelude::*;
  use rand::{seq::SliceRandom, SeedableRng};

  use super::*;
  use crate::{individual::is_permutation_of, score::Fitness, workload::RuleId};

  fn takes_mutation<M: Mutation>(m: &M) {
    let mut ind = Individual::new((0..5).map(RuleId).collect());
    m.mutate(&mut ind, &mut SearchRng::seed_from_u64(0));
  }

  #[test]
  fn test_mutation_from_closure() {
    let m = |i: &mut Individual, _: &mut SearchRng| i.genes_mut().reverse();
    takes_mutation(&m);
    takes_mutation(&ShuffleIndexes::default());
  }

  #[test]
  fn test_shuffle_indexes_probability_bounds() {
    let rules: Vec<RuleId> = (0..10).map(RuleId).collect();
    let mut rng = SearchRng::seed_from_u64(5);

    let mut ind = Individual::new(rules.clone());
    ShuffleIndexes::new(0.0).unwrap().mutate(&mut ind, &mut rng);
    assert_eq!(ind.genes(), rules.as_slice());

    // ten random swaps
    let mut ind = Individual::new(rules.clone());
    ShuffleIndexes::new(1.0).unwrap().mutate(&mut ind, &mut rng);
    assert_ne!(ind.genes(), rules.as_slice());
    assert!(is_permutation_of(ind.genes(), &rules));
  }

  #[test]
  fn test_shuffle_indexes_rejects_invalid_probability() {
    for indpb in [3.0, -1.0, f64::NAN, f64::INFINITY] {
      assert!(matches!(
        ShuffleIndexes::new(indpb),
        Err(ConfigError::InvalidValue { field: "indpb", .. })
      ));
    }
    assert_eq!(ShuffleIndexes::new(1.0).unwrap().indpb(), 1.0);
    assert_eq!(ShuffleIndexes::new(0.0).unwrap().indpb(), 0.0);
    assert_eq!(ShuffleIndexes::default().indpb(), 0.05);
  }

  #[test]
  fn test_mutation_invalidates_fitness() {
    let mut ind = Individual::new((0..4).map(RuleId).collect());
    ind.set_fitness(Fitness::new(0.0, 0.0));
    let mut rng = SearchRng::seed_from_u64(9);
    ShuffleIndexes::new(0.5).unwrap().mutate(&mut ind, &mut rng);
    assert!(!ind.is_evaluated());
  }

  proptest! {
    #[test]
    fn test_shuffle_indexes_keeps_permutations(
      n in 0u32..40,
      indpb in 0.0f64..=1.0,
      seed in any::<u64>(),
    ) {
      let mut rng = SearchRng::seed_from_u64(seed);
      let rules: Vec<RuleId> = (0..n).map(RuleId).collect();
      let mut genes = rules.clone();
      genes.shuffle(&mut rng);
      let mut ind = Individual::new(genes);
      ShuffleIndexes::new(indpb).unwrap().mutate(&mut ind, &mut rng);
      prop_assert!(is_permutation_of(ind.genes(), &rules));
    }
  }
}
