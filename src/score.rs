//! Fitness values and Pareto dominance.

use std::cmp::Ordering;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of objectives every ordering is scored against.
pub const OBJECTIVE_NUM: usize = 2;

/// Two-objective fitness of a rule ordering.
///
/// `avg_checks` is minimized and `throughput` is maximized. The direction of
/// each objective is encoded by [`Fitness::WEIGHTS`]: dominance is decided on
/// the weighted values, where larger is always better.
#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Fitness {
  /// Mean number of weighted rule checks per packet.
  pub avg_checks: f64,
  /// Packets per second.
  pub throughput: f64,
}

impl Fitness {
  /// Direction weights: minimize `avg_checks`, maximize `throughput`.
  pub const WEIGHTS: [f64; OBJECTIVE_NUM] = [-1.0, 1.0];

  /// Creates a fitness value.
  pub fn new(avg_checks: f64, throughput: f64) -> Self {
    Self {
      avg_checks,
      throughput,
    }
  }

  /// Returns raw objective values in `(avg_checks, throughput)` order.
  pub fn values(&self) -> [f64; OBJECTIVE_NUM] {
    [self.avg_checks, self.throughput]
  }

  /// Returns objective values multiplied by their direction weights.
  pub fn weighted(&self) -> [f64; OBJECTIVE_NUM] {
    let values = self.values();
    std::array::from_fn(|i| values[i] * Self::WEIGHTS[i])
  }

  /// Returns `true` if `self` dominates `other`.
  pub fn dominates(&self, other: &Self) -> bool {
    self.weighted().dominance(&other.weighted()) == Ordering::Less
  }
}

/// Describes pareto dominance for arrays of weighted objective values.
pub(crate) trait ParetoDominance {
  /// Returns `Less` if `self` dominates `other`, `Greater` if `other`
  /// dominates `self`, otherwise `Equal`. `self` dominates `other` if none of
  /// its values is smaller than the respective `other` value and at least
  /// one of them is larger.
  fn dominance(&self, other: &Self) -> Ordering;
}

impl ParetoDominance for [f64] {
  fn dominance(&self, other: &Self) -> Ordering {
    let mut ord = Ordering::Equal;
    for (a, b) in self.iter().zip(other) {
      // larger weighted value is better, so reverse the comparison.
      // incomparable values (NaN) make the pair mutually non-dominated
      let Some(next_ord) = b.partial_cmp(a) else {
        return Ordering::Equal;
      };
      match (ord, next_ord) {
        (Ordering::Equal, next_ord) => ord = next_ord,
        (Ordering::Greater, Ordering::Less)
        | (Ordering::Less, Ordering::Greater) => return Ordering::Equal,
        _ => {}
      }
    }
    ord
  }
}

#[cfg(test)]
mod tests {
  use std::cmp::Ordering;

  use super::*;

  #[test]
  fn test_pareto_dominance() {
    assert_eq!([1.0, 2.0].dominance(&[1.0, 2.0]), Ordering::Equal);
    assert_eq!([2.0, 2.0].dominance(&[1.0, 2.0]), Ordering::Less);
    assert_eq!([1.0, 3.0].dominance(&[1.0, 2.0]), Ordering::Less);
    assert_eq!([1.0, 2.0].dominance(&[1.0, 3.0]), Ordering::Greater);
    assert_eq!([1.0, 3.0].dominance(&[2.0, 2.0]), Ordering::Equal);
    assert_eq!([f64::NAN, 3.0].dominance(&[2.0, 2.0]), Ordering::Equal);
    assert_eq!([1.0; 0].dominance(&[0.0; 0]), Ordering::Equal);
  }

  #[test]
  fn test_fitness_dominance_respects_directions() {
    let a = Fitness::new(5.0, 100.0);
    let b = Fitness::new(6.0, 90.0);
    let c = Fitness::new(6.0, 110.0);
    assert!(a.dominates(&b));
    assert!(!b.dominates(&a));
    assert!(!a.dominates(&c));
    assert!(!c.dominates(&a));
    assert!(!a.dominates(&a));
  }

  #[test]
  fn test_weighted_values() {
    assert_eq!(Fitness::new(3.0, 4.0).weighted(), [-3.0, 4.0]);
  }
}
