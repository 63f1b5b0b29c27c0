//! Fitness evaluation operators and the firewall simulation model.

use std::collections::HashMap;

use executor::EvaluationExecutor;
use rayon::prelude::*;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
  error::{Error, OrderingError, Result},
  execution::strategy::*,
  operator::{IntoPar, ParBatch, ParEach},
  score::Fitness,
  workload::{Packet, RuleId, Workload},
};

/// An operator that scores a single rule ordering.
///
/// Evaluation must be pure: the same ordering always yields the same fitness.
/// Returning an error aborts the search.
///
/// Can be applied in parallel to each ordering or to batches of orderings
/// by converting it into a parallelized operator with `par_each()` or
/// `par_batch()` methods.
///
/// # Examples
/// ```
/// # use ruleorder::{operator::IntoPar, Fitness, RuleId, Result};
/// // prefers orderings that put rule 0 first
/// let e = |o: &[RuleId]| -> Result<Fitness> {
///   let pos = o.iter().position(|r| *r == RuleId(0)).unwrap_or(o.len());
///   Ok(Fitness::new(pos as f64, 1.0))
/// };
/// let e = e.par_each();
/// ```
///
/// **Note that you always can implement this trait instead of using closures.**
pub trait Evaluate {
  /// Returns fitness of given ordering.
  fn evaluate(&self, ordering: &[RuleId]) -> Result<Fitness>;
}

impl<F> Evaluate for F
where
  F: Fn(&[RuleId]) -> Result<Fitness>,
{
  fn evaluate(&self, ordering: &[RuleId]) -> Result<Fitness> {
    self(ordering)
  }
}

impl<E: Evaluate> IntoPar for E {}

/// An operator that scores a whole batch of orderings at once. Must return
/// exactly one fitness per ordering, in the same order.
///
/// **Note that you always can implement this trait instead of using closures.**
pub trait Evaluator {
  /// Returns fitness of each given ordering.
  fn evaluate(&self, orderings: &[&[RuleId]]) -> Result<Vec<Fitness>>;
}

impl<F> Evaluator for F
where
  F: Fn(&[&[RuleId]]) -> Result<Vec<Fitness>>,
{
  fn evaluate(&self, orderings: &[&[RuleId]]) -> Result<Vec<Fitness>> {
    self(orderings)
  }
}

/// This private module prevents exposing the `Executor` to a user.
pub(crate) mod executor {
  use crate::{error::Result, score::Fitness, workload::RuleId};

  /// An internal evaluation executor.
  pub trait EvaluationExecutor<ExecutionStrategy> {
    /// Executes evaluations optionally parallelizing operator's application.
    /// Fails with the first error encountered.
    fn execute_evaluations(
      &self,
      orderings: &[&[RuleId]],
    ) -> Result<Vec<Fitness>>;
  }
}

impl<E> EvaluationExecutor<CustomExecutionStrategy> for E
where
  E: Evaluator,
{
  fn execute_evaluations(
    &self,
    orderings: &[&[RuleId]],
  ) -> Result<Vec<Fitness>> {
    self.evaluate(orderings)
  }
}

impl<E> EvaluationExecutor<SequentialExecutionStrategy> for E
where
  E: Evaluate,
{
  fn execute_evaluations(
    &self,
    orderings: &[&[RuleId]],
  ) -> Result<Vec<Fitness>> {
    orderings.iter().map(|o| self.evaluate(o)).collect()
  }
}

impl<E> EvaluationExecutor<ParallelEachExecutionStrategy> for ParEach<E>
where
  E: Evaluate + Sync,
{
  fn execute_evaluations(
    &self,
    orderings: &[&[RuleId]],
  ) -> Result<Vec<Fitness>> {
    orderings
      .par_iter()
      .map(|o| self.operator().evaluate(o))
      .collect()
  }
}

impl<E> EvaluationExecutor<ParallelBatchExecutionStrategy> for ParBatch<E>
where
  E: Evaluate + Sync,
{
  fn execute_evaluations(
    &self,
    orderings: &[&[RuleId]],
  ) -> Result<Vec<Fitness>> {
    let chunk_size = (orderings.len() / rayon::current_num_threads()).max(1);
    orderings
      .par_chunks(chunk_size)
      .flat_map_iter(|chunk| {
        chunk.iter().map(|o| self.operator().evaluate(o))
      })
      .collect()
  }
}

/// Labeled result of a simulation: fitness plus, in detailed mode, the
/// weighted number of checks each packet underwent.
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Evaluation {
  /// Fitness of the ordering.
  pub fitness: Fitness,
  /// Per-packet weighted checks, in workload order. Only filled by
  /// [`FirewallModel::evaluate_detailed`].
  pub weighted_checks: Option<Vec<f64>>,
}

/// Firewall scan model that scores rule orderings against a workload.
///
/// A packet matching the rule at position `i` costs `i * hit_count` weighted
/// checks. Throughput is the packet count divided by the mean of valid
/// elapsed-time samples, so it doesn't depend on the ordering.
#[derive(Clone, Copy, Debug)]
pub struct FirewallModel<'w> {
  workload: &'w Workload,
}

impl<'w> FirewallModel<'w> {
  /// Creates a model over a workload.
  pub fn new(workload: &'w Workload) -> Self {
    Self { workload }
  }

  /// Returns the underlying workload.
  pub fn workload(&self) -> &'w Workload {
    self.workload
  }

  /// Scores an ordering and also returns per-packet weighted checks.
  pub fn evaluate_detailed(&self, ordering: &[RuleId]) -> Result<Evaluation> {
    self.simulate(ordering, true)
  }

  /// Returns workload throughput in packets per second.
  ///
  /// Missing, zero and non-finite elapsed times are excluded from the mean.
  pub fn throughput(&self) -> Result<f64> {
    let packets = self.workload.packets();
    let (sum, count) = packets
      .iter()
      .filter_map(Packet::valid_elapsed)
      .fold((0.0, 0usize), |(sum, count), t| (sum + t, count + 1));
    if count == 0 {
      return Err(Error::DegenerateWorkload {
        packets: packets.len(),
      });
    }
    Ok(packets.len() as f64 / (sum / count as f64))
  }

  fn simulate(
    &self,
    ordering: &[RuleId],
    detailed: bool,
  ) -> Result<Evaluation> {
    let positions = self.positions(ordering)?;
    let throughput = self.throughput()?;

    let packets = self.workload.packets();
    let mut weighted_checks =
      detailed.then(|| Vec::with_capacity(packets.len()));
    let mut total = 0.0;
    for packet in packets {
      let match_index = *positions
        .get(&packet.rule)
        .ok_or(OrderingError::UnmatchedRule(packet.rule))?;
      let checks =
        match_index as f64 * self.workload.hit_count(packet.rule) as f64;
      total += checks;
      if let Some(wc) = weighted_checks.as_mut() {
        wc.push(checks);
      }
    }

    Ok(Evaluation {
      // `throughput()` guarantees at least one packet
      fitness: Fitness::new(total / packets.len() as f64, throughput),
      weighted_checks,
    })
  }

  // rule id -> zero-based position in `ordering`, rejecting anything that
  // isn't a permutation of the workload's rules
  fn positions(
    &self,
    ordering: &[RuleId],
  ) -> Result<HashMap<RuleId, usize>, OrderingError> {
    let expected = self.workload.rule_count();
    if ordering.len() != expected {
      return Err(OrderingError::LengthMismatch {
        expected,
        actual: ordering.len(),
      });
    }
    let mut positions = HashMap::with_capacity(expected);
    for (idx, &rule) in ordering.iter().enumerate() {
      if !self.workload.contains(rule) {
        return Err(OrderingError::UnknownRule(rule));
      }
      if positions.insert(rule, idx).is_some() {
        return Err(OrderingError::DuplicateRule(rule));
      }
    }
    Ok(positions)
  }
}

impl Evaluate for FirewallModel<'_> {
  fn evaluate(&self, ordering: &[RuleId]) -> Result<Fitness> {
    self.simulate(ordering, false).map(|e| e.fitness)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::workload::Rule;

  const A: RuleId = RuleId(0);
  const B: RuleId = RuleId(1);
  const C: RuleId = RuleId(2);

  fn workload() -> Workload {
    Workload::new(
      vec![Rule::new(A, 10), Rule::new(B, 1), Rule::new(C, 5)],
      vec![
        Packet::new(A, Some(0.001)),
        Packet::new(B, Some(0.002)),
        Packet::new(C, Some(0.0)),
        Packet::new(A, Some(0.001)),
      ],
    )
    .unwrap()
  }

  fn takes_evaluator<ES, E: EvaluationExecutor<ES>>(e: &E) {
    e.execute_evaluations(&[]).unwrap();
  }

  fn assert_close(a: f64, b: f64) {
    assert!((a - b).abs() <= 1e-9 * b.abs().max(1.0), "{a} != {b}");
  }

  #[test]
  fn test_evaluate_from_closure() {
    let e = |_: &[RuleId]| -> Result<Fitness> { Ok(Fitness::new(0.0, 0.0)) };
    takes_evaluator(&e);
    takes_evaluator(&e.par_each());
    takes_evaluator(&e.par_batch());
  }

  #[test]
  fn test_evaluator_from_closure() {
    let e = |os: &[&[RuleId]]| -> Result<Vec<Fitness>> {
      Ok(vec![Fitness::new(0.0, 0.0); os.len()])
    };
    takes_evaluator(&e);
  }

  #[test]
  fn test_custom_evaluator() {
    struct CustomEvaluator {}
    impl Evaluator for CustomEvaluator {
      fn evaluate(&self, os: &[&[RuleId]]) -> Result<Vec<Fitness>> {
        Ok(os.iter().map(|o| Fitness::new(o.len() as f64, 0.0)).collect())
      }
    }
    takes_evaluator(&CustomEvaluator {});
  }

  #[test]
  fn test_firewall_model_scores_orderings() {
    let workload = workload();
    let model = FirewallModel::new(&workload);

    let forward = model.evaluate(&[A, B, C]).unwrap();
    // weighted checks are [0 * 10, 1 * 1, 2 * 5, 0 * 10]
    assert_close(forward.avg_checks, 2.75);
    // zero elapsed time is excluded: 4 / mean([0.001, 0.002, 0.001])
    assert_close(forward.throughput, 3000.0);

    let backward = model.evaluate(&[C, B, A]).unwrap();
    // weighted checks are [2 * 10, 1 * 1, 0 * 5, 2 * 10]
    assert_close(backward.avg_checks, 10.25);
    assert_eq!(backward.throughput, forward.throughput);
  }

  #[test]
  fn test_evaluation_is_deterministic() {
    let workload = workload();
    let model = FirewallModel::new(&workload);
    let a = model.evaluate(&[B, C, A]).unwrap();
    let b = model.evaluate(&[B, C, A]).unwrap();
    assert_eq!(a.avg_checks.to_bits(), b.avg_checks.to_bits());
    assert_eq!(a.throughput.to_bits(), b.throughput.to_bits());
  }

  #[test]
  fn test_detailed_evaluation() {
    let workload = workload();
    let model = FirewallModel::new(&workload);
    let detailed = model.evaluate_detailed(&[A, B, C]).unwrap();
    assert_eq!(detailed.weighted_checks, Some(vec![0.0, 1.0, 10.0, 0.0]));
    assert_eq!(detailed.fitness, model.evaluate(&[A, B, C]).unwrap());
  }

  #[test]
  fn test_invalid_orderings_are_rejected() {
    let workload = workload();
    let model = FirewallModel::new(&workload);

    let err = model.evaluate(&[A, B]).unwrap_err();
    assert!(matches!(
      err,
      Error::InvalidOrdering(OrderingError::LengthMismatch {
        expected: 3,
        actual: 2
      })
    ));

    let err = model.evaluate(&[A, B, B]).unwrap_err();
    assert!(matches!(
      err,
      Error::InvalidOrdering(OrderingError::DuplicateRule(B))
    ));

    let err = model.evaluate(&[A, B, RuleId(9)]).unwrap_err();
    assert!(matches!(
      err,
      Error::InvalidOrdering(OrderingError::UnknownRule(RuleId(9)))
    ));
  }

  #[test]
  fn test_degenerate_workload() {
    let workload = Workload::new(
      vec![Rule::new(A, 1)],
      vec![Packet::new(A, Some(0.0)), Packet::new(A, None)],
    )
    .unwrap();
    let model = FirewallModel::new(&workload);
    assert!(matches!(
      model.evaluate(&[A]).unwrap_err(),
      Error::DegenerateWorkload { packets: 2 }
    ));

    let empty = Workload::new(vec![Rule::new(A, 1)], vec![]).unwrap();
    assert!(matches!(
      FirewallModel::new(&empty).evaluate(&[A]).unwrap_err(),
      Error::DegenerateWorkload { packets: 0 }
    ));
  }

  #[test]
  fn test_parallel_executors_match_sequential() {
    let workload = workload();
    let model = FirewallModel::new(&workload);
    let orderings: Vec<&[RuleId]> =
      vec![&[A, B, C], &[C, B, A], &[B, A, C], &[C, A, B], &[A, C, B]];

    let sequential =
      EvaluationExecutor::<SequentialExecutionStrategy>::execute_evaluations(
        &model, &orderings,
      )
      .unwrap();
    let each = model.par_each().execute_evaluations(&orderings).unwrap();
    let batch = model.par_batch().execute_evaluations(&orderings).unwrap();
    assert_eq!(sequential, each);
    assert_eq!(sequential, batch);
  }

  #[test]
  fn test_parallel_executor_propagates_errors() {
    let workload = workload();
    let model = FirewallModel::new(&workload);
    let orderings: Vec<&[RuleId]> = vec![&[A, B, C], &[A, A, A]];
    assert!(model.par_batch().execute_evaluations(&orderings).is_err());
  }
}
