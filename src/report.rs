//! Comparison of an optimized ordering with the workload's original one.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
  error::{Error, Result},
  evaluation::{Evaluation, FirewallModel},
  optimizer::SearchResult,
  workload::RuleId,
};

/// Detailed evaluations of the baseline (listed) rule order and of an
/// optimized order over the same workload.
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Comparison {
  /// The optimized ordering.
  pub ordering: Vec<RuleId>,
  /// Evaluation of the workload's rules in their listed order.
  pub baseline: Evaluation,
  /// Evaluation of `ordering`.
  pub optimized: Evaluation,
}

impl Comparison {
  /// Compares the baseline with `ordering`.
  pub fn new(model: &FirewallModel<'_>, ordering: &[RuleId]) -> Result<Self> {
    let baseline = model.evaluate_detailed(&model.workload().rule_ids())?;
    let optimized = model.evaluate_detailed(ordering)?;
    Ok(Self {
      ordering: ordering.to_vec(),
      baseline,
      optimized,
    })
  }

  /// Compares the baseline with the highest throughput member of the
  /// result's Pareto front.
  pub fn against_baseline(
    model: &FirewallModel<'_>,
    result: &SearchResult,
  ) -> Result<Self> {
    let best = result.best_by_throughput().ok_or(Error::EmptyFront)?;
    Self::new(model, best.genes())
  }

  /// Compares the baseline with the first member of the result's Pareto
  /// front.
  pub fn against_front(
    model: &FirewallModel<'_>,
    result: &SearchResult,
  ) -> Result<Self> {
    let first = result.pareto_front.first().ok_or(Error::EmptyFront)?;
    Self::new(model, first.genes())
  }

  /// Per-packet weighted checks under the baseline order.
  pub fn baseline_checks(&self) -> &[f64] {
    self.baseline.weighted_checks.as_deref().unwrap_or_default()
  }

  /// Per-packet weighted checks under the optimized order.
  pub fn optimized_checks(&self) -> &[f64] {
    self.optimized.weighted_checks.as_deref().unwrap_or_default()
  }

  /// How many percent more checks the baseline needs: positive when the
  /// optimized order is better. Infinite if the optimized order needs none.
  pub fn checks_reduction_percent(&self) -> f64 {
    (self.baseline.fitness.avg_checks / self.optimized.fitness.avg_checks
      - 1.0)
      * 100.0
  }

  /// Throughput change of the optimized order relative to the baseline, in
  /// percent.
  pub fn throughput_gain_percent(&self) -> f64 {
    (self.optimized.fitness.throughput / self.baseline.fitness.throughput
      - 1.0)
      * 100.0
  }
}

impl fmt::Display for Comparison {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let (b, o) = (self.baseline.fitness, self.optimized.fitness);
    writeln!(f, "{:<12}{:>16}{:>16}", "", "avg checks", "throughput")?;
    for (label, fitness) in [("baseline", b), ("optimized", o)] {
      writeln!(
        f,
        "{:<12}{:>16.3}{:>16.1}",
        label, fitness.avg_checks, fitness.throughput
      )?;
    }
    write!(
      f,
      "checks reduced by {:.2}%, throughput changed by {:.2}%",
      self.checks_reduction_percent(),
      self.throughput_gain_percent()
    )
  }
}
