//! **ruleorder** searches for orderings of firewall rules that make packet
//! filtering cheaper. It runs a multi-objective genetic algorithm,
//! [NSGA-II], over permutations of rule identifiers and scores every
//! permutation with a simple scan model of a first-match firewall.
//!
//! Here's a [quick start example](#example) for the impatient.
//!
//! # The model
//!
//! A firewall compares a packet with its rules one by one, top to bottom,
//! until a rule matches. Given a [`Workload`] (rules with their historical
//! hit counts plus a log of packets, each with the rule it matched and the
//! time it took), a rule ordering is scored by [`FirewallModel`] with two
//! objectives:
//! - **average checks** - the mean over all packets of the matched rule's
//!   zero-based position multiplied by that rule's hit count. Minimized.
//! - **throughput** - packets per second derived from observed elapsed
//!   times. Maximized.
//!
//! Both values live in [`Fitness`], whose [`Fitness::WEIGHTS`] encode the
//! direction of each objective.
//!
//! # The search
//!
//! An [`Individual`] is a permutation of all rule identifiers. The search
//! keeps `μ` of them and, every generation, creates `λ` offspring with
//! **crossover**, **mutation** or plain **reproduction**, evaluates the new
//! ones and lets **selection** pick the best `μ` out of parents and
//! offspring. When the generation budget is spent the non-dominated members
//! of the last population form the Pareto front of the [`SearchResult`].
//!
//! Each of these steps is an **operator** represented by a trait, and each
//! trait is implemented by closures as well as by the structs this crate
//! provides:
//!
//! | Operator       | Trait         | Provided                          |
//! |:---------------|:-------------:|:---------------------------------:|
//! | **Evaluation** | [`Evaluate`]  | [`FirewallModel`]                 |
//! | **Crossover**  | [`Crossover`] | [`PartiallyMatched`], [`Ordered`] |
//! | **Mutation**   | [`Mutation`]  | [`ShuffleIndexes`]                |
//! | **Selection**  | [`Selector`]  | [`Nsga2Selection`]                |
//!
//! Operators are handed to the [`Nsga2`] optimizer through its builder. The
//! [`optimize`] function wires the provided ones for you.
//!
//! # Parallelization
//!
//! Evaluation is the only expensive step, so it is the only one that can be
//! parallelized. Calling `par_each()` or `par_batch()` on an evaluation
//! operator wraps it so that the optimizer evaluates offspring on the
//! [rayon] thread pool, one ordering or one batch of orderings per task.
//! Every random decision is still made by a single seeded generator, so a
//! parallel run returns exactly what a sequential one does.
//!
//! # Example
//!
//! ```
//! # fn main() -> ruleorder::Result<()> {
//! use ruleorder::{
//!   evaluation::FirewallModel, optimize, report::Comparison, SearchConfig,
//!   Workload,
//! };
//! // each record is a matched rule and the time it took to process the packet
//! let records = (0..200u32).map(|i| (i * i % 11, Some(0.001)));
//! let workload = Workload::from_matches(records);
//! let config = SearchConfig::builder()
//!   .population_size(20)
//!   .generations(10)
//!   .build();
//! let result = optimize(&workload, config)?;
//! let comparison = Comparison::against_baseline(
//!   &FirewallModel::new(&workload),
//!   &result,
//! )?;
//! // the rules are listed in first-seen order, which is hardly the best one
//! assert!(comparison.checks_reduction_percent() >= 0.0);
//! println!("{comparison}");
//! # Ok(())
//! # }
//! ```
//!
//! [NSGA-II]: https://sci2s.ugr.es/sites/default/files/files/Teaching/OtherPostGraduateCourses/Metaheuristicas/Deb_NSGAII.pdf
//! [`Evaluate`]: crate::evaluation::Evaluate
//! [`FirewallModel`]: crate::evaluation::FirewallModel
//! [`Crossover`]: crate::crossover::Crossover
//! [`PartiallyMatched`]: crate::crossover::PartiallyMatched
//! [`Ordered`]: crate::crossover::Ordered
//! [`Mutation`]: crate::mutation::Mutation
//! [`ShuffleIndexes`]: crate::mutation::ShuffleIndexes
//! [`Selector`]: crate::selection::Selector
//! [`Nsga2Selection`]: crate::selection::Nsga2Selection
//! [`Nsga2`]: crate::optimizer::nsga::Nsga2

#![warn(missing_docs)]

pub mod config;
pub mod crossover;
pub mod error;
pub mod evaluation;
mod execution;
pub mod individual;
pub mod mutation;
pub mod operator;
pub mod optimizer;
pub mod report;
pub mod score;
pub mod selection;
pub mod statistics;
pub mod workload;

use tracing::info;

pub use crate::{
  config::SearchConfig,
  error::{ConfigError, Error, OrderingError, Result, WorkloadError},
  individual::Individual,
  optimizer::SearchResult,
  score::Fitness,
  workload::{Packet, Rule, RuleId, Workload},
};
use crate::{
  crossover::PartiallyMatched,
  evaluation::FirewallModel,
  mutation::ShuffleIndexes,
  operator::IntoPar,
  optimizer::{nsga::Nsga2, Optimizer},
  selection::Nsga2Selection,
};

/// Random number generator that drives every random decision of a search.
pub type SearchRng = rand::rngs::StdRng;

/// Searches for rule orderings of `workload` with the provided operators:
/// [`FirewallModel`] evaluation, [`PartiallyMatched`] crossover,
/// [`ShuffleIndexes`] mutation and [`Nsga2Selection`].
///
/// Offspring are evaluated on the rayon thread pool if `config.parallel` is
/// set.
pub fn optimize(
  workload: &Workload,
  config: SearchConfig,
) -> Result<SearchResult> {
  config.validate()?;
  let model = FirewallModel::new(workload);
  let mutation = ShuffleIndexes::new(config.mutation_index_probability)?;
  info!(
    rules = workload.rule_count(),
    packets = workload.packets().len(),
    parallel = config.parallel,
    "optimizing rule order"
  );
  if config.parallel {
    Nsga2::builder()
      .config(config)
      .rule_ids(workload.rule_ids())
      .evaluator(model.par_batch())
      .crossover(PartiallyMatched)
      .mutation(mutation)
      .selector(Nsga2Selection)
      .build()
      .optimize()
  } else {
    Nsga2::builder()
      .config(config)
      .rule_ids(workload.rule_ids())
      .evaluator(model)
      .crossover(PartiallyMatched)
      .mutation(mutation)
      .selector(Nsga2Selection)
      .build()
      .optimize()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn workload() -> Workload {
    Workload::from_matches(
      [3u32, 1, 3, 2, 3, 1, 0, 3, 2, 3]
        .into_iter()
        .zip([0.002, 0.001, 0.003, 0.0, 0.001].into_iter().cycle())
        .map(|(rule, elapsed)| (rule, Some(elapsed))),
    )
  }

  #[test]
  fn test_optimize_sequential_and_parallel_agree() {
    let workload = workload();
    let config = SearchConfig::builder()
      .population_size(10)
      .generations(8)
      .build();
    let sequential = optimize(&workload, config).unwrap();
    let parallel = optimize(
      &workload,
      SearchConfig {
        parallel: true,
        ..config
      },
    )
    .unwrap();
    assert_eq!(sequential, parallel);
    assert_eq!(sequential.logbook.len(), 9);
    assert!(!sequential.pareto_front.is_empty());
  }

  #[test]
  fn test_optimize_rejects_invalid_config() {
    let config = SearchConfig::builder().population_size(0).build();
    assert!(matches!(
      optimize(&workload(), config).unwrap_err(),
      Error::Configuration(_)
    ));
  }
}
