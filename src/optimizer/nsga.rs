//! Implementation of the NSGA-II genetic algorithm in its μ+λ form.

use std::marker::PhantomData;

use rand::{seq::index, Rng, SeedableRng};
use tracing::{debug, info};
use typed_builder::TypedBuilder;

use crate::{
  config::SearchConfig,
  crossover::Crossover,
  error::{Error, Result},
  evaluation::executor::EvaluationExecutor,
  individual::{initial_population, Individual},
  mutation::Mutation,
  optimizer::{Optimizer, SearchResult},
  selection::{pareto_front, Selector},
  statistics::{GenerationStats, Logbook},
  workload::RuleId,
  SearchRng,
};

/// NSGA-II optimizer.
///
/// Every generation creates `λ = μ × offspring_multiplier` offspring from
/// the current `μ` individuals, evaluates the ones that lack fitness and
/// lets the selector pick `μ` survivors out of parents and offspring.
///
/// An offspring is produced by crossover of two distinct random parents
/// with probability `crossover_probability` (the first child is kept), by
/// mutation of a random parent with probability `mutation_probability`, or
/// as an unmodified copy of a random parent otherwise. Copies keep their
/// fitness and aren't evaluated again.
///
/// All randomness comes from a single generator seeded with
/// [`SearchConfig::seed`], so a run is reproducible regardless of the
/// evaluation strategy.
///
/// # Examples
/// ```
/// # use ruleorder::{
/// #   crossover::PartiallyMatched, evaluation::FirewallModel,
/// #   mutation::ShuffleIndexes, optimizer::{nsga::Nsga2, Optimizer},
/// #   selection::Nsga2Selection, Packet, Rule, RuleId, SearchConfig,
/// #   Workload,
/// # };
/// let (a, b, c) = (RuleId(0), RuleId(1), RuleId(2));
/// let workload = Workload::new(
///   vec![Rule::new(a, 1), Rule::new(b, 5), Rule::new(c, 3)],
///   vec![Packet::new(b, Some(0.002)), Packet::new(c, Some(0.001))],
/// )?;
/// let result = Nsga2::builder()
///   .config(SearchConfig::builder().population_size(8).generations(5).build())
///   .rule_ids(workload.rule_ids())
///   .evaluator(FirewallModel::new(&workload))
///   .crossover(PartiallyMatched)
///   .mutation(ShuffleIndexes::default())
///   .selector(Nsga2Selection)
///   .build()
///   .optimize()?;
/// assert_eq!(result.logbook.len(), 6);
/// # Ok::<(), ruleorder::Error>(())
/// ```
#[derive(TypedBuilder, Debug)]
pub struct Nsga2<
  Eva: EvaluationExecutor<EvaExecStrat>,
  Crs: Crossover,
  Mut: Mutation,
  Sel: Selector,
  EvaExecStrat,
> {
  #[builder(default)]
  config: SearchConfig,
  rule_ids: Vec<RuleId>,
  #[builder(default, setter(strip_option, doc = "
Sets the initial population, replacing the random one.

Its size is used as `μ` instead of `population_size`."))]
  population: Option<Vec<Individual>>,
  evaluator: Eva,
  crossover: Crs,
  mutation: Mut,
  selector: Sel,
  #[builder(setter(skip), default)]
  _eva_es: PhantomData<EvaExecStrat>,
}

impl<Eva, Crs, Mut, Sel, EvaExecStrat> Optimizer
  for Nsga2<Eva, Crs, Mut, Sel, EvaExecStrat>
where
  Eva: EvaluationExecutor<EvaExecStrat>,
  Crs: Crossover,
  Mut: Mutation,
  Sel: Selector,
{
  fn optimize(mut self) -> Result<SearchResult> {
    self.config.validate()?;
    let mut rng = SearchRng::seed_from_u64(self.config.seed);

    let mut population = match self.population.take() {
      Some(population) => population,
      None => initial_population(
        &self.rule_ids,
        self.config.population_size,
        &mut rng,
      ),
    };
    let mu = population.len();
    let lambda = mu.saturating_mul(self.config.offspring_multiplier);
    info!(
      rules = self.rule_ids.len(),
      mu,
      lambda,
      generations = self.config.generations,
      "starting search"
    );

    let mut logbook = Logbook::new();
    let evaluations = self.evaluate(&mut population)?;
    self.record(&mut logbook, 0, evaluations, &population);

    for generation in 1..=self.config.generations {
      let mut offspring = self.vary(&population, lambda, &mut rng);
      let evaluations = self.evaluate(&mut offspring)?;
      debug!(
        generation,
        offspring = offspring.len(),
        evaluations,
        "offspring evaluated"
      );

      population.append(&mut offspring);
      population = self.selector.select(population, mu)?;
      self.record(&mut logbook, generation, evaluations, &population);
    }

    let pareto_front = pareto_front(&population)?;
    if pareto_front.is_empty() {
      return Err(Error::EmptyFront);
    }
    info!(
      front = pareto_front.len(),
      evaluations = logbook.total_evaluations(),
      "search finished"
    );
    Ok(SearchResult {
      population,
      logbook,
      pareto_front,
    })
  }
}

impl<Eva, Crs, Mut, Sel, EvaExecStrat> Nsga2<Eva, Crs, Mut, Sel, EvaExecStrat>
where
  Eva: EvaluationExecutor<EvaExecStrat>,
  Crs: Crossover,
  Mut: Mutation,
  Sel: Selector,
{
  /// Evaluates individuals without fitness and returns how many there were.
  fn evaluate(&self, individuals: &mut [Individual]) -> Result<usize> {
    let pending: Vec<usize> = individuals
      .iter()
      .enumerate()
      .filter(|(_, ind)| !ind.is_evaluated())
      .map(|(idx, _)| idx)
      .collect();
    if pending.is_empty() {
      return Ok(0);
    }

    let orderings: Vec<&[RuleId]> =
      pending.iter().map(|&idx| individuals[idx].genes()).collect();
    let fitnesses = self.evaluator.execute_evaluations(&orderings)?;
    debug_assert_eq!(
      fitnesses.len(),
      pending.len(),
      "evaluator must return one fitness per ordering"
    );

    for (&idx, fitness) in pending.iter().zip(fitnesses) {
      individuals[idx].set_fitness(fitness);
    }
    Ok(pending.len())
  }

  /// Creates `lambda` offspring out of `population`.
  fn vary(
    &self,
    population: &[Individual],
    lambda: usize,
    rng: &mut SearchRng,
  ) -> Vec<Individual> {
    if population.is_empty() {
      return Vec::new();
    }
    let cxpb = self.config.crossover_probability;
    let mutpb = self.config.mutation_probability;

    (0..lambda)
      .map(|_| {
        let op_choice: f64 = rng.gen();
        if op_choice < cxpb {
          let (a, b) = two_parents(population.len(), rng);
          let mut first = population[a].clone();
          let mut second = population[b].clone();
          self.crossover.crossover(&mut first, &mut second, rng);
          first
        } else if op_choice < cxpb + mutpb {
          let parent = rng.gen_range(0..population.len());
          let mut mutant = population[parent].clone();
          self.mutation.mutate(&mut mutant, rng);
          mutant
        } else {
          population[rng.gen_range(0..population.len())].clone()
        }
      })
      .collect()
  }

  fn record(
    &self,
    logbook: &mut Logbook,
    generation: usize,
    evaluations: usize,
    population: &[Individual],
  ) {
    let stats = GenerationStats::compute(generation, evaluations, population);
    info!(
      generation,
      evaluations,
      min_checks = stats.avg_checks.min,
      avg_checks = stats.avg_checks.avg,
      max_throughput = stats.throughput.max,
      "generation done"
    );
    logbook.record(stats);
  }
}

// indices of two distinct parents, or the only one twice
fn two_parents(len: usize, rng: &mut SearchRng) -> (usize, usize) {
  if len < 2 {
    return (0, 0);
  }
  let picked = index::sample(rng, len, 2);
  (picked.index(0), picked.index(1))
}
