//! Survivor selection: non-dominated sorting and crowding distance (NSGA-II).

use std::cmp::Ordering;

use itertools::Itertools;

use crate::{
  error::{Error, Result},
  individual::Individual,
  score::{Fitness, ParetoDominance, OBJECTIVE_NUM},
};

/// An operator that cuts a pool of evaluated individuals down to at most `mu`
/// survivors.
///
/// # Examples
/// ```
/// # use ruleorder::{Individual, Result};
/// // keeps the first `mu` individuals
/// let s = |mut pool: Vec<Individual>, mu: usize| -> Result<Vec<Individual>> {
///   pool.truncate(mu);
///   Ok(pool)
/// };
/// # fn takes_selector<S: ruleorder::selection::Selector>(_: S) {}
/// # takes_selector(s);
/// ```
///
/// **Note that you always can implement this trait instead of using closures.**
pub trait Selector {
  /// Returns the best `mu` individuals of `pool`.
  fn select(&self, pool: Vec<Individual>, mu: usize) -> Result<Vec<Individual>>;
}

impl<F> Selector for F
where
  F: Fn(Vec<Individual>, usize) -> Result<Vec<Individual>>,
{
  fn select(
    &self,
    pool: Vec<Individual>,
    mu: usize,
  ) -> Result<Vec<Individual>> {
    self(pool, mu)
  }
}

/// NSGA-II survivor selection.
///
/// Takes whole non-dominated fronts, best rank first, while they fit. The
/// first front that doesn't fit is truncated by descending crowding
/// distance, preferring solutions in less crowded regions. Ties keep pool
/// order.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct Nsga2Selection;

impl Selector for Nsga2Selection {
  fn select(
    &self,
    pool: Vec<Individual>,
    mu: usize,
  ) -> Result<Vec<Individual>> {
    let fitnesses = fitnesses(&pool)?;
    let mut chosen: Vec<SolutionIndex> = Vec::with_capacity(mu.min(pool.len()));

    for front in sort_non_dominated(&fitnesses) {
      let room = mu - chosen.len();
      if room == 0 {
        break;
      }
      if front.len() <= room {
        chosen.extend(front);
        continue;
      }
      let distances = crowding_distances(&fitnesses, &front);
      // `front` is in pool order and the sort is stable
      let mut by_distance: Vec<usize> = (0..front.len()).collect();
      by_distance.sort_by(|&a, &b| distances[b].total_cmp(&distances[a]));
      chosen.extend(by_distance.into_iter().take(room).map(|k| front[k]));
      break;
    }

    Ok(take_by_indices(pool, &chosen))
  }
}

// index of an individual in the pool
type SolutionIndex = usize;
// number of individuals dominating an individual
type DominanceCounter = u32;
// indices of individuals dominated by an individual
type DominanceList = Vec<SolutionIndex>;
// indices of individuals of a front
type Front = Vec<SolutionIndex>;

/// Partitions individuals into non-dominated fronts.
///
/// `fronts[0]` holds indices of individuals no one dominates, `fronts[1]`
/// those dominated only by members of `fronts[0]`, and so on. Indices within
/// a front are ascending.
pub fn sort_non_dominated(fitnesses: &[Fitness]) -> Vec<Vec<usize>> {
  let n = fitnesses.len();
  let weighted: Vec<[f64; OBJECTIVE_NUM]> =
    fitnesses.iter().map(Fitness::weighted).collect();
  let mut dominance_lists: Vec<DominanceList> = vec![Vec::new(); n];
  let mut dominance_counters: Vec<DominanceCounter> = vec![0; n];
  let mut first_front: Front = Vec::new();

  // for each unique pair of individuals `p` and `q`...
  for p_idx in 0..n {
    for q_idx in p_idx + 1..n {
      match weighted[p_idx].dominance(&weighted[q_idx]) {
        // `p` dominates `q`
        Ordering::Less => {
          dominance_lists[p_idx].push(q_idx);
          dominance_counters[q_idx] += 1;
        }
        // `q` dominates `p`
        Ordering::Greater => {
          dominance_lists[q_idx].push(p_idx);
          dominance_counters[p_idx] += 1;
        }
        Ordering::Equal => {}
      }
    }
    // all pairs with `p` are compared by now
    if dominance_counters[p_idx] == 0 {
      first_front.push(p_idx);
    }
  }

  let mut fronts = Vec::new();
  let mut current = first_front;
  while !current.is_empty() {
    let mut next: Front = Vec::new();
    for &p_idx in &current {
      for &q_idx in &dominance_lists[p_idx] {
        dominance_counters[q_idx] -= 1;
        if dominance_counters[q_idx] == 0 {
          next.push(q_idx);
        }
      }
    }
    next.sort_unstable();
    fronts.push(current);
    current = next;
  }
  fronts
}

/// Returns the crowding distance of each member of `front`, in `front`
/// order. Boundary members of every objective get `f64::INFINITY`.
pub fn crowding_distances(fitnesses: &[Fitness], front: &[usize]) -> Vec<f64> {
  let len = front.len();
  let mut distances = vec![0.0; len];
  if len == 0 {
    return distances;
  }

  for o_idx in 0..OBJECTIVE_NUM {
    let value = |k: usize| fitnesses[front[k]].values()[o_idx];
    let order: Vec<usize> = (0..len)
      .sorted_by(|&a, &b| value(a).total_cmp(&value(b)))
      .collect();

    let (first, last) = (order[0], order[len - 1]);
    distances[first] = f64::INFINITY;
    distances[last] = f64::INFINITY;

    let range = value(last) - value(first);
    if range == 0.0 || !range.is_finite() {
      continue;
    }
    for (&prev, &cur, &next) in order.iter().tuple_windows() {
      distances[cur] += (value(next) - value(prev)) / range;
    }
  }
  distances
}

/// Returns the non-dominated members of `population`, in population order.
pub fn pareto_front(population: &[Individual]) -> Result<Vec<Individual>> {
  let fitnesses = fitnesses(population)?;
  Ok(
    sort_non_dominated(&fitnesses)
      .first()
      .map(|front| front.iter().map(|&i| population[i].clone()).collect())
      .unwrap_or_default(),
  )
}

fn fitnesses(pool: &[Individual]) -> Result<Vec<Fitness>> {
  pool
    .iter()
    .enumerate()
    .map(|(index, ind)| ind.fitness().ok_or(Error::Unevaluated { index }))
    .collect()
}

fn take_by_indices(
  pool: Vec<Individual>,
  indices: &[SolutionIndex],
) -> Vec<Individual> {
  let mut slots: Vec<Option<Individual>> = pool.into_iter().map(Some).collect();
  indices.iter().filter_map(|&idx| slots[idx].take()).collect()
}
