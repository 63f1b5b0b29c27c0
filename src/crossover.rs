//! Crossover operators for rule orderings.
//!
//! Every operator here exchanges material between two permutations while
//! keeping both of them permutations: no rule is lost or duplicated.

use std::collections::{HashMap, HashSet};

use rand::Rng;

use crate::{individual::Individual, workload::RuleId, SearchRng};

/// An operator that recombines two parents in place, turning them into two
/// offsprings. Implementations must keep both orderings permutations of the
/// same rule set and must go through [`Individual::genes_mut`] so that
/// fitness of modified individuals is invalidated.
///
/// # Examples
/// ```
/// # use ruleorder::{Individual, SearchRng};
/// // offsprings simply trade places
/// let c = |a: &mut Individual, b: &mut Individual, _: &mut SearchRng| {
///   std::mem::swap(a, b);
/// };
/// # fn takes_crossover<C: ruleorder::crossover::Crossover>(_: C) {}
/// # takes_crossover(c);
/// ```
///
/// **Note that you always can implement this trait instead of using closures.**
pub trait Crossover {
  /// Recombines `a` and `b` in place.
  fn crossover(
    &self,
    a: &mut Individual,
    b: &mut Individual,
    rng: &mut SearchRng,
  );
}

impl<F> Crossover for F
where
  F: Fn(&mut Individual, &mut Individual, &mut SearchRng),
{
  fn crossover(
    &self,
    a: &mut Individual,
    b: &mut Individual,
    rng: &mut SearchRng,
  ) {
    self(a, b, rng)
  }
}

/// Partially matched crossover (PMX).
///
/// Picks a random segment and exchanges it between the parents. Every value
/// brought in from the other parent is swapped with the position that held
/// it, so each offspring stays a permutation and keeps most absolute
/// positions of its original parent.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct PartiallyMatched;

impl Crossover for PartiallyMatched {
  fn crossover(
    &self,
    a: &mut Individual,
    b: &mut Individual,
    rng: &mut SearchRng,
  ) {
    let size = a.genes().len().min(b.genes().len());
    if size < 2 {
      return;
    }
    let (start, end) = cut_points(size, rng);
    partially_matched(a.genes_mut(), b.genes_mut(), start, end);
  }
}

/// Ordered crossover.
///
/// Copies a random segment of one parent into the offspring at the same
/// positions, then fills the remaining positions left to right with the
/// other parent's rules in that parent's order, skipping rules already
/// placed. The second offspring is built the same way with parents swapped.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct Ordered;

impl Crossover for Ordered {
  fn crossover(
    &self,
    a: &mut Individual,
    b: &mut Individual,
    rng: &mut SearchRng,
  ) {
    let size = a.genes().len();
    if size < 2 || size != b.genes().len() {
      return;
    }
    let (start, end) = cut_points(size, rng);
    let child_a = ordered_child(a.genes(), b.genes(), start, end);
    let child_b = ordered_child(b.genes(), a.genes(), start, end);
    a.genes_mut().copy_from_slice(&child_a);
    b.genes_mut().copy_from_slice(&child_b);
  }
}

/// Returns a non-empty half-open segment `start..end` within `0..size`.
/// `size` must be at least 2.
fn cut_points(size: usize, rng: &mut SearchRng) -> (usize, usize) {
  let start = rng.gen_range(0..=size);
  let end = rng.gen_range(0..size);
  if end >= start {
    (start, end + 1)
  } else {
    (end, start)
  }
}

fn partially_matched(
  a: &mut [RuleId],
  b: &mut [RuleId],
  start: usize,
  end: usize,
) {
  // rule -> current position, kept in sync with every swap
  let mut pos_a: HashMap<RuleId, usize> =
    a.iter().enumerate().map(|(i, &r)| (r, i)).collect();
  let mut pos_b: HashMap<RuleId, usize> =
    b.iter().enumerate().map(|(i, &r)| (r, i)).collect();

  for i in start..end {
    let (va, vb) = (a[i], b[i]);
    // parents over different rule sets can't be matched
    let (Some(&ja), Some(&jb)) = (pos_a.get(&vb), pos_b.get(&va)) else {
      continue;
    };
    a.swap(i, ja);
    b.swap(i, jb);
    pos_a.insert(va, ja);
    pos_a.insert(vb, i);
    pos_b.insert(vb, jb);
    pos_b.insert(va, i);
  }
}

fn ordered_child(
  template: &[RuleId],
  donor: &[RuleId],
  start: usize,
  end: usize,
) -> Vec<RuleId> {
  let segment: HashSet<RuleId> = template[start..end].iter().copied().collect();
  let mut fill = donor.iter().copied().filter(|r| !segment.contains(r));
  template
    .iter()
    .enumerate()
    .map(|(i, &r)| {
      if (start..end).contains(&i) {
        r
      } else {
        fill.next().unwrap_or(r)
      }
    })
    .collect()
}
