//! Parallelization wrappers for evaluation operators.

/// A wrapper around an operator that marks it to be executed in parallel for
/// **each** ordering by an executor.
#[derive(Clone, Copy, Debug)]
pub struct ParEach<O> {
  operator: O,
}

impl<O> ParEach<O> {
  /// Returns the wrapped operator.
  pub fn operator(&self) -> &O {
    &self.operator
  }
}

/// A wrapper around an operator that marks it to be executed in parallel for
/// each **batch** of orderings by an executor.
#[derive(Clone, Copy, Debug)]
pub struct ParBatch<O> {
  operator: O,
}

impl<O> ParBatch<O> {
  /// Returns the wrapped operator.
  pub fn operator(&self) -> &O {
    &self.operator
  }
}

/// Converts an operator into a parallelized one.
pub trait IntoPar: Sized {
  /// Creates a wrapper around given operator that marks it to
  /// be executed in parallel for **each** ordering.
  ///
  /// **Parallelization is implemented with [rayon]. For small workloads it
  /// may only decrease performance because of the overhead introduced.
  /// Benchmark if in doubt.**
  fn par_each(self) -> ParEach<Self> {
    ParEach { operator: self }
  }

  /// Creates a wrapper around given operator that marks it to
  /// be executed in parallel for each **batch** of orderings.
  /// The batch size is chosen to evenly distribute the work across all
  /// available threads.
  fn par_batch(self) -> ParBatch<Self> {
    ParBatch { operator: self }
  }
}
