/// Execution strategy markers. An executor is implemented once per marker,
/// which lets the compiler pick the right one from the operator's type.
pub mod strategy {
  /// Sequential execution strategy marker, i.e. no parallelization involved.
  pub enum SequentialExecutionStrategy {}

  /// Parallel execution strategy marker, parallelizes evaluation of **each**
  /// ordering.
  pub enum ParallelEachExecutionStrategy {}

  /// Parallel execution strategy marker, parallelizes evaluation of a
  /// **batch** of orderings. The crate tries to split the work equally for
  /// each available thread.
  pub enum ParallelBatchExecutionStrategy {}

  /// Custom execution strategy marker, the operator handles the whole batch
  /// itself.
  pub enum CustomExecutionStrategy {}
}
