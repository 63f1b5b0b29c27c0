//! Error types.

use crate::workload::RuleId;

/// An alias for results returned by this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Top level error of a search run.
///
/// Every variant describes a structural problem with the input or the
/// configuration. None of them is retried: a failed run returns the error
/// instead of a best-guess population.
#[derive(Debug, thiserror::Error)]
pub enum Error {
  /// A candidate ordering is not a permutation of the workload's rules.
  #[error("invalid ordering: {0}")]
  InvalidOrdering(#[from] OrderingError),

  /// No valid elapsed-time sample exists to compute throughput.
  #[error(
    "degenerate workload: none of {packets} packets has a valid elapsed time"
  )]
  DegenerateWorkload {
    /// Number of packets in the workload.
    packets: usize,
  },

  /// The search finished with no non-dominated individuals.
  #[error("search produced an empty pareto front")]
  EmptyFront,

  /// Search parameters are out of range.
  #[error("configuration error: {0}")]
  Configuration(#[from] ConfigError),

  /// The workload table is malformed.
  #[error("workload error: {0}")]
  Workload(#[from] WorkloadError),

  /// Selection was asked to rank an individual without fitness.
  #[error("individual at index {index} has not been evaluated")]
  Unevaluated {
    /// Position of the individual in the selection pool.
    index: usize,
  },
}

/// Reasons for rejecting a candidate ordering.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderingError {
  /// The ordering does not contain as many rules as the workload.
  #[error("ordering has {actual} rules, expected {expected}")]
  LengthMismatch {
    /// Number of rules in the workload.
    expected: usize,
    /// Number of rules in the ordering.
    actual: usize,
  },

  /// The ordering mentions a rule the workload doesn't know.
  #[error("unknown rule {0}")]
  UnknownRule(RuleId),

  /// The ordering mentions a rule more than once.
  #[error("duplicate rule {0}")]
  DuplicateRule(RuleId),

  /// A packet matched a rule that is absent from the ordering.
  #[error("packet matched rule {0} which is absent from the ordering")]
  UnmatchedRule(RuleId),
}

/// Invalid search parameters.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
  /// A parameter holds a value outside of its domain.
  #[error("invalid value for '{field}': {reason}")]
  InvalidValue {
    /// Name of the offending parameter.
    field: &'static str,
    /// Human readable explanation.
    reason: String,
  },
}

/// Malformed workload tables.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkloadError {
  /// The same rule identifier is listed twice.
  #[error("rule {0} is listed more than once")]
  DuplicateRule(RuleId),

  /// A packet references a rule that is not listed.
  #[error("packet {packet} references unknown rule {rule}")]
  UnknownRule {
    /// Index of the packet record.
    packet: usize,
    /// The unknown rule.
    rule: RuleId,
  },
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_error_messages_carry_context() {
    let err = Error::from(OrderingError::LengthMismatch {
      expected: 3,
      actual: 2,
    });
    assert_eq!(
      err.to_string(),
      "invalid ordering: ordering has 2 rules, expected 3"
    );

    let err = Error::from(OrderingError::UnmatchedRule(RuleId(7)));
    assert!(err.to_string().contains("rule 7"));

    let err = Error::from(ConfigError::InvalidValue {
      field: "generations",
      reason: "must be positive".into(),
    });
    assert_eq!(
      err.to_string(),
      "configuration error: invalid value for 'generations': must be positive"
    );
  }
}
