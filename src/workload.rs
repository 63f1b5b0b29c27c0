//! Read-only packet workload the search is optimized against.

use std::{
  collections::{hash_map::Entry, HashMap},
  fmt,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::WorkloadError;

/// An opaque firewall rule identifier.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RuleId(pub u32);

impl From<u32> for RuleId {
  fn from(id: u32) -> Self {
    Self(id)
  }
}

impl fmt::Display for RuleId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    self.0.fmt(f)
  }
}

/// A firewall rule together with the number of times it has historically
/// been hit. An unknown hit count counts as `1`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Rule {
  /// Rule identifier.
  pub id: RuleId,
  /// Historical hit count, if known.
  pub hit_count: Option<u64>,
}

impl Rule {
  /// Creates a rule with a known hit count.
  pub fn new(id: impl Into<RuleId>, hit_count: u64) -> Self {
    Self {
      id: id.into(),
      hit_count: Some(hit_count),
    }
  }

  /// Returns the hit count, defaulting to `1` when it's unknown.
  pub fn hits(&self) -> u64 {
    self.hit_count.unwrap_or(1)
  }
}

/// A single observed packet: the rule it matched and how long it took to
/// process it, in seconds.
#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Packet {
  /// The rule this packet matched.
  pub rule: RuleId,
  /// Observed elapsed time in seconds, if recorded.
  pub elapsed: Option<f64>,
}

impl Packet {
  /// Creates a packet record.
  pub fn new(rule: impl Into<RuleId>, elapsed: Option<f64>) -> Self {
    Self {
      rule: rule.into(),
      elapsed,
    }
  }

  /// Returns the elapsed time if it is a usable timing sample. Zero and
  /// non-finite values are invalid samples, not zero-cost packets.
  pub fn valid_elapsed(&self) -> Option<f64> {
    self.elapsed.filter(|t| t.is_finite() && *t != 0.0)
  }
}

/// A fixed table of packets, each tagged with the rule it matched, plus the
/// distinct list of all rules to be ordered.
#[derive(Clone, Debug)]
pub struct Workload {
  rules: Vec<Rule>,
  // rule id -> index into `rules`
  index: HashMap<RuleId, usize>,
  packets: Vec<Packet>,
}

impl Workload {
  /// Builds a workload, checking that rule ids are distinct and that every
  /// packet references a listed rule.
  pub fn new(
    rules: Vec<Rule>,
    packets: Vec<Packet>,
  ) -> Result<Self, WorkloadError> {
    let mut index = HashMap::with_capacity(rules.len());
    for (idx, rule) in rules.iter().enumerate() {
      if index.insert(rule.id, idx).is_some() {
        return Err(WorkloadError::DuplicateRule(rule.id));
      }
    }
    if let Some((packet, p)) = packets
      .iter()
      .enumerate()
      .find(|(_, p)| !index.contains_key(&p.rule))
    {
      return Err(WorkloadError::UnknownRule {
        packet,
        rule: p.rule,
      });
    }
    Ok(Self {
      rules,
      index,
      packets,
    })
  }

  /// Builds a workload from `(matched rule, elapsed time)` records. Rules are
  /// listed in first-seen order and each rule's hit count is the number of
  /// records that matched it.
  pub fn from_matches<I, R>(records: I) -> Self
  where
    I: IntoIterator<Item = (R, Option<f64>)>,
    R: Into<RuleId>,
  {
    let mut rules: Vec<Rule> = Vec::new();
    let mut index: HashMap<RuleId, usize> = HashMap::new();
    let packets: Vec<Packet> = records
      .into_iter()
      .map(|(rule, elapsed)| {
        let packet = Packet::new(rule, elapsed);
        match index.entry(packet.rule) {
          Entry::Occupied(e) => {
            if let Some(hits) = rules[*e.get()].hit_count.as_mut() {
              *hits += 1;
            }
          }
          Entry::Vacant(e) => {
            e.insert(rules.len());
            rules.push(Rule::new(packet.rule, 1));
          }
        }
        packet
      })
      .collect();
    Self {
      rules,
      index,
      packets,
    }
  }

  /// Returns the rules in their original (baseline) order.
  pub fn rules(&self) -> &[Rule] {
    &self.rules
  }

  /// Returns rule identifiers in their original (baseline) order.
  pub fn rule_ids(&self) -> Vec<RuleId> {
    self.rules.iter().map(|r| r.id).collect()
  }

  /// Returns packet records.
  pub fn packets(&self) -> &[Packet] {
    &self.packets
  }

  /// Returns the number of distinct rules.
  pub fn rule_count(&self) -> usize {
    self.rules.len()
  }

  /// Returns `true` if `rule` is listed in this workload.
  pub fn contains(&self, rule: RuleId) -> bool {
    self.index.contains_key(&rule)
  }

  /// Returns the historical hit count of `rule`. Unknown counts and unknown
  /// rules count as `1`.
  pub fn hit_count(&self, rule: RuleId) -> u64 {
    self
      .index
      .get(&rule)
      .map_or(1, |&idx| self.rules[idx].hits())
  }
}
