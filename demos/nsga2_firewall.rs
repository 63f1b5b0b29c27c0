use std::collections::HashMap;

use rand::prelude::*;
use rand_distr::{Exp, Zipf};
use ruleorder::{
  evaluation::FirewallModel,
  report::Comparison,
  Packet,
  Rule,
  RuleId,
  SearchConfig,
  Workload,
};
use tracing_subscriber::EnvFilter;

const RULES: u32 = 40;
const PACKETS: usize = 5_000;

fn main() -> ruleorder::Result<()> {
  // `RUST_LOG=debug` shows every phase of every generation
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info")),
    )
    .init();

  let mut rng = StdRng::seed_from_u64(2024);

  // a few rules get most of the traffic. which ones is random, so the
  // listed order is far from the best one
  let mut by_popularity: Vec<RuleId> = (0..RULES).map(RuleId).collect();
  by_popularity.shuffle(&mut rng);
  let zipf = Zipf::new(RULES as u64, 1.1).unwrap();
  // processing times average 200 microseconds
  let elapsed = Exp::new(5_000.0).unwrap();

  let packets: Vec<Packet> = (0..PACKETS)
    .map(|_| {
      let rank = zipf.sample(&mut rng) as usize - 1;
      Packet::new(by_popularity[rank], Some(elapsed.sample(&mut rng)))
    })
    .collect();

  // hit counts are tallied from the traffic itself
  let mut hits: HashMap<RuleId, u64> = HashMap::new();
  for packet in &packets {
    *hits.entry(packet.rule).or_default() += 1;
  }
  let rules: Vec<Rule> = (0..RULES)
    .map(RuleId)
    .map(|id| Rule::new(id, hits.get(&id).copied().unwrap_or_default()))
    .collect();
  let workload = Workload::new(rules, packets)?;

  let config = SearchConfig::builder()
    .population_size(60)
    .generations(40)
    .parallel(true)
    .build();
  let result = ruleorder::optimize(&workload, config)?;

  println!("gen | evals | min checks | avg checks");
  for entry in result.logbook.entries().iter().step_by(5) {
    println!(
      "{:>3} | {:>5} | {:>10.2} | {:>10.2}",
      entry.generation,
      entry.evaluations,
      entry.avg_checks.min,
      entry.avg_checks.avg
    );
  }
  println!();

  let comparison =
    Comparison::against_baseline(&FirewallModel::new(&workload), &result)?;
  println!("{comparison}");
  println!();
  println!(
    "best ordering starts with {:?}",
    &comparison.ordering[..10.min(comparison.ordering.len())]
  );
  Ok(())
}
