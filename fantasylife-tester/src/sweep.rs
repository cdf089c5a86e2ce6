use fantasylife_logic::{Catalog, ItemCounts, PlayerId, Trace};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Serialize, Serializer};
use std::collections::BTreeSet;
use std::time::{Duration, Instant};

const MAX_RECORDED_VIOLATIONS: usize = 25;
const MAX_STACK: u32 = 9;

/// Result of a seeded monotonicity and determinism sweep.
#[derive(Debug, Clone, Serialize)]
pub struct SweepReport {
    pub seed: u64,
    pub iterations: usize,
    pub rules_checked: usize,
    pub evaluations: usize,
    pub violation_count: usize,
    pub violations: Vec<String>,
    #[serde(serialize_with = "as_millis")]
    pub duration: Duration,
}

impl SweepReport {
    pub const fn passed(&self) -> bool {
        self.violation_count == 0
    }

    fn record(&mut self, violation: String) {
        self.violation_count += 1;
        if self.violations.len() < MAX_RECORDED_VIOLATIONS {
            self.violations.push(violation);
        }
    }
}

fn as_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    duration.as_millis().serialize(serializer)
}

fn random_state(rng: &mut ChaCha8Rng, items: &[String]) -> ItemCounts {
    let mut state = ItemCounts::new(PlayerId(1));
    for item in items {
        if rng.gen_bool(0.5) {
            state.insert(item, rng.gen_range(1..=MAX_STACK));
        }
    }
    state
}

fn grown(rng: &mut ChaCha8Rng, base: &ItemCounts, items: &[String]) -> ItemCounts {
    let mut bigger = base.clone();
    for item in items {
        if rng.gen_bool(0.25) {
            bigger.add(item, rng.gen_range(1..=3));
        }
    }
    bigger
}

/// Evaluate every rule over `iterations` pairs of nested random states.
///
/// A rule violates monotonicity when it holds for the smaller state but not the
/// larger one, and determinism when repeated or traced evaluation disagrees.
pub fn run_sweep(catalog: &Catalog, seed: u64, iterations: usize) -> SweepReport {
    let start = Instant::now();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut items = BTreeSet::new();
    for (_, predicate) in catalog.iter() {
        predicate.collect_items(&mut items);
    }
    let items: Vec<String> = items.into_iter().collect();

    let mut report = SweepReport {
        seed,
        iterations,
        rules_checked: catalog.len(),
        evaluations: 0,
        violation_count: 0,
        violations: Vec::new(),
        duration: Duration::ZERO,
    };

    for (key, predicate) in catalog.iter() {
        if !predicate.is_monotone() {
            report.record(format!("{key}: contains a negation"));
        }
    }

    for iteration in 0..iterations {
        let small = random_state(&mut rng, &items);
        let large = grown(&mut rng, &small, &items);
        for (key, predicate) in catalog.iter() {
            let before = predicate.evaluate(&small);
            let after = predicate.evaluate(&large);
            let mut trace = Trace::new();
            let traced = predicate.evaluate_traced(&small, &mut trace);
            report.evaluations += 3;
            if before && !after {
                report.record(format!("{key}: regressed in iteration {iteration}"));
            }
            if before != traced || before != predicate.evaluate(&small) {
                report.record(format!("{key}: unstable result in iteration {iteration}"));
            }
        }
    }

    report.duration = start.elapsed();
    log::info!(
        "sweep seed {seed:#x}: {} evaluations, {} violations",
        report.evaluations,
        report.violation_count
    );
    report
}
