/// Simulate command: measures how well sessions recover a hidden order.
///
/// Each trial draws hidden strengths for N items, then answers every group by
/// sorting on strength plus Gaussian noise. Reports rounds used, stop reasons
/// and rank correlation with the hidden truth.
use anyhow::Result;
use batchrank_core::{
    Group, ItemId, OracleError, OrderOracle, RankingSession, SessionConfig, StopReason,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::debug;

/// Judge with fixed hidden strengths and per-comparison perception noise.
pub struct NoisyJudge {
    strengths: Vec<f64>,
    noise: f64,
    rng: StdRng,
}

impl NoisyJudge {
    pub fn new(strengths: Vec<f64>, noise: f64, seed: u64) -> Self {
        NoisyJudge {
            strengths,
            noise,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl OrderOracle for NoisyJudge {
    fn request_order(&mut self, group: &Group) -> Result<Vec<ItemId>, OracleError> {
        let mut perceived: Vec<(ItemId, f64)> = group
            .items
            .iter()
            .map(|&id| (id, self.strengths[id as usize] + self.noise * standard_normal(&mut self.rng)))
            .collect();
        perceived.sort_by(|a, b| b.1.total_cmp(&a.1));
        Ok(perceived.into_iter().map(|(id, _)| id).collect())
    }
}

/// N(0, 1) sample via Box-Muller.
fn standard_normal(rng: &mut impl Rng) -> f64 {
    let u1: f64 = rng.random::<f64>().max(1e-10);
    let u2: f64 = rng.random();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

/// Spearman rank correlation between two orderings of the same items.
pub fn spearman(estimated: &[ItemId], truth: &[ItemId]) -> f64 {
    let n = truth.len();
    if n < 2 {
        return 1.0;
    }
    let mut true_rank = vec![0usize; n];
    for (rank, &id) in truth.iter().enumerate() {
        true_rank[id as usize] = rank;
    }
    let sum_sq: f64 = estimated
        .iter()
        .enumerate()
        .map(|(rank, &id)| {
            let d = rank as f64 - true_rank[id as usize] as f64;
            d * d
        })
        .sum();
    let n = n as f64;
    1.0 - 6.0 * sum_sq / (n * (n * n - 1.0))
}

#[derive(Debug, Clone, Serialize)]
pub struct TrialOutcome {
    pub rounds: usize,
    pub stop_reason: StopReason,
    pub spearman: f64,
    pub top_item_correct: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub trials: Vec<TrialOutcome>,
    pub mean_rounds: f64,
    pub mean_spearman: f64,
    pub top_item_accuracy: f64,
    pub early_stops: usize,
}

/// Run one simulated session. `seed` drives both the hidden strengths and
/// the judge's noise; the session's own shuffle seed comes from `config`.
pub fn run_trial(num_items: usize, noise: f64, config: &SessionConfig, seed: u64) -> Result<TrialOutcome> {
    let mut rng = StdRng::seed_from_u64(seed);
    let strengths: Vec<f64> = (0..num_items).map(|_| standard_normal(&mut rng)).collect();

    let item_ids: Vec<ItemId> = (0..num_items as i64).collect();
    let mut truth = item_ids.clone();
    truth.sort_by(|&a, &b| strengths[b as usize].total_cmp(&strengths[a as usize]));

    let mut judge = NoisyJudge::new(strengths, noise, rng.random());
    let mut session = RankingSession::start(&item_ids, config.clone())?;
    let result = session.run_with_oracle(&mut judge)?;

    let estimated = result.final_ranking();
    Ok(TrialOutcome {
        rounds: result.rounds_completed,
        stop_reason: result.stop_reason,
        spearman: spearman(&estimated, &truth),
        top_item_correct: estimated.first() == truth.first(),
    })
}

pub fn run_simulation(
    num_items: usize,
    trials: usize,
    noise: f64,
    config: &SessionConfig,
    seed: u64,
) -> Result<SimulationReport> {
    let mut outcomes = Vec::with_capacity(trials);
    for trial in 0..trials {
        let mut trial_config = config.clone();
        trial_config.seed = config.seed.map(|s| s.wrapping_add(trial as u64));
        let outcome = run_trial(num_items, noise, &trial_config, seed.wrapping_add(trial as u64 * 7))?;
        debug!(trial, rounds = outcome.rounds, spearman = outcome.spearman, "trial finished");
        outcomes.push(outcome);
    }

    let count = outcomes.len().max(1) as f64;
    let mean = |f: &dyn Fn(&TrialOutcome) -> f64| outcomes.iter().map(f).sum::<f64>() / count;

    Ok(SimulationReport {
        mean_rounds: mean(&|o: &TrialOutcome| o.rounds as f64),
        mean_spearman: mean(&|o: &TrialOutcome| o.spearman),
        top_item_accuracy: mean(&|o: &TrialOutcome| if o.top_item_correct { 1.0 } else { 0.0 }),
        early_stops: outcomes
            .iter()
            .filter(|o| o.stop_reason == StopReason::ConfidenceReached)
            .count(),
        trials: outcomes,
    })
}

pub fn print_report(report: &SimulationReport, num_items: usize, config: &SessionConfig, noise: f64) {
    println!("── Setup ───────────────────────────────────────");
    println!("Items: {}  Group size: {}  Max rounds: {}", num_items, config.group_size, config.max_rounds);
    println!("Confidence threshold: {}  Judge noise: {}", config.confidence_threshold, noise);
    println!("Strategy: {:?}  Trials: {}", config.strategy, report.trials.len());

    println!();
    println!("── Results ─────────────────────────────────────");
    println!("Mean rounds used:      {:.2}", report.mean_rounds);
    println!("Early stops:           {}/{}", report.early_stops, report.trials.len());
    println!("Mean Spearman rho:     {:.3}", report.mean_spearman);
    println!("Top item correct:      {:.1}%", report.top_item_accuracy * 100.0);
}
