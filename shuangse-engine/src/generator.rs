use rand::SeedableRng;
use rand::distr::weighted::WeightedIndex;
use rand::prelude::*;
use rand::rngs::StdRng;
use tracing::{debug, info};

use shuangse_db::models::{BLUE_MAX, Candidate, RED_COUNT, RED_MAX};

use crate::analysis::DimensionSnapshots;
use crate::config::GeneratorConfig;
use crate::scoring::{ScoreResult, score};
use crate::weights::WeightState;

/// Plafond du poids d'une boule bleue (retard / 10).
const BLUE_WEIGHT_CAP: f64 = 2.0;
const BLUE_UNSEEN_WEIGHT: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acceptance {
    /// Score au moins égal au seuil demandé.
    Strict,
    Relaxed,
}

impl std::fmt::Display for Acceptance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Acceptance::Strict => write!(f, "strict"),
            Acceptance::Relaxed => write!(f, "assoupli"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeneratedCandidate {
    pub candidate: Candidate,
    pub score: ScoreResult,
    pub acceptance: Acceptance,
}

#[derive(Debug, Clone)]
pub struct Generation {
    /// Triés par score décroissant, ordre de génération à égalité.
    pub candidates: Vec<GeneratedCandidate>,
    pub attempts: usize,
    /// Le seuil a dû être assoupli.
    pub relaxed: bool,
}

impl Generation {
    pub fn strict_count(&self) -> usize {
        self.candidates
            .iter()
            .filter(|c| c.acceptance == Acceptance::Strict)
            .count()
    }
}

pub struct CandidateGenerator<'a> {
    snapshots: &'a DimensionSnapshots,
    weights: &'a WeightState,
    config: GeneratorConfig,
    suggestion_threshold: f64,
    rng: StdRng,
}

impl<'a> CandidateGenerator<'a> {
    pub fn new(
        snapshots: &'a DimensionSnapshots,
        weights: &'a WeightState,
        config: GeneratorConfig,
        suggestion_threshold: f64,
        seed: Option<u64>,
    ) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_rng(&mut rand::rng()),
        };
        Self {
            snapshots,
            weights,
            config,
            suggestion_threshold,
            rng,
        }
    }

    /// Phase stricte puis, si besoin, phase assouplie jusqu'à `target` grilles.
    pub fn generate(&mut self, target: usize, min_score: f64) -> Generation {
        let mut accepted: Vec<GeneratedCandidate> = Vec::with_capacity(target);
        let mut attempts = 0usize;

        while accepted.len() < target && attempts < self.config.strict_attempts {
            attempts += 1;
            let (candidate, result) = self.attempt();
            if result.total >= min_score {
                accepted.push(GeneratedCandidate {
                    candidate,
                    score: result,
                    acceptance: Acceptance::Strict,
                });
            }
        }

        let relaxed = accepted.len() < target;
        if relaxed {
            info!(
                found = accepted.len(),
                target,
                min_score,
                relaxed_min_score = self.config.relaxed_min_score,
                "seuil non atteint, assouplissement"
            );
        }

        let mut relaxed_attempts = 0usize;
        while accepted.len() < target {
            attempts += 1;
            relaxed_attempts += 1;
            let (candidate, result) = self.attempt();
            let gated = relaxed_attempts <= self.config.relaxed_attempts;
            if gated && result.total < self.config.relaxed_min_score {
                continue;
            }
            let acceptance = if result.total >= min_score {
                Acceptance::Strict
            } else {
                Acceptance::Relaxed
            };
            accepted.push(GeneratedCandidate {
                candidate,
                score: result,
                acceptance,
            });
        }

        accepted.sort_by(|a, b| {
            b.score
                .total
                .partial_cmp(&a.score.total)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        debug!(attempts, relaxed, "génération terminée");

        Generation {
            candidates: accepted,
            attempts,
            relaxed,
        }
    }

    /// Grilles uniformément aléatoires, sans notation.
    pub fn random_candidates(&mut self, count: usize) -> Vec<Candidate> {
        let pool: Vec<u8> = (1..=RED_MAX).collect();
        (0..count)
            .map(|_| {
                let mut reds = [0u8; RED_COUNT];
                for (slot, &n) in reds.iter_mut().zip(pool.choose_multiple(&mut self.rng, RED_COUNT)) {
                    *slot = n;
                }
                reds.sort_unstable();
                Candidate {
                    reds,
                    blue: self.rng.random_range(1..=BLUE_MAX),
                }
            })
            .collect()
    }

    fn attempt(&mut self) -> (Candidate, ScoreResult) {
        let candidate = self.draw_candidate();
        let result = score(&candidate, self.snapshots, self.weights, self.suggestion_threshold);
        (candidate, result)
    }

    fn draw_candidate(&mut self) -> Candidate {
        let hot_cold = &self.snapshots.hot_cold;
        let hot_pick = self.rng.random_range(2..=3);
        let warm_pick = 5 - hot_pick;

        let mut reds: Vec<u8> = Vec::with_capacity(RED_COUNT);
        reds.extend(hot_cold.hot.choose_multiple(&mut self.rng, hot_pick));
        reds.extend(hot_cold.warm.choose_multiple(&mut self.rng, warm_pick));
        let cold_pick = RED_COUNT - reds.len();
        reds.extend(hot_cold.cold.choose_multiple(&mut self.rng, cold_pick));

        if reds.len() < RED_COUNT {
            let unused: Vec<u8> = (1..=RED_MAX).filter(|n| !reds.contains(n)).collect();
            let missing = RED_COUNT - reds.len();
            reds.extend(unused.choose_multiple(&mut self.rng, missing));
        }
        reds.sort_unstable();

        let mut arr = [0u8; RED_COUNT];
        arr.copy_from_slice(&reds[..RED_COUNT]);
        Candidate {
            reds: arr,
            blue: self.pick_blue(),
        }
    }

    fn pick_blue(&mut self) -> u8 {
        let weights = blue_weights(self.snapshots);
        match WeightedIndex::new(&weights) {
            Ok(dist) => dist.sample(&mut self.rng) as u8 + 1,
            Err(_) => self.rng.random_range(1..=BLUE_MAX),
        }
    }
}

/// Poids de tirage de chaque boule bleue, index = numéro − 1.
pub fn blue_weights(snapshots: &DimensionSnapshots) -> Vec<f64> {
    (1..=BLUE_MAX)
        .map(|n| match snapshots.missing.blue_last_seen(n) {
            None => BLUE_UNSEEN_WEIGHT,
            Some(_) => (snapshots.missing.blue_gap(n) as f64 / 10.0).min(BLUE_WEIGHT_CAP),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;
    use crate::history::make_test_draws;
    use shuangse_db::models::DrawRecord;

    fn snapshots() -> DimensionSnapshots {
        DimensionSnapshots::compute(&make_test_draws(2024001, 150), &AnalysisConfig::default())
    }

    #[test]
    fn test_generate_returns_target_count() {
        let snaps = snapshots();
        let weights = WeightState::default();
        let mut generator = CandidateGenerator::new(&snaps, &weights, GeneratorConfig::default(), 70.0, Some(42));
        let generation = generator.generate(5, 75.0);

        assert_eq!(generation.candidates.len(), 5);
        for c in &generation.candidates {
            match c.acceptance {
                Acceptance::Strict => assert!(c.score.total >= 75.0),
                Acceptance::Relaxed => {
                    assert!(generation.relaxed);
                    assert!(c.score.total < 75.0);
                }
            }
        }
        if generation.relaxed {
            assert!(generation.attempts >= 100);
        }
    }

    #[test]
    fn test_generate_sorted_and_honest() {
        let snaps = snapshots();
        let weights = WeightState::default();
        let mut generator = CandidateGenerator::new(&snaps, &weights, GeneratorConfig::default(), 70.0, Some(7));
        let generation = generator.generate(8, 75.0);

        for pair in generation.candidates.windows(2) {
            assert!(pair[0].score.total >= pair[1].score.total);
        }
        for c in &generation.candidates {
            let rescored = score(&c.candidate, &snaps, &weights, 70.0);
            assert!((rescored.total - c.score.total).abs() < 1e-12);
        }
    }

    #[test]
    fn test_generate_is_deterministic_with_seed() {
        let snaps = snapshots();
        let weights = WeightState::default();
        let run = |seed| {
            let mut generator = CandidateGenerator::new(&snaps, &weights, GeneratorConfig::default(), 70.0, Some(seed));
            generator
                .generate(5, 75.0)
                .candidates
                .into_iter()
                .map(|c| c.candidate)
                .collect::<Vec<_>>()
        };
        assert_eq!(run(123), run(123));
    }

    #[test]
    fn test_unreachable_threshold_relaxes() {
        let snaps = snapshots();
        let weights = WeightState::default();
        let mut generator = CandidateGenerator::new(&snaps, &weights, GeneratorConfig::default(), 70.0, Some(1));
        let generation = generator.generate(3, 101.0);

        assert!(generation.relaxed);
        assert_eq!(generation.candidates.len(), 3);
        assert_eq!(generation.strict_count(), 0);
        assert!(generation.attempts > 100);
    }

    #[test]
    fn test_relaxed_phase_respects_relaxed_floor() {
        let snaps = snapshots();
        let weights = WeightState::default();
        let config = GeneratorConfig {
            relaxed_attempts: 10_000,
            ..GeneratorConfig::default()
        };
        let mut generator = CandidateGenerator::new(&snaps, &weights, config, 70.0, Some(11));
        let generation = generator.generate(5, 101.0);

        assert!(generation.relaxed);
        assert_eq!(generation.candidates.len(), 5);
        assert!(generation.attempts <= 100 + 10_000);
        for c in &generation.candidates {
            assert_eq!(c.acceptance, Acceptance::Relaxed);
            assert!(c.score.total >= 60.0, "total {}", c.score.total);
        }
    }

    #[test]
    fn test_ungated_only_after_relaxed_window() {
        let snaps = snapshots();
        let weights = WeightState::default();
        let config = GeneratorConfig {
            min_score: 101.0,
            relaxed_min_score: 101.0,
            strict_attempts: 10,
            relaxed_attempts: 20,
        };
        let mut generator = CandidateGenerator::new(&snaps, &weights, config, 70.0, Some(5));
        let generation = generator.generate(3, 101.0);

        assert_eq!(generation.candidates.len(), 3);
        assert_eq!(generation.strict_count(), 0);
        assert_eq!(generation.attempts, 10 + 20 + 3);
    }

    #[test]
    fn test_candidates_are_valid_with_empty_history() {
        let snaps = DimensionSnapshots::compute(&[], &AnalysisConfig::default());
        let weights = WeightState::default();
        let mut generator = CandidateGenerator::new(&snaps, &weights, GeneratorConfig::default(), 70.0, Some(9));
        for c in generator.random_candidates(50) {
            assert!(Candidate::new(&c.reds, c.blue).is_ok());
            assert!(c.reds.windows(2).all(|w| w[0] < w[1]));
        }
        let generation = generator.generate(5, 75.0);
        assert_eq!(generation.candidates.len(), 5);
        for g in &generation.candidates {
            assert!(Candidate::new(&g.candidate.reds, g.candidate.blue).is_ok());
        }
    }

    #[test]
    fn test_blue_weights() {
        let draws = vec![
            DrawRecord::new("130", "2024-01-01", &[1, 2, 3, 4, 5, 6], 1).unwrap(),
            DrawRecord::new("125", "2024-01-01", &[1, 2, 3, 4, 5, 6], 2).unwrap(),
            DrawRecord::new("100", "2024-01-01", &[1, 2, 3, 4, 5, 6], 3).unwrap(),
        ];
        let snaps = DimensionSnapshots::compute(&draws, &AnalysisConfig::default());
        let w = blue_weights(&snaps);
        assert_eq!(w.len(), 16);
        assert_eq!(w[0], 0.0);
        assert!((w[1] - 0.5).abs() < 1e-12);
        assert_eq!(w[2], 2.0);
        assert_eq!(w[15], 0.5);
    }
}
