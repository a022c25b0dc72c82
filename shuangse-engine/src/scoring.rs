use shuangse_db::models::Candidate;

use crate::analysis::DimensionSnapshots;
use crate::analysis::hot_cold::Heat;
use crate::analysis::interval::consecutive_gaps;
use crate::analysis::odd_even::odd_even_split;
use crate::analysis::zone::zone_distribution;
use crate::dimension::{Dimension, PerDimension};
use crate::error::EngineResult;
use crate::weights::WeightState;

const LONG_GAP: u64 = 10;
const RARE_INTERVAL: u32 = 10;

#[derive(Debug, Clone)]
pub struct ScoreResult {
    pub scores: PerDimension<f64>,
    pub total: f64,
    /// Poids utilisés pour le total.
    pub weights: PerDimension<f64>,
    pub suggestions: Vec<String>,
}

/// Note une combinaison brute après validation (aucun score partiel en cas d'erreur).
pub fn score_numbers(
    reds: &[u8],
    blue: u8,
    snapshots: &DimensionSnapshots,
    weights: &WeightState,
    suggestion_threshold: f64,
) -> EngineResult<ScoreResult> {
    let candidate = Candidate::new(reds, blue)?;
    Ok(score(&candidate, snapshots, weights, suggestion_threshold))
}

pub fn score(
    candidate: &Candidate,
    snapshots: &DimensionSnapshots,
    weights: &WeightState,
    suggestion_threshold: f64,
) -> ScoreResult {
    let scores = PerDimension::from_fn(|dim| score_dimension(dim, candidate, snapshots));
    let weights = *weights.weights();
    let total = scores.iter().map(|(dim, s)| s * weights[dim]).sum();

    let suggestions = scores
        .iter()
        .filter(|&(_, &s)| s < suggestion_threshold)
        .map(|(dim, _)| suggestion_for(dim).to_string())
        .collect();

    ScoreResult {
        scores,
        total,
        weights,
        suggestions,
    }
}

pub fn score_dimension(dim: Dimension, candidate: &Candidate, snapshots: &DimensionSnapshots) -> f64 {
    let raw = match dim {
        Dimension::HotCold => score_hot_cold(candidate, snapshots),
        Dimension::Missing => score_missing(candidate, snapshots),
        Dimension::Interval => score_interval(candidate, snapshots),
        Dimension::OddEven => score_odd_even(candidate, snapshots),
        Dimension::Zone => score_zone(candidate, snapshots),
    };
    raw.clamp(0.0, 100.0)
}

fn score_hot_cold(candidate: &Candidate, snapshots: &DimensionSnapshots) -> f64 {
    let (mut hot, mut warm, mut cold) = (0, 0, 0);
    for &r in &candidate.reds {
        match snapshots.hot_cold.heat_of(r) {
            Heat::Hot => hot += 1,
            Heat::Warm => warm += 1,
            Heat::Cold => cold += 1,
        }
    }
    let part = |ok: bool| if ok { 100.0 } else { 60.0 };
    0.4 * part((2..=3).contains(&hot)) + 0.4 * part((2..=3).contains(&warm)) + 0.2 * part(cold == 1)
}

fn score_missing(candidate: &Candidate, snapshots: &DimensionSnapshots) -> f64 {
    let gaps: Vec<u64> = candidate
        .reds
        .iter()
        .map(|&r| snapshots.missing.red_gap(r))
        .collect();
    let long = gaps.iter().filter(|&&g| g > LONG_GAP).count();

    let mut score = 100.0;
    if long == 0 {
        score -= 20.0;
    } else if long > 2 {
        score -= 10.0;
    }

    let max = gaps.iter().copied().max().unwrap_or(0);
    let min = gaps.iter().copied().min().unwrap_or(0);
    if max - min > 20 {
        score -= 10.0;
    }
    score
}

fn score_interval(candidate: &Candidate, snapshots: &DimensionSnapshots) -> f64 {
    let mut score = 100.0;
    for gap in consecutive_gaps(&candidate.reds) {
        if gap > 8 {
            score -= 10.0;
        } else if gap == 1 {
            score -= 5.0;
        }
        if snapshots.interval.frequency_of(gap) < RARE_INTERVAL {
            score -= 5.0;
        }
    }
    score
}

fn score_odd_even(candidate: &Candidate, snapshots: &DimensionSnapshots) -> f64 {
    let split = odd_even_split(&candidate.reds);
    if snapshots.odd_even.top.contains(&split) {
        return 100.0;
    }
    match split.0 {
        2..=4 => 80.0,
        1 | 5 => 60.0,
        _ => 40.0,
    }
}

fn score_zone(candidate: &Candidate, snapshots: &DimensionSnapshots) -> f64 {
    let zones = zone_distribution(&candidate.reds);
    if snapshots.zone.top.contains(&zones) {
        100.0
    } else if zones.iter().all(|&z| z >= 1) {
        80.0
    } else if zones.iter().any(|&z| z >= 4) {
        60.0
    } else {
        40.0
    }
}

fn suggestion_for(dim: Dimension) -> &'static str {
    match dim {
        Dimension::HotCold => "Viser 2-3 numéros chauds, 2-3 tièdes et un seul froid",
        Dimension::Missing => "Inclure 1 ou 2 numéros en retard (plus de 10 tirages) et resserrer les retards",
        Dimension::Interval => "Éviter les écarts supérieurs à 8 et les numéros consécutifs",
        Dimension::OddEven => "Équilibrer pairs et impairs (2 à 4 impairs)",
        Dimension::Zone => "Répartir les numéros sur les trois zones",
    }
}
