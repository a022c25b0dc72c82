use tracing::{info, warn};

use shuangse_db::models::{Candidate, DrawRecord};

use crate::dimension::PerDimension;
use crate::error::{EngineError, EngineResult};
use crate::history::{HistoryProvider, PredictionStore};
use crate::weights::{OutcomeLog, WeightAdjuster};

/// Rang de gain (1 = premier rang), `None` si la grille ne gagne rien.
pub fn prize_tier(red_hits: usize, blue_hit: bool) -> Option<u8> {
    match (red_hits, blue_hit) {
        (6, true) => Some(1),
        (6, false) => Some(2),
        (5, true) => Some(3),
        (5, false) | (4, true) => Some(4),
        (4, false) | (3, true) => Some(5),
        (0..=2, true) => Some(6),
        _ => None,
    }
}

#[derive(Debug, Clone)]
pub struct PredictionCheck {
    pub prediction_id: i64,
    pub candidate: Candidate,
    pub red_hits: usize,
    pub blue_hit: bool,
    pub prize_tier: Option<u8>,
    /// Scores transmis à l'historique des poids.
    pub fed: bool,
}

#[derive(Debug, Clone)]
pub struct AccuracyReport {
    pub draw: DrawRecord,
    pub checks: Vec<PredictionCheck>,
}

impl AccuracyReport {
    pub fn hits(&self) -> usize {
        self.checks.iter().filter(|c| c.prize_tier.is_some()).count()
    }

    pub fn fed(&self) -> usize {
        self.checks.iter().filter(|c| c.fed).count()
    }
}

#[derive(Debug, Clone)]
pub enum CheckOutcome {
    /// Tirage absent de l'historique : rien à faire pour l'instant.
    NotDrawn(String),
    Checked(AccuracyReport),
}

pub struct AccuracyChecker<'a, H, S>
where
    H: HistoryProvider + ?Sized,
    S: PredictionStore + ?Sized,
{
    history: &'a H,
    store: &'a S,
    adjuster: &'a WeightAdjuster,
}

impl<'a, H, S> AccuracyChecker<'a, H, S>
where
    H: HistoryProvider + ?Sized,
    S: PredictionStore + ?Sized,
{
    pub fn new(history: &'a H, store: &'a S, adjuster: &'a WeightAdjuster) -> Self {
        Self {
            history,
            store,
            adjuster,
        }
    }

    fn lookup(&self, draw_id: &str) -> EngineResult<DrawRecord> {
        self.history
            .get_by_draw_id(draw_id)?
            .ok_or_else(|| EngineError::NotFound(draw_id.to_string()))
    }

    /// Évalue toutes les grilles enregistrées pour `draw_id` et les persiste.
    pub fn check_accuracy(&self, draw_id: &str, log: &mut OutcomeLog) -> EngineResult<CheckOutcome> {
        let draw = match self.lookup(draw_id) {
            Ok(draw) => draw,
            Err(EngineError::NotFound(id)) => {
                warn!(draw_id = %id, "tirage absent, vérification reportée");
                return Ok(CheckOutcome::NotDrawn(id));
            }
            Err(e) => return Err(e),
        };

        let checked_at = chrono::Local::now().format("%Y-%m-%d %H:%M").to_string();
        let mut checks = Vec::new();

        for mut prediction in self.store.find_by_draw_id(draw_id)? {
            let red_hits = prediction.candidate.red_hits(&draw);
            let blue_hit = prediction.candidate.blue == draw.blue;
            let tier = prize_tier(red_hits, blue_hit);
            let first_check = prediction.checked_at.is_none();

            prediction.hit_count = red_hits as u8;
            prediction.blue_hit = blue_hit;
            prediction.prize_tier = tier;
            prediction.is_hit = tier.is_some();
            if first_check {
                prediction.checked_at = Some(checked_at.clone());
            }
            self.store.update(&prediction)?;

            let fed = match prediction.scores {
                Some(scores) if first_check => {
                    self.adjuster
                        .record_outcome(log, &PerDimension(scores), prediction.is_hit);
                    true
                }
                _ => false,
            };

            info!(
                draw_id,
                prediction = prediction.id,
                red_hits,
                blue_hit,
                tier = ?tier,
                "grille vérifiée"
            );
            checks.push(PredictionCheck {
                prediction_id: prediction.id,
                candidate: prediction.candidate,
                red_hits,
                blue_hit,
                prize_tier: tier,
                fed,
            });
        }

        Ok(CheckOutcome::Checked(AccuracyReport { draw, checks }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WeightConfig;
    use crate::dimension::Dimension;
    use crate::history::MemoryStore;
    use shuangse_db::models::{Prediction, PredictionKind};

    fn store_with_draw() -> MemoryStore {
        MemoryStore::new(vec![
            DrawRecord::new("2024050", "2024-05-01", &[1, 2, 3, 4, 5, 6], 7).unwrap(),
        ])
    }

    fn analysis_prediction(reds: &[u8], blue: u8) -> Prediction {
        Prediction::new("2024050", Candidate::new(reds, blue).unwrap(), PredictionKind::Analysis)
            .with_scores([80.0, 70.0, 60.0, 100.0, 80.0], 78.0)
    }

    #[test]
    fn test_prize_tier_table() {
        assert_eq!(prize_tier(6, true), Some(1));
        assert_eq!(prize_tier(6, false), Some(2));
        assert_eq!(prize_tier(5, true), Some(3));
        assert_eq!(prize_tier(5, false), Some(4));
        assert_eq!(prize_tier(4, true), Some(4));
        assert_eq!(prize_tier(4, false), Some(5));
        assert_eq!(prize_tier(3, true), Some(5));
        assert_eq!(prize_tier(2, true), Some(6));
        assert_eq!(prize_tier(0, true), Some(6));
        assert_eq!(prize_tier(3, false), None);
        assert_eq!(prize_tier(0, false), None);
    }

    #[test]
    fn test_five_reds_and_blue_is_tier_three() {
        let store = store_with_draw();
        store.add_prediction(analysis_prediction(&[1, 2, 3, 4, 5, 16], 7));
        let adjuster = WeightAdjuster::new(WeightConfig::default());
        let mut log = OutcomeLog::default();

        let outcome = AccuracyChecker::new(&store, &store, &adjuster)
            .check_accuracy("2024050", &mut log)
            .unwrap();
        let CheckOutcome::Checked(report) = outcome else {
            panic!("tirage attendu");
        };
        assert_eq!(report.checks.len(), 1);
        assert_eq!(report.checks[0].red_hits, 5);
        assert!(report.checks[0].blue_hit);
        assert_eq!(report.checks[0].prize_tier, Some(3));
        assert_eq!(report.hits(), 1);

        let saved = &store.predictions()[0];
        assert!(saved.is_hit);
        assert_eq!(saved.hit_count, 5);
        assert_eq!(saved.prize_tier, Some(3));
        assert!(saved.checked_at.is_some());

        assert_eq!(log.len(Dimension::HotCold), 1);
        assert!(log.entries(Dimension::OddEven)[0].hit);
        assert_eq!(log.entries(Dimension::OddEven)[0].score, 100.0);
    }

    #[test]
    fn test_no_hits_no_tier() {
        let store = store_with_draw();
        store.add_prediction(analysis_prediction(&[10, 11, 12, 13, 14, 15], 8));
        let adjuster = WeightAdjuster::new(WeightConfig::default());
        let mut log = OutcomeLog::default();

        let CheckOutcome::Checked(report) = AccuracyChecker::new(&store, &store, &adjuster)
            .check_accuracy("2024050", &mut log)
            .unwrap()
        else {
            panic!("tirage attendu");
        };
        assert_eq!(report.checks[0].red_hits, 0);
        assert!(!report.checks[0].blue_hit);
        assert_eq!(report.checks[0].prize_tier, None);
        assert!(!store.predictions()[0].is_hit);
        assert!(!log.entries(Dimension::Zone)[0].hit);
    }

    #[test]
    fn test_missing_draw_is_not_drawn() {
        let store = store_with_draw();
        store.add_prediction(analysis_prediction(&[1, 2, 3, 4, 5, 6], 7));
        let adjuster = WeightAdjuster::new(WeightConfig::default());
        let mut log = OutcomeLog::default();

        let outcome = AccuracyChecker::new(&store, &store, &adjuster)
            .check_accuracy("2024051", &mut log)
            .unwrap();
        assert!(matches!(outcome, CheckOutcome::NotDrawn(ref id) if id == "2024051"));
        assert!(log.is_empty());
    }

    #[test]
    fn test_random_predictions_do_not_feed_weights() {
        let store = store_with_draw();
        let cand = Candidate::new(&[1, 2, 3, 20, 21, 22], 7).unwrap();
        store.add_prediction(Prediction::new("2024050", cand, PredictionKind::Random));
        let adjuster = WeightAdjuster::new(WeightConfig::default());
        let mut log = OutcomeLog::default();

        let CheckOutcome::Checked(report) = AccuracyChecker::new(&store, &store, &adjuster)
            .check_accuracy("2024050", &mut log)
            .unwrap()
        else {
            panic!("tirage attendu");
        };
        assert_eq!(report.checks[0].prize_tier, Some(5));
        assert_eq!(report.fed(), 0);
        assert!(log.is_empty());
        assert!(store.predictions()[0].is_hit);
    }

    #[test]
    fn test_recheck_does_not_feed_twice() {
        let store = store_with_draw();
        store.add_prediction(analysis_prediction(&[1, 2, 3, 4, 5, 16], 7));
        let adjuster = WeightAdjuster::new(WeightConfig::default());
        let checker = AccuracyChecker::new(&store, &store, &adjuster);
        let mut log = OutcomeLog::default();

        checker.check_accuracy("2024050", &mut log).unwrap();
        let first_checked_at = store.predictions()[0].checked_at.clone();
        checker.check_accuracy("2024050", &mut log).unwrap();

        assert_eq!(log.len(Dimension::Missing), 1);
        assert_eq!(store.predictions()[0].checked_at, first_checked_at);
        assert_eq!(store.predictions()[0].prize_tier, Some(3));
    }
}
