use std::cell::RefCell;

use anyhow::{Result, bail};
use shuangse_db::models::{DrawRecord, Prediction};

/// Source de l'historique des tirages, du plus récent au plus ancien.
pub trait HistoryProvider {
    fn load_recent(&self, limit: usize) -> Result<Vec<DrawRecord>>;
    fn load_all(&self) -> Result<Vec<DrawRecord>>;
    fn get_by_draw_id(&self, draw_id: &str) -> Result<Option<DrawRecord>>;

    fn latest(&self) -> Result<Option<DrawRecord>> {
        Ok(self.load_recent(1)?.into_iter().next())
    }
}

pub trait PredictionStore {
    fn find_by_draw_id(&self, draw_id: &str) -> Result<Vec<Prediction>>;
    fn update(&self, prediction: &Prediction) -> Result<()>;
}

/// Stockage en mémoire : tests et essais à blanc.
#[derive(Debug, Default)]
pub struct MemoryStore {
    draws: Vec<DrawRecord>,
    predictions: RefCell<Vec<Prediction>>,
}

impl MemoryStore {
    pub fn new(mut draws: Vec<DrawRecord>) -> Self {
        draws.sort_by(|a, b| b.draw_number().cmp(&a.draw_number()));
        Self {
            draws,
            predictions: RefCell::new(Vec::new()),
        }
    }

    pub fn add_prediction(&self, mut prediction: Prediction) -> i64 {
        let mut preds = self.predictions.borrow_mut();
        prediction.id = preds.len() as i64 + 1;
        let id = prediction.id;
        preds.push(prediction);
        id
    }

    pub fn predictions(&self) -> Vec<Prediction> {
        self.predictions.borrow().clone()
    }
}

impl HistoryProvider for MemoryStore {
    fn load_recent(&self, limit: usize) -> Result<Vec<DrawRecord>> {
        Ok(self.draws.iter().take(limit).cloned().collect())
    }

    fn load_all(&self) -> Result<Vec<DrawRecord>> {
        Ok(self.draws.clone())
    }

    fn get_by_draw_id(&self, draw_id: &str) -> Result<Option<DrawRecord>> {
        Ok(self.draws.iter().find(|d| d.draw_id == draw_id).cloned())
    }
}

impl PredictionStore for MemoryStore {
    fn find_by_draw_id(&self, draw_id: &str) -> Result<Vec<Prediction>> {
        Ok(self
            .predictions
            .borrow()
            .iter()
            .filter(|p| p.draw_id == draw_id)
            .cloned()
            .collect())
    }

    fn update(&self, prediction: &Prediction) -> Result<()> {
        let mut preds = self.predictions.borrow_mut();
        match preds.iter_mut().find(|p| p.id == prediction.id) {
            Some(slot) => {
                *slot = prediction.clone();
                Ok(())
            }
            None => bail!("Prédiction {} introuvable", prediction.id),
        }
    }
}

/// Historique synthétique : `n` tirages d'identifiants `first_id..first_id+n`,
/// renvoyés du plus récent au plus ancien.
pub fn make_test_draws(first_id: u64, n: usize) -> Vec<DrawRecord> {
    (0..n)
        .map(|i| {
            let base = (i % 5) as u8 * 6;
            let shift = (i % 3) as u8;
            let reds = [
                base + 1,
                base + 2 + shift,
                base + 4 + shift,
                (base + 11) % 33 + 1,
                (base + 17 + shift) % 33 + 1,
                (base + 24 + shift) % 33 + 1,
            ];
            let mut unique = reds.to_vec();
            unique.sort();
            unique.dedup();
            let mut filler = 1u8;
            while unique.len() < 6 {
                if !unique.contains(&filler) {
                    unique.push(filler);
                }
                filler += 1;
            }
            DrawRecord::new(
                &(first_id + i as u64).to_string(),
                &format!("2024-01-{:02}", (i % 28) + 1),
                &unique,
                (i % 16) as u8 + 1,
            )
            .expect("tirage de test valide")
        })
        .rev()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use shuangse_db::models::{Candidate, PredictionKind};

    #[test]
    fn test_make_test_draws_most_recent_first() {
        let draws = make_test_draws(100, 30);
        assert_eq!(draws.len(), 30);
        assert_eq!(draws[0].draw_id, "129");
        assert_eq!(draws[29].draw_id, "100");
    }

    #[test]
    fn test_memory_store_history() {
        let store = MemoryStore::new(make_test_draws(100, 10));
        assert_eq!(store.load_recent(3).unwrap().len(), 3);
        assert_eq!(store.latest().unwrap().unwrap().draw_id, "109");
        assert!(store.get_by_draw_id("105").unwrap().is_some());
        assert!(store.get_by_draw_id("200").unwrap().is_none());
    }

    #[test]
    fn test_memory_store_predictions() {
        let store = MemoryStore::default();
        let cand = Candidate::new(&[1, 2, 3, 4, 5, 6], 7).unwrap();
        let id = store.add_prediction(Prediction::new("10", cand, PredictionKind::Random));

        let mut pred = store.find_by_draw_id("10").unwrap().remove(0);
        assert_eq!(pred.id, id);
        pred.is_hit = true;
        store.update(&pred).unwrap();
        assert!(store.predictions()[0].is_hit);

        pred.id = 99;
        assert!(store.update(&pred).is_err());
    }
}
