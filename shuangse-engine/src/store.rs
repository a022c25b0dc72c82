use anyhow::Result;
use shuangse_db::db::{
    fetch_all_draws, fetch_draw, fetch_last_draws, fetch_predictions_for_draw,
    update_prediction_outcome,
};
use shuangse_db::models::{DrawRecord, Prediction};
use shuangse_db::rusqlite::Connection;

use crate::history::{HistoryProvider, PredictionStore};

impl HistoryProvider for Connection {
    fn load_recent(&self, limit: usize) -> Result<Vec<DrawRecord>> {
        let limit = u32::try_from(limit).unwrap_or(u32::MAX);
        fetch_last_draws(self, limit)
    }

    fn load_all(&self) -> Result<Vec<DrawRecord>> {
        fetch_all_draws(self)
    }

    fn get_by_draw_id(&self, draw_id: &str) -> Result<Option<DrawRecord>> {
        fetch_draw(self, draw_id)
    }
}

impl PredictionStore for Connection {
    fn find_by_draw_id(&self, draw_id: &str) -> Result<Vec<Prediction>> {
        fetch_predictions_for_draw(self, draw_id)
    }

    fn update(&self, prediction: &Prediction) -> Result<()> {
        update_prediction_outcome(self, prediction)
    }
}
