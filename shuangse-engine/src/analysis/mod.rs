pub mod hot_cold;
pub mod interval;
pub mod missing;
pub mod odd_even;
pub mod zone;

use std::cell::OnceCell;
use std::collections::BTreeMap;

use anyhow::Result;
use shuangse_db::models::DrawRecord;
use tracing::debug;

use crate::config::AnalysisConfig;
use crate::history::HistoryProvider;
use hot_cold::{HotColdSnapshot, analyze_hot_cold};
use interval::{IntervalSnapshot, analyze_interval};
use missing::{MissingSnapshot, analyze_missing};
use odd_even::{OddEvenSnapshot, analyze_odd_even};
use zone::{ZoneSnapshot, analyze_zone};

/// Les `n` clés les plus fréquentes ; à égalité, la plus petite clé d'abord.
pub(crate) fn top_keys<K: Ord + Copy>(frequency: &BTreeMap<K, u32>, n: usize) -> Vec<K> {
    let mut entries: Vec<(K, u32)> = frequency.iter().map(|(&k, &c)| (k, c)).collect();
    // BTreeMap itère déjà par clé croissante ; le tri stable conserve cet ordre à égalité.
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    entries.into_iter().take(n).map(|(k, _)| k).collect()
}

/// Les cinq vues statistiques sur un même historique.
#[derive(Debug, Clone)]
pub struct DimensionSnapshots {
    pub hot_cold: HotColdSnapshot,
    pub missing: MissingSnapshot,
    pub interval: IntervalSnapshot,
    pub odd_even: OddEvenSnapshot,
    pub zone: ZoneSnapshot,
    /// Nombre de tirages disponibles lors de l'analyse.
    pub history_len: usize,
}

impl DimensionSnapshots {
    /// Calcule toutes les dimensions ; `draws[0]` = tirage le plus récent.
    pub fn compute(draws: &[DrawRecord], config: &AnalysisConfig) -> Self {
        if draws.len() < config.hot_cold_window {
            debug!(
                available = draws.len(),
                window = config.hot_cold_window,
                "historique court, dimensions partielles"
            );
        }
        Self {
            hot_cold: analyze_hot_cold(draws, config.hot_cold_window, config.hot_threshold),
            missing: analyze_missing(draws),
            interval: analyze_interval(draws, config.frequency_window),
            odd_even: analyze_odd_even(draws, config.frequency_window),
            zone: analyze_zone(draws, config.frequency_window),
            history_len: draws.len(),
        }
    }
}

/// Analyse les dimensions à partir d'un fournisseur d'historique.
///
/// L'historique complet est chargé au premier besoin puis réutilisé par
/// toutes les sous-analyses ; [`DimensionAnalyzer::reload`] l'invalide.
pub struct DimensionAnalyzer<'a, P: HistoryProvider + ?Sized> {
    provider: &'a P,
    config: AnalysisConfig,
    cache: OnceCell<Vec<DrawRecord>>,
}

impl<'a, P: HistoryProvider + ?Sized> DimensionAnalyzer<'a, P> {
    pub fn new(provider: &'a P, config: AnalysisConfig) -> Self {
        Self {
            provider,
            config,
            cache: OnceCell::new(),
        }
    }

    pub fn history(&self) -> Result<&[DrawRecord]> {
        if let Some(draws) = self.cache.get() {
            return Ok(draws);
        }
        let loaded = self.provider.load_all()?;
        debug!(draws = loaded.len(), "historique chargé");
        Ok(self.cache.get_or_init(|| loaded))
    }

    pub fn reload(&mut self) {
        self.cache.take();
    }

    pub fn hot_cold(&self) -> Result<HotColdSnapshot> {
        let draws = self.history()?;
        Ok(analyze_hot_cold(draws, self.config.hot_cold_window, self.config.hot_threshold))
    }

    pub fn missing(&self) -> Result<MissingSnapshot> {
        Ok(analyze_missing(self.history()?))
    }

    pub fn interval(&self) -> Result<IntervalSnapshot> {
        Ok(analyze_interval(self.history()?, self.config.frequency_window))
    }

    pub fn odd_even(&self) -> Result<OddEvenSnapshot> {
        Ok(analyze_odd_even(self.history()?, self.config.frequency_window))
    }

    pub fn zone(&self) -> Result<ZoneSnapshot> {
        Ok(analyze_zone(self.history()?, self.config.frequency_window))
    }

    pub fn snapshots(&self) -> Result<DimensionSnapshots> {
        Ok(DimensionSnapshots::compute(self.history()?, &self.config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::{MemoryStore, make_test_draws};
    use std::cell::Cell;

    struct CountingProvider {
        inner: MemoryStore,
        loads: Cell<usize>,
    }

    impl HistoryProvider for CountingProvider {
        fn load_recent(&self, limit: usize) -> Result<Vec<DrawRecord>> {
            self.loads.set(self.loads.get() + 1);
            self.inner.load_recent(limit)
        }

        fn load_all(&self) -> Result<Vec<DrawRecord>> {
            self.loads.set(self.loads.get() + 1);
            self.inner.load_all()
        }

        fn get_by_draw_id(&self, draw_id: &str) -> Result<Option<DrawRecord>> {
            self.inner.get_by_draw_id(draw_id)
        }
    }

    #[test]
    fn test_top_keys_orders_by_count_then_key() {
        let freq = BTreeMap::from([(1u8, 2u32), (2, 5), (3, 2), (4, 1)]);
        assert_eq!(top_keys(&freq, 3), vec![2, 1, 3]);
        assert_eq!(top_keys(&freq, 10).len(), 4);
    }

    #[test]
    fn test_analyzer_loads_history_once() {
        let provider = CountingProvider {
            inner: MemoryStore::new(make_test_draws(100, 40)),
            loads: Cell::new(0),
        };
        let mut analyzer = DimensionAnalyzer::new(&provider, AnalysisConfig::default());

        analyzer.hot_cold().unwrap();
        analyzer.missing().unwrap();
        let snaps = analyzer.snapshots().unwrap();
        assert_eq!(provider.loads.get(), 1);
        assert_eq!(snaps.history_len, 40);

        analyzer.reload();
        analyzer.zone().unwrap();
        assert_eq!(provider.loads.get(), 2);
    }

    #[test]
    fn test_snapshots_degrade_on_empty_history() {
        let snaps = DimensionSnapshots::compute(&[], &AnalysisConfig::default());
        assert!(snaps.hot_cold.hot.is_empty());
        assert!(snaps.hot_cold.warm.is_empty());
        assert!(snaps.interval.gap_frequency.is_empty());
        assert!(snaps.odd_even.top.is_empty());
        assert!(snaps.zone.top.is_empty());
        assert_eq!(snaps.missing.latest_draw, 0);
    }

    #[test]
    fn test_sub_analyses_match_compute() {
        let draws = make_test_draws(2024001, 120);
        let config = AnalysisConfig::default();
        let store = MemoryStore::new(draws.clone());
        let analyzer = DimensionAnalyzer::new(&store, config.clone());

        let snaps = DimensionSnapshots::compute(&draws, &config);
        assert_eq!(analyzer.hot_cold().unwrap().hot, snaps.hot_cold.hot);
        assert_eq!(analyzer.odd_even().unwrap().top, snaps.odd_even.top);
        assert_eq!(analyzer.interval().unwrap().average_gaps.len(), 100);
    }
}
