use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::dimension::PerDimension;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Fenêtre chauds/froids (nombre de tirages récents).
    pub hot_cold_window: usize,
    /// Fenêtre des dimensions de fréquence (écarts, pairs/impairs, zones).
    pub frequency_window: usize,
    /// Nombre minimal d'apparitions pour qu'un numéro soit chaud.
    pub hot_threshold: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            hot_cold_window: 30,
            frequency_window: 100,
            hot_threshold: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub min_score: f64,
    pub relaxed_min_score: f64,
    pub strict_attempts: usize,
    pub relaxed_attempts: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            min_score: 75.0,
            relaxed_min_score: 60.0,
            strict_attempts: 100,
            relaxed_attempts: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightConfig {
    pub adjust_rate: f64,
    pub min_weight: f64,
    pub max_weight: f64,
    /// Taille maximale de l'historique par dimension.
    pub history_cap: usize,
    /// Entrées requises dans chaque dimension avant un rééquilibrage.
    pub min_samples: usize,
    /// Ordre : hot_cold, missing, interval, odd_even, zone.
    pub defaults: PerDimension<f64>,
}

impl Default for WeightConfig {
    fn default() -> Self {
        Self {
            adjust_rate: 0.05,
            min_weight: 0.05,
            max_weight: 0.40,
            history_cap: 50,
            min_samples: 10,
            defaults: PerDimension([0.25, 0.20, 0.15, 0.20, 0.20]),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub analysis: AnalysisConfig,
    pub generator: GeneratorConfig,
    pub weights: WeightConfig,
    /// Une dimension sous ce score produit une suggestion d'amélioration.
    pub suggestion_threshold: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            analysis: AnalysisConfig::default(),
            generator: GeneratorConfig::default(),
            weights: WeightConfig::default(),
            suggestion_threshold: 70.0,
        }
    }
}

pub fn load_config(path: &Path) -> Result<EngineConfig> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire la configuration {:?}", path))?;
    let config: EngineConfig = serde_json::from_str(&json)
        .with_context(|| format!("Configuration invalide {:?}", path))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.analysis.hot_cold_window, 30);
        assert_eq!(config.analysis.frequency_window, 100);
        assert!((config.generator.min_score - 75.0).abs() < 1e-10);
        assert!((config.suggestion_threshold - 70.0).abs() < 1e-10);
    }

    #[test]
    fn test_default_weights_sum_to_one() {
        let weights = WeightConfig::default();
        assert!((weights.defaults.sum() - 1.0).abs() < 1e-12);
        for &w in weights.defaults.values() {
            assert!(w >= weights.min_weight && w <= weights.max_weight);
        }
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"analysis": {"hot_cold_window": 20}, "suggestion_threshold": 65.0}"#).unwrap();
        assert_eq!(config.analysis.hot_cold_window, 20);
        assert_eq!(config.analysis.frequency_window, 100);
        assert_eq!(config.weights.history_cap, 50);
        assert!((config.suggestion_threshold - 65.0).abs() < 1e-10);
    }
}
