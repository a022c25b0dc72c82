use std::collections::VecDeque;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::WeightConfig;
use crate::dimension::{Dimension, PerDimension};

const SUM_TOLERANCE: f64 = 1e-9;

/// Poids courants des cinq dimensions (somme = 1).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightState {
    weights: PerDimension<f64>,
}

impl WeightState {
    pub fn new(config: &WeightConfig) -> Self {
        Self {
            weights: config.defaults,
        }
    }

    /// Vérifie somme et bornes avant d'accepter des poids externes.
    pub fn from_weights(weights: PerDimension<f64>, config: &WeightConfig) -> Result<Self> {
        let sum = weights.sum();
        if (sum - 1.0).abs() > 1e-6 {
            bail!("Somme des poids invalide : {sum:.6} (attendu 1.0)");
        }
        for (dim, &w) in weights.iter() {
            if w < config.min_weight - SUM_TOLERANCE || w > config.max_weight + SUM_TOLERANCE {
                bail!(
                    "Poids {dim} = {w:.4} hors limites [{}, {}]",
                    config.min_weight,
                    config.max_weight
                );
            }
        }
        Ok(Self { weights })
    }

    pub fn weights(&self) -> &PerDimension<f64> {
        &self.weights
    }

    pub fn get(&self, dim: Dimension) -> f64 {
        self.weights[dim]
    }
}

impl Default for WeightState {
    fn default() -> Self {
        Self::new(&WeightConfig::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub score: f64,
    pub hit: bool,
}

/// Historique borné (score, gagnant ?) par dimension, le plus ancien en tête.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutcomeLog {
    entries: PerDimension<VecDeque<Outcome>>,
}

impl OutcomeLog {
    pub fn entries(&self, dim: Dimension) -> &VecDeque<Outcome> {
        &self.entries[dim]
    }

    pub fn len(&self, dim: Dimension) -> usize {
        self.entries[dim].len()
    }

    /// Taille du plus petit historique.
    pub fn min_len(&self) -> usize {
        Dimension::ALL.iter().map(|&d| self.len(d)).min().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        Dimension::ALL.iter().all(|&d| self.entries[d].is_empty())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RebalanceStatus {
    Applied { performance: PerDimension<f64> },
    InsufficientSamples { min_len: usize, required: usize },
    NoSignal,
}

impl std::fmt::Display for RebalanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RebalanceStatus::Applied { .. } => write!(f, "poids rééquilibrés"),
            RebalanceStatus::InsufficientSamples { min_len, required } => {
                write!(f, "historique insuffisant ({min_len}/{required} par dimension)")
            }
            RebalanceStatus::NoSignal => write!(f, "aucun signal discriminant, poids inchangés"),
        }
    }
}

pub struct WeightAdjuster {
    config: WeightConfig,
}

impl WeightAdjuster {
    pub fn new(config: WeightConfig) -> Self {
        Self { config }
    }

    pub fn initial_state(&self) -> WeightState {
        WeightState::new(&self.config)
    }

    pub fn record_outcome(&self, log: &mut OutcomeLog, scores: &PerDimension<f64>, hit: bool) {
        for dim in Dimension::ALL {
            let entries = &mut log.entries[dim];
            entries.push_back(Outcome {
                score: scores[dim],
                hit,
            });
            while entries.len() > self.config.history_cap {
                entries.pop_front();
            }
        }
    }

    /// Écart moyen de score entre grilles gagnantes et perdantes.
    pub fn performance(&self, log: &OutcomeLog) -> PerDimension<f64> {
        PerDimension::from_fn(|dim| {
            let (mut hit_sum, mut hit_n, mut miss_sum, mut miss_n) = (0.0, 0usize, 0.0, 0usize);
            for o in log.entries(dim) {
                if o.hit {
                    hit_sum += o.score;
                    hit_n += 1;
                } else {
                    miss_sum += o.score;
                    miss_n += 1;
                }
            }
            if hit_n == 0 || miss_n == 0 {
                0.0
            } else {
                hit_sum / hit_n as f64 - miss_sum / miss_n as f64
            }
        })
    }

    pub fn rebalance(&self, state: &WeightState, log: &OutcomeLog) -> (WeightState, RebalanceStatus) {
        let min_len = log.min_len();
        if min_len < self.config.min_samples {
            let status = RebalanceStatus::InsufficientSamples {
                min_len,
                required: self.config.min_samples,
            };
            debug!(min_len, required = self.config.min_samples, "rééquilibrage ignoré");
            return (*state, status);
        }

        let performance = self.performance(log);
        let total_abs: f64 = performance.values().iter().map(|p| p.abs()).sum();
        if total_abs == 0.0 {
            debug!("aucun signal discriminant");
            return (*state, RebalanceStatus::NoSignal);
        }

        let adjusted = PerDimension::from_fn(|dim| {
            let delta = performance[dim] / total_abs * self.config.adjust_rate;
            (state.weights[dim] + delta).clamp(self.config.min_weight, self.config.max_weight)
        });
        let weights = self.normalize_bounded(adjusted);

        info!(
            hot_cold = weights[Dimension::HotCold],
            missing = weights[Dimension::Missing],
            interval = weights[Dimension::Interval],
            odd_even = weights[Dimension::OddEven],
            zone = weights[Dimension::Zone],
            "poids rééquilibrés"
        );
        (WeightState { weights }, RebalanceStatus::Applied { performance })
    }

    /// Ramène la somme à 1 sans sortir de [min_weight, max_weight] :
    /// les poids qui débordent sont fixés à la borne, les autres absorbent le reste.
    fn normalize_bounded(&self, mut weights: PerDimension<f64>) -> PerDimension<f64> {
        let (lo, hi) = (self.config.min_weight, self.config.max_weight);
        let mut pinned = [false; 5];

        for _ in 0..=Dimension::ALL.len() {
            let pinned_sum: f64 = (0..5).filter(|&i| pinned[i]).map(|i| weights.0[i]).sum();
            let free_sum: f64 = (0..5).filter(|&i| !pinned[i]).map(|i| weights.0[i]).sum();
            if free_sum <= 0.0 {
                break;
            }
            let scale = (1.0 - pinned_sum) / free_sum;

            let mut changed = false;
            for i in 0..5 {
                if pinned[i] {
                    continue;
                }
                let w = weights.0[i] * scale;
                if w < lo || w > hi {
                    weights.0[i] = w.clamp(lo, hi);
                    pinned[i] = true;
                    changed = true;
                } else {
                    weights.0[i] = w;
                }
            }
            if !changed {
                break;
            }
        }
        weights
    }
}

/// Poids et historique persistés entre deux exécutions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeightFile {
    pub state: WeightState,
    pub log: OutcomeLog,
}

pub fn save_weights(file: &WeightFile, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Impossible de créer {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(file)?;
    std::fs::write(path, json).with_context(|| format!("Impossible d'écrire {}", path.display()))?;
    Ok(())
}

pub fn load_weights(path: &Path, config: &WeightConfig) -> Result<WeightFile> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {}", path.display()))?;
    let file: WeightFile = serde_json::from_str(&json)
        .with_context(|| format!("Fichier de poids invalide : {}", path.display()))?;
    WeightState::from_weights(file.state.weights, config)?;
    Ok(file)
}

/// Charge le fichier s'il existe, sinon les poids par défaut.
pub fn load_or_default(path: &Path, config: &WeightConfig) -> Result<WeightFile> {
    if path.exists() {
        load_weights(path, config)
    } else {
        debug!(path = %path.display(), "pas de fichier de poids, valeurs par défaut");
        Ok(WeightFile {
            state: WeightState::new(config),
            log: OutcomeLog::default(),
        })
    }
}
