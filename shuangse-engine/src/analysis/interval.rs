use std::collections::BTreeMap;

use shuangse_db::models::DrawRecord;

#[derive(Debug, Clone, Default)]
pub struct IntervalSnapshot {
    /// Écart entre deux rouges consécutives => nombre d'occurrences.
    pub gap_frequency: BTreeMap<u8, u32>,
    /// Écart moyen de chaque tirage, dans l'ordre de l'historique.
    pub average_gaps: Vec<f64>,
}

impl IntervalSnapshot {
    pub fn frequency_of(&self, gap: u8) -> u32 {
        self.gap_frequency.get(&gap).copied().unwrap_or(0)
    }

    pub fn mean_gap(&self) -> f64 {
        if self.average_gaps.is_empty() {
            0.0
        } else {
            self.average_gaps.iter().sum::<f64>() / self.average_gaps.len() as f64
        }
    }
}

/// Les 5 écarts consécutifs d'une combinaison triée.
pub fn consecutive_gaps(sorted_reds: &[u8; 6]) -> [u8; 5] {
    let mut gaps = [0u8; 5];
    for (i, pair) in sorted_reds.windows(2).enumerate() {
        gaps[i] = pair[1] - pair[0];
    }
    gaps
}

pub fn analyze_interval(draws: &[DrawRecord], window: usize) -> IntervalSnapshot {
    let mut snap = IntervalSnapshot::default();

    for draw in draws.iter().take(window) {
        let gaps = consecutive_gaps(&draw.reds);
        for &g in &gaps {
            *snap.gap_frequency.entry(g).or_insert(0) += 1;
        }
        let avg = gaps.iter().map(|&g| g as f64).sum::<f64>() / gaps.len() as f64;
        snap.average_gaps.push(avg);
    }

    snap
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consecutive_gaps() {
        assert_eq!(consecutive_gaps(&[1, 2, 5, 10, 20, 33]), [1, 3, 5, 10, 13]);
    }

    #[test]
    fn test_interval_frequency_and_average() {
        let draws = vec![
            DrawRecord::new("2", "2024-01-01", &[1, 2, 3, 4, 5, 6], 1).unwrap(),
            DrawRecord::new("1", "2024-01-01", &[1, 3, 5, 7, 9, 11], 1).unwrap(),
        ];
        let snap = analyze_interval(&draws, 100);
        assert_eq!(snap.frequency_of(1), 5);
        assert_eq!(snap.frequency_of(2), 5);
        assert_eq!(snap.frequency_of(3), 0);
        assert_eq!(snap.average_gaps, vec![1.0, 2.0]);
        assert!((snap.mean_gap() - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_interval_window() {
        let draws = vec![
            DrawRecord::new("2", "2024-01-01", &[1, 2, 3, 4, 5, 6], 1).unwrap(),
            DrawRecord::new("1", "2024-01-01", &[1, 3, 5, 7, 9, 11], 1).unwrap(),
        ];
        let snap = analyze_interval(&draws, 1);
        assert_eq!(snap.frequency_of(2), 0);
        assert_eq!(snap.average_gaps.len(), 1);
    }

    #[test]
    fn test_interval_empty_history() {
        let snap = analyze_interval(&[], 100);
        assert!(snap.gap_frequency.is_empty());
        assert_eq!(snap.mean_gap(), 0.0);
    }
}
