use shuangse_db::models::{BLUE_MAX, DrawRecord, RED_MAX};

/// Retards calculés sur tout l'historique chargé.
#[derive(Debug, Clone)]
pub struct MissingSnapshot {
    pub latest_draw: u64,
    red_last_seen: [Option<u64>; RED_MAX as usize],
    blue_last_seen: [Option<u64>; BLUE_MAX as usize],
}

impl MissingSnapshot {
    /// Écart en numéros de tirage depuis la dernière sortie ; jamais sorti => numéro du dernier tirage.
    pub fn red_gap(&self, number: u8) -> u64 {
        let seen = self
            .red_last_seen
            .get((number as usize).wrapping_sub(1))
            .copied()
            .flatten();
        gap_from(self.latest_draw, seen)
    }

    pub fn blue_gap(&self, number: u8) -> u64 {
        gap_from(self.latest_draw, self.blue_last_seen(number))
    }

    pub fn blue_last_seen(&self, number: u8) -> Option<u64> {
        self.blue_last_seen
            .get((number as usize).wrapping_sub(1))
            .copied()
            .flatten()
    }

    pub fn red_gaps(&self) -> Vec<(u8, u64)> {
        (1..=RED_MAX).map(|n| (n, self.red_gap(n))).collect()
    }

    pub fn blue_gaps(&self) -> Vec<(u8, u64)> {
        (1..=BLUE_MAX).map(|n| (n, self.blue_gap(n))).collect()
    }
}

fn gap_from(latest: u64, seen: Option<u64>) -> u64 {
    match seen {
        Some(last) => latest.saturating_sub(last),
        None => latest,
    }
}

pub fn analyze_missing(draws: &[DrawRecord]) -> MissingSnapshot {
    let mut red_last_seen = [None; RED_MAX as usize];
    let mut blue_last_seen = [None; BLUE_MAX as usize];
    let mut latest_draw = 0u64;

    for draw in draws {
        let id = draw.draw_number();
        latest_draw = latest_draw.max(id);
        for &r in &draw.reds {
            let slot: &mut Option<u64> = &mut red_last_seen[(r - 1) as usize];
            *slot = Some(slot.map_or(id, |prev| prev.max(id)));
        }
        let slot: &mut Option<u64> = &mut blue_last_seen[(draw.blue - 1) as usize];
        *slot = Some(slot.map_or(id, |prev| prev.max(id)));
    }

    MissingSnapshot {
        latest_draw,
        red_last_seen,
        blue_last_seen,
    }
}
