use shuangse_db::models::{BLUE_MAX, DrawRecord, Pool, RED_MAX};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Heat {
    Hot,
    Warm,
    Cold,
}

impl std::fmt::Display for Heat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Heat::Hot => write!(f, "CHAUD"),
            Heat::Warm => write!(f, "TIÈDE"),
            Heat::Cold => write!(f, "FROID"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HotColdSnapshot {
    pub window: usize,
    /// Index = numéro − 1.
    pub red_counts: [u32; RED_MAX as usize],
    pub blue_counts: [u32; BLUE_MAX as usize],
    pub hot: Vec<u8>,
    pub warm: Vec<u8>,
    pub cold: Vec<u8>,
}

impl HotColdSnapshot {
    pub fn heat_of(&self, number: u8) -> Heat {
        if self.hot.contains(&number) {
            Heat::Hot
        } else if self.warm.contains(&number) {
            Heat::Warm
        } else {
            Heat::Cold
        }
    }

    pub fn count_of(&self, number: u8) -> u32 {
        self.red_counts
            .get((number as usize).wrapping_sub(1))
            .copied()
            .unwrap_or(0)
    }
}

fn count_pool(draws: &[DrawRecord], pool: Pool, counts: &mut [u32]) {
    for draw in draws {
        for &n in pool.numbers_from(draw) {
            counts[(n - 1) as usize] += 1;
        }
    }
}

/// Compte les apparitions sur les `window` tirages les plus récents.
/// `draws[0]` = tirage le plus récent.
pub fn analyze_hot_cold(draws: &[DrawRecord], window: usize, hot_threshold: u32) -> HotColdSnapshot {
    let recent = &draws[..window.min(draws.len())];
    let mut red_counts = [0u32; RED_MAX as usize];
    let mut blue_counts = [0u32; BLUE_MAX as usize];
    count_pool(recent, Pool::Red, &mut red_counts);
    count_pool(recent, Pool::Blue, &mut blue_counts);

    let mut hot = Vec::new();
    let mut warm = Vec::new();
    let mut cold = Vec::new();
    for (idx, &count) in red_counts.iter().enumerate() {
        let number = idx as u8 + 1;
        if count >= hot_threshold {
            hot.push(number);
        } else if count >= 1 {
            warm.push(number);
        } else {
            cold.push(number);
        }
    }

    HotColdSnapshot {
        window: window.min(draws.len()),
        red_counts,
        blue_counts,
        hot,
        warm,
        cold,
    }
}
