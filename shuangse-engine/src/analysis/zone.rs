use std::collections::BTreeMap;

use shuangse_db::models::DrawRecord;

use super::top_keys;

pub const ZONE_WIDTH: u8 = 11;

#[derive(Debug, Clone, Default)]
pub struct ZoneSnapshot {
    /// Répartition [1-11, 12-22, 23-33] => nombre de tirages.
    pub frequency: BTreeMap<[u8; 3], u32>,
    pub top: Vec<[u8; 3]>,
}

pub fn zone_of(number: u8) -> usize {
    (number.saturating_sub(1) / ZONE_WIDTH).min(2) as usize
}

pub fn zone_distribution(reds: &[u8]) -> [u8; 3] {
    let mut zones = [0u8; 3];
    for &r in reds {
        zones[zone_of(r)] += 1;
    }
    zones
}

pub fn analyze_zone(draws: &[DrawRecord], window: usize) -> ZoneSnapshot {
    let mut frequency = BTreeMap::new();
    for draw in draws.iter().take(window) {
        *frequency.entry(zone_distribution(&draw.reds)).or_insert(0) += 1;
    }
    let top = top_keys(&frequency, 3);
    ZoneSnapshot { frequency, top }
}
