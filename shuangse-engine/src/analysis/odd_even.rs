use std::collections::BTreeMap;

use shuangse_db::models::DrawRecord;

use super::top_keys;

#[derive(Debug, Clone, Default)]
pub struct OddEvenSnapshot {
    /// (impairs, pairs) => nombre de tirages.
    pub frequency: BTreeMap<(u8, u8), u32>,
    /// Les 3 répartitions les plus fréquentes.
    pub top: Vec<(u8, u8)>,
}

pub fn odd_even_split(reds: &[u8]) -> (u8, u8) {
    let odd = reds.iter().filter(|&&r| r % 2 == 1).count() as u8;
    (odd, reds.len() as u8 - odd)
}

pub fn analyze_odd_even(draws: &[DrawRecord], window: usize) -> OddEvenSnapshot {
    let mut frequency = BTreeMap::new();
    for draw in draws.iter().take(window) {
        *frequency.entry(odd_even_split(&draw.reds)).or_insert(0) += 1;
    }
    let top = top_keys(&frequency, 3);
    OddEvenSnapshot { frequency, top }
}
