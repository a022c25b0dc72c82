use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL};

use crate::import::ImportResult;
use shuangse_db::db::PredictionCounts;
use shuangse_db::models::{Candidate, DrawRecord, Pool, Prediction, format_reds};
use shuangse_engine::accuracy::AccuracyReport;
use shuangse_engine::analysis::DimensionSnapshots;
use shuangse_engine::analysis::hot_cold::Heat;
use shuangse_engine::dimension::Dimension;
use shuangse_engine::generator::{Acceptance, Generation};
use shuangse_engine::scoring::ScoreResult;
use shuangse_engine::weights::{OutcomeLog, RebalanceStatus, WeightState};

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn score_cell(score: f64, threshold: f64) -> Cell {
    let color = if score >= 80.0 {
        Color::Green
    } else if score < threshold {
        Color::Red
    } else {
        Color::White
    };
    Cell::new(format!("{:.1}", score)).fg(color)
}

pub fn display_draws(draws: &[DrawRecord]) {
    if draws.is_empty() {
        println!("Aucun tirage à afficher.");
        return;
    }

    let mut table = new_table(vec!["Tirage", "Date", "Rouges", "Bleue"]);
    for draw in draws {
        table.add_row(vec![
            draw.draw_id.clone(),
            draw.date.clone(),
            format_reds(&draw.reds),
            format!("{:02}", draw.blue),
        ]);
    }
    println!("{table}");
}

pub fn display_import_summary(result: &ImportResult) {
    println!("Import terminé :");
    println!("  Total lignes lues : {}", result.total_records);
    println!("  Insérés           : {}", result.inserted);
    println!("  Doublons ignorés  : {}", result.skipped);
    if result.errors > 0 {
        println!("  Erreurs           : {} (voir les avertissements)", result.errors);
    }
}

pub fn display_stats(snaps: &DimensionSnapshots) {
    println!(
        "\n📊 Statistiques ({} tirages, chauds/froids sur {})\n",
        snaps.history_len, snaps.hot_cold.window
    );

    println!("── Rouges (1-{}) ──", Pool::Red.size());
    let mut table = new_table(vec!["Numéro", "Apparitions", "Retard", "État"]);
    let mut reds: Vec<(u8, u32, u64)> = snaps
        .missing
        .red_gaps()
        .into_iter()
        .map(|(n, gap)| (n, snaps.hot_cold.count_of(n), gap))
        .collect();
    reds.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    for (n, count, gap) in reds {
        let heat = snaps.hot_cold.heat_of(n);
        let color = match heat {
            Heat::Hot => Color::Red,
            Heat::Warm => Color::Yellow,
            Heat::Cold => Color::Blue,
        };
        table.add_row(vec![
            Cell::new(format!("{:02}", n)),
            Cell::new(count),
            Cell::new(gap),
            Cell::new(heat.to_string()).fg(color),
        ]);
    }
    println!("{table}");

    println!("\n── Bleues (1-{}) ──", Pool::Blue.size());
    let mut table = new_table(vec!["Numéro", "Apparitions", "Retard"]);
    for (n, gap) in snaps.missing.blue_gaps() {
        table.add_row(vec![
            format!("{:02}", n),
            snaps.hot_cold.blue_counts[(n - 1) as usize].to_string(),
            gap.to_string(),
        ]);
    }
    println!("{table}");

    println!("\n── Répartitions fréquentes ──");
    let mut table = new_table(vec!["Dimension", "Motif", "Tirages"]);
    for key in &snaps.odd_even.top {
        table.add_row(vec![
            Dimension::OddEven.label().to_string(),
            format!("{} impairs / {} pairs", key.0, key.1),
            snaps.odd_even.frequency[key].to_string(),
        ]);
    }
    for key in &snaps.zone.top {
        table.add_row(vec![
            Dimension::Zone.label().to_string(),
            format!("{} / {} / {}", key[0], key[1], key[2]),
            snaps.zone.frequency[key].to_string(),
        ]);
    }
    println!("{table}");
    println!("Écart moyen entre rouges consécutives : {:.2}", snaps.interval.mean_gap());
}

pub fn display_candidates(candidates: &[Candidate]) {
    println!("\n🎲 Grilles aléatoires\n");
    let mut table = new_table(vec!["#", "Rouges", "Bleue"]);
    for (i, c) in candidates.iter().enumerate() {
        table.add_row(vec![
            (i + 1).to_string(),
            format_reds(&c.reds),
            format!("{:02}", c.blue),
        ]);
    }
    println!("{table}");
}

pub fn display_generation(generation: &Generation, threshold: f64) {
    println!("\n🎯 Grilles recommandées\n");
    let mut header = vec!["#", "Rouges", "Bleue"];
    header.extend(Dimension::ALL.iter().map(|d| d.label()));
    header.extend(["Total", "Seuil"]);
    let mut table = new_table(header);

    for (i, g) in generation.candidates.iter().enumerate() {
        let mut row = vec![
            Cell::new(i + 1),
            Cell::new(format_reds(&g.candidate.reds)),
            Cell::new(format!("{:02}", g.candidate.blue)),
        ];
        row.extend(g.score.scores.values().iter().map(|&s| score_cell(s, threshold)));
        row.push(Cell::new(format!("{:.2}", g.score.total)));
        let tag = Cell::new(g.acceptance.to_string());
        row.push(match g.acceptance {
            Acceptance::Strict => tag.fg(Color::Green),
            Acceptance::Relaxed => tag.fg(Color::Yellow),
        });
        table.add_row(row);
    }
    println!("{table}");

    if generation.relaxed {
        println!(
            "Seuil assoupli après {} essais : {} grille(s) sur {} au niveau demandé.",
            generation.attempts,
            generation.strict_count(),
            generation.candidates.len()
        );
    }
}

pub fn display_score(candidate: &Candidate, result: &ScoreResult, threshold: f64) {
    println!("\n🔍 Analyse de {candidate}\n");
    let mut table = new_table(vec!["Dimension", "Score", "Poids", "Contribution"]);
    for (dim, &score) in result.scores.iter() {
        let weight = result.weights[dim];
        table.add_row(vec![
            Cell::new(dim.label()),
            score_cell(score, threshold),
            Cell::new(format!("{:.3}", weight)),
            Cell::new(format!("{:.2}", score * weight)),
        ]);
    }
    table.add_row(vec![
        Cell::new("Total"),
        Cell::new(""),
        Cell::new(""),
        Cell::new(format!("{:.2}", result.total)),
    ]);
    println!("{table}");

    if result.suggestions.is_empty() {
        println!("Aucune amélioration suggérée.");
    } else {
        println!("Suggestions :");
        for s in &result.suggestions {
            println!("  - {s}");
        }
    }
}

/// Libellé d'état : en attente, non gagnant ou rang de gain.
pub fn prediction_status(prediction: &Prediction, latest_draw_id: Option<&str>) -> String {
    if !prediction.is_drawn(latest_draw_id) {
        return "En attente".to_string();
    }
    if prediction.checked_at.is_none() {
        return "À vérifier".to_string();
    }
    match prediction.prize_tier {
        Some(tier) => format!("Rang {tier}"),
        None => "Non gagnant".to_string(),
    }
}

pub fn display_predictions(predictions: &[Prediction], latest_draw_id: Option<&str>, counts: &PredictionCounts) {
    if predictions.is_empty() {
        println!("Aucune prédiction enregistrée.");
        return;
    }

    let mut table = new_table(vec![
        "#", "Tirage", "Type", "Grille", "Score", "Créée", "Rouges", "Bleue", "État",
    ]);
    for p in predictions {
        let checked = p.checked_at.is_some();
        let status = prediction_status(p, latest_draw_id);
        let status_cell = match p.prize_tier {
            Some(_) => Cell::new(status).fg(Color::Green),
            None => Cell::new(status),
        };
        table.add_row(vec![
            Cell::new(p.id),
            Cell::new(&p.draw_id),
            Cell::new(p.kind.to_string()),
            Cell::new(p.candidate.to_string()),
            Cell::new(p.total_score.map(|s| format!("{:.1}", s)).unwrap_or_else(|| "—".to_string())),
            Cell::new(&p.created_at),
            Cell::new(if checked { p.hit_count.to_string() } else { "—".to_string() }),
            Cell::new(if checked { if p.blue_hit { "oui" } else { "non" } } else { "—" }),
            status_cell,
        ]);
    }
    println!("{table}");
    println!(
        "Taux de réussite : {}/{} grilles gagnantes ({:.1} %)",
        counts.hits,
        counts.total,
        counts.hit_rate()
    );
}

pub fn display_accuracy(report: &AccuracyReport) {
    println!(
        "\n✅ Tirage {} : {} + {:02}\n",
        report.draw.draw_id,
        format_reds(&report.draw.reds),
        report.draw.blue
    );
    if report.checks.is_empty() {
        println!("Aucune prédiction pour ce tirage.");
        return;
    }

    let mut table = new_table(vec!["#", "Grille", "Rouges", "Bleue", "Gain"]);
    for c in &report.checks {
        table.add_row(vec![
            c.prediction_id.to_string(),
            c.candidate.to_string(),
            c.red_hits.to_string(),
            if c.blue_hit { "oui" } else { "non" }.to_string(),
            c.prize_tier
                .map(|t| format!("Rang {t}"))
                .unwrap_or_else(|| "—".to_string()),
        ]);
    }
    println!("{table}");
    println!(
        "{} grille(s) gagnante(s), {} transmise(s) à l'ajustement des poids.",
        report.hits(),
        report.fed()
    );
}

pub fn display_weights(state: &WeightState, log: &OutcomeLog, status: Option<&RebalanceStatus>) {
    println!("\n⚖️  Poids des dimensions\n");
    let mut table = new_table(vec!["Dimension", "Poids", "Historique", "Écart gagnants/perdants"]);
    let performance = match status {
        Some(RebalanceStatus::Applied { performance }) => Some(performance),
        _ => None,
    };
    for (dim, &w) in state.weights().iter() {
        table.add_row(vec![
            dim.label().to_string(),
            format!("{:.4}", w),
            log.len(dim).to_string(),
            performance
                .map(|p| format!("{:+.2}", p[dim]))
                .unwrap_or_else(|| "—".to_string()),
        ]);
    }
    println!("{table}");
    if let Some(status) = status {
        println!("Rééquilibrage : {status}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shuangse_db::models::PredictionKind;

    #[test]
    fn test_prediction_status() {
        let cand = Candidate::new(&[1, 2, 3, 4, 5, 6], 7).unwrap();
        let mut p = Prediction::new("2024010", cand, PredictionKind::Analysis);

        assert_eq!(prediction_status(&p, Some("2024009")), "En attente");
        assert_eq!(prediction_status(&p, None), "En attente");
        assert_eq!(prediction_status(&p, Some("2024010")), "À vérifier");

        p.checked_at = Some("2024-01-10 21:30".to_string());
        assert_eq!(prediction_status(&p, Some("2024011")), "Non gagnant");

        p.prize_tier = Some(4);
        assert_eq!(prediction_status(&p, Some("2024011")), "Rang 4");
    }
}
