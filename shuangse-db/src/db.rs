use anyhow::{Context, Result, bail};
use rusqlite::{Connection, OptionalExtension, Row};
use std::path::Path;

use crate::models::{Candidate, DrawRecord, Prediction, PredictionKind};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS draws (
    draw_id   TEXT PRIMARY KEY,
    date      TEXT NOT NULL,
    red_1     INTEGER NOT NULL,
    red_2     INTEGER NOT NULL,
    red_3     INTEGER NOT NULL,
    red_4     INTEGER NOT NULL,
    red_5     INTEGER NOT NULL,
    red_6     INTEGER NOT NULL,
    blue      INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS predictions (
    id                INTEGER PRIMARY KEY AUTOINCREMENT,
    draw_id           TEXT NOT NULL,
    red_1             INTEGER NOT NULL,
    red_2             INTEGER NOT NULL,
    red_3             INTEGER NOT NULL,
    red_4             INTEGER NOT NULL,
    red_5             INTEGER NOT NULL,
    red_6             INTEGER NOT NULL,
    blue              INTEGER NOT NULL,
    kind              TEXT NOT NULL,
    score_hot_cold    REAL,
    score_missing     REAL,
    score_interval    REAL,
    score_odd_even    REAL,
    score_zone        REAL,
    total_score       REAL,
    created_at        TEXT NOT NULL,
    hit_count         INTEGER NOT NULL DEFAULT 0,
    blue_hit          INTEGER NOT NULL DEFAULT 0,
    prize_tier        INTEGER,
    is_hit            INTEGER NOT NULL DEFAULT 0,
    checked_at        TEXT,
    UNIQUE (draw_id, red_1, red_2, red_3, red_4, red_5, red_6, blue, kind)
);

CREATE INDEX IF NOT EXISTS idx_predictions_draw ON predictions (draw_id);
";

const DRAW_COLUMNS: &str = "draw_id, date, red_1, red_2, red_3, red_4, red_5, red_6, blue";

const PREDICTION_COLUMNS: &str = "id, draw_id, red_1, red_2, red_3, red_4, red_5, red_6, blue, kind,
    score_hot_cold, score_missing, score_interval, score_odd_even, score_zone, total_score,
    created_at, hit_count, blue_hit, prize_tier, is_hit, checked_at";

pub fn db_path() -> std::path::PathBuf {
    let mut path = std::env::current_dir().unwrap_or_default();
    path.push("data");
    path.push("shuangse.db");
    path
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Impossible de créer le répertoire {:?}", parent))?;
    }
    let conn = Connection::open(path)
        .with_context(|| format!("Impossible d'ouvrir la base {:?}", path))?;
    Ok(conn)
}

pub fn migrate(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)
        .context("Échec de la migration")?;
    Ok(())
}

fn draw_from_row(row: &Row<'_>) -> rusqlite::Result<DrawRecord> {
    Ok(DrawRecord {
        draw_id: row.get(0)?,
        date: row.get(1)?,
        reds: [
            row.get::<_, u8>(2)?,
            row.get::<_, u8>(3)?,
            row.get::<_, u8>(4)?,
            row.get::<_, u8>(5)?,
            row.get::<_, u8>(6)?,
            row.get::<_, u8>(7)?,
        ],
        blue: row.get(8)?,
    })
}

pub fn insert_draw(conn: &Connection, draw: &DrawRecord) -> Result<bool> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO draws (draw_id, date, red_1, red_2, red_3, red_4, red_5, red_6, blue)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        rusqlite::params![
            draw.draw_id,
            draw.date,
            draw.reds[0],
            draw.reds[1],
            draw.reds[2],
            draw.reds[3],
            draw.reds[4],
            draw.reds[5],
            draw.blue,
        ],
    ).context("Échec de l'insertion")?;
    Ok(changed > 0)
}

pub fn fetch_last_draws(conn: &Connection, limit: u32) -> Result<Vec<DrawRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {DRAW_COLUMNS} FROM draws ORDER BY CAST(draw_id AS INTEGER) DESC LIMIT ?1"
    ))?;
    let draws = stmt.query_map([limit], draw_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(draws)
}

pub fn fetch_all_draws(conn: &Connection) -> Result<Vec<DrawRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {DRAW_COLUMNS} FROM draws ORDER BY CAST(draw_id AS INTEGER) DESC"
    ))?;
    let draws = stmt.query_map([], draw_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(draws)
}

/// Page de l'historique (page commence à 1), du plus récent au plus ancien.
pub fn fetch_draws_page(conn: &Connection, page: u32, per_page: u32) -> Result<Vec<DrawRecord>> {
    let offset = page.saturating_sub(1) * per_page;
    let mut stmt = conn.prepare(&format!(
        "SELECT {DRAW_COLUMNS} FROM draws ORDER BY CAST(draw_id AS INTEGER) DESC LIMIT ?1 OFFSET ?2"
    ))?;
    let draws = stmt.query_map([per_page, offset], draw_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(draws)
}

pub fn fetch_draw(conn: &Connection, draw_id: &str) -> Result<Option<DrawRecord>> {
    let draw = conn.query_row(
        &format!("SELECT {DRAW_COLUMNS} FROM draws WHERE draw_id = ?1"),
        [draw_id],
        draw_from_row,
    ).optional()?;
    Ok(draw)
}

pub fn count_draws(conn: &Connection) -> Result<u32> {
    let count: u32 = conn.query_row("SELECT COUNT(*) FROM draws", [], |row| row.get(0))?;
    Ok(count)
}

fn prediction_from_row(row: &Row<'_>) -> rusqlite::Result<Prediction> {
    let kind_str: String = row.get(9)?;
    let kind = PredictionKind::parse(&kind_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            9,
            rusqlite::types::Type::Text,
            format!("type de prédiction inconnu : {kind_str}").into(),
        )
    })?;

    let score_cols: [Option<f64>; 5] = [
        row.get(10)?,
        row.get(11)?,
        row.get(12)?,
        row.get(13)?,
        row.get(14)?,
    ];
    let scores = match score_cols {
        [Some(a), Some(b), Some(c), Some(d), Some(e)] => Some([a, b, c, d, e]),
        _ => None,
    };

    Ok(Prediction {
        id: row.get(0)?,
        draw_id: row.get(1)?,
        candidate: Candidate {
            reds: [
                row.get::<_, u8>(2)?,
                row.get::<_, u8>(3)?,
                row.get::<_, u8>(4)?,
                row.get::<_, u8>(5)?,
                row.get::<_, u8>(6)?,
                row.get::<_, u8>(7)?,
            ],
            blue: row.get(8)?,
        },
        kind,
        scores,
        total_score: row.get(15)?,
        created_at: row.get(16)?,
        hit_count: row.get(17)?,
        blue_hit: row.get(18)?,
        prize_tier: row.get(19)?,
        is_hit: row.get(20)?,
        checked_at: row.get(21)?,
    })
}

/// Enregistre une prédiction. Renvoie `None` si la même grille existe déjà pour ce tirage.
pub fn insert_prediction(conn: &Connection, pred: &Prediction) -> Result<Option<i64>> {
    let reds = pred.candidate.reds;
    let scores = pred.scores.map(|s| s.map(Some)).unwrap_or([None; 5]);
    let changed = conn.execute(
        "INSERT OR IGNORE INTO predictions (draw_id, red_1, red_2, red_3, red_4, red_5, red_6, blue, kind,
            score_hot_cold, score_missing, score_interval, score_odd_even, score_zone, total_score, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
        rusqlite::params![
            pred.draw_id,
            reds[0],
            reds[1],
            reds[2],
            reds[3],
            reds[4],
            reds[5],
            pred.candidate.blue,
            pred.kind.as_str(),
            scores[0],
            scores[1],
            scores[2],
            scores[3],
            scores[4],
            pred.total_score,
            pred.created_at,
        ],
    ).context("Échec de l'enregistrement de la prédiction")?;
    if changed == 0 {
        return Ok(None);
    }
    Ok(Some(conn.last_insert_rowid()))
}

pub fn fetch_predictions_for_draw(conn: &Connection, draw_id: &str) -> Result<Vec<Prediction>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PREDICTION_COLUMNS} FROM predictions WHERE draw_id = ?1 ORDER BY id"
    ))?;
    let preds = stmt.query_map([draw_id], prediction_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(preds)
}

/// Page des prédictions, les plus récentes d'abord.
pub fn fetch_predictions_page(conn: &Connection, page: u32, per_page: u32) -> Result<Vec<Prediction>> {
    let offset = page.saturating_sub(1) * per_page;
    let mut stmt = conn.prepare(&format!(
        "SELECT {PREDICTION_COLUMNS} FROM predictions ORDER BY created_at DESC, id DESC LIMIT ?1 OFFSET ?2"
    ))?;
    let preds = stmt.query_map([per_page, offset], prediction_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(preds)
}

/// Met à jour les champs de résultat (rang, touches, contrôle) d'une prédiction existante.
pub fn update_prediction_outcome(conn: &Connection, pred: &Prediction) -> Result<()> {
    let changed = conn.execute(
        "UPDATE predictions
         SET hit_count = ?1, blue_hit = ?2, prize_tier = ?3, is_hit = ?4, checked_at = ?5
         WHERE id = ?6",
        rusqlite::params![
            pred.hit_count,
            pred.blue_hit,
            pred.prize_tier,
            pred.is_hit,
            pred.checked_at,
            pred.id,
        ],
    ).context("Échec de la mise à jour de la prédiction")?;
    if changed == 0 {
        bail!("Prédiction {} introuvable", pred.id);
    }
    Ok(())
}

pub struct PredictionCounts {
    pub total: u32,
    pub hits: u32,
}

impl PredictionCounts {
    pub fn hit_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.hits as f64 / self.total as f64 * 100.0
        }
    }
}

pub fn count_predictions(conn: &Connection) -> Result<PredictionCounts> {
    let (total, hits) = conn.query_row(
        "SELECT COUNT(*), COALESCE(SUM(is_hit), 0) FROM predictions",
        [],
        |row| Ok((row.get::<_, u32>(0)?, row.get::<_, u32>(1)?)),
    )?;
    Ok(PredictionCounts { total, hits })
}
