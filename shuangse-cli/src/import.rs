use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use indicatif::{ProgressBar, ProgressStyle};
use shuangse_db::db::insert_draw;
use shuangse_db::models::DrawRecord;
use shuangse_db::rusqlite::Connection;
use tracing::warn;

/// Colonnes : draw_id, date, red_1..red_6, blue.
fn parse_record(record: &csv::StringRecord) -> Result<DrawRecord> {
    let get = |idx: usize| -> Result<&str> {
        record
            .get(idx)
            .map(str::trim)
            .with_context(|| format!("Champ manquant à l'index {}", idx))
    };

    let get_u8 = |idx: usize| -> Result<u8> {
        let s = get(idx)?;
        s.parse::<u8>()
            .with_context(|| format!("Impossible de parser '{}' (index {})", s, idx))
    };

    let draw_id = get(0)?;
    let date = parse_date(get(1)?)?;
    let reds = [get_u8(2)?, get_u8(3)?, get_u8(4)?, get_u8(5)?, get_u8(6)?, get_u8(7)?];
    let blue = get_u8(8)?;

    DrawRecord::new(draw_id, &date, &reds, blue).with_context(|| format!("Tirage {} rejeté", draw_id))
}

/// Accepte `AAAA-MM-JJ` ou `JJ/MM/AAAA`, renvoie `AAAA-MM-JJ`.
pub fn parse_date(raw: &str) -> Result<String> {
    let raw = raw.trim();
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%d/%m/%Y"))
        .with_context(|| format!("Format de date invalide: '{}'", raw))?;
    Ok(date.format("%Y-%m-%d").to_string())
}

#[derive(Debug, Default)]
pub struct ImportResult {
    pub total_records: u32,
    pub inserted: u32,
    pub skipped: u32,
    pub errors: u32,
}

pub fn import_csv(conn: &Connection, path: &Path) -> Result<ImportResult> {
    let reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Impossible d'ouvrir {:?}", path))?;
    import_reader(conn, reader)
}

fn import_reader<R: std::io::Read>(conn: &Connection, mut reader: csv::Reader<R>) -> Result<ImportResult> {
    let tx = conn
        .unchecked_transaction()
        .context("Impossible de démarrer la transaction")?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {pos} lignes {msg}")
            .context("Modèle de progression invalide")?,
    );

    let mut result = ImportResult::default();

    for record_result in reader.records() {
        result.total_records += 1;
        pb.inc(1);
        let line = result.total_records;
        let draw = record_result
            .context("lecture")
            .and_then(|record| parse_record(&record));
        match draw {
            Ok(draw) => match insert_draw(&tx, &draw) {
                Ok(true) => result.inserted += 1,
                Ok(false) => result.skipped += 1,
                Err(e) => {
                    warn!(line, error = %format!("{e:#}"), "insertion impossible");
                    result.errors += 1;
                }
            },
            Err(e) => {
                warn!(line, error = %format!("{e:#}"), "ligne ignorée");
                result.errors += 1;
            }
        }
    }

    tx.commit().context("Échec du commit")?;
    pb.finish_with_message("importées");
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shuangse_db::db::{count_draws, fetch_draw, migrate};

    fn memory_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        conn
    }

    fn reader(data: &str) -> csv::Reader<&[u8]> {
        csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(data.as_bytes())
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("17/02/2026").unwrap(), "2026-02-17");
        assert_eq!(parse_date("1/2/2020").unwrap(), "2020-02-01");
        assert_eq!(parse_date("2024-05-01").unwrap(), "2024-05-01");
        assert!(parse_date("2024.05.01").is_err());
    }

    #[test]
    fn test_parse_date_rejects_impossible_dates() {
        assert!(parse_date("2024-13-45").is_err());
        assert!(parse_date("2023-02-29").is_err());
        assert!(parse_date("31/04/2024").is_err());
        assert_eq!(parse_date("29/02/2024").unwrap(), "2024-02-29");
    }

    #[test]
    fn test_import_counts_inserted_skipped_errors() {
        let conn = memory_db();
        let data = "draw_id,date,red_1,red_2,red_3,red_4,red_5,red_6,blue\n\
                    2024001,2024-01-02,6,5,4,3,2,1,7\n\
                    2024001,2024-01-02,1,2,3,4,5,6,7\n\
                    2024002,04/01/2024,1,2,3,4,5,5,7\n\
                    2024003,2024-01-07,1,2,3,4,5,34,7\n\
                    2024004,2024-01-09,10,11,12,13,14,15,16\n";
        let result = import_reader(&conn, reader(data)).unwrap();

        assert_eq!(result.total_records, 5);
        assert_eq!(result.inserted, 2);
        assert_eq!(result.skipped, 1);
        assert_eq!(result.errors, 2);
        assert_eq!(count_draws(&conn).unwrap(), 2);

        let draw = fetch_draw(&conn, "2024001").unwrap().unwrap();
        assert_eq!(draw.reds, [1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_import_rejects_short_rows() {
        let conn = memory_db();
        let data = "draw_id,date,red_1,red_2,red_3,red_4,red_5,red_6,blue\n\
                    2024001,2024-01-02,1,2,3\n";
        let result = import_reader(&conn, reader(data)).unwrap();
        assert_eq!(result.errors, 1);
        assert_eq!(result.inserted, 0);
    }
}
