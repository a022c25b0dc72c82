mod display;
mod import;

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::display::{
    display_accuracy, display_candidates, display_draws, display_generation,
    display_import_summary, display_predictions, display_score, display_stats, display_weights,
};
use shuangse_db::db::{
    count_draws, count_predictions, db_path, fetch_draws_page, fetch_predictions_page,
    insert_draw, insert_prediction, migrate, open_db,
};
use shuangse_db::models::{Candidate, DrawRecord, Prediction, PredictionKind, parse_draw_number};
use shuangse_db::rusqlite::Connection;
use shuangse_engine::accuracy::{AccuracyChecker, CheckOutcome};
use shuangse_engine::analysis::{DimensionAnalyzer, DimensionSnapshots};
use shuangse_engine::config::{EngineConfig, load_config};
use shuangse_engine::generator::CandidateGenerator;
use shuangse_engine::history::HistoryProvider;
use shuangse_engine::scoring::score;
use shuangse_engine::weights::{WeightAdjuster, WeightFile, load_or_default, save_weights};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum KindArg {
    Random,
    Analysis,
}

impl From<KindArg> for PredictionKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Random => PredictionKind::Random,
            KindArg::Analysis => PredictionKind::Analysis,
        }
    }
}

#[derive(Parser)]
#[command(name = "shuangse", about = "Analyse et notation de grilles Shuangseqiu (6 rouges + 1 bleue)")]
struct Cli {
    /// Fichier de configuration JSON (valeurs par défaut si absent)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Fichier des poids et de leur historique
    #[arg(long, global = true, default_value = "data/weights.json")]
    weights: PathBuf,

    /// Verbosité des journaux (-v : info, -vv : debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Importer l'historique depuis un fichier CSV (draw_id,date,red_1..red_6,blue)
    Import {
        /// Chemin vers le fichier CSV
        #[arg(short, long, default_value = "assets/shuangse.csv")]
        file: PathBuf,
    },

    /// Ajouter un tirage manuellement puis vérifier les prédictions associées
    Add,

    /// Afficher le chemin de la base de données
    DbPath,

    /// Lister l'historique des tirages
    List {
        /// Numéro de page (à partir de 1)
        #[arg(short, long, default_value = "1")]
        page: u32,

        /// Tirages par page
        #[arg(long, default_value = "20")]
        per_page: u32,
    },

    /// Afficher les statistiques des cinq dimensions
    Stats,

    /// Générer des grilles aléatoires
    Random {
        /// Nombre de grilles
        #[arg(short, long, default_value = "5")]
        count: usize,

        /// Seed pour la reproductibilité
        #[arg(long)]
        seed: Option<u64>,

        /// Enregistrer les grilles pour le prochain tirage
        #[arg(long)]
        save: bool,
    },

    /// Générer des grilles notées
    Predict {
        /// Nombre de grilles
        #[arg(short, long, default_value = "5")]
        count: usize,

        /// Score minimal (défaut : configuration)
        #[arg(short, long)]
        min_score: Option<f64>,

        /// Seed pour la reproductibilité
        #[arg(long)]
        seed: Option<u64>,

        /// Enregistrer les grilles comme prédictions
        #[arg(long)]
        save: bool,

        /// Tirage visé (défaut : prochain tirage)
        #[arg(short, long)]
        draw: Option<String>,
    },

    /// Noter une combinaison
    Score {
        /// Six boules rouges
        #[arg(required = true)]
        reds: Vec<u8>,

        /// Boule bleue
        #[arg(short, long)]
        blue: u8,
    },

    /// Enregistrer une combinaison comme prédiction
    Save {
        /// Six boules rouges
        #[arg(required = true)]
        reds: Vec<u8>,

        /// Boule bleue
        #[arg(short, long)]
        blue: u8,

        /// Tirage visé (défaut : prochain tirage)
        #[arg(short, long)]
        draw: Option<String>,

        /// Type de prédiction
        #[arg(short, long, default_value = "analysis")]
        kind: KindArg,
    },

    /// Lister les prédictions enregistrées
    Predictions {
        /// Numéro de page (à partir de 1)
        #[arg(short, long, default_value = "1")]
        page: u32,

        /// Prédictions par page
        #[arg(long, default_value = "20")]
        per_page: u32,
    },

    /// Vérifier les prédictions d'un tirage et rééquilibrer les poids
    Check {
        /// Tirage à vérifier (défaut : dernier tirage)
        draw_id: Option<String>,
    },

    /// Afficher les poids des dimensions
    Weights {
        /// Revenir aux poids par défaut et vider l'historique
        #[arg(long)]
        reset: bool,
    },
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => EngineConfig::default(),
    };

    let path = db_path();
    let conn = open_db(&path)?;
    migrate(&conn)?;

    let ctx = Ctx {
        conn: &conn,
        config: &config,
        weights_path: &cli.weights,
    };

    match cli.command {
        Command::Import { file } => cmd_import(&conn, &file),
        Command::Add => cmd_add(&ctx),
        Command::DbPath => {
            println!("{}", path.display());
            Ok(())
        }
        Command::List { page, per_page } => cmd_list(&conn, page, per_page),
        Command::Stats => cmd_stats(&ctx),
        Command::Random { count, seed, save } => cmd_random(&ctx, count, seed, save),
        Command::Predict {
            count,
            min_score,
            seed,
            save,
            draw,
        } => cmd_predict(&ctx, count, min_score, seed, save, draw),
        Command::Score { reds, blue } => cmd_score(&ctx, &reds, blue),
        Command::Save {
            reds,
            blue,
            draw,
            kind,
        } => cmd_save(&ctx, &reds, blue, draw, kind.into()),
        Command::Predictions { page, per_page } => cmd_predictions(&conn, page, per_page),
        Command::Check { draw_id } => cmd_check(&ctx, draw_id),
        Command::Weights { reset } => cmd_weights(&ctx, reset),
    }
}

struct Ctx<'a> {
    conn: &'a Connection,
    config: &'a EngineConfig,
    weights_path: &'a Path,
}

impl Ctx<'_> {
    fn ensure_history(&self) -> Result<bool> {
        if count_draws(self.conn)? == 0 {
            println!("Base vide. Lancez d'abord : shuangse import");
            return Ok(false);
        }
        Ok(true)
    }

    fn snapshots(&self) -> Result<DimensionSnapshots> {
        DimensionAnalyzer::new(self.conn, self.config.analysis.clone()).snapshots()
    }

    fn weight_file(&self) -> Result<WeightFile> {
        load_or_default(self.weights_path, &self.config.weights)
    }

    /// Identifiant du tirage suivant le dernier tirage connu.
    fn next_draw_id(&self) -> Result<String> {
        let latest = self
            .conn
            .latest()?
            .context("Base vide. Lancez d'abord : shuangse import")?;
        Ok((latest.draw_number() + 1).to_string())
    }

    fn target_draw(&self, draw: Option<String>) -> Result<String> {
        match draw {
            Some(id) => {
                parse_draw_number(&id)?;
                Ok(id.trim().to_string())
            }
            None => self.next_draw_id(),
        }
    }
}

fn cmd_import(conn: &Connection, file: &Path) -> Result<()> {
    let result = import::import_csv(conn, file)?;
    display_import_summary(&result);
    Ok(())
}

fn cmd_list(conn: &Connection, page: u32, per_page: u32) -> Result<()> {
    let n = count_draws(conn)?;
    if n == 0 {
        println!("Base vide. Lancez d'abord : shuangse import");
        return Ok(());
    }
    let per_page = per_page.max(1);
    let pages = n.div_ceil(per_page);
    let draws = fetch_draws_page(conn, page, per_page)?;
    display_draws(&draws);
    println!("Page {}/{} ({} tirages)", page.max(1), pages, n);
    Ok(())
}

fn cmd_stats(ctx: &Ctx) -> Result<()> {
    if !ctx.ensure_history()? {
        return Ok(());
    }
    display_stats(&ctx.snapshots()?);
    Ok(())
}

fn cmd_random(ctx: &Ctx, count: usize, seed: Option<u64>, save: bool) -> Result<()> {
    let snaps = ctx.snapshots()?;
    let state = ctx.weight_file()?.state;
    let mut generator = CandidateGenerator::new(
        &snaps,
        &state,
        ctx.config.generator.clone(),
        ctx.config.suggestion_threshold,
        seed,
    );
    let candidates = generator.random_candidates(count);
    display_candidates(&candidates);

    if save {
        let draw_id = ctx.next_draw_id()?;
        let saved = candidates
            .iter()
            .map(|&c| save_prediction(ctx.conn, Prediction::new(&draw_id, c, PredictionKind::Random)))
            .collect::<Result<Vec<_>>>()?;
        report_saved(&draw_id, &saved);
    }
    Ok(())
}

fn cmd_predict(
    ctx: &Ctx,
    count: usize,
    min_score: Option<f64>,
    seed: Option<u64>,
    save: bool,
    draw: Option<String>,
) -> Result<()> {
    if !ctx.ensure_history()? {
        return Ok(());
    }
    let snaps = ctx.snapshots()?;
    let state = ctx.weight_file()?.state;
    let min_score = min_score.unwrap_or(ctx.config.generator.min_score);

    let mut generator = CandidateGenerator::new(
        &snaps,
        &state,
        ctx.config.generator.clone(),
        ctx.config.suggestion_threshold,
        seed,
    );
    let generation = generator.generate(count, min_score);
    display_generation(&generation, ctx.config.suggestion_threshold);

    if save {
        let draw_id = ctx.target_draw(draw)?;
        let saved = generation
            .candidates
            .iter()
            .map(|g| {
                let prediction = Prediction::new(&draw_id, g.candidate, PredictionKind::Analysis)
                    .with_scores(g.score.scores.0, g.score.total);
                save_prediction(ctx.conn, prediction)
            })
            .collect::<Result<Vec<_>>>()?;
        report_saved(&draw_id, &saved);
    }
    Ok(())
}

fn cmd_score(ctx: &Ctx, reds: &[u8], blue: u8) -> Result<()> {
    let candidate = Candidate::new(reds, blue)?;
    let snaps = ctx.snapshots()?;
    let state = ctx.weight_file()?.state;
    let result = score(&candidate, &snaps, &state, ctx.config.suggestion_threshold);
    display_score(&candidate, &result, ctx.config.suggestion_threshold);
    Ok(())
}

fn cmd_save(ctx: &Ctx, reds: &[u8], blue: u8, draw: Option<String>, kind: PredictionKind) -> Result<()> {
    let candidate = Candidate::new(reds, blue)?;
    let draw_id = ctx.target_draw(draw)?;

    let mut prediction = Prediction::new(&draw_id, candidate, kind);
    if kind == PredictionKind::Analysis {
        let snaps = ctx.snapshots()?;
        let state = ctx.weight_file()?.state;
        let result = score(&candidate, &snaps, &state, ctx.config.suggestion_threshold);
        prediction = prediction.with_scores(result.scores.0, result.total);
    }

    let saved = save_prediction(ctx.conn, prediction)?;
    report_saved(&draw_id, &[saved]);
    Ok(())
}

fn save_prediction(conn: &Connection, prediction: Prediction) -> Result<bool> {
    let id = insert_prediction(conn, &prediction)?;
    if let Some(id) = id {
        info!(id, draw_id = %prediction.draw_id, "prédiction enregistrée");
    }
    Ok(id.is_some())
}

fn report_saved(draw_id: &str, saved: &[bool]) {
    let inserted = saved.iter().filter(|&&s| s).count();
    println!("{inserted} prédiction(s) enregistrée(s) pour le tirage {draw_id}.");
    if inserted < saved.len() {
        println!("{} déjà enregistrée(s) (doublon ignoré).", saved.len() - inserted);
    }
}

fn cmd_predictions(conn: &Connection, page: u32, per_page: u32) -> Result<()> {
    let predictions = fetch_predictions_page(conn, page, per_page.max(1))?;
    let latest = conn.latest()?;
    let counts = count_predictions(conn)?;
    display_predictions(&predictions, latest.as_ref().map(|d| d.draw_id.as_str()), &counts);
    Ok(())
}

fn cmd_check(ctx: &Ctx, draw_id: Option<String>) -> Result<()> {
    let draw_id = match draw_id {
        Some(id) => id,
        None => match ctx.conn.latest()? {
            Some(draw) => draw.draw_id,
            None => {
                println!("Base vide. Lancez d'abord : shuangse import");
                return Ok(());
            }
        },
    };
    run_check(ctx, &draw_id)
}

/// Vérifie un tirage, rééquilibre les poids et persiste le fichier de poids.
fn run_check(ctx: &Ctx, draw_id: &str) -> Result<()> {
    let adjuster = WeightAdjuster::new(ctx.config.weights.clone());
    let mut file = ctx.weight_file()?;
    let checker = AccuracyChecker::new(ctx.conn, ctx.conn, &adjuster);

    match checker.check_accuracy(draw_id, &mut file.log)? {
        CheckOutcome::NotDrawn(id) => {
            println!("Le tirage {id} n'est pas encore connu, rien à vérifier.");
        }
        CheckOutcome::Checked(report) => {
            display_accuracy(&report);
            let (state, status) = adjuster.rebalance(&file.state, &file.log);
            file.state = state;
            save_weights(&file, ctx.weights_path)?;
            display_weights(&file.state, &file.log, Some(&status));
        }
    }
    Ok(())
}

fn cmd_weights(ctx: &Ctx, reset: bool) -> Result<()> {
    let file = if reset {
        let file = WeightFile {
            state: WeightAdjuster::new(ctx.config.weights.clone()).initial_state(),
            log: Default::default(),
        };
        save_weights(&file, ctx.weights_path)?;
        println!("Poids réinitialisés.");
        file
    } else {
        ctx.weight_file()?
    };
    display_weights(&file.state, &file.log, None);
    Ok(())
}

fn cmd_add(ctx: &Ctx) -> Result<()> {
    println!("Ajout d'un tirage manuellement\n");

    let draw_id = prompt("Identifiant du tirage (ex: 2024051) : ")?;
    let raw_date = prompt("Date (AAAA-MM-JJ ou JJ/MM/AAAA) : ")?;
    let date = import::parse_date(&raw_date)?;
    let reds = prompt_reds()?;
    let blue = prompt_blue()?;

    let draw = DrawRecord::new(&draw_id, &date, &reds, blue)?;

    println!("\nTirage à insérer :");
    display_draws(std::slice::from_ref(&draw));

    let confirm = prompt("\nConfirmer l'insertion ? (o/n) : ")?;
    if confirm.trim().to_lowercase() != "o" {
        println!("Insertion annulée.");
        return Ok(());
    }

    if insert_draw(ctx.conn, &draw)? {
        println!("Tirage inséré avec succès.");
    } else {
        println!("Ce tirage existe déjà (doublon ignoré).");
    }
    run_check(ctx, &draw.draw_id)
}

fn prompt(msg: &str) -> Result<String> {
    print!("{}", msg);
    io::stdout().flush()?;
    let mut input = String::new();
    let read = io::stdin()
        .read_line(&mut input)
        .context("Erreur de lecture")?;
    if read == 0 {
        bail!("Entrée interrompue");
    }
    Ok(input.trim().to_string())
}

fn prompt_reds() -> Result<Vec<u8>> {
    loop {
        let input = prompt("6 boules rouges (séparées par des espaces, 1-33) : ")?;
        let nums: Result<Vec<u8>, _> = input.split_whitespace().map(|s| s.parse::<u8>()).collect();
        match nums {
            Ok(v) => match Candidate::new(&v, 1) {
                Ok(_) => return Ok(v),
                Err(e) => println!("{e}. Réessayez."),
            },
            Err(_) => println!("Entrez uniquement des nombres. Réessayez."),
        }
    }
}

fn prompt_blue() -> Result<u8> {
    loop {
        let input = prompt("Boule bleue (1-16) : ")?;
        match input.parse::<u8>() {
            Ok(b) if (1..=16).contains(&b) => return Ok(b),
            _ => println!("Boule bleue invalide (1-16). Réessayez."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shuangse_engine::history::{PredictionStore, make_test_draws};

    fn memory_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        conn
    }

    #[test]
    fn test_next_draw_follows_latest_draw() {
        let conn = memory_db();
        let config = EngineConfig::default();
        let ctx = Ctx {
            conn: &conn,
            config: &config,
            weights_path: Path::new("unused.json"),
        };
        assert!(ctx.next_draw_id().is_err());

        for draw in make_test_draws(2024001, 12) {
            insert_draw(&conn, &draw).unwrap();
        }
        assert_eq!(ctx.next_draw_id().unwrap(), "2024013");
        assert_eq!(ctx.target_draw(None).unwrap(), "2024013");
        assert_eq!(ctx.target_draw(Some(" 2024020 ".to_string())).unwrap(), "2024020");
        assert!(ctx.target_draw(Some("abc".to_string())).is_err());
    }

    #[test]
    fn test_save_scores_analysis_prediction() {
        let conn = memory_db();
        let config = EngineConfig::default();
        let dir = std::env::temp_dir().join(format!("shuangse-cli-save-{}", std::process::id()));
        let weights_path = dir.join("weights.json");
        let ctx = Ctx {
            conn: &conn,
            config: &config,
            weights_path: &weights_path,
        };
        for draw in make_test_draws(2024001, 30) {
            insert_draw(&conn, &draw).unwrap();
        }

        cmd_save(&ctx, &[6, 5, 4, 3, 2, 1], 7, None, PredictionKind::Analysis).unwrap();
        assert!(cmd_save(&ctx, &[1, 2, 3, 4, 5, 5], 7, None, PredictionKind::Analysis).is_err());

        let saved = conn.find_by_draw_id("2024031").unwrap();
        assert_eq!(saved.len(), 1);
        let candidate = Candidate::new(&[1, 2, 3, 4, 5, 6], 7).unwrap();
        assert_eq!(saved[0].candidate, candidate);
        let expected = score(&candidate, &ctx.snapshots().unwrap(), &WeightFile::default().state, 70.0);
        let total = saved[0].total_score.unwrap();
        assert!((total - expected.total).abs() < 1e-9);
    }
}
