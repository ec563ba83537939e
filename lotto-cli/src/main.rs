mod display;
mod import;
mod interactive;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use ndarray::Axis;

use lotto_db::db::{count_draws, db_path, load_store, migrate, open_db};
use lotto_db::models::Wheel;
use lotto_db::rusqlite::Connection;
use lotto_db::source::normalize_date;
use lotto_db::store::{DrawStore, StoreHandle};
use lotto_features::config::FeatureConfig;
use lotto_features::regressor::{mae, mse, MeanRegressor, Regressor, RidgeRegressor};
use lotto_features::windows::build_features;
use lotto_stats::cache::StatsCache;
use lotto_stats::export::{export_tables, RANKED_TABLE_SIZE};
use lotto_stats::frequency::{bottom_k, top_k};

use crate::display::{
    display_absent, display_delays, display_draws, display_feature_set, display_forecast,
    display_import_summary, display_patterns, display_ranked, ModelReport,
};

const DEFAULT_ARCHIVE: &str = "data/storico01-oggi.txt";
const DEFAULT_CONFIG: &str = "data/forecast.json";

#[derive(Parser)]
#[command(name = "lotto", about = "Italian Lotto draw statistics")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Import the tab-separated draw archive, replacing the stored history
    Import {
        /// Path to the archive
        #[arg(short, long, default_value = DEFAULT_ARCHIVE)]
        file: PathBuf,
    },

    /// Print the database path
    DbPath,

    /// Show every wheel's draw on a date (latest date when omitted)
    Draws {
        /// Date, YYYY-MM-DD or YYYY/MM/DD
        #[arg(short, long)]
        date: Option<String>,
    },

    /// List the most recent draws of a wheel
    List {
        /// Wheel name or code (e.g. ROMA, RM)
        #[arg(short = 'r', long)]
        wheel: String,

        /// Number of draws to show
        #[arg(short, long, default_value = "10")]
        last: usize,
    },

    /// Most and least frequent numbers over the last N draws
    Frequency {
        /// Window size (number of draws per wheel)
        #[arg(short, long)]
        window: usize,

        /// Restrict to one wheel
        #[arg(short = 'r', long)]
        wheel: Option<String>,

        /// Rows per ranking
        #[arg(short, long, default_value_t = RANKED_TABLE_SIZE)]
        top: usize,
    },

    /// Days since each number was last drawn
    Delays {
        /// Reference date (today when omitted)
        #[arg(long)]
        as_of: Option<String>,

        /// Restrict to one wheel
        #[arg(short = 'r', long)]
        wheel: Option<String>,

        /// Most delayed numbers to show per wheel
        #[arg(short, long, default_value = "10")]
        top: usize,
    },

    /// Odd/even, low/high, adjacency and decade patterns of a wheel
    Patterns {
        /// Wheel name or code
        #[arg(short = 'r', long)]
        wheel: String,

        /// Window size (number of draws)
        #[arg(short, long)]
        window: usize,
    },

    /// Numbers absent from the most recent draw of a wheel
    Absent {
        /// Wheel name or code
        #[arg(short = 'r', long)]
        wheel: String,
    },

    /// Write frequency.csv, most_frequent.csv and least_frequent.csv
    Export {
        /// Window size (number of draws per wheel)
        #[arg(short, long)]
        window: usize,

        /// Output directory
        #[arg(short, long, default_value = "output")]
        dir: PathBuf,

        /// Rows per wheel in the ranked tables
        #[arg(short, long, default_value_t = RANKED_TABLE_SIZE)]
        top: usize,
    },

    /// Build sliding-window features for a wheel and describe them
    Features {
        /// Wheel name or code
        #[arg(short = 'r', long)]
        wheel: String,

        /// Window size (number of draws per sample)
        #[arg(short, long)]
        window: usize,
    },

    /// Fit baseline regressors on windowed features and show their test error
    Forecast {
        /// Wheel name or code
        #[arg(short = 'r', long)]
        wheel: String,

        /// Forecast config (JSON)
        #[arg(short, long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,

        /// Override the configured window size
        #[arg(short, long)]
        window: Option<usize>,

        /// Write the effective config back to the config path
        #[arg(long)]
        save_config: bool,
    },

    /// Interactive mode
    Interactive {
        /// Archive used by the refresh command
        #[arg(short, long, default_value = DEFAULT_ARCHIVE)]
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let path = db_path();
    let conn = open_db(&path)?;
    migrate(&conn)?;
    log::debug!("database at {:?}", path);

    match cli.command {
        Command::Import { file } => cmd_import(&conn, &file),
        Command::DbPath => {
            println!("{}", path.display());
            Ok(())
        }
        Command::Draws { date } => cmd_draws(&conn, date.as_deref()),
        Command::List { wheel, last } => cmd_list(&conn, &wheel, last),
        Command::Frequency { window, wheel, top } => {
            let store = require_store(&conn)?;
            cmd_frequency(&mut StatsCache::new(), &store, window, wheel.as_deref(), top)
        }
        Command::Delays { as_of, wheel, top } => {
            let store = require_store(&conn)?;
            let as_of = match as_of {
                Some(raw) => parse_date_arg(&raw)?,
                None => chrono::Local::now().date_naive(),
            };
            cmd_delays(&mut StatsCache::new(), &store, as_of, wheel.as_deref(), top)
        }
        Command::Patterns { wheel, window } => {
            let store = require_store(&conn)?;
            cmd_patterns(&mut StatsCache::new(), &store, &wheel, window)
        }
        Command::Absent { wheel } => cmd_absent(&require_store(&conn)?, &wheel),
        Command::Export { window, dir, top } => {
            let store = require_store(&conn)?;
            cmd_export(&mut StatsCache::new(), &store, window, &dir, top)
        }
        Command::Features { wheel, window } => cmd_features(&require_store(&conn)?, &wheel, window),
        Command::Forecast {
            wheel,
            config,
            window,
            save_config,
        } => cmd_forecast(&require_store(&conn)?, &wheel, &config, window, save_config),
        Command::Interactive { file } => {
            let handle = StoreHandle::new(load_store(&conn)?);
            interactive::run_interactive(&conn, handle, &file)
        }
    }
}

/// Loads the persisted store, refusing to go on with an empty database.
fn require_store(conn: &Connection) -> Result<DrawStore> {
    if count_draws(conn)? == 0 {
        bail!("Empty database. Run first: lotto import");
    }
    load_store(conn)
}

pub(crate) fn parse_wheel(raw: &str) -> Result<Wheel> {
    match Wheel::from_code(raw) {
        Wheel::Unknown(code) => bail!("Unknown wheel '{}'", code),
        wheel => Ok(wheel),
    }
}

fn wheels_for(store: &DrawStore, filter: Option<&str>) -> Result<Vec<Wheel>> {
    match filter {
        Some(raw) => Ok(vec![parse_wheel(raw)?]),
        None => Ok(store.wheels().cloned().collect()),
    }
}

pub(crate) fn parse_date_arg(raw: &str) -> Result<NaiveDate> {
    let iso = normalize_date(raw).with_context(|| format!("Invalid date '{}'", raw))?;
    NaiveDate::parse_from_str(&iso, "%Y-%m-%d").with_context(|| format!("Invalid date '{}'", raw))
}

fn cmd_import(conn: &Connection, file: &Path) -> Result<()> {
    let mut handle = StoreHandle::new(load_store(conn)?);
    let result = import::refresh_from_archive(conn, &mut handle, file)?;
    display_import_summary(&result);
    Ok(())
}

pub(crate) fn show_draws_on(store: &DrawStore, date: Option<NaiveDate>) -> Result<()> {
    let Some(date) = date.or_else(|| store.latest_date()) else {
        println!("No draws to show.");
        return Ok(());
    };
    println!("Draws of {}", date);
    display_draws(&store.draws_on(date));
    Ok(())
}

fn cmd_draws(conn: &Connection, date: Option<&str>) -> Result<()> {
    let store = require_store(conn)?;
    let date = date.map(parse_date_arg).transpose()?;
    show_draws_on(&store, date)
}

fn cmd_list(conn: &Connection, wheel: &str, last: usize) -> Result<()> {
    let store = require_store(conn)?;
    let wheel = parse_wheel(wheel)?;
    display_draws(&store.latest(&wheel, last));
    Ok(())
}

pub(crate) fn cmd_frequency(
    cache: &mut StatsCache,
    store: &DrawStore,
    window: usize,
    wheel: Option<&str>,
    top: usize,
) -> Result<()> {
    let table = cache.frequencies(store, window);
    for wheel in wheels_for(store, wheel)? {
        display_ranked(
            &wheel,
            table.draws_counted(&wheel),
            &top_k(&table, &wheel, top),
            &bottom_k(&table, &wheel, top),
        );
    }
    Ok(())
}

pub(crate) fn cmd_delays(
    cache: &mut StatsCache,
    store: &DrawStore,
    as_of: NaiveDate,
    wheel: Option<&str>,
    top: usize,
) -> Result<()> {
    let table = cache.delays(store, as_of);
    for wheel in wheels_for(store, wheel)? {
        display_delays(&wheel, as_of, &table.most_delayed(&wheel, top));
    }
    Ok(())
}

pub(crate) fn cmd_patterns(
    cache: &mut StatsCache,
    store: &DrawStore,
    wheel: &str,
    window: usize,
) -> Result<()> {
    let wheel = parse_wheel(wheel)?;
    display_patterns(&cache.patterns(store, &wheel, window));
    Ok(())
}

pub(crate) fn cmd_absent(store: &DrawStore, wheel: &str) -> Result<()> {
    let wheel = parse_wheel(wheel)?;
    let Some(latest) = store.draws_for(&wheel).next_back() else {
        println!("No draws for {}.", wheel);
        return Ok(());
    };
    display_absent(&wheel, latest, &store.absent_from_latest(&wheel));
    Ok(())
}

fn cmd_export(
    cache: &mut StatsCache,
    store: &DrawStore,
    window: usize,
    dir: &Path,
    top: usize,
) -> Result<()> {
    let table = cache.frequencies(store, window);
    let summary = export_tables(dir, &table, top)?;
    println!("Written:");
    for path in [&summary.frequency, &summary.most_frequent, &summary.least_frequent] {
        println!("  {}", path.display());
    }
    Ok(())
}

fn cmd_features(store: &DrawStore, wheel: &str, window: usize) -> Result<()> {
    let wheel = parse_wheel(wheel)?;
    let set = build_features(store, &wheel, window)?;
    display_feature_set(&set);
    Ok(())
}

fn cmd_forecast(
    store: &DrawStore,
    wheel: &str,
    config_path: &Path,
    window: Option<usize>,
    save_config: bool,
) -> Result<()> {
    let wheel = parse_wheel(wheel)?;
    let mut config = FeatureConfig::load_or_default(config_path)?;
    if let Some(window) = window {
        config.window_size = window;
    }
    if save_config {
        config.save(config_path)?;
        println!("Config written to {}", config_path.display());
    }

    let set = build_features(store, &wheel, config.window_size)?;
    let split = set.split(config.test_fraction, config.seed)?;
    let next_input = set.next_input.clone().insert_axis(Axis(0));

    let mut models: Vec<Box<dyn Regressor>> = vec![
        Box::new(MeanRegressor::default()),
        Box::new(RidgeRegressor::new(config.ridge_lambda)),
    ];
    let mut reports = Vec::with_capacity(models.len());
    for model in models.iter_mut() {
        model.fit(&split.x_train, &split.y_train)?;
        let predicted = model.predict(&split.x_test)?;
        let next = model.predict(&next_input)?;
        reports.push(ModelReport {
            name: model.name().to_string(),
            mse: mse(&split.y_test, &predicted)?,
            mae: mae(&split.y_test, &predicted)?,
            next: set.predicted_numbers(next.row(0))?,
        });
    }
    display_forecast(&wheel, split.x_train.nrows(), split.x_test.nrows(), &reports);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lotto_db::fixtures::{make_test_store, rome_scenario};

    #[test]
    fn test_cli_parses() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_window_is_required() {
        assert!(Cli::try_parse_from(["lotto", "frequency"]).is_err());
        assert!(Cli::try_parse_from(["lotto", "patterns", "-r", "RM"]).is_err());
        assert!(Cli::try_parse_from(["lotto", "frequency", "-w", "50"]).is_ok());
    }

    #[test]
    fn test_parse_wheel() {
        assert_eq!(parse_wheel("rm").unwrap(), Wheel::Roma);
        assert_eq!(parse_wheel("Nazionale").unwrap(), Wheel::Nazionale);
        assert!(parse_wheel("XX").is_err());
    }

    #[test]
    fn test_parse_date_arg() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        assert_eq!(parse_date_arg("2024/01/02").unwrap(), expected);
        assert_eq!(parse_date_arg("2024-01-02").unwrap(), expected);
        assert!(parse_date_arg("yesterday").is_err());
    }

    #[test]
    fn test_wheels_for() {
        let store = rome_scenario();
        assert_eq!(wheels_for(&store, None).unwrap(), vec![Wheel::Roma]);
        assert_eq!(wheels_for(&store, Some("BA")).unwrap(), vec![Wheel::Bari]);
        assert_eq!(lotto_db::models::WHEELS.len(), 11);
    }

    #[test]
    fn test_require_store_on_empty_db() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        assert!(require_store(&conn).is_err());
        lotto_db::db::replace_draws(&conn, &make_test_store(3)).unwrap();
        assert_eq!(require_store(&conn).unwrap().len(), 33);
    }

    #[test]
    fn test_commands_share_cache() {
        let store = make_test_store(20);
        let mut cache = StatsCache::new();
        cmd_frequency(&mut cache, &store, 10, Some("RM"), 5).unwrap();
        cmd_frequency(&mut cache, &store, 10, None, 5).unwrap();
        cmd_patterns(&mut cache, &store, "NA", 10).unwrap();
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_forecast_command() {
        let store = make_test_store(40);
        let missing = std::env::temp_dir().join("lotto-no-forecast-config.json");
        cmd_forecast(&store, "FI", &missing, Some(5), false).unwrap();
        assert!(cmd_forecast(&store, "FI", &missing, Some(40), false).is_err());
    }
}
