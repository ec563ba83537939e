use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};

use lotto_db::rusqlite::Connection;
use lotto_db::store::StoreHandle;
use lotto_stats::cache::StatsCache;

use crate::display::display_import_summary;
use crate::import::refresh_from_archive;

#[derive(Debug, PartialEq)]
enum InteractiveCommand {
    Draws,
    Frequency,
    Delays,
    Patterns,
    Absent,
    Refresh,
    Cache,
    Quit,
}

fn parse_command(input: &str) -> Option<InteractiveCommand> {
    match input.trim().to_lowercase().as_str() {
        "1" | "draws" | "estrazioni" => Some(InteractiveCommand::Draws),
        "2" | "frequency" | "freq" | "frequenze" => Some(InteractiveCommand::Frequency),
        "3" | "delays" | "ritardi" => Some(InteractiveCommand::Delays),
        "4" | "patterns" | "pat" => Some(InteractiveCommand::Patterns),
        "5" | "absent" | "ritardatari" => Some(InteractiveCommand::Absent),
        "6" | "refresh" | "aggiorna" => Some(InteractiveCommand::Refresh),
        "7" | "cache" => Some(InteractiveCommand::Cache),
        "8" | "quit" | "q" | "exit" | "esci" => Some(InteractiveCommand::Quit),
        _ => None,
    }
}

fn display_menu() {
    println!();
    println!("── Interactive mode ──");
    println!("  1. draws      Draws on a date");
    println!("  2. frequency  Most / least frequent numbers");
    println!("  3. delays     Most delayed numbers");
    println!("  4. patterns   Draw patterns of a wheel");
    println!("  5. absent     Numbers absent from the latest draw");
    println!("  6. refresh    Reload the archive");
    println!("  7. cache      Cache statistics");
    println!("  8. quit       Quit");
    println!();
}

fn prompt(msg: &str) -> Result<String> {
    print!("{}", msg);
    io::stdout().flush()?;
    let mut input = String::new();
    let read = io::stdin().read_line(&mut input).context("Read error")?;
    if read == 0 {
        anyhow::bail!("end of input");
    }
    Ok(input.trim().to_string())
}

fn prompt_with_default(msg: &str, default: &str) -> Result<String> {
    let input = prompt(&format!("{} [{}] : ", msg, default))?;
    if input.is_empty() {
        Ok(default.to_string())
    } else {
        Ok(input)
    }
}

fn prompt_usize(msg: &str, default: &str) -> Result<usize> {
    let raw = prompt_with_default(msg, default)?;
    raw.parse().with_context(|| format!("Invalid number '{}'", raw))
}

/// Window sizes have no default: an empty answer is an error.
fn parse_window(raw: &str) -> Result<usize> {
    if raw.is_empty() {
        anyhow::bail!("A window size is required");
    }
    match raw.parse::<usize>() {
        Ok(0) => anyhow::bail!("Window size must be at least 1"),
        Ok(window) => Ok(window),
        Err(_) => anyhow::bail!("Invalid number '{}'", raw),
    }
}

fn prompt_window() -> Result<usize> {
    parse_window(&prompt("Window (number of draws, required) : ")?)
}

fn prompt_wheel_filter() -> Result<Option<String>> {
    let raw = prompt("Wheel (empty = all) : ")?;
    Ok(if raw.is_empty() { None } else { Some(raw) })
}

struct Session<'a> {
    conn: &'a Connection,
    handle: StoreHandle,
    cache: StatsCache,
    archive: &'a Path,
}

impl Session<'_> {
    fn draws(&mut self) -> Result<()> {
        let raw = prompt("Date (empty = latest) : ")?;
        let date = if raw.is_empty() {
            None
        } else {
            Some(crate::parse_date_arg(&raw)?)
        };
        crate::show_draws_on(&self.handle.snapshot(), date)
    }

    fn frequency(&mut self) -> Result<()> {
        let window = prompt_window()?;
        let wheel = prompt_wheel_filter()?;
        let top = prompt_usize("Rows", "10")?;
        let store = self.handle.snapshot();
        crate::cmd_frequency(&mut self.cache, &store, window, wheel.as_deref(), top)
    }

    fn delays(&mut self) -> Result<()> {
        let store = self.handle.snapshot();
        let default = store
            .latest_date()
            .map(|d| d.to_string())
            .unwrap_or_default();
        let as_of = crate::parse_date_arg(&prompt_with_default("As of", &default)?)?;
        let wheel = prompt_wheel_filter()?;
        let top = prompt_usize("Rows", "10")?;
        crate::cmd_delays(&mut self.cache, &store, as_of, wheel.as_deref(), top)
    }

    fn patterns(&mut self) -> Result<()> {
        let wheel = prompt("Wheel : ")?;
        let window = prompt_window()?;
        let store = self.handle.snapshot();
        crate::cmd_patterns(&mut self.cache, &store, &wheel, window)
    }

    fn absent(&mut self) -> Result<()> {
        let wheel = prompt("Wheel : ")?;
        crate::cmd_absent(&self.handle.snapshot(), &wheel)
    }

    fn refresh(&mut self) -> Result<()> {
        let result = refresh_from_archive(self.conn, &mut self.handle, self.archive)?;
        display_import_summary(&result);
        Ok(())
    }

    fn cache(&self) {
        let stats = self.cache.stats();
        println!(
            "Store v{} | cached tables: {} | hits: {} | misses: {}",
            self.handle.snapshot().version(),
            self.cache.len(),
            stats.hits,
            stats.misses
        );
    }
}

pub fn run_interactive(conn: &Connection, handle: StoreHandle, archive: &Path) -> Result<()> {
    println!("Lotto statistics, interactive mode.");
    if handle.snapshot().is_empty() {
        println!("Empty database. Use 'refresh' to load {}", archive.display());
    }

    let mut session = Session {
        conn,
        handle,
        cache: StatsCache::new(),
        archive,
    };

    loop {
        display_menu();
        let input = match prompt("> ") {
            Ok(s) => s,
            Err(_) => break, // EOF / Ctrl+D
        };

        if input.is_empty() {
            continue;
        }

        let result = match parse_command(&input) {
            Some(InteractiveCommand::Quit) => {
                println!("Arrivederci!");
                break;
            }
            Some(InteractiveCommand::Draws) => session.draws(),
            Some(InteractiveCommand::Frequency) => session.frequency(),
            Some(InteractiveCommand::Delays) => session.delays(),
            Some(InteractiveCommand::Patterns) => session.patterns(),
            Some(InteractiveCommand::Absent) => session.absent(),
            Some(InteractiveCommand::Refresh) => session.refresh(),
            Some(InteractiveCommand::Cache) => {
                session.cache();
                Ok(())
            }
            None => {
                println!("Unknown command: '{}'. Type a number (1-8) or a command name.", input);
                Ok(())
            }
        };
        if let Err(e) = result {
            println!("Error: {e:#}");
        }
    }

    Ok(())
}
