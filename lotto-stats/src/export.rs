use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::frequency::{bottom_k, top_k, FrequencyTable, NumberCount};

/// Size of the persisted most/least frequent tables, per wheel.
pub const RANKED_TABLE_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ranking {
    Most,
    Least,
}

#[derive(Debug, Serialize)]
struct FrequencyRow<'a> {
    wheel: &'a str,
    number: u8,
    frequency: u32,
}

fn write_rows<'a, W, I>(writer: W, rows: I) -> Result<()>
where
    W: io::Write,
    I: IntoIterator<Item = FrequencyRow<'a>>,
{
    // Header written by hand so that an empty table still gets one.
    let mut csv = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv.write_record(["wheel", "number", "frequency"])?;
    for row in rows {
        csv.serialize(row)?;
    }
    csv.flush()?;
    Ok(())
}

/// `wheel,number,frequency`, one row per observed (wheel, number) pair.
pub fn write_frequency_table<W: io::Write>(writer: W, table: &FrequencyTable) -> Result<()> {
    write_rows(
        writer,
        table.rows().map(|(wheel, number, frequency)| FrequencyRow {
            wheel: wheel.name(),
            number,
            frequency,
        }),
    )
}

/// Same columns as the frequency table, truncated to `k` rows per wheel and
/// sorted by rank.
pub fn write_ranked<W: io::Write>(
    writer: W,
    table: &FrequencyTable,
    k: usize,
    ranking: Ranking,
) -> Result<()> {
    let rows = table.wheels().flat_map(|wheel| {
        let ranked: Vec<NumberCount> = match ranking {
            Ranking::Most => top_k(table, wheel, k),
            Ranking::Least => bottom_k(table, wheel, k),
        };
        ranked.into_iter().map(move |c| FrequencyRow {
            wheel: wheel.name(),
            number: c.number,
            frequency: c.frequency,
        })
    });
    write_rows(writer, rows)
}

#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub frequency: PathBuf,
    pub most_frequent: PathBuf,
    pub least_frequent: PathBuf,
}

/// Writes `frequency.csv`, `most_frequent.csv` and `least_frequent.csv`
/// into `dir`.
pub fn export_tables(dir: &Path, table: &FrequencyTable, k: usize) -> Result<ExportSummary> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Cannot create directory {:?}", dir))?;

    let summary = ExportSummary {
        frequency: dir.join("frequency.csv"),
        most_frequent: dir.join("most_frequent.csv"),
        least_frequent: dir.join("least_frequent.csv"),
    };

    let create = |path: &Path| {
        std::fs::File::create(path).with_context(|| format!("Cannot create {:?}", path))
    };
    write_frequency_table(create(&summary.frequency)?, table)?;
    write_ranked(create(&summary.most_frequent)?, table, k, Ranking::Most)?;
    write_ranked(create(&summary.least_frequent)?, table, k, Ranking::Least)?;

    log::info!(
        "exported frequency tables (window {}, k {}) to {:?}",
        table.window(),
        k,
        dir
    );
    Ok(summary)
}
