use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::error::FetchError;
use crate::models::RawRow;

/// The ingestion collaborator: delivers the complete raw dataset or fails.
pub trait RawRowSource {
    fn fetch_raw_rows(&mut self) -> Result<Vec<RawRow>, FetchError>;
}

impl<F> RawRowSource for F
where
    F: FnMut() -> Result<Vec<RawRow>, FetchError>,
{
    fn fetch_raw_rows(&mut self) -> Result<Vec<RawRow>, FetchError> {
        self()
    }
}

const DATE_FORMATS: &[&str] = &["%Y/%m/%d", "%Y-%m-%d", "%d/%m/%Y"];

/// Normalizes the archive's date spellings to ISO `YYYY-MM-DD`.
pub fn normalize_date(raw: &str) -> Option<String> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .map(|d| d.format("%Y-%m-%d").to_string())
}

/// The extracted historical archive (`storico01-oggi.txt`): one draw per
/// line, tab separated, `date wheel n1 n2 n3 n4 n5`.
#[derive(Debug, Clone)]
pub struct TsvArchive {
    path: PathBuf,
}

impl TsvArchive {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Splits archive text into raw rows, with dates normalized where they
    /// parse. Unparseable dates and undecodable fields are left for the store
    /// to reject row by row.
    pub fn read_rows<R: std::io::Read>(reader: R) -> Result<Vec<RawRow>, FetchError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .from_reader(reader);

        let mut rows = Vec::new();
        for (idx, record) in reader.byte_records().enumerate() {
            let record = record.map_err(|source| FetchError::Read { line: idx + 1, source })?;
            let line = record.position().map_or(idx + 1, |p| p.line() as usize);
            // Undecodable bytes become U+FFFD and the row is rejected on parse.
            let mut fields: Vec<String> = record
                .iter()
                .map(|f| String::from_utf8_lossy(f).trim().to_string())
                .collect();
            if fields.iter().all(String::is_empty) {
                continue;
            }
            if let Some(date) = fields.first().and_then(|d| normalize_date(d)) {
                fields[0] = date;
            }
            rows.push(RawRow { line, fields });
        }
        Ok(rows)
    }
}

impl RawRowSource for TsvArchive {
    fn fetch_raw_rows(&mut self) -> Result<Vec<RawRow>, FetchError> {
        let file = std::fs::File::open(&self.path).map_err(|e| FetchError::Open {
            path: self.path.clone(),
            source: csv::Error::from(e),
        })?;
        let rows = Self::read_rows(file)?;
        log::info!("read {} raw rows from {:?}", rows.len(), self.path);
        Ok(rows)
    }
}
