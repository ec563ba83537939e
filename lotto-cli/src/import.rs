use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};

use lotto_db::db::replace_draws;
use lotto_db::rusqlite::Connection;
use lotto_db::source::TsvArchive;
use lotto_db::store::{LoadReport, StoreHandle};

#[derive(Debug)]
pub struct ImportResult {
    pub report: LoadReport,
    pub stored: usize,
    pub version: u64,
}

/// Reloads the archive, persists the new store, then makes it current in
/// `handle`. When the fetch, the load or the database write fails, `handle`
/// keeps the prior store and the database is rolled back.
pub fn refresh_from_archive(
    conn: &Connection,
    handle: &mut StoreHandle,
    file: &Path,
) -> Result<ImportResult> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(format!("Reading {}", file.display()));

    let mut archive = TsvArchive::new(file);
    let mut stored = 0;
    let result = handle.refresh_with(&mut archive, |store| -> Result<()> {
        pb.set_message("Writing database");
        stored = replace_draws(conn, store)?;
        Ok(())
    });
    let report = match result {
        Ok(report) => report,
        Err(e) => {
            pb.finish_and_clear();
            return Err(e).with_context(|| format!("Import of {:?}", file));
        }
    };
    pb.finish_with_message("Import done");

    Ok(ImportResult {
        report,
        stored,
        version: handle.snapshot().version(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lotto_db::db::{count_draws, load_store, migrate};
    use lotto_db::fixtures::rome_scenario;
    use lotto_db::models::Wheel;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        conn
    }

    fn write_archive(name: &str, content: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("{}-{}.txt", name, std::process::id()));
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_import_archive() {
        let conn = setup();
        let path = write_archive(
            "lotto-import",
            "2024/01/02\tBA\t1\t2\t3\t4\t5\n\
             2024/01/02\tRM\t10\t20\t30\t40\t50\n\
             2024/01/04\tBA\t7\t8\t9\t10\t95\n",
        );
        let mut handle = StoreHandle::new(rome_scenario());
        let result = refresh_from_archive(&conn, &mut handle, &path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(result.report.loaded, 2);
        assert_eq!(result.report.rejected, 1);
        assert_eq!(result.stored, 2);
        assert_eq!(count_draws(&conn).unwrap(), 2);
        assert_eq!(handle.snapshot().version(), result.version);
        assert_eq!(load_store(&conn).unwrap().wheel_len(&Wheel::Bari), 1);
    }

    #[test]
    fn test_database_failure_keeps_prior_store() {
        // No migration: the draws table does not exist.
        let conn = Connection::open_in_memory().unwrap();
        let path = write_archive("lotto-import-nodb", "2024/01/02\tBA\t1\t2\t3\t4\t5\n");
        let prior = rome_scenario();
        let version = prior.version();
        let mut handle = StoreHandle::new(prior);

        let result = refresh_from_archive(&conn, &mut handle, &path);
        std::fs::remove_file(&path).unwrap();

        assert!(result.is_err());
        assert_eq!(handle.snapshot().version(), version);
        assert_eq!(handle.snapshot().wheel_len(&Wheel::Roma), 3);
        assert_eq!(handle.snapshot().wheel_len(&Wheel::Bari), 0);
    }

    #[test]
    fn test_missing_archive_keeps_prior_data() {
        let conn = setup();
        let prior = rome_scenario();
        replace_draws(&conn, &prior).unwrap();
        let version = prior.version();
        let mut handle = StoreHandle::new(prior);

        let missing = std::env::temp_dir().join("lotto-no-such-archive.txt");
        let err = refresh_from_archive(&conn, &mut handle, &missing).unwrap_err();
        assert!(format!("{err:#}").contains("prior data retained"));
        assert_eq!(handle.snapshot().version(), version);
        assert_eq!(count_draws(&conn).unwrap(), 3);
    }
}
