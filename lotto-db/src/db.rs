use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::Connection;
use std::path::Path;

use crate::models::{DrawRecord, Wheel};
use crate::store::DrawStore;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS draws (
    id     INTEGER PRIMARY KEY AUTOINCREMENT,
    date   TEXT NOT NULL,
    wheel  TEXT NOT NULL,
    n1     INTEGER NOT NULL,
    n2     INTEGER,
    n3     INTEGER,
    n4     INTEGER,
    n5     INTEGER
);
CREATE INDEX IF NOT EXISTS draws_wheel_date ON draws (wheel, date);
";

pub fn db_path() -> std::path::PathBuf {
    let mut path = std::env::current_dir().unwrap_or_default();
    path.push("data");
    path.push("lotto.db");
    path
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Cannot create directory {:?}", parent))?;
    }
    let conn = Connection::open(path)
        .with_context(|| format!("Cannot open database {:?}", path))?;
    Ok(conn)
}

pub fn migrate(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)
        .context("Migration failed")?;
    Ok(())
}

fn insert_draw(conn: &Connection, draw: &DrawRecord) -> Result<()> {
    let n = |i: usize| draw.numbers().get(i).copied();
    conn.execute(
        "INSERT INTO draws (date, wheel, n1, n2, n3, n4, n5) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        rusqlite::params![
            draw.date().format("%Y-%m-%d").to_string(),
            draw.wheel().name(),
            n(0),
            n(1),
            n(2),
            n(3),
            n(4),
        ],
    ).context("Insert failed")?;
    Ok(())
}

/// Replaces the persisted history with the content of `store`, in one
/// transaction. Returns the number of rows written.
pub fn replace_draws(conn: &Connection, store: &DrawStore) -> Result<usize> {
    let tx = conn.unchecked_transaction()
        .context("Cannot start transaction")?;
    tx.execute("DELETE FROM draws", [])
        .context("Cannot clear draws")?;
    for draw in store.records() {
        insert_draw(&tx, draw)?;
    }
    tx.commit().context("Commit failed")?;
    Ok(store.len())
}

type DrawRow = (String, String, [Option<u8>; 5]);

/// Rebuilds a store from the persisted history.
pub fn load_store(conn: &Connection) -> Result<DrawStore> {
    let mut stmt = conn.prepare(
        "SELECT date, wheel, n1, n2, n3, n4, n5 FROM draws ORDER BY date ASC, id ASC"
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            [
                row.get::<_, Option<u8>>(2)?,
                row.get::<_, Option<u8>>(3)?,
                row.get::<_, Option<u8>>(4)?,
                row.get::<_, Option<u8>>(5)?,
                row.get::<_, Option<u8>>(6)?,
            ],
        ))
    })?.collect::<Result<Vec<DrawRow>, _>>()?;

    let records = rows
        .into_iter()
        .map(|(date, wheel, numbers)| {
            let day = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
                .with_context(|| format!("Corrupt date in database: '{}'", date))?;
            let numbers: Vec<u8> = numbers.iter().map_while(|n| *n).collect();
            DrawRecord::new(day, Wheel::from_code(&wheel), numbers)
                .with_context(|| format!("Corrupt draw in database: {} {}", date, wheel))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(DrawStore::from_records(records))
}

pub fn count_draws(conn: &Connection) -> Result<u32> {
    let count: u32 = conn.query_row("SELECT COUNT(*) FROM draws", [], |row| row.get(0))?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{record, rome_scenario};

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        conn
    }

    #[test]
    fn test_replace_and_count() {
        let conn = test_conn();
        assert_eq!(count_draws(&conn).unwrap(), 0);

        replace_draws(&conn, &rome_scenario()).unwrap();
        assert_eq!(count_draws(&conn).unwrap(), 3);

        // A second refresh replaces rather than appends
        replace_draws(&conn, &rome_scenario()).unwrap();
        assert_eq!(count_draws(&conn).unwrap(), 3);
    }

    #[test]
    fn test_load_roundtrip_keeps_order_and_partial_draws() {
        let conn = test_conn();
        let store = DrawStore::from_records(vec![
            record("2024-01-05", Wheel::Bari, &[10, 20, 30, 40, 50]),
            record("2024-01-02", Wheel::Roma, &[7, 3]),
            record("2024-01-02", Wheel::Unknown("XX".into()), &[1, 2, 3, 4, 5]),
        ]);
        replace_draws(&conn, &store).unwrap();

        let loaded = load_store(&conn).unwrap();
        assert_eq!(loaded.records(), store.records());
        assert_eq!(loaded.records()[0].numbers(), &[7, 3]);
        assert_ne!(loaded.version(), store.version());
    }
}
