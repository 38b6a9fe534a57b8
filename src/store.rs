use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;

use crate::model::Record;
use crate::util::{ensure_directory, now_utc_string};

pub const DB_SCHEMA_VERSION: &str = "1";

pub fn open_store(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        ensure_directory(parent)?;
    }

    let connection =
        Connection::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    configure_connection(&connection)?;
    ensure_schema(&connection)?;
    Ok(connection)
}

fn configure_connection(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL")?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous=NORMAL")?;
    Ok(())
}

pub fn ensure_schema(connection: &Connection) -> Result<()> {
    connection
        .execute_batch(
            "
        CREATE TABLE IF NOT EXISTS metadata (
          key TEXT PRIMARY KEY,
          value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS records (
          record_number TEXT PRIMARY KEY,
          address TEXT NOT NULL,
          street_name TEXT NOT NULL,
          suburb TEXT NOT NULL,
          description TEXT NOT NULL,
          applicant TEXT NOT NULL,
          source_url TEXT NOT NULL,
          comment_address TEXT NOT NULL,
          scrape_date TEXT NOT NULL,
          received_date TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_records_scrape_date ON records(scrape_date);
        CREATE INDEX IF NOT EXISTS idx_records_suburb ON records(suburb);
        ",
        )
        .context("failed to create records schema")?;

    connection.execute(
        "INSERT INTO metadata(key, value) VALUES('db_schema_version', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        [DB_SCHEMA_VERSION],
    )?;

    Ok(())
}

/// Inserts a record keyed by its record number. Returns `false` when a record
/// with the same number is already stored; the stored row is left untouched.
pub fn insert_record(connection: &Connection, record: &Record) -> Result<bool> {
    let changed = connection
        .execute(
            "
            INSERT INTO records(
              record_number, address, street_name, suburb, description,
              applicant, source_url, comment_address, scrape_date, received_date
            )
            VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT(record_number) DO NOTHING
            ",
            params![
                &record.record_number,
                &record.address,
                &record.street_name,
                &record.suburb,
                &record.description,
                &record.applicant,
                &record.source_url,
                &record.comment_address,
                &record.scrape_date,
                &record.received_date,
            ],
        )
        .with_context(|| format!("failed to insert record {}", record.record_number))?;

    if changed == 0 {
        debug!(record_number = %record.record_number, "record already stored");
    }

    Ok(changed > 0)
}

pub fn insert_records(connection: &mut Connection, records: &[Record]) -> Result<(usize, usize)> {
    let tx = connection.transaction()?;
    let mut inserted = 0;
    let mut already_present = 0;

    for record in records {
        if insert_record(&tx, record)? {
            inserted += 1;
        } else {
            already_present += 1;
        }
    }

    tx.execute(
        "INSERT INTO metadata(key, value) VALUES('db_updated_at', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        [now_utc_string()],
    )?;
    tx.commit()?;

    Ok((inserted, already_present))
}

pub fn count_records(connection: &Connection) -> Result<i64> {
    let count = connection.query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))?;
    Ok(count)
}

pub fn latest_scrape_date(connection: &Connection) -> Result<Option<String>> {
    let latest = connection
        .query_row("SELECT MAX(scrape_date) FROM records", [], |row| {
            row.get::<_, Option<String>>(0)
        })
        .optional()?
        .flatten();
    Ok(latest)
}

pub fn metadata_value(connection: &Connection, key: &str) -> Result<Option<String>> {
    let value = connection
        .query_row("SELECT value FROM metadata WHERE key = ?1", [key], |row| {
            row.get(0)
        })
        .optional()?;
    Ok(value)
}
