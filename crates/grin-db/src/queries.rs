use crate::models::HistoryRow;
use crate::Database;
use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset};
use grin_types::{ClassificationRecord, Label};
use rusqlite::Connection;

/// Fixed-width RFC 3339 so stored strings with the same offset sort by time.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f%:z";

impl Database {
    // -- History --

    /// Insert a new classification record stamped with the clock's current time.
    pub fn create_record(&self, image_path: &str, label: Label) -> Result<ClassificationRecord> {
        let upload_date = self.clock.now().format(TIMESTAMP_FORMAT).to_string();

        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO history (image_path, class_name, upload_date) VALUES (?1, ?2, ?3)",
                (image_path, label.as_str(), &upload_date),
            )?;
            let id = conn.last_insert_rowid();

            Ok(ClassificationRecord {
                id,
                image_path: image_path.to_string(),
                label,
                upload_date: parse_timestamp(&upload_date)?,
            })
        })
    }

    /// All records, most recent first.
    pub fn list_all(&self) -> Result<Vec<ClassificationRecord>> {
        let rows = self.with_conn(query_history)?;

        let mut records = rows
            .into_iter()
            .map(into_record)
            .collect::<Result<Vec<_>>>()?;

        // Offsets may differ between runs; order by instant, newest id first on ties.
        records.sort_by(|a, b| {
            b.upload_date
                .cmp(&a.upload_date)
                .then_with(|| b.id.cmp(&a.id))
        });

        Ok(records)
    }
}

fn query_history(conn: &Connection) -> Result<Vec<HistoryRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, image_path, class_name, upload_date
         FROM history
         ORDER BY upload_date DESC, id DESC",
    )?;

    let rows = stmt
        .query_map([], |row| {
            Ok(HistoryRow {
                id: row.get(0)?,
                image_path: row.get(1)?,
                class_name: row.get(2)?,
                upload_date: row.get(3)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn into_record(row: HistoryRow) -> Result<ClassificationRecord> {
    let label = row
        .class_name
        .parse::<Label>()
        .with_context(|| format!("Corrupt class_name on history row {}", row.id))?;

    Ok(ClassificationRecord {
        id: row.id,
        upload_date: parse_timestamp(&row.upload_date)
            .with_context(|| format!("Corrupt upload_date on history row {}", row.id))?,
        image_path: row.image_path,
        label,
    })
}

fn parse_timestamp(s: &str) -> Result<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(s).with_context(|| format!("Invalid timestamp '{}'", s))
}
