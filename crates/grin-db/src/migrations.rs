use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);"
    )?;

    let version: i64 = conn
        .query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("History DB: running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE history (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                image_path  TEXT NOT NULL CHECK (length(image_path) BETWEEN 1 AND 50),
                class_name  TEXT NOT NULL CHECK (length(class_name) <= 50),
                upload_date TEXT NOT NULL
            );

            CREATE INDEX idx_history_upload_date
                ON history(upload_date);

            INSERT INTO schema_version (version) VALUES (1);
            "
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
