use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;

/// SQLite file name stored inside the application data directory.
const DB_FILE_NAME: &str = "medwise.sqlite";

/// Ensure the database file exists inside `data_dir`, run lazy migrations, and
/// return a live connection.
pub fn ensure_schema(data_dir: &Path) -> Result<Connection> {
    fs::create_dir_all(data_dir).context("failed to create data directory")?;

    let conn =
        Connection::open(data_dir.join(DB_FILE_NAME)).context("failed to open SQLite database")?;
    init_schema(&conn)?;
    Ok(conn)
}

/// Fresh database that lives only as long as the connection.
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory().context("failed to open in-memory database")?;
    init_schema(&conn)?;
    Ok(conn)
}

/// Every persisted value is a string under a unique key, so one table covers
/// saved ids and settings alike.
fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS kv_store (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
        [],
    )
    .context("failed to create kv_store table")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{get_item, set_item};

    #[test]
    fn file_database_persists_between_connections() {
        let dir = tempfile::tempdir().unwrap();
        {
            let conn = ensure_schema(dir.path()).unwrap();
            set_item(&conn, "greeting", "hello").unwrap();
        }
        let conn = ensure_schema(dir.path()).unwrap();
        assert_eq!(get_item(&conn, "greeting").unwrap().as_deref(), Some("hello"));
    }
}
