use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};

/// Read the value stored under `key`, if any.
pub fn get_item(conn: &Connection, key: &str) -> Result<Option<String>> {
    conn.query_row(
        "SELECT value FROM kv_store WHERE key = ?1",
        params![key],
        |row| row.get(0),
    )
    .optional()
    .with_context(|| format!("failed to read '{key}'"))
}

/// Insert or replace the value under `key`.
pub fn set_item(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO kv_store (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![key, value],
    )
    .with_context(|| format!("failed to write '{key}'"))?;
    Ok(())
}

pub fn remove_item(conn: &Connection, key: &str) -> Result<()> {
    conn.execute("DELETE FROM kv_store WHERE key = ?1", params![key])
        .with_context(|| format!("failed to remove '{key}'"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;

    #[test]
    fn set_get_overwrite_and_remove() {
        let conn = open_in_memory().unwrap();
        assert_eq!(get_item(&conn, "k").unwrap(), None);

        set_item(&conn, "k", "1").unwrap();
        set_item(&conn, "k", "2").unwrap();
        assert_eq!(get_item(&conn, "k").unwrap().as_deref(), Some("2"));

        remove_item(&conn, "k").unwrap();
        assert_eq!(get_item(&conn, "k").unwrap(), None);
    }
}
