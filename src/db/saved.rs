//! Saved (favorite) medicine ids, kept as one JSON array under `saved_ids`.

use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::info;

use super::kv::{get_item, set_item};

const SAVED_IDS_KEY: &str = "saved_ids";

/// Ids in the order they were saved. A missing entry means nothing is saved.
pub fn load_saved_ids(conn: &Connection) -> Result<Vec<String>> {
    match get_item(conn, SAVED_IDS_KEY)? {
        Some(raw) => serde_json::from_str(&raw).context("saved list is corrupted"),
        None => Ok(Vec::new()),
    }
}

fn store_saved_ids(conn: &Connection, ids: &[String]) -> Result<()> {
    let raw = serde_json::to_string(ids).context("failed to encode saved list")?;
    set_item(conn, SAVED_IDS_KEY, &raw)
}

pub fn is_saved(conn: &Connection, id: &str) -> Result<bool> {
    Ok(load_saved_ids(conn)?.iter().any(|saved| saved == id))
}

/// Save `id` when absent, unsave it when present. Returns whether the id is
/// saved afterwards.
pub fn toggle_saved(conn: &Connection, id: &str) -> Result<bool> {
    let mut ids = load_saved_ids(conn)?;
    let now_saved = if ids.iter().any(|saved| saved == id) {
        ids.retain(|saved| saved != id);
        false
    } else {
        ids.push(id.to_string());
        true
    };
    store_saved_ids(conn, &ids)?;
    info!(id, saved = now_saved, "saved list updated");
    Ok(now_saved)
}

pub fn remove_saved(conn: &Connection, id: &str) -> Result<()> {
    let mut ids = load_saved_ids(conn)?;
    ids.retain(|saved| saved != id);
    store_saved_ids(conn, &ids)
}

pub fn clear_saved(conn: &Connection) -> Result<()> {
    store_saved_ids(conn, &[])?;
    info!("saved list cleared");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{get_item, open_in_memory};

    #[test]
    fn empty_store_has_nothing_saved() {
        let conn = open_in_memory().unwrap();
        assert!(load_saved_ids(&conn).unwrap().is_empty());
        assert!(!is_saved(&conn, "1").unwrap());
    }

    #[test]
    fn toggle_appends_then_removes() {
        let conn = open_in_memory().unwrap();
        assert!(toggle_saved(&conn, "3").unwrap());
        assert!(toggle_saved(&conn, "1").unwrap());
        assert_eq!(load_saved_ids(&conn).unwrap(), vec!["3", "1"]);

        assert!(!toggle_saved(&conn, "3").unwrap());
        assert_eq!(load_saved_ids(&conn).unwrap(), vec!["1"]);
        assert!(is_saved(&conn, "1").unwrap());
    }

    #[test]
    fn remove_and_clear() {
        let conn = open_in_memory().unwrap();
        for id in ["a", "b", "c"] {
            toggle_saved(&conn, id).unwrap();
        }
        remove_saved(&conn, "b").unwrap();
        remove_saved(&conn, "missing").unwrap();
        assert_eq!(load_saved_ids(&conn).unwrap(), vec!["a", "c"]);

        clear_saved(&conn).unwrap();
        assert_eq!(get_item(&conn, SAVED_IDS_KEY).unwrap().as_deref(), Some("[]"));
        assert!(load_saved_ids(&conn).unwrap().is_empty());
    }

    #[test]
    fn corrupted_value_is_reported() {
        let conn = open_in_memory().unwrap();
        set_item(&conn, SAVED_IDS_KEY, "not json").unwrap();
        let err = load_saved_ids(&conn).unwrap_err();
        assert_eq!(err.to_string(), "saved list is corrupted");
    }
}
