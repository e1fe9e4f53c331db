//! Static dataset loading. The default records are compiled into the binary;
//! a JSON file with the same shape can replace them through `config.json`.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::models::Medicine;

const BUNDLED_DATASET: &str = include_str!("../data/medicines.json");

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to read dataset {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("dataset {origin} is not a valid medicine list")]
    Parse {
        origin: String,
        #[source]
        source: serde_json::Error,
    },
}

/// In-memory medicine collection plus an id lookup table.
#[derive(Debug, Clone)]
pub struct Dataset {
    medicines: Vec<Medicine>,
    by_id: HashMap<String, usize>,
}

impl Dataset {
    /// Records shipped with the application.
    pub fn bundled() -> Result<Self, DatasetError> {
        Self::from_json_str(BUNDLED_DATASET, "bundled")
    }

    pub fn from_path(path: &Path) -> Result<Self, DatasetError> {
        let content = fs::read_to_string(path).map_err(|source| DatasetError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content, &path.display().to_string())
    }

    pub fn from_json_str(json: &str, origin: &str) -> Result<Self, DatasetError> {
        let medicines: Vec<Medicine> =
            serde_json::from_str(json).map_err(|source| DatasetError::Parse {
                origin: origin.to_string(),
                source,
            })?;
        info!(origin, records = medicines.len(), "dataset loaded");
        Ok(Self::new(medicines))
    }

    pub fn new(medicines: Vec<Medicine>) -> Self {
        let mut by_id = HashMap::with_capacity(medicines.len());
        for (idx, medicine) in medicines.iter().enumerate() {
            // First occurrence wins so lookups agree with dataset order.
            by_id.entry(medicine.id.clone()).or_insert(idx);
        }
        Self { medicines, by_id }
    }

    pub fn medicines(&self) -> &[Medicine] {
        &self.medicines
    }

    pub fn len(&self) -> usize {
        self.medicines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.medicines.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Medicine> {
        self.by_id.get(id).map(|&idx| &self.medicines[idx])
    }

    /// Map ids to records keeping the order of `ids`. Unknown ids are
    /// skipped.
    pub fn resolve_ids(&self, ids: &[String]) -> Vec<Medicine> {
        ids.iter().filter_map(|id| self.get(id)).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn bundled_dataset_parses() {
        let dataset = Dataset::bundled().unwrap();
        assert!(!dataset.is_empty());
        assert_eq!(dataset.get("1").map(|m| m.name.as_str()), Some("Avil 25 Tablet"));
    }

    #[test]
    fn resolve_ids_keeps_requested_order_and_skips_unknown() {
        let dataset = Dataset::from_json_str(
            r#"[{"id": "a", "name": "A"}, {"id": "b", "name": "B"}, {"id": "c", "name": "C"}]"#,
            "test",
        )
        .unwrap();
        let ids = vec!["c".to_string(), "missing".to_string(), "a".to_string()];
        let names: Vec<_> = dataset
            .resolve_ids(&ids)
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(names, vec!["C", "A"]);
    }

    #[test]
    fn from_path_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"id": 7, "name": "Seven"}}]"#).unwrap();
        let dataset = Dataset::from_path(file.path()).unwrap();
        assert_eq!(dataset.len(), 1);
        assert!(dataset.get("7").is_some());
    }

    #[test]
    fn reports_missing_file_and_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        assert!(matches!(
            Dataset::from_path(&missing),
            Err(DatasetError::Read { .. })
        ));
        assert!(matches!(
            Dataset::from_json_str("{\"id\": 1}", "inline"),
            Err(DatasetError::Parse { .. })
        ));
    }
}
