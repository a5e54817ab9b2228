//! Local draft persistence backends.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use super::{Draft, DraftStorage};
use crate::error::PersistenceError;

/// Stores drafts as one JSON file per project under a base directory.
///
/// Writes are whole-file replacements; concurrent writers for the same
/// project are last-write-wins, which is acceptable because the engine
/// assumes a single writer per project.
pub struct JsonFileDraftStorage {
    base_dir: PathBuf,
}

impl JsonFileDraftStorage {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Project ids may contain path separators or other hostile characters;
    /// the file name keeps only a safe subset.
    fn path_for(&self, project_id: &str) -> PathBuf {
        let safe: String = project_id
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.base_dir.join(format!("draft-{safe}.json"))
    }
}

impl DraftStorage for JsonFileDraftStorage {
    fn load(&self, project_id: &str) -> Result<Option<Draft>, PersistenceError> {
        let path = self.path_for(project_id);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(PersistenceError::DraftStorage { path, source: err });
            }
        };
        let draft = serde_json::from_str(&text)?;
        Ok(Some(draft))
    }

    fn store(&self, draft: &Draft) -> Result<(), PersistenceError> {
        let path = self.path_for(&draft.project_id);
        fs::create_dir_all(&self.base_dir).map_err(|source| PersistenceError::DraftStorage {
            path: self.base_dir.clone(),
            source,
        })?;
        let text = serde_json::to_string_pretty(draft)?;
        fs::write(&path, text).map_err(|source| PersistenceError::DraftStorage { path, source })
    }

    fn clear(&self, project_id: &str) -> Result<(), PersistenceError> {
        let path = self.path_for(project_id);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(PersistenceError::DraftStorage { path, source: err }),
        }
    }
}

/// In-memory storage for tests and headless embedding.
#[derive(Default)]
pub struct InMemoryDraftStorage {
    drafts: Mutex<HashMap<String, Draft>>,
}

impl DraftStorage for InMemoryDraftStorage {
    fn load(&self, project_id: &str) -> Result<Option<Draft>, PersistenceError> {
        Ok(self.drafts.lock().unwrap().get(project_id).cloned())
    }

    fn store(&self, draft: &Draft) -> Result<(), PersistenceError> {
        self.drafts
            .lock()
            .unwrap()
            .insert(draft.project_id.clone(), draft.clone());
        Ok(())
    }

    fn clear(&self, project_id: &str) -> Result<(), PersistenceError> {
        self.drafts.lock().unwrap().remove(project_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::GeoPoint;

    #[test]
    fn file_storage_round_trips_a_draft() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileDraftStorage::new(dir.path());

        let mut draft = Draft::new("P-100");
        draft.points.push(GeoPoint::new(48.14, 11.58).with_timestamp(1_700_000_000));
        draft.selected_lv_position_id = Some("LV-01.02.0030".into());

        storage.store(&draft).unwrap();
        let reloaded = storage.load("P-100").unwrap().unwrap();
        assert_eq!(reloaded, draft);
    }

    #[test]
    fn missing_draft_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileDraftStorage::new(dir.path());
        assert!(storage.load("P-404").unwrap().is_none());
    }

    #[test]
    fn clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileDraftStorage::new(dir.path());
        storage.store(&Draft::new("P-100")).unwrap();
        storage.clear("P-100").unwrap();
        storage.clear("P-100").unwrap();
        assert!(storage.load("P-100").unwrap().is_none());
    }

    #[test]
    fn hostile_project_ids_stay_inside_the_base_dir() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileDraftStorage::new(dir.path());
        storage.store(&Draft::new("../../etc/passwd")).unwrap();
        let reloaded = storage.load("../../etc/passwd").unwrap();
        assert!(reloaded.is_some());
        // Exactly one file, inside the base directory.
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
