//! Shared helpers for integration tests.
//!
//! Not every test binary uses every helper.
#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use aufmass::error::PersistenceError;
use aufmass::store::{Assignment, PersistenceClient};
use uuid::Uuid;

/// Absolute path of a file under `tests/fixtures/`.
pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

/// In-memory persistence client that records its traffic.
#[derive(Default)]
pub struct RecordingClient {
    saved: Mutex<Vec<Assignment>>,
    save_calls: AtomicUsize,
}

impl RecordingClient {
    pub fn saved(&self) -> Vec<Assignment> {
        self.saved.lock().unwrap().clone()
    }

    pub fn save_call_count(&self) -> usize {
        self.save_calls.load(Ordering::SeqCst)
    }
}

impl PersistenceClient for RecordingClient {
    async fn list(&self, project_id: &str) -> Result<Vec<Assignment>, PersistenceError> {
        Ok(self
            .saved
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn save(&self, assignment: Assignment) -> Result<Assignment, PersistenceError> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        self.saved.lock().unwrap().push(assignment.clone());
        Ok(assignment)
    }

    async fn delete(&self, id: Uuid, _project_id: &str) -> Result<(), PersistenceError> {
        self.saved.lock().unwrap().retain(|a| a.id != id);
        Ok(())
    }
}
