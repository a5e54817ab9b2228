//! Draft and assignment lifecycle.
//!
//! One [`AssignmentStore`] serves one project. It holds the single live
//! [`Draft`], persists it locally through a [`DraftStorage`] on every
//! mutation (so a crashed session resumes where it left off), and promotes
//! it to an immutable [`Assignment`] through an injected
//! [`PersistenceClient`] on save.
//!
//! The store never retries transport calls and never discards the draft
//! until a save is acknowledged. The draft is single-writer per project;
//! two concurrent editors would be last-write-wins on the local file, which
//! is accepted and out of scope.

mod local;

pub use local::{InMemoryDraftStorage, JsonFileDraftStorage};

use chrono::Utc;
use log::debug;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::crs::CrsId;
use crate::error::{AufmassError, PersistenceError, ValidationError};
use crate::geo::{path_length_m, GeoPoint};

/// Hard cap on points held by one draft, matching the import cap.
pub const MAX_DRAFT_POINTS: usize = 20_000;

/// An immutable, saved set of points bound to a project and a
/// bill-of-quantities position.
///
/// Saved assignments are never mutated; re-measuring a position creates a
/// new assignment with a fresh id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub id: Uuid,
    pub project_id: String,
    pub lv_position_id: String,
    pub points: Vec<GeoPoint>,
    /// Unix timestamp (seconds) of the save.
    pub created_at: i64,
}

/// The unsaved, locally persisted working state of one in-progress
/// assignment. Exactly one per project.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    pub project_id: String,
    pub points: Vec<GeoPoint>,
    pub selected_lv_position_id: Option<String>,
    /// Reference system to prefer for the next import's CRS detection.
    pub preferred_crs: CrsId,
}

impl Draft {
    /// An empty draft for a project. UTM zone 32N is the default
    /// expectation for German sites.
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            points: Vec::new(),
            selected_lv_position_id: None,
            preferred_crs: CrsId::Etrs89Utm32,
        }
    }
}

/// Remote persistence operations for saved assignments.
///
/// The transport (HTTP, database, whatever) lives behind this trait; the
/// store only needs these three calls. Implementations decide their own
/// retry policy — the store surfaces every failure exactly once.
///
/// Callers hold the store generically over the client, so the returned
/// futures need no extra `Send` bounds here.
#[allow(async_fn_in_trait)]
pub trait PersistenceClient {
    async fn list(&self, project_id: &str) -> Result<Vec<Assignment>, PersistenceError>;
    async fn save(&self, assignment: Assignment) -> Result<Assignment, PersistenceError>;
    async fn delete(&self, id: Uuid, project_id: &str) -> Result<(), PersistenceError>;
}

/// Local draft persistence keyed by project id.
pub trait DraftStorage {
    fn load(&self, project_id: &str) -> Result<Option<Draft>, PersistenceError>;
    fn store(&self, draft: &Draft) -> Result<(), PersistenceError>;
    fn clear(&self, project_id: &str) -> Result<(), PersistenceError>;
}

/// Holds the live draft for one project and mediates persistence.
pub struct AssignmentStore<C, S> {
    client: C,
    storage: S,
    draft: Draft,
    assignments: Vec<Assignment>,
}

impl<C: PersistenceClient, S: DraftStorage> AssignmentStore<C, S> {
    /// Opens the store for a project, resuming a locally persisted draft if
    /// one survived a previous session.
    pub fn open(
        project_id: impl Into<String>,
        client: C,
        storage: S,
    ) -> Result<Self, PersistenceError> {
        let project_id = project_id.into();
        let draft = match storage.load(&project_id)? {
            Some(draft) => {
                debug!(
                    "resumed draft for project {project_id} with {} points",
                    draft.points.len()
                );
                draft
            }
            None => Draft::new(project_id),
        };
        Ok(Self {
            client,
            storage,
            draft,
            assignments: Vec::new(),
        })
    }

    /// The current draft.
    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    /// The injected persistence client.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Locally known saved assignments (as of the last [`refresh`]).
    ///
    /// [`refresh`]: AssignmentStore::refresh
    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    /// Path length of the current draft in meters, derived fresh.
    pub fn draft_length_m(&self) -> f64 {
        path_length_m(&self.draft.points)
    }

    /// Appends one point (map click or import), persisting the draft.
    ///
    /// # Errors
    /// [`ValidationError::DraftFull`] at [`MAX_DRAFT_POINTS`]; the point is
    /// rejected, nothing is dropped from the middle.
    pub fn push_point(&mut self, point: GeoPoint) -> Result<&Draft, AufmassError> {
        if self.draft.points.len() >= MAX_DRAFT_POINTS {
            return Err(ValidationError::DraftFull {
                max: MAX_DRAFT_POINTS,
            }
            .into());
        }
        self.draft.points.push(point);
        self.storage.store(&self.draft)?;
        Ok(&self.draft)
    }

    /// Appends an imported batch of points in one go.
    ///
    /// All-or-nothing: if the batch would push the draft over the cap, the
    /// draft is left untouched and [`ValidationError::DraftFull`] is
    /// returned.
    pub fn extend_points(
        &mut self,
        points: impl IntoIterator<Item = GeoPoint>,
    ) -> Result<&Draft, AufmassError> {
        let points: Vec<GeoPoint> = points.into_iter().collect();
        if self.draft.points.len() + points.len() > MAX_DRAFT_POINTS {
            return Err(ValidationError::DraftFull {
                max: MAX_DRAFT_POINTS,
            }
            .into());
        }
        self.draft.points.extend(points);
        self.storage.store(&self.draft)?;
        Ok(&self.draft)
    }

    /// Selects (or clears) the bill-of-quantities position for the draft.
    pub fn select_lv_position(
        &mut self,
        lv_position_id: Option<String>,
    ) -> Result<&Draft, AufmassError> {
        self.draft.selected_lv_position_id = lv_position_id;
        self.storage.store(&self.draft)?;
        Ok(&self.draft)
    }

    /// Remembers the reference system to prefer for the next import.
    pub fn set_preferred_crs(&mut self, crs: CrsId) -> Result<&Draft, AufmassError> {
        self.draft.preferred_crs = crs;
        self.storage.store(&self.draft)?;
        Ok(&self.draft)
    }

    /// Discards the draft, locally and in storage.
    pub fn clear_draft(&mut self) -> Result<(), AufmassError> {
        self.draft = Draft::new(self.draft.project_id.clone());
        self.storage.clear(&self.draft.project_id)?;
        Ok(())
    }

    /// Promotes the draft to a saved [`Assignment`].
    ///
    /// Validation runs before the client is touched. The draft is cleared
    /// only after the client acknowledges, which makes save at-most-once: a
    /// duplicate save of the same draft fails validation on the now-empty
    /// draft. A client failure leaves the draft fully intact.
    pub async fn save(&mut self) -> Result<Assignment, AufmassError> {
        if self.draft.points.is_empty() {
            return Err(ValidationError::EmptyDraft.into());
        }
        let lv_position_id = self
            .draft
            .selected_lv_position_id
            .clone()
            .ok_or(ValidationError::MissingLvPosition)?;

        let assignment = Assignment {
            id: Uuid::new_v4(),
            project_id: self.draft.project_id.clone(),
            lv_position_id,
            points: self.draft.points.clone(),
            created_at: Utc::now().timestamp(),
        };

        let saved = self.client.save(assignment).await?;
        self.assignments.push(saved.clone());
        self.draft = Draft::new(self.draft.project_id.clone());
        self.storage.clear(&self.draft.project_id)?;
        debug!(
            "saved assignment {} ({} points) for project {}",
            saved.id,
            saved.points.len(),
            saved.project_id
        );
        Ok(saved)
    }

    /// Reloads the saved-assignment list from the client.
    pub async fn refresh(&mut self) -> Result<&[Assignment], AufmassError> {
        self.assignments = self.client.list(&self.draft.project_id).await?;
        Ok(&self.assignments)
    }

    /// Deletes a saved assignment.
    ///
    /// The local list is updated optimistically and rolled back if the
    /// client reports failure.
    pub async fn delete(&mut self, id: Uuid) -> Result<(), AufmassError> {
        let removed = self
            .assignments
            .iter()
            .position(|a| a.id == id)
            .map(|idx| (idx, self.assignments.remove(idx)));

        match self.client.delete(id, &self.draft.project_id).await {
            Ok(()) => Ok(()),
            Err(err) => {
                if let Some((idx, assignment)) = removed {
                    self.assignments.insert(idx, assignment);
                }
                Err(err.into())
            }
        }
    }

    /// Loads a saved assignment back into the draft for re-editing.
    ///
    /// Copy semantics: the saved assignment is never mutated; editing the
    /// draft and saving creates a new assignment.
    pub fn resume(&mut self, assignment: &Assignment) -> Result<&Draft, AufmassError> {
        self.draft.points = assignment.points.clone();
        self.draft.selected_lv_position_id = Some(assignment.lv_position_id.clone());
        self.storage.store(&self.draft)?;
        Ok(&self.draft)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Client double that records calls and can be told to fail.
    #[derive(Default)]
    struct StubClient {
        saved: Mutex<Vec<Assignment>>,
        save_calls: AtomicUsize,
        fail: bool,
    }

    impl StubClient {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }
    }

    impl PersistenceClient for StubClient {
        async fn list(&self, project_id: &str) -> Result<Vec<Assignment>, PersistenceError> {
            if self.fail {
                return Err(PersistenceError::Transport("stub offline".into()));
            }
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
            if self.fail {
                return Err(PersistenceError::Transport("stub offline".into()));
            }
            self.saved.lock().unwrap().push(assignment.clone());
            Ok(assignment)
        }

        async fn delete(&self, id: Uuid, _project_id: &str) -> Result<(), PersistenceError> {
            if self.fail {
                return Err(PersistenceError::Transport("stub offline".into()));
            }
            self.saved.lock().unwrap().retain(|a| a.id != id);
            Ok(())
        }
    }

    fn store() -> AssignmentStore<StubClient, InMemoryDraftStorage> {
        AssignmentStore::open("P-100", StubClient::default(), InMemoryDraftStorage::default())
            .unwrap()
    }

    fn point(i: usize) -> GeoPoint {
        GeoPoint::new(48.14 + i as f64 * 1e-4, 11.58)
    }

    #[tokio::test]
    async fn save_on_empty_draft_never_reaches_the_client() {
        let mut store = store();
        let err = store.save().await.unwrap_err();
        assert!(matches!(
            err,
            AufmassError::Validation(ValidationError::EmptyDraft)
        ));
        assert_eq!(store.client.save_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn save_without_lv_position_never_reaches_the_client() {
        let mut store = store();
        store.push_point(point(0)).unwrap();
        let err = store.save().await.unwrap_err();
        assert!(matches!(
            err,
            AufmassError::Validation(ValidationError::MissingLvPosition)
        ));
        assert_eq!(store.client.save_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn save_clears_the_draft_and_is_at_most_once() {
        let mut store = store();
        store.push_point(point(0)).unwrap();
        store.push_point(point(1)).unwrap();
        store.select_lv_position(Some("LV-01.02.0030".into())).unwrap();

        let saved = store.save().await.unwrap();
        assert_eq!(saved.points.len(), 2);
        assert_eq!(saved.lv_position_id, "LV-01.02.0030");
        assert!(store.draft().points.is_empty());
        assert!(store.draft().selected_lv_position_id.is_none());

        // The double click: the draft is gone, so nothing is resubmitted.
        let err = store.save().await.unwrap_err();
        assert!(matches!(
            err,
            AufmassError::Validation(ValidationError::EmptyDraft)
        ));
        assert_eq!(store.client.save_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_save_preserves_the_draft() {
        let mut store = AssignmentStore::open(
            "P-100",
            StubClient::failing(),
            InMemoryDraftStorage::default(),
        )
        .unwrap();
        store.push_point(point(0)).unwrap();
        store.select_lv_position(Some("LV-01".into())).unwrap();

        let err = store.save().await.unwrap_err();
        assert!(matches!(err, AufmassError::Persistence(_)));
        assert_eq!(store.draft().points.len(), 1);
        assert_eq!(
            store.draft().selected_lv_position_id.as_deref(),
            Some("LV-01")
        );
    }

    #[tokio::test]
    async fn delete_rolls_back_on_client_failure() {
        let mut store = AssignmentStore::open(
            "P-100",
            StubClient::failing(),
            InMemoryDraftStorage::default(),
        )
        .unwrap();
        let assignment = Assignment {
            id: Uuid::new_v4(),
            project_id: "P-100".into(),
            lv_position_id: "LV-01".into(),
            points: vec![point(0)],
            created_at: 1_700_000_000,
        };
        store.assignments.push(assignment.clone());

        assert!(store.delete(assignment.id).await.is_err());
        assert_eq!(store.assignments(), &[assignment]);
    }

    #[tokio::test]
    async fn resume_copies_without_mutating_the_original() {
        let mut store = store();
        let assignment = Assignment {
            id: Uuid::new_v4(),
            project_id: "P-100".into(),
            lv_position_id: "LV-07".into(),
            points: vec![point(0), point(1)],
            created_at: 1_700_000_000,
        };
        let before = assignment.clone();

        store.resume(&assignment).unwrap();
        store.push_point(point(2)).unwrap();

        assert_eq!(assignment, before);
        assert_eq!(store.draft().points.len(), 3);
        assert_eq!(
            store.draft().selected_lv_position_id.as_deref(),
            Some("LV-07")
        );
    }

    #[tokio::test]
    async fn draft_cap_rejects_excess_points() {
        let mut store = store();
        let bulk: Vec<GeoPoint> = (0..MAX_DRAFT_POINTS).map(point).collect();
        store.extend_points(bulk).unwrap();

        let err = store.push_point(point(0)).unwrap_err();
        assert!(matches!(
            err,
            AufmassError::Validation(ValidationError::DraftFull { .. })
        ));
        assert_eq!(store.draft().points.len(), MAX_DRAFT_POINTS);

        // A bulk append over the cap leaves the draft untouched too.
        let err = store.extend_points(vec![point(0)]).unwrap_err();
        assert!(matches!(
            err,
            AufmassError::Validation(ValidationError::DraftFull { .. })
        ));
    }

    #[tokio::test]
    async fn refresh_and_delete_round_trip() {
        let mut store = store();
        store.push_point(point(0)).unwrap();
        store.select_lv_position(Some("LV-01".into())).unwrap();
        let saved = store.save().await.unwrap();

        store.refresh().await.unwrap();
        assert_eq!(store.assignments().len(), 1);

        store.delete(saved.id).await.unwrap();
        assert!(store.assignments().is_empty());
        store.refresh().await.unwrap();
        assert!(store.assignments().is_empty());
    }

    #[test]
    fn draft_length_is_derived_fresh() {
        let mut store = store();
        assert_eq!(store.draft_length_m(), 0.0);
        store.push_point(GeoPoint::new(48.0, 11.0)).unwrap();
        store.push_point(GeoPoint::new(48.0, 11.1)).unwrap();
        assert!(store.draft_length_m() > 7_000.0);
    }
}
