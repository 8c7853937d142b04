//! # Saved-Resume Dashboard
//!
//! Lists the signed-in user's saved resumes and supports selecting and deleting them.
//! Failures are stored as a message and returned; nothing is retried automatically.

use crate::constants::{DELETE_FALLBACK_MESSAGE, FETCH_FALLBACK_MESSAGE};
use crate::errors::WorkflowError;
use crate::providers::{auth::IdentityProvider, store::ResumeStore};
use crate::types::{ResumeRecord, SessionState};
use std::sync::{Mutex, MutexGuard};
use tracing::{info, warn};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DashboardState {
    /// Newest first.
    pub records: Vec<ResumeRecord>,
    pub loading: bool,
    pub deleting: bool,
    pub error: Option<String>,
}

pub struct Dashboard {
    identity: Box<dyn IdentityProvider>,
    store: Box<dyn ResumeStore>,
    state: Mutex<DashboardState>,
}

impl std::fmt::Debug for Dashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dashboard")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl Dashboard {
    pub fn new(identity: Box<dyn IdentityProvider>, store: Box<dyn ResumeStore>) -> Self {
        Self {
            identity,
            store,
            state: Mutex::new(DashboardState::default()),
        }
    }

    pub fn state(&self) -> DashboardState {
        self.lock().clone()
    }

    pub fn records(&self) -> Vec<ResumeRecord> {
        self.lock().records.clone()
    }

    fn lock(&self) -> MutexGuard<'_, DashboardState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Loads the user's records. Without a session the list is simply emptied.
    ///
    /// Returns how many records were loaded.
    pub async fn fetch(&self) -> Result<usize, WorkflowError> {
        let SessionState::SignedIn(session) = self.identity.current_session() else {
            *self.lock() = DashboardState::default();
            return Ok(0);
        };

        self.lock().loading = true;
        let result = self.store.list(&session).await;
        let mut state = self.lock();
        state.loading = false;
        match result {
            Ok(mut records) => {
                records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                info!("Fetched {} saved resumes", records.len());
                let count = records.len();
                state.records = records;
                state.error = None;
                Ok(count)
            }
            Err(e) => {
                warn!("Fetching saved resumes failed: {e}");
                state.error = Some(FETCH_FALLBACK_MESSAGE.to_string());
                Err(WorkflowError::Fetch(FETCH_FALLBACK_MESSAGE.to_string()))
            }
        }
    }

    /// The explicit refresh action. Same as [`Dashboard::fetch`].
    pub async fn refresh(&self) -> Result<usize, WorkflowError> {
        self.fetch().await
    }

    /// Deletes a record, then re-fetches the list.
    pub async fn delete(&self, id: &str) -> Result<(), WorkflowError> {
        let SessionState::SignedIn(session) = self.identity.current_session() else {
            return Err(WorkflowError::Delete(DELETE_FALLBACK_MESSAGE.to_string()));
        };

        self.lock().deleting = true;
        let result = self.store.delete(&session, id).await;
        {
            let mut state = self.lock();
            state.deleting = false;
            if let Err(e) = &result {
                warn!("Deleting saved resume {id} failed: {e}");
                state.error = Some(DELETE_FALLBACK_MESSAGE.to_string());
            }
        }
        if result.is_err() {
            return Err(WorkflowError::Delete(DELETE_FALLBACK_MESSAGE.to_string()));
        }

        info!("Deleted saved resume {id}");
        self.fetch().await.map(|_| ())
    }

    /// Looks up a loaded record for the workflow. No network call is made.
    pub fn select(&self, id: &str) -> Option<ResumeRecord> {
        self.lock().records.iter().find(|r| r.id == id).cloned()
    }
}
