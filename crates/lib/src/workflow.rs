//! # Upload-and-Match Workflow
//!
//! Drives the two independent state machines of the client: uploading a resume
//! (`Idle → Uploading → Uploaded | Failed`) and matching it against a job description
//! (`Idle → Matching → Matched | Failed`). Both share the resume text held in
//! [`ViewState`].
//!
//! Every call takes a ticket from a per-machine generation counter when it starts.
//! A call that completes after a newer one of the same kind was started is discarded,
//! so only the most recently initiated upload or match reaches the view state.
//!
//! When a session is present, successful uploads and matches are saved to the
//! [`ResumeStore`]. A failed save never hides the result it belongs to; it is
//! recorded in [`ViewState::save_error`] instead.

use crate::constants::{
    EMPTY_JOB_DESC_MESSAGE, MATCH_FALLBACK_MESSAGE, NOT_PDF_MESSAGE, NO_RESUME_MESSAGE,
    SAVE_FALLBACK_MESSAGE, UPLOAD_FALLBACK_MESSAGE,
};
use crate::errors::WorkflowError;
use crate::providers::{analysis::AnalysisProvider, auth::IdentityProvider, store::ResumeStore};
use crate::types::{MatchResult, NewResume, ResumeFile, ResumeRecord, SessionState, UploadResponse};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum UploadState {
    #[default]
    Idle,
    Uploading,
    Uploaded,
    Failed(String),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum MatchState {
    #[default]
    Idle,
    Matching,
    Matched,
    Failed(String),
}

/// Everything a front-end renders for the workflow.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ViewState {
    pub upload: UploadState,
    pub matching: MatchState,
    pub resume_text: String,
    pub skills: Vec<String>,
    /// The label the current resume is saved under.
    pub job_title: Option<String>,
    pub match_result: Option<MatchResult>,
    /// Set when the last automatic save failed; cleared by the next successful one.
    pub save_error: Option<String>,
}

impl ViewState {
    pub fn has_resume(&self) -> bool {
        !self.resume_text.is_empty()
    }
}

/// Coordinates upload, match and automatic saving for one user session.
pub struct Workflow {
    analysis: Box<dyn AnalysisProvider>,
    identity: Box<dyn IdentityProvider>,
    store: Box<dyn ResumeStore>,
    view: Mutex<ViewState>,
    upload_generation: AtomicU64,
    match_generation: AtomicU64,
}

impl std::fmt::Debug for Workflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workflow")
            .field("analysis", &self.analysis)
            .field("view", &self.view())
            .finish_non_exhaustive()
    }
}

impl Workflow {
    pub fn new(
        analysis: Box<dyn AnalysisProvider>,
        identity: Box<dyn IdentityProvider>,
        store: Box<dyn ResumeStore>,
    ) -> Self {
        Self {
            analysis,
            identity,
            store,
            view: Mutex::new(ViewState::default()),
            upload_generation: AtomicU64::new(0),
            match_generation: AtomicU64::new(0),
        }
    }

    /// A snapshot of the current view state.
    pub fn view(&self) -> ViewState {
        self.lock().clone()
    }

    pub fn is_uploading(&self) -> bool {
        self.lock().upload == UploadState::Uploading
    }

    pub fn is_matching(&self) -> bool {
        self.lock().matching == MatchState::Matching
    }

    fn lock(&self) -> MutexGuard<'_, ViewState> {
        self.view.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn update(&self, f: impl FnOnce(&mut ViewState)) {
        f(&mut self.lock());
    }

    /// Sends a PDF for extraction and applies the result.
    ///
    /// Non-PDF files are rejected before any network call.
    pub async fn submit_file(&self, file: &ResumeFile) -> Result<UploadResponse, WorkflowError> {
        if !file.is_pdf() {
            info!(
                "Rejected '{}': unsupported type '{}'",
                file.file_name, file.mime_type
            );
            return Err(WorkflowError::Validation(NOT_PDF_MESSAGE.to_string()));
        }

        let ticket = self.upload_generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.update(|view| {
            view.upload = UploadState::Uploading;
            view.match_result = None;
        });

        let result = self.analysis.upload_resume(file).await;
        if self.upload_generation.load(Ordering::SeqCst) != ticket {
            debug!("Discarding upload #{ticket} of '{}': superseded", file.file_name);
            return Err(WorkflowError::Superseded);
        }

        match result {
            Ok(upload) => {
                let title = file.derived_title();
                info!(
                    "Upload #{ticket} of '{}' extracted {} skills",
                    file.file_name,
                    upload.skills.len()
                );
                self.update(|view| {
                    view.upload = UploadState::Uploaded;
                    view.matching = MatchState::Idle;
                    view.resume_text = upload.resume_text.clone();
                    view.skills = upload.skills.clone();
                    view.job_title = Some(title);
                });
                self.autosave().await;
                Ok(upload)
            }
            Err(e) => {
                let message = e.user_message(UPLOAD_FALLBACK_MESSAGE);
                warn!("Upload #{ticket} of '{}' failed: {e}", file.file_name);
                self.update(|view| {
                    view.upload = UploadState::Failed(message.clone());
                    view.match_result = None;
                });
                Err(WorkflowError::Upload(message))
            }
        }
    }

    /// Scores the current resume text against `job_desc`.
    ///
    /// A blank `industry` is sent as no industry.
    pub async fn analyze_match(
        &self,
        job_desc: &str,
        industry: Option<&str>,
    ) -> Result<MatchResult, WorkflowError> {
        let resume_text = self.lock().resume_text.clone();
        if resume_text.is_empty() {
            return Err(WorkflowError::Validation(NO_RESUME_MESSAGE.to_string()));
        }
        if job_desc.trim().is_empty() {
            return Err(WorkflowError::Validation(EMPTY_JOB_DESC_MESSAGE.to_string()));
        }
        let industry = industry.map(str::trim).filter(|i| !i.is_empty());

        let ticket = self.match_generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.update(|view| {
            view.matching = MatchState::Matching;
            view.match_result = None;
        });

        let result = self
            .analysis
            .analyze_match(&resume_text, job_desc, industry)
            .await;
        if self.match_generation.load(Ordering::SeqCst) != ticket {
            debug!("Discarding match #{ticket}: superseded");
            return Err(WorkflowError::Superseded);
        }

        match result {
            Ok(result) => {
                info!("Match #{ticket} scored {}", result.match_score);
                self.update(|view| {
                    view.matching = MatchState::Matched;
                    view.match_result = Some(result.clone());
                });
                self.autosave().await;
                Ok(result)
            }
            Err(e) => {
                let message = e.user_message(MATCH_FALLBACK_MESSAGE);
                warn!("Match #{ticket} failed: {e}");
                self.update(|view| view.matching = MatchState::Failed(message.clone()));
                Err(WorkflowError::Match(message))
            }
        }
    }

    /// Replaces the current resume without a network call. Any upload still in flight
    /// is superseded.
    pub fn load_resume(
        &self,
        resume_text: String,
        skills: Vec<String>,
        job_title: Option<String>,
    ) {
        self.upload_generation.fetch_add(1, Ordering::SeqCst);
        self.update(|view| {
            view.upload = UploadState::Uploaded;
            view.matching = MatchState::Idle;
            view.resume_text = resume_text;
            view.skills = skills;
            view.job_title = job_title;
            view.match_result = None;
        });
    }

    /// Hands a saved record to the workflow, as selecting it on the dashboard does.
    pub fn load_record(&self, record: &ResumeRecord) {
        info!("Loading saved resume {}", record.id);
        self.load_resume(
            record.resume_text.clone(),
            record.skills.clone(),
            record.job_title.clone(),
        );
    }

    /// Returns to the initial state and supersedes every call in flight.
    pub fn reset(&self) {
        self.upload_generation.fetch_add(1, Ordering::SeqCst);
        self.match_generation.fetch_add(1, Ordering::SeqCst);
        self.update(|view| *view = ViewState::default());
    }

    /// Saves the current resume if a session is present. Returns `Ok(None)` when
    /// signed out or when no resume has been loaded.
    ///
    /// The outcome is also recorded in [`ViewState::save_error`].
    pub async fn save(&self) -> Result<Option<ResumeRecord>, WorkflowError> {
        let SessionState::SignedIn(session) = self.identity.current_session() else {
            return Ok(None);
        };
        let resume = {
            let view = self.lock();
            if view.upload != UploadState::Uploaded && !view.has_resume() {
                return Ok(None);
            }
            NewResume {
                user_id: session.user.id.clone(),
                resume_text: view.resume_text.clone(),
                skills: view.skills.clone(),
                job_title: view.job_title.clone(),
            }
        };

        match self.store.upsert(&session, &resume).await {
            Ok(record) => {
                debug!("Saved resume as record {}", record.id);
                self.update(|view| view.save_error = None);
                Ok(Some(record))
            }
            Err(e) => {
                let message = e.user_message(SAVE_FALLBACK_MESSAGE);
                warn!("Saving resume failed: {e}");
                self.update(|view| view.save_error = Some(message.clone()));
                Err(WorkflowError::Save(message))
            }
        }
    }

    /// The save that follows every successful upload and match. A failure never
    /// hides the result; it stays visible in `save_error`.
    async fn autosave(&self) {
        let _ = self.save().await;
    }
}
