//! # Lumascan
//!
//! A client for a resume analysis service. It uploads PDF resumes for skill
//! extraction, matches them against job descriptions, and keeps signed-in users'
//! resumes in a hosted store.
//!
//! Extraction and scoring happen in the remote service, identity and persistence in
//! Supabase. This crate owns the orchestration between them: the
//! [`workflow::Workflow`] state machines, the [`dashboard::Dashboard`] of saved
//! resumes, and the provider traits those are built on.

pub mod constants;
pub mod dashboard;
pub mod dropzone;
pub mod errors;
pub mod providers;
pub mod types;
pub mod workflow;

pub use dashboard::{Dashboard, DashboardState};
pub use dropzone::{DragEvent, DropOutcome, DropZone};
pub use errors::{ApiError, AuthError, StoreError, WorkflowError};
pub use types::{
    MatchResult, NewResume, ResumeFile, ResumeRecord, ScoreBucket, Session, SessionState,
    SessionUser, UploadResponse,
};
pub use workflow::{MatchState, UploadState, ViewState, Workflow};
