//! # Shared Constants
//!
//! User-visible messages and defaults shared by the library and the CLI.

/// The analysis service address used when none is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:5000";

pub const NOT_PDF_MESSAGE: &str = "Please upload a PDF file.";
pub const NO_RESUME_MESSAGE: &str = "Please upload a resume first.";
pub const EMPTY_JOB_DESC_MESSAGE: &str = "Please enter a job description.";

pub const UPLOAD_FALLBACK_MESSAGE: &str = "Failed to upload resume";
pub const MATCH_FALLBACK_MESSAGE: &str = "Failed to analyze resume";
pub const SAVE_FALLBACK_MESSAGE: &str = "Failed to save resume";
pub const FETCH_FALLBACK_MESSAGE: &str = "Failed to fetch saved resumes";
pub const DELETE_FALLBACK_MESSAGE: &str = "Failed to delete resume";

/// How many skills a saved-resume card shows before collapsing the rest.
pub const SKILL_PREVIEW_LIMIT: usize = 10;

/// The title shown for a saved resume without one.
pub const UNTITLED_RESUME_LABEL: &str = "Untitled Resume";

pub const DROP_LABEL_IDLE: &str = "Drag & drop your resume here, or click to browse";
pub const DROP_LABEL_ACTIVE: &str = "Drop your PDF here";
pub const DROP_LABEL_UPLOADING: &str = "Uploading...";

/// A session this close to expiry is refreshed before use.
pub const SESSION_EXPIRY_LEEWAY_SECS: i64 = 60;
