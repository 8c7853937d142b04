pub mod http;

use crate::errors::ApiError;
use crate::types::{MatchResult, ResumeFile, UploadResponse};
use async_trait::async_trait;
use dyn_clone::DynClone;
use std::fmt::Debug;

pub use http::{ApiPrefix, HttpAnalysisClient};

/// A trait for talking to the resume analysis service.
///
/// The service owns text extraction, skill tagging and scoring; implementations only
/// move requests and responses across the wire.
#[async_trait]
pub trait AnalysisProvider: Send + Sync + Debug + DynClone {
    /// Sends a PDF for text and skill extraction.
    async fn upload_resume(&self, file: &ResumeFile) -> Result<UploadResponse, ApiError>;

    /// Scores resume text against a job description.
    async fn analyze_match(
        &self,
        resume_text: &str,
        job_desc: &str,
        industry: Option<&str>,
    ) -> Result<MatchResult, ApiError>;

    /// Asks the service to rewrite a resume for a job description. Returns PDF bytes.
    async fn rewrite_resume(
        &self,
        file: &ResumeFile,
        job_description: &str,
    ) -> Result<Vec<u8>, ApiError>;

    /// Returns the service's self-reported status line.
    async fn health(&self) -> Result<String, ApiError>;
}

dyn_clone::clone_trait_object!(AnalysisProvider);
