//! # Data Model
//!
//! The records exchanged with the analysis API, the identity provider and the
//! resume store, plus the small value types the workflow is built from.

use crate::constants::{SESSION_EXPIRY_LEEWAY_SECS, UNTITLED_RESUME_LABEL};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// The only MIME type the workflow accepts for upload.
pub const PDF_MIME_TYPE: &str = "application/pdf";

/// A file handed to the workflow, either dropped or picked.
#[derive(Clone, PartialEq, Eq)]
pub struct ResumeFile {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl ResumeFile {
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub fn is_pdf(&self) -> bool {
        self.mime_type == PDF_MIME_TYPE
    }

    /// The label a saved record gets when it is created from this file: the file
    /// name without its extension.
    pub fn derived_title(&self) -> String {
        Path::new(&self.file_name)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .filter(|stem| !stem.is_empty())
            .unwrap_or(&self.file_name)
            .to_string()
    }
}

impl fmt::Debug for ResumeFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResumeFile")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// The body of a successful `POST /upload`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub resume_text: String,
    #[serde(default)]
    pub skills: Vec<String>,
}

/// The body of `POST /match`. `industry` is always sent, as `null` when absent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MatchRequest<'a> {
    pub resume_text: &'a str,
    pub job_desc: &'a str,
    pub industry: Option<&'a str>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CosineSimilarity {
    #[serde(default)]
    pub overall: f64,
    #[serde(default)]
    pub skills: f64,
    #[serde(default)]
    pub contribution: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    #[serde(default)]
    pub exact_matches: u32,
    #[serde(default)]
    pub cosine_similarity: CosineSimilarity,
}

/// The outcome of a resume-to-job-description analysis, exactly as the API reports it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub match_score: f64,
    #[serde(default)]
    pub matched_skills: Vec<String>,
    #[serde(default)]
    pub missing_core_skills: Vec<String>,
    #[serde(default)]
    pub missing_secondary_skills: Vec<String>,
    #[serde(default)]
    pub industry_analysis: String,
    #[serde(default)]
    pub experience_level: String,
    #[serde(default)]
    pub score_breakdown: ScoreBreakdown,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub analysis_method: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

impl MatchResult {
    pub fn bucket(&self) -> ScoreBucket {
        ScoreBucket::from_score(self.match_score)
    }
}

/// The colour band a match score falls in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScoreBucket {
    High,
    Medium,
    Low,
}

impl ScoreBucket {
    /// `> 75` is high, `> 50` is medium, everything else is low.
    pub fn from_score(score: f64) -> Self {
        if score > 75.0 {
            ScoreBucket::High
        } else if score > 50.0 {
            ScoreBucket::Medium
        } else {
            ScoreBucket::Low
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ScoreBucket::High => "high",
            ScoreBucket::Medium => "medium",
            ScoreBucket::Low => "low",
        }
    }
}

/// A resume saved in the store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeRecord {
    pub id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub resume_text: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub job_title: Option<String>,
}

impl ResumeRecord {
    pub fn display_title(&self) -> &str {
        self.job_title
            .as_deref()
            .filter(|title| !title.is_empty())
            .unwrap_or(UNTITLED_RESUME_LABEL)
    }

    /// The first `limit` skills and how many were left out.
    pub fn skill_preview(&self, limit: usize) -> (&[String], usize) {
        let shown = self.skills.len().min(limit);
        (&self.skills[..shown], self.skills.len() - shown)
    }
}

/// The write shape of a [`ResumeRecord`]; the store assigns `id` and `created_at`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewResume {
    pub user_id: String,
    pub resume_text: String,
    pub skills: Vec<String>,
    pub job_title: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// An authenticated session issued by the identity provider.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: SessionUser,
}

impl Session {
    /// Whether the access token expires within `leeway_secs` of `now` (Unix seconds).
    /// A session without an expiry never expires.
    pub fn expires_within(&self, now: i64, leeway_secs: i64) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now + leeway_secs)
    }

    pub fn is_expired(&self) -> bool {
        self.expires_within(Utc::now().timestamp(), SESSION_EXPIRY_LEEWAY_SECS)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user", &self.user)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

/// Whether a session is present. Consumers branch on this and nothing else.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    SignedOut,
    SignedIn(Session),
}

impl SessionState {
    pub fn session(&self) -> Option<&Session> {
        match self {
            SessionState::SignedIn(session) => Some(session),
            SessionState::SignedOut => None,
        }
    }

    pub fn is_signed_in(&self) -> bool {
        matches!(self, SessionState::SignedIn(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_score_buckets() {
        assert_eq!(ScoreBucket::from_score(82.0), ScoreBucket::High);
        assert_eq!(ScoreBucket::from_score(75.5), ScoreBucket::High);
        assert_eq!(ScoreBucket::from_score(75.0), ScoreBucket::Medium);
        assert_eq!(ScoreBucket::from_score(60.0), ScoreBucket::Medium);
        assert_eq!(ScoreBucket::from_score(51.0), ScoreBucket::Medium);
        assert_eq!(ScoreBucket::from_score(50.0), ScoreBucket::Low);
        assert_eq!(ScoreBucket::from_score(40.0), ScoreBucket::Low);
        assert_eq!(ScoreBucket::from_score(0.0), ScoreBucket::Low);
    }

    #[test]
    fn test_match_request_sends_null_industry() {
        let request = MatchRequest {
            resume_text: "T",
            job_desc: "J",
            industry: None,
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"resume_text": "T", "job_desc": "J", "industry": null})
        );
    }

    #[test]
    fn test_match_result_parses_full_payload() {
        let payload = json!({
            "analysis_method": "hybrid",
            "match_score": 82,
            "matched_skills": ["python → python"],
            "missing_core_skills": ["kubernetes"],
            "industry_analysis": "Strong tech background",
            "experience_level": "senior",
            "score_breakdown": {
                "exact_matches": 4,
                "cosine_similarity": {"overall": 0.71, "skills": 0.8, "contribution": 30.5}
            },
            "version": "2.1"
        });
        let result: MatchResult = serde_json::from_value(payload).unwrap();
        assert_eq!(result.match_score, 82.0);
        assert_eq!(result.bucket(), ScoreBucket::High);
        assert_eq!(result.score_breakdown.exact_matches, 4);
        assert_eq!(result.score_breakdown.cosine_similarity.skills, 0.8);
        assert_eq!(result.version.as_deref(), Some("2.1"));
        assert!(result.missing_secondary_skills.is_empty());
    }

    #[test]
    fn test_upload_response_defaults_missing_fields() {
        let upload: UploadResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(upload, UploadResponse::default());
    }

    #[test]
    fn test_derived_title_strips_extension() {
        let file = ResumeFile::new("jane_doe_cv.pdf", PDF_MIME_TYPE, vec![]);
        assert_eq!(file.derived_title(), "jane_doe_cv");
        let file = ResumeFile::new("resume", PDF_MIME_TYPE, vec![]);
        assert_eq!(file.derived_title(), "resume");
    }

    #[test]
    fn test_session_expiry_uses_leeway() {
        let mut session = Session {
            access_token: "a".into(),
            refresh_token: Some("r".into()),
            expires_at: Some(1_000),
            user: SessionUser {
                id: "u1".into(),
                email: None,
            },
        };
        assert!(!session.expires_within(900, 60));
        assert!(session.expires_within(940, 60));
        assert!(session.expires_within(2_000, 0));

        session.expires_at = None;
        assert!(!session.expires_within(i64::MAX - 60, 60));
        assert!(!session.is_expired());
    }

    #[test]
    fn test_record_presentation_helpers() {
        let record = ResumeRecord {
            id: "r1".into(),
            user_id: "u1".into(),
            created_at: Utc::now(),
            resume_text: String::new(),
            skills: (0..12).map(|i| format!("skill{i}")).collect(),
            job_title: None,
        };
        assert_eq!(record.display_title(), "Untitled Resume");
        let (shown, hidden) = record.skill_preview(10);
        assert_eq!(shown.len(), 10);
        assert_eq!(hidden, 2);
    }
}
