use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use lumascan::errors::{ApiError, AuthError, StoreError};
use lumascan::providers::analysis::AnalysisProvider;
use lumascan::providers::auth::{IdentityProvider, OAuthRequest, SignUpOutcome};
use lumascan::providers::store::ResumeStore;
use lumascan::types::{
    MatchResult, NewResume, ResumeFile, ResumeRecord, Session, SessionState, SessionUser,
    UploadResponse, PDF_MIME_TYPE,
};
use std::collections::VecDeque;
use std::fmt::Debug;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

// --- Fixtures ---

/// A small file that passes as a PDF upload.
pub fn sample_pdf(file_name: &str) -> ResumeFile {
    ResumeFile::new(file_name, PDF_MIME_TYPE, b"%PDF-1.4\n%test\n".to_vec())
}

pub fn session_for(user_id: &str) -> Session {
    Session {
        access_token: format!("token-{user_id}"),
        refresh_token: None,
        expires_at: None,
        user: SessionUser {
            id: user_id.to_string(),
            email: Some(format!("{user_id}@test.com")),
        },
    }
}

pub fn match_result(score: f64) -> MatchResult {
    MatchResult {
        match_score: score,
        matched_skills: vec!["python → python".to_string()],
        missing_core_skills: vec!["kubernetes".to_string()],
        experience_level: "mid".to_string(),
        ..Default::default()
    }
}

// --- Mock Analysis Provider ---

/// A recorded call to [`MockAnalysisProvider`].
#[derive(Clone, Debug, PartialEq)]
pub enum AnalysisCall {
    Upload {
        file_name: String,
    },
    Match {
        resume_text: String,
        job_desc: String,
        industry: Option<String>,
    },
    Rewrite {
        file_name: String,
        job_description: String,
    },
    Health,
}

/// A programmed reply, optionally delayed so tests can overlap calls.
struct Scripted<T> {
    delay: Option<Duration>,
    reply: Result<T, ApiError>,
}

#[derive(Clone, Default)]
pub struct MockAnalysisProvider {
    uploads: Arc<Mutex<VecDeque<Scripted<UploadResponse>>>>,
    matches: Arc<Mutex<VecDeque<Scripted<MatchResult>>>>,
    calls: Arc<Mutex<Vec<AnalysisCall>>>,
}

impl Debug for MockAnalysisProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockAnalysisProvider").finish_non_exhaustive()
    }
}

impl MockAnalysisProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues the reply for the next upload.
    pub fn push_upload(&self, reply: Result<UploadResponse, ApiError>) {
        self.push_upload_delayed(reply, None);
    }

    pub fn push_upload_delayed(
        &self,
        reply: Result<UploadResponse, ApiError>,
        delay: Option<Duration>,
    ) {
        self.uploads
            .lock()
            .unwrap()
            .push_back(Scripted { delay, reply });
    }

    /// Queues the reply for the next match.
    pub fn push_match(&self, reply: Result<MatchResult, ApiError>) {
        self.push_match_delayed(reply, None);
    }

    pub fn push_match_delayed(
        &self,
        reply: Result<MatchResult, ApiError>,
        delay: Option<Duration>,
    ) {
        self.matches
            .lock()
            .unwrap()
            .push_back(Scripted { delay, reply });
    }

    /// Retrieves the recorded calls for assertion.
    pub fn get_calls(&self) -> Vec<AnalysisCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: AnalysisCall) {
        self.calls.lock().unwrap().push(call);
    }

    async fn play<T>(queue: &Mutex<VecDeque<Scripted<T>>>, what: &str) -> Result<T, ApiError> {
        let scripted = queue.lock().unwrap().pop_front();
        let Some(scripted) = scripted else {
            return Err(ApiError::Analysis(format!(
                "MockAnalysisProvider: no {what} reply programmed"
            )));
        };
        if let Some(delay) = scripted.delay {
            tokio::time::sleep(delay).await;
        }
        scripted.reply
    }
}

#[async_trait]
impl AnalysisProvider for MockAnalysisProvider {
    async fn upload_resume(&self, file: &ResumeFile) -> Result<UploadResponse, ApiError> {
        self.record(AnalysisCall::Upload {
            file_name: file.file_name.clone(),
        });
        Self::play(&self.uploads, "upload").await
    }

    async fn analyze_match(
        &self,
        resume_text: &str,
        job_desc: &str,
        industry: Option<&str>,
    ) -> Result<MatchResult, ApiError> {
        self.record(AnalysisCall::Match {
            resume_text: resume_text.to_string(),
            job_desc: job_desc.to_string(),
            industry: industry.map(String::from),
        });
        Self::play(&self.matches, "match").await
    }

    async fn rewrite_resume(
        &self,
        file: &ResumeFile,
        job_description: &str,
    ) -> Result<Vec<u8>, ApiError> {
        self.record(AnalysisCall::Rewrite {
            file_name: file.file_name.clone(),
            job_description: job_description.to_string(),
        });
        Ok(b"%PDF-1.4\n%rewritten\n".to_vec())
    }

    async fn health(&self) -> Result<String, ApiError> {
        self.record(AnalysisCall::Health);
        Ok("ok".to_string())
    }
}

// --- Mock Identity Provider ---

/// An identity provider whose session is set directly by the test.
#[derive(Clone, Debug, Default)]
pub struct MockIdentity {
    state: Arc<RwLock<SessionState>>,
}

impl MockIdentity {
    pub fn signed_out() -> Self {
        Self::default()
    }

    pub fn signed_in(user_id: &str) -> Self {
        let identity = Self::default();
        identity.restore(session_for(user_id));
        identity
    }
}

#[async_trait]
impl IdentityProvider for MockIdentity {
    async fn sign_up(&self, email: &str, _password: &str) -> Result<SignUpOutcome, AuthError> {
        Ok(SignUpOutcome::ConfirmationRequired {
            email: email.to_string(),
        })
    }

    async fn sign_in(&self, email: &str, _password: &str) -> Result<Session, AuthError> {
        let session = session_for(email);
        self.restore(session.clone());
        Ok(session)
    }

    fn sign_in_with_provider(
        &self,
        provider: &str,
        redirect_to: &str,
    ) -> Result<OAuthRequest, AuthError> {
        Ok(OAuthRequest {
            url: format!(
                "http://identity.test/authorize?provider={provider}&redirect_to={redirect_to}"
            ),
            code_verifier: "verifier".to_string(),
        })
    }

    async fn exchange_code(&self, code: &str, _code_verifier: &str) -> Result<Session, AuthError> {
        let session = session_for(code);
        self.restore(session.clone());
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        *self.state.write().unwrap() = SessionState::SignedOut;
        Ok(())
    }

    async fn send_password_reset(&self, _email: &str) -> Result<(), AuthError> {
        Ok(())
    }

    async fn refresh_session(&self) -> Result<Session, AuthError> {
        let current = self.current_session();
        let Some(previous) = current.session() else {
            return Err(AuthError::NotSignedIn);
        };
        let session = Session {
            access_token: format!("refreshed-{}", previous.user.id),
            ..previous.clone()
        };
        self.restore(session.clone());
        Ok(session)
    }

    fn current_session(&self) -> SessionState {
        self.state.read().unwrap().clone()
    }

    fn restore(&self, session: Session) {
        *self.state.write().unwrap() = SessionState::SignedIn(session);
    }
}

// --- In-Memory Resume Store ---

#[derive(Clone, Debug, PartialEq)]
pub enum StoreCall {
    List { user_id: String },
    Upsert(NewResume),
    Delete { id: String },
}

/// A resume store kept in memory, with switchable failures.
#[derive(Clone, Debug, Default)]
pub struct MemoryResumeStore {
    records: Arc<Mutex<Vec<ResumeRecord>>>,
    calls: Arc<Mutex<Vec<StoreCall>>>,
    fail_writes: Arc<Mutex<bool>>,
    fail_reads: Arc<Mutex<bool>>,
    latency: Arc<Mutex<Option<Duration>>>,
    next_id: Arc<Mutex<u64>>,
}

impl MemoryResumeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a record created `age_minutes` ago.
    pub fn seed(
        &self,
        id: &str,
        user_id: &str,
        job_title: Option<&str>,
        skills: &[&str],
        age_minutes: i64,
    ) -> ResumeRecord {
        let record = ResumeRecord {
            id: id.to_string(),
            user_id: user_id.to_string(),
            created_at: Utc::now() - ChronoDuration::minutes(age_minutes),
            resume_text: format!("resume text of {id}"),
            skills: skills.iter().map(|s| s.to_string()).collect(),
            job_title: job_title.map(String::from),
        };
        self.records.lock().unwrap().push(record.clone());
        record
    }

    pub fn set_fail_writes(&self, fail: bool) {
        *self.fail_writes.lock().unwrap() = fail;
    }

    pub fn set_fail_reads(&self, fail: bool) {
        *self.fail_reads.lock().unwrap() = fail;
    }

    /// Delays every `list` and `delete` so tests can observe them in flight.
    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.lock().unwrap() = latency;
    }

    async fn wait(&self) {
        let latency = *self.latency.lock().unwrap();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }

    pub fn get_calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn upserts(&self) -> Vec<NewResume> {
        self.get_calls()
            .into_iter()
            .filter_map(|call| match call {
                StoreCall::Upsert(resume) => Some(resume),
                _ => None,
            })
            .collect()
    }

    pub fn all_records(&self) -> Vec<ResumeRecord> {
        self.records.lock().unwrap().clone()
    }

    fn failure() -> StoreError {
        StoreError::Server {
            status: 500,
            message: Some("store unavailable".to_string()),
        }
    }
}

#[async_trait]
impl ResumeStore for MemoryResumeStore {
    async fn list(&self, session: &Session) -> Result<Vec<ResumeRecord>, StoreError> {
        self.calls.lock().unwrap().push(StoreCall::List {
            user_id: session.user.id.clone(),
        });
        self.wait().await;
        if *self.fail_reads.lock().unwrap() {
            return Err(Self::failure());
        }
        let mut records: Vec<ResumeRecord> = self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.user_id == session.user.id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    async fn upsert(
        &self,
        _session: &Session,
        resume: &NewResume,
    ) -> Result<ResumeRecord, StoreError> {
        self.calls
            .lock()
            .unwrap()
            .push(StoreCall::Upsert(resume.clone()));
        if *self.fail_writes.lock().unwrap() {
            return Err(Self::failure());
        }

        let mut records = self.records.lock().unwrap();
        records.retain(|r| !(r.user_id == resume.user_id && r.job_title == resume.job_title));
        let mut next_id = self.next_id.lock().unwrap();
        *next_id += 1;
        let record = ResumeRecord {
            id: format!("mem-{}", *next_id),
            user_id: resume.user_id.clone(),
            created_at: Utc::now(),
            resume_text: resume.resume_text.clone(),
            skills: resume.skills.clone(),
            job_title: resume.job_title.clone(),
        };
        records.push(record.clone());
        Ok(record)
    }

    async fn delete(&self, _session: &Session, id: &str) -> Result<(), StoreError> {
        self.calls
            .lock()
            .unwrap()
            .push(StoreCall::Delete { id: id.to_string() });
        self.wait().await;
        if *self.fail_writes.lock().unwrap() {
            return Err(Self::failure());
        }
        self.records.lock().unwrap().retain(|r| r.id != id);
        Ok(())
    }
}
