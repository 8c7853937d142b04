//! # Application State
//!
//! Wires the configured providers into a [`Workflow`] and a [`Dashboard`] that
//! share one identity, and keeps the local state files in step with them.

use crate::auth;
use crate::config::AppConfig;
use crate::files;
use crate::state_manager::{LastResume, StateManager};
use anyhow::{anyhow, Result};
use lumascan::providers::analysis::{AnalysisProvider, ApiPrefix, HttpAnalysisClient};
use lumascan::providers::auth::{IdentityProvider, SignUpOutcome, SignedOutProvider, SupabaseAuth};
use lumascan::providers::store::{ResumeStore, SupabaseStore, UnavailableStore};
use lumascan::providers::supabase::SupabaseConfig;
use lumascan::types::{MatchResult, ResumeFile, ResumeRecord, Session, SessionState};
use lumascan::workflow::ViewState;
use lumascan::{Dashboard, Workflow};
use std::path::Path;
use tracing::{info, warn};

/// Represents the authentication state of the application.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthState {
    /// Results are shown but never saved.
    Guest,
    Authenticated { email: Option<String> },
}

pub struct App {
    pub config: AppConfig,
    state: StateManager,
    identity: Box<dyn IdentityProvider>,
    analysis: HttpAnalysisClient,
    pub workflow: Workflow,
    pub dashboard: Dashboard,
}

/// Refreshes an expired session and persists the result. When the refresh fails the
/// saved session is dropped and the app continues signed out.
async fn restore_expired_session(
    identity: &dyn IdentityProvider,
    state: &StateManager,
) -> Result<()> {
    match identity.refresh_session().await {
        Ok(session) => state.write_session(&session),
        Err(e) => {
            warn!("Saved session expired and could not be refreshed: {e}");
            state.clear_session()
        }
    }
}

impl App {
    /// Builds the providers from `config` and restores a persisted session, refreshing
    /// it first if it has expired.
    ///
    /// Without Supabase settings the app runs permanently signed out.
    pub async fn new(config: AppConfig, state: StateManager) -> Result<Self> {
        let prefix: ApiPrefix = config.api_prefix.parse().map_err(|e: String| anyhow!(e))?;
        let analysis = HttpAnalysisClient::new(config.api_url.clone(), prefix)?;

        let (identity, store): (Box<dyn IdentityProvider>, Box<dyn ResumeStore>) =
            match config.supabase() {
                Some((url, anon_key)) => {
                    let supabase = SupabaseConfig::new(url, anon_key);
                    (
                        Box::new(SupabaseAuth::new(supabase.clone())?),
                        Box::new(SupabaseStore::new(supabase)?),
                    )
                }
                None => {
                    info!("Supabase is not configured; running signed out.");
                    (Box::new(SignedOutProvider), Box::new(UnavailableStore))
                }
            };

        if config.supabase().is_some() {
            if let Some(session) = state.read_session()? {
                info!("Restored session for user {}", session.user.id);
                let expired = session.is_expired();
                identity.restore(session);
                if expired {
                    restore_expired_session(identity.as_ref(), &state).await?;
                }
            }
        }

        let workflow = Workflow::new(
            Box::new(analysis.clone()),
            identity.clone(),
            store.clone(),
        );
        let dashboard = Dashboard::new(identity.clone(), store);

        Ok(Self {
            config,
            state,
            identity,
            analysis,
            workflow,
            dashboard,
        })
    }

    pub fn auth_state(&self) -> AuthState {
        match self.identity.current_session() {
            SessionState::SignedIn(session) => AuthState::Authenticated {
                email: session.user.email,
            },
            SessionState::SignedOut => AuthState::Guest,
        }
    }

    pub fn analysis(&self) -> &dyn AnalysisProvider {
        &self.analysis
    }

    // --- Workflow ---

    /// Uploads a file from disk and remembers the extracted resume.
    pub async fn upload(&self, path: &Path) -> Result<ViewState> {
        let file = files::read_resume_file(path)?;
        self.submit(&file).await
    }

    pub async fn submit(&self, file: &ResumeFile) -> Result<ViewState> {
        self.workflow.submit_file(file).await?;
        self.remember_resume()?;
        Ok(self.workflow.view())
    }

    /// Loads the resume remembered from an earlier run. Returns whether there was one.
    pub fn restore_last_resume(&self) -> Result<bool> {
        let Some(last) = self.state.read_last_resume()? else {
            return Ok(false);
        };
        self.workflow
            .load_resume(last.resume_text, last.skills, last.job_title);
        Ok(true)
    }

    fn remember_resume(&self) -> Result<()> {
        let view = self.workflow.view();
        if !view.has_resume() {
            return Ok(());
        }
        self.state.write_last_resume(&LastResume {
            resume_text: view.resume_text,
            skills: view.skills,
            job_title: view.job_title,
        })
    }

    pub async fn analyze(&self, job_desc: &str, industry: Option<&str>) -> Result<MatchResult> {
        Ok(self.workflow.analyze_match(job_desc, industry).await?)
    }

    /// Selects a record from the loaded dashboard list into the workflow.
    pub fn open_record(&self, id: &str) -> Result<ResumeRecord> {
        let record = self
            .dashboard
            .select(id)
            .ok_or_else(|| anyhow!("No saved resume with id '{id}'."))?;
        self.workflow.load_record(&record);
        self.remember_resume()?;
        Ok(record)
    }

    // --- Identity ---

    fn persist(&self, session: &Session) -> Result<()> {
        self.state.write_session(session)
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome> {
        let outcome = self.identity.sign_up(email, password).await?;
        if let SignUpOutcome::SignedIn(session) = &outcome {
            self.persist(session)?;
        }
        Ok(outcome)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let session = self.identity.sign_in(email, password).await?;
        self.persist(&session)?;
        Ok(session)
    }

    pub async fn sign_in_with_provider(&self, provider: &str) -> Result<Session> {
        let session = auth::login_with_provider(
            self.identity.clone(),
            provider,
            self.config.callback_port,
            &self.config.callback_url(),
        )
        .await?;
        self.persist(&session)?;
        Ok(session)
    }

    pub async fn send_password_reset(&self, email: &str) -> Result<()> {
        Ok(self.identity.send_password_reset(email).await?)
    }

    /// Ends the session and forgets everything tied to it. A failed remote sign-out is
    /// logged; the local session is gone either way.
    pub async fn sign_out(&self) -> Result<()> {
        if let Err(e) = self.identity.sign_out().await {
            warn!("Remote sign-out failed: {e}");
        }
        self.state.clear_session()?;
        self.state.clear_last_resume()?;
        self.workflow.reset();
        self.dashboard.fetch().await?;
        Ok(())
    }
}
