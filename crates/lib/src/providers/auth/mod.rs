pub mod supabase;

use crate::errors::AuthError;
use crate::types::{Session, SessionState};
use async_trait::async_trait;
use dyn_clone::DynClone;
use std::fmt::Debug;

pub use supabase::SupabaseAuth;

/// What a sign-up produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SignUpOutcome {
    /// The account is active and a session was issued.
    SignedIn(Session),
    /// The account exists but must be confirmed by email before signing in.
    ConfirmationRequired { email: String },
}

/// A browser sign-in with a third-party provider, waiting for its callback.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OAuthRequest {
    /// The URL to open in the user's browser.
    pub url: String,
    /// The PKCE secret needed to exchange the code the callback receives.
    pub code_verifier: String,
}

/// A trait for the delegated identity capability.
///
/// Implementations own the session lifecycle. Clones share the same session, so a
/// sign-in through one handle is visible through every other.
#[async_trait]
pub trait IdentityProvider: Send + Sync + Debug + DynClone {
    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, AuthError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    /// Prepares a provider sign-in (e.g. `github`) that redirects back to `redirect_to`.
    fn sign_in_with_provider(
        &self,
        provider: &str,
        redirect_to: &str,
    ) -> Result<OAuthRequest, AuthError>;

    /// Completes a provider sign-in with the code delivered to the redirect target.
    async fn exchange_code(&self, code: &str, code_verifier: &str) -> Result<Session, AuthError>;

    /// Ends the session. The local session is cleared even if the remote call fails.
    async fn sign_out(&self) -> Result<(), AuthError>;

    async fn send_password_reset(&self, email: &str) -> Result<(), AuthError>;

    /// Trades the current session's refresh token for a new session. If that fails
    /// the provider ends up signed out.
    async fn refresh_session(&self) -> Result<Session, AuthError>;

    fn current_session(&self) -> SessionState;

    /// Seeds a session persisted by an earlier run.
    fn restore(&self, session: Session);
}

dyn_clone::clone_trait_object!(IdentityProvider);

/// The identity capability used when no identity provider is configured.
///
/// It is permanently signed out, so nothing is ever persisted.
#[derive(Clone, Debug, Default)]
pub struct SignedOutProvider;

#[async_trait]
impl IdentityProvider for SignedOutProvider {
    async fn sign_up(&self, _email: &str, _password: &str) -> Result<SignUpOutcome, AuthError> {
        Err(AuthError::NotConfigured)
    }

    async fn sign_in(&self, _email: &str, _password: &str) -> Result<Session, AuthError> {
        Err(AuthError::NotConfigured)
    }

    fn sign_in_with_provider(
        &self,
        _provider: &str,
        _redirect_to: &str,
    ) -> Result<OAuthRequest, AuthError> {
        Err(AuthError::NotConfigured)
    }

    async fn exchange_code(&self, _code: &str, _code_verifier: &str) -> Result<Session, AuthError> {
        Err(AuthError::NotConfigured)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        Ok(())
    }

    async fn send_password_reset(&self, _email: &str) -> Result<(), AuthError> {
        Err(AuthError::NotConfigured)
    }

    async fn refresh_session(&self) -> Result<Session, AuthError> {
        Err(AuthError::NotConfigured)
    }

    fn current_session(&self) -> SessionState {
        SessionState::SignedOut
    }

    fn restore(&self, _session: Session) {}
}
