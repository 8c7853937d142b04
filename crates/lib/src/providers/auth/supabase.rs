use crate::{
    errors::AuthError,
    providers::auth::{IdentityProvider, OAuthRequest, SignUpOutcome},
    providers::supabase::{error_message, SupabaseConfig},
    types::{Session, SessionState},
};
use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::{distributions::Alphanumeric, Rng};
use reqwest::{Client as ReqwestClient, RequestBuilder, Response};
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fmt::Debug;
use std::sync::{Arc, RwLock};
use tracing::{info, warn};
use url::Url;

const CODE_VERIFIER_LEN: usize = 64;

// --- GoTrue request structures ---

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct PkceExchange<'a> {
    auth_code: &'a str,
    code_verifier: &'a str,
}

#[derive(Serialize)]
struct RefreshGrant<'a> {
    refresh_token: &'a str,
}

#[derive(Serialize)]
struct Recover<'a> {
    email: &'a str,
}

// --- Identity provider implementation ---

/// An identity provider backed by Supabase's GoTrue REST API.
#[derive(Clone)]
pub struct SupabaseAuth {
    client: ReqwestClient,
    config: SupabaseConfig,
    state: Arc<RwLock<SessionState>>,
}

impl Debug for SupabaseAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseAuth")
            .field("url", &self.config.url)
            .field("signed_in", &self.current_session().is_signed_in())
            .finish()
    }
}

impl SupabaseAuth {
    /// Creates a new, signed-out `SupabaseAuth`.
    pub fn new(config: SupabaseConfig) -> Result<Self, AuthError> {
        let client = ReqwestClient::builder()
            .build()
            .map_err(AuthError::ClientBuild)?;
        Ok(Self {
            client,
            config,
            state: Arc::new(RwLock::new(SessionState::SignedOut)),
        })
    }

    fn set_state(&self, next: SessionState) {
        match self.state.write() {
            Ok(mut guard) => *guard = next,
            Err(poisoned) => *poisoned.into_inner() = next,
        }
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.client
            .post(self.config.auth_url(path))
            .header("apikey", &self.config.anon_key)
    }

    async fn check_status(response: Response) -> Result<Response, AuthError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(AuthError::Server {
            status: status.as_u16(),
            message: error_message(&body),
        })
    }

    async fn request_session(&self, request: RequestBuilder) -> Result<Session, AuthError> {
        let response = request.send().await.map_err(AuthError::Request)?;
        let response = Self::check_status(response).await?;
        let session: Session = response.json().await.map_err(AuthError::Deserialization)?;
        self.set_state(SessionState::SignedIn(session.clone()));
        info!("Signed in as user {}", session.user.id);
        Ok(session)
    }
}

/// Derives the S256 PKCE challenge for a verifier.
fn code_challenge(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

fn new_code_verifier() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(CODE_VERIFIER_LEN)
        .map(char::from)
        .collect()
}

#[async_trait]
impl IdentityProvider for SupabaseAuth {
    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, AuthError> {
        info!("Signing up {}", email);
        let response = self
            .post("/signup")
            .json(&Credentials { email, password })
            .send()
            .await
            .map_err(AuthError::Request)?;
        let response = Self::check_status(response).await?;
        let body: Value = response.json().await.map_err(AuthError::Deserialization)?;

        // With email confirmation enabled GoTrue answers with the bare user object.
        if body.get("access_token").is_none() {
            return Ok(SignUpOutcome::ConfirmationRequired {
                email: email.to_string(),
            });
        }
        let session: Session = serde_json::from_value(body).map_err(|e| AuthError::Server {
            status: 200,
            message: Some(format!("Unexpected sign-up response: {e}")),
        })?;
        self.set_state(SessionState::SignedIn(session.clone()));
        Ok(SignUpOutcome::SignedIn(session))
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        info!("Signing in {} with password", email);
        let request = self
            .post("/token")
            .query(&[("grant_type", "password")])
            .json(&Credentials { email, password });
        self.request_session(request).await
    }

    fn sign_in_with_provider(
        &self,
        provider: &str,
        redirect_to: &str,
    ) -> Result<OAuthRequest, AuthError> {
        let code_verifier = new_code_verifier();
        let url = Url::parse_with_params(
            &self.config.auth_url("/authorize"),
            &[
                ("provider", provider),
                ("redirect_to", redirect_to),
                ("code_challenge", &code_challenge(&code_verifier)),
                ("code_challenge_method", "s256"),
            ],
        )?;
        Ok(OAuthRequest {
            url: url.to_string(),
            code_verifier,
        })
    }

    async fn exchange_code(&self, code: &str, code_verifier: &str) -> Result<Session, AuthError> {
        info!("Exchanging provider sign-in code for a session");
        let request = self
            .post("/token")
            .query(&[("grant_type", "pkce")])
            .json(&PkceExchange {
                auth_code: code,
                code_verifier,
            });
        self.request_session(request).await
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let previous = self.current_session();
        self.set_state(SessionState::SignedOut);

        let Some(session) = previous.session() else {
            return Ok(());
        };
        let result = self
            .post("/logout")
            .bearer_auth(&session.access_token)
            .send()
            .await
            .map_err(AuthError::Request);
        match result {
            Ok(response) => {
                Self::check_status(response).await?;
                info!("Signed out user {}", session.user.id);
                Ok(())
            }
            Err(e) => {
                warn!("Remote sign-out failed, local session cleared anyway: {e}");
                Err(e)
            }
        }
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), AuthError> {
        info!("Requesting password reset for {}", email);
        let response = self
            .post("/recover")
            .json(&Recover { email })
            .send()
            .await
            .map_err(AuthError::Request)?;
        Self::check_status(response).await?;
        Ok(())
    }

    async fn refresh_session(&self) -> Result<Session, AuthError> {
        let refresh_token = self
            .current_session()
            .session()
            .and_then(|session| session.refresh_token.clone());
        let Some(refresh_token) = refresh_token else {
            self.set_state(SessionState::SignedOut);
            return Err(AuthError::NotSignedIn);
        };

        info!("Refreshing the session");
        let request = self
            .post("/token")
            .query(&[("grant_type", "refresh_token")])
            .json(&RefreshGrant {
                refresh_token: &refresh_token,
            });
        match self.request_session(request).await {
            Ok(session) => Ok(session),
            Err(e) => {
                warn!("Session refresh failed, signing out: {e}");
                self.set_state(SessionState::SignedOut);
                Err(e)
            }
        }
    }

    fn current_session(&self) -> SessionState {
        match self.state.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn restore(&self, session: Session) {
        self.set_state(SessionState::SignedIn(session));
    }
}
