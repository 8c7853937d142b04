use thiserror::Error;

/// Errors raised by the resume analysis API client.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Failed to build Reqwest client: {0}")]
    ClientBuild(reqwest::Error),
    #[error("Failed to send request to the analysis API: {0}")]
    Request(reqwest::Error),
    #[error("Failed to deserialize analysis API response: {0}")]
    Deserialization(reqwest::Error),
    #[error("Analysis API responded with {status}: {}", .message.as_deref().unwrap_or("no error message"))]
    Server {
        status: u16,
        message: Option<String>,
    },
    #[error("Analysis failed: {0}")]
    Analysis(String),
}

impl ApiError {
    /// The message a user should see: whatever the server reported, otherwise `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Server {
                message: Some(message),
                ..
            } => message.clone(),
            ApiError::Analysis(message) => message.clone(),
            _ => fallback.to_string(),
        }
    }
}

/// Errors raised by the identity provider.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Failed to build Reqwest client: {0}")]
    ClientBuild(reqwest::Error),
    #[error("Failed to send request to the identity provider: {0}")]
    Request(reqwest::Error),
    #[error("Failed to deserialize identity provider response: {0}")]
    Deserialization(reqwest::Error),
    #[error("{}", .message.as_deref().unwrap_or("Authentication failed"))]
    Server {
        status: u16,
        message: Option<String>,
    },
    #[error("Invalid identity provider URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("You are not signed in.")]
    NotSignedIn,
    #[error("No identity provider is configured. Set SUPABASE_URL and SUPABASE_ANON_KEY.")]
    NotConfigured,
}

/// Errors raised by the persisted-resume store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to build Reqwest client: {0}")]
    ClientBuild(reqwest::Error),
    #[error("Failed to send request to the resume store: {0}")]
    Request(reqwest::Error),
    #[error("Failed to deserialize resume store response: {0}")]
    Deserialization(reqwest::Error),
    #[error("{}", .message.as_deref().unwrap_or("Resume store request failed"))]
    Server {
        status: u16,
        message: Option<String>,
    },
    #[error("The resume store returned no record")]
    EmptyResponse,
    #[error("A signed-in session is required to access saved resumes")]
    NotSignedIn,
    #[error("No resume store is configured. Set SUPABASE_URL and SUPABASE_ANON_KEY.")]
    NotConfigured,
}

impl StoreError {
    /// The message a user should see: whatever the store reported, otherwise `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            StoreError::Server {
                message: Some(message),
                ..
            } => message.clone(),
            StoreError::NotSignedIn | StoreError::NotConfigured => self.to_string(),
            _ => fallback.to_string(),
        }
    }
}

/// User-facing errors produced at the workflow and dashboard operation boundaries.
///
/// Each variant carries the message to show; server-provided text wins over the
/// generic fallback.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Upload(String),
    #[error("{0}")]
    Match(String),
    #[error("{0}")]
    Fetch(String),
    #[error("{0}")]
    Delete(String),
    #[error("{0}")]
    Save(String),
    /// A newer call of the same kind was started before this one completed.
    #[error("Result discarded: a newer request was started")]
    Superseded,
}
