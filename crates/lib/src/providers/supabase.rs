//! # Supabase Connection Settings
//!
//! Shared by the GoTrue identity provider and the PostgREST resume store.

use serde::Deserialize;

/// The project URL and anonymous key every Supabase request needs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: String,
}

impl SupabaseConfig {
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
        }
    }

    pub(crate) fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1{}", self.url, path)
    }

    pub(crate) fn rest_url(&self, path: &str) -> String {
        format!("{}/rest/v1{}", self.url, path)
    }
}

/// The error fields GoTrue and PostgREST use, in the order they are preferred.
#[derive(Deserialize, Debug, Default)]
struct ErrorBody {
    error_description: Option<String>,
    msg: Option<String>,
    message: Option<String>,
    error: Option<String>,
}

/// Extracts a human readable message from a Supabase error body, if it has one.
pub(crate) fn error_message(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    [parsed.error_description, parsed.msg, parsed.message, parsed.error]
        .into_iter()
        .flatten()
        .find(|m| !m.trim().is_empty())
}
