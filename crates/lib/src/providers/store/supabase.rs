use crate::{
    errors::StoreError,
    providers::store::ResumeStore,
    providers::supabase::{error_message, SupabaseConfig},
    types::{NewResume, ResumeRecord, Session},
};
use async_trait::async_trait;
use reqwest::{Client as ReqwestClient, RequestBuilder, Response};
use std::fmt::Debug;
use tracing::info;

const RESUMES_TABLE: &str = "/resumes";

/// A resume store backed by Supabase's PostgREST API and the `resumes` table.
#[derive(Clone, Debug)]
pub struct SupabaseStore {
    client: ReqwestClient,
    config: SupabaseConfig,
}

impl SupabaseStore {
    pub fn new(config: SupabaseConfig) -> Result<Self, StoreError> {
        let client = ReqwestClient::builder()
            .build()
            .map_err(StoreError::ClientBuild)?;
        Ok(Self { client, config })
    }

    /// Adds the project key and the user's token so row-level security applies.
    fn authorize(&self, request: RequestBuilder, session: &Session) -> RequestBuilder {
        request
            .header("apikey", &self.config.anon_key)
            .bearer_auth(&session.access_token)
    }

    async fn check_status(response: Response) -> Result<Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(StoreError::Server {
            status: status.as_u16(),
            message: error_message(&body),
        })
    }
}

#[async_trait]
impl ResumeStore for SupabaseStore {
    async fn list(&self, session: &Session) -> Result<Vec<ResumeRecord>, StoreError> {
        let url = self.config.rest_url(RESUMES_TABLE);
        let owner_filter = format!("eq.{}", session.user.id);
        info!("Fetching saved resumes for user {}", session.user.id);

        let request = self.client.get(&url).query(&[
            ("select", "*"),
            ("user_id", owner_filter.as_str()),
            ("order", "created_at.desc"),
        ]);
        let response = self
            .authorize(request, session)
            .send()
            .await
            .map_err(StoreError::Request)?;
        let response = Self::check_status(response).await?;

        response.json().await.map_err(StoreError::Deserialization)
    }

    async fn upsert(
        &self,
        session: &Session,
        resume: &NewResume,
    ) -> Result<ResumeRecord, StoreError> {
        let url = self.config.rest_url(RESUMES_TABLE);
        info!(
            "Saving resume {:?} for user {}",
            resume.job_title, resume.user_id
        );

        let request = self
            .client
            .post(&url)
            .query(&[("on_conflict", "user_id,job_title")])
            .header("Prefer", "resolution=merge-duplicates,return=representation")
            .json(resume);
        let response = self
            .authorize(request, session)
            .send()
            .await
            .map_err(StoreError::Request)?;
        let response = Self::check_status(response).await?;

        // PostgREST returns the affected rows as an array.
        let mut rows: Vec<ResumeRecord> =
            response.json().await.map_err(StoreError::Deserialization)?;
        rows.pop().ok_or(StoreError::EmptyResponse)
    }

    async fn delete(&self, session: &Session, id: &str) -> Result<(), StoreError> {
        let url = self.config.rest_url(RESUMES_TABLE);
        let id_filter = format!("eq.{id}");
        info!("Deleting saved resume {}", id);

        let request = self.client.delete(&url).query(&[("id", id_filter.as_str())]);
        let response = self
            .authorize(request, session)
            .send()
            .await
            .map_err(StoreError::Request)?;
        Self::check_status(response).await?;
        Ok(())
    }
}
