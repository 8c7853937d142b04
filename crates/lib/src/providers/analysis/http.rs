use crate::{
    errors::ApiError,
    providers::analysis::AnalysisProvider,
    types::{MatchRequest, MatchResult, ResumeFile, UploadResponse},
};
use async_trait::async_trait;
use reqwest::{multipart, Client as ReqwestClient, Response};
use serde::Deserialize;
use serde_json::Value;
use std::fmt::Debug;
use std::str::FromStr;
use tracing::{debug, info};

// --- Response structures ---

#[derive(Deserialize, Debug)]
struct ErrorBody {
    error: Option<String>,
}

#[derive(Deserialize, Debug)]
struct HealthBody {
    status: String,
}

/// Where the upload and match routes are mounted on the analysis service.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ApiPrefix {
    /// `{base}/upload`, `{base}/match`
    #[default]
    Root,
    /// `{base}/api/upload`, `{base}/api/match`
    Api,
}

impl ApiPrefix {
    fn as_str(&self) -> &'static str {
        match self {
            ApiPrefix::Root => "",
            ApiPrefix::Api => "/api",
        }
    }
}

impl FromStr for ApiPrefix {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_matches('/') {
            "" => Ok(ApiPrefix::Root),
            "api" => Ok(ApiPrefix::Api),
            other => Err(format!("Unsupported API prefix: '{other}'")),
        }
    }
}

// --- HTTP client implementation ---

/// A client for the resume analysis HTTP API.
#[derive(Clone, Debug)]
pub struct HttpAnalysisClient {
    client: ReqwestClient,
    base_url: String,
    prefix: ApiPrefix,
}

impl HttpAnalysisClient {
    /// Creates a new `HttpAnalysisClient`. Trailing slashes on `base_url` are ignored.
    pub fn new(base_url: impl Into<String>, prefix: ApiPrefix) -> Result<Self, ApiError> {
        let client = ReqwestClient::builder()
            .build()
            .map_err(ApiError::ClientBuild)?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            client,
            base_url,
            prefix,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn route(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, self.prefix.as_str(), path)
    }

    fn resume_part(file: &ResumeFile) -> Result<multipart::Part, ApiError> {
        multipart::Part::bytes(file.bytes.clone())
            .file_name(file.file_name.clone())
            .mime_str(&file.mime_type)
            .map_err(ApiError::Request)
    }

    /// Turns a non-2xx response into `ApiError::Server`, keeping the `{error}` text if any.
    async fn check_status(response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.error)
            .filter(|m| !m.trim().is_empty());
        Err(ApiError::Server {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl AnalysisProvider for HttpAnalysisClient {
    async fn upload_resume(&self, file: &ResumeFile) -> Result<UploadResponse, ApiError> {
        let url = self.route("/upload");
        info!("Uploading '{}' ({} bytes) to {}", file.file_name, file.bytes.len(), url);

        let form = multipart::Form::new().part("resume", Self::resume_part(file)?);
        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(ApiError::Request)?;
        let response = Self::check_status(response).await?;

        let upload: UploadResponse = response.json().await.map_err(ApiError::Deserialization)?;
        debug!(
            "<-- Upload returned {} chars of text and {} skills",
            upload.resume_text.len(),
            upload.skills.len()
        );
        Ok(upload)
    }

    async fn analyze_match(
        &self,
        resume_text: &str,
        job_desc: &str,
        industry: Option<&str>,
    ) -> Result<MatchResult, ApiError> {
        let url = self.route("/match");
        info!("Requesting match analysis from {} (industry: {:?})", url, industry);

        let request = MatchRequest {
            resume_text,
            job_desc,
            industry,
        };
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(ApiError::Request)?;
        let response = Self::check_status(response).await?;

        // The service reports analysis failures inside a 200 body, so look for `error`
        // before committing to the result shape.
        let body: Value = response.json().await.map_err(ApiError::Deserialization)?;
        if let Some(message) = body.get("error").and_then(Value::as_str) {
            return Err(ApiError::Analysis(message.to_string()));
        }
        let result: MatchResult = serde_json::from_value(body)
            .map_err(|e| ApiError::Analysis(format!("Unexpected match response: {e}")))?;
        debug!("<-- Match score: {}", result.match_score);
        Ok(result)
    }

    async fn rewrite_resume(
        &self,
        file: &ResumeFile,
        job_description: &str,
    ) -> Result<Vec<u8>, ApiError> {
        let url = self.route("/rewrite_resume");
        info!("Requesting rewrite of '{}' from {}", file.file_name, url);

        let form = multipart::Form::new()
            .part("resume", Self::resume_part(file)?)
            .text("job_description", job_description.to_string());
        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(ApiError::Request)?;
        let response = Self::check_status(response).await?;

        let bytes = response.bytes().await.map_err(ApiError::Deserialization)?;
        Ok(bytes.to_vec())
    }

    async fn health(&self) -> Result<String, ApiError> {
        let url = format!("{}/health", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(ApiError::Request)?;
        let response = Self::check_status(response).await?;
        let body: HealthBody = response.json().await.map_err(ApiError::Deserialization)?;
        Ok(body.status)
    }
}
