//! # Analysis Client Tests
//!
//! Runs `HttpAnalysisClient` against a `wiremock` server standing in for the
//! resume analysis service.

mod common;

use crate::common::setup_tracing;
use lumascan::errors::ApiError;
use lumascan::providers::analysis::{AnalysisProvider, ApiPrefix, HttpAnalysisClient};
use lumascan::types::ResumeFile;
use lumascan_test_utils::sample_pdf;
use serde_json::json;
use wiremock::matchers::{body_json, body_string_contains, header_regex, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> HttpAnalysisClient {
    HttpAnalysisClient::new(server.uri(), ApiPrefix::Root).expect("client builds")
}

#[tokio::test]
async fn test_upload_sends_multipart_resume_field() {
    setup_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .and(header_regex("content-type", "^multipart/form-data"))
        .and(body_string_contains("name=\"resume\""))
        .and(body_string_contains("filename=\"jane_cv.pdf\""))
        .and(body_string_contains("application/pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "resume_text": "Jane Doe, Rust engineer",
            "skills": ["Rust", "SQL"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let upload = client(&server)
        .upload_resume(&sample_pdf("jane_cv.pdf"))
        .await
        .unwrap();

    assert_eq!(upload.resume_text, "Jane Doe, Rust engineer");
    assert_eq!(upload.skills, vec!["Rust", "SQL"]);
}

#[tokio::test]
async fn test_upload_error_body_is_surfaced() {
    setup_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "bad pdf"})))
        .mount(&server)
        .await;

    let err = client(&server)
        .upload_resume(&sample_pdf("cv.pdf"))
        .await
        .unwrap_err();

    match &err {
        ApiError::Server { status, message } => {
            assert_eq!(*status, 400);
            assert_eq!(message.as_deref(), Some("bad pdf"));
        }
        other => panic!("expected a server error, got {other:?}"),
    }
    assert_eq!(err.user_message("Failed to upload resume"), "bad pdf");
}

#[tokio::test]
async fn test_upload_error_without_body_uses_fallback() {
    setup_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&server)
        .await;

    let err = client(&server)
        .upload_resume(&sample_pdf("cv.pdf"))
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Server { status: 500, message: None }));
    assert_eq!(
        err.user_message("Failed to upload resume"),
        "Failed to upload resume"
    );
}

#[tokio::test]
async fn test_api_prefix_mounts_routes_under_api() {
    setup_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"resume_text": "T", "skills": []})),
        )
        .expect(1)
        .mount(&server)
        .await;

    // A trailing slash on the base URL must not produce a double slash.
    let client = HttpAnalysisClient::new(format!("{}/", server.uri()), ApiPrefix::Api).unwrap();
    let upload = client.upload_resume(&sample_pdf("cv.pdf")).await.unwrap();
    assert_eq!(upload.resume_text, "T");
    assert!(upload.skills.is_empty());
}

#[test]
fn test_api_prefix_parsing() {
    assert_eq!("".parse::<ApiPrefix>(), Ok(ApiPrefix::Root));
    assert_eq!("/api".parse::<ApiPrefix>(), Ok(ApiPrefix::Api));
    assert_eq!("api/".parse::<ApiPrefix>(), Ok(ApiPrefix::Api));
    assert!("v2".parse::<ApiPrefix>().is_err());
}

#[tokio::test]
async fn test_match_posts_json_with_null_industry() {
    setup_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/match"))
        .and(body_json(json!({
            "resume_text": "T",
            "job_desc": "Rust engineer",
            "industry": null
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "match_score": 82,
            "matched_skills": ["rust → rust"],
            "missing_core_skills": [],
            "missing_secondary_skills": ["docker"],
            "industry_analysis": "Strong fit",
            "experience_level": "senior",
            "score_breakdown": {
                "exact_matches": 3,
                "cosine_similarity": {"overall": 0.7, "skills": 0.8, "contribution": 25.0}
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = client(&server)
        .analyze_match("T", "Rust engineer", None)
        .await
        .unwrap();

    assert_eq!(result.match_score, 82.0);
    assert_eq!(result.matched_skills, vec!["rust → rust"]);
    assert_eq!(result.missing_secondary_skills, vec!["docker"]);
    assert_eq!(result.score_breakdown.exact_matches, 3);
}

#[tokio::test]
async fn test_match_sends_industry_when_given() {
    setup_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/match"))
        .and(body_json(json!({
            "resume_text": "T",
            "job_desc": "J",
            "industry": "finance"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"match_score": 40})))
        .expect(1)
        .mount(&server)
        .await;

    let result = client(&server)
        .analyze_match("T", "J", Some("finance"))
        .await
        .unwrap();
    assert_eq!(result.match_score, 40.0);
    assert!(result.matched_skills.is_empty());
}

#[tokio::test]
async fn test_match_error_inside_success_body() {
    setup_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/match"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": "Analysis failed: model offline"
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .analyze_match("T", "J", None)
        .await
        .unwrap_err();

    assert!(matches!(&err, ApiError::Analysis(m) if m == "Analysis failed: model offline"));
    assert_eq!(
        err.user_message("Failed to analyze resume"),
        "Analysis failed: model offline"
    );
}

#[tokio::test]
async fn test_match_server_error() {
    setup_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/match"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"error": "Missing required fields"})),
        )
        .mount(&server)
        .await;

    let err = client(&server)
        .analyze_match("T", "J", None)
        .await
        .unwrap_err();
    assert_eq!(
        err.user_message("Failed to analyze resume"),
        "Missing required fields"
    );
}

#[tokio::test]
async fn test_rewrite_returns_pdf_bytes() {
    setup_tracing();
    let server = MockServer::start().await;
    let pdf = b"%PDF-1.4\n%rewritten\n".to_vec();
    Mock::given(method("POST"))
        .and(path("/rewrite_resume"))
        .and(body_string_contains("name=\"resume\""))
        .and(body_string_contains("name=\"job_description\""))
        .and(body_string_contains("Platform engineer"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/pdf")
                .set_body_bytes(pdf.clone()),
        )
        .expect(1)
        .mount(&server)
        .await;

    let file = ResumeFile::new("cv.pdf", "application/pdf", b"%PDF-1.4\n".to_vec());
    let bytes = client(&server)
        .rewrite_resume(&file, "Platform engineer")
        .await
        .unwrap();
    assert_eq!(bytes, pdf);
}

#[tokio::test]
async fn test_health_reads_status() {
    setup_tracing();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "healthy"})))
        .mount(&server)
        .await;

    let status = client(&server).health().await.unwrap();
    assert_eq!(status, "healthy");
}

#[tokio::test]
async fn test_unreachable_service_is_a_request_error() {
    setup_tracing();
    let server = MockServer::start().await;
    let uri = server.uri();
    drop(server);

    let client = HttpAnalysisClient::new(uri, ApiPrefix::Root).unwrap();
    let err = client.upload_resume(&sample_pdf("cv.pdf")).await.unwrap_err();
    assert!(matches!(err, ApiError::Request(_)));
    assert_eq!(
        err.user_message("Failed to upload resume"),
        "Failed to upload resume"
    );
}
