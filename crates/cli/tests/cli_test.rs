//! # CLI Command Tests
//!
//! Runs the `lumascan` binary against a `wiremock` analysis service. Every test gets
//! its own state directory and runs signed out.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::{tempdir, TempDir};
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A command isolated from the developer's environment.
fn lumascan(workdir: &Path, api_url: &str) -> Command {
    let mut cmd = Command::cargo_bin("lumascan").unwrap();
    cmd.current_dir(workdir)
        .env("LUMASCAN_STATE_DIR", workdir.join("state"))
        .env("LUMASCAN_API_URL", api_url)
        .env("NO_COLOR", "1")
        .env_remove("LUMASCAN_API_PREFIX")
        .env_remove("SUPABASE_URL")
        .env_remove("SUPABASE_ANON_KEY");
    cmd
}

fn create_fixture_file(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    let file_path = dir.join(name);
    fs::write(&file_path, content).expect("Failed to write fixture file");
    file_path
}

fn seed_last_resume(workdir: &TempDir) {
    let state = workdir.path().join("state");
    fs::create_dir_all(&state).unwrap();
    fs::write(
        state.join("last_resume.json"),
        json!({"resume_text": "T", "skills": ["A", "B"], "job_title": "cv"}).to_string(),
    )
    .unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_upload_rejects_non_pdf_without_request() {
    // Arrange
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let temp_dir = tempdir().unwrap();
    let notes = create_fixture_file(temp_dir.path(), "notes.txt", b"just text");

    // Act & Assert
    lumascan(temp_dir.path(), &server.uri())
        .arg("upload")
        .arg(&notes)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Please upload a PDF file."));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_upload_prints_skills_and_remembers_resume() {
    // Arrange
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "resume_text": "Jane Doe builds services in Rust.",
            "skills": ["Rust", "PostgreSQL"]
        })))
        .expect(1)
        .mount(&server)
        .await;
    let temp_dir = tempdir().unwrap();
    let resume = create_fixture_file(temp_dir.path(), "jane_cv.pdf", b"%PDF-1.4\n%test\n");

    // Act & Assert
    lumascan(temp_dir.path(), &server.uri())
        .arg("upload")
        .arg(&resume)
        .assert()
        .success()
        .stdout(predicate::str::contains("Extracted skills (2)"))
        .stdout(predicate::str::contains("PostgreSQL"))
        .stdout(predicate::str::contains("Jane Doe builds services in Rust."));

    let saved = fs::read_to_string(temp_dir.path().join("state/last_resume.json")).unwrap();
    let saved: serde_json::Value = serde_json::from_str(&saved).unwrap();
    assert_eq!(saved["skills"], json!(["Rust", "PostgreSQL"]));
    assert_eq!(saved["job_title"], json!("jane_cv"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_upload_quiet_omits_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "resume_text": "SECRET BODY TEXT",
            "skills": ["Go"]
        })))
        .mount(&server)
        .await;
    let temp_dir = tempdir().unwrap();
    let resume = create_fixture_file(temp_dir.path(), "cv.pdf", b"%PDF-1.4\n");

    lumascan(temp_dir.path(), &server.uri())
        .args(["upload", "--quiet"])
        .arg(&resume)
        .assert()
        .success()
        .stdout(predicate::str::contains("Go"))
        .stdout(predicate::str::contains("SECRET BODY TEXT").not());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_upload_failure_shows_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "bad pdf"})))
        .mount(&server)
        .await;
    let temp_dir = tempdir().unwrap();
    let resume = create_fixture_file(temp_dir.path(), "cv.pdf", b"%PDF-1.4\n");

    lumascan(temp_dir.path(), &server.uri())
        .arg("upload")
        .arg(&resume)
        .assert()
        .failure()
        .stderr(predicate::str::contains("bad pdf"));
    assert!(!temp_dir.path().join("state/last_resume.json").exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_match_without_resume_asks_for_upload() {
    let server = MockServer::start().await;
    let temp_dir = tempdir().unwrap();

    lumascan(temp_dir.path(), &server.uri())
        .args(["match", "--job", "Rust engineer"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Please upload a resume first."));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_match_with_blank_job_description_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let temp_dir = tempdir().unwrap();
    seed_last_resume(&temp_dir);

    lumascan(temp_dir.path(), &server.uri())
        .args(["match", "--job", "   "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Please enter a job description."));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_match_uses_last_resume_and_prints_report() {
    // Arrange
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/match"))
        .and(body_json(json!({
            "resume_text": "T",
            "job_desc": "Senior Rust engineer",
            "industry": "tech"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "match_score": 82,
            "matched_skills": ["rust → rust"],
            "missing_core_skills": ["kubernetes"],
            "industry_analysis": "Strong tech background",
            "experience_level": "senior",
            "score_breakdown": {
                "exact_matches": 3,
                "cosine_similarity": {"overall": 0.7, "skills": 0.8, "contribution": 25.0}
            }
        })))
        .expect(1)
        .mount(&server)
        .await;
    let temp_dir = tempdir().unwrap();
    seed_last_resume(&temp_dir);
    let job = create_fixture_file(temp_dir.path(), "job.txt", b"Senior Rust engineer");

    // Act & Assert
    lumascan(temp_dir.path(), &server.uri())
        .args(["match", "--industry", "tech", "--job-file"])
        .arg(&job)
        .assert()
        .success()
        .stdout(predicate::str::contains("Match score: 82% (high)"))
        .stdout(predicate::str::contains("Missing core skills"))
        .stdout(predicate::str::contains("kubernetes"))
        .stdout(predicate::str::contains("Experience level: senior"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_match_analysis_error_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/match"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"error": "Analysis failed: timeout"})),
        )
        .mount(&server)
        .await;
    let temp_dir = tempdir().unwrap();
    seed_last_resume(&temp_dir);

    lumascan(temp_dir.path(), &server.uri())
        .args(["match", "--job", "Anything"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Analysis failed: timeout"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rewrite_writes_pdf() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rewrite_resume"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/pdf")
                .set_body_bytes(b"%PDF-1.4\n%rewritten\n".to_vec()),
        )
        .expect(1)
        .mount(&server)
        .await;
    let temp_dir = tempdir().unwrap();
    let resume = create_fixture_file(temp_dir.path(), "cv.pdf", b"%PDF-1.4\n");
    let job = create_fixture_file(temp_dir.path(), "job.txt", b"Platform engineer");
    let out = temp_dir.path().join("tailored.pdf");

    lumascan(temp_dir.path(), &server.uri())
        .arg("rewrite")
        .arg(&resume)
        .arg("--job-file")
        .arg(&job)
        .arg("--out")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote rewritten resume"));

    assert_eq!(fs::read(&out).unwrap(), b"%PDF-1.4\n%rewritten\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_health_reports_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "healthy"})))
        .mount(&server)
        .await;
    let temp_dir = tempdir().unwrap();

    lumascan(temp_dir.path(), &server.uri())
        .arg("health")
        .assert()
        .success()
        .stdout(predicate::str::contains("is healthy"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_signed_out_without_supabase() {
    let server = MockServer::start().await;
    let temp_dir = tempdir().unwrap();

    lumascan(temp_dir.path(), &server.uri())
        .args(["auth", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Not signed in"));

    lumascan(temp_dir.path(), &server.uri())
        .args(["resumes", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Sign in to see saved resumes"));

    lumascan(temp_dir.path(), &server.uri())
        .args(["auth", "login", "jane@example.com", "--password", "x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No identity provider is configured"));
}

fn seed_expired_session(workdir: &TempDir) -> PathBuf {
    let state = workdir.path().join("state");
    fs::create_dir_all(&state).unwrap();
    let session_file = state.join("session.json");
    fs::write(
        &session_file,
        json!({
            "access_token": "expired-access",
            "refresh_token": "old-refresh",
            "expires_at": 1_000,
            "user": {"id": "u1", "email": "jane@example.com"}
        })
        .to_string(),
    )
    .unwrap();
    session_file
}

#[tokio::test(flavor = "multi_thread")]
async fn test_expired_session_is_refreshed_on_start() {
    // Arrange
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "refresh_token"))
        .and(body_json(json!({"refresh_token": "old-refresh"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "fresh-access",
            "refresh_token": "new-refresh",
            "expires_at": 4_000_000_000_i64,
            "user": {"id": "u1", "email": "jane@example.com"}
        })))
        .expect(1)
        .mount(&server)
        .await;
    let temp_dir = tempdir().unwrap();
    let session_file = seed_expired_session(&temp_dir);

    // Act & Assert
    lumascan(temp_dir.path(), &server.uri())
        .env("SUPABASE_URL", server.uri())
        .env("SUPABASE_ANON_KEY", "anon-key")
        .args(["auth", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Signed in as jane@example.com."));

    let saved: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(session_file).unwrap()).unwrap();
    assert_eq!(saved["access_token"], "fresh-access");
    assert_eq!(saved["refresh_token"], "new-refresh");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unrefreshable_session_falls_back_to_signed_out() {
    // Arrange
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "refresh_token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error_description": "Invalid Refresh Token"
        })))
        .expect(1)
        .mount(&server)
        .await;
    let temp_dir = tempdir().unwrap();
    let session_file = seed_expired_session(&temp_dir);

    // Act & Assert
    lumascan(temp_dir.path(), &server.uri())
        .env("SUPABASE_URL", server.uri())
        .env("SUPABASE_ANON_KEY", "anon-key")
        .args(["auth", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Not signed in"));

    assert!(!session_file.exists());
}
