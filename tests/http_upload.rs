//! Tests for the HTTP upload task against a mock endpoint.

mod common;

use batch_uploader::{Config, HttpUploadTask, Job, Outcome, UploadTask};
use common::{FILE_CONTENT, config_for, write_file, write_files};
use wiremock::matchers::{any, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn missing_file_is_not_found_without_network_call() {
    let mock_server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;
    let task = HttpUploadTask::new(&config_for(&mock_server.uri(), 2)).unwrap();

    let outcome = task.upload(&Job::from("missing.txt")).await;

    assert_eq!(outcome, Outcome::new(Job::from("missing.txt"), 404, "not found"));
}

#[tokio::test]
async fn directory_is_not_an_uploadable_file() {
    let mock_server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;
    let task = HttpUploadTask::new(&config_for(&mock_server.uri(), 2)).unwrap();
    let dir = tempfile::tempdir().unwrap();

    let outcome = task.upload(&Job::from(dir.path())).await;

    assert_eq!(outcome.code, 404);
    assert_eq!(outcome.reason, "not found");
}

#[tokio::test]
async fn file_is_posted_as_multipart_part_named_after_base_name() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .and(body_string_contains("name=\"report.txt\""))
        .and(body_string_contains("filename=\"report.txt\""))
        .and(body_string_contains(FILE_CONTENT))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;
    let task = HttpUploadTask::new(&config_for(&mock_server.uri(), 2)).unwrap();
    let (_dir, jobs) = write_files(&["report.txt"]);

    let outcome = task.upload(&jobs[0]).await;

    assert_eq!(outcome, Outcome::new(jobs[0].clone(), 200, "OK"));

    let requests = mock_server.received_requests().await.unwrap();
    let content_type = requests[0]
        .headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(
        content_type.starts_with("multipart/form-data"),
        "unexpected content type: {content_type}"
    );
}

#[tokio::test]
async fn rejected_upload_keeps_status_and_reason() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&mock_server)
        .await;
    let task = HttpUploadTask::new(&config_for(&mock_server.uri(), 2)).unwrap();
    let (_dir, jobs) = write_files(&["secret.txt"]);

    let outcome = task.upload(&jobs[0]).await;

    assert_eq!(outcome.code, 403);
    assert_eq!(outcome.reason, "Forbidden");
    assert!(!outcome.is_success());
}

#[tokio::test]
async fn only_200_counts_as_success() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&mock_server)
        .await;
    let task = HttpUploadTask::new(&config_for(&mock_server.uri(), 2)).unwrap();
    let (_dir, jobs) = write_files(&["created.txt"]);

    let outcome = task.upload(&jobs[0]).await;

    assert_eq!(outcome.code, 201);
    assert_eq!(outcome.reason, "Created");
    assert!(!outcome.is_success());
}

#[tokio::test]
async fn unreachable_endpoint_becomes_failure_outcome() {
    // Bind then release a port so nothing is listening on it
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let task = HttpUploadTask::new(&config_for(&format!("http://127.0.0.1:{port}"), 2)).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let job = write_file(dir.path(), "orphan.txt", "data");

    let outcome = task.upload(&job).await;

    assert_eq!(outcome.job, job);
    assert_eq!(outcome.code, 0);
    assert!(!outcome.reason.is_empty());
}

#[tokio::test]
async fn configured_user_agent_is_sent() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("user-agent", "batch-uploader-tests/1.0"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;
    let config = Config {
        user_agent: Some("batch-uploader-tests/1.0".to_string()),
        ..config_for(&mock_server.uri(), 1)
    };
    let task = HttpUploadTask::new(&config).unwrap();
    let (_dir, jobs) = write_files(&["ua.txt"]);

    assert!(task.upload(&jobs[0]).await.is_success());
}

#[tokio::test]
async fn invalid_endpoint_is_rejected_at_construction() {
    let config = Config {
        endpoint_url: "::not-a-url::".to_string(),
        ..Config::default()
    };

    assert!(HttpUploadTask::new(&config).is_err());
}
