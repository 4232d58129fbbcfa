use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use archreview::config::ServerConfig;
use archreview::{LlmClient, LlmError, Pipeline, PipelineConfig, ProcessorRegistry};
use archreview_server::{build_router, AppState};
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use tempfile::TempDir;

/// Answers summary prompts with metadata JSON and everything else with a
/// fixed review line.
struct FakeLlm;

impl LlmClient for FakeLlm {
    fn complete(&self, prompt: &str, _system_prompt: Option<&str>) -> Result<String, LlmError> {
        if prompt.contains("\"topics\"") {
            return Ok(
                r#"{"title": "Order Service", "summary": "Event-driven orders.", "topics": ["events"]}"#
                    .to_string(),
            );
        }
        Ok("Looks reasonable.".to_string())
    }
}

struct TestServer {
    addr: SocketAddr,
    temp_dir: TempDir,
    client: reqwest::Client,
}

impl TestServer {
    async fn start() -> Self {
        let temp_dir = TempDir::new().expect("tempdir");
        let server_config = ServerConfig {
            upload_dir: temp_dir.path().join("uploads").to_string_lossy().into_owned(),
            feedback_file: temp_dir
                .path()
                .join("feedback.json")
                .to_string_lossy()
                .into_owned(),
            ..ServerConfig::default()
        };
        std::fs::create_dir_all(&server_config.upload_dir).expect("upload dir");

        let pipeline = Pipeline::new(
            Arc::new(PipelineConfig::default()),
            Arc::new(ProcessorRegistry::new()),
            Arc::new(FakeLlm),
        );
        let app = build_router(AppState::new(Arc::new(pipeline), &server_config));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind listener");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move { axum::serve(listener, app).await.expect("serve app") });

        Self {
            addr,
            temp_dir,
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    fn upload_dir(&self) -> std::path::PathBuf {
        self.temp_dir.path().join("uploads")
    }

    fn feedback_file(&self) -> std::path::PathBuf {
        self.temp_dir.path().join("feedback.json")
    }

    async fn review(&self, form: Form) -> (u16, Value) {
        let response = self
            .client
            .post(self.url("/review"))
            .multipart(form)
            .send()
            .await
            .expect("send review");
        let status = response.status().as_u16();
        let body = response.json().await.expect("json body");
        (status, body)
    }
}

fn file_form(name: &str, content: &str) -> Form {
    Form::new().part(
        "file",
        Part::bytes(content.as_bytes().to_vec()).file_name(name.to_string()),
    )
}

fn dir_is_empty(dir: &Path) -> bool {
    std::fs::read_dir(dir)
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(true)
}

#[tokio::test]
async fn test_health_reports_healthy() {
    let server = TestServer::start().await;

    let response = server
        .client
        .get(server.url("/health"))
        .send()
        .await
        .expect("send health");
    assert_eq!(response.status().as_u16(), 200);

    let body: Value = response.json().await.expect("json body");
    assert_eq!(body["status"], "healthy");
    assert!(body["message"].as_str().unwrap().contains("running"));
}

#[tokio::test]
async fn test_review_markdown_succeeds_and_removes_upload() {
    let server = TestServer::start().await;
    let document = "# Order Service\n\nOrders are published to a queue and consumed by billing.\n";

    let (status, body) = server.review(file_form("Order Service.md", document)).await;

    assert_eq!(status, 200, "{}", body);
    assert_eq!(body["status"], "success");
    assert_eq!(body["filename"], "Order_Service.md");
    assert_eq!(body["chunks_processed"], 1);
    assert_eq!(body["review"], "Chunk 1 Review:\nLooks reasonable.");
    assert_eq!(body["evaluation"], "Chunk 1 Evaluation:\nLooks reasonable.");
    assert_eq!(body["metadata"]["title"], "Order Service");
    assert!(body["timestamp"].is_string());
    assert!(dir_is_empty(&server.upload_dir()));
}

#[tokio::test]
async fn test_review_validation_errors() {
    let server = TestServer::start().await;

    let cases: Vec<(&str, Form, u16, &str)> = vec![
        (
            "no file field",
            Form::new().text("note", "hello"),
            400,
            "No file provided",
        ),
        (
            "file part without a name",
            Form::new().part("file", Part::bytes(b"content".to_vec())),
            400,
            "No file selected",
        ),
        (
            "unsupported extension",
            file_form("notes.docx", "content"),
            400,
            "Unsupported file type. Please upload PDF, MD, or TXT files",
        ),
    ];

    for (name, form, expected_status, expected_error) in cases {
        let (status, body) = server.review(form).await;
        assert_eq!(status, expected_status, "case: {}", name);
        assert_eq!(body["error"], expected_error, "case: {}", name);
        assert_eq!(body["status"], "failed", "case: {}", name);
    }
}

#[tokio::test]
async fn test_review_pipeline_failure_returns_500() {
    let server = TestServer::start().await;

    let (status, body) = server.review(file_form("blank.txt", "   \n\n\t  \n")).await;

    assert_eq!(status, 500);
    assert_eq!(body["status"], "failed");
    assert!(
        body["error"]
            .as_str()
            .unwrap()
            .starts_with("Error in ingest stage"),
        "{}",
        body
    );
    assert!(dir_is_empty(&server.upload_dir()));
}

#[tokio::test]
async fn test_feedback_is_appended_to_log() {
    let server = TestServer::start().await;

    for (kind, review_id) in [("thumbs_up", "review-1"), ("thumbs_down", "review-2")] {
        let response = server
            .client
            .post(server.url("/feedback"))
            .json(&serde_json::json!({
                "type": kind,
                "review_id": review_id,
                "comment": "noted",
            }))
            .send()
            .await
            .expect("send feedback");
        assert_eq!(response.status().as_u16(), 200);
        let body: Value = response.json().await.expect("json body");
        assert_eq!(body["status"], "success");
        assert_eq!(body["message"], "Feedback submitted successfully");
    }

    let content = std::fs::read_to_string(server.feedback_file()).expect("feedback file");
    let entries: Vec<Value> = content
        .lines()
        .map(|line| serde_json::from_str(line).expect("json line"))
        .collect();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["type"], "thumbs_up");
    assert_eq!(entries[1]["review_id"], "review-2");
    assert!(entries[1]["timestamp"].is_string());
}

#[tokio::test]
async fn test_feedback_rejects_malformed_body() {
    let server = TestServer::start().await;

    let response = server
        .client
        .post(server.url("/feedback"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .expect("send feedback");

    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.expect("json body");
    assert_eq!(body["status"], "failed");
    assert!(!server.feedback_file().exists());
}
