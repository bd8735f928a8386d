//! End-to-end pipeline run against a mocked HTTP service.

use std::sync::Arc;

use runclose_client::{ClientConfig, ExecutorConfig, RetryPolicy, TestOpsClient};
use runclose_core::{run_pipeline, PipelineContext, PipelinePaths, Settings};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn record(run_id: u64, case_id: u64, status: &str, end_time: &str) -> String {
    serde_json::json!({
        "run_id": run_id,
        "case_id": case_id,
        "status": status,
        "end_time": end_time,
        "time_spent_ms": 1200,
        "comment": null
    })
    .to_string()
}

fn quick_settings() -> Settings {
    let policy = RetryPolicy {
        max_retries: 1,
        initial_delay_ms: 10,
        max_delay_ms: 50,
        backoff_factor: 2.0,
        request_timeout_secs: 5,
    };
    Settings {
        executor: ExecutorConfig {
            max_concurrent: 4,
            requests_per_second: 200,
        },
        retry: policy,
        completion_retry: policy,
        ..Settings::default()
    }
}

async fn mount_run(server: &MockServer, id: u64, cases: &[u64]) {
    Mock::given(method("GET"))
        .and(path(format!("/run/DEMO/{id}")))
        .and(query_param("include", "cases"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": true,
            "result": {"id": id, "title": "nightly", "status": 0, "cases": cases}
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_only_fully_reconciled_runs_are_completed() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let paths = PipelinePaths::default().resolve(dir.path());

    let log = [
        // Run 100: case 2's latest result failed.
        record(100, 1, "passed", "2024-05-01T10:00:00"),
        record(100, 2, "passed", "2024-05-01T10:00:00"),
        record(100, 2, "failed", "2024-05-01T12:00:00"),
        // Run 200: case 5 ran twice, both passing in the end.
        record(200, 5, "failed", "2024-05-01T09:00:00"),
        record(200, 5, "passed", "2024-05-01T10:00:00"),
        record(200, 5, "passed", "2024-05-01T11:00:00"),
        record(200, 6, "passed", "2024-05-01T10:30:00"),
        // Run 300: remote expects a rerun the log does not have.
        record(300, 9, "passed", "2024-05-01T10:00:00"),
        "not json".to_string(),
    ]
    .join("\n");
    std::fs::write(&paths.results, log + "\n").unwrap();

    mount_run(&server, 200, &[5, 5, 6]).await;
    mount_run(&server, 300, &[9, 9]).await;

    Mock::given(method("POST"))
        .and(path("/run/DEMO/200/complete"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": true})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/run/DEMO/300/complete"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": true})))
        .expect(0)
        .mount(&server)
        .await;

    let client = TestOpsClient::new(
        ClientConfig::default()
            .with_url(server.uri())
            .with_token("test-token")
            .with_project_code("DEMO"),
    )
    .unwrap();
    let ctx = PipelineContext::new(Arc::new(client), &quick_settings());

    let report = run_pipeline(&ctx, &paths, false).await.unwrap();

    assert!(report.ingest.is_none());
    assert_eq!(report.selected.as_slice(), &[200, 300]);
    assert_eq!(report.confirmed.as_slice(), &[200]);
    assert_eq!(report.completion.completed.as_slice(), &[200]);
    assert!(report.completion.is_clean());

    assert_eq!(std::fs::read_to_string(&paths.selected).unwrap(), "200,300");
    assert_eq!(std::fs::read_to_string(&paths.confirmed).unwrap(), "200");
    assert!(!paths.ledger.exists());
}

#[tokio::test]
async fn test_refused_completion_lands_in_ledger() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let paths = PipelinePaths::default().resolve(dir.path());

    std::fs::write(
        &paths.results,
        record(42, 1, "passed", "2024-05-01T10:00:00") + "\n",
    )
    .unwrap();
    mount_run(&server, 42, &[1]).await;
    Mock::given(method("POST"))
        .and(path("/run/DEMO/42/complete"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": false,
            "errorMessage": "Run is locked"
        })))
        .mount(&server)
        .await;

    let client = TestOpsClient::new(
        ClientConfig::default()
            .with_url(server.uri())
            .with_token("test-token")
            .with_project_code("DEMO"),
    )
    .unwrap();
    let ctx = PipelineContext::new(Arc::new(client), &quick_settings());

    let report = run_pipeline(&ctx, &paths, false).await.unwrap();

    assert_eq!(report.completion.failed.as_slice(), &[42]);
    let ledger = std::fs::read_to_string(&paths.ledger).unwrap();
    assert_eq!(ledger.lines().count(), 1);
    assert!(ledger.trim_end().ends_with("Run ID 42: Run is locked"));
}
