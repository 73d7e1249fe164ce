//! Integration tests for the scan export.
//!
//! Each test spins up an Axum server on a random port that serves canned
//! pages keyed by cursor, then walks it with the real HTTP client.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::get;
use serde_json::{Value, json};
use tokio::net::TcpListener;

use dlp_audit::config::ScanConfig;
use dlp_audit::error::ScanError;
use dlp_audit::pipeline;
use dlp_audit::report::ReportFormat;
use dlp_audit::scan::{HttpScanSource, collect_findings};

#[derive(Clone, Default)]
struct Recorded {
    cursors: Arc<Mutex<Vec<Option<String>>>>,
    auth: Arc<Mutex<Vec<Option<String>>>>,
}

async fn services(
    State(recorded): State<Recorded>,
    Path(footprint): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Result<Json<Value>, StatusCode> {
    let cursor = params.get("cursor").cloned();
    recorded.cursors.lock().unwrap().push(cursor.clone());
    recorded.auth.lock().unwrap().push(
        headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(String::from),
    );

    if footprint == "broken" {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }

    let page = match cursor.as_deref() {
        None => json!({
            "cursor": "page-2",
            "services": [{
                "ip_address": "10.0.0.1",
                "port": 443,
                "domain": "www.acme.com",
                "cpes": ["cpe:/a:nginx:nginx", "cpe:/a:nginx:nginx", "cpe:/a:openssl:openssl"],
                "issues": [
                    {"severity": "high", "issue_id_label": "TLS-1", "title": "Weak cipher"},
                    {"severity": "low", "issue_id_label": "HDR-2", "title": "Missing header"}
                ]
            }]
        }),
        Some("page-2") => json!({
            "cursor": "page-3",
            "services": [{"ip_address": "10.0.0.2", "port": 22, "cpes": ["cpe:/a:openbsd:openssh"]}]
        }),
        Some("page-3") if footprint == "flaky" => return Err(StatusCode::BAD_GATEWAY),
        Some("page-3") => json!({"cursor": null, "services": []}),
        Some(_) => return Err(StatusCode::NOT_FOUND),
    };
    Ok(Json(page))
}

/// Start an Axum server on a random port, return (base_url, recorded requests).
async fn start_server() -> (String, Recorded) {
    let recorded = Recorded::default();
    let app = Router::new()
        .route("/api/footprints/{footprint}", get(services))
        .with_state(recorded.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    tokio::time::sleep(Duration::from_millis(50)).await;

    (format!("http://127.0.0.1:{port}/api/footprints"), recorded)
}

fn config(base_url: &str, footprint: &str) -> ScanConfig {
    ScanConfig {
        base_url: base_url.to_string(),
        footprint: footprint.to_string(),
        api_key: Some("test-token".to_string().into()),
        timeout: Duration::from_secs(5),
        ..Default::default()
    }
}

#[tokio::test]
async fn walks_every_page_until_cursor_is_null() {
    let (base_url, recorded) = start_server().await;
    let source = HttpScanSource::new(&config(&base_url, "acme")).unwrap();

    let export = collect_findings(&source, 10).await.unwrap();
    assert!(export.complete);
    assert_eq!(export.pages, 3);
    // 2 distinct CPEs × 2 issues, then 1 CPE × placeholder issue.
    assert_eq!(export.rows.len(), 5);
    assert_eq!(export.rows[0].cpe, "cpe:/a:nginx:nginx");
    assert_eq!(export.rows[2].cpe, "cpe:/a:openssl:openssl");
    assert_eq!(export.rows[4].ip_address, "10.0.0.2");
    assert_eq!(export.rows[4].severity, "-");

    assert_eq!(
        *recorded.cursors.lock().unwrap(),
        vec![None, Some("page-2".to_string()), Some("page-3".to_string())]
    );
    assert!(
        recorded
            .auth
            .lock()
            .unwrap()
            .iter()
            .all(|a| a.as_deref() == Some("Bearer test-token"))
    );
}

#[tokio::test]
async fn first_page_error_fails_the_export() {
    let (base_url, _) = start_server().await;
    let source = HttpScanSource::new(&config(&base_url, "broken")).unwrap();

    let err = collect_findings(&source, 10).await.unwrap_err();
    assert!(matches!(err, ScanError::Status { status: 500, .. }));
}

#[tokio::test]
async fn later_page_error_keeps_partial_rows() {
    let (base_url, _) = start_server().await;
    let source = HttpScanSource::new(&config(&base_url, "flaky")).unwrap();

    let export = collect_findings(&source, 10).await.unwrap();
    assert!(!export.complete);
    assert_eq!(export.pages, 2);
    assert_eq!(export.rows.len(), 5);
}

#[tokio::test]
async fn export_scan_writes_findings_csv() {
    let (base_url, _) = start_server().await;
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("findings.csv");

    let export = pipeline::export_scan(&config(&base_url, "acme"), &output, ReportFormat::Csv)
        .await
        .unwrap();
    assert_eq!(export.rows.len(), 5);

    let mut reader = csv::Reader::from_path(&output).unwrap();
    assert_eq!(reader.headers().unwrap().get(0), Some("IP Address"));
    assert_eq!(reader.records().count(), 5);
}
