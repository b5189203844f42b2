//! Integration tests for the log analysis HTTP endpoints
//!
//! The router is driven with `oneshot` against an in-memory store and a fake
//! lookup backend, so enrichment completes without network access.

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use logscope::app::App;
use logscope::config::Config;
use logscope::enrichment::{AddressInfo, AddressLookup, LookupError};
use logscope::storage::{AnalysisStore, MemoryAnalysisStore};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

const BOUNDARY: &str = "logscope-test-boundary";

const HEADER: &str = "TimeGenerated [UTC],ClientIp,HttpMethod,RequestUri,UserAgent,HttpStatus,HttpVersion,ReceivedBytes,SentBytes,ClientResponseTime,SslProtocol,OriginalRequestUriWithArgs";

/// Resolves everything outside 10.0.0.0/8 to a fixed country
struct StaticLookup;

#[async_trait]
impl AddressLookup for StaticLookup {
    async fn resolve(&self, address: &str) -> Result<AddressInfo, LookupError> {
        if address.starts_with("10.") {
            return Err(LookupError::NotFound);
        }
        Ok(AddressInfo {
            country: Some("KR".to_string()),
            city: Some("Seoul".to_string()),
            ..AddressInfo::unknown(address)
        })
    }
}

/// Helper to start a pipeline with default settings
fn create_test_app() -> (App, Router) {
    let config = Config::from_source(|_| None);
    let store: Arc<dyn AnalysisStore> = Arc::new(MemoryAnalysisStore::new());
    let app = App::start(store, Arc::new(StaticLookup), &config);
    let router = logscope::api::create_api_router(
        app.orchestrator.clone(),
        config.analysis.max_upload_bytes,
    );
    (app, router)
}

fn log_line(address: &str, method: &str, path: &str, status: u16) -> String {
    format!(
        "\"1/29/2025, 5:44:36.123 PM\",{address},{method},{path},Mozilla/5.0,{status},HTTP/1.1,512,1024,12,TLSv1.3,{path}?page=1"
    )
}

fn log_file(lines: &[String]) -> String {
    let mut file = String::from(HEADER);
    for line in lines {
        file.push('\n');
        file.push_str(line);
    }
    file.push('\n');
    file
}

fn multipart_request(field: &str, content: &str) -> Request<Body> {
    let body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"access.csv\"\r\nContent-Type: text/csv\r\n\r\n{content}\r\n--{BOUNDARY}--\r\n"
    );

    Request::builder()
        .method("POST")
        .uri("/api/logs/analyze")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let (_app, router) = create_test_app();

    let response = router.oneshot(get_request("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["result"], "SUCCESS");
}

#[tokio::test]
async fn test_analyze_returns_accepted_with_location() {
    let (_app, router) = create_test_app();
    let file = log_file(&[
        log_line("1.2.3.4", "GET", "/index.html", 200),
        log_line("1.2.3.4", "POST", "/login", 302),
        log_line("5.6.7.8", "GET", "/missing", 404),
        "broken,row".to_string(),
        log_line("5.6.7.8", "get", "/lowercase", 200),
    ]);

    let response = router
        .oneshot(multipart_request("file", &file))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "/api/logs/analysis/1"
    );

    let json = body_json(response).await;
    assert_eq!(json["result"], "SUCCESS");
    assert_eq!(json["data"]["analysis_id"], 1);
    assert_eq!(json["data"]["total_requests"], 3);
    assert_eq!(json["data"]["parse_error_count"], 2);
    assert_eq!(json["data"]["parse_error_samples"][0]["line_number"], 5);
    assert_eq!(
        json["data"]["parse_error_samples"][1]["message"],
        "unrecognized HTTP method 'get'"
    );
}

#[tokio::test]
async fn test_analyze_without_file_part() {
    let (_app, router) = create_test_app();

    let response = router
        .oneshot(multipart_request("upload", "irrelevant"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["result"], "ERROR");
    assert_eq!(json["error"]["code"], "E1000");
}

#[tokio::test]
async fn test_analyze_invalid_utf8_is_batch_error() {
    let (_app, router) = create_test_app();
    let mut body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"access.csv\"\r\n\r\n{HEADER}\n"
    )
    .into_bytes();
    body.extend_from_slice(b"\xff\xfe\xfd\n");
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    let request = Request::builder()
        .method("POST")
        .uri("/api/logs/analyze")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();

    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "E1001");
}

#[tokio::test]
async fn test_get_analysis_result() {
    let (_app, router) = create_test_app();
    let file = log_file(&[
        log_line("1.2.3.4", "GET", "/a", 200),
        log_line("1.2.3.4", "GET", "/a", 200),
        log_line("1.2.3.4", "GET", "/b", 301),
        log_line("5.6.7.8", "GET", "/a", 404),
        log_line("9.9.9.9", "GET", "/c", 500),
    ]);
    router
        .clone()
        .oneshot(multipart_request("file", &file))
        .await
        .unwrap();

    let response = router
        .oneshot(get_request("/api/logs/analysis/1?topN=2"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let data = &json["data"];
    assert_eq!(data["total_requests"], 5);
    assert_eq!(data["status_distribution"]["success_rate"], 40.0);
    assert_eq!(data["status_distribution"]["server_error_rate"], 20.0);
    assert_eq!(data["top_paths"].as_array().unwrap().len(), 2);
    assert_eq!(data["top_paths"][0]["value"], "/a");
    assert_eq!(data["top_paths"][0]["count"], 3);
    assert_eq!(data["top_status_codes"][0]["value"], "200");
    assert_eq!(data["top_addresses"][0]["address"], "1.2.3.4");
    assert_eq!(data["top_addresses"][0]["count"], 3);
    assert_eq!(data["top_addresses"][0]["percentage"], 60.0);
}

#[tokio::test]
async fn test_addresses_are_enriched_eventually() {
    let (_app, router) = create_test_app();
    let file = log_file(&[
        log_line("8.8.8.8", "GET", "/", 200),
        log_line("10.0.0.1", "GET", "/", 200),
    ]);
    router
        .clone()
        .oneshot(multipart_request("file", &file))
        .await
        .unwrap();

    let enriched = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let response = router
                .clone()
                .oneshot(get_request("/api/logs/analysis/1"))
                .await
                .unwrap();
            let json = body_json(response).await;
            let addresses = json["data"]["top_addresses"].as_array().unwrap().clone();
            let public = addresses
                .iter()
                .find(|a| a["address"] == "8.8.8.8")
                .unwrap();
            if !public["detail"].is_null() {
                return addresses;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("address should be enriched by the background worker");

    let public = enriched.iter().find(|a| a["address"] == "8.8.8.8").unwrap();
    assert_eq!(public["detail"]["country"], "KR");
    assert_eq!(public["detail"]["city"], "Seoul");
    assert!(public["detail"]["org"].is_null());

    // Lookup failures degrade to a null detail rather than an error
    let private = enriched.iter().find(|a| a["address"] == "10.0.0.1").unwrap();
    assert!(private["detail"].is_null());
}

#[tokio::test]
async fn test_get_analysis_rejects_non_positive_top_n() {
    let (_app, router) = create_test_app();
    router
        .clone()
        .oneshot(multipart_request("file", &log_file(&[])))
        .await
        .unwrap();

    for uri in ["/api/logs/analysis/1?topN=0", "/api/logs/analysis/1?topN=-3"] {
        let response = router.clone().oneshot(get_request(uri)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["result"], "ERROR");
        assert_eq!(json["error"]["code"], "E1000");
    }
}

#[tokio::test]
async fn test_get_analysis_rejects_non_numeric_parameters() {
    let (_app, router) = create_test_app();
    router
        .clone()
        .oneshot(multipart_request("file", &log_file(&[])))
        .await
        .unwrap();

    for uri in [
        "/api/logs/analysis/abc",
        "/api/logs/analysis/-1",
        "/api/logs/analysis/1?topN=ten",
    ] {
        let response = router.clone().oneshot(get_request(uri)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        let json = body_json(response).await;
        assert_eq!(json["result"], "ERROR");
        assert_eq!(json["error"]["code"], "E1000");
    }
}

#[tokio::test]
async fn test_get_unknown_analysis() {
    let (_app, router) = create_test_app();

    let response = router
        .oneshot(get_request("/api/logs/analysis/404"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "E2000");
    assert_eq!(json["error"]["message"], "analysis 404 not found");
}

#[tokio::test]
async fn test_empty_upload_yields_empty_analysis() {
    let (_app, router) = create_test_app();

    let response = router
        .clone()
        .oneshot(multipart_request("file", HEADER))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let response = router
        .oneshot(get_request("/api/logs/analysis/1"))
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["data"]["total_requests"], 0);
    assert_eq!(json["data"]["status_distribution"]["success_rate"], 0.0);
    assert!(json["data"]["top_paths"].as_array().unwrap().is_empty());
}
