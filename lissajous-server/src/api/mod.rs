//! API Module
//!
//! HTTP API layer for the render service.

pub mod error;
pub mod health;
pub mod lissajous;

use std::path::Path;

use axum::{
    Router,
    routing::{delete, get, post},
};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::service::job_service::JobService;

/// Create the main API router with all endpoints
///
/// `static_dir` holds `demo.html`, served at `/`, and the assets served
/// under `/static`.
pub fn create_router(service: JobService, static_dir: &Path) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Render jobs
        .route("/lissajous", post(lissajous::submit_job))
        .route("/lissajous/status/{id}", get(lissajous::get_status))
        .route("/lissajous/result", get(lissajous::get_result))
        .route("/lissajous/{id}", delete(lissajous::cancel_job))
        // Demo page
        .nest_service("/static", ServeDir::new(static_dir))
        .route_service("/", ServeFile::new(static_dir.join("demo.html")))
        // Add state and middleware
        .with_state(service)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{self, BlockingEncoder, FakeEncoder};
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use axum::response::Response;
    use serde_json::Value;
    use std::time::Duration;
    use tempfile::TempDir;
    use tower::ServiceExt;

    struct TestApp {
        router: Router,
        _staging: TempDir,
        _static: TempDir,
    }

    fn app_with(encoder: impl lissajous_runner::Encoder + 'static, available: bool) -> TestApp {
        let (service, staging) = testing::service_with(encoder, available);
        let static_dir = tempfile::tempdir().unwrap();
        std::fs::write(static_dir.path().join("demo.html"), "<html>demo</html>").unwrap();
        std::fs::write(static_dir.path().join("demo.js"), "// demo").unwrap();

        TestApp {
            router: create_router(service, static_dir.path()),
            _staging: staging,
            _static: static_dir,
        }
    }

    fn app() -> TestApp {
        app_with(FakeEncoder, true)
    }

    async fn send(app: &TestApp, request: Request<Body>) -> Response {
        app.router.clone().oneshot(request).await.unwrap()
    }

    async fn body_bytes(response: Response) -> Vec<u8> {
        to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    async fn body_json(response: Response) -> Value {
        serde_json::from_slice(&body_bytes(response).await).unwrap()
    }

    fn submit_request(form: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/lissajous")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn submit(app: &TestApp, form: &str) -> String {
        let response = send(app, submit_request(form)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let id = json["jobID"].as_str().unwrap().to_string();
        assert_eq!(
            json["status"],
            format!("Job started, check status with /lissajous/status/{}", id)
        );
        id
    }

    async fn poll_until_terminal(app: &TestApp, id: &str) -> Value {
        let poll = async {
            loop {
                let response = send(app, get(&format!("/lissajous/status/{}", id))).await;
                assert_eq!(response.status(), StatusCode::OK);
                let json = body_json(response).await;
                if json["status"] == "complete" || json["status"] == "error" {
                    return json;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        };
        tokio::time::timeout(Duration::from_secs(30), poll)
            .await
            .expect("job should reach a terminal status")
    }

    #[tokio::test]
    async fn test_health() {
        let app = app();
        let response = send(&app, get("/health")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_bytes(response).await, b"OK");
    }

    #[tokio::test]
    async fn test_render_round_trip() {
        let app = app();
        let id = submit(
            &app,
            "cycles=1&res=0.1&size=4&frames=4&bgColor=%23000000&fgColor=%23ffffff",
        )
        .await;

        let status = poll_until_terminal(&app, &id).await;
        assert_eq!(status, serde_json::json!({ "status": "complete" }));

        let response = send(&app, get(&format!("/lissajous/result?id={}", id))).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/webp");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=waveform.webp"
        );
        assert_eq!(body_bytes(response).await, testing::FAKE_WEBP);

        let response = send(&app, get(&format!("/lissajous/result?id={}", id))).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = send(&app, get(&format!("/lissajous/status/{}", id))).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_first_poll_is_pending_or_progress() {
        let app = app_with(BlockingEncoder, true);
        let id = submit(&app, "cycles=1&res=0.1&size=2&frames=1").await;

        let response = send(&app, get(&format!("/lissajous/status/{}", id))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let status = json["status"].as_str().unwrap();
        assert!(
            status == "pending" || status.starts_with("generated frame") || status.starts_with("encoding"),
            "unexpected status {status}"
        );

        let request = Request::builder()
            .method("DELETE")
            .uri(format!("/lissajous/{}", id))
            .body(Body::empty())
            .unwrap();
        assert_eq!(send(&app, request).await.status(), StatusCode::ACCEPTED);

        let status = poll_until_terminal(&app, &id).await;
        assert_eq!(
            status,
            serde_json::json!({ "status": "error", "error": "job was cancelled" })
        );

        let request = Request::builder()
            .method("DELETE")
            .uri(format!("/lissajous/{}", id))
            .body(Body::empty())
            .unwrap();
        assert_eq!(send(&app, request).await.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_invalid_color_is_rejected() {
        let app = app();
        let response = send(&app, submit_request("fgColor=not-a-color")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert!(
            json["error"].as_str().unwrap().starts_with("Invalid fgColor"),
            "unexpected error {json}"
        );
    }

    #[tokio::test]
    async fn test_out_of_range_frame_rate_is_rejected() {
        let app = app();
        let response = send(&app, submit_request("frames=500")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert!(json["error"].as_str().unwrap().contains("frame rate"));
    }

    #[tokio::test]
    async fn test_wrong_content_type() {
        let app = app();
        let request = Request::builder()
            .method("POST")
            .uri("/lissajous")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .unwrap();
        let response = send(&app, request).await;
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        let json = body_json(response).await;
        assert!(
            json["error"].as_str().unwrap().contains("application/x-www-form-urlencoded"),
            "unexpected error {json}"
        );
    }

    #[tokio::test]
    async fn test_undecodable_form_is_json_error() {
        let app = app();
        let response = send(&app, submit_request("size=2&size=3")).await;
        assert!(response.status().is_client_error());
        let json = body_json(response).await;
        assert!(json["error"].is_string(), "unexpected body {json}");
    }

    #[tokio::test]
    async fn test_unavailable_encoder() {
        let app = app_with(FakeEncoder, false);
        let response = send(&app, submit_request("frames=10")).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_unknown_and_malformed_ids() {
        let app = app();
        let unknown = lissajous_core::domain::job::JobId::new();

        let response = send(&app, get(&format!("/lissajous/status/{}", unknown))).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body_json(response).await["error"].is_string());

        let response = send(&app, get("/lissajous/status/not-a-uuid")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = send(&app, get(&format!("/lissajous/result?id={}", unknown))).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = send(&app, get("/lissajous/result")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_result_before_completion() {
        let app = app_with(BlockingEncoder, true);
        let id = submit(&app, "cycles=1&res=0.1&size=2&frames=1").await;

        let response = send(&app, get(&format!("/lissajous/result?id={}", id))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let request = Request::builder()
            .method("DELETE")
            .uri(format!("/lissajous/{}", id))
            .body(Body::empty())
            .unwrap();
        send(&app, request).await;
        poll_until_terminal(&app, &id).await;
    }

    #[tokio::test]
    async fn test_static_files() {
        let app = app();

        let response = send(&app, get("/")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_bytes(response).await, b"<html>demo</html>");

        let response = send(&app, get("/static/demo.js")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_bytes(response).await, b"// demo");
    }
}
