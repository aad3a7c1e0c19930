//! Lissajous API Handlers
//!
//! HTTP endpoints for submitting render jobs, polling their status and
//! downloading the finished animation.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::{
    Form, Json,
    extract::{ConnectInfo, FromRequestParts, Path, Query, State, rejection::FormRejection},
    http::{StatusCode, header, request::Parts},
    response::IntoResponse,
};
use lissajous_core::domain::job::JobId;
use lissajous_core::dto::job::{JobStatusView, RenderForm, SubmitResponse};
use serde::Deserialize;

use crate::api::error::{ApiError, ApiResult};
use crate::service::job_service::JobService;

pub const WEBP_CONTENT_TYPE: &str = "image/webp";
pub const RESULT_DISPOSITION: &str = "attachment; filename=waveform.webp";

/// Address of the requesting client, as reported by a proxy when present
#[derive(Debug, Clone)]
pub struct ClientIp(pub String);

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let forwarded = parts
            .headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        let ip = forwarded
            .or_else(|| {
                parts
                    .extensions
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip().to_string())
            })
            .unwrap_or_else(|| "unknown".to_string());

        Ok(ClientIp(ip))
    }
}

#[derive(Debug, Deserialize)]
pub struct ResultQuery {
    pub id: Option<String>,
}

fn parse_job_id(raw: &str) -> ApiResult<JobId> {
    raw.parse()
        .map_err(|_| ApiError::NotFound(format!("job {} not found", raw)))
}

/// POST /lissajous
/// Submit a new render job
pub async fn submit_job(
    State(service): State<JobService>,
    ClientIp(client): ClientIp,
    form: Result<Form<RenderForm>, FormRejection>,
) -> ApiResult<Json<SubmitResponse>> {
    tracing::info!("Render requested by {}", client);

    let Form(form) = form.map_err(|e| {
        tracing::debug!("Unreadable render request from {}: {}", client, e);
        ApiError::from(e)
    })?;

    let id = service.submit(form).map_err(|e| {
        tracing::debug!("Rejected render request from {}: {}", client, e);
        ApiError::from(e)
    })?;

    Ok(Json(SubmitResponse::started(id)))
}

/// GET /lissajous/status/{id}
/// Poll the status of a job
pub async fn get_status(
    State(service): State<JobService>,
    Path(id): Path<String>,
) -> ApiResult<Json<JobStatusView>> {
    let id = parse_job_id(&id)?;
    let view = service.poll(id)?;

    tracing::debug!("Status of job {}: {}", id, view.status);

    Ok(Json(view))
}

/// GET /lissajous/result?id=<id>
/// Download the finished animation; succeeds once per job
pub async fn get_result(
    State(service): State<JobService>,
    ClientIp(client): ClientIp,
    Query(query): Query<ResultQuery>,
) -> ApiResult<impl IntoResponse> {
    let raw = query
        .id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::BadRequest("missing job id".to_string()))?;
    let id = parse_job_id(&raw)?;

    let bytes = service.fetch_result(id)?;
    tracing::info!("Serving result of job {} to {}", id, client);

    Ok((
        [
            (header::CONTENT_TYPE, WEBP_CONTENT_TYPE),
            (header::CONTENT_DISPOSITION, RESULT_DISPOSITION),
        ],
        bytes,
    ))
}

/// DELETE /lissajous/{id}
/// Request cancellation of a running job
pub async fn cancel_job(
    State(service): State<JobService>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_job_id(&id)?;
    service.cancel(id)?;

    Ok(StatusCode::ACCEPTED)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, HeaderValue, Request};

    async fn client_ip(headers: HeaderMap, peer: Option<SocketAddr>) -> String {
        let mut request = Request::builder().uri("/").body(()).unwrap();
        *request.headers_mut() = headers;
        if let Some(peer) = peer {
            request.extensions_mut().insert(ConnectInfo(peer));
        }
        let (mut parts, _) = request.into_parts();
        let ClientIp(ip) = ClientIp::from_request_parts(&mut parts, &()).await.unwrap();
        ip
    }

    #[tokio::test]
    async fn test_client_ip_prefers_forwarded_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        let peer = "127.0.0.1:5555".parse().ok();
        assert_eq!(client_ip(headers, peer).await, "203.0.113.7");
    }

    #[tokio::test]
    async fn test_client_ip_falls_back_to_peer() {
        let peer = "192.0.2.10:4000".parse().ok();
        assert_eq!(client_ip(HeaderMap::new(), peer).await, "192.0.2.10");
        assert_eq!(client_ip(HeaderMap::new(), None).await, "unknown");
    }
}
