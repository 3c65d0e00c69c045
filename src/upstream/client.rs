//! Inference service client with a hard deadline.
//!
//! # Responsibilities
//! - POST the validated payload to `<base_url>/infer`
//! - Bound the whole exchange (connect, send, body read) by one deadline
//! - Translate every transport or response failure into [`UpstreamError`]
//!
//! Exactly one call per invocation. No retries, no circuit breaking.

use std::time::Duration;

use axum::http::StatusCode;
use futures_util::future::BoxFuture;
use serde_json::Value;
use thiserror::Error;
use tokio::time;
use url::Url;

use crate::config::UpstreamConfig;
use crate::pipeline::validator::AssistanceRequest;

/// Failure of a single upstream call.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// No response within the deadline.
    #[error("AI service error: timeout of {}ms exceeded", .0.as_millis())]
    Timeout(Duration),

    /// Connection refused, DNS failure, broken connection.
    #[error("AI service error: {0}")]
    Transport(#[source] reqwest::Error),

    /// Upstream answered with a non-2xx status.
    #[error("AI service error: request failed with status code {status}")]
    Status { status: u16 },

    /// 2xx response whose body is not JSON.
    #[error("AI service error: invalid response body: {0}")]
    InvalidBody(String),

    /// The client could not be constructed.
    #[error("AI service client setup failed: {0}")]
    Setup(String),
}

impl UpstreamError {
    /// Caller-facing error kind; identical for every upstream failure.
    pub fn kind(&self) -> &'static str {
        "upstream_error"
    }

    /// Finer label for logs and metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            UpstreamError::Timeout(_) => "timeout",
            UpstreamError::Transport(_) => "transport",
            UpstreamError::Status { .. } => "status",
            UpstreamError::InvalidBody(_) => "invalid_body",
            UpstreamError::Setup(_) => "setup",
        }
    }

    /// Status reported to the caller: the upstream's own status when it
    /// sent one, 504 on deadline expiry, else 500.
    pub fn http_status(&self) -> StatusCode {
        match self {
            UpstreamError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            UpstreamError::Status { status } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            UpstreamError::Transport(_) | UpstreamError::InvalidBody(_) | UpstreamError::Setup(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// The inference call as seen by the pipeline.
pub trait Inference: Send + Sync {
    fn infer<'a>(&'a self, request: &'a AssistanceRequest) -> BoxFuture<'a, Result<Value, UpstreamError>>;
}

/// Client for the inference service.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    infer_url: Url,
    timeout: Duration,
}

impl UpstreamClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self, UpstreamError> {
        let infer_url = infer_url(&config.base_url)?;
        let http = reqwest::Client::builder()
            .user_agent(concat!("assist-gateway/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| UpstreamError::Setup(e.to_string()))?;

        Ok(Self {
            http,
            infer_url,
            timeout: config.timeout(),
        })
    }

    pub fn infer_url(&self) -> &Url {
        &self.infer_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Call `POST /infer` once. The payload is returned uninterpreted.
    pub async fn invoke(&self, request: &AssistanceRequest) -> Result<Value, UpstreamError> {
        match time::timeout(self.timeout, self.exchange(request)).await {
            Ok(result) => result,
            Err(_) => Err(UpstreamError::Timeout(self.timeout)),
        }
    }

    async fn exchange(&self, request: &AssistanceRequest) -> Result<Value, UpstreamError> {
        let response = self
            .http
            .post(self.infer_url.clone())
            .json(request)
            .send()
            .await
            .map_err(UpstreamError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(UpstreamError::Transport)?;
        serde_json::from_slice(&body).map_err(|e| UpstreamError::InvalidBody(e.to_string()))
    }
}

impl Inference for UpstreamClient {
    fn infer<'a>(&'a self, request: &'a AssistanceRequest) -> BoxFuture<'a, Result<Value, UpstreamError>> {
        Box::pin(self.invoke(request))
    }
}

/// `<base>/infer`, keeping any path prefix of the base URL.
fn infer_url(base_url: &str) -> Result<Url, UpstreamError> {
    let joined = format!("{}/infer", base_url.trim_end_matches('/'));
    Url::parse(&joined).map_err(|e| UpstreamError::Setup(format!("invalid base URL '{}': {}", base_url, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::json;
    use std::net::SocketAddr;
    use tokio::net::TcpListener;

    async fn serve(router: Router) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        addr
    }

    fn client_for(addr: SocketAddr, timeout_ms: u64) -> UpstreamClient {
        UpstreamClient::new(&UpstreamConfig {
            base_url: format!("http://{}", addr),
            timeout_ms,
        })
        .unwrap()
    }

    fn request() -> AssistanceRequest {
        AssistanceRequest {
            context: "Photoshop layers panel".into(),
            question: "How do I create a new layer?".into(),
        }
    }

    #[test]
    fn test_infer_url_keeps_prefix() {
        assert_eq!(infer_url("http://ai:5000").unwrap().as_str(), "http://ai:5000/infer");
        assert_eq!(infer_url("http://ai:5000/v1/").unwrap().as_str(), "http://ai:5000/v1/infer");
        assert!(matches!(infer_url("::"), Err(UpstreamError::Setup(_))));
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(UpstreamError::Status { status: 503 }.http_status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(UpstreamError::Status { status: 404 }.http_status(), StatusCode::NOT_FOUND);
        assert_eq!(
            UpstreamError::Timeout(Duration::from_secs(10)).http_status(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            UpstreamError::InvalidBody("eof".into()).http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(UpstreamError::Status { status: 503 }.kind(), "upstream_error");
    }

    #[test]
    fn test_error_messages_carry_reason() {
        let err = UpstreamError::Status { status: 502 };
        assert_eq!(err.to_string(), "AI service error: request failed with status code 502");
        let err = UpstreamError::Timeout(Duration::from_secs(10));
        assert_eq!(err.to_string(), "AI service error: timeout of 10000ms exceeded");
    }

    #[tokio::test]
    async fn test_forwards_payload_and_returns_body() {
        let addr = serve(Router::new().route(
            "/infer",
            post(|Json(body): Json<Value>| async move {
                Json(json!({ "answer": format!("You asked: {}", body["question"].as_str().unwrap_or("")) }))
            }),
        ))
        .await;

        let payload = client_for(addr, 10_000).invoke(&request()).await.unwrap();
        assert_eq!(payload, json!({ "answer": "You asked: How do I create a new layer?" }));
    }

    #[tokio::test]
    async fn test_non_success_status_is_failure() {
        let addr = serve(Router::new().route(
            "/infer",
            post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "model not loaded") }),
        ))
        .await;

        let err = client_for(addr, 10_000).invoke(&request()).await.unwrap_err();
        assert!(matches!(err, UpstreamError::Status { status: 503 }));
        assert_eq!(err.http_status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_deadline_is_enforced() {
        let addr = serve(Router::new().route(
            "/infer",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(json!({ "answer": "too late" }))
            }),
        ))
        .await;

        let started = std::time::Instant::now();
        let err = client_for(addr, 150).invoke(&request()).await.unwrap_err();
        assert!(matches!(err, UpstreamError::Timeout(_)));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client_for(addr, 2_000).invoke(&request()).await.unwrap_err();
        assert!(matches!(err, UpstreamError::Transport(_)));
        assert_eq!(err.http_status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.to_string().starts_with("AI service error: "));
    }

    #[tokio::test]
    async fn test_unparseable_success_body() {
        let addr = serve(Router::new().route("/infer", post(|| async { "plain text" }))).await;

        let err = client_for(addr, 10_000).invoke(&request()).await.unwrap_err();
        assert!(matches!(err, UpstreamError::InvalidBody(_)));
    }
}
