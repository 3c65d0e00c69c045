//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, compression, CORS, security headers)
//! - Build the assistance pipeline from configuration
//! - Bind server to listener and serve until shutdown
//! - Run the rate window sweeper alongside the server

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderValue, Method},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tracing::Instrument;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, CorsLayer},
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{Environment, GatewayConfig};
use crate::http::health;
use crate::http::request::{request_id, UuidRequestId, X_REQUEST_ID};
use crate::observability::{LatencyRecorder, PrometheusLatency};
use crate::pipeline::Pipeline;
use crate::security::headers::with_security_headers;
use crate::security::rate_limit::{run_sweeper, FixedWindowLimiter};
use crate::upstream::{UpstreamClient, UpstreamError};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Pipeline,
    pub metrics: Option<PrometheusHandle>,
    pub environment: Environment,
    pub started_at: Instant,
}

/// HTTP server for the assistance gateway.
pub struct HttpServer {
    config: GatewayConfig,
    limiter: Arc<FixedWindowLimiter>,
    upstream: Arc<UpstreamClient>,
    latency: Arc<dyn LatencyRecorder>,
    metrics: Option<PrometheusHandle>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: GatewayConfig) -> Result<Self, UpstreamError> {
        let limiter = Arc::new(FixedWindowLimiter::from_config(&config.rate_limit));
        let upstream = Arc::new(UpstreamClient::new(&config.upstream)?);

        Ok(Self {
            config,
            limiter,
            upstream,
            latency: Arc::new(PrometheusLatency),
            metrics: None,
        })
    }

    /// Serve `/metrics` from this handle.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// Replace the latency sink (defaults to the global `metrics` recorder).
    pub fn with_latency_recorder(mut self, latency: Arc<dyn LatencyRecorder>) -> Self {
        self.latency = latency;
        self
    }

    /// Build the Axum router with all middleware layers.
    pub fn router(&self) -> Router {
        let pipeline = Pipeline::new(
            self.limiter.clone(),
            self.upstream.clone(),
            self.latency.clone(),
            self.config.listener.max_body_bytes,
        );
        let state = AppState {
            pipeline,
            metrics: self.metrics.clone(),
            environment: self.config.environment,
            started_at: Instant::now(),
        };
        build_router(&self.config, state)
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.upstream.infer_url(),
            environment = %self.config.environment,
            "HTTP server starting"
        );

        tokio::spawn(run_sweeper(
            self.limiter.clone(),
            Duration::from_secs(self.config.rate_limit.sweep_interval_secs),
            shutdown.resubscribe(),
        ));

        let app = self.router().into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

/// The body size limit is not a layer here: the pipeline enforces it after
/// admission control so oversized requests are still rate limited.
#[allow(deprecated)]
fn build_router(config: &GatewayConfig, state: AppState) -> Router {
    let router = Router::new()
        .route("/api/assistance", post(assistance_handler))
        .route("/health", get(health::health))
        .route("/metrics", get(health::metrics))
        .with_state(state)
        .layer(cors_layer(&config.listener.cors_origins));

    let router = if config.security.enable_headers {
        with_security_headers(router)
    } else {
        router
    };

    router.layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, UuidRequestId))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(CompressionLayer::new())
            .layer(TimeoutLayer::new(Duration::from_secs(config.listener.request_timeout_secs))),
    )
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, X_REQUEST_ID])
        .expose_headers([X_REQUEST_ID])
}

/// `POST /api/assistance`.
async fn assistance_handler(State(state): State<AppState>, request: Request) -> impl IntoResponse {
    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let span = tracing::info_span!(
        "assistance",
        request_id = %request_id(request.headers()),
        client = %client,
    );

    state
        .pipeline
        .handle(&client, request)
        .instrument(span)
        .await
}
