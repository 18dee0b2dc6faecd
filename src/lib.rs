use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub mod frame;
pub mod startup_checks;
pub mod upload;

#[cfg(any(test, feature = "test-support"))]
#[doc(hidden)]
pub mod test_support;

use frame::FrameOptions;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub app: AppConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub frame: FrameOptions,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Parent directory for per-request scratch directories.
    pub directory: PathBuf,
    pub max_upload_bytes: usize,
    pub processing_timeout_secs: u64,
    pub allowed_origins: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("photo"),
            max_upload_bytes: 25 * 1024 * 1024,
            processing_timeout_secs: 30,
            allowed_origins: vec![
                "http://localhost.tiangolo.com".to_string(),
                "https://localhost.tiangolo.com".to_string(),
                "http://localhost".to_string(),
                "http://localhost:8080".to_string(),
                "http://localhost:3000".to_string(),
            ],
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8000,
            },
            app: AppConfig {
                name: "Photoframe".to_string(),
            },
            upload: UploadConfig::default(),
            frame: FrameOptions::default(),
        }
    }
}

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, StatusCode},
    response::IntoResponse,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
}

async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
}

pub async fn create_app(config: Config) -> Router {
    let body_limit = config.upload.max_upload_bytes;
    let cors = cors_layer(&config.upload.allowed_origins);

    let app_state = AppState {
        config: config.clone(),
    };

    Router::new()
        .route("/image", axum::routing::post(upload::frame_upload_handler))
        .route(
            "/api/metadata",
            axum::routing::post(upload::metadata_handler),
        )
        .route("/health", axum::routing::get(health_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(|request: &axum::http::Request<_>| {
                            let method = request.method();
                            let uri = request.uri();
                            let matched_path = request
                                .extensions()
                                .get::<axum::extract::MatchedPath>()
                                .map(|matched_path| matched_path.as_str());

                            tracing::info_span!(
                                "http_request",
                                method = %method,
                                uri = %uri,
                                matched_path,
                            )
                        })
                        .on_request(|request: &axum::http::Request<_>, _span: &tracing::Span| {
                            let headers = request.headers();
                            let user_agent = headers
                                .get("user-agent")
                                .and_then(|h| h.to_str().ok())
                                .unwrap_or("-");
                            let origin = headers
                                .get("origin")
                                .and_then(|h| h.to_str().ok())
                                .unwrap_or("-");

                            tracing::info!(
                                target: "access_log",
                                method = %request.method(),
                                path = %request.uri().path(),
                                user_agent = %user_agent,
                                origin = %origin,
                                "request"
                            );
                        })
                        .on_response(
                            |response: &axum::http::Response<_>,
                             latency: std::time::Duration,
                             _span: &tracing::Span| {
                                let size = response
                                    .headers()
                                    .get("content-length")
                                    .and_then(|h| h.to_str().ok())
                                    .unwrap_or("-");

                                tracing::info!(
                                    target: "access_log",
                                    status = %response.status(),
                                    size = %size,
                                    latency_ms = %latency.as_millis(),
                                    "response"
                                );
                            },
                        ),
                )
                .layer(cors),
        )
        .with_state(app_state)
}
