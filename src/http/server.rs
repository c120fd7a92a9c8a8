//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Serve static files from the content root
//! - Accept HMR WebSocket clients
//! - Advertise the client-facing HMR endpoint
//! - Wire up middleware (tracing, no-store caching, integration headers)

use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, uri::Authority, HeaderMap, HeaderName, HeaderValue, StatusCode},
    middleware,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{services::ServeDir, set_header::SetResponseHeaderLayer, trace::TraceLayer};

use crate::config::{Configuration, HmrProtocol};
use crate::hmr::{HmrEndpoint, HmrHub, HMR_PATH};
use crate::http::response::{apply_extra_headers, ExtraHeaders};
use crate::http::websocket::hmr_handler;
use crate::integration::BuildContext;
use crate::lifecycle::Shutdown;

/// JSON description of the HMR endpoint.
pub const HMR_INFO_PATH: &str = "/__devhost/hmr";

/// Errors building the dev server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid response header '{name}' contributed by an integration")]
    InvalidHeader { name: String },
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Configuration>,
    pub hub: HmrHub,
    pub shutdown: Shutdown,
}

/// Body of `GET /__devhost/hmr`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HmrInfo {
    pub protocol: HmrProtocol,
    pub host: String,
    pub client_port: u16,
    pub path: &'static str,
    pub url: String,
}

/// Dev server for a single site.
pub struct DevServer {
    router: Router,
    config: Arc<Configuration>,
}

impl DevServer {
    /// Create a dev server.
    ///
    /// `root` is the directory served for non-HMR paths; without it those
    /// paths answer 404.
    pub fn new(
        config: Arc<Configuration>,
        build: &BuildContext,
        root: Option<&Path>,
        hub: HmrHub,
        shutdown: Shutdown,
    ) -> Result<Self, ServerError> {
        let extra_headers = Arc::new(convert_headers(build.response_headers())?);
        let state = AppState {
            config: config.clone(),
            hub,
            shutdown,
        };

        let router = Self::build_router(state, root, extra_headers);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState, root: Option<&Path>, extra_headers: ExtraHeaders) -> Router {
        let router = Router::new()
            .route(HMR_PATH, get(hmr_handler))
            .route(HMR_INFO_PATH, get(hmr_info_handler))
            .with_state(state);

        let router = match root {
            Some(root) => router.fallback_service(ServeDir::new(root)),
            None => router.fallback(not_found),
        };

        router
            .layer(middleware::from_fn_with_state(extra_headers, apply_extra_headers))
            .layer(SetResponseHeaderLayer::overriding(
                header::CACHE_CONTROL,
                HeaderValue::from_static("no-store"),
            ))
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server, accepting connections until `stop` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut stop: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            site = %self.config.site_origin(),
            "Dev server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = stop.recv().await;
            })
            .await?;

        tracing::info!("Dev server stopped");
        Ok(())
    }

    /// The router, for driving the server without a socket.
    pub fn into_router(self) -> Router {
        self.router
    }
}

fn convert_headers(
    headers: &[(String, String)],
) -> Result<Vec<(HeaderName, HeaderValue)>, ServerError> {
    headers
        .iter()
        .map(|(name, value)| {
            let invalid = || ServerError::InvalidHeader { name: name.clone() };
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
            let header_value = HeaderValue::from_str(value).map_err(|_| invalid())?;
            Ok((header_name, header_value))
        })
        .collect()
}

/// Describe where clients should open the HMR WebSocket.
async fn hmr_info_handler(State(state): State<AppState>, headers: HeaderMap) -> Json<HmrInfo> {
    let host = request_host(&headers)
        .or_else(|| state.config.site_url().host_str().map(str::to_string))
        .unwrap_or_else(|| state.config.server().host().to_string());

    let endpoint = HmrEndpoint::new(state.config.dev_proxy(), &host);
    tracing::debug!(endpoint = %endpoint, "HMR endpoint requested");

    Json(HmrInfo {
        protocol: endpoint.protocol,
        url: format!("{endpoint}{HMR_PATH}"),
        host: endpoint.host,
        client_port: endpoint.port,
        path: HMR_PATH,
    })
}

/// Host the client used to reach us, without the port.
fn request_host(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::HOST)?.to_str().ok()?;
    let authority: Authority = value.parse().ok()?;
    Some(authority.host().to_string())
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not found")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use crate::config::{load_str, Format};

    const CONFIG: &str = r#"
        site = "https://example.com"

        [server]
        host = "0.0.0.0"
        port = 5000

        [devProxy]
        clientPort = 443
        protocol = "wss"
    "#;

    fn router(build: &BuildContext) -> Router {
        let config = Arc::new(load_str(CONFIG, Format::Toml).unwrap());
        DevServer::new(config, build, None, HmrHub::new(), Shutdown::new())
            .unwrap()
            .into_router()
    }

    fn build() -> BuildContext {
        BuildContext::new(url::Url::parse("https://example.com").unwrap())
    }

    #[tokio::test]
    async fn test_hmr_info_uses_request_host() {
        let response = router(&build())
            .oneshot(
                Request::get(HMR_INFO_PATH)
                    .header(header::HOST, "dev.example.org:5000")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        let info: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(info["url"], "wss://dev.example.org:443/__hmr");
        assert_eq!(info["clientPort"], 443);
        assert_eq!(info["protocol"], "wss");
    }

    #[tokio::test]
    async fn test_hmr_info_falls_back_to_site_host() {
        let response = router(&build())
            .oneshot(Request::get(HMR_INFO_PATH).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        let info: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(info["host"], "example.com");
    }

    #[tokio::test]
    async fn test_no_root_is_not_found_with_headers() {
        let mut build = build();
        build.add_response_header("X-Frame-Options", "DENY");
        let response = router(&build)
            .oneshot(Request::get("/index.html").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()["x-frame-options"], "DENY");
        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");
    }

    #[test]
    fn test_invalid_integration_header_is_rejected() {
        let config = Arc::new(load_str(CONFIG, Format::Toml).unwrap());
        let mut build = build();
        build.add_response_header("bad header", "x");
        let result = DevServer::new(config, &build, None, HmrHub::new(), Shutdown::new());
        assert!(matches!(result, Err(ServerError::InvalidHeader { .. })));
    }
}
