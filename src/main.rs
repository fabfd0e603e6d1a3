mod color_utils;
mod config;
mod environment;
mod generator;
mod live_input;
mod live_preview;
mod models;
mod settings;
mod shades;
mod store;
mod stylesheet;

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response, Sse},
    routing::{get, put},
    Json, Router,
};
use futures_util::StreamExt;
use sha2::{Digest, Sha256};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::{debug, info};

// Embed the widget page into the binary
static INDEX_HTML: &str = include_str!("../client/index.html");

use config::STORAGE_KEY;
use environment::LivePage;
use generator::{BackgroundScope, ColorGenerator, GeneratorError};
use live_preview::PreviewChannel;
use models::{GeneratorView, TextInput, ThemeInput};
use settings::Settings;
use shades::ShadeRole;
use store::{FileStore, PreferenceStore};

// Security headers for HTML responses
const CSP: &str = "default-src 'self'; script-src 'self' 'unsafe-inline'; style-src 'self' 'unsafe-inline'; img-src 'self' data:; connect-src 'self'; base-uri 'self'; form-action 'self'";

fn security_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        header::HeaderValue::from_static(CSP),
    );
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        header::HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        header::REFERRER_POLICY,
        header::HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    headers
}

#[derive(Clone)]
struct AppState {
    generator: Arc<RwLock<ColorGenerator<LivePage>>>,
    preview: Arc<PreviewChannel>,
}

impl AppState {
    fn new(store: Box<dyn PreferenceStore>, dark_theme: bool) -> Self {
        let preview = Arc::new(PreviewChannel::new());
        // The slot is read exactly once, here
        let stored = store.get();
        let page = LivePage::new(preview.clone(), store);
        let generator = ColorGenerator::load(page, stored.as_deref(), dark_theme);
        Self {
            generator: Arc::new(RwLock::new(generator)),
            preview,
        }
    }
}

fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/state", get(get_state))
        .route("/api/base-color", put(put_base_color))
        .route("/api/shades/{role}", put(put_shade))
        .route("/api/backgrounds/{scope}", put(put_background))
        .route("/api/theme", put(put_theme))
        .route("/api/preview", get(get_preview))
        .route("/theme.css", get(get_stylesheet))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CACHE_CONTROL,
            header::HeaderValue::from_static("no-cache"),
        ))
        .route("/liveness_check", get(health_check))
        .route("/readiness_check", get(health_check))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
                .expose_headers([header::CONTENT_TYPE, header::ETAG]),
        )
        .with_state(state)
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let settings = Settings::from_env();
    let store = FileStore::new(&settings.data_dir, STORAGE_KEY);
    info!("Theme colors stored at {}", store.path().display());

    let state = AppState::new(Box::new(store), settings.dark_theme);

    let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    info!("Server listening on {}", addr);

    if let Err(e) = axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    info!("Server shut down gracefully");
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down...");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down...");
        }
    }
}

async fn health_check() -> &'static str {
    "OK"
}

async fn index() -> impl IntoResponse {
    (security_headers(), Html(INDEX_HTML))
}

async fn get_state(State(state): State<AppState>) -> Json<GeneratorView> {
    Json(state.generator.read().await.view())
}

async fn put_base_color(
    State(state): State<AppState>,
    Json(input): Json<TextInput>,
) -> Json<GeneratorView> {
    let mut generator = state.generator.write().await;
    generator.set_base_color_input(&input.value);
    Json(generator.view())
}

async fn put_shade(
    Path(role): Path<String>,
    State(state): State<AppState>,
    Json(input): Json<TextInput>,
) -> Result<Json<GeneratorView>, StatusCode> {
    let role: ShadeRole = role.parse().map_err(|_| StatusCode::NOT_FOUND)?;

    let mut generator = state.generator.write().await;
    match generator.set_adjustment_input(role, &input.value) {
        Ok(_) => Ok(Json(generator.view())),
        Err(e @ GeneratorError::NotEditable(_)) => {
            debug!("Rejected shade edit: {}", e);
            Err(StatusCode::BAD_REQUEST)
        }
    }
}

async fn put_background(
    Path(scope): Path<String>,
    State(state): State<AppState>,
    Json(input): Json<TextInput>,
) -> Result<Json<GeneratorView>, StatusCode> {
    let scope: BackgroundScope = scope.parse().map_err(|_| StatusCode::NOT_FOUND)?;

    let mut generator = state.generator.write().await;
    generator.set_background(scope, &input.value);
    Ok(Json(generator.view()))
}

async fn put_theme(
    State(state): State<AppState>,
    Json(input): Json<ThemeInput>,
) -> Json<GeneratorView> {
    let mut generator = state.generator.write().await;
    generator.set_dark_theme(input.dark);
    Json(generator.view())
}

async fn get_preview(State(state): State<AppState>) -> Response {
    let stream = state.preview.subscribe();
    info!("Live preview clients: {}", state.preview.subscriber_count());

    let sse_stream = stream.map(|event| -> Result<axum::response::sse::Event, Infallible> {
        Ok(axum::response::sse::Event::default()
            .event(&event.event_type)
            .data(event.data))
    });

    let sse_response = Sse::new(sse_stream)
        .keep_alive(
            axum::response::sse::KeepAlive::new().interval(std::time::Duration::from_secs(15)),
        )
        .into_response();

    // Prevent proxies from buffering the stream
    let (mut parts, body) = sse_response.into_parts();
    parts
        .headers
        .insert("X-Accel-Buffering", header::HeaderValue::from_static("no"));
    Response::from_parts(parts, body)
}

fn etag_for(body: &str) -> String {
    let digest = Sha256::digest(body.as_bytes());
    let hex: String = digest[..16].iter().map(|b| format!("{:02x}", b)).collect();
    format!("\"{}\"", hex)
}

async fn get_stylesheet(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let css = state.generator.read().await.stylesheet();
    let etag = etag_for(&css);

    let mut response_headers = HeaderMap::new();
    if let Ok(value) = header::HeaderValue::from_str(&etag) {
        response_headers.insert(header::ETAG, value);
    }

    if let Some(if_none_match) = headers.get(header::IF_NONE_MATCH) {
        if if_none_match.as_bytes() == etag.as_bytes() {
            return (StatusCode::NOT_MODIFIED, response_headers).into_response();
        }
    }

    response_headers.insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("text/css; charset=utf-8"),
    );
    (response_headers, css).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use axum::body::Body;
    use axum::http::{Method, Request};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn state_with(store: MemoryStore) -> AppState {
        AppState::new(Box::new(store), false)
    }

    async fn send(state: &AppState, method: Method, uri: &str, body: Option<Value>) -> Response {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(body) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(body.to_string())
            }
            None => Body::empty(),
        };
        app(state.clone())
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_initial_state_persisted_and_previewed() {
        let store = MemoryStore::default();
        let state = state_with(store.clone());

        let response = send(&state, Method::GET, "/api/state", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let view = json_body(response).await;
        assert_eq!(view["baseColor"], "#25c2a0");
        assert_eq!(view["shades"].as_array().unwrap().len(), 7);
        assert_eq!(view["shades"][0]["role"], "lightest");
        assert_eq!(view["shades"][3]["lightRating"], "Fail");
        assert_eq!(view["shades"][3]["darkRating"], "AAA");

        assert!(store.get().is_some());
        assert_eq!(
            state.preview.property("--ifm-background-color").as_deref(),
            Some("#ffffff")
        );
        assert_eq!(
            state.preview.property("--ifm-color-primary-dark").as_deref(),
            Some("#21af90")
        );
    }

    #[tokio::test]
    async fn test_starts_from_stored_slot() {
        let store = MemoryStore::with_text(r##"{"baseColor":"#3578e5"}"##);
        let state = state_with(store);
        let view = json_body(send(&state, Method::GET, "/api/state", None).await).await;
        assert_eq!(view["baseColor"], "#3578e5");
        assert_eq!(view["baseColorInput"], "#3578e5");
    }

    #[tokio::test]
    async fn test_base_color_edit() {
        let store = MemoryStore::default();
        let state = state_with(store.clone());

        let response = send(
            &state,
            Method::PUT,
            "/api/base-color",
            Some(json!({"value": "3578e5"})),
        )
        .await;
        let view = json_body(response).await;
        assert_eq!(view["baseColorInput"], "#3578e5");
        assert_eq!(view["baseColor"], "#3578e5");
        assert_eq!(
            state.preview.property("--ifm-color-primary").as_deref(),
            Some("#3578e5")
        );
        let stored: Value = serde_json::from_str(&store.get().unwrap()).unwrap();
        assert_eq!(stored["baseColor"], "#3578e5");

        // Half-typed text is echoed but computation holds
        let response = send(
            &state,
            Method::PUT,
            "/api/base-color",
            Some(json!({"value": "#35"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let view = json_body(response).await;
        assert_eq!(view["baseColorInput"], "#35");
        assert_eq!(view["baseColor"], "#3578e5");
        assert_eq!(
            state.preview.property("--ifm-color-primary").as_deref(),
            Some("#3578e5")
        );
    }

    #[tokio::test]
    async fn test_shade_edits() {
        let state = state_with(MemoryStore::default());

        let response = send(
            &state,
            Method::PUT,
            "/api/shades/darkest",
            Some(json!({"value": "40"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let view = json_body(response).await;
        assert_eq!(view["shades"][6]["adjustment"], 0.4);
        assert_eq!(view["shades"][6]["adjustmentInput"], "40");

        let response = send(
            &state,
            Method::PUT,
            "/api/shades/primary",
            Some(json!({"value": "40"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = send(
            &state,
            Method::PUT,
            "/api/shades/mauve",
            Some(json!({"value": "40"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_background_and_theme() {
        let state = state_with(MemoryStore::default());

        let response = send(
            &state,
            Method::PUT,
            "/api/backgrounds/dark",
            Some(json!({"value": "#000000"})),
        )
        .await;
        let view = json_body(response).await;
        assert_eq!(view["darkBackground"], "#000000");
        let css = view["stylesheet"].as_str().unwrap();
        assert_eq!(css.matches("[data-theme='dark']").count(), 1);
        assert_eq!(
            state.preview.property("--ifm-background-color").as_deref(),
            Some("#ffffff")
        );

        let response = send(&state, Method::PUT, "/api/theme", Some(json!({"dark": true}))).await;
        assert_eq!(json_body(response).await["darkTheme"], true);
        assert_eq!(
            state.preview.property("--ifm-background-color").as_deref(),
            Some("#000000")
        );

        let response = send(
            &state,
            Method::PUT,
            "/api/backgrounds/sepia",
            Some(json!({"value": "#000000"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_stylesheet_etag() {
        let state = state_with(MemoryStore::default());

        let response = send(&state, Method::GET, "/theme.css", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/css; charset=utf-8"
        );
        let etag = response.headers()[header::ETAG].clone();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert!(std::str::from_utf8(&body)
            .unwrap()
            .contains("--ifm-color-primary: #25c2a0;"));

        let request = Request::builder()
            .uri("/theme.css")
            .header(header::IF_NONE_MATCH, etag)
            .body(Body::empty())
            .unwrap();
        let response = app(state.clone()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
    }

    #[tokio::test]
    async fn test_index_and_health() {
        let state = state_with(MemoryStore::default());

        let response = send(&state, Method::GET, "/", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response
            .headers()
            .contains_key(header::CONTENT_SECURITY_POLICY));

        let response = send(&state, Method::GET, "/liveness_check", None).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}
