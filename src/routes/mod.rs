// Routes module - assembles the route table and its middleware
// Each sub-module handles a group of endpoints; item, user and model
// handlers live in `crate::handlers`.

pub mod files;
pub mod request_meta;

use axum::{
    body::Body,
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, StatusCode, Uri},
    middleware,
    response::{IntoResponse, Json, Redirect, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

use crate::app_state::SharedState;
use crate::config::Settings;
use crate::handlers::*;
use crate::openapi::openapi_json;

pub use files::*;
pub use request_meta::*;

/// Every registered path, used to decide whether a slash-toggled path exists
const ROUTE_PATTERNS: &[&str] = &[
    "/",
    "/openapi.json",
    "/cookies/",
    "/headers/",
    "/items/",
    "/items/:item_id",
    "/users/me",
    "/users/:user_id",
    "/users/:user_id/items/:item_id",
    "/model/:model_name",
    "/files/",
    "/files/*file_path",
    "/uploadfile/",
];

/// Build the application router with all endpoints and layers
pub fn build_router(state: SharedState, settings: &Settings) -> Router {
    let cors = if settings.cors_allow_any {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
    };

    Router::new()
        // ===== ROOT =====
        .route("/", get(root))
        .route("/openapi.json", get(openapi_json))

        // ===== REQUEST METADATA =====
        .route("/cookies/", get(read_cookies))
        .route("/headers/", get(read_headers))

        // ===== ITEMS =====
        .route("/items/", get(list_items).post(create_item))
        .route("/items/:item_id", get(read_item))

        // ===== USERS =====
        // Static `/users/me` outranks `/users/:user_id` in the router
        .route("/users/me", get(read_user_me))
        .route("/users/:user_id", get(read_user))
        .route("/users/:user_id/items/:item_id", get(read_user_item))

        // ===== MODELS =====
        .route("/model/:model_name", get(get_model))

        // ===== FILES =====
        .route("/files/*file_path", get(read_file))
        .route("/files/", get(read_file_root).post(create_file))
        .route("/uploadfile/", post(create_upload_file))

        .fallback(not_found)
        .layer(middleware::map_response(method_not_allowed_body))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(settings.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Unmatched path: 307 to the slash-toggled path when that one is routed, else 404
async fn not_found(uri: Uri) -> Response {
    match slash_redirect(&uri) {
        Some(location) => Redirect::temporary(&location).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({ "detail": "Not Found" }))).into_response(),
    }
}

fn slash_redirect(uri: &Uri) -> Option<String> {
    let path = uri.path();
    if path == "/" {
        return None;
    }
    let toggled = match path.strip_suffix('/') {
        Some(trimmed) => trimmed.to_string(),
        None => format!("{path}/"),
    };
    if !ROUTE_PATTERNS.iter().any(|pattern| route_matches(pattern, &toggled)) {
        return None;
    }
    Some(match uri.query() {
        Some(query) => format!("{toggled}?{query}"),
        None => toggled,
    })
}

/// Segment-wise match using the router's `:param` and `*rest` syntax
fn route_matches(pattern: &str, path: &str) -> bool {
    let mut pattern_segments = pattern.split('/');
    let mut path_segments = path.split('/');
    loop {
        match (pattern_segments.next(), path_segments.next()) {
            (Some(p), Some(s)) if p.starts_with('*') => {
                return !s.is_empty() || path_segments.next().is_some();
            }
            (Some(p), Some(s)) if p.starts_with(':') => {
                if s.is_empty() {
                    return false;
                }
            }
            (Some(p), Some(s)) => {
                if p != s {
                    return false;
                }
            }
            (None, None) => return true,
            _ => return false,
        }
    }
}

/// axum answers 405 with an empty body; give it the same JSON shape as 404
async fn method_not_allowed_body(response: Response) -> Response {
    if response.status() != StatusCode::METHOD_NOT_ALLOWED {
        return response;
    }

    let (mut parts, _) = response.into_parts();
    parts.headers.remove(header::CONTENT_LENGTH);
    parts.headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    let body = json!({ "detail": "Method Not Allowed" }).to_string();
    Response::from_parts(parts, Body::from(body))
}
