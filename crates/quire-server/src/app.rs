//! Router construction.
//!
//! A single fallback handler serves files from the build output through
//! [`resolve`](crate::resolver::resolve).

use std::sync::Arc;

use axum::Router;
use axum::extract::{Request, State};
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use mime_guess::{Mime, mime};
use quire_renderer::escape_html;
use tower::{ServiceBuilder, ServiceExt};
use tower_http::services::ServeFile;

use crate::middleware;
use crate::resolver::resolve;
use crate::state::AppState;

/// Create the application router.
pub(crate) fn create_router(state: Arc<AppState>) -> Router {
    let dev = state.dev;
    let router = Router::new()
        .fallback(serve_file)
        .with_state(state)
        .layer(ServiceBuilder::new().layer(middleware::content_type_options_layer()));

    if dev {
        router.layer(middleware::no_store_layer())
    } else {
        router
    }
}

async fn serve_file(State(state): State<Arc<AppState>>, request: Request) -> Response {
    if request.method() != Method::GET && request.method() != Method::HEAD {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }

    let path = request.uri().path().to_owned();
    let target = state.target.get();
    let Some(resolved) = resolve(&path, &target.out_dir, &target.base_path, target.pretty_urls).await
    else {
        return not_found(&path);
    };

    let mime = content_type(&resolved.relative_path);
    let Ok(response) = ServeFile::new_with_mime(&resolved.absolute_path, &mime)
        .oneshot(request)
        .await;
    if response.status() == StatusCode::NOT_FOUND {
        // The file can vanish between resolve and open while a rebuild runs.
        tracing::warn!(path = %resolved.absolute_path.display(), "File disappeared before it was served");
        return not_found(&path);
    }
    response.into_response()
}

/// Content type for an output file, with a UTF-8 charset on text types.
fn content_type(relative_path: &str) -> Mime {
    let mime = mime_guess::from_path(relative_path).first_or_octet_stream();
    if mime.type_() == mime::TEXT && mime.get_param(mime::CHARSET).is_none() {
        format!("{mime}; charset=utf-8").parse().unwrap_or(mime)
    } else {
        mime
    }
}

fn not_found(path: &str) -> Response {
    let html = format!(
        "<!doctype html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>404 Not Found</title>\n</head>\n<body>\n<main>\n<h1>Page not found</h1>\n\
         <p>No static file exists for <code>{}</code>.</p>\n</main>\n</body>\n</html>\n",
        escape_html(path)
    );
    (
        StatusCode::NOT_FOUND,
        [
            (CONTENT_TYPE, "text/html; charset=utf-8"),
            (CACHE_CONTROL, "no-store"),
        ],
        html,
    )
        .into_response()
}
