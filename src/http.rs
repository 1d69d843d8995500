//! HTTP front end.
//!
//! One route, `GET /images/*path`, with optional `w`, `h` and `fit` query
//! parameters. The handler is a thin adapter: it hands the request to
//! [`ImageService::serve`] on a blocking thread and turns the result into a
//! response with `Content-Type`, `Content-Length` and, for resized output,
//! `Cache-Control`.

use crate::service::{ImageQuery, ImageService, ServeError, Served};
use axum::Router;
use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};

impl IntoResponse for ServeError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ServeError::InvalidDimensions(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ServeError::NotFound(_) => (StatusCode::NOT_FOUND, "Not found".to_string()),
            ServeError::Internal(msg) => {
                error!(error = %msg, "Image request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };
        text_response(status, body)
    }
}

fn text_response(status: StatusCode, body: String) -> Response {
    let len = body.len();
    (
        status,
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (header::CONTENT_LENGTH, len.to_string()),
        ],
        body,
    )
        .into_response()
}

fn served_response(served: Served) -> Response {
    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, served.content_type)
        .header(header::CONTENT_LENGTH, served.body.len());
    if let Some(cache_control) = served.cache_control {
        builder = builder.header(header::CACHE_CONTROL, cache_control);
    }
    builder
        .body(Body::from(served.body))
        .unwrap_or_else(|e| ServeError::Internal(e.to_string()).into_response())
}

async fn image_handler(
    State(service): State<Arc<ImageService>>,
    Path(path): Path<String>,
    Query(query): Query<ImageQuery>,
) -> Result<Response, ServeError> {
    let served = tokio::task::spawn_blocking(move || service.serve(&path, &query))
        .await
        .map_err(|e| ServeError::Internal(format!("resize task failed: {e}")))??;
    Ok(served_response(served))
}

/// Router with the image endpoint mounted at `/images`.
pub fn router(service: Arc<ImageService>) -> Router {
    Router::new()
        .route("/images/*path", get(image_handler))
        .with_state(service)
}

/// Bind `addr` and serve until the process is stopped.
pub async fn serve(service: Arc<ImageService>, addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "Image server listening");
    axum::serve(listener, router(service)).await
}
