use std::io::Cursor;
use tiny_http::{Header, Method, Request, Response, StatusCode};
use tracing::debug;

use crate::state::SharedPipeline;
use crate::handlers;

pub type HttpResponse = Response<Cursor<Vec<u8>>>;

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

fn content_type(value: &str) -> Vec<Header> {
    Header::from_bytes(&b"Content-Type"[..], value.as_bytes())
        .into_iter()
        .collect()
}

fn bytes_response(status: u16, mime: &str, bytes: Vec<u8>) -> HttpResponse {
    let len = bytes.len();
    Response::new(
        StatusCode(status),
        content_type(mime),
        Cursor::new(bytes),
        Some(len),
        None,
    )
}

pub fn html_response(body: &str) -> HttpResponse {
    bytes_response(200, "text/html; charset=utf-8", body.as_bytes().to_vec())
}

/// Serializes `value` as the JSON body. A value that fails to serialize
/// turns into a plain 500.
pub fn json_response<T: serde::Serialize>(status: u16, value: &T) -> HttpResponse {
    match serde_json::to_vec(value) {
        Ok(bytes) => bytes_response(status, "application/json", bytes),
        Err(e) => bytes_response(500, "text/plain", format!("500 {}", e).into_bytes()),
    }
}

pub fn not_found() -> HttpResponse {
    bytes_response(404, "text/plain", b"404 Not Found".to_vec())
}

// ---------------------------------------------------------------------------
// Request dispatcher
// ---------------------------------------------------------------------------

/// Routes one request and writes its response. Runs on the request's own
/// thread.
pub fn dispatch(mut request: Request, pipeline: SharedPipeline) {
    let method = request.method().clone();
    let path = request.url()
        .split('?')
        .next()
        .unwrap_or("")
        .to_owned();
    debug!(%method, %path, "request");

    let response = match (method, path.as_str()) {
        (Method::Get,  "/")        => handlers::index::handle_get(),
        (Method::Get,  "/health")  => handlers::health::handle_get(&pipeline),
        (Method::Post, "/predict") => handlers::predict::handle_post(&mut request, &pipeline),
        _ => not_found(),
    };

    let _ = request.respond(response);
}
