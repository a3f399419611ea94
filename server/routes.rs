use std::io::Cursor;
use tiny_http::{Header, Method, Request, Response, StatusCode};

use crate::handlers;
use crate::state::SharedState;

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

/// Headers every response carries so browser front-ends on any origin can call us.
fn cors_headers() -> Vec<Header> {
    vec![
        Header::from_bytes(b"Access-Control-Allow-Origin", b"*").unwrap(),
        Header::from_bytes(b"Access-Control-Allow-Methods", b"*").unwrap(),
        Header::from_bytes(b"Access-Control-Allow-Headers", b"*").unwrap(),
    ]
}

pub fn json_response(status: u16, body: String) -> Response<Cursor<Vec<u8>>> {
    let bytes = body.into_bytes();
    let len = bytes.len();
    let mut headers = cors_headers();
    headers.push(Header::from_bytes(b"Content-Type", b"application/json").unwrap());
    Response::new(StatusCode(status), headers, Cursor::new(bytes), Some(len), None)
}

/// `{"error": message}` with the given status.
pub fn json_error(status: u16, message: &str) -> Response<Cursor<Vec<u8>>> {
    json_response(status, serde_json::json!({ "error": message }).to_string())
}

pub fn preflight() -> Response<Cursor<Vec<u8>>> {
    Response::new(StatusCode(204), cors_headers(), Cursor::new(Vec::new()), Some(0), None)
}

pub fn not_found() -> Response<Cursor<Vec<u8>>> {
    json_error(404, "not found")
}

// ---------------------------------------------------------------------------
// Request dispatcher
// ---------------------------------------------------------------------------

/// Dispatches incoming requests to the appropriate handler.
///
/// Handlers receive a `&mut Request` so that the dispatcher retains ownership
/// and can call `request.respond(response)` at the end.
pub fn dispatch(mut request: Request, state: SharedState) {
    let method = request.method().clone();
    let url = request.url().to_owned();
    let path = url.split('?').next().unwrap_or("").to_owned();

    let response = match (&method, path.as_str()) {
        (Method::Options, _) => preflight(),
        (Method::Post, "/predict") => handlers::predict::handle(&mut request, &state),
        _ => not_found(),
    };

    log::debug!("{} {} -> {}", method, path, response.status_code().0);
    let _ = request.respond(response);
}
