//! Response construction and wire serialization.

use crate::{
    arena::FieldArena,
    http::types::{Header, StatusCode},
};
use std::{cell::RefCell, io::Write, rc::Rc};

// Reusable buffer policy, applied to both the response body and the
// serializer's wire buffer.
const DEFAULT_CAPACITY: usize = 1024;
const MAX_CAPACITY: usize = 8 * 1024;

/// HTTP response under construction by a handler.
///
/// Instances are created by the server and passed to handlers; a handler sets
/// the status, optional headers and the body:
///
/// ```
/// use fast_service::{EndpointTable, Method, StatusCode};
///
/// let table = EndpointTable::builder()
///     .route("/", Method::Get, |_req, resp| {
///         resp.status(StatusCode::Ok)
///             .header("content-type", "application/json")
///             .body(r#"{"status": "OK"}"#);
///     })
///     .build()
///     .unwrap();
/// ```
///
/// Every response closes the connection: `connection: close` and
/// `content-length` are emitted by the server and must not be set by
/// handlers. The status defaults to `200 OK`.
///
/// Header fields are copied into the owning worker's field arena, the same
/// region that backs the request's fields.
#[derive(Debug)]
pub struct Response {
    status: StatusCode,
    headers: Vec<Header>,
    body: String,
    keep_alive: bool,
    arena: Rc<RefCell<FieldArena>>,
}

impl Response {
    #[inline(always)]
    pub(crate) fn new(arena: Rc<RefCell<FieldArena>>) -> Self {
        Self {
            status: StatusCode::Ok,
            headers: Vec::new(),
            body: String::with_capacity(DEFAULT_CAPACITY),
            keep_alive: false,
            arena,
        }
    }

    /// Clears all arena-backed fields. Must run before the worker resets its
    /// arena.
    #[inline(always)]
    pub(crate) fn reset(&mut self) {
        self.status = StatusCode::Ok;
        self.headers.clear();
        self.keep_alive = false;

        if self.body.capacity() > MAX_CAPACITY {
            self.body = String::with_capacity(DEFAULT_CAPACITY);
        } else {
            self.body.clear();
        }
    }

    /// Forces the keep-alive flag off and finalises the response for
    /// serialization. One request per connection is a design invariant, so
    /// this always closes.
    #[inline(always)]
    pub(crate) fn prepare_payload(&mut self) {
        self.keep_alive = false;
    }

    #[inline(always)]
    pub(crate) const fn is_keep_alive(&self) -> bool {
        self.keep_alive
    }
}

// Public API
impl Response {
    /// Sets the HTTP status code. Defaults to `200 OK` when never called.
    #[inline]
    pub fn status(&mut self, status: StatusCode) -> &mut Self {
        self.status = status;
        self
    }

    /// Adds a header to the response.
    ///
    /// Do not add `content-length` or `connection`: both are emitted by the
    /// server itself.
    #[inline]
    pub fn header(&mut self, name: &str, value: &str) -> &mut Self {
        let header = {
            let mut arena = self.arena.borrow_mut();
            Header {
                name: arena.alloc_str(name),
                value: arena.alloc_str(value),
            }
        };

        self.headers.push(header);
        self
    }

    /// Replaces the response body.
    #[inline]
    pub fn body<B: AsRef<str>>(&mut self, body: B) -> &mut Self {
        self.body.clear();
        self.body.push_str(body.as_ref());
        self
    }

    /// Direct access to the body buffer, for handlers that stream into it.
    #[inline(always)]
    pub fn body_mut(&mut self) -> &mut String {
        &mut self.body
    }

    #[inline(always)]
    pub fn status_code(&self) -> StatusCode {
        self.status
    }

    #[inline(always)]
    pub fn headers(&self) -> &[Header] {
        &self.headers
    }
}

/// Renders a [`Response`] to wire bytes.
///
/// Owns a reusable buffer so that serialization allocates nothing once the
/// worker is warm.
#[derive(Debug)]
pub(crate) struct Serializer {
    buffer: Vec<u8>,
}

impl Serializer {
    #[inline(always)]
    pub(crate) fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(DEFAULT_CAPACITY),
        }
    }

    /// Renders the status line, headers, the forced `connection: close`, the
    /// computed `content-length` and the body. Returns the wire bytes.
    pub(crate) fn serialize(&mut self, response: &Response) -> &[u8] {
        self.buffer.clear();

        self.buffer.extend_from_slice(response.status.first_line());

        for header in &response.headers {
            self.buffer.extend_from_slice(header.name.as_bytes());
            self.buffer.extend_from_slice(b": ");
            self.buffer.extend_from_slice(header.value.as_bytes());
            self.buffer.extend_from_slice(b"\r\n");
        }

        debug_assert!(!response.is_keep_alive());
        self.buffer.extend_from_slice(b"connection: close\r\n");

        self.buffer.extend_from_slice(b"content-length: ");
        // io::Write on Vec<u8> is infallible.
        let _ = write!(self.buffer, "{}", response.body.len());
        self.buffer.extend_from_slice(b"\r\n\r\n");

        self.buffer.extend_from_slice(response.body.as_bytes());

        &self.buffer
    }

    #[inline(always)]
    pub(crate) fn reset(&mut self) {
        if self.buffer.capacity() > MAX_CAPACITY {
            self.buffer = Vec::with_capacity(DEFAULT_CAPACITY);
        } else {
            self.buffer.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::BLOCK_SIZE;
    use std::str::from_utf8;

    fn response() -> Response {
        Response::new(Rc::new(RefCell::new(FieldArena::new(BLOCK_SIZE))))
    }

    #[test]
    fn serializes_status_headers_and_body() {
        let mut resp = response();
        resp.status(StatusCode::Ok)
            .header("content-type", "application/json")
            .body(r#"{"status": "OK"}"#);
        resp.prepare_payload();

        let mut serializer = Serializer::new();
        let wire = from_utf8(serializer.serialize(&resp)).unwrap();

        assert_eq!(
            wire,
            "HTTP/1.1 200 OK\r\n\
             content-type: application/json\r\n\
             connection: close\r\n\
             content-length: 16\r\n\
             \r\n\
             {\"status\": \"OK\"}"
        );
    }

    #[test]
    fn default_response_is_empty_200() {
        let mut resp = response();
        resp.prepare_payload();

        let mut serializer = Serializer::new();
        let wire = from_utf8(serializer.serialize(&resp)).unwrap();

        assert_eq!(
            wire,
            "HTTP/1.1 200 OK\r\nconnection: close\r\ncontent-length: 0\r\n\r\n"
        );
    }

    #[test]
    fn route_miss_payload() {
        let mut resp = response();
        resp.status(StatusCode::BadRequest)
            .body(r#"{ "error": "url cannot be resolved" }"#);
        resp.prepare_payload();

        let mut serializer = Serializer::new();
        let wire = from_utf8(serializer.serialize(&resp)).unwrap();

        assert!(wire.starts_with("HTTP/1.1 400 Bad Request\r\n"));
        assert!(wire.contains("connection: close\r\n"));
        assert!(wire.contains("content-length: 38\r\n"));
        assert!(wire.ends_with(r#"{ "error": "url cannot be resolved" }"#));
    }

    #[test]
    fn reset_clears_previous_response() {
        let mut resp = response();
        resp.status(StatusCode::NotFound)
            .header("x-request-id", "abc")
            .body("gone");

        resp.reset();
        resp.prepare_payload();

        assert_eq!(resp.status_code(), StatusCode::Ok);
        assert!(resp.headers().is_empty());

        let mut serializer = Serializer::new();
        let wire = from_utf8(serializer.serialize(&resp)).unwrap();
        assert!(wire.contains("content-length: 0\r\n"));
    }

    #[test]
    fn body_mut_appends() {
        let mut resp = response();
        resp.body_mut().push_str("hello, ");
        resp.body_mut().push_str("world");
        resp.prepare_payload();

        let mut serializer = Serializer::new();
        let wire = from_utf8(serializer.serialize(&resp)).unwrap();
        assert!(wire.ends_with("hello, world"));
        assert!(wire.contains("content-length: 12\r\n"));
    }
}
