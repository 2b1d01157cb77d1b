use crate::{
    arena::FieldArena,
    errors::ErrorKind,
    http::types::{self, Header, Method},
};
use memchr::memmem;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Maximum size of the request head (request line + headers). Mirrors the
/// fixed per-worker read buffer; a head that does not fit is a read error.
pub(crate) const MAX_HEAD_SIZE: usize = 8 * 1024;

/// Hard cap on the request body. Exceeding it is a read error: the
/// connection is closed without a reply.
pub(crate) const MAX_BODY_SIZE: usize = 1024 * 1024;

const HEADER_CAPACITY: usize = 32;

/// A parsed HTTP/1.1 request.
///
/// Header names, header values and the raw target are backed by the owning
/// worker's field arena: after the first few requests warm the worker up,
/// parsing a request performs no heap allocation.
///
/// # Input data requirements
///
/// - The request line and headers must be UTF-8 (validated with `simdutf8`);
///   the body is raw bytes.
/// - Line terminators must be exactly `CRLF`.
/// - A body requires an explicit `Content-Length`. `Transfer-Encoding`
///   (chunked or otherwise) is not supported and is treated as a read error.
/// - Request lines at `HTTP/1.0` or `HTTP/1.1` are accepted; the response is
///   always `HTTP/1.1` and always closes the connection.
#[derive(Debug)]
pub struct Request {
    method: Method,
    target: &'static str,
    headers: Vec<Header>,
    content_length: Option<usize>,
    body: Vec<u8>,
}

impl Request {
    #[inline(always)]
    pub(crate) fn new() -> Self {
        Request {
            method: Method::Get,
            target: "/",
            headers: Vec::with_capacity(HEADER_CAPACITY),
            content_length: None,
            body: Vec::new(),
        }
    }

    /// Clears all arena-backed fields. Must run before the worker resets its
    /// arena; the buffers keep their capacity for the next request.
    #[inline(always)]
    pub(crate) fn reset(&mut self) {
        self.method = Method::Get;
        self.target = "/";
        self.headers.clear();
        self.content_length = None;
        self.body.clear();
    }
}

// Public API
impl Request {
    #[inline(always)]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// The raw request target, including any query string.
    #[inline(always)]
    pub const fn target(&self) -> &str {
        self.target
    }

    /// The target up to (but not including) the first `?`. This is the
    /// component routing matches against.
    #[inline]
    pub fn path(&self) -> &str {
        match self.target.find('?') {
            Some(index) => &self.target[..index],
            None => self.target,
        }
    }

    /// The raw query string after the first `?`, if any. Never affects
    /// routing.
    #[inline]
    pub fn query(&self) -> Option<&str> {
        self.target
            .find('?')
            .map(|index| &self.target[index + 1..])
    }

    /// All header fields in arrival order.
    #[inline(always)]
    pub fn headers(&self) -> &[Header] {
        &self.headers
    }

    /// Returns the first header value with case-insensitive name matching
    /// (per [RFC 7230](https://tools.ietf.org/html/rfc7230#section-3.2)).
    /// Uses linear search.
    #[inline(always)]
    pub fn header_str(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value)
    }

    /// Returns the first header value with case-insensitive name matching
    /// (per [RFC 7230](https://tools.ietf.org/html/rfc7230#section-3.2)).
    /// Uses linear search.
    #[inline(always)]
    pub fn header(&self, name: &[u8]) -> Option<&[u8]> {
        self.headers
            .iter()
            .find(|h| h.name.as_bytes().eq_ignore_ascii_case(name))
            .map(|h| h.value.as_bytes())
    }

    /// Returns the value of the `Content-Length` header if present.
    #[inline(always)]
    pub const fn content_length(&self) -> Option<usize> {
        self.content_length
    }

    /// The request body. Empty when no `Content-Length` was sent.
    #[inline(always)]
    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

/// Per-worker request reader.
///
/// Owns the fixed head buffer. The cycle per request is
/// [`fill`](Parser::fill) (read until the blank line),
/// [`parse`](Parser::parse) (decode into arena-backed fields) and
/// [`read_body`](Parser::read_body) (drain the declared body).
#[derive(Debug)]
pub(crate) struct Parser {
    head: Box<[u8]>,
    head_len: usize,
}

impl Parser {
    #[inline(always)]
    pub(crate) fn new() -> Self {
        Parser {
            head: vec![0; MAX_HEAD_SIZE].into_boxed_slice(),
            head_len: 0,
        }
    }

    #[inline(always)]
    pub(crate) fn reset(&mut self) {
        self.head_len = 0;
    }

    /// Reads from the stream until the head terminator (`\r\n\r\n`) arrives.
    /// Returns the index just past the terminator. Bytes beyond it are the
    /// start of the body and stay in the buffer for [`read_body`].
    pub(crate) async fn fill<R>(&mut self, stream: &mut R) -> Result<usize, ErrorKind>
    where
        R: AsyncRead + Unpin,
    {
        let finder = memmem::Finder::new(b"\r\n\r\n");
        let mut scanned = 0;

        loop {
            let read = stream.read(&mut self.head[self.head_len..]).await?;
            if read == 0 {
                return Err(ErrorKind::UnexpectedEof);
            }
            self.head_len += read;

            if let Some(position) = finder.find(&self.head[scanned..self.head_len]) {
                return Ok(scanned + position + 4);
            }

            if self.head_len == self.head.len() {
                return Err(ErrorKind::HeadTooLarge);
            }

            // The terminator may straddle a read boundary.
            scanned = self.head_len.saturating_sub(3);
        }
    }

    /// Decodes the head into `request`, copying every field into the arena.
    pub(crate) fn parse(
        &self,
        arena: &mut FieldArena,
        request: &mut Request,
        head_end: usize,
    ) -> Result<(), ErrorKind> {
        // Drop the trailing blank line; the slice now ends with the CRLF of
        // the last header line.
        let head = simdutf8::basic::from_utf8(&self.head[..head_end - 2])
            .map_err(|_| ErrorKind::InvalidEncoding)?;

        let mut lines = head.split("\r\n");
        let request_line = lines.next().ok_or(ErrorKind::InvalidHeader)?;
        Self::parse_request_line(arena, request, request_line)?;

        for line in lines {
            if line.is_empty() {
                break;
            }
            Self::parse_header_line(arena, request, line)?;
        }

        Ok(())
    }

    #[inline]
    fn parse_request_line(
        arena: &mut FieldArena,
        request: &mut Request,
        line: &str,
    ) -> Result<(), ErrorKind> {
        let mut parts = line.splitn(3, ' ');

        let method = parts.next().ok_or(ErrorKind::InvalidMethod)?;
        request.method = Method::from_bytes(method.as_bytes())?;

        let target = parts.next().ok_or(ErrorKind::InvalidTarget)?;
        if !target.starts_with('/') {
            return Err(ErrorKind::InvalidTarget);
        }
        request.target = arena.alloc_str(target);

        match parts.next() {
            Some("HTTP/1.1" | "HTTP/1.0") => Ok(()),
            _ => Err(ErrorKind::InvalidVersion),
        }
    }

    #[inline]
    fn parse_header_line(
        arena: &mut FieldArena,
        request: &mut Request,
        line: &str,
    ) -> Result<(), ErrorKind> {
        let (name, value) = line.split_once(':').ok_or(ErrorKind::InvalidHeader)?;

        if name.is_empty() || name.contains([' ', '\t']) {
            return Err(ErrorKind::InvalidHeader);
        }
        let value = value.trim();

        if name.eq_ignore_ascii_case("content-length") {
            if request.content_length.is_some() {
                return Err(ErrorKind::InvalidContentLength);
            }

            let length =
                types::slice_to_usize(value.as_bytes()).ok_or(ErrorKind::InvalidContentLength)?;
            if length > MAX_BODY_SIZE {
                return Err(ErrorKind::BodyTooLarge);
            }
            request.content_length = Some(length);
        } else if name.eq_ignore_ascii_case("transfer-encoding") {
            return Err(ErrorKind::UnsupportedEncoding);
        }

        request.headers.push(Header {
            name: arena.alloc_str(name),
            value: arena.alloc_str(value),
        });

        Ok(())
    }

    /// Drains the declared body into `request.body`, starting with whatever
    /// arrived with the head. Anything past `Content-Length` is ignored:
    /// this server never reads a second request from the same socket.
    pub(crate) async fn read_body<R>(
        &self,
        stream: &mut R,
        request: &mut Request,
        head_end: usize,
    ) -> Result<(), ErrorKind>
    where
        R: AsyncRead + Unpin,
    {
        let length = match request.content_length {
            Some(length) if length > 0 => length,
            _ => return Ok(()),
        };

        let leftover = &self.head[head_end..self.head_len];
        let take = leftover.len().min(length);
        request.body.extend_from_slice(&leftover[..take]);

        if request.body.len() < length {
            let filled = request.body.len();
            request.body.resize(length, 0);
            stream.read_exact(&mut request.body[filled..]).await?;
        }

        Ok(())
    }
}
