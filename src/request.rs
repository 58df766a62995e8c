//! Incoming HTTP request type.

use std::fmt;
use std::net::SocketAddr;

use bytes::Bytes;
use http::{HeaderMap, Method, Uri, Version};
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Empty, Full};
use hyper::body::Body;

/// Boxed error carried by a request body stream.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// An incoming HTTP request.
///
/// The head (method, URI, headers) is parsed up front; the body stays a
/// stream until someone asks for it with [`Request::read_body`].
pub struct Request {
    method: Method,
    uri: Uri,
    version: Version,
    headers: HeaderMap,
    remote_addr: Option<SocketAddr>,
    body: UnsyncBoxBody<Bytes, BoxError>,
}

impl Request {
    /// Wraps a request received by the transport.
    pub fn from_http<B>(req: http::Request<B>, remote_addr: Option<SocketAddr>) -> Self
    where
        B: Body<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        let (parts, body) = req.into_parts();
        Self {
            method: parts.method,
            uri: parts.uri,
            version: parts.version,
            headers: parts.headers,
            remote_addr,
            body: body.map_err(Into::into).boxed_unsync(),
        }
    }

    /// Builds a request with an already-buffered body. Handy for tests and
    /// for invoking a composed handler without a socket.
    ///
    /// Takes a parsed [`Uri`]; use [`Uri::from_static`] or `str::parse` and
    /// handle the error there.
    pub fn new(method: Method, uri: Uri, body: impl Into<Bytes>) -> Self {
        let body = Full::new(body.into()).map_err(|never| match never {}).boxed_unsync();
        Self {
            method,
            uri,
            version: Version::HTTP_11,
            headers: HeaderMap::new(),
            remote_addr: None,
            body,
        }
    }

    pub fn method(&self) -> &Method { &self.method }
    pub fn uri(&self) -> &Uri { &self.uri }
    pub fn version(&self) -> Version { self.version }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn headers_mut(&mut self) -> &mut HeaderMap { &mut self.headers }
    pub fn remote_addr(&self) -> Option<SocketAddr> { self.remote_addr }

    pub fn path(&self) -> &str { self.uri.path() }

    /// Case-insensitive header lookup. Returns `None` for non-UTF-8 values.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// The `Host` header, falling back to the URI authority (HTTP/2).
    pub fn host(&self) -> &str {
        self.header("host")
            .or_else(|| self.uri.authority().map(|a| a.as_str()))
            .unwrap_or("")
    }

    /// The request target as sent on the request line: path plus query.
    pub fn request_uri(&self) -> &str {
        self.uri.path_and_query().map_or("/", |p| p.as_str())
    }

    /// Declared body length from the `content-length` header, if any.
    pub fn content_length(&self) -> Option<u64> {
        self.header("content-length").and_then(|v| v.trim().parse().ok())
    }

    /// Reads the entire body into memory.
    ///
    /// The buffered bytes are put back in place, so handlers further down
    /// the chain can read the same body again. On failure the body is left
    /// empty.
    pub async fn read_body(&mut self) -> Result<Bytes, BoxError> {
        let body = std::mem::replace(&mut self.body, empty_body());
        let bytes = body.collect().await?.to_bytes();
        self.body = Full::new(bytes.clone()).map_err(|never| match never {}).boxed_unsync();
        Ok(bytes)
    }

    /// Replaces the body stream.
    pub fn set_body<B>(&mut self, body: B)
    where
        B: Body<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        self.body = body.map_err(Into::into).boxed_unsync();
    }

    pub fn with_header(mut self, name: http::HeaderName, value: http::HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn with_remote_addr(mut self, addr: SocketAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }
}

fn empty_body() -> UnsyncBoxBody<Bytes, BoxError> {
    Empty::new().map_err(|never| match never {}).boxed_unsync()
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("uri", &self.uri)
            .field("version", &self.version)
            .field("headers", &self.headers)
            .field("remote_addr", &self.remote_addr)
            .finish_non_exhaustive()
    }
}
