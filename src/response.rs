//! Outgoing HTTP response sink.
//!
//! Handlers never build a response value and return it. They write into the
//! [`ResponseWriter`] they are handed, the same writer every middleware in
//! the chain sees. This is what lets a middleware write before *and* after
//! the rest of the chain runs.

use bytes::{Bytes, BytesMut};
use http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use http::{HeaderMap, HeaderValue, StatusCode};
use http_body_util::Full;
use tracing::warn;

/// Accumulates the status, headers and body produced by a handler chain.
///
/// ```rust
/// use chainmux::ResponseWriter;
/// use http::StatusCode;
///
/// let mut w = ResponseWriter::new();
/// w.write_header(StatusCode::CREATED);
/// w.write_str("made it\n");
/// let res = w.into_response();
/// assert_eq!(res.status(), StatusCode::CREATED);
/// ```
#[derive(Debug, Default)]
pub struct ResponseWriter {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: BytesMut,
}

impl ResponseWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Headers to be sent. Changes made after the status line is written
    /// are still sent; the transport only serialises once the chain returns.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Sets the response status. Only the first call takes effect.
    pub fn write_header(&mut self, status: StatusCode) {
        match self.status {
            None => self.status = Some(status),
            Some(current) => warn!(
                current = current.as_u16(),
                ignored = status.as_u16(),
                "superfluous write_header call"
            ),
        }
    }

    /// Appends to the body, implying `200 OK` if no status was written yet.
    pub fn write(&mut self, data: &[u8]) {
        if self.status.is_none() {
            self.status = Some(StatusCode::OK);
        }
        self.body.extend_from_slice(data);
    }

    pub fn write_str(&mut self, s: &str) {
        self.write(s.as_bytes());
    }

    /// The status written so far, if any.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Everything written to the body so far.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Whether the status line has been committed.
    pub fn is_written(&self) -> bool {
        self.status.is_some()
    }

    /// Finishes the response. A chain that wrote nothing yields an empty
    /// `200 OK`.
    pub fn into_response(self) -> http::Response<Full<Bytes>> {
        let mut headers = self.headers;
        if !self.body.is_empty() && !headers.contains_key(CONTENT_TYPE) {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));
        }
        headers.insert(CONTENT_LENGTH, HeaderValue::from(self.body.len()));

        let mut res = http::Response::new(Full::new(self.body.freeze()));
        *res.status_mut() = self.status.unwrap_or(StatusCode::OK);
        *res.headers_mut() = headers;
        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_status_wins() {
        let mut w = ResponseWriter::new();
        w.write_header(StatusCode::METHOD_NOT_ALLOWED);
        w.write_header(StatusCode::OK);
        assert_eq!(w.status(), Some(StatusCode::METHOD_NOT_ALLOWED));
    }

    #[test]
    fn write_implies_ok() {
        let mut w = ResponseWriter::new();
        w.write_str("hi");
        w.write_header(StatusCode::NOT_FOUND);
        let res = w.into_response();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()[CONTENT_LENGTH], "2");
        assert_eq!(res.headers()[CONTENT_TYPE], "text/plain; charset=utf-8");
    }

    #[test]
    fn explicit_content_type_is_kept() {
        let mut w = ResponseWriter::new();
        w.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        w.write(br#"{"ok":true}"#);
        assert_eq!(w.into_response().headers()[CONTENT_TYPE], "application/json");
    }

    #[test]
    fn empty_chain_is_ok_and_empty() {
        let res = ResponseWriter::new().into_response();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()[CONTENT_LENGTH], "0");
        assert!(!res.headers().contains_key(CONTENT_TYPE));
    }
}
