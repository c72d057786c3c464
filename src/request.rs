//! Incoming HTTP request type.

use std::collections::HashMap;
use std::net::SocketAddr;

use bytes::Bytes;
use http::Method;
use http_body_util::BodyExt;

use crate::error::Error;

/// An incoming HTTP request with its body fully read.
pub struct Request {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) remote_addr: Option<SocketAddr>,
    pub(crate) body: Bytes,
    pub(crate) params: HashMap<String, String>,
}

impl Request {
    /// Builder for constructing a request in-process, without a socket.
    ///
    /// ```rust
    /// use faultline::Request;
    ///
    /// let req = Request::builder()
    ///     .method(http::Method::POST)
    ///     .path("/__testing__/503")
    ///     .header("x-forwarded-for", "1.2.3.4")
    ///     .body("oops")
    ///     .build();
    /// assert_eq!(req.header("X-Forwarded-For"), Some("1.2.3.4"));
    /// ```
    pub fn builder() -> RequestBuilder {
        RequestBuilder {
            method: Method::GET,
            path: "/".to_owned(),
            headers: Vec::new(),
            remote_addr: None,
            body: Bytes::new(),
        }
    }

    /// Converts a hyper request, collecting the whole body.
    pub(crate) async fn from_hyper(
        req: hyper::Request<hyper::body::Incoming>,
        remote_addr: SocketAddr,
    ) -> Result<Self, Error> {
        let (parts, body) = req.into_parts();
        let body = body.collect().await?.to_bytes();
        let headers = parts.headers.iter()
            .map(|(k, v)| (k.as_str().to_owned(), String::from_utf8_lossy(v.as_bytes()).into_owned()))
            .collect();

        Ok(Self {
            method: parts.method,
            path: decode_path(parts.uri.path()),
            headers,
            remote_addr: Some(remote_addr),
            body,
            params: HashMap::new(),
        })
    }

    pub fn method(&self) -> &Method { &self.method }

    /// The percent-decoded path, without the query string.
    pub fn path(&self) -> &str { &self.path }
    pub fn headers(&self) -> &[(String, String)] { &self.headers }
    pub fn remote_addr(&self) -> Option<SocketAddr> { self.remote_addr }
    pub fn body(&self) -> &Bytes { &self.body }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/users/{id}`, `req.param("id")` on `/users/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}

/// Percent-decodes a request path. A path that does not decode to UTF-8 is
/// kept as received.
fn decode_path(raw: &str) -> String {
    match urlencoding::decode(raw) {
        Ok(path) => path.into_owned(),
        Err(_) => raw.to_owned(),
    }
}

/// Fluent builder for [`Request`]. Defaults to `GET /` with no peer address.
pub struct RequestBuilder {
    method: Method,
    path: String,
    headers: Vec<(String, String)>,
    remote_addr: Option<SocketAddr>,
    body: Bytes,
}

impl RequestBuilder {
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn path(mut self, path: &str) -> Self {
        self.path = path.to_owned();
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    pub fn remote_addr(mut self, addr: SocketAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn build(self) -> Request {
        Request {
            method: self.method,
            path: self.path,
            headers: self.headers,
            remote_addr: self.remote_addr,
            body: self.body,
            params: HashMap::new(),
        }
    }
}
