//! Incoming HTTP request type.

use std::collections::HashMap;
use std::net::SocketAddr;

use bytes::Bytes;
use http_body_util::{BodyExt, LengthLimitError, Limited};

use crate::method::Method;

pub(crate) type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// An incoming request with its body fully buffered.
///
/// Built by the server from a hyper request, or directly with
/// [`Request::new`] when driving a [`Router`](crate::Router) in tests.
#[derive(Debug)]
pub struct Request {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) body: Bytes,
    pub(crate) params: HashMap<String, String>,
    pub(crate) peer: Option<SocketAddr>,
    pub(crate) over_limit: bool,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: Vec::new(),
            body: Bytes::new(),
            params: HashMap::new(),
            peer: None,
            over_limit: false,
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Buffers a request body of at most `limit` bytes.
    ///
    /// Reading stops as soon as the limit is crossed; the request is then
    /// routed with an empty body and [`body_over_limit`](Request::body_over_limit)
    /// set, so the handler decides how to answer. Other body errors fail.
    pub(crate) async fn from_http<B>(
        req: http::Request<B>,
        method: Method,
        peer: SocketAddr,
        limit: usize,
    ) -> Result<Self, BoxError>
    where
        B: hyper::body::Body,
        B::Error: Into<BoxError>,
    {
        let (parts, body) = req.into_parts();
        let headers = parts.headers.iter()
            .filter_map(|(k, v)| Some((k.as_str().to_owned(), v.to_str().ok()?.to_owned())))
            .collect();
        let (body, over_limit) = match Limited::new(body, limit).collect().await {
            Ok(collected) => (collected.to_bytes(), false),
            Err(e) if e.is::<LengthLimitError>() => (Bytes::new(), true),
            Err(e) => return Err(e),
        };
        Ok(Self {
            method,
            path: parts.uri.path().to_owned(),
            headers,
            body,
            params: HashMap::new(),
            peer: Some(peer),
            over_limit,
        })
    }

    pub fn method(&self) -> Method { self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn body(&self) -> &[u8] { &self.body }
    pub fn peer(&self) -> Option<SocketAddr> { self.peer }

    /// `true` when the body was larger than the router's body limit and was
    /// dropped unread.
    pub fn body_over_limit(&self) -> bool { self.over_limit }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/paste/{id}`, `req.param("id")` on `/paste/abc` returns `Some("abc")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Decodes an `application/x-www-form-urlencoded` body. Later duplicates
    /// of a key win.
    pub fn form(&self) -> HashMap<String, String> {
        form_urlencoded::parse(&self.body).into_owned().collect()
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;
    use std::pin::Pin;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::task::{Context, Poll};

    use http_body_util::Full;
    use hyper::body::{Body, Frame};

    use super::*;

    const CHUNK: usize = 1024;

    /// A body that never ends, counting the bytes it hands out.
    struct Endless(Arc<AtomicUsize>);

    impl Body for Endless {
        type Data = Bytes;
        type Error = Infallible;

        fn poll_frame(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
        ) -> Poll<Option<Result<Frame<Bytes>, Infallible>>> {
            self.0.fetch_add(CHUNK, Ordering::SeqCst);
            Poll::Ready(Some(Ok(Frame::data(Bytes::from(vec![b'a'; CHUNK])))))
        }
    }

    fn peer() -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], 40000))
    }

    #[tokio::test]
    async fn body_within_limit_is_buffered() {
        let req = http::Request::builder()
            .method("POST")
            .uri("/paste/create?ignored=1")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Full::new(Bytes::from_static(b"content=hi")))
            .unwrap();

        let req = Request::from_http(req, Method::Post, peer(), 64).await.unwrap();
        assert_eq!(req.path(), "/paste/create");
        assert_eq!(req.body(), b"content=hi");
        assert_eq!(req.header("Content-Type"), Some("application/x-www-form-urlencoded"));
        assert!(!req.body_over_limit());
    }

    #[tokio::test]
    async fn oversized_body_stops_reading_at_the_limit() {
        let sent = Arc::new(AtomicUsize::new(0));
        let req = http::Request::builder()
            .method("POST")
            .uri("/paste/create")
            .body(Endless(Arc::clone(&sent)))
            .unwrap();

        let limit = 4 * CHUNK;
        let req = Request::from_http(req, Method::Post, peer(), limit).await.unwrap();
        assert!(req.body_over_limit());
        assert!(req.body().is_empty());
        assert!(sent.load(Ordering::SeqCst) <= limit + CHUNK);
    }

    #[test]
    fn decodes_form_bodies() {
        let req = Request::new(Method::Post, "/paste/create")
            .with_body("content=two+words%0Aand%20a%26b&expiration=1_day");
        let form = req.form();
        assert_eq!(form["content"], "two words\nand a&b");
        assert_eq!(form["expiration"], "1_day");
    }

    #[test]
    fn header_lookup_ignores_case() {
        let req = Request::new(Method::Get, "/").with_header("Content-Type", "text/plain");
        assert_eq!(req.header("content-type"), Some("text/plain"));
        assert_eq!(req.header("accept"), None);
    }
}
