//! Outgoing response type and the [`IntoResponse`] conversion trait.
//!
//! Build a [`Response`] in your handler and return it. The dispatch adapter
//! converts it to the wire representation; handlers never touch hyper types.

use bytes::Bytes;
use http_body_util::Full;

/// An outgoing HTTP response.
///
/// # Shortcuts (200 OK)
///
/// ```rust
/// use arbor::Response;
///
/// Response::json(br#"{"id":1}"#.to_vec());
/// Response::text("hello");
/// Response::html("<p>hello</p>");
/// Response::status(204);
/// Response::redirect(303, "/widgets/1");
/// ```
///
/// # Builder (custom status or headers)
///
/// ```rust
/// use arbor::Response;
///
/// Response::builder()
///     .status(201)
///     .header("location", "/widgets/42")
///     .json(br#"{"id":42}"#.to_vec());
/// ```
pub struct Response {
    body: Vec<u8>,
    headers: Vec<(String, String)>,
    status: u16,
}

impl Response {
    /// `200 OK` — `application/json`. Pass bytes straight from your
    /// serialiser, e.g. `serde_json::to_vec(&value)?`.
    pub fn json(body: Vec<u8>) -> Self {
        Self::with_content_type("application/json", body)
    }

    /// `200 OK` — `text/plain; charset=utf-8`.
    pub fn text(body: impl Into<String>) -> Self {
        Self::with_content_type("text/plain; charset=utf-8", body.into().into_bytes())
    }

    /// `200 OK` — `text/html; charset=utf-8`. What rendered templates become.
    pub fn html(body: impl Into<String>) -> Self {
        Self::with_content_type("text/html; charset=utf-8", body.into().into_bytes())
    }

    /// Response with no body.
    pub fn status(code: u16) -> Self {
        Self { body: Vec::new(), headers: Vec::new(), status: code }
    }

    /// Redirect with the given 3xx code.
    pub fn redirect(code: u16, location: &str) -> Self {
        Self {
            body: Vec::new(),
            headers: vec![("location".to_owned(), location.to_owned())],
            status: code,
        }
    }

    /// Builder for responses needing a custom status or extra headers.
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder { headers: Vec::new(), status: 200 }
    }

    fn with_content_type(content_type: &str, body: Vec<u8>) -> Self {
        Self {
            body,
            headers: vec![("content-type".to_owned(), content_type.to_owned())],
            status: 200,
        }
    }

    pub fn status_code(&self) -> u16 {
        self.status
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Converts into the hyper wire representation.
    pub(crate) fn into_http(self) -> http::Response<Full<Bytes>> {
        let mut builder = http::Response::builder().status(self.status);
        for (name, value) in &self.headers {
            builder = builder.header(name, value);
        }
        builder
            .body(Full::new(Bytes::from(self.body)))
            .unwrap_or_else(|_| {
                // only reachable with a malformed header pair
                http::Response::builder()
                    .status(500)
                    .body(Full::new(Bytes::new()))
                    .expect("empty 500 response is always valid")
            })
    }
}

/// Conversion into an HTTP [`Response`].
///
/// Implement on your own types to return them directly from handlers.
pub trait IntoResponse {
    fn into_response(self) -> Response;
}

impl IntoResponse for Response {
    fn into_response(self) -> Response {
        self
    }
}

impl IntoResponse for &'static str {
    fn into_response(self) -> Response {
        Response::text(self)
    }
}

impl IntoResponse for String {
    fn into_response(self) -> Response {
        Response::text(self)
    }
}

/// Return a bare status code from a handler: `return 204`.
impl IntoResponse for u16 {
    fn into_response(self) -> Response {
        Response::status(self)
    }
}

/// Fluent builder for [`Response`], obtained via [`Response::builder`].
pub struct ResponseBuilder {
    headers: Vec<(String, String)>,
    status: u16,
}

impl ResponseBuilder {
    pub fn status(mut self, code: u16) -> Self {
        self.status = code;
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    /// Terminate with a JSON body.
    pub fn json(self, body: Vec<u8>) -> Response {
        self.finish("application/json", body)
    }

    /// Terminate with a plain-text body.
    pub fn text(self, body: impl Into<String>) -> Response {
        self.finish("text/plain; charset=utf-8", body.into().into_bytes())
    }

    /// Terminate with an HTML body.
    pub fn html(self, body: impl Into<String>) -> Response {
        self.finish("text/html; charset=utf-8", body.into().into_bytes())
    }

    /// Terminate with no body.
    pub fn no_body(self) -> Response {
        Response { body: Vec::new(), headers: self.headers, status: self.status }
    }

    fn finish(self, content_type: &str, body: Vec<u8>) -> Response {
        let mut headers = vec![("content-type".to_owned(), content_type.to_owned())];
        headers.extend(self.headers);
        Response { body, headers, status: self.status }
    }
}
