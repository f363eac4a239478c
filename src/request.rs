//! Incoming request descriptor.
//!
//! The dispatch adapter fills one of these per request; handlers and input
//! bindings read from it. Hosts embedding arbor behind their own transport
//! construct it directly via [`Request::new`] and the `with_*` methods.

use std::collections::HashMap;

use crate::definition::{BindingSource, InputBinding};
use crate::method::Method;
use crate::template::ROLE_ALL;

/// An incoming request, already parsed by the transport.
pub struct Request {
    method: Method,
    path: String,
    params: HashMap<String, String>,
    query: HashMap<String, String>,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
    role: String,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: HashMap::new(),
            query: HashMap::new(),
            headers: Vec::new(),
            body: Vec::new(),
            role: ROLE_ALL.to_owned(),
        }
    }

    pub fn with_query(mut self, query: HashMap<String, String>) -> Self {
        self.query = query;
        self
    }

    pub fn with_headers(mut self, headers: Vec<(String, String)>) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    /// Session role used to pick among role-gated handler specs.
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = role.into();
        self
    }

    pub(crate) fn set_params(&mut self, params: HashMap<String, String>) {
        self.params = params;
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Returns a captured placeholder parameter.
    ///
    /// For a route `/users/:id`, `req.param("id")` on `/users/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    pub fn query(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }

    pub fn query_map(&self) -> &HashMap<String, String> {
        &self.query
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Resolves one declared input binding against this request. `Body`
    /// bindings are satisfied by any non-empty body.
    pub(crate) fn input(&self, binding: &InputBinding) -> Option<String> {
        match binding.source {
            BindingSource::Param => self.param(&binding.name).map(str::to_owned),
            BindingSource::Query => self.query(&binding.name).map(str::to_owned),
            BindingSource::Header => self.header(&binding.name).map(str::to_owned),
            BindingSource::Body => (!self.body.is_empty()).then(String::new),
        }
    }
}

/// Splits a raw query string into key/value pairs. Values keep their raw
/// encoding; arbor does not decode them.
pub(crate) fn parse_query(raw: &str) -> HashMap<String, String> {
    raw.split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((k, v)) => (k.to_owned(), v.to_owned()),
            None => (pair.to_owned(), String::new()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_is_case_insensitive() {
        let req = Request::new(Method::Get, "/")
            .with_headers(vec![("X-Role".to_owned(), "admin".to_owned())]);
        assert_eq!(req.header("x-role"), Some("admin"));
    }

    #[test]
    fn query_string_splits_into_pairs() {
        let query = parse_query("page=2&flag&q=a=b");
        assert_eq!(query["page"], "2");
        assert_eq!(query["flag"], "");
        assert_eq!(query["q"], "a=b");
    }

    #[test]
    fn required_body_binding_needs_a_nonempty_body() {
        let binding = InputBinding {
            name: "payload".to_owned(),
            source: BindingSource::Body,
            required: true,
        };
        let empty = Request::new(Method::Post, "/");
        assert!(empty.input(&binding).is_none());

        let full = Request::new(Method::Post, "/").with_body(b"{}".to_vec());
        assert!(full.input(&binding).is_some());
    }
}
