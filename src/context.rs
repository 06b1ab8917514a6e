//! # Request Context Module
//!
//! The mutable per-request state the HTTP collaborator hands to the
//! dispatcher: method, path, query, merged path parameters, the body slot,
//! and the status/header slots the core writes. The context is owned by
//! exactly one in-flight request; the dispatcher threads it by value
//! through the route worker and restores it when the handler replies.

use http::Method;
use serde_json::Value;
use smallvec::SmallVec;
use std::sync::Arc;

use crate::ids::RequestId;
use crate::router::ParamVec;

/// Maximum inline headers before heap allocation. Most responses set only
/// a handful of headers.
pub const MAX_INLINE_HEADERS: usize = 16;

/// Stack-allocated header storage.
///
/// Header names use `Arc<str>`: names repeat across requests
/// (`Allow`, `Content-Type`, …), so cloning is a refcount bump. Values are
/// per-request `String`s.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// Per-request context consumed and mutated by the dispatcher.
///
/// Construct one per incoming request, dispatch it, then read the mutated
/// `status`, `headers`, and `body` back out to build the HTTP response.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Correlation id; generated if the collaborator does not supply one
    pub request_id: RequestId,
    /// Request method (`Default`: GET)
    pub method: Method,
    /// Request path, without the query string
    pub path: String,
    /// Parsed query parameters
    pub query: ParamVec,
    /// Path parameters; the dispatcher merges match extractions in with
    /// last-write-wins semantics
    pub params: ParamVec,
    /// Body slot: request body in, response body out
    pub body: Option<Value>,
    /// Response status, once something decided it
    pub status: Option<u16>,
    /// Response headers (the core itself only sets `Allow`)
    pub headers: HeaderVec,
}

impl RequestContext {
    /// Create a context for `method` and `path`. A query string embedded in
    /// `path` is split off and parsed.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        let raw: String = path.into();
        let (path, query) = match raw.find('?') {
            Some(pos) => (raw[..pos].to_string(), parse_query(&raw[pos + 1..])),
            None => (raw, ParamVec::new()),
        };
        Self {
            request_id: RequestId::new(),
            method,
            path,
            query,
            ..Self::default()
        }
    }

    /// Append a query parameter.
    #[must_use]
    pub fn with_query(mut self, name: &str, value: impl Into<String>) -> Self {
        self.query.push((Arc::from(name), value.into()));
        self
    }

    /// Attach a request body.
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Get a path parameter by name.
    ///
    /// Last-write-wins: when merges stacked duplicate names, the most
    /// recently merged value is returned.
    #[inline]
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get a query parameter by name (last occurrence wins, as in
    /// `?limit=10&limit=20`).
    #[inline]
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get a response header by name (case-insensitive per RFC 7230).
    #[inline]
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Add or replace a response header.
    pub fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value));
    }

    /// Set the response status.
    pub fn set_status(&mut self, status: u16) {
        self.status = Some(status);
    }

    /// Merge extracted route parameters into the context.
    ///
    /// Existing entries are retained; appended entries shadow earlier keys
    /// on lookup (last-write-wins merge).
    pub(crate) fn merge_params(&mut self, params: ParamVec) {
        self.params.extend(params);
    }
}

/// Restricted context for embedded reads during link expansion.
///
/// Carries the resolved link URI and the parameters extracted from matching
/// it, but no body or response slots: a read produces a body, it does not
/// answer a request.
#[derive(Debug, Clone)]
pub struct ReadContext {
    /// Correlation id of the request being expanded
    pub request_id: RequestId,
    /// The link URI being resolved
    pub uri: String,
    /// Parameters extracted by matching the URI against the route pattern
    pub params: ParamVec,
    /// True when the read was triggered by link expansion
    pub embedded: bool,
}

impl ReadContext {
    /// Get a path parameter by name (last-write-wins).
    #[inline]
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Parse a query string (without the leading `?`) into a [`ParamVec`].
#[must_use]
pub fn parse_query(query: &str) -> ParamVec {
    url::form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (Arc::from(k.as_ref()), v.into_owned()))
        .collect()
}
