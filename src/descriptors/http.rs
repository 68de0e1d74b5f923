//! HTTP request descriptor built from `http` crate types

use super::{signature_with_tail, RequestDescriptor};
use crate::core::LogContext;
use ::http::{Method, Request, Uri};

/// Query parameters that are routing details rather than request input
const IGNORED_QUERY_PARAMS: [&str; 2] = ["path_info", "api_version"];

/// Session id attached to a request by upstream middleware
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionId(pub String);

/// Request id attached to a request by upstream middleware
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    method: String,
    uri_path: String,
    query_string: String,
    session_id: String,
    request_id: String,
}

impl HttpRequest {
    /// Describe a request without correlation ids
    pub fn new(method: &Method, uri: &Uri) -> Self {
        Self {
            method: method.as_str().to_string(),
            uri_path: uri.path().to_string(),
            query_string: filter_query(uri.query().unwrap_or_default()),
            session_id: String::new(),
            request_id: String::new(),
        }
    }

    /// Describe a request, reading correlation ids from its extensions
    pub fn from_request<B>(request: &Request<B>) -> Self {
        let mut described = Self::new(request.method(), request.uri());

        if let Some(SessionId(id)) = request.extensions().get::<SessionId>() {
            described.session_id = id.clone();
        }
        if let Some(RequestId(id)) = request.extensions().get::<RequestId>() {
            described.request_id = id.clone();
        }

        described
    }

    #[must_use]
    pub fn with_correlation(
        mut self,
        session_id: impl Into<String>,
        request_id: impl Into<String>,
    ) -> Self {
        self.session_id = session_id.into();
        self.request_id = request_id.into();
        self
    }

    pub fn query_string(&self) -> &str {
        &self.query_string
    }
}

fn filter_query(query: &str) -> String {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter(|pair| {
            let name = pair.split_once('=').map_or(*pair, |(name, _)| name);
            !IGNORED_QUERY_PARAMS.contains(&name)
        })
        .collect::<Vec<_>>()
        .join("&")
}

impl RequestDescriptor for HttpRequest {
    fn session_id(&self) -> &str {
        &self.session_id
    }

    fn request_id(&self) -> &str {
        &self.request_id
    }

    fn summary_arguments(&self) -> LogContext {
        LogContext::new()
            .with_field("uri", self.uri_path.as_str())
            .with_field("method", self.method.as_str())
            .with_field("query_string", self.query_string.as_str())
    }

    fn signature(&self) -> String {
        signature_with_tail(
            format!("{} {}", self.method, self.uri_path),
            '?',
            &self.query_string,
        )
    }
}
