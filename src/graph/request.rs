//! REST request descriptors for Graph and SharePoint
//!
//! User-supplied values embedded in paths such as `GetById('...')` are encoded
//! one segment at a time so slashes, quotes and spaces survive exactly once.

use serde::Serialize;
use std::fmt;

/// SharePoint REST responses without OData metadata
pub const ACCEPT_NOMETADATA: &str = "application/json;odata=nometadata";

/// Graph responses without OData annotations
pub const ACCEPT_GRAPH_NO_METADATA: &str = "application/json;odata.metadata=none";

pub const ACCEPT_JSON: &str = "application/json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
    /// Sent without a bearer token
    pub anonymous: bool,
}

impl RequestDescriptor {
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url.into())
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::Post, url.into())
    }

    fn new(method: Method, url: String) -> Self {
        Self {
            method,
            url,
            headers: Vec::new(),
            body: None,
            anonymous: false,
        }
    }

    pub fn accept(self, value: &str) -> Self {
        self.header("accept", value)
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn json<T: Serialize>(mut self, body: &T) -> serde_json::Result<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn anonymous(mut self) -> Self {
        self.anonymous = true;
        self
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Percent-encode a single path value
pub fn encode_segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// `$filter=field eq 'value'` with the value encoded
pub fn odata_filter(field: &str, value: &str) -> String {
    format!("$filter={} eq '{}'", field, encode_segment(value))
}

/// Join a site URL and a path starting with `/_api`, tolerating a trailing slash
pub fn site_api(site_url: &str, path: &str) -> String {
    format!("{}/{}", site_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// `{graph}/v1.0/{path}`
pub fn graph_v1(graph_resource: &str, path: &str) -> String {
    format!(
        "{}/v1.0/{}",
        graph_resource.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
