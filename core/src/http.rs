//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! The engine describes every call as an `ApiRequest`: a relative path, an
//! ordered parameter list, a method and a content encoding. `ApiRequest::to_http`
//! lowers it to a concrete `HttpRequest` (absolute URL, headers, body). The
//! `Transport` trait is the only place I/O happens, so everything up to and
//! after `send` is deterministic and testable with plain values.
//!
//! Lowering rules:
//! - GET and DELETE carry all params in the query string.
//! - JSON-encoded calls take the body from the `JSON` sentinel param; any
//!   other params go to the query string.
//! - Form-encoded POST/PUT/PATCH send all params (the sentinel included) as
//!   an `application/x-www-form-urlencoded` body.

use url::form_urlencoded;

use crate::error::TransportError;

/// Name of the parameter that carries a serialized JSON payload.
pub const JSON_PAYLOAD_PARAM: &str = "JSON";

/// Query flag asking the platform for the full representation of an entity.
pub const FULL_DETAILS_PARAM: &str = "fullDetails";

pub const CONTENT_TYPE_JSON: &str = "application/json; charset=UTF-8";
pub const CONTENT_TYPE_FORM: &str = "application/x-www-form-urlencoded; charset=UTF-8";

/// Ordered request parameters.
pub type Params = Vec<(String, String)>;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }

    fn has_body(self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch)
    }
}

/// How request parameters are encoded on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentEncoding {
    Form,
    Json,
}

/// One platform call as the engine sees it: path, params, method, encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub method: HttpMethod,
    pub path: String,
    pub params: Params,
    pub encoding: ContentEncoding,
}

impl ApiRequest {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Lower to a concrete request against `base_url`.
    pub fn to_http(&self, base_url: &str) -> HttpRequest {
        let base = base_url.trim_end_matches('/');
        let path = self.path.trim_start_matches('/');

        let (query, headers, body) = match (self.encoding, self.method.has_body()) {
            (ContentEncoding::Json, _) => {
                let body = self.param(JSON_PAYLOAD_PARAM).map(str::to_string);
                let rest = self.params.iter().filter(|(k, _)| k != JSON_PAYLOAD_PARAM);
                let headers = match body {
                    Some(_) => vec![content_type(CONTENT_TYPE_JSON)],
                    None => Vec::new(),
                };
                (encode(rest), headers, body)
            }
            (ContentEncoding::Form, true) if !self.params.is_empty() => (
                String::new(),
                vec![content_type(CONTENT_TYPE_FORM)],
                Some(encode(self.params.iter())),
            ),
            (ContentEncoding::Form, _) => (encode(self.params.iter()), Vec::new(), None),
        };

        let url = if query.is_empty() {
            format!("{base}/{path}")
        } else {
            format!("{base}/{path}?{query}")
        };

        HttpRequest {
            method: self.method,
            url,
            headers,
            body,
        }
    }
}

fn content_type(value: &str) -> (String, String) {
    ("content-type".to_string(), value.to_string())
}

fn encode<'a>(params: impl Iterator<Item = &'a (String, String)>) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in params {
        serializer.append_pair(key, value);
    }
    serializer.finish()
}

/// An HTTP request described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Executes an `ApiRequest` against the platform.
///
/// Implementations own everything below the engine: base URL, authentication
/// headers, timeouts. They return any HTTP response as data (including 4xx
/// and 5xx) and only fail when no response was received.
pub trait Transport {
    fn send(&self, request: &ApiRequest) -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: &ApiRequest) -> Result<HttpResponse, TransportError> {
        (**self).send(request)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&self, request: &ApiRequest) -> Result<HttpResponse, TransportError> {
        (**self).send(request)
    }
}
