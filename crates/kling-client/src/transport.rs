//! HTTP transport used by every cookie-authenticated call.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, COOKIE, USER_AGENT};
use serde::de::DeserializeOwned;
use tracing::debug;

use kling_core::CookieJar;

use crate::error::ClientError;

/// HTTP method. The service only uses these two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// Request body.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Empty,
    Json(serde_json::Value),
    Bytes { data: Vec<u8>, content_type: String },
}

/// A single outbound request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub body: Body,
}

impl HttpRequest {
    /// A GET request without query or body.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            query: Vec::new(),
            body: Body::Empty,
        }
    }

    /// A POST request without query or body.
    pub fn post(url: impl Into<String>) -> Self {
        Self {
            method: Method::Post,
            ..Self::get(url)
        }
    }

    /// Append a query parameter.
    pub fn query(mut self, name: &str, value: impl ToString) -> Self {
        self.query.push((name.to_string(), value.to_string()));
        self
    }

    /// Send a JSON body.
    pub fn json(mut self, value: serde_json::Value) -> Self {
        self.body = Body::Json(value);
        self
    }

    /// Send raw bytes.
    pub fn bytes(mut self, data: Vec<u8>, content_type: &str) -> Self {
        self.body = Body::Bytes {
            data,
            content_type: content_type.to_string(),
        };
        self
    }

    /// Value of a query parameter, if set.
    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// A fully read response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body as text, replacing invalid UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decode the body into a typed schema.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ClientError> {
        serde_json::from_slice(&self.body)
            .map_err(|e| ClientError::Decode(format!("{e}; body: {}", self.text())))
    }

    /// Fail with [`ClientError::UnexpectedStatus`] unless 2xx.
    pub fn error_for_status(self) -> Result<Self, ClientError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(ClientError::UnexpectedStatus {
                status: self.status,
                body: self.text(),
            })
        }
    }
}

/// Sends requests on behalf of one authenticated session.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request and read the whole response.
    ///
    /// Non-2xx statuses are returned as responses, not errors.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ClientError>;
}

/// [`Transport`] backed by a reqwest client that attaches the session's
/// cookies and user agent to every request.
pub struct ReqwestTransport {
    inner: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a transport for the given cookies and user agent.
    pub fn new(cookies: &CookieJar, user_agent: &str) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&cookies.header_value())
                .map_err(|e| ClientError::Configuration(format!("cookie header: {e}")))?,
        );
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(user_agent)
                .map_err(|e| ClientError::Configuration(format!("user agent: {e}")))?,
        );

        let inner = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self { inner })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ClientError> {
        debug!(method = ?request.method, url = %request.url, "HTTP request");

        let builder = match request.method {
            Method::Get => self.inner.get(&request.url),
            Method::Post => self.inner.post(&request.url),
        };
        let builder = builder.query(&request.query);
        let builder = match request.body {
            Body::Empty => builder,
            Body::Json(value) => builder.json(&value),
            Body::Bytes { data, content_type } => {
                builder.header(CONTENT_TYPE, content_type).body(data)
            }
        };

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();

        debug!(status, bytes = body.len(), "HTTP response");
        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct StatusOnly {
        status: i64,
    }

    #[test]
    fn test_request_builders() {
        let request = HttpRequest::post("https://up.test/api/upload/fragment")
            .query("upload_token", "tok")
            .query("fragment_id", 0)
            .bytes(vec![1, 2, 3], "application/octet-stream");

        assert_eq!(request.method, Method::Post);
        assert_eq!(request.query_value("fragment_id"), Some("0"));
        assert!(matches!(request.body, Body::Bytes { ref data, .. } if data.len() == 3));
    }

    #[test]
    fn test_response_decoding() {
        let ok = HttpResponse {
            status: 200,
            body: br#"{"status":200}"#.to_vec(),
        };
        assert_eq!(ok.json::<StatusOnly>().unwrap().status, 200);

        let bad = HttpResponse {
            status: 200,
            body: b"<html>".to_vec(),
        };
        let err = bad.json::<StatusOnly>().unwrap_err();
        assert!(matches!(err, ClientError::Decode(ref msg) if msg.contains("<html>")));
    }

    #[test]
    fn test_error_for_status() {
        let denied = HttpResponse {
            status: 401,
            body: b"login required".to_vec(),
        };
        match denied.error_for_status() {
            Err(ClientError::UnexpectedStatus { status, body }) => {
                assert_eq!(status, 401);
                assert_eq!(body, "login required");
            }
            other => panic!("Expected UnexpectedStatus, got {other:?}"),
        }
    }

    #[test]
    fn test_reqwest_transport_builds() {
        let jar = CookieJar::parse("did=web_1; userId=2").unwrap();
        assert!(ReqwestTransport::new(&jar, "Mozilla/5.0").is_ok());
        assert!(ReqwestTransport::new(&jar, "bad\nagent").is_err());
    }
}
