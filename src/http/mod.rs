//! HTTP transport — a plain [`HttpRequest`] value plus the reqwest-backed
//! [`BubbleHttp`] (feature `http`).
//!
//! `HttpRequest` carries no client type, so callers on other HTTP stacks can
//! build their own request from it.

#[cfg(feature = "http")]
pub mod client;

#[cfg(feature = "http")]
pub use client::BubbleHttp;

#[cfg(feature = "http")]
use crate::error::HttpError;

pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Method, URL, headers and body of an outgoing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub method: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpRequest {
    /// A `POST` with `Content-Type: application/json`.
    pub fn post_json(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: "POST".to_string(),
            headers: vec![("Content-Type".to_string(), CONTENT_TYPE_JSON.to_string())],
            body: body.into(),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Build a reqwest request on `client`.
    #[cfg(feature = "http")]
    pub fn into_reqwest(self, client: &reqwest::Client) -> Result<reqwest::RequestBuilder, HttpError> {
        let method = reqwest::Method::from_bytes(self.method.as_bytes())
            .map_err(|_| HttpError::InvalidRequest(format!("invalid method {:?}", self.method)))?;

        let mut headers = reqwest::header::HeaderMap::new();
        for (name, value) in &self.headers {
            let name = reqwest::header::HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| HttpError::InvalidRequest(format!("header {:?}: {}", name, e)))?;
            let value = reqwest::header::HeaderValue::from_str(value)
                .map_err(|e| HttpError::InvalidRequest(format!("header {:?}: {}", name, e)))?;
            headers.append(name, value);
        }

        Ok(client
            .request(method, &self.url)
            .headers(headers)
            .body(self.body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_json() {
        let req = HttpRequest::post_json("http://localhost", "{}");
        assert_eq!(req.method, "POST");
        assert_eq!(
            req.headers,
            vec![("Content-Type".to_string(), "application/json".to_string())]
        );
        assert_eq!(req.body, "{}");
    }

    #[test]
    fn test_header_appends() {
        let req = HttpRequest::post_json("http://localhost", "{}").header("X-Trace", "1");
        assert_eq!(req.headers.len(), 2);
        assert_eq!(req.headers[1], ("X-Trace".to_string(), "1".to_string()));
    }

    #[cfg(feature = "http")]
    #[test]
    fn test_into_reqwest() {
        let client = reqwest::Client::new();
        let built = HttpRequest::post_json("http://localhost:8131/", "{}")
            .into_reqwest(&client)
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(built.method(), reqwest::Method::POST);
        assert_eq!(built.url().as_str(), "http://localhost:8131/");
        assert_eq!(built.headers()["content-type"], "application/json");
    }

    #[cfg(feature = "http")]
    #[test]
    fn test_into_reqwest_rejects_bad_header() {
        let client = reqwest::Client::new();
        let err = HttpRequest::post_json("http://localhost", "{}")
            .header("bad header", "x")
            .into_reqwest(&client)
            .unwrap_err();
        assert!(matches!(err, HttpError::InvalidRequest(_)));
    }
}
