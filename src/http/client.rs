//! Low-level transport — `BubbleHttp`.
//!
//! POSTs signed requests to their provider and separates transport failures
//! ([`HttpError`]) from provider-reported errors ([`RpcError`]).

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use super::HttpRequest;
use crate::error::{HttpError, RpcError, SdkError};
use crate::request::{RpcResponse, SignedBubbleRequest};

/// Default request timeout on native targets.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// reqwest-backed transport for Bubble requests.
#[derive(Debug, Clone)]
pub struct BubbleHttp {
    client: Client,
}

impl BubbleHttp {
    pub fn new() -> Result<Self, HttpError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Ignored on wasm, where the browser owns timeouts.
    pub fn with_timeout(timeout: Duration) -> Result<Self, HttpError> {
        #[allow(unused_mut)]
        let mut builder = Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        {
            builder = builder.timeout(timeout).pool_max_idle_per_host(10);
        }
        #[cfg(target_arch = "wasm32")]
        let _ = timeout;

        Ok(Self {
            client: builder.build()?,
        })
    }

    /// Wrap an already configured reqwest client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    /// Send a signed request and return the provider's `result`.
    pub async fn send(&self, request: &SignedBubbleRequest) -> Result<Value, SdkError> {
        tracing::debug!(
            method = %request.method(),
            id = %request.id(),
            url = %request.url(),
            "Sending bubble request"
        );
        let http_request = request.http_request()?;
        self.execute(http_request).await
    }

    /// Send any [`HttpRequest`] and interpret the response as a Bubble
    /// JSON-RPC response.
    pub async fn execute(&self, request: HttpRequest) -> Result<Value, SdkError> {
        let url = request.url.clone();
        let resp = request
            .into_reqwest(&self.client)?
            .send()
            .await
            .map_err(HttpError::from)?;

        let status = resp.status();
        let body = resp.text().await.map_err(HttpError::from)?;

        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), url = %url, "Provider returned an error status");
            return Err(HttpError::Status {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let response: RpcResponse = serde_json::from_str(&body)
            .map_err(|e| HttpError::InvalidResponse(format!("{}: {}", e, body)))?;

        response.into_result().map_err(|e: RpcError| {
            tracing::warn!(code = e.code, message = %e.message, url = %url, "Provider returned an error");
            SdkError::from(e)
        })
    }
}
