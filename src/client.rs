//! `BubbleClient` — builds, signs and sends Bubble requests.
//!
//! Each client owns its signer and a request id counter starting at 0. Ids are
//! taken with a single atomic increment before any await point, so concurrent
//! calls on one client never share an id, and separate clients never
//! interfere.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::content_id::ContentIdInput;
use crate::error::{HttpError, SdkError, SdkResult};
use crate::http::client::DEFAULT_TIMEOUT;
use crate::http::{BubbleHttp, CONTENT_TYPE_JSON};
use crate::request::{
    BodyOptions, BubbleRequest, ParamOptions, RequestId, RequestOptions, SignedBubbleRequest,
};
use crate::signer::Signer;

/// Builder for [`BubbleClient`].
pub struct BubbleClientBuilder {
    signer: Signer,
    timeout: Duration,
    default_headers: Vec<(String, String)>,
    url: Option<String>,
}

impl BubbleClientBuilder {
    pub fn new(signer: impl Into<Signer>) -> Self {
        Self {
            signer: signer.into(),
            timeout: DEFAULT_TIMEOUT,
            default_headers: Vec::new(),
            url: None,
        }
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    /// Add a default header to all requests.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// POST every request here instead of the content id's provider.
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn build(self) -> SdkResult<BubbleClient> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static(CONTENT_TYPE_JSON),
        );

        for (name, value) in self.default_headers {
            let header_name = reqwest::header::HeaderName::try_from(name.as_str()).map_err(|e| {
                HttpError::InvalidRequest(format!("Invalid header name '{}': {}", name, e))
            })?;
            let header_value = reqwest::header::HeaderValue::from_str(&value).map_err(|e| {
                HttpError::InvalidRequest(format!("Invalid header value for '{}': {}", name, e))
            })?;
            headers.insert(header_name, header_value);
        }

        #[allow(unused_mut)]
        let mut builder = Client::builder().default_headers(headers);
        #[cfg(not(target_arch = "wasm32"))]
        {
            builder = builder.timeout(self.timeout).pool_max_idle_per_host(10);
        }
        let client = builder.build().map_err(HttpError::from)?;

        Ok(BubbleClient {
            http: BubbleHttp::from_client(client),
            signer: self.signer,
            url: self.url,
            next_id: AtomicU64::new(0),
        })
    }
}

/// Signs and sends requests on behalf of one signer.
#[derive(Debug)]
pub struct BubbleClient {
    http: BubbleHttp,
    signer: Signer,
    url: Option<String>,
    next_id: AtomicU64,
}

impl BubbleClient {
    /// A client with default settings.
    pub fn new(signer: impl Into<Signer>) -> SdkResult<Self> {
        Self::builder(signer).build()
    }

    pub fn builder(signer: impl Into<Signer>) -> BubbleClientBuilder {
        BubbleClientBuilder::new(signer)
    }

    pub fn signer(&self) -> &Signer {
        &self.signer
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Build and sign a request without sending it. Consumes one id.
    pub async fn prepare(
        &self,
        method: &str,
        content_id: impl Into<ContentIdInput>,
        params: ParamOptions,
    ) -> SdkResult<SignedBubbleRequest> {
        let options = RequestOptions {
            url: self.url.clone(),
            body: BodyOptions {
                id: Some(RequestId::Number(self.next_id())),
                method: Some(method.to_string()),
                params,
                ..Default::default()
            },
        };
        let request = BubbleRequest::new(content_id, options)?;
        request.sign(&self.signer).await
    }

    /// Sign and send an arbitrary method, returning the provider's result.
    pub async fn call(
        &self,
        method: &str,
        content_id: impl Into<ContentIdInput>,
        params: ParamOptions,
    ) -> SdkResult<Value> {
        let signed = self.prepare(method, content_id, params).await?;
        self.send(&signed).await
    }

    /// Send an already signed request.
    pub async fn send(&self, request: &SignedBubbleRequest) -> SdkResult<Value> {
        self.http.send(request).await
    }

    /// Read a file, or a directory's contents.
    pub async fn read(&self, content_id: impl Into<ContentIdInput>) -> SdkResult<Value> {
        self.read_with(content_id, ParamOptions::default(), ResponseFormat::Raw)
            .await
    }

    /// [`read`](Self::read) with request params (e.g. `options`) and a
    /// choice of result decoding.
    pub async fn read_with(
        &self,
        content_id: impl Into<ContentIdInput>,
        params: ParamOptions,
        format: ResponseFormat,
    ) -> SdkResult<Value> {
        let result = self.call("read", content_id, params).await?;
        format.decode(result)
    }

    /// Write `data` to a file.
    pub async fn write(
        &self,
        content_id: impl Into<ContentIdInput>,
        data: impl Into<Value>,
    ) -> SdkResult<Value> {
        self.write_with(content_id, data, ParamOptions::default())
            .await
    }

    /// [`write`](Self::write) with request params. `data` replaces any
    /// `params.data`.
    pub async fn write_with(
        &self,
        content_id: impl Into<ContentIdInput>,
        data: impl Into<Value>,
        params: ParamOptions,
    ) -> SdkResult<Value> {
        let params = ParamOptions {
            data: Some(data.into()),
            ..params
        };
        self.call("write", content_id, params).await
    }

    /// List a directory. Providers return the listing as a JSON string;
    /// it is decoded here.
    pub async fn list(&self, content_id: impl Into<ContentIdInput>) -> SdkResult<Value> {
        self.list_with(content_id, ParamOptions::default(), ResponseFormat::Json)
            .await
    }

    /// [`list`](Self::list) with request params (e.g. `{"long": true}` as
    /// `options`) and a choice of result decoding.
    pub async fn list_with(
        &self,
        content_id: impl Into<ContentIdInput>,
        params: ParamOptions,
        format: ResponseFormat,
    ) -> SdkResult<Value> {
        let result = self.call("list", content_id, params).await?;
        format.decode(result)
    }
}

/// How a provider's `result` is returned from [`BubbleClient`] calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResponseFormat {
    /// As sent by the provider.
    #[default]
    Raw,
    /// A string result is parsed as JSON. Other results pass through.
    Json,
}

impl ResponseFormat {
    fn decode(self, result: Value) -> SdkResult<Value> {
        match (self, result) {
            (ResponseFormat::Json, Value::String(s)) => {
                serde_json::from_str(&s).map_err(SdkError::from)
            }
            (_, other) => Ok(other),
        }
    }
}
