//! Bubble request envelopes.
//!
//! A [`BubbleRequest`] is built from a content id plus caller options and is
//! always unsigned. Signing consumes it and yields a
//! [`SignedBubbleRequest`](sign::SignedBubbleRequest).
//!
//! `chainId`, `contract` and `file` are always copied from the resolved
//! content id. A caller cannot request one resource while signing for another.

pub mod sign;
pub mod wire;

use serde_json::{Map, Value};
use uuid::Uuid;

pub use sign::{SignedBubbleRequest, SIGNATURE_DIGEST};
pub use wire::{RequestBody, RequestId, RequestParams, RpcResponse};

use crate::content_id::{ContentId, ContentIdInput};
use crate::error::RequestError;
use crate::shared::now_ms;

/// Default `jsonrpc` version.
pub const JSONRPC_VERSION: &str = "2.0";

/// Method used when none is supplied.
pub const DEFAULT_METHOD: &str = "read";

// ============================================================================
// Options
// ============================================================================

/// Per-request options. Every field is optional and falls back to a default.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    /// Where to POST the request. Defaults to the content id's provider.
    pub url: Option<String>,
    pub body: BodyOptions,
}

/// Top-level body fields a caller may set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BodyOptions {
    pub jsonrpc: Option<String>,
    pub id: Option<RequestId>,
    pub method: Option<String>,
    pub params: ParamOptions,
}

/// `params` fields a caller may set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamOptions {
    pub nonce: Option<String>,
    pub timestamp: Option<i64>,
    pub data: Option<Value>,
    pub options: Option<Value>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn jsonrpc(mut self, jsonrpc: impl Into<String>) -> Self {
        self.body.jsonrpc = Some(jsonrpc.into());
        self
    }

    pub fn id(mut self, id: impl Into<RequestId>) -> Self {
        self.body.id = Some(id.into());
        self
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.body.method = Some(method.into());
        self
    }

    pub fn nonce(mut self, nonce: impl Into<String>) -> Self {
        self.body.params.nonce = Some(nonce.into());
        self
    }

    pub fn timestamp(mut self, timestamp: i64) -> Self {
        self.body.params.timestamp = Some(timestamp);
        self
    }

    pub fn data(mut self, data: impl Into<Value>) -> Self {
        self.body.params.data = Some(data.into());
        self
    }

    pub fn options(mut self, options: impl Into<Value>) -> Self {
        self.body.params.options = Some(options.into());
        self
    }

    /// Parse options from an untyped JSON value of the form
    /// `{url?, body?: {jsonrpc?, id?, method?, params?: {...}}}`.
    ///
    /// `null` means "no options". Unknown fields are dropped, as are
    /// `params.chainId`, `params.contract` and `params.file`.
    pub fn from_value(value: &Value) -> Result<Self, RequestError> {
        let map = match value {
            Value::Null => return Ok(Self::default()),
            Value::Object(map) => map,
            other => return Err(invalid(format!("expected an object, got {}", other))),
        };

        let body = match map.get("body") {
            None | Some(Value::Null) => BodyOptions::default(),
            Some(Value::Object(body)) => BodyOptions::from_map(body)?,
            Some(other) => return Err(invalid(format!("body must be an object, got {}", other))),
        };

        Ok(Self {
            url: optional_string(map, "url")?,
            body,
        })
    }
}

impl BodyOptions {
    fn from_map(map: &Map<String, Value>) -> Result<Self, RequestError> {
        let id = match field(map, "id") {
            None => None,
            Some(Value::String(s)) => Some(RequestId::String(s.clone())),
            Some(Value::Number(n)) => match n.as_u64() {
                Some(n) => Some(RequestId::Number(n)),
                None => return Err(invalid(format!("id must be a non-negative integer, got {}", n))),
            },
            Some(other) => return Err(invalid(format!("id must be a string or number, got {}", other))),
        };

        let params = match field(map, "params") {
            None => ParamOptions::default(),
            Some(Value::Object(params)) => ParamOptions::from_map(params)?,
            Some(other) => return Err(invalid(format!("params must be an object, got {}", other))),
        };

        Ok(Self {
            jsonrpc: optional_string(map, "jsonrpc")?,
            id,
            method: optional_string(map, "method")?,
            params,
        })
    }
}

impl ParamOptions {
    fn from_map(map: &Map<String, Value>) -> Result<Self, RequestError> {
        let timestamp = match field(map, "timestamp") {
            None => None,
            Some(value) => Some(value.as_i64().ok_or_else(|| {
                invalid(format!("timestamp must be an integer, got {}", value))
            })?),
        };

        Ok(Self {
            nonce: optional_string(map, "nonce")?,
            timestamp,
            data: field(map, "data").cloned(),
            options: field(map, "options").cloned(),
        })
    }
}

fn field<'a>(map: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    map.get(name).filter(|v| !v.is_null())
}

fn optional_string(map: &Map<String, Value>, name: &str) -> Result<Option<String>, RequestError> {
    match field(map, name) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(invalid(format!("{} must be a string, got {}", name, other))),
    }
}

fn invalid(reason: String) -> RequestError {
    RequestError::InvalidOptions(reason)
}

// ============================================================================
// Unsigned request
// ============================================================================

/// An unsigned Bubble request.
///
/// Fields are private: the only way to change a built request is to sign it,
/// which consumes it.
#[derive(Debug, Clone, PartialEq)]
pub struct BubbleRequest {
    content_id: ContentId,
    url: String,
    body: RequestBody,
}

impl BubbleRequest {
    /// Build a request for `content_id`, filling in anything `options`
    /// leaves unset: method `read`, a random UUID nonce, the current time,
    /// jsonrpc `2.0`, and the nonce as id.
    pub fn new(
        content_id: impl Into<ContentIdInput>,
        options: RequestOptions,
    ) -> Result<Self, RequestError> {
        let content_id = ContentId::parse(content_id)?;
        Ok(Self::build(content_id, options))
    }

    /// Like [`new`](BubbleRequest::new) with options given as untyped JSON.
    pub fn from_json(
        content_id: impl Into<ContentIdInput>,
        options: &Value,
    ) -> Result<Self, RequestError> {
        let content_id = ContentId::parse(content_id)?;
        let options = RequestOptions::from_value(options)?;
        Ok(Self::build(content_id, options))
    }

    fn build(content_id: ContentId, options: RequestOptions) -> Self {
        let RequestOptions { url, body } = options;
        let BodyOptions {
            jsonrpc,
            id,
            method,
            params,
        } = body;

        let nonce = params
            .nonce
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let params = RequestParams {
            timestamp: params.timestamp.unwrap_or_else(now_ms),
            nonce: nonce.clone(),
            chain_id: content_id.chain(),
            contract: content_id.contract().to_string(),
            file: content_id.file().map(ToString::to_string),
            data: params.data.map(integral_floats_to_ints),
            options: params.options.map(integral_floats_to_ints),
            signature: None,
        };

        let body = RequestBody {
            jsonrpc: jsonrpc.unwrap_or_else(|| JSONRPC_VERSION.to_string()),
            id: id.unwrap_or(RequestId::String(nonce)),
            method: method.unwrap_or_else(|| DEFAULT_METHOD.to_string()),
            params,
        };

        let url = url.unwrap_or_else(|| content_id.provider().to_string());

        tracing::debug!(
            method = %body.method,
            id = %body.id,
            url = %url,
            "Built bubble request"
        );

        Self {
            content_id,
            url,
            body,
        }
    }

    pub fn content_id(&self) -> &ContentId {
        &self.content_id
    }

    /// Where the request will be POSTed.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn body(&self) -> &RequestBody {
        &self.body
    }

    pub fn method(&self) -> &str {
        &self.body.method
    }

    pub fn id(&self) -> &RequestId {
        &self.body.id
    }

    pub fn params(&self) -> &RequestParams {
        &self.body.params
    }

    /// The wire JSON of the unsigned body.
    pub fn to_json(&self) -> Result<String, RequestError> {
        Ok(serde_json::to_string(&self.body)?)
    }
}

/// Largest magnitude below which every integer is exactly representable as
/// an `f64` (`Number.MAX_SAFE_INTEGER + 1`).
const EXACT_INTEGER_LIMIT: f64 = 9_007_199_254_740_992.0;

/// Rewrite floats with no fractional part (`1.0`, `-0.0`) as integers.
///
/// serde_json prints them as `1.0` while a JavaScript provider that parses
/// and re-serializes the body prints `1`, and the two pre-images would hash
/// differently. Larger floats are left alone.
fn integral_floats_to_ints(value: Value) -> Value {
    match value {
        Value::Number(n) if n.is_f64() => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < EXACT_INTEGER_LIMIT => Value::from(f as i64),
            _ => Value::Number(n),
        },
        Value::Array(items) => Value::Array(items.into_iter().map(integral_floats_to_ints).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (key, integral_floats_to_ints(value)))
                .collect(),
        ),
        other => other,
    }
}
