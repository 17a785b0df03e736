//! Bubble content ids.
//!
//! A content id addresses a bubble (chain + contract + provider) or a
//! directory/file inside one. It can be decoded from a structured record, a
//! base64 blob, a `did:bubble:` DID, or a URL of the form
//! `<provider>/<chain>/<contract>[/<file>]`, and exported to any of them.
//!
//! ```rust,ignore
//! use bubble_sdk::content_id::ContentId;
//!
//! let id = ContentId::parse("did:bubble:eyJjaGFpbiI6MSwiY29udHJhY3Qi...")?;
//! let file = id.with_file("0x01/hello.txt")?;
//! println!("{}", file.to_url());
//! ```

pub mod file;
pub mod input;

use std::str::FromStr;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};

pub use file::{FileId, ROOT_DIRECTORY};
pub use input::{ContentIdInput, RawContentId, DID_PREFIX};

use crate::error::{AttemptedValue, ContentIdError};
use crate::shared::{is_hex, strip_hex_prefix};

/// A validated, normalized content id.
///
/// Immutable once constructed; derive variants with
/// [`with_overrides`](ContentId::with_overrides) or
/// [`with_file`](ContentId::with_file).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ContentId {
    chain: u64,
    contract: String,
    provider: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    file: Option<FileId>,
}

/// Field overrides applied on top of a decoded input before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentIdOverrides {
    pub chain: Option<u64>,
    pub contract: Option<String>,
    pub provider: Option<String>,
    pub file: Option<String>,
}

impl ContentIdOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chain(mut self, chain: u64) -> Self {
        self.chain = Some(chain);
        self
    }

    pub fn contract(mut self, contract: impl Into<String>) -> Self {
        self.contract = Some(contract.into());
        self
    }

    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    fn apply(&self, raw: &mut RawContentId) {
        if let Some(chain) = self.chain {
            raw.chain = Some(Value::from(chain));
        }
        if let Some(contract) = &self.contract {
            raw.contract = Some(Value::from(contract.as_str()));
        }
        if let Some(provider) = &self.provider {
            raw.provider = Some(Value::from(provider.as_str()));
        }
        if let Some(file) = &self.file {
            raw.file = Some(Value::from(file.as_str()));
        }
    }
}

impl ContentId {
    /// Build a bubble-level content id (no file).
    pub fn new(chain: u64, contract: &str, provider: &str) -> Result<Self, ContentIdError> {
        Self::validate(RawContentId {
            chain: Some(Value::from(chain)),
            contract: Some(Value::from(contract)),
            provider: Some(Value::from(provider)),
            file: None,
        })
    }

    /// Decode a content id from any supported input shape.
    pub fn parse(input: impl Into<ContentIdInput>) -> Result<Self, ContentIdError> {
        Self::validate(input.into().resolve()?)
    }

    /// Decode a content id, with `overrides` taking precedence over any field
    /// found in `input`.
    pub fn decode(
        input: impl Into<ContentIdInput>,
        overrides: &ContentIdOverrides,
    ) -> Result<Self, ContentIdError> {
        let mut raw = input.into().resolve()?;
        overrides.apply(&mut raw);
        Self::validate(raw)
    }

    /// Derive a new content id from this one.
    pub fn with_overrides(&self, overrides: &ContentIdOverrides) -> Result<Self, ContentIdError> {
        Self::decode(self, overrides)
    }

    /// Derive a new content id addressing `file` within the same bubble.
    pub fn with_file(&self, file: &str) -> Result<Self, ContentIdError> {
        self.with_overrides(&ContentIdOverrides::new().file(file))
    }

    /// The same bubble with the file removed.
    pub fn without_file(&self) -> Self {
        Self {
            file: None,
            ..self.clone()
        }
    }

    fn validate(raw: RawContentId) -> Result<Self, ContentIdError> {
        let chain = raw.chain.as_ref().and_then(Value::as_u64).filter(|c| *c > 0);
        let contract = raw
            .contract
            .as_ref()
            .and_then(Value::as_str)
            .map(strip_hex_prefix)
            .filter(|c| c.len() == 40 && is_hex(c));
        let provider = raw
            .provider
            .as_ref()
            .and_then(Value::as_str)
            .filter(|p| !p.is_empty());

        let (Some(chain), Some(contract), Some(provider)) = (chain, contract, provider) else {
            // The contract is only reported without its prefix once chain and
            // provider have passed.
            let contract = if chain.is_some() && provider.is_some() {
                attempted_contract(raw.contract.as_ref())
            } else {
                attempted_string(raw.contract.as_ref())
            };
            return Err(ContentIdError::InvalidField {
                chain: attempted_chain(raw.chain.as_ref()),
                contract,
                provider: attempted_string(raw.provider.as_ref()),
            });
        };

        let file = match &raw.file {
            Some(value) => FileId::from_value(value)?,
            None => None,
        };

        Ok(Self {
            chain,
            contract: format!("0x{}", contract),
            provider: provider.to_string(),
            file,
        })
    }

    // ── Accessors ────────────────────────────────────────────────────────

    pub fn chain(&self) -> u64 {
        self.chain
    }

    /// Contract address, `0x`-prefixed, case as supplied.
    pub fn contract(&self) -> &str {
        &self.contract
    }

    /// Storage provider endpoint.
    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn file(&self) -> Option<&FileId> {
        self.file.as_ref()
    }

    // ── Encoders ─────────────────────────────────────────────────────────

    /// The canonical record `{chain, contract, provider, file?}`.
    pub fn to_object(&self) -> Value {
        let mut object = json!({
            "chain": self.chain,
            "contract": self.contract,
            "provider": self.provider,
        });
        if let (Some(file), Some(map)) = (&self.file, object.as_object_mut()) {
            map.insert("file".to_string(), Value::from(file.to_string()));
        }
        object
    }

    /// Unpadded base64url of the canonical record's JSON.
    pub fn to_base64(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.to_object().to_string())
    }

    /// `did:bubble:` followed by [`to_base64`](ContentId::to_base64).
    pub fn to_did(&self) -> String {
        format!("{}{}", DID_PREFIX, self.to_base64())
    }

    /// `<provider>/<chain>/<contract>[/<file>]`.
    ///
    /// Only parses back when the provider carries a scheme (`https://...`).
    /// A provider such as `localhost:8131` or `bubble-provider` produces a
    /// string that decodes as a URL without a scheme or as base64, and fails.
    /// Use [`to_did`](Self::to_did) or [`to_base64`](Self::to_base64) for
    /// those.
    pub fn to_url(&self) -> String {
        let mut url = format!("{}/{}/{}", self.provider, self.chain, self.contract);
        if let Some(file) = &self.file {
            url.push('/');
            url.push_str(&file.to_string());
        }
        url
    }
}

fn attempted_chain(value: Option<&Value>) -> AttemptedValue {
    match value {
        Some(Value::Number(n)) => AttemptedValue::Value(n.to_string()),
        _ => AttemptedValue::NotANumber,
    }
}

fn attempted_contract(value: Option<&Value>) -> AttemptedValue {
    match value {
        Some(Value::String(s)) => AttemptedValue::Value(strip_hex_prefix(s).to_string()),
        other => attempted_string(other),
    }
}

fn attempted_string(value: Option<&Value>) -> AttemptedValue {
    match value {
        None | Some(Value::Null) => AttemptedValue::Absent,
        Some(Value::String(s)) => AttemptedValue::Value(s.clone()),
        Some(other) => AttemptedValue::Value(other.to_string()),
    }
}

impl std::fmt::Display for ContentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_did())
    }
}

impl FromStr for ContentId {
    type Err = ContentIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for ContentId {
    type Error = ContentIdError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl TryFrom<Value> for ContentId {
    type Error = ContentIdError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl<'de> Deserialize<'de> for ContentId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::parse(value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTRACT: &str = "0xc16a409a39EDe3F38E212900f8d3afe6aa6A8929";
    const PROVIDER: &str = "https://bubblevault.com:8131/eth/v2";

    fn valid() -> ContentId {
        ContentId::new(1, CONTRACT, PROVIDER).unwrap()
    }

    #[test]
    fn test_new_prefixes_contract() {
        let id = ContentId::new(1, &CONTRACT[2..], PROVIDER).unwrap();
        assert_eq!(id.contract(), CONTRACT);
    }

    #[test]
    fn test_chain_zero_rejected() {
        let err = ContentId::new(0, CONTRACT, PROVIDER).unwrap_err();
        assert!(matches!(
            err,
            ContentIdError::InvalidField {
                chain: AttemptedValue::Value(ref c),
                ..
            } if c == "0"
        ));
    }

    #[test]
    fn test_overrides_take_precedence() {
        let id = ContentId::decode(
            valid().to_object(),
            &ContentIdOverrides::new().chain(137).file("0x02"),
        )
        .unwrap();
        assert_eq!(id.chain(), 137);
        assert_eq!(id.contract(), CONTRACT);
        assert_eq!(
            id.file().unwrap().directory(),
            "0x0000000000000000000000000000000000000000000000000000000000000002"
        );
    }

    #[test]
    fn test_with_file_and_without_file() {
        let id = valid().with_file("01/a.txt").unwrap();
        assert_eq!(id.file().unwrap().name(), Some("a.txt"));
        assert_eq!(id.without_file(), valid());
    }

    #[test]
    fn test_display_is_did() {
        let id = valid();
        assert_eq!(id.to_string(), id.to_did());
        assert_eq!(id.to_string().parse::<ContentId>().unwrap(), id);
    }

    #[test]
    fn test_to_object_field_order() {
        let id = valid().with_file("0x01").unwrap();
        let json = id.to_object().to_string();
        assert!(json.starts_with(r#"{"chain":1,"contract":"#));
        assert!(json.ends_with(
            r#""file":"0x0000000000000000000000000000000000000000000000000000000000000001"}"#
        ));
        assert_eq!(json, serde_json::to_string(&id).unwrap());
    }

    #[test]
    fn test_deserialize_accepts_any_shape() {
        let id = valid();
        let from_did: ContentId = serde_json::from_value(Value::from(id.to_did())).unwrap();
        let from_record: ContentId = serde_json::from_value(id.to_object()).unwrap();
        assert_eq!(from_did, id);
        assert_eq!(from_record, id);
        assert!(serde_json::from_str::<ContentId>("{}").is_err());
    }
}
