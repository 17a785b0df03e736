//! Input shapes accepted by the content id codec.
//!
//! A raw input is first classified into exactly one [`ContentIdInput`]
//! variant, then resolved into an unvalidated [`RawContentId`] record. The
//! record is validated in one place regardless of where it came from.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use serde_json::{Map, Value};

use super::ContentId;
use crate::error::ContentIdError;
use crate::shared::{is_hex, strip_hex_prefix};

/// Prefix of a Bubble DID.
pub const DID_PREFIX: &str = "did:bubble:";

/// URL-safe alphabet, padding optional. Standard-alphabet input is mapped
/// onto it before decoding.
const BASE64_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// An unvalidated content id record.
///
/// Fields keep their JSON form so that validation errors can report exactly
/// what the caller attempted. Unknown fields are never captured.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawContentId {
    pub chain: Option<Value>,
    pub contract: Option<Value>,
    pub provider: Option<Value>,
    pub file: Option<Value>,
}

impl RawContentId {
    /// Pick the content id fields out of a JSON object. `chainId` is accepted
    /// as an alias for `chain` and wins when both are set.
    pub fn from_map(map: &Map<String, Value>) -> Self {
        let field = |name: &str| map.get(name).filter(|v| !v.is_null()).cloned();
        Self {
            chain: field("chainId").or_else(|| field("chain")),
            contract: field("contract"),
            provider: field("provider"),
            file: field("file"),
        }
    }
}

impl From<&ContentId> for RawContentId {
    fn from(id: &ContentId) -> Self {
        Self {
            chain: Some(Value::from(id.chain())),
            contract: Some(Value::from(id.contract())),
            provider: Some(Value::from(id.provider())),
            file: id.file().map(|f| Value::from(f.to_string())),
        }
    }
}

/// Every shape a content id can be decoded from.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentIdInput {
    /// No input at all (including the empty string).
    Missing,
    /// An already validated content id.
    Id(ContentId),
    /// A structured record with `chain`/`chainId`, `contract`, `provider`
    /// and optional `file`.
    Record(RawContentId),
    /// `<provider>/<chain>/<contract>[/<file>]`.
    Url(String),
    /// `did:<method>:<base64>`; only the `bubble` method is recognised.
    Did(String),
    /// Base64 (standard or URL-safe, padding optional) of the JSON record.
    Base64(String),
}

impl ContentIdInput {
    /// Classify a string input.
    ///
    /// The base64 alphabets never contain `:`, so any string with a colon is
    /// either a DID or a URL.
    pub fn classify(input: &str) -> Self {
        if input.is_empty() {
            Self::Missing
        } else if input.starts_with("did:") {
            Self::Did(input.to_string())
        } else if input.contains(':') {
            Self::Url(input.to_string())
        } else {
            Self::Base64(input.to_string())
        }
    }

    /// Resolve the input into an unvalidated record.
    pub fn resolve(self) -> Result<RawContentId, ContentIdError> {
        match self {
            Self::Missing => Err(ContentIdError::Missing),
            Self::Id(id) => Ok(RawContentId::from(&id)),
            Self::Record(raw) => Ok(raw),
            Self::Url(url) => parse_url(&url),
            Self::Did(did) => parse_did(&did),
            Self::Base64(encoded) => parse_base64(&encoded, &encoded),
        }
    }
}

impl From<&str> for ContentIdInput {
    fn from(input: &str) -> Self {
        Self::classify(input)
    }
}

impl From<String> for ContentIdInput {
    fn from(input: String) -> Self {
        Self::classify(&input)
    }
}

impl From<&String> for ContentIdInput {
    fn from(input: &String) -> Self {
        Self::classify(input)
    }
}

impl From<ContentId> for ContentIdInput {
    fn from(id: ContentId) -> Self {
        Self::Id(id)
    }
}

impl From<&ContentId> for ContentIdInput {
    fn from(id: &ContentId) -> Self {
        Self::Id(id.clone())
    }
}

impl From<RawContentId> for ContentIdInput {
    fn from(raw: RawContentId) -> Self {
        Self::Record(raw)
    }
}

impl From<Value> for ContentIdInput {
    fn from(value: Value) -> Self {
        Self::from(&value)
    }
}

impl From<&Value> for ContentIdInput {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => Self::Missing,
            Value::String(s) => Self::classify(s),
            Value::Object(map) => Self::Record(RawContentId::from_map(map)),
            // Not a record: every required field is reported as missing.
            _ => Self::Record(RawContentId::default()),
        }
    }
}

impl<T: Into<ContentIdInput>> From<Option<T>> for ContentIdInput {
    fn from(input: Option<T>) -> Self {
        input.map(Into::into).unwrap_or(Self::Missing)
    }
}

fn parse_did(did: &str) -> Result<RawContentId, ContentIdError> {
    match did.strip_prefix(DID_PREFIX) {
        Some(encoded) => parse_base64(encoded, did),
        None => Err(ContentIdError::MalformedEncoding {
            input: did.to_string(),
        }),
    }
}

fn parse_base64(encoded: &str, original: &str) -> Result<RawContentId, ContentIdError> {
    let malformed = || ContentIdError::MalformedEncoding {
        input: original.to_string(),
    };

    let url_safe: String = encoded
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            c => c,
        })
        .collect();
    let bytes = BASE64_LENIENT.decode(url_safe).map_err(|_| malformed())?;

    match serde_json::from_slice::<Value>(&bytes).map_err(|_| malformed())? {
        Value::Object(map) => Ok(RawContentId::from_map(&map)),
        _ => Err(malformed()),
    }
}

/// A file id is a directory with an optional name.
const MAX_FILE_SEGMENTS: usize = 2;

fn parse_url(input: &str) -> Result<RawContentId, ContentIdError> {
    let malformed = || ContentIdError::MalformedUrl {
        input: input.to_string(),
    };

    let (scheme, rest) = input.split_once("://").ok_or_else(malformed)?;
    let (authority, path) = rest.split_once('/').unwrap_or((rest, ""));
    if scheme.is_empty() || authority.is_empty() {
        return Err(malformed());
    }

    // Segments are kept verbatim: a file name may legally contain `?`, `#`
    // or `%`, none of which are given URL meaning here.
    let segments: Vec<&str> = path.split('/').collect();

    // The file is at most `<directory>/<name>`, so the contract is one of the
    // last three segments. Searching from the end keeps a provider path that
    // itself looks like `<chain>/<contract>` inside the provider.
    let first_candidate = segments.len().saturating_sub(MAX_FILE_SEGMENTS + 1).max(1);
    let contract_at = (first_candidate..segments.len())
        .rev()
        .find(|&i| is_contract_segment(segments[i]) && is_chain_segment(segments[i - 1]))
        .ok_or_else(malformed)?;

    let chain: u64 = segments[contract_at - 1].parse().map_err(|_| malformed())?;

    let mut provider = format!("{}://{}", scheme, authority);
    for segment in &segments[..contract_at - 1] {
        provider.push('/');
        provider.push_str(segment);
    }

    let file = segments[contract_at + 1..].join("/");

    Ok(RawContentId {
        chain: Some(Value::from(chain)),
        contract: Some(Value::from(segments[contract_at])),
        provider: Some(Value::from(provider)),
        file: (!file.is_empty()).then(|| Value::from(file)),
    })
}

fn is_chain_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment.bytes().all(|b| b.is_ascii_digit())
        && segment.parse::<u64>().is_ok()
}

fn is_contract_segment(segment: &str) -> bool {
    let hex = strip_hex_prefix(segment);
    hex.len() == 40 && is_hex(hex)
}
