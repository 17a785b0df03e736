//! Unified SDK error types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Top-level SDK error.
#[derive(Error, Debug)]
pub enum SdkError {
    #[error("Content id error: {0}")]
    ContentId(#[from] ContentIdError),

    #[error("Request error: {0}")]
    Request(#[from] RequestError),

    #[error("Signing error: {0}")]
    Sign(#[from] SignError),

    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    #[error("{0}")]
    Rpc(#[from] RpcError),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Result type alias for SDK operations.
pub type SdkResult<T> = Result<T, SdkError>;

/// Content id construction errors.
///
/// All of these are raised synchronously while decoding; a `ContentId` either
/// fully validates or is not produced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContentIdError {
    /// No identifier input was supplied at all.
    #[error("Failed to construct ContentId from nothing")]
    Missing,

    /// Base64 or JSON decode failure, or a DID with an unrecognised method.
    #[error("Failed to parse ContentId from base64: {input}")]
    MalformedEncoding { input: String },

    /// A URL that does not carry a chain and contract after the provider.
    #[error("Failed to construct ContentId from {input} (must contain chain, contract and (optionally) file)")]
    MalformedUrl { input: String },

    /// `chain`, `contract` or `provider` missing or failing its format check.
    #[error("Failed to parse ContentId from {{chain: {chain}, contract: {contract}, provider: {provider}}}")]
    InvalidField {
        chain: AttemptedValue,
        contract: AttemptedValue,
        provider: AttemptedValue,
    },

    /// The `file` field is malformed.
    #[error("Failed to parse ContentId file from {file} ({reason})")]
    InvalidFile {
        file: String,
        reason: FileFieldReason,
    },
}

/// The value a caller attempted to use for a content id field, kept for
/// diagnostics when validation fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptedValue {
    /// The field was not supplied.
    Absent,
    /// The chain was supplied but is not a number.
    NotANumber,
    /// The field as supplied. A contract is shown without `0x` when chain
    /// and provider were valid.
    Value(String),
}

impl std::fmt::Display for AttemptedValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Absent => write!(f, "absent"),
            Self::NotANumber => write!(f, "NaN"),
            Self::Value(v) => write!(f, "{}", v),
        }
    }
}

/// Why a file field was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFieldReason {
    /// Neither a string nor an integer.
    InvalidType,
    /// More than one `/` separator.
    TooManyParts,
    /// Directory component longer than 64 hex characters.
    DirectoryTooLong,
    /// Directory component contains non-hex characters.
    InvalidHex,
    /// Name component longer than 255 bytes.
    NameTooLong,
    /// Name component is `.`, `..` or contains NUL.
    InvalidName,
}

impl FileFieldReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidType => "must be a string or integer",
            Self::TooManyParts => "too many nested parts",
            Self::DirectoryTooLong => "file name too long",
            Self::InvalidHex => "invalid hex characters",
            Self::NameTooLong => "path extension too long",
            Self::InvalidName => "invalid POSIX file name",
        }
    }
}

impl std::fmt::Display for FileFieldReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Envelope construction errors.
#[derive(Error, Debug)]
pub enum RequestError {
    /// Content id errors propagate unchanged.
    #[error(transparent)]
    ContentId(#[from] ContentIdError),

    #[error("Failed to construct BubbleRequest - invalid options parameter ({0})")]
    InvalidOptions(String),

    #[error("Failed to serialize request body: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Signing and signature recovery errors.
#[derive(Error, Debug)]
pub enum SignError {
    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("Public key recovery failed")]
    Recovery,

    /// Error returned by a caller-supplied sign function.
    #[error("Sign function failed: {0}")]
    Function(String),
}

/// Transport-level errors: the provider could not be reached or did not
/// answer with a 2xx JSON payload.
#[derive(Error, Debug)]
pub enum HttpError {
    #[cfg(feature = "http")]
    #[error("Request failed: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Request failed: ({status}) {body}")]
    Status { status: u16, body: String },

    #[error("Unexpected provider response: {0}")]
    InvalidResponse(String),

    #[error("Invalid HTTP request: {0}")]
    InvalidRequest(String),
}

/// Protocol-level error reported by a storage provider in an
/// `{"error": {"code", "message"}}` payload.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("Bubble error: ({code}) {message}")]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}
