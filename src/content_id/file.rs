//! File field of a content id: a 32-byte directory optionally followed by a
//! POSIX file name.

use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::{ContentIdError, FileFieldReason};
use crate::shared::{is_hex, strip_hex_prefix};

/// Hex characters in a directory component (32 bytes).
pub const DIRECTORY_HEX_LEN: usize = 64;

/// Maximum length of the name component, in bytes.
pub const MAX_NAME_LEN: usize = 255;

/// The root directory of a bubble.
pub const ROOT_DIRECTORY: &str =
    "0x0000000000000000000000000000000000000000000000000000000000000000";

/// A normalized file id.
///
/// The directory is always `0x` followed by 64 lowercase hex characters. The
/// name, when present, is kept byte-for-byte as supplied.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileId {
    directory: String,
    name: Option<String>,
}

impl FileId {
    /// Validate and normalize a file id string.
    ///
    /// Accepts `[0x]<hex>` or `[0x]<hex>/<name>`. Short directory values are
    /// left-padded with zeros, so `"1"` and `"0x01"` both address directory 1.
    pub fn parse(file: &str) -> Result<Self, ContentIdError> {
        let invalid = |reason| ContentIdError::InvalidFile {
            file: file.to_string(),
            reason,
        };

        let mut parts = file.split('/');
        let directory = parts.next().unwrap_or_default();
        let name = parts.next();
        if parts.next().is_some() {
            return Err(invalid(FileFieldReason::TooManyParts));
        }

        let directory = strip_hex_prefix(directory);
        if directory.len() > DIRECTORY_HEX_LEN {
            return Err(invalid(FileFieldReason::DirectoryTooLong));
        }
        let padded = format!("{:0>width$}", directory, width = DIRECTORY_HEX_LEN);
        if !is_hex(&padded) {
            return Err(invalid(FileFieldReason::InvalidHex));
        }

        if let Some(name) = name {
            if name.len() > MAX_NAME_LEN {
                return Err(invalid(FileFieldReason::NameTooLong));
            }
            if name.contains('\0') || name == "." || name == ".." {
                return Err(invalid(FileFieldReason::InvalidName));
            }
        }

        Ok(Self {
            directory: format!("0x{}", padded.to_ascii_lowercase()),
            name: name.map(str::to_string),
        })
    }

    /// Validate a file field taken from a JSON record.
    ///
    /// `null` and the empty string mean "no file". Integers are stringified
    /// before validation; any other JSON type is rejected.
    pub fn from_value(value: &Value) -> Result<Option<Self>, ContentIdError> {
        match value {
            Value::Null => Ok(None),
            Value::String(s) if s.is_empty() => Ok(None),
            Value::String(s) => Self::parse(s).map(Some),
            Value::Number(n) => Self::parse(&n.to_string()).map(Some),
            other => Err(ContentIdError::InvalidFile {
                file: other.to_string(),
                reason: FileFieldReason::InvalidType,
            }),
        }
    }

    /// The `0x`-prefixed, lowercase, 64 hex character directory.
    pub fn directory(&self) -> &str {
        &self.directory
    }

    /// The file name within the directory, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// True if this id addresses a directory rather than a file within one.
    pub fn is_directory(&self) -> bool {
        self.name.is_none()
    }
}

impl std::fmt::Display for FileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{}/{}", self.directory, name),
            None => write!(f, "{}", self.directory),
        }
    }
}

impl FromStr for FileId {
    type Err = ContentIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for FileId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FileId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
