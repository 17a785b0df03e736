//! # Bubble SDK
//!
//! Rust SDK for the Bubble Protocol's off-chain, access-controlled storage.
//!
//! ## Architecture
//!
//! The SDK is organized in layers:
//!
//! 1. **Core** — `ContentId` codec: record, base64, `did:bubble:` and URL forms
//! 2. **Signing** — secp256k1 private keys or caller-supplied sign functions
//! 3. **Requests** — JSON-RPC envelope builder and single-use signing
//! 4. **HTTP** — `HttpRequest` value type and the reqwest-backed `BubbleHttp`
//! 5. **High-Level Client** — `BubbleClient` with `read` / `write` / `list`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use bubble_sdk::prelude::*;
//!
//! let key = PrivateKey::from_hex(&std::env::var("PRIVATE_KEY")?)?;
//! let client = BubbleClient::new(key)?;
//!
//! let file = ContentId::parse("did:bubble:eyJjaGFpbiI6MSwi...")?.with_file("0x01/hello.txt")?;
//! client.write(&file, "hello world").await?;
//! let contents = client.read(&file).await?;
//! ```

// ── Layer 1: Core ────────────────────────────────────────────────────────────

/// Hex and clock helpers.
pub mod shared;

/// Content id parsing, validation and encoding.
pub mod content_id;

/// Unified SDK error types.
pub mod error;

// ── Layer 2: Signing ─────────────────────────────────────────────────────────

/// Private keys, sign functions and signature recovery.
pub mod signer;

// ── Layer 3: Requests ────────────────────────────────────────────────────────

/// Request envelopes: build, hash, sign.
pub mod request;

// ── Layer 4: HTTP ────────────────────────────────────────────────────────────

/// HTTP request description and transport.
pub mod http;

// ── Layer 5: High-Level Client ───────────────────────────────────────────────

/// `BubbleClient` — the primary entry point.
#[cfg(feature = "http")]
pub mod client;

// ── Prelude ──────────────────────────────────────────────────────────────────

pub mod prelude {
    // Content ids
    pub use crate::content_id::{ContentId, ContentIdInput, ContentIdOverrides, FileId};

    // Signing
    pub use crate::signer::{recover_address, PrivateKey, SignFunction, Signer};

    // Requests
    pub use crate::request::{
        BubbleRequest, RequestBody, RequestId, RequestOptions, RequestParams,
        SignedBubbleRequest, SIGNATURE_DIGEST,
    };

    // Errors
    pub use crate::error::{ContentIdError, RequestError, RpcError, SdkError, SdkResult, SignError};

    // HTTP
    pub use crate::http::HttpRequest;

    #[cfg(feature = "http")]
    pub use crate::client::{BubbleClient, BubbleClientBuilder, ResponseFormat};
    #[cfg(feature = "http")]
    pub use crate::http::BubbleHttp;
}
