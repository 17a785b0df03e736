//! Hashing and signing of request envelopes.
//!
//! The signed pre-image is the compact JSON of `{"method", "params"}` taken
//! from the unsigned body, params in wire order with absent optionals
//! omitted. The digest is Keccak-256. `jsonrpc` and `id` are transport
//! metadata and are not signed.

use crate::content_id::ContentId;
use crate::error::{RequestError, SdkError};
use crate::http::HttpRequest;
use crate::signer::{keccak256, recover_address, PrivateKey, Signer};

use super::wire::{RequestBody, RequestId, RequestParams, SigningPayload};
use super::BubbleRequest;

/// Digest used over the signing pre-image.
pub const SIGNATURE_DIGEST: &str = "keccak256";

fn signing_payload(method: &str, params: &RequestParams) -> Result<Vec<u8>, RequestError> {
    Ok(serde_json::to_vec(&SigningPayload { method, params })?)
}

impl BubbleRequest {
    /// The exact bytes that are hashed for signing.
    pub fn signing_payload(&self) -> Result<Vec<u8>, RequestError> {
        signing_payload(self.method(), self.params())
    }

    /// Keccak-256 of [`signing_payload`](BubbleRequest::signing_payload).
    pub fn hash(&self) -> Result<[u8; 32], RequestError> {
        Ok(keccak256(&self.signing_payload()?))
    }

    /// Sign the request. Consumes it, so a request can only be signed once.
    pub async fn sign(self, signer: &Signer) -> Result<SignedBubbleRequest, SdkError> {
        let hash = self.hash()?;
        let signature = signer.sign(hash).await?;
        Ok(self.into_signed(signature))
    }

    /// Synchronous signing with a raw private key.
    pub fn sign_with_key(self, key: &PrivateKey) -> Result<SignedBubbleRequest, SdkError> {
        let hash = self.hash()?;
        let signature = key.sign_hash(&hash)?.to_hex();
        Ok(self.into_signed(signature))
    }

    fn into_signed(self, signature: String) -> SignedBubbleRequest {
        let BubbleRequest {
            content_id,
            url,
            mut body,
        } = self;
        body.params.signature = Some(signature);

        tracing::debug!(method = %body.method, id = %body.id, "Signed bubble request");

        SignedBubbleRequest {
            content_id,
            url,
            body,
        }
    }
}

/// A signed, immutable Bubble request ready for transport.
#[derive(Debug, Clone, PartialEq)]
pub struct SignedBubbleRequest {
    content_id: ContentId,
    url: String,
    body: RequestBody,
}

impl SignedBubbleRequest {
    pub fn content_id(&self) -> &ContentId {
        &self.content_id
    }

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

    pub fn signature(&self) -> &str {
        self.body.params.signature.as_deref().unwrap_or_default()
    }

    pub fn into_body(self) -> RequestBody {
        self.body
    }

    /// The wire JSON, signature included.
    pub fn to_json(&self) -> Result<String, RequestError> {
        Ok(serde_json::to_string(&self.body)?)
    }

    /// The hash that was signed, recomputed without the signature.
    pub fn hash(&self) -> Result<[u8; 32], RequestError> {
        let params = RequestParams {
            signature: None,
            ..self.body.params.clone()
        };
        Ok(keccak256(&signing_payload(&self.body.method, &params)?))
    }

    /// Recover the address that signed this request.
    ///
    /// Only meaningful for private-key signatures; a sign function may have
    /// returned anything.
    pub fn recover_signer(&self) -> Result<String, SdkError> {
        let hash = self.hash()?;
        Ok(recover_address(&hash, self.signature())?)
    }

    /// A plain POST description of this request for any HTTP client.
    pub fn http_request(&self) -> Result<HttpRequest, RequestError> {
        Ok(HttpRequest::post_json(&self.url, self.to_json()?))
    }
}
