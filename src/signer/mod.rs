//! Request signing — secp256k1 private keys or caller-supplied sign functions.
//!
//! A private key produces a 65-byte recoverable signature: compact `r || s`
//! followed by `27 + recovery_id`, hex-encoded (130 characters). A sign
//! function receives the 32-byte hash and its output is embedded verbatim.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use sha3::{Digest, Keccak256};

use crate::error::SignError;
use crate::shared::strip_hex_prefix;

/// Length of an encoded recoverable signature in bytes.
pub const SIGNATURE_LEN: usize = 65;

/// Offset added to the recovery id in the final signature byte.
const RECOVERY_OFFSET: u8 = 27;

/// Compute the 32-byte Keccak-256 digest of `data`.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

// ============================================================================
// Private key
// ============================================================================

/// A secp256k1 private key.
#[derive(Clone)]
pub struct PrivateKey(SigningKey);

impl PrivateKey {
    /// Parse a 32-byte key from hex, with or without a `0x` prefix.
    pub fn from_hex(key: &str) -> Result<Self, SignError> {
        let bytes = hex::decode(strip_hex_prefix(key))
            .map_err(|e| SignError::InvalidPrivateKey(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SignError> {
        SigningKey::from_slice(bytes)
            .map(Self)
            .map_err(|e| SignError::InvalidPrivateKey(e.to_string()))
    }

    /// Generate a fresh key from the thread-local CSPRNG.
    pub fn random() -> Self {
        Self(SigningKey::random(&mut rand::thread_rng()))
    }

    /// The `0x`-prefixed lowercase address controlled by this key.
    pub fn address(&self) -> String {
        address_from_key(self.0.verifying_key())
    }

    /// Sign a 32-byte hash.
    pub fn sign_hash(&self, hash: &[u8; 32]) -> Result<RecoverableSignature, SignError> {
        let (signature, recovery_id) = self
            .0
            .sign_prehash_recoverable(hash)
            .map_err(|e| SignError::Signing(e.to_string()))?;

        let mut bytes = [0u8; SIGNATURE_LEN];
        bytes[..64].copy_from_slice(&signature.to_bytes());
        bytes[64] = RECOVERY_OFFSET + recovery_id.to_byte();
        Ok(RecoverableSignature(bytes))
    }
}

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("PrivateKey").field(&self.address()).finish()
    }
}

// ============================================================================
// Recoverable signature
// ============================================================================

/// `r || s || v` with `v = 27 + recovery_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoverableSignature([u8; SIGNATURE_LEN]);

impl RecoverableSignature {
    /// Parse a 65-byte hex signature. A `v` of 0/1 is accepted as well as 27/28.
    pub fn from_hex(signature: &str) -> Result<Self, SignError> {
        let bytes = hex::decode(strip_hex_prefix(signature))
            .map_err(|e| SignError::InvalidSignature(e.to_string()))?;
        let bytes: [u8; SIGNATURE_LEN] = bytes.try_into().map_err(|b: Vec<u8>| {
            SignError::InvalidSignature(format!(
                "expected {} bytes, got {}",
                SIGNATURE_LEN,
                b.len()
            ))
        })?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LEN] {
        &self.0
    }

    /// Lowercase hex, 130 characters, no prefix.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Recover the address that produced this signature over `hash`.
    pub fn recover_address(&self, hash: &[u8; 32]) -> Result<String, SignError> {
        let v = self.0[64];
        let recovery_byte = if v >= RECOVERY_OFFSET {
            v - RECOVERY_OFFSET
        } else {
            v
        };
        let recovery_id = RecoveryId::from_byte(recovery_byte)
            .ok_or_else(|| SignError::InvalidSignature(format!("invalid recovery byte {}", v)))?;
        let signature = Signature::from_slice(&self.0[..64])
            .map_err(|e| SignError::InvalidSignature(e.to_string()))?;

        let key = VerifyingKey::recover_from_prehash(hash, &signature, recovery_id)
            .map_err(|_| SignError::Recovery)?;
        Ok(address_from_key(&key))
    }
}

impl std::fmt::Display for RecoverableSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Recover the signer address from a hash and a hex-encoded signature.
pub fn recover_address(hash: &[u8; 32], signature: &str) -> Result<String, SignError> {
    RecoverableSignature::from_hex(signature)?.recover_address(hash)
}

/// Last 20 bytes of Keccak-256 over the uncompressed public key (sans 0x04).
fn address_from_key(key: &VerifyingKey) -> String {
    let point = key.to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    format!("0x{}", hex::encode(&hash[12..]))
}

// ============================================================================
// Sign functions
// ============================================================================

/// A caller-supplied signer, e.g. a hardware wallet or remote KMS.
///
/// Receives the 32-byte request hash. The returned string becomes the
/// request signature unchanged.
#[async_trait]
pub trait SignFunction: Send + Sync {
    async fn sign(&self, hash: [u8; 32]) -> Result<String, SignError>;
}

#[async_trait]
impl<F, Fut> SignFunction for F
where
    F: Fn([u8; 32]) -> Fut + Send + Sync,
    Fut: Future<Output = Result<String, SignError>> + Send + 'static,
{
    async fn sign(&self, hash: [u8; 32]) -> Result<String, SignError> {
        (self)(hash).await
    }
}

/// Either a raw private key or a sign function.
#[derive(Clone)]
pub enum Signer {
    PrivateKey(PrivateKey),
    Function(Arc<dyn SignFunction>),
}

impl Signer {
    pub fn function(f: impl SignFunction + 'static) -> Self {
        Self::Function(Arc::new(f))
    }

    /// Sign a request hash.
    pub async fn sign(&self, hash: [u8; 32]) -> Result<String, SignError> {
        match self {
            Self::PrivateKey(key) => Ok(key.sign_hash(&hash)?.to_hex()),
            Self::Function(f) => f.sign(hash).await,
        }
    }

    /// The signer's address, when it is known locally.
    pub fn address(&self) -> Option<String> {
        match self {
            Self::PrivateKey(key) => Some(key.address()),
            Self::Function(_) => None,
        }
    }
}

impl From<PrivateKey> for Signer {
    fn from(key: PrivateKey) -> Self {
        Self::PrivateKey(key)
    }
}

impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PrivateKey(key) => f.debug_tuple("PrivateKey").field(&key.address()).finish(),
            Self::Function(_) => f.write_str("Function(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY_ONE: &str = "0x0000000000000000000000000000000000000000000000000000000000000001";
    const TEST_KEY: &str = "24802edc1eba0f578dcffd6ada3c5b954a8e76e55ba830cf19a3083d489a6063";

    #[test]
    fn test_keccak256_empty() {
        assert_eq!(
            hex::encode(keccak256(b"")),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn test_address_of_key_one() {
        let key = PrivateKey::from_hex(KEY_ONE).unwrap();
        assert_eq!(key.address(), "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf");
    }

    #[test]
    fn test_from_hex_rejects_bad_keys() {
        assert!(PrivateKey::from_hex("zz").is_err());
        assert!(PrivateKey::from_hex("0102").is_err());
        assert!(PrivateKey::from_hex(&"00".repeat(32)).is_err());
    }

    #[test]
    fn test_sign_hash_format() {
        let key = PrivateKey::from_hex(TEST_KEY).unwrap();
        let sig = key.sign_hash(&keccak256(b"hello")).unwrap();
        let hex = sig.to_hex();
        assert_eq!(hex.len(), 130);
        assert!(hex.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')));
        assert!(sig.as_bytes()[64] == 27 || sig.as_bytes()[64] == 28);
    }

    #[test]
    fn test_sign_hash_is_deterministic() {
        let key = PrivateKey::from_hex(TEST_KEY).unwrap();
        let hash = keccak256(b"hello");
        assert_eq!(key.sign_hash(&hash).unwrap(), key.sign_hash(&hash).unwrap());
    }

    #[test]
    fn test_recover_address_roundtrip() {
        let key = PrivateKey::from_hex(TEST_KEY).unwrap();
        let hash = keccak256(b"bubble");
        let sig = key.sign_hash(&hash).unwrap();
        assert_eq!(recover_address(&hash, &sig.to_hex()).unwrap(), key.address());
        assert_ne!(
            recover_address(&keccak256(b"other"), &sig.to_hex()).unwrap(),
            key.address()
        );
    }

    #[test]
    fn test_recover_accepts_raw_recovery_id() {
        let key = PrivateKey::random();
        let hash = keccak256(b"raw v");
        let mut bytes = *key.sign_hash(&hash).unwrap().as_bytes();
        bytes[64] -= 27;
        assert_eq!(
            recover_address(&hash, &hex::encode(bytes)).unwrap(),
            key.address()
        );
    }

    #[test]
    fn test_signature_from_hex_wrong_length() {
        assert!(matches!(
            RecoverableSignature::from_hex("abcd"),
            Err(SignError::InvalidSignature(_))
        ));
    }

    #[test]
    fn test_signer_function() {
        let signer = Signer::function(|_hash: [u8; 32]| async { Ok::<_, SignError>("hello".to_string()) });
        let sig = tokio_test::block_on(signer.sign([0u8; 32])).unwrap();
        assert_eq!(sig, "hello");
        assert!(signer.address().is_none());
    }

    #[test]
    fn test_signer_private_key() {
        let key = PrivateKey::from_hex(TEST_KEY).unwrap();
        let hash = keccak256(b"x");
        let signer = Signer::from(key.clone());
        let sig = tokio_test::block_on(signer.sign(hash)).unwrap();
        assert_eq!(sig, key.sign_hash(&hash).unwrap().to_hex());
        assert_eq!(signer.address(), Some(key.address()));
    }

    #[test]
    fn test_debug_does_not_leak_key() {
        let key = PrivateKey::from_hex(TEST_KEY).unwrap();
        assert!(!format!("{:?}", key).contains(TEST_KEY));
    }
}
