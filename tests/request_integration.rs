//! Integration tests for building and signing Bubble requests.

use bubble_sdk::content_id::ContentId;
use bubble_sdk::error::{RequestError, SdkError, SignError};
use bubble_sdk::request::{BubbleRequest, RequestId, RequestOptions, SIGNATURE_DIGEST};
use bubble_sdk::signer::{keccak256, recover_address, PrivateKey, Signer};
use serde_json::{json, Value};

const CONTRACT: &str = "0xeffda76da1ce4Da42F0f02Fc5f8419DDd201A8bb";
const PROVIDER: &str = "http://127.0.0.1:8131/v2/ethereum";
const FILE: &str = "0x0000000000000000000000000000000000000000000000000000000000000001/a.txt";
const TEST_KEY: &str = "0x24802edc1eba0f578dcffd6ada3c5b954a8e76e55ba830cf19a3083d489a6063";

fn content_id() -> ContentId {
    ContentId::new(1, CONTRACT, PROVIDER)
        .unwrap()
        .with_file(FILE)
        .unwrap()
}

fn body_json(request: &BubbleRequest) -> Value {
    serde_json::from_str(&request.to_json().unwrap()).unwrap()
}

fn keys(value: &Value) -> Vec<String> {
    value.as_object().unwrap().keys().cloned().collect()
}

// =============================================================================
// Construction
// =============================================================================

mod construction {
    use super::*;

    #[test]
    fn test_fails_without_content_id() {
        let err = BubbleRequest::new("", RequestOptions::new()).unwrap_err();
        assert_eq!(err.to_string(), "Failed to construct ContentId from nothing");
    }

    #[test]
    fn test_fails_with_empty_record() {
        let err = BubbleRequest::new(json!({}), RequestOptions::new()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Failed to parse ContentId from {chain: NaN, contract: absent, provider: absent}"
        );
    }

    #[test]
    fn test_fails_with_bad_url() {
        let err = BubbleRequest::new("https://webapi.com", RequestOptions::new()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Failed to construct ContentId from https://webapi.com (must contain chain, contract and (optionally) file)"
        );
    }

    #[test]
    fn test_fails_with_non_object_options() {
        let err = BubbleRequest::from_json(content_id(), &json!("hello")).unwrap_err();
        assert!(matches!(err, RequestError::InvalidOptions(_)));
        assert!(err
            .to_string()
            .starts_with("Failed to construct BubbleRequest - invalid options parameter"));
    }

    #[test]
    fn test_accepts_every_content_id_shape() {
        let id = content_id();
        let inputs: Vec<Value> = vec![
            id.to_object(),
            json!(id.to_base64()),
            json!(id.to_did()),
            json!(id.to_url()),
        ];
        for input in inputs {
            let request = BubbleRequest::new(input, RequestOptions::new()).unwrap();
            assert_eq!(request.content_id(), &id);
            assert_eq!(request.url(), PROVIDER);
        }

        let bubble_only = id.without_file();
        let request = BubbleRequest::new(bubble_only.to_url(), RequestOptions::new()).unwrap();
        assert_eq!(request.content_id(), &bubble_only);
    }
}

// =============================================================================
// Defaults
// =============================================================================

mod defaults {
    use super::*;

    #[test]
    fn test_body_fields() {
        let request = BubbleRequest::new(content_id(), RequestOptions::new()).unwrap();
        let body = body_json(&request);

        assert_eq!(keys(&body), ["jsonrpc", "id", "method", "params"]);
        assert_eq!(body["jsonrpc"], "2.0");
        assert_eq!(body["method"], "read");
        assert_eq!(body["id"], body["params"]["nonce"]);
        assert!(body["params"]["timestamp"].is_i64());
        assert_eq!(body["params"]["chainId"], 1);
        assert_eq!(body["params"]["contract"], CONTRACT);
        assert_eq!(body["params"]["file"], FILE);
        assert_eq!(
            keys(&body["params"]),
            ["timestamp", "nonce", "chainId", "contract", "file"]
        );
    }
}

// =============================================================================
// Options
// =============================================================================

mod options {
    use super::*;

    #[test]
    fn test_typed_options() {
        let options = RequestOptions::new()
            .jsonrpc("1.0")
            .id("123")
            .method("write")
            .data("Hello, World!")
            .options("Hello, World!")
            .url("https://overridden.com/");
        let request = BubbleRequest::new(content_id(), options).unwrap();
        let body = body_json(&request);

        assert_eq!(body["jsonrpc"], "1.0");
        assert_eq!(body["id"], "123");
        assert_eq!(body["method"], "write");
        assert_eq!(body["params"]["data"], "Hello, World!");
        assert_eq!(body["params"]["options"], "Hello, World!");
        assert_eq!(request.url(), "https://overridden.com/");
    }

    #[test]
    fn test_json_options() {
        let options = json!({
            "url": "https://overridden.com/",
            "body": {
                "jsonrpc": "1.0",
                "id": 5,
                "method": "list",
                "params": {"nonce": "abc", "timestamp": 42, "options": {"long": true}}
            }
        });
        let request = BubbleRequest::from_json(content_id(), &options).unwrap();
        assert_eq!(request.url(), "https://overridden.com/");
        assert_eq!(request.id(), &RequestId::Number(5));
        assert_eq!(request.method(), "list");
        assert_eq!(request.params().nonce, "abc");
        assert_eq!(request.params().timestamp, 42);
        assert_eq!(request.params().options, Some(json!({"long": true})));
    }

    #[test]
    fn test_cannot_insert_additional_fields() {
        let options = json!({
            "body": {"testField": 1, "params": {"testField": 2}}
        });
        let request = BubbleRequest::from_json(content_id(), &options).unwrap();
        let body = body_json(&request);
        assert!(!keys(&body).contains(&"testField".to_string()));
        assert!(!keys(&body["params"]).contains(&"testField".to_string()));
    }

    #[test]
    fn test_content_id_fields_are_protected() {
        let options = json!({
            "body": {
                "params": {
                    "chainId": 137,
                    "contract": "0x1111111111111111111111111111111111111111",
                    "file": "0x02/b.txt"
                }
            }
        });
        let request = BubbleRequest::from_json(content_id(), &options).unwrap();
        assert_eq!(request.params().chain_id, 1);
        assert_eq!(request.params().contract, CONTRACT);
        assert_eq!(request.params().file.as_deref(), Some(FILE));
    }
}

// =============================================================================
// Signing
// =============================================================================

mod signing {
    use super::*;

    fn is_signature_hex(s: &str) -> bool {
        s.len() == 130 && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    }

    #[test]
    fn test_digest_constant() {
        assert_eq!(SIGNATURE_DIGEST, "keccak256");
    }

    #[tokio::test]
    async fn test_private_key_signature() {
        let key = PrivateKey::from_hex(TEST_KEY).unwrap();
        let request = BubbleRequest::new(content_id(), RequestOptions::new()).unwrap();
        let hash = keccak256(&request.signing_payload().unwrap());

        let signed = request.sign(&Signer::from(key.clone())).await.unwrap();
        assert!(is_signature_hex(signed.signature()));
        assert_eq!(recover_address(&hash, signed.signature()).unwrap(), key.address());
        assert_eq!(signed.recover_signer().unwrap(), key.address());
    }

    #[tokio::test]
    async fn test_signed_body_layout() {
        let key = PrivateKey::random();
        let request = BubbleRequest::new(content_id(), RequestOptions::new().data("x")).unwrap();
        let signed = request.sign(&key.into()).await.unwrap();
        let body: Value = serde_json::from_str(&signed.to_json().unwrap()).unwrap();
        assert_eq!(
            keys(&body["params"]),
            ["timestamp", "nonce", "chainId", "contract", "file", "data", "signature"]
        );
    }

    #[tokio::test]
    async fn test_sign_function() {
        let signer = Signer::function(|_hash: [u8; 32]| async { Ok::<_, SignError>("hello".to_string()) });
        let request = BubbleRequest::new(content_id(), RequestOptions::new()).unwrap();
        let signed = request.sign(&signer).await.unwrap();
        assert_eq!(signed.signature(), "hello");
    }

    #[tokio::test]
    async fn test_sign_function_failure() {
        let signer = Signer::function(|_hash: [u8; 32]| async {
            Err::<String, _>(SignError::Function("rejected by user".to_string()))
        });
        let request = BubbleRequest::new(content_id(), RequestOptions::new()).unwrap();
        let err = request.sign(&signer).await.unwrap_err();
        assert!(matches!(err, SdkError::Sign(SignError::Function(_))));
    }

    #[tokio::test]
    async fn test_tampering_changes_recovered_signer() {
        let key = PrivateKey::from_hex(TEST_KEY).unwrap();
        let request = BubbleRequest::new(content_id(), RequestOptions::new()).unwrap();
        let signed = request.sign_with_key(&key).unwrap();

        let mut body = signed.body().clone();
        body.params.chain_id = 137;
        body.params.signature = None;
        let payload = serde_json::to_vec(&json!({"method": body.method, "params": body.params})).unwrap();
        let recovered = recover_address(&keccak256(&payload), signed.signature()).unwrap();
        assert_ne!(recovered, key.address());
    }

    #[test]
    fn test_concurrent_signing_of_distinct_requests() {
        let key = PrivateKey::random();
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let key = key.clone();
                std::thread::spawn(move || {
                    let options = RequestOptions::new().nonce(format!("nonce-{}", i));
                    let request = BubbleRequest::new(content_id(), options).unwrap();
                    request.sign_with_key(&key).unwrap()
                })
            })
            .collect();
        for handle in handles {
            let signed = handle.join().unwrap();
            assert_eq!(signed.recover_signer().unwrap(), key.address());
        }
    }
}
