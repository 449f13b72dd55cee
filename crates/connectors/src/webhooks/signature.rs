//! HMAC-SHA256 webhook signatures

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::models::{WebhookConfig, WebhookRequest};
use crate::{ConnectorError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Compute the lowercase hex signature of `body`
pub fn sign(secret: &str, body: &[u8]) -> Result<String> {
    let mut mac = new_mac(secret)?;
    mac.update(body);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Verify a signature header value against `body`
///
/// Accepts raw hex or `sha256=<hex>`. The comparison is constant-time.
pub fn verify_signature(secret: &str, signature: &str, body: &[u8]) -> Result<()> {
    let signature = signature.trim();
    let signature = signature.strip_prefix("sha256=").unwrap_or(signature);
    let provided = hex::decode(signature)
        .map_err(|_| ConnectorError::WebhookVerification("signature is not valid hex".into()))?;

    let mut mac = new_mac(secret)?;
    mac.update(body);
    mac.verify_slice(&provided)
        .map_err(|_| ConnectorError::WebhookVerification("signature mismatch".into()))
}

/// Verify an inbound request against its endpoint config
///
/// The secret comes from the config metadata and the signature from
/// `header`. A missing secret or header is a configuration error, not a
/// signature failure.
pub fn verify_request(config: &WebhookConfig, request: &WebhookRequest, header: &str) -> Result<()> {
    let secret = config.secret().ok_or_else(|| {
        ConnectorError::WebhookConfiguration(format!(
            "no signing secret configured for webhook {}",
            config.name
        ))
    })?;
    let signature = request.header(header).ok_or_else(|| {
        ConnectorError::WebhookConfiguration(format!("missing {} header", header))
    })?;

    verify_signature(secret, signature, &request.body).inspect_err(|_| {
        log::warn!("Rejected webhook {} with invalid signature", config.name);
    })
}

fn new_mac(secret: &str) -> Result<HmacSha256> {
    HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| ConnectorError::WebhookConfiguration(format!("unusable secret: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Metadata, SECRET_METADATA_KEY};

    const SECRET: &str = "whsec_test";
    const BODY: &[u8] = br#"{"eventType":"payment.created","resourceId":"pay-1"}"#;

    fn config(secret: Option<&str>) -> WebhookConfig {
        let mut metadata = Metadata::new();
        if let Some(secret) = secret {
            metadata.insert(SECRET_METADATA_KEY.into(), secret.into());
        }
        WebhookConfig {
            name: "payment.created".into(),
            url_path: "/payment/created".into(),
            metadata,
        }
    }

    #[test]
    fn test_signature_round_trip_and_prefix() {
        let signature = sign(SECRET, BODY).unwrap();
        assert_eq!(signature.len(), 64);
        assert!(verify_signature(SECRET, &signature, BODY).is_ok());
        assert!(verify_signature(SECRET, &format!("sha256={}", signature), BODY).is_ok());
        assert!(verify_signature("other", &signature, BODY).is_err());
    }

    #[test]
    fn test_any_flipped_byte_fails() {
        let signature = sign(SECRET, BODY).unwrap();
        for i in 0..BODY.len() {
            let mut tampered = BODY.to_vec();
            tampered[i] ^= 0x01;
            assert!(
                matches!(
                    verify_signature(SECRET, &signature, &tampered),
                    Err(ConnectorError::WebhookVerification(_))
                ),
                "byte {} flipped",
                i
            );
        }
    }

    #[test]
    fn test_non_hex_signature_is_verification_failure() {
        assert!(matches!(
            verify_signature(SECRET, "zz-not-hex", BODY),
            Err(ConnectorError::WebhookVerification(_))
        ));
    }

    #[test]
    fn test_missing_secret_or_header_is_configuration_error() {
        let signature = sign(SECRET, BODY).unwrap();
        let signed = WebhookRequest::new(BODY.to_vec()).with_header("X-Signature", signature);
        let unsigned = WebhookRequest::new(BODY.to_vec());

        assert!(matches!(
            verify_request(&config(None), &signed, "X-Signature"),
            Err(ConnectorError::WebhookConfiguration(_))
        ));
        assert!(matches!(
            verify_request(&config(Some(SECRET)), &unsigned, "X-Signature"),
            Err(ConnectorError::WebhookConfiguration(_))
        ));
        assert!(verify_request(&config(Some(SECRET)), &signed, "x-signature").is_ok());
    }
}
