//! Webhook signature verification.
//!
//! Verifies that an inbound event body was produced by the billing
//! provider, using HMAC-SHA256 over the exact raw body bytes — any
//! re-serialization before verification would break valid signatures.
//! Includes timestamp validation to reject replayed deliveries.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::errors::WebhookError;

type HmacSha256 = Hmac<Sha256>;

/// Maximum allowed age for webhook events (5 minutes).
const MAX_EVENT_AGE_SECS: i64 = 300;

/// Maximum allowed clock skew for future events (1 minute).
const MAX_CLOCK_SKEW_SECS: i64 = 60;

/// Parsed components of the provider's signature header.
///
/// Format: `t=<unix timestamp>,v1=<hex hmac>[,...]`; unknown fields are
/// ignored for forward compatibility.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    /// Unix timestamp when the signature was generated.
    pub timestamp: i64,
    /// v1 signature (HMAC-SHA256).
    pub v1_signature: Vec<u8>,
}

impl SignatureHeader {
    /// Parses a signature header string.
    ///
    /// Any malformation collapses to `SignatureInvalid`; the response
    /// contract does not distinguish missing/malformed/mismatched.
    pub fn parse(header: &str) -> Result<Self, WebhookError> {
        let mut timestamp: Option<i64> = None;
        let mut v1_signature: Option<Vec<u8>> = None;

        for part in header.split(',') {
            let Some((key, value)) = part.split_once('=') else {
                tracing::warn!("signature header segment missing '='");
                return Err(WebhookError::SignatureInvalid);
            };

            match key {
                "t" => {
                    timestamp = Some(value.parse().map_err(|_| {
                        tracing::warn!("signature header has non-numeric timestamp");
                        WebhookError::SignatureInvalid
                    })?);
                }
                "v1" => {
                    v1_signature = Some(hex::decode(value).map_err(|_| {
                        tracing::warn!("signature header has non-hex v1 signature");
                        WebhookError::SignatureInvalid
                    })?);
                }
                _ => {
                    // Ignore unknown fields for forward compatibility
                }
            }
        }

        let (Some(timestamp), Some(v1_signature)) = (timestamp, v1_signature) else {
            tracing::warn!("signature header missing timestamp or v1 signature");
            return Err(WebhookError::SignatureInvalid);
        };

        Ok(SignatureHeader {
            timestamp,
            v1_signature,
        })
    }
}

/// Verifier for provider webhook signatures.
pub struct WebhookVerifier {
    secret: SecretString,
}

impl WebhookVerifier {
    /// Creates a new verifier with the given signing secret.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: SecretString::new(secret.into()),
        }
    }

    /// Verifies the signature header against the raw body bytes.
    ///
    /// Missing header (`None`), malformed header, stale timestamp, and
    /// signature mismatch all surface as `SignatureInvalid`.
    pub fn verify(&self, payload: &[u8], header: Option<&str>) -> Result<(), WebhookError> {
        let header = header.ok_or_else(|| {
            tracing::warn!("webhook request missing signature header");
            WebhookError::SignatureInvalid
        })?;

        let header = SignatureHeader::parse(header)?;
        self.validate_timestamp(header.timestamp)?;

        let expected = self.compute_signature(header.timestamp, payload);
        if !constant_time_compare(&expected, &header.v1_signature) {
            tracing::warn!("webhook signature mismatch");
            return Err(WebhookError::SignatureInvalid);
        }

        Ok(())
    }

    /// Rejects timestamps outside the replay window.
    fn validate_timestamp(&self, timestamp: i64) -> Result<(), WebhookError> {
        let now = chrono::Utc::now().timestamp();
        let age = now - timestamp;

        if age > MAX_EVENT_AGE_SECS {
            tracing::warn!(event_timestamp = timestamp, age_secs = age, "webhook event too old");
            return Err(WebhookError::SignatureInvalid);
        }

        if age < -MAX_CLOCK_SKEW_SECS {
            tracing::warn!(event_timestamp = timestamp, "webhook event timestamp in the future");
            return Err(WebhookError::SignatureInvalid);
        }

        Ok(())
    }

    /// HMAC-SHA256 over `"{timestamp}.{payload}"`.
    fn compute_signature(&self, timestamp: i64, payload: &[u8]) -> Vec<u8> {
        let signed_payload = format!("{}.{}", timestamp, String::from_utf8_lossy(payload));

        let mut mac = HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .expect("HMAC accepts any key size");
        mac.update(signed_payload.as_bytes());
        mac.finalize().into_bytes().to_vec()
    }
}

/// Constant-time comparison to avoid leaking the expected signature
/// through timing.
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Computes a valid signature header value for test fixtures.
#[cfg(test)]
pub fn sign_for_test(secret: &str, timestamp: i64, payload: &[u8]) -> String {
    let signed_payload = format!("{}.{}", timestamp, String::from_utf8_lossy(payload));
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key size");
    mac.update(signed_payload.as_bytes());
    format!("t={},v1={}", timestamp, hex::encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SECRET: &str = "whsec_test_secret_12345";

    #[test]
    fn parse_header_with_v1_only() {
        let header_str = format!("t=1234567890,v1={}", "a".repeat(64));

        let header = SignatureHeader::parse(&header_str).unwrap();

        assert_eq!(header.timestamp, 1234567890);
        assert_eq!(header.v1_signature.len(), 32);
    }

    #[test]
    fn parse_header_ignores_unknown_fields() {
        let header_str = format!("t=1234567890,v1={},v0=legacy,scheme=hmac", "a".repeat(64));

        let header = SignatureHeader::parse(&header_str).unwrap();

        assert_eq!(header.timestamp, 1234567890);
    }

    #[test]
    fn parse_header_missing_timestamp_fails() {
        let result = SignatureHeader::parse(&format!("v1={}", "a".repeat(64)));
        assert!(matches!(result, Err(WebhookError::SignatureInvalid)));
    }

    #[test]
    fn parse_header_missing_v1_fails() {
        let result = SignatureHeader::parse("t=1234567890");
        assert!(matches!(result, Err(WebhookError::SignatureInvalid)));
    }

    #[test]
    fn parse_header_invalid_timestamp_fails() {
        let result = SignatureHeader::parse(&format!("t=not_a_number,v1={}", "a".repeat(64)));
        assert!(matches!(result, Err(WebhookError::SignatureInvalid)));
    }

    #[test]
    fn parse_header_invalid_hex_fails() {
        let result = SignatureHeader::parse("t=1234567890,v1=not_valid_hex");
        assert!(matches!(result, Err(WebhookError::SignatureInvalid)));
    }

    #[test]
    fn verify_accepts_valid_signature() {
        let verifier = WebhookVerifier::new(TEST_SECRET);
        let payload = br#"{"id":"evt_1","type":"invoice.payment_succeeded"}"#;
        let header = sign_for_test(TEST_SECRET, chrono::Utc::now().timestamp(), payload);

        assert!(verifier.verify(payload, Some(&header)).is_ok());
    }

    #[test]
    fn verify_rejects_missing_header() {
        let verifier = WebhookVerifier::new(TEST_SECRET);

        let result = verifier.verify(b"{}", None);

        assert!(matches!(result, Err(WebhookError::SignatureInvalid)));
    }

    #[test]
    fn verify_rejects_wrong_secret() {
        let verifier = WebhookVerifier::new("whsec_other_secret");
        let payload = b"{}";
        let header = sign_for_test(TEST_SECRET, chrono::Utc::now().timestamp(), payload);

        let result = verifier.verify(payload, Some(&header));

        assert!(matches!(result, Err(WebhookError::SignatureInvalid)));
    }

    #[test]
    fn verify_rejects_tampered_payload() {
        let verifier = WebhookVerifier::new(TEST_SECRET);
        let header = sign_for_test(TEST_SECRET, chrono::Utc::now().timestamp(), b"{\"a\":1}");

        let result = verifier.verify(b"{\"a\":2}", Some(&header));

        assert!(matches!(result, Err(WebhookError::SignatureInvalid)));
    }

    #[test]
    fn verify_rejects_stale_timestamp() {
        let verifier = WebhookVerifier::new(TEST_SECRET);
        let payload = b"{}";
        let stale = chrono::Utc::now().timestamp() - MAX_EVENT_AGE_SECS - 1;
        let header = sign_for_test(TEST_SECRET, stale, payload);

        let result = verifier.verify(payload, Some(&header));

        assert!(matches!(result, Err(WebhookError::SignatureInvalid)));
    }

    #[test]
    fn verify_accepts_timestamp_at_age_boundary() {
        let verifier = WebhookVerifier::new(TEST_SECRET);
        let payload = b"{}";
        let boundary = chrono::Utc::now().timestamp() - MAX_EVENT_AGE_SECS;
        let header = sign_for_test(TEST_SECRET, boundary, payload);

        assert!(verifier.verify(payload, Some(&header)).is_ok());
    }

    #[test]
    fn verify_tolerates_small_clock_skew() {
        let verifier = WebhookVerifier::new(TEST_SECRET);
        let payload = b"{}";
        let slightly_future = chrono::Utc::now().timestamp() + 30;
        let header = sign_for_test(TEST_SECRET, slightly_future, payload);

        assert!(verifier.verify(payload, Some(&header)).is_ok());
    }

    #[test]
    fn verify_rejects_far_future_timestamp() {
        let verifier = WebhookVerifier::new(TEST_SECRET);
        let payload = b"{}";
        let future = chrono::Utc::now().timestamp() + MAX_CLOCK_SKEW_SECS + 60;
        let header = sign_for_test(TEST_SECRET, future, payload);

        let result = verifier.verify(payload, Some(&header));

        assert!(matches!(result, Err(WebhookError::SignatureInvalid)));
    }

    #[test]
    fn constant_time_compare_handles_lengths() {
        assert!(constant_time_compare(&[1, 2, 3], &[1, 2, 3]));
        assert!(!constant_time_compare(&[1, 2, 3], &[1, 2, 4]));
        assert!(!constant_time_compare(&[1, 2], &[1, 2, 3]));
        assert!(constant_time_compare(&[], &[]));
    }
}
