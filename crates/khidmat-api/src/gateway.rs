//! # Payment Gateway Client
//!
//! Thin HTTP client for the external payment gateway, plus webhook
//! signature verification.
//!
//! ## Scope
//! The gateway is the source of truth for payment *execution*; this
//! backend only records outcomes. Two touchpoints exist:
//!
//! - `fetch_payment`: GET the gateway's view of a payment (amount,
//!   status, method) by its gateway id
//! - `verify_signature`: HMAC-SHA256 check of the signature the gateway
//!   attaches to checkout callbacks
//!
//! Gateway amounts are already integer minor units, so they map to
//! [`Money`] without conversion.

use hmac::{Hmac, Mac};
use reqwest::StatusCode;
use serde::Deserialize;
use sha2::Sha256;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::AppConfig;
use crate::error::{ApiError, ApiResult, ErrorCode};
use khidmat_core::Money;

type HmacSha256 = Hmac<Sha256>;

/// A payment as the gateway reports it.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayPaymentDetails {
    /// Gateway payment id.
    pub id: String,
    /// Amount in minor units.
    pub amount: i64,
    pub currency: String,
    /// Gateway-side status string (e.g. "captured", "failed").
    pub status: String,
    /// Gateway order id, when the payment was made against an order.
    pub order_id: Option<String>,
    /// Instrument, as the gateway names it.
    pub method: Option<String>,
}

impl GatewayPaymentDetails {
    /// Returns the amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_minor(self.amount)
    }
}

/// HTTP client for the payment gateway.
#[derive(Debug, Clone)]
pub struct PaymentGatewayClient {
    http: reqwest::Client,
    base_url: String,
    key_id: Option<String>,
    key_secret: Option<String>,
}

impl PaymentGatewayClient {
    /// Builds a client from configuration.
    pub fn new(config: &AppConfig) -> ApiResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.gateway_timeout_secs))
            .build()
            .map_err(|e| ApiError::internal(format!("failed to build HTTP client: {e}")))?;

        Ok(PaymentGatewayClient {
            http,
            base_url: config.gateway_base_url.trim_end_matches('/').to_string(),
            key_id: config.gateway_key_id.clone(),
            key_secret: config.gateway_key_secret.clone(),
        })
    }

    /// Fetches a payment's details from the gateway.
    ///
    /// ## Error Mapping
    /// - 404 → `NotFound` (unknown payment id)
    /// - 401 → `ConfigurationError` (bad credentials)
    /// - other non-2xx / network failure → `UpstreamError`
    pub async fn fetch_payment(&self, payment_id: &str) -> ApiResult<GatewayPaymentDetails> {
        let (key_id, key_secret) = self.credentials()?;

        let url = format!("{}/v1/payments/{}", self.base_url, payment_id);
        debug!(payment_id = %payment_id, "Fetching payment from gateway");

        let response = self
            .http
            .get(&url)
            .basic_auth(key_id, Some(key_secret))
            .send()
            .await
            .map_err(|e| {
                warn!(payment_id = %payment_id, error = %e, "Gateway request failed");
                ApiError::upstream(format!("payment gateway unreachable: {e}"))
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(ApiError::not_found("Payment", payment_id)),
            StatusCode::UNAUTHORIZED => Err(ApiError::new(
                ErrorCode::ConfigurationError,
                "payment gateway rejected credentials",
            )),
            status if status.is_success() => {
                let details = response
                    .json::<GatewayPaymentDetails>()
                    .await
                    .map_err(|e| ApiError::upstream(format!("malformed gateway response: {e}")))?;
                Ok(details)
            }
            status => {
                warn!(payment_id = %payment_id, status = %status, "Gateway error response");
                Err(ApiError::upstream(format!(
                    "payment gateway returned {status}"
                )))
            }
        }
    }

    /// Verifies a checkout callback signature using the configured secret.
    pub fn verify_callback_signature(
        &self,
        order_id: &str,
        payment_id: &str,
        signature: &str,
    ) -> ApiResult<bool> {
        let (_, key_secret) = self.credentials()?;
        Ok(verify_signature(order_id, payment_id, signature, key_secret))
    }

    fn credentials(&self) -> ApiResult<(&str, &str)> {
        match (&self.key_id, &self.key_secret) {
            (Some(id), Some(secret)) => Ok((id, secret)),
            _ => Err(ApiError::new(
                ErrorCode::ConfigurationError,
                "payment gateway credentials not configured",
            )),
        }
    }
}

// =============================================================================
// Signature Verification
// =============================================================================

/// Verifies a gateway checkout signature.
///
/// The gateway signs `"{order_id}|{payment_id}"` with HMAC-SHA256 under
/// the API secret and hex-encodes the tag. `Mac::verify_slice` performs
/// a constant-time comparison, so a tampered signature cannot be probed
/// byte by byte.
///
/// Returns `false` (never an error) for malformed hex or any mismatch.
pub fn verify_signature(order_id: &str, payment_id: &str, signature: &str, secret: &str) -> bool {
    let payload = format!("{order_id}|{payment_id}");

    let Ok(expected) = hex::decode(signature) else {
        return false;
    };

    // Key of any length is valid for HMAC
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(payload.as_bytes());
    mac.verify_slice(&expected).is_ok()
}

/// Signs a payload the way the gateway does. Test and tooling helper.
pub fn sign_payload(order_id: &str, payment_id: &str, secret: &str) -> String {
    let payload = format!("{order_id}|{payment_id}");
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(payload.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_signature_verifies() {
        let sig = sign_payload("order_123", "pay_456", "secret");
        assert!(verify_signature("order_123", "pay_456", &sig, "secret"));
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let sig = sign_payload("order_123", "pay_456", "secret");

        assert!(!verify_signature("order_999", "pay_456", &sig, "secret"));
        assert!(!verify_signature("order_123", "pay_999", &sig, "secret"));
        assert!(!verify_signature("order_123", "pay_456", &sig, "wrong-secret"));
    }

    #[test]
    fn test_malformed_signature_rejected() {
        assert!(!verify_signature("order_123", "pay_456", "not-hex!", "secret"));
        assert!(!verify_signature("order_123", "pay_456", "", "secret"));
        // Valid hex but wrong length
        assert!(!verify_signature("order_123", "pay_456", "deadbeef", "secret"));
    }

    #[test]
    fn test_missing_credentials_is_config_error() {
        let client = PaymentGatewayClient::new(&AppConfig::default()).unwrap();
        let err = client
            .verify_callback_signature("order_1", "pay_1", "aa")
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigurationError);
    }
}
