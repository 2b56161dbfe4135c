//! Service configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use serde::{Deserialize, Serialize};
use std::env;

/// Khidmat service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite database file
    pub database_path: String,

    /// Base URL of the payment gateway
    pub gateway_base_url: String,

    /// Gateway API key id (basic auth username)
    pub gateway_key_id: Option<String>,

    /// Gateway API key secret (basic auth password, also signs webhooks)
    pub gateway_key_secret: Option<String>,

    /// HTTP timeout for gateway calls, in seconds
    pub gateway_timeout_secs: u64,

    /// Optional OTP expiry window, in seconds.
    /// Unset means issued OTPs never expire.
    pub otp_ttl_secs: Option<i64>,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let config = AppConfig {
            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "./khidmat.db".to_string()),

            gateway_base_url: env::var("GATEWAY_BASE_URL")
                .unwrap_or_else(|_| "https://api.razorpay.com".to_string()),

            gateway_key_id: env::var("GATEWAY_KEY_ID").ok(),

            gateway_key_secret: env::var("GATEWAY_KEY_SECRET").ok(),

            gateway_timeout_secs: env::var("GATEWAY_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("GATEWAY_TIMEOUT_SECS".to_string()))?,

            otp_ttl_secs: match env::var("BOOKING_OTP_TTL_SECS") {
                Ok(raw) => Some(
                    raw.parse()
                        .map_err(|_| ConfigError::InvalidValue("BOOKING_OTP_TTL_SECS".to_string()))?,
                ),
                Err(_) => None,
            },
        };

        if let Some(ttl) = config.otp_ttl_secs {
            if ttl <= 0 {
                return Err(ConfigError::InvalidValue("BOOKING_OTP_TTL_SECS".to_string()));
            }
        }

        Ok(config)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            database_path: "./khidmat.db".to_string(),
            gateway_base_url: "https://api.razorpay.com".to_string(),
            gateway_key_id: None,
            gateway_key_secret: None,
            gateway_timeout_secs: 10,
            otp_ttl_secs: None,
        }
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
