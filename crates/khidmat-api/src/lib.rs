//! # khidmat-api: Service Layer for the Khidmat Marketplace
//!
//! The operations a transport (HTTP handlers, jobs, CLI tools) calls to
//! run the marketplace: carts, checkout, the booking lifecycle, payment
//! transaction records, and fee/tax administration.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Khidmat Request Flow                               │
//! │                                                                         │
//! │  Transport (HTTP handler, job, CLI)                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   khidmat-api (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────────┐   ┌──────────────┐   ┌──────────────────┐  │   │
//! │  │   │   Services   │   │   Gateway    │   │  Notifications   │  │   │
//! │  │   │ cart/booking │   │ HTTP client  │   │ trait + LogNotif │  │   │
//! │  │   │ txn/tax      │   │ + HMAC check │   │ (fire & forget)  │  │   │
//! │  │   └──────┬───────┘   └──────────────┘   └──────────────────┘  │   │
//! │  │          │                                                     │   │
//! │  └──────────┼─────────────────────────────────────────────────────┘   │
//! │             ▼                                                          │
//! │  khidmat-db (repositories) ──► khidmat-core (money, pricing, types)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`config`] - Environment-driven application configuration
//! - [`error`] - Client-facing error envelope and codes
//! - [`gateway`] - Payment gateway HTTP client and signature checks
//! - [`notify`] - Outbound notification trait
//! - [`services`] - The operations themselves

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod gateway;
pub mod notify;
pub mod services;

#[cfg(test)]
pub(crate) mod testutil;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::AppConfig;
pub use error::{ApiError, ApiResult, ErrorCode};
pub use gateway::{GatewayPaymentDetails, PaymentGatewayClient};
pub use notify::{LogNotifier, NotificationGateway, NotifyError};
pub use services::booking::{BookingService, CheckoutRequest, Page};
pub use services::cart::CartService;
pub use services::tax_config::TaxConfigService;
pub use services::transaction::{RecordTransactionInput, TransactionRecorder};

use std::sync::Arc;

use khidmat_db::{Database, DbConfig};

/// Shared application state: one per process, cloned into handlers.
#[derive(Clone)]
pub struct AppState {
    db: Database,
    config: AppConfig,
    notifier: Arc<dyn NotificationGateway>,
}

impl AppState {
    /// Opens the database and assembles the state.
    pub async fn new(
        config: AppConfig,
        notifier: Arc<dyn NotificationGateway>,
    ) -> ApiResult<Self> {
        let db = Database::new(DbConfig::new(&config.database_path))
            .await
            .map_err(ApiError::from)?;
        Ok(AppState {
            db,
            config,
            notifier,
        })
    }

    /// State over an already-open database. Used by tests and tools
    /// that manage the pool themselves.
    pub fn with_database(
        db: Database,
        config: AppConfig,
        notifier: Arc<dyn NotificationGateway>,
    ) -> Self {
        AppState {
            db,
            config,
            notifier,
        }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    // =========================================================================
    // Service Accessors
    // =========================================================================

    pub fn carts(&self) -> CartService {
        CartService::new(self.db.clone())
    }

    pub fn bookings(&self) -> BookingService {
        BookingService::new(
            self.db.clone(),
            self.notifier.clone(),
            self.config.otp_ttl_secs,
        )
    }

    pub fn transactions(&self) -> ApiResult<TransactionRecorder> {
        Ok(TransactionRecorder::new(self.db.clone(), self.gateway()?))
    }

    pub fn tax_configs(&self) -> TaxConfigService {
        TaxConfigService::new(self.db.clone())
    }

    pub fn gateway(&self) -> ApiResult<PaymentGatewayClient> {
        PaymentGatewayClient::new(&self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_state_builds_services_over_shared_db() {
        let db = crate::testutil::test_db().await;
        let state = AppState::with_database(
            db,
            AppConfig::default(),
            Arc::new(LogNotifier),
        );

        // Accessors are cheap pool clones, not new connections
        let _ = state.carts();
        let _ = state.bookings();
        let _ = state.tax_configs();
        assert!(state.transactions().is_ok());
    }
}
