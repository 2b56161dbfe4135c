//! # khidmat-db: Database Layer for the Khidmat Marketplace
//!
//! This crate provides database access for the Khidmat booking backend.
//! It uses SQLite for storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Khidmat Data Flow                                  │
//! │                                                                         │
//! │  Service call (accept_booking)                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    khidmat-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │ (booking.rs)  │    │  (embedded)  │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ SqlitePool    │    │ CartRepo      │    │ 001_init.sql │  │   │
//! │  │   │ Connection    │◄───│ BookingRepo   │    │ ...          │  │   │
//! │  │   │ Management    │    │ TxnRepo       │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database (WAL mode)                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (cart, booking, ...)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use khidmat_db::{Database, DbConfig};
//!
//! // Create database with default config
//! let config = DbConfig::new("path/to/khidmat.db");
//! let db = Database::new(config).await?;
//!
//! // Use repositories
//! let booking = db.bookings().get_by_id("...").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::booking::BookingRepository;
pub use repository::cart::CartRepository;
pub use repository::catalog::CatalogRepository;
pub use repository::tax_config::TaxConfigRepository;
pub use repository::transaction::TransactionRepository;
