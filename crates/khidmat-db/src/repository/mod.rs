//! # Repository Module
//!
//! Database repository implementations for the Khidmat backend.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.  │
//! │                                                                         │
//! │  Service call                                                          │
//! │       │                                                                 │
//! │       │  db.bookings().accept(&booking_id, &provider_id, &otp)         │
//! │       │  ↓                                                              │
//! │       ▼                                                                 │
//! │  BookingRepository                                                     │
//! │  ├── get_by_id(&self, id)                                              │
//! │  ├── create_from_cart(&self, ...)                                      │
//! │  ├── accept(&self, id, provider_id, otp)                               │
//! │  └── complete_with_otp(&self, id, otp)                                 │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Benefits:                                                              │
//! │  • SQL is isolated in one place                                        │
//! │  • Status transitions live next to the queries that guard them         │
//! │  • Easy to test against an in-memory database                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`catalog::CatalogRepository`] - Services, providers, users, addresses
//! - [`cart::CartRepository`] - Cart and cart line operations
//! - [`booking::BookingRepository`] - Booking lifecycle operations
//! - [`transaction::TransactionRepository`] - Payment transaction records
//! - [`tax_config::TaxConfigRepository`] - Fee/tax configuration

pub mod booking;
pub mod cart;
pub mod catalog;
pub mod tax_config;
pub mod transaction;
