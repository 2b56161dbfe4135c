//! # Service Layer
//!
//! The operations clients call, built from the pure core and the
//! repositories.
//!
//! ## Layering Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Service Layer Rules                               │
//! │                                                                         │
//! │  1. AUTHORIZATION HAPPENS HERE                                         │
//! │     └── Repositories never see the Actor; every ownership and role     │
//! │         check lives in the service before the repository call          │
//! │                                                                         │
//! │  2. MONEY MATH HAPPENS IN khidmat-core                                 │
//! │     └── Services call compute_totals(); they never add amounts         │
//! │                                                                         │
//! │  3. RACES ARE SETTLED IN SQL                                           │
//! │     └── Accept/verify/cancel rely on conditional UPDATEs; services     │
//! │         translate "no row matched" into the client-facing error        │
//! │                                                                         │
//! │  4. NOTIFICATIONS ARE BEST EFFORT                                      │
//! │     └── Delivered after the transition commits, failures only warn     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Services
//!
//! - [`cart::CartService`] - Cart lines and totals
//! - [`booking::BookingService`] - Checkout and the booking state machine
//! - [`transaction::TransactionRecorder`] - Payment transaction records
//! - [`tax_config::TaxConfigService`] - Fee/tax administration

pub mod booking;
pub mod cart;
pub mod tax_config;
pub mod transaction;
