//! # Notification Gateway
//!
//! Outbound lifecycle notifications, behind a trait so the delivery
//! channel (email, push, SMS) is pluggable and tests can capture calls.
//!
//! ## Fire And Forget
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Notification Contract                                │
//! │                                                                         │
//! │  accept_booking ──► state transition COMMITS ──► notify (best effort)  │
//! │                                                        │                │
//! │                              delivery failed? ──► warn! and move on    │
//! │                                                                         │
//! │  A notification failure NEVER rolls back or fails the operation        │
//! │  that triggered it. The booking is accepted whether or not the         │
//! │  customer's email goes out.                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use khidmat_core::{Booking, User};

/// Notification delivery errors.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Notification delivery failed: {0}")]
    Delivery(String),
}

/// Outbound notification channel for booking lifecycle events.
#[async_trait]
pub trait NotificationGateway: Send + Sync {
    /// A provider accepted the booking; tells the customer their OTP.
    ///
    /// The OTP travels only through this channel. It is never exposed on
    /// provider-facing reads.
    async fn booking_accepted(
        &self,
        booking: &Booking,
        recipient: &User,
        otp: &str,
    ) -> Result<(), NotifyError>;

    /// The booking was completed (OTP verified).
    async fn booking_completed(&self, booking: &Booking, recipient: &User)
        -> Result<(), NotifyError>;

    /// The booking was canceled.
    async fn booking_canceled(
        &self,
        booking: &Booking,
        recipient: &User,
        reason: Option<&str>,
    ) -> Result<(), NotifyError>;
}

/// Default notifier: structured log lines only.
///
/// Useful for development and as a stand-in until a real channel is
/// wired up. Never fails.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl NotificationGateway for LogNotifier {
    async fn booking_accepted(
        &self,
        booking: &Booking,
        recipient: &User,
        _otp: &str,
    ) -> Result<(), NotifyError> {
        // The OTP itself stays out of the logs
        info!(
            booking_id = %booking.id,
            recipient = %recipient.email,
            "Notifying: booking accepted, OTP issued"
        );
        Ok(())
    }

    async fn booking_completed(
        &self,
        booking: &Booking,
        recipient: &User,
    ) -> Result<(), NotifyError> {
        info!(
            booking_id = %booking.id,
            recipient = %recipient.email,
            "Notifying: booking completed"
        );
        Ok(())
    }

    async fn booking_canceled(
        &self,
        booking: &Booking,
        recipient: &User,
        reason: Option<&str>,
    ) -> Result<(), NotifyError> {
        info!(
            booking_id = %booking.id,
            recipient = %recipient.email,
            reason = reason.unwrap_or("none given"),
            "Notifying: booking canceled"
        );
        Ok(())
    }
}

// =============================================================================
// Test Support
// =============================================================================

/// Records every notification instead of delivering it.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MockNotifier {
    pub events: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
impl MockNotifier {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn record(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

#[cfg(test)]
#[async_trait]
impl NotificationGateway for MockNotifier {
    async fn booking_accepted(
        &self,
        booking: &Booking,
        recipient: &User,
        otp: &str,
    ) -> Result<(), NotifyError> {
        self.record(format!("accepted:{}:{}:{}", booking.id, recipient.id, otp));
        Ok(())
    }

    async fn booking_completed(
        &self,
        booking: &Booking,
        recipient: &User,
    ) -> Result<(), NotifyError> {
        self.record(format!("completed:{}:{}", booking.id, recipient.id));
        Ok(())
    }

    async fn booking_canceled(
        &self,
        booking: &Booking,
        recipient: &User,
        _reason: Option<&str>,
    ) -> Result<(), NotifyError> {
        self.record(format!("canceled:{}:{}", booking.id, recipient.id));
        Ok(())
    }
}

/// Notifier that always fails, for exercising the fire-and-forget path.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct FailingNotifier;

#[cfg(test)]
#[async_trait]
impl NotificationGateway for FailingNotifier {
    async fn booking_accepted(
        &self,
        _booking: &Booking,
        _recipient: &User,
        _otp: &str,
    ) -> Result<(), NotifyError> {
        Err(NotifyError::Delivery("smtp down".to_string()))
    }

    async fn booking_completed(
        &self,
        _booking: &Booking,
        _recipient: &User,
    ) -> Result<(), NotifyError> {
        Err(NotifyError::Delivery("smtp down".to_string()))
    }

    async fn booking_canceled(
        &self,
        _booking: &Booking,
        _recipient: &User,
        _reason: Option<&str>,
    ) -> Result<(), NotifyError> {
        Err(NotifyError::Delivery("smtp down".to_string()))
    }
}
