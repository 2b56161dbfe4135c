//! # Transaction Recorder
//!
//! Append-mostly ledger of payment attempts against bookings.
//!
//! ## Scope
//! The payment gateway executes payments; this service only records
//! what happened. Amounts always come from the booking (the client
//! never supplies one), and a captured record flips the booking's
//! payment status to paid.

use serde::Deserialize;
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::gateway::{GatewayPaymentDetails, PaymentGatewayClient};
use khidmat_core::validation::validate_payment_amount;
use khidmat_core::{Actor, PaymentMethod, Transaction, TransactionStatus};
use khidmat_db::repository::transaction::TransactionFilter;
use khidmat_db::Database;

const DEFAULT_CURRENCY: &str = "INR";
const DEFAULT_LIST_LIMIT: i64 = 20;
const MAX_LIST_LIMIT: i64 = 100;

/// What a client submits to record a payment attempt.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordTransactionInput {
    pub booking_id: String,
    pub payment_method: PaymentMethod,
    /// Defaults to `created` when omitted.
    pub status: Option<TransactionStatus>,
    pub gateway_payment_id: Option<String>,
    pub gateway_order_id: Option<String>,
    pub gateway_signature: Option<String>,
    pub metadata: Option<Value>,
    /// Defaults to INR.
    pub currency: Option<String>,
}

/// Service recording and querying payment transactions.
#[derive(Clone)]
pub struct TransactionRecorder {
    db: Database,
    gateway: PaymentGatewayClient,
}

impl TransactionRecorder {
    /// Creates a new TransactionRecorder.
    pub fn new(db: Database, gateway: PaymentGatewayClient) -> Self {
        TransactionRecorder { db, gateway }
    }

    /// Records a payment attempt against a booking.
    ///
    /// The amount is the booking's amount-to-pay, never client input.
    /// When no gateway payment id exists (cash), a synthetic reference
    /// is minted. A `captured` record marks the booking paid.
    pub async fn record(
        &self,
        actor: &Actor,
        input: RecordTransactionInput,
    ) -> ApiResult<Transaction> {
        let booking = self
            .db
            .bookings()
            .get_by_id(&input.booking_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Booking", &input.booking_id))?;

        if !actor.is_admin() && booking.user_id != actor.user_id {
            return Err(ApiError::not_found("Booking", &input.booking_id));
        }

        validate_payment_amount(booking.amount_to_pay_minor)?;

        let transaction_ref = match &input.gateway_payment_id {
            Some(id) => id.clone(),
            None => format!("txn_{}", chrono::Utc::now().timestamp_millis()),
        };

        if self.db.transactions().ref_exists(&transaction_ref).await? {
            return Err(ApiError::conflict(format!(
                "transaction reference '{transaction_ref}' already recorded"
            )));
        }

        // Gateway-backed records arrive already captured; cash and other
        // offline attempts start at created
        let status = input.status.unwrap_or(if input.gateway_payment_id.is_some() {
            TransactionStatus::Captured
        } else {
            TransactionStatus::Created
        });
        let now = chrono::Utc::now();
        let transaction = Transaction {
            id: Uuid::new_v4().to_string(),
            user_id: booking.user_id.clone(),
            booking_id: booking.id.clone(),
            transaction_ref,
            amount_minor: booking.amount_to_pay_minor,
            currency: input
                .currency
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            payment_method: input.payment_method,
            status,
            gateway_payment_id: input.gateway_payment_id,
            gateway_order_id: input.gateway_order_id,
            gateway_signature: input.gateway_signature,
            metadata: input.metadata.unwrap_or_else(|| Value::Object(Default::default())),
            is_deleted: false,
            payment_date: now,
            created_at: now,
            updated_at: now,
        };

        self.db.transactions().insert(&transaction).await?;

        if status == TransactionStatus::Captured {
            self.db
                .bookings()
                .set_payment_captured(&booking.id, transaction.gateway_payment_id.as_deref())
                .await?;
        }

        info!(
            transaction_id = %transaction.id,
            booking_id = %booking.id,
            amount = %transaction.amount(),
            status = ?status,
            "Transaction recorded"
        );

        Ok(transaction)
    }

    /// Fetches one transaction, visible to its user and admins.
    pub async fn get(&self, actor: &Actor, id: &str) -> ApiResult<Transaction> {
        let transaction = self
            .db
            .transactions()
            .get_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Transaction", id))?;

        if !actor.is_admin() && transaction.user_id != actor.user_id {
            return Err(ApiError::not_found("Transaction", id));
        }

        Ok(transaction)
    }

    /// Lists transactions. Non-admins are pinned to their own records
    /// regardless of the filter they pass.
    pub async fn list(
        &self,
        actor: &Actor,
        mut filter: TransactionFilter,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> ApiResult<Vec<Transaction>> {
        if !actor.is_admin() {
            filter.user_id = Some(actor.user_id.clone());
        }
        let limit = limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT);
        let offset = offset.unwrap_or(0).max(0);
        Ok(self.db.transactions().list(&filter, limit, offset).await?)
    }

    /// Admin-only status correction, with an optional metadata patch.
    ///
    /// The patch is a shallow object merge: patch keys overwrite
    /// existing ones, other existing keys survive. Moving to `captured`
    /// marks the booking paid.
    pub async fn update_status(
        &self,
        actor: &Actor,
        id: &str,
        status: TransactionStatus,
        metadata_patch: Option<Value>,
    ) -> ApiResult<Transaction> {
        if !actor.is_admin() {
            return Err(ApiError::forbidden("admin role required"));
        }

        let existing = self
            .db
            .transactions()
            .get_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Transaction", id))?;

        let merged = match metadata_patch {
            Some(patch) => Some(merge_metadata(&existing.metadata, &patch)?),
            None => None,
        };

        self.db
            .transactions()
            .update_status(id, status, merged.as_ref())
            .await?;

        if status == TransactionStatus::Captured {
            self.db
                .bookings()
                .set_payment_captured(&existing.booking_id, existing.gateway_payment_id.as_deref())
                .await?;
        }

        info!(transaction_id = %id, status = ?status, "Transaction status updated");

        self.db
            .transactions()
            .get_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Transaction", id))
    }

    /// Soft-deletes a transaction. Admin only.
    pub async fn remove(&self, actor: &Actor, id: &str) -> ApiResult<()> {
        if !actor.is_admin() {
            return Err(ApiError::forbidden("admin role required"));
        }
        self.db.transactions().soft_delete(id).await?;
        Ok(())
    }

    /// Verifies a gateway checkout callback signature for a recorded
    /// transaction.
    pub async fn verify_signature(
        &self,
        actor: &Actor,
        id: &str,
        signature: &str,
    ) -> ApiResult<bool> {
        let transaction = self.get(actor, id).await?;

        let (order_id, payment_id) = match (
            &transaction.gateway_order_id,
            &transaction.gateway_payment_id,
        ) {
            (Some(o), Some(p)) => (o.as_str(), p.as_str()),
            _ => {
                return Err(ApiError::validation(
                    "transaction has no gateway order/payment ids to verify",
                ))
            }
        };

        self.gateway
            .verify_callback_signature(order_id, payment_id, signature)
    }

    /// Fetches the gateway's live view of a transaction's payment.
    pub async fn fetch_gateway_details(
        &self,
        actor: &Actor,
        id: &str,
    ) -> ApiResult<GatewayPaymentDetails> {
        let transaction = self.get(actor, id).await?;

        let payment_id = transaction
            .gateway_payment_id
            .as_deref()
            .ok_or_else(|| ApiError::validation("transaction has no gateway payment id"))?;

        self.gateway.fetch_payment(payment_id).await
    }
}

/// Shallow merge of two JSON objects; patch keys win.
fn merge_metadata(existing: &Value, patch: &Value) -> ApiResult<Value> {
    let Value::Object(patch) = patch else {
        return Err(ApiError::validation("metadata patch must be a JSON object"));
    };
    let mut merged = match existing {
        Value::Object(map) => map.clone(),
        _ => Default::default(),
    };
    for (key, value) in patch {
        merged.insert(key.clone(), value.clone());
    }
    Ok(Value::Object(merged))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::error::ErrorCode;
    use crate::notify::MockNotifier;
    use crate::services::booking::{BookingService, CheckoutRequest};
    use crate::services::cart::CartService;
    use crate::testutil::{seed_address, seed_service, seed_user, test_db};
    use khidmat_core::{Booking, PaymentStatus, Role};
    use serde_json::json;
    use std::sync::Arc;

    fn recorder(db: &Database) -> TransactionRecorder {
        let gateway = PaymentGatewayClient::new(&AppConfig::default()).unwrap();
        TransactionRecorder::new(db.clone(), gateway)
    }

    async fn seed_booking(db: &Database) -> Booking {
        seed_user(db, "u1", Role::User).await;
        seed_service(db, "s1", "AC Repair", 10_000).await;
        seed_address(db, "addr-1", "u1").await;

        let actor = Actor::user("u1");
        CartService::new(db.clone())
            .add_item(&actor, "s1", 2)
            .await
            .unwrap();
        BookingService::new(db.clone(), Arc::new(MockNotifier::default()), None)
            .checkout(
                &actor,
                CheckoutRequest {
                    address_id: "addr-1".to_string(),
                    payment_mode: None,
                    notes: None,
                },
            )
            .await
            .unwrap()
    }

    fn input(booking_id: &str) -> RecordTransactionInput {
        RecordTransactionInput {
            booking_id: booking_id.to_string(),
            payment_method: PaymentMethod::Cash,
            status: None,
            gateway_payment_id: None,
            gateway_order_id: None,
            gateway_signature: None,
            metadata: None,
            currency: None,
        }
    }

    #[tokio::test]
    async fn test_record_uses_booking_amount() {
        let db = test_db().await;
        let booking = seed_booking(&db).await;

        let txn = recorder(&db)
            .record(&Actor::user("u1"), input(&booking.id))
            .await
            .unwrap();

        assert_eq!(txn.amount_minor, 28_750);
        assert_eq!(txn.currency, "INR");
        assert_eq!(txn.status, TransactionStatus::Created);
        assert!(txn.transaction_ref.starts_with("txn_"));
    }

    #[tokio::test]
    async fn test_captured_record_marks_booking_paid() {
        let db = test_db().await;
        let booking = seed_booking(&db).await;

        // A gateway payment id implies captured unless the caller says
        // otherwise
        let mut req = input(&booking.id);
        req.gateway_payment_id = Some("pay_123".to_string());

        let txn = recorder(&db).record(&Actor::user("u1"), req).await.unwrap();
        assert_eq!(txn.status, TransactionStatus::Captured);
        assert_eq!(txn.transaction_ref, "pay_123");

        let booking = db.bookings().get_by_id(&booking.id).await.unwrap().unwrap();
        assert_eq!(booking.payment_status, PaymentStatus::Paid);
        assert_eq!(booking.gateway_payment_id.as_deref(), Some("pay_123"));
    }

    #[tokio::test]
    async fn test_duplicate_gateway_reference_conflicts() {
        let db = test_db().await;
        let booking = seed_booking(&db).await;
        let rec = recorder(&db);

        let mut req = input(&booking.id);
        req.gateway_payment_id = Some("pay_dup".to_string());
        rec.record(&Actor::user("u1"), req.clone()).await.unwrap();

        let err = rec.record(&Actor::user("u1"), req).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Conflict);
    }

    #[tokio::test]
    async fn test_foreign_booking_hidden() {
        let db = test_db().await;
        let booking = seed_booking(&db).await;
        seed_user(&db, "u2", Role::User).await;

        let err = recorder(&db)
            .record(&Actor::user("u2"), input(&booking.id))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_non_admin_list_is_pinned_to_self() {
        let db = test_db().await;
        let booking = seed_booking(&db).await;
        seed_user(&db, "u2", Role::User).await;
        let rec = recorder(&db);

        rec.record(&Actor::user("u1"), input(&booking.id))
            .await
            .unwrap();

        // u2 asks for u1's records; the filter is overridden
        let filter = TransactionFilter {
            user_id: Some("u1".to_string()),
            ..Default::default()
        };
        let seen = rec
            .list(&Actor::user("u2"), filter, None, None)
            .await
            .unwrap();
        assert!(seen.is_empty());
    }

    #[tokio::test]
    async fn test_update_status_merges_metadata() {
        let db = test_db().await;
        let booking = seed_booking(&db).await;
        let rec = recorder(&db);

        let mut req = input(&booking.id);
        req.metadata = Some(json!({"channel": "pos", "attempt": 1}));
        let txn = rec.record(&Actor::user("u1"), req).await.unwrap();

        let updated = rec
            .update_status(
                &Actor::admin("a1"),
                &txn.id,
                TransactionStatus::Failed,
                Some(json!({"attempt": 2, "error": "card_declined"})),
            )
            .await
            .unwrap();

        assert_eq!(updated.status, TransactionStatus::Failed);
        assert_eq!(updated.metadata["channel"], "pos");
        assert_eq!(updated.metadata["attempt"], 2);
        assert_eq!(updated.metadata["error"], "card_declined");
    }

    #[tokio::test]
    async fn test_update_status_requires_admin() {
        let db = test_db().await;
        let booking = seed_booking(&db).await;
        let rec = recorder(&db);

        let txn = rec
            .record(&Actor::user("u1"), input(&booking.id))
            .await
            .unwrap();

        let err = rec
            .update_status(&Actor::user("u1"), &txn.id, TransactionStatus::Captured, None)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);
    }

    #[test]
    fn test_merge_metadata_rejects_non_object_patch() {
        let err = merge_metadata(&json!({}), &json!([1, 2])).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }
}
