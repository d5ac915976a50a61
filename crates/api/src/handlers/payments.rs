//! Payment initiation and settlement handlers.
//!
//! The provider checkout id doubles as our `payment_reference`. Settlement
//! is driven by polling: the client polls `/payment/status/{checkout_id}`
//! and an admin can force a re-check via the verify endpoint. Both paths
//! run through the same compare-and-swap settlement, so repeated polls can
//! never grant slots twice.

use axum::extract::{Path, State};
use axum::Json;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use checkmate_core::error::CoreError;
use checkmate_core::phone::validate_phone_number;
use checkmate_db::models::status::TransactionStatus;
use checkmate_db::models::transaction::{CreateTransaction, Transaction, TransactionWithOwner};
use checkmate_db::repositories::{PackageRepo, SettlementOutcome, TransactionRepo};
use checkmate_events::PlatformEvent;
use checkmate_mpesa::{GatewayError, PollOutcome};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct InitiatePaymentRequest {
    pub phone_number: String,
    pub slots: i32,
}

#[derive(Debug, Serialize)]
pub struct InitiatePaymentResponse {
    pub message: String,
    pub checkout_request_id: String,
    pub transaction: Transaction,
}

#[derive(Debug, Serialize)]
pub struct PaymentStatusResponse {
    pub payment_reference: String,
    pub status: TransactionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

/// POST /payment/initiate
pub async fn initiate_payment(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<InitiatePaymentRequest>,
) -> AppResult<Json<InitiatePaymentResponse>> {
    validate_phone_number(&input.phone_number)?;

    let package = PackageRepo::find_available_by_slots(&state.pool, input.slots)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Validation(format!(
                "No package with {} slots is currently available",
                input.slots
            )))
        })?;

    let amount = package.price.to_u32().ok_or_else(|| {
        AppError::InternalError(format!("Package {} has an unusable price", package.id))
    })?;

    let handle = state
        .gateway
        .initiate_stk_push(
            &input.phone_number,
            amount,
            &format!("CHECKMATE-{}", user.user_id),
        )
        .await
        .map_err(gateway_error)?;

    let transaction = TransactionRepo::create(
        &state.pool,
        &CreateTransaction {
            user_id: user.user_id,
            amount: package.price,
            slots_purchased: package.slots,
            phone_number: input.phone_number,
            payment_reference: handle.checkout_request_id.clone(),
            provider_reference: Some(handle.merchant_request_id),
        },
    )
    .await?;

    tracing::info!(
        transaction_id = transaction.id,
        user_id = user.user_id,
        slots = package.slots,
        "Payment initiated"
    );

    Ok(Json(InitiatePaymentResponse {
        message: handle.customer_message,
        checkout_request_id: handle.checkout_request_id,
        transaction,
    }))
}

/// GET /payment/status/{checkout_id}
///
/// Terminal transactions are answered from the database without touching
/// the provider. Pending ones trigger a provider query and, on a terminal
/// answer, settlement.
pub async fn payment_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(checkout_id): Path<String>,
) -> AppResult<Json<PaymentStatusResponse>> {
    let transaction = find_owned(&state, &user, &checkout_id).await?;

    if transaction.status.is_terminal() {
        return Ok(Json(status_response(transaction)));
    }

    let transaction = poll_and_settle(&state, transaction).await?;
    Ok(Json(status_response(transaction)))
}

/// POST /admin/transactions/{ref}/verify
///
/// Force a provider re-check of a stuck transaction.
pub async fn verify_transaction(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(reference): Path<String>,
) -> AppResult<Json<PaymentStatusResponse>> {
    let transaction = TransactionRepo::find_by_reference(&state.pool, &reference)
        .await?
        .ok_or(AppError::NotFound("Transaction not found".into()))?;

    if transaction.status.is_terminal() {
        return Ok(Json(status_response(transaction)));
    }

    let transaction = poll_and_settle(&state, transaction).await?;
    Ok(Json(status_response(transaction)))
}

/// GET /admin/transactions
pub async fn list_transactions(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> AppResult<Json<Vec<TransactionWithOwner>>> {
    let transactions = TransactionRepo::list_with_owner(&state.pool).await?;
    Ok(Json(transactions))
}

// ---------------------------------------------------------------------------
// Settlement plumbing
// ---------------------------------------------------------------------------

/// Query the provider for a pending transaction and apply the outcome.
async fn poll_and_settle(
    state: &AppState,
    transaction: Transaction,
) -> AppResult<Transaction> {
    let reference = transaction.payment_reference.clone();
    let outcome = state
        .gateway
        .query_status(&reference)
        .await
        .map_err(gateway_error)?;

    match outcome {
        PollOutcome::Completed => {
            let settled = TransactionRepo::settle_completed(&state.pool, &reference).await?;
            if settled == SettlementOutcome::Completed {
                state.event_bus.publish(PlatformEvent::payment_completed(
                    transaction.id,
                    transaction.user_id,
                    transaction.slots_purchased,
                ));
                tracing::info!(
                    transaction_id = transaction.id,
                    slots = transaction.slots_purchased,
                    "Payment settled"
                );
            }
        }
        PollOutcome::Failed { reason } => {
            TransactionRepo::settle_failed(&state.pool, &reference, &reason).await?;
            tracing::info!(transaction_id = transaction.id, reason = %reason, "Payment failed");
        }
        PollOutcome::StillPending => {}
    }

    TransactionRepo::find_by_reference(&state.pool, &reference)
        .await?
        .ok_or(AppError::NotFound("Transaction not found".into()))
}

/// Look up a transaction, scoped to its owner unless the caller is an
/// admin. Foreign references answer 404 rather than 403 so checkout ids
/// cannot be probed.
async fn find_owned(
    state: &AppState,
    user: &AuthUser,
    reference: &str,
) -> AppResult<Transaction> {
    let transaction = TransactionRepo::find_by_reference(&state.pool, reference)
        .await?
        .ok_or(AppError::NotFound("Transaction not found".into()))?;

    if !user.is_admin && transaction.user_id != user.user_id {
        return Err(AppError::NotFound("Transaction not found".into()));
    }
    Ok(transaction)
}

fn status_response(transaction: Transaction) -> PaymentStatusResponse {
    PaymentStatusResponse {
        payment_reference: transaction.payment_reference,
        status: transaction.status,
        failure_reason: transaction.failure_reason,
    }
}

fn gateway_error(err: GatewayError) -> AppError {
    AppError::Core(CoreError::PaymentProvider(err.to_string()))
}
