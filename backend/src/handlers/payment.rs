//! Payment gateway webhook

use axum::{body::Bytes, extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::external::midtrans::verify_notification_signature;
use crate::services::payment::MidtransNotification;
use crate::services::TransaksiService;
use crate::AppState;

/// Midtrans notification endpoint.
///
/// Any body that parses is acknowledged with 200 so the gateway stops
/// retrying; signature failures and reconciliation errors are logged.
pub async fn midtrans_callback(
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<(StatusCode, Json<Value>)> {
    let notification: MidtransNotification = serde_json::from_slice(&body)
        .map_err(|e| AppError::ValidationError(format!("Invalid notification body: {}", e)))?;

    tracing::info!(
        order_id = %notification.order_id,
        transaction_status = %notification.transaction_status,
        payment_type = ?notification.payment_type,
        "Payment notification received"
    );

    if let Some(gateway) = &state.gateway {
        let signature = notification.signature_key.as_deref().unwrap_or_default();
        if !verify_notification_signature(
            &notification.order_id,
            &notification.status_code,
            &notification.gross_amount,
            gateway.server_key(),
            signature,
        ) {
            tracing::warn!(order_id = %notification.order_id, "Payment notification signature mismatch, ignored");
            return Ok(ack());
        }
    }

    let service = TransaksiService::from_state(&state);
    match service
        .reconcile(&notification.order_id, notification.action())
        .await
    {
        Ok(Some(sale)) => {
            tracing::info!(order_id = %sale.order_id, status = %sale.status, "Sale reconciled from payment notification");
        }
        Ok(None) => {}
        Err(e) => {
            tracing::error!(order_id = %notification.order_id, "Failed to reconcile payment notification: {}", e);
        }
    }

    Ok(ack())
}

fn ack() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}
