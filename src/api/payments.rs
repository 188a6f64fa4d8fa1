//! Payment endpoints

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::error;

use super::AppState;
use crate::models::{AuthUser, Booking};
use crate::services::PaymentIntentDetails;
use crate::utils::errors::{GatherlyError, Result};

#[derive(Debug, Deserialize)]
pub struct CreateIntentBody {
    pub booking_id: i64,
}

/// POST /payments/create-intent
pub async fn create_intent(
    user: AuthUser,
    State(state): State<AppState>,
    Json(body): Json<CreateIntentBody>,
) -> Result<Json<PaymentIntentDetails>> {
    let details = state
        .services
        .payment_service
        .create_payment_intent(&user, body.booking_id)
        .await?;

    Ok(Json(details))
}

#[derive(Debug, Deserialize)]
pub struct ConfirmPaymentBody {
    pub booking_id: i64,
    pub intent_id: String,
}

#[derive(Debug, Serialize)]
pub struct ConfirmPaymentResponse {
    pub booking: Booking,
    pub message: String,
}

/// POST /payments/confirm
pub async fn confirm_payment(
    user: AuthUser,
    State(state): State<AppState>,
    Json(body): Json<ConfirmPaymentBody>,
) -> Result<Json<ConfirmPaymentResponse>> {
    let booking = state
        .services
        .payment_service
        .confirm_payment(&user, body.booking_id, &body.intent_id)
        .await?;

    Ok(Json(ConfirmPaymentResponse {
        booking,
        message: "Payment confirmed".to_string(),
    }))
}

const SIGNATURE_HEADER: &str = "stripe-signature";

/// POST /payments/webhook
///
/// Raw-body endpoint for the provider's asynchronous events. A bad
/// signature or unparseable payload is the provider's problem and gets a
/// 400; everything after that is acknowledged with a 200 even on internal
/// failure, because a retry of the same event cannot change the outcome.
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            GatherlyError::WebhookSignature("missing signature header".to_string())
        })?;

    match state
        .services
        .payment_service
        .handle_webhook(&body, signature)
        .await
    {
        Ok(()) => {}
        Err(e @ (GatherlyError::WebhookSignature(_) | GatherlyError::Serialization(_))) => {
            return Err(e);
        }
        Err(e) => {
            error!(error = %e, "Webhook processing failed, acknowledging anyway");
        }
    }

    Ok(Json(serde_json::json!({ "received": true })))
}
