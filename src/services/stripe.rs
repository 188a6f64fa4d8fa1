//! Stripe payment provider integration
//!
//! This service wraps the provider's HTTP API behind the `PaymentGateway`
//! trait (intent creation and retrieval) and verifies webhook signatures.
//! All requests carry a bounded timeout so a slow provider surfaces as an
//! error instead of a hang.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::PaymentConfig;
use crate::utils::errors::{GatherlyError, ProviderError, ProviderResult, Result};

type HmacSha256 = Hmac<Sha256>;

/// Provider-side status of a payment intent
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentStatus {
    RequiresPaymentMethod,
    RequiresConfirmation,
    RequiresAction,
    Processing,
    Succeeded,
    Canceled,
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for IntentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            IntentStatus::RequiresPaymentMethod => "requires_payment_method",
            IntentStatus::RequiresConfirmation => "requires_confirmation",
            IntentStatus::RequiresAction => "requires_action",
            IntentStatus::Processing => "processing",
            IntentStatus::Succeeded => "succeeded",
            IntentStatus::Canceled => "canceled",
            IntentStatus::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Payment intent as reported by the provider
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderIntent {
    pub id: String,
    pub status: IntentStatus,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub latest_charge: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// Request to open a payment intent with the provider
#[derive(Debug, Clone)]
pub struct CreateIntentRequest {
    /// Charge amount in the provider's minor units
    pub amount_minor: i64,
    pub currency: String,
    pub booking_id: i64,
    pub user_id: i64,
    pub event_id: i64,
}

/// Abstraction over the payment provider's intent API
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_intent(&self, request: CreateIntentRequest) -> ProviderResult<ProviderIntent>;

    async fn retrieve_intent(&self, intent_id: &str) -> ProviderResult<ProviderIntent>;
}

/// Production gateway talking to the Stripe HTTP API
#[derive(Clone, Debug)]
pub struct StripeGateway {
    client: Client,
    api_base: String,
    secret_key: String,
}

impl StripeGateway {
    /// Create a new StripeGateway instance
    pub fn new(config: &PaymentConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent("Gatherly/1.0")
            .build()
            .map_err(|e| GatherlyError::Provider(ProviderError::RequestFailed(e.to_string())))?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            secret_key: config.secret_key.clone(),
        })
    }

    fn map_transport_error(e: reqwest::Error) -> ProviderError {
        if e.is_timeout() {
            ProviderError::Timeout
        } else if e.is_connect() {
            ProviderError::ServiceUnavailable
        } else {
            ProviderError::RequestFailed(e.to_string())
        }
    }

    async fn parse_intent(response: reqwest::Response) -> ProviderResult<ProviderIntent> {
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ProviderError::RequestFailed(format!(
                "HTTP {status}: {error_text}"
            )));
        }

        response
            .json::<ProviderIntent>()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_intent(&self, request: CreateIntentRequest) -> ProviderResult<ProviderIntent> {
        let url = format!("{}/v1/payment_intents", self.api_base);

        debug!(
            booking_id = request.booking_id,
            amount_minor = request.amount_minor,
            "Creating payment intent"
        );

        let params = [
            ("amount", request.amount_minor.to_string()),
            ("currency", request.currency.clone()),
            ("automatic_payment_methods[enabled]", "true".to_string()),
            ("metadata[booking_id]", request.booking_id.to_string()),
            ("metadata[user_id]", request.user_id.to_string()),
            ("metadata[event_id]", request.event_id.to_string()),
        ];

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.secret_key)
            .header("Idempotency-Key", Uuid::new_v4().to_string())
            .form(&params)
            .send()
            .await
            .map_err(Self::map_transport_error)?;

        Self::parse_intent(response).await
    }

    async fn retrieve_intent(&self, intent_id: &str) -> ProviderResult<ProviderIntent> {
        let url = format!("{}/v1/payment_intents/{}", self.api_base, intent_id);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(Self::map_transport_error)?;

        Self::parse_intent(response).await
    }
}

/// Webhook event envelope delivered by the provider
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: WebhookData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookData {
    pub object: ProviderIntent,
}

/// Verify the provider's `t=...,v1=...` signature header.
///
/// The signed payload is `"{timestamp}.{raw body}"` and the signature is
/// HMAC-SHA256 under the endpoint secret. Timestamps outside the tolerance
/// window are rejected to blunt replay.
pub fn verify_webhook_signature(
    payload: &[u8],
    signature_header: &str,
    secret: &str,
    tolerance: Duration,
    now: DateTime<Utc>,
) -> Result<()> {
    let mut timestamp: Option<i64> = None;
    let mut candidates: Vec<String> = Vec::new();

    for part in signature_header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => {
                timestamp = value.parse::<i64>().ok();
            }
            Some(("v1", value)) => {
                candidates.push(value.to_string());
            }
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or_else(|| {
        GatherlyError::WebhookSignature("missing timestamp in signature header".to_string())
    })?;

    if candidates.is_empty() {
        return Err(GatherlyError::WebhookSignature(
            "missing v1 signature in header".to_string(),
        ));
    }

    let signed_at = Utc
        .timestamp_opt(timestamp, 0)
        .single()
        .ok_or_else(|| GatherlyError::WebhookSignature("invalid timestamp".to_string()))?;

    let age = (now - signed_at).num_seconds().unsigned_abs();
    if age > tolerance.as_secs() {
        warn!(age_seconds = age, "Webhook signature timestamp outside tolerance");
        return Err(GatherlyError::WebhookSignature(
            "timestamp outside tolerance".to_string(),
        ));
    }

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| GatherlyError::WebhookSignature(e.to_string()))?;
    mac.update(format!("{timestamp}.").as_bytes());
    mac.update(payload);

    // verify_slice is constant-time; accept if any v1 candidate matches
    for candidate in &candidates {
        if let Ok(bytes) = hex::decode(candidate) {
            if mac.clone().verify_slice(&bytes).is_ok() {
                return Ok(());
            }
        }
    }

    Err(GatherlyError::WebhookSignature(
        "no matching signature".to_string(),
    ))
}

/// Compute the signature header for a payload, as the provider would.
///
/// Exists for tests and local tooling that need to exercise the webhook
/// endpoint without a real provider.
pub fn sign_webhook_payload(payload: &[u8], secret: &str, timestamp: i64) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(format!("{timestamp}.").as_bytes());
    mac.update(payload);
    let signature = hex::encode(mac.finalize().into_bytes());
    format!("t={timestamp},v1={signature}")
}
