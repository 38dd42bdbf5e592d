//! Payment gateway - Checkout Stripe e verifica dei webhook

use crate::core::AppError;
use crate::core::config::{Config, CreditPlan};
use crate::dtos::CheckoutSessionDTO;
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use tracing::{error, info, instrument, warn};

type HmacSha256 = Hmac<Sha256>;

const STRIPE_API_BASE: &str = "https://api.stripe.com";
/// Scarto massimo tra il timestamp firmato e l'orologio del server
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_checkout_session(
        &self,
        user_id: i32,
        plan: &CreditPlan,
    ) -> Result<CheckoutSessionDTO, AppError>;
}

#[derive(Deserialize, Debug)]
struct StripeSession {
    id: String,
    url: Option<String>,
}

pub struct StripeGateway {
    client: reqwest::Client,
    api_base: String,
    secret_key: String,
    success_url: String,
    cancel_url: String,
}

impl StripeGateway {
    /// None se STRIPE_SECRET_KEY non è configurata
    pub fn from_config(config: &Config) -> Option<Self> {
        let secret_key = config.stripe_secret_key.clone()?;
        Some(Self {
            client: reqwest::Client::new(),
            api_base: STRIPE_API_BASE.to_string(),
            secret_key,
            success_url: config.stripe_success_url.clone(),
            cancel_url: config.stripe_cancel_url.clone(),
        })
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    #[instrument(skip(self, plan), fields(plan = %plan.id))]
    async fn create_checkout_session(
        &self,
        user_id: i32,
        plan: &CreditPlan,
    ) -> Result<CheckoutSessionDTO, AppError> {
        let user_id = user_id.to_string();
        let credits = plan.credits.to_string();
        let amount = plan.amount_cents.to_string();
        let product_name = format!("{} recruitment post credits", plan.credits);

        let form = [
            ("mode", "payment"),
            ("success_url", self.success_url.as_str()),
            ("cancel_url", self.cancel_url.as_str()),
            ("client_reference_id", user_id.as_str()),
            ("line_items[0][quantity]", "1"),
            ("line_items[0][price_data][currency]", "eur"),
            ("line_items[0][price_data][unit_amount]", amount.as_str()),
            ("line_items[0][price_data][product_data][name]", product_name.as_str()),
            ("metadata[user_id]", user_id.as_str()),
            ("metadata[plan_id]", plan.id.as_str()),
            ("metadata[credits]", credits.as_str()),
        ];

        let response = self
            .client
            .post(format!("{}/v1/checkout/sessions", self.api_base))
            .bearer_auth(&self.secret_key)
            .form(&form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("Stripe rejected checkout session: {} {}", status, body);
            return Err(AppError::bad_gateway("Payment provider rejected the request"));
        }

        let session: StripeSession = response.json().await?;
        let url = session.url.ok_or_else(|| {
            error!("Stripe session {} has no url", session.id);
            AppError::bad_gateway("Payment provider returned an incomplete session")
        })?;

        info!("Checkout session {} created", session.id);
        Ok(CheckoutSessionDTO {
            session_id: session.id,
            url,
        })
    }
}

// ************************* WEBHOOK ************************* //

/// Evento Stripe, si legge solo quanto serve
#[derive(Deserialize, Debug)]
pub struct StripeEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: StripeEventData,
}

#[derive(Deserialize, Debug)]
pub struct StripeEventData {
    pub object: StripeEventObject,
}

#[derive(Deserialize, Debug)]
pub struct StripeEventObject {
    pub id: String,
}

/// Verifica l'header `Stripe-Signature` (`t=...,v1=...`): HMAC-SHA256 di
/// `"{t}.{payload}"` con il segreto del webhook, entro la tolleranza.
pub fn verify_webhook_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    now: i64,
) -> Result<(), &'static str> {
    let mut timestamp: Option<i64> = None;
    let mut signatures: Vec<Vec<u8>> = Vec::new();

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse().ok(),
            Some(("v1", value)) => {
                if let Ok(bytes) = hex::decode(value) {
                    signatures.push(bytes);
                }
            }
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or("missing timestamp")?;
    if signatures.is_empty() {
        return Err("missing v1 signature");
    }
    if now.abs_diff(timestamp) > SIGNATURE_TOLERANCE_SECS.unsigned_abs() {
        warn!("Webhook timestamp outside tolerance");
        return Err("timestamp outside tolerance");
    }

    let signed_prefix = format!("{}.", timestamp);
    for signature in &signatures {
        let mut mac =
            HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| "invalid secret")?;
        mac.update(signed_prefix.as_bytes());
        mac.update(payload);
        if mac.verify_slice(signature).is_ok() {
            return Ok(());
        }
    }
    Err("signature mismatch")
}
