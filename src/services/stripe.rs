//! Stripe services - Checkout dei crediti e webhook di conferma

use crate::core::{ApiResponse, AppError, AppState, Json};
use crate::dtos::{CheckoutRequestDTO, CheckoutSessionDTO, NewPayment};
use crate::entities::User;
use crate::integrations::{StripeEvent, verify_webhook_signature};
use crate::repositories::{Create, PaymentCompletion};
use axum::{
    Extension,
    body::Bytes,
    extract::State,
    http::HeaderMap,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

const SIGNATURE_HEADER: &str = "stripe-signature";
const CHECKOUT_COMPLETED: &str = "checkout.session.completed";

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id, plan = %body.plan_id))]
pub async fn create_checkout(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Json(body): Json<CheckoutRequestDTO>,
) -> Result<ApiResponse<CheckoutSessionDTO>, AppError> {
    let plan = state
        .config
        .credit_plans
        .iter()
        .find(|plan| plan.id == body.plan_id)
        .ok_or_else(|| AppError::bad_request("Unknown plan"))?;

    let gateway = state.payments.as_ref().ok_or_else(|| {
        warn!("Checkout requested but payments are not configured");
        AppError::service_unavailable("Payments are not configured")
    })?;

    let session = gateway
        .create_checkout_session(current_user.user_id, plan)
        .await?;

    // il pagamento resta PENDING finché non arriva il webhook
    state
        .payment
        .create(&NewPayment {
            user_id: current_user.user_id,
            checkout_session_id: session.session_id.clone(),
            plan_id: plan.id.clone(),
            credits: plan.credits,
            amount_cents: plan.amount_cents,
        })
        .await?;

    info!("Checkout session {} started", session.session_id);
    Ok(ApiResponse::created("Checkout session created", session))
}

#[instrument(skip(state, headers, body), fields(size = body.len()))]
pub async fn stripe_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<ApiResponse<()>, AppError> {
    // 1. Verificare la firma sul body grezzo, prima di qualsiasi parsing
    // 2. checkout.session.completed -> pagamento COMPLETED + crediti, in transazione
    // 3. Replay di sessioni già completate e altri eventi: solo ack

    let secret = state
        .config
        .stripe_webhook_secret
        .as_deref()
        .ok_or_else(|| AppError::service_unavailable("Payments are not configured"))?;

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::bad_request("Missing Stripe-Signature header"))?;

    verify_webhook_signature(&body, signature, secret, Utc::now().timestamp()).map_err(
        |reason| {
            warn!("Webhook signature rejected: {}", reason);
            AppError::bad_request("Invalid webhook signature")
        },
    )?;

    let event: StripeEvent = serde_json::from_slice(&body).map_err(|e| {
        warn!("Malformed webhook payload: {}", e);
        AppError::bad_request("Malformed webhook payload")
    })?;

    if event.event_type != CHECKOUT_COMPLETED {
        debug!("Ignoring event {} of type {}", event.id, event.event_type);
        return Ok(ApiResponse::message("Event ignored"));
    }

    match state
        .payment
        .complete_and_credit(&event.data.object.id)
        .await?
    {
        PaymentCompletion::Credited(payment) => {
            info!(
                "Payment {} completed, {} credits added",
                payment.payment_id, payment.credits
            );
            Ok(ApiResponse::message("Payment completed"))
        }
        PaymentCompletion::AlreadyCompleted => Ok(ApiResponse::message("Payment already processed")),
        PaymentCompletion::UnknownSession => {
            warn!("Webhook for unknown session {}", event.data.object.id);
            Ok(ApiResponse::message("Unknown session ignored"))
        }
    }
}
