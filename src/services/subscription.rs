//! Subscription services - Crediti per i post RECRUITMENT

use crate::core::config::CreditPlan;
use crate::core::{ApiResponse, AppError, AppState};
use crate::dtos::SubscriptionDTO;
use crate::entities::User;
use crate::repositories::Read;
use axum::{Extension, extract::State};
use std::sync::Arc;

pub async fn get_subscription(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
) -> Result<ApiResponse<SubscriptionDTO>, AppError> {
    // una riga mancante equivale a zero crediti
    let subscription = state
        .subscription
        .read(&current_user.user_id)
        .await?
        .map(SubscriptionDTO::from)
        .unwrap_or_default();
    Ok(ApiResponse::ok("Subscription retrieved", subscription))
}

pub async fn list_plans(State(state): State<Arc<AppState>>) -> ApiResponse<Vec<CreditPlan>> {
    ApiResponse::ok("Plans retrieved", state.config.credit_plans.clone())
}
