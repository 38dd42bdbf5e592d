//! Subscription entity - Crediti per la pubblicazione di post RECRUITMENT

use super::enums::PaymentStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct Subscription {
    pub user_id: i32,
    pub remaining_posts: i32,
    pub total_purchased: i32,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct Payment {
    pub payment_id: i32,
    pub user_id: i32,
    pub checkout_session_id: String,
    pub plan_id: String,
    pub credits: i32,
    pub amount_cents: i64,
    #[sqlx(try_from = "String")]
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}
