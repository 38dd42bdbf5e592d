//! Subscription DTOs - Crediti, piani e checkout

use crate::entities::Subscription;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct SubscriptionDTO {
    pub remaining_posts: i32,
    pub total_purchased: i32,
}

impl From<Subscription> for SubscriptionDTO {
    fn from(value: Subscription) -> Self {
        Self {
            remaining_posts: value.remaining_posts,
            total_purchased: value.total_purchased,
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct CheckoutRequestDTO {
    pub plan_id: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CheckoutSessionDTO {
    pub session_id: String,
    pub url: String,
}

/// Dati per registrare un pagamento in attesa di conferma
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub user_id: i32,
    pub checkout_session_id: String,
    pub plan_id: String,
    pub credits: i32,
    pub amount_cents: i64,
}
