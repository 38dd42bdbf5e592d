//! Notification entity - Notifiche generate come effetto collaterale delle azioni

use super::enums::NotificationKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct Notification {
    pub notification_id: i32,
    pub user_id: i32,
    pub actor_id: Option<i32>,
    #[sqlx(try_from = "String")]
    pub kind: NotificationKind,
    pub reference_id: Option<i32>,
    pub content: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}
