//! Notification DTOs - Data Transfer Objects per notifiche

use crate::entities::{Notification, NotificationKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct NotificationDTO {
    pub notification_id: i32,
    pub actor_id: Option<i32>,
    pub kind: NotificationKind,
    pub reference_id: Option<i32>,
    pub content: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Notification> for NotificationDTO {
    fn from(value: Notification) -> Self {
        Self {
            notification_id: value.notification_id,
            actor_id: value.actor_id,
            kind: value.kind,
            reference_id: value.reference_id,
            content: value.content,
            is_read: value.is_read,
            created_at: value.created_at,
        }
    }
}

/// Dati per creare una notifica
#[derive(Debug, Clone)]
pub struct CreateNotificationDTO {
    pub user_id: i32,
    pub actor_id: Option<i32>,
    pub kind: NotificationKind,
    pub reference_id: Option<i32>,
    pub content: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct UnreadCountDTO {
    pub unread: i64,
}
