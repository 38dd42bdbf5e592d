//! Query DTOs - Data Transfer Objects per query string di ricerca e paginazione

use crate::entities::PostType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 50;
pub const MAX_MESSAGES_PAGE_SIZE: i64 = 100;

/// Limita `limit` all'intervallo [1, max], default se assente
pub fn clamp_limit(limit: Option<i64>, default: i64, max: i64) -> i64 {
    limit.unwrap_or(default).clamp(1, max)
}

/// DTO per query parameters di ricerca utenti
#[derive(Serialize, Deserialize, Debug)]
pub struct UserSearchQuery {
    pub q: String,
    #[serde(default)]
    pub limit: Option<i64>,
}

/// Filtri e cursore del feed dei post
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct FeedQuery {
    #[serde(default)]
    pub post_type: Option<PostType>,
    #[serde(default)]
    pub author_id: Option<i32>,
    /// Cursore: restituisce solo post con id minore
    #[serde(default)]
    pub before: Option<i32>,
    #[serde(default)]
    pub limit: Option<i64>,
}

/// DTO per query parameters di paginazione messaggi
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct MessagesQuery {
    #[serde(default)]
    pub before: Option<DateTime<Utc>>,
    /// Spareggio per `before`: id del messaggio più vecchio già ricevuto
    #[serde(default)]
    pub before_id: Option<i32>,
    #[serde(default)]
    pub limit: Option<i64>,
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct NotificationsQuery {
    #[serde(default)]
    pub unread_only: Option<bool>,
    #[serde(default)]
    pub limit: Option<i64>,
}
