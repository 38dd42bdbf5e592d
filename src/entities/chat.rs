//! Chat entity - Entità chat e partecipanti

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct Chat {
    pub chat_id: i32,
    pub title: Option<String>,
    pub is_group: bool,
    // valorizzato solo per le chat di progetto create all'approvazione di una candidatura
    pub post_id: Option<i32>,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct ChatParticipant {
    pub chat_id: i32,
    pub user_id: i32,
    pub joined_at: DateTime<Utc>,
    // "ho letto i messaggi fino a questo istante, istante INCLUSO"
    pub last_read_at: DateTime<Utc>,
}
