//! Connection entity - Relazione tra due utenti

use super::enums::ConnectionStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct Connection {
    pub connection_id: i32,
    pub requester_id: i32,
    pub addressee_id: i32,
    #[sqlx(try_from = "String")]
    pub status: ConnectionStatus,
    pub created_at: DateTime<Utc>,
}

impl Connection {
    /// Restituisce l'altro capo della relazione rispetto a `user_id`
    pub fn other_party(&self, user_id: i32) -> i32 {
        if self.requester_id == user_id {
            self.addressee_id
        } else {
            self.requester_id
        }
    }
}
