//! Connection DTOs - Data Transfer Objects per le connessioni tra utenti

use crate::dtos::UserDTO;
use crate::entities::{Connection, ConnectionStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ConnectionDTO {
    pub connection_id: i32,
    pub requester_id: i32,
    pub addressee_id: i32,
    pub status: ConnectionStatus,
    pub created_at: DateTime<Utc>,
    /// L'altro utente della relazione rispetto a chi interroga
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserDTO>,
}

impl From<Connection> for ConnectionDTO {
    fn from(value: Connection) -> Self {
        Self {
            connection_id: value.connection_id,
            requester_id: value.requester_id,
            addressee_id: value.addressee_id,
            status: value.status,
            created_at: value.created_at,
            user: None, // da popolare manualmente se necessario
        }
    }
}

/// Dati per una nuova richiesta di connessione
#[derive(Debug, Clone)]
pub struct NewConnection {
    pub requester_id: i32,
    pub addressee_id: i32,
}
