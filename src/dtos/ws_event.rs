//! WebSocket event DTOs - Frame scambiati sul canale /ws

use crate::dtos::{MessageDTO, NotificationDTO};
use serde::{Deserialize, Serialize};

/// Evento inviato dal server al client
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum PushEvent {
    Message(MessageDTO),
    Notification(NotificationDTO),
    Error(String),
}

/// Frame inviato dal client per scrivere in una chat
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ClientMessageDTO {
    pub chat_id: i32,
    pub content: String,
}
