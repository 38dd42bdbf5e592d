//! Chat DTOs - Data Transfer Objects per chat

use crate::dtos::{MessageDTO, UserDTO};
use crate::entities::Chat;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Struct per gestire io col client
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ChatDTO {
    pub chat_id: i32,
    pub title: Option<String>,
    pub is_group: bool,
    pub post_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub participants: Vec<UserDTO>,
    pub last_message: Option<MessageDTO>,
    pub unread_count: i64,
}

impl ChatDTO {
    pub fn from_chat(chat: Chat, participants: Vec<UserDTO>) -> Self {
        Self {
            chat_id: chat.chat_id,
            title: chat.title,
            is_group: chat.is_group,
            post_id: chat.post_id,
            created_at: chat.created_at,
            participants,
            last_message: None,
            unread_count: 0,
        }
    }

    /// Istante dell'ultima attività, usato per ordinare la lista chat
    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_message
            .as_ref()
            .map(|m| m.created_at)
            .unwrap_or(self.created_at)
    }
}

/// Body di POST /api/chats
#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct CreateChatDTO {
    #[validate(length(min = 1, max = 50, message = "A chat needs between 1 and 50 other participants"))]
    pub participant_ids: Vec<i32>,
    #[validate(length(min = 1, max = 100))]
    pub title: Option<String>,
}

/// Dati per l'inserimento di una chat (senza chat_id)
#[derive(Debug, Clone)]
pub struct NewChat {
    pub title: Option<String>,
    pub is_group: bool,
    pub post_id: Option<i32>,
}
