//! Chat services - Chat dirette, di gruppo e di progetto, messaggi e letture

use crate::core::{ApiResponse, AppError, AppState, Json, Path, Query};
use crate::dtos::query::{DEFAULT_PAGE_SIZE, MAX_MESSAGES_PAGE_SIZE, clamp_limit};
use crate::dtos::{
    ChatDTO, CreateChatDTO, CreateMessageDTO, MessageDTO, MessagesQuery, NewChat, PushEvent,
    SendMessageDTO, UserDTO,
};
use crate::entities::{Chat, ChatParticipant, User};
use crate::repositories::{Create, ReadMany};
use axum::{
    Extension,
    extract::State,
};
use chrono::Utc;
use futures_util::future::try_join_all;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

/// Arricchisce la chat con partecipanti, ultimo messaggio e non letti per `viewer_id`
async fn enrich_chat(state: &AppState, chat: Chat, viewer_id: i32) -> Result<ChatDTO, AppError> {
    let chat_id = chat.chat_id;
    let (participants, last_message, unread_count) = tokio::try_join!(
        state.chat.find_participants(&chat_id),
        state.msg.last_message(&chat_id),
        state.chat.unread_count(&chat_id, &viewer_id),
    )?;

    let ids: Vec<i32> = participants.iter().map(|p| p.user_id).collect();
    let users = state
        .user
        .read_many(&ids)
        .await?
        .into_iter()
        .map(UserDTO::from)
        .collect();

    let mut dto = ChatDTO::from_chat(chat, users);
    dto.last_message = last_message.map(MessageDTO::from);
    dto.unread_count = unread_count;
    Ok(dto)
}

/// Salva un messaggio e lo inoltra ai partecipanti online.
/// Usato sia dall'endpoint REST sia dal WebSocket.
#[instrument(skip(state, content))]
pub async fn deliver_message(
    state: &AppState,
    chat_id: i32,
    sender_id: i32,
    content: String,
) -> Result<MessageDTO, AppError> {
    let data = CreateMessageDTO {
        chat_id,
        sender_id,
        content,
        created_at: Utc::now(),
    };
    data.validate()?;

    let message = MessageDTO::from(state.msg.create(&data).await?);

    let participants = state.chat.find_participants(&chat_id).await?;
    for participant in participants.iter().filter(|p| p.user_id != sender_id) {
        state
            .users_online
            .send_if_online(&participant.user_id, PushEvent::Message(message.clone()));
    }
    debug!("Message {} delivered", message.message_id);

    Ok(message)
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn list_chats(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
) -> Result<ApiResponse<Vec<ChatDTO>>, AppError> {
    // 1. Recuperare tutte le chat dell'utente
    // 2. Per ciascuna caricare in parallelo partecipanti, ultimo messaggio e non letti
    // 3. Ordinare per ultima attività, dalla più recente

    let chats = state.chat.find_many_by_user_id(&current_user.user_id).await?;
    debug!("User participates in {} chats", chats.len());

    let mut dtos = try_join_all(
        chats
            .into_iter()
            .map(|chat| enrich_chat(&state, chat, current_user.user_id)),
    )
    .await?;
    dtos.sort_by_key(|dto| std::cmp::Reverse(dto.last_activity()));

    Ok(ApiResponse::ok("Chats retrieved", dtos))
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id))]
pub async fn create_chat(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Json(body): Json<CreateChatDTO>,
) -> Result<ApiResponse<ChatDTO>, AppError> {
    // CASO un solo altro partecipante: chat diretta, riusata se esiste già (200)
    // CASO più partecipanti: nuova chat di gruppo
    // In entrambi i casi tutti i partecipanti devono esistere (404)

    body.validate()?;

    let others: BTreeSet<i32> = body
        .participant_ids
        .iter()
        .copied()
        .filter(|id| *id != current_user.user_id)
        .collect();
    if others.is_empty() {
        return Err(AppError::bad_request("A chat needs at least one other participant"));
    }

    let ids: Vec<i32> = others.iter().copied().collect();
    let found = state.user.read_many(&ids).await?;
    if found.len() != ids.len() {
        warn!("Some participants do not exist");
        return Err(AppError::not_found("One or more participants not found"));
    }

    if let [other_id] = ids.as_slice() {
        if let Some(existing) = state
            .chat
            .find_direct_chat_between(&current_user.user_id, other_id)
            .await?
        {
            debug!("Returning existing direct chat {}", existing.chat_id);
            let dto = enrich_chat(&state, existing, current_user.user_id).await?;
            return Ok(ApiResponse::ok("Chat already exists", dto));
        }
    }

    let is_group = ids.len() > 1;
    let mut members = ids;
    members.push(current_user.user_id);

    let chat = state
        .chat
        .create_with_participants(
            &NewChat {
                title: if is_group { body.title } else { None },
                is_group,
                post_id: None,
            },
            &members,
        )
        .await?;
    info!("Chat {} created with {} participants", chat.chat_id, members.len());

    let dto = enrich_chat(&state, chat, current_user.user_id).await?;
    Ok(ApiResponse::created("Chat created", dto))
}

#[instrument(skip(state, participant), fields(chat_id = %chat_id, user_id = %participant.user_id))]
pub async fn get_chat_messages(
    State(state): State<Arc<AppState>>,
    Path(chat_id): Path<i32>,
    Query(params): Query<MessagesQuery>,
    Extension(participant): Extension<ChatParticipant>, // ottenuto dal chat_participant_middleware
) -> Result<ApiResponse<Vec<MessageDTO>>, AppError> {
    let limit = clamp_limit(params.limit, DEFAULT_PAGE_SIZE, MAX_MESSAGES_PAGE_SIZE);
    let messages = state
        .msg
        .find_page(&chat_id, params.before, params.before_id, limit)
        .await?;

    debug!("Retrieved {} messages", messages.len());
    Ok(ApiResponse::ok(
        "Messages retrieved",
        messages.into_iter().map(MessageDTO::from).collect(),
    ))
}

#[instrument(skip(state, participant, body), fields(chat_id = %chat_id, user_id = %participant.user_id))]
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    Path(chat_id): Path<i32>,
    Extension(participant): Extension<ChatParticipant>,
    Json(body): Json<SendMessageDTO>,
) -> Result<ApiResponse<MessageDTO>, AppError> {
    body.validate()?;
    let message = deliver_message(&state, chat_id, participant.user_id, body.content).await?;
    Ok(ApiResponse::created("Message sent", message))
}

pub async fn mark_chat_read(
    State(state): State<Arc<AppState>>,
    Path(chat_id): Path<i32>,
    Extension(participant): Extension<ChatParticipant>,
) -> Result<ApiResponse<()>, AppError> {
    state.chat.mark_read(&chat_id, &participant.user_id).await?;
    Ok(ApiResponse::message("Chat marked as read"))
}
