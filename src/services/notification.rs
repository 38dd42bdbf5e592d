//! Notification services - Notifiche persistite e push sul WebSocket

use crate::core::{ApiResponse, AppError, AppState, Path, Query};
use crate::dtos::query::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, clamp_limit};
use crate::dtos::{
    CreateNotificationDTO, NotificationDTO, NotificationsQuery, PushEvent, UnreadCountDTO,
};
use crate::entities::{NotificationKind, User};
use crate::repositories::{Create, Read};
use axum::{
    Extension,
    extract::State,
};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Crea la notifica e la invia al destinatario se è online.
/// Gli errori vengono solo loggati: una notifica persa non fa fallire l'azione che l'ha generata.
#[instrument(skip(state, content))]
pub async fn notify(
    state: &AppState,
    user_id: i32,
    actor_id: i32,
    kind: NotificationKind,
    reference_id: Option<i32>,
    content: String,
) {
    if user_id == actor_id {
        debug!("Skipping self notification");
        return;
    }

    let data = CreateNotificationDTO {
        user_id,
        actor_id: Some(actor_id),
        kind,
        reference_id,
        content,
    };

    match state.notification.create(&data).await {
        Ok(notification) => {
            state
                .users_online
                .send_if_online(&user_id, PushEvent::Notification(notification.into()));
        }
        Err(e) => warn!("Failed to store {} notification for user {}: {:?}", kind, user_id, e),
    }
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Query(params): Query<NotificationsQuery>,
) -> Result<ApiResponse<Vec<NotificationDTO>>, AppError> {
    let limit = clamp_limit(params.limit, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE);
    let notifications = state
        .notification
        .find_many_by_user_id(
            &current_user.user_id,
            params.unread_only.unwrap_or(false),
            limit,
        )
        .await?;

    Ok(ApiResponse::ok(
        "Notifications retrieved",
        notifications.into_iter().map(NotificationDTO::from).collect(),
    ))
}

pub async fn unread_count(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
) -> Result<ApiResponse<UnreadCountDTO>, AppError> {
    let unread = state.notification.unread_count(&current_user.user_id).await?;
    Ok(ApiResponse::ok("Unread count", UnreadCountDTO { unread }))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn mark_notification_read(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(notification_id): Path<i32>,
) -> Result<ApiResponse<NotificationDTO>, AppError> {
    // le notifiche di altri utenti non devono nemmeno risultare esistenti
    let notification = state
        .notification
        .read(&notification_id)
        .await?
        .filter(|n| n.user_id == current_user.user_id)
        .ok_or_else(|| AppError::not_found("Notification not found"))?;

    if !notification.is_read {
        state.notification.mark_read(&notification_id).await?;
    }

    let mut dto = NotificationDTO::from(notification);
    dto.is_read = true;
    Ok(ApiResponse::ok("Notification marked as read", dto))
}

pub async fn mark_all_read(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
) -> Result<ApiResponse<()>, AppError> {
    let changed = state.notification.mark_all_read(&current_user.user_id).await?;
    debug!("{} notifications marked as read", changed);
    Ok(ApiResponse::message("All notifications marked as read"))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn delete_notification(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(notification_id): Path<i32>,
) -> Result<ApiResponse<()>, AppError> {
    if !state
        .notification
        .delete_owned(&current_user.user_id, &notification_id)
        .await?
    {
        return Err(AppError::not_found("Notification not found"));
    }
    Ok(ApiResponse::message("Notification deleted"))
}
