//! Connection services - Richieste di collegamento tra utenti

use crate::core::{ApiResponse, AppError, AppState, Path};
use crate::dtos::{ConnectionDTO, NewConnection, UserDTO};
use crate::entities::{Connection, ConnectionStatus, NotificationKind, User};
use crate::repositories::{Create, Delete, Read, ReadMany};
use crate::services::notification::notify;
use axum::{
    Extension,
    extract::State,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Popola `user` con l'altro capo della relazione rispetto a `viewer_id`
async fn with_other_party(
    state: &AppState,
    connections: Vec<Connection>,
    viewer_id: i32,
) -> Result<Vec<ConnectionDTO>, AppError> {
    let ids: Vec<i32> = connections.iter().map(|c| c.other_party(viewer_id)).collect();
    let mut users: HashMap<i32, UserDTO> = state
        .user
        .read_many(&ids)
        .await?
        .into_iter()
        .map(|u| (u.user_id, UserDTO::from(u)))
        .collect();

    Ok(connections
        .into_iter()
        .map(|connection| {
            let other = connection.other_party(viewer_id);
            let mut dto = ConnectionDTO::from(connection);
            dto.user = users.remove(&other);
            dto
        })
        .collect())
}

async fn load_connection(state: &AppState, connection_id: i32) -> Result<Connection, AppError> {
    state
        .connection
        .read(&connection_id)
        .await?
        .ok_or_else(|| AppError::not_found("Connection request not found"))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn request_connection(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(target_id): Path<i32>,
) -> Result<ApiResponse<ConnectionDTO>, AppError> {
    // 1. Niente richieste a se stessi
    // 2. Il destinatario deve esistere
    // 3. Se esiste già una relazione:
    //    - richiesta pendente nella direzione opposta -> viene accettata
    //    - altrimenti 409
    // 4. Nuova richiesta PENDING e notifica al destinatario

    if target_id == current_user.user_id {
        return Err(AppError::bad_request("You cannot connect with yourself"));
    }
    if state.user.read(&target_id).await?.is_none() {
        return Err(AppError::not_found("User not found"));
    }

    if let Some(existing) = state
        .connection
        .find_between(&current_user.user_id, &target_id)
        .await?
    {
        let incoming_pending = existing.status == ConnectionStatus::Pending
            && existing.requester_id == target_id;
        if !incoming_pending {
            warn!("Connection already exists");
            return Err(AppError::conflict("Connection already exists"));
        }

        state
            .connection
            .accept_if_pending(&existing.connection_id)
            .await?;
        info!("Opposite pending request {} accepted", existing.connection_id);
        notify(
            &state,
            target_id,
            current_user.user_id,
            NotificationKind::ConnectionAccepted,
            Some(existing.connection_id),
            format!("{} accepted your connection request", current_user.username),
        )
        .await;

        let accepted = load_connection(&state, existing.connection_id).await?;
        let dto = with_other_party(&state, vec![accepted], current_user.user_id)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::internal_server_error("Internal server error"))?;
        return Ok(ApiResponse::ok("Connection accepted", dto));
    }

    let connection = state
        .connection
        .create(&NewConnection {
            requester_id: current_user.user_id,
            addressee_id: target_id,
        })
        .await?;

    notify(
        &state,
        target_id,
        current_user.user_id,
        NotificationKind::ConnectionRequest,
        Some(connection.connection_id),
        format!("{} wants to connect with you", current_user.username),
    )
    .await;

    Ok(ApiResponse::created(
        "Connection request sent",
        ConnectionDTO::from(connection),
    ))
}

pub async fn list_connections(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
) -> Result<ApiResponse<Vec<UserDTO>>, AppError> {
    let connections = state.connection.find_accepted(&current_user.user_id).await?;
    let users = with_other_party(&state, connections, current_user.user_id)
        .await?
        .into_iter()
        .filter_map(|dto| dto.user)
        .collect();
    Ok(ApiResponse::ok("Connections retrieved", users))
}

pub async fn list_pending_requests(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
) -> Result<ApiResponse<Vec<ConnectionDTO>>, AppError> {
    let pending = state
        .connection
        .find_pending_incoming(&current_user.user_id)
        .await?;
    let dtos = with_other_party(&state, pending, current_user.user_id).await?;
    Ok(ApiResponse::ok("Pending requests retrieved", dtos))
}

pub async fn list_sent_requests(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
) -> Result<ApiResponse<Vec<ConnectionDTO>>, AppError> {
    let sent = state
        .connection
        .find_pending_sent(&current_user.user_id)
        .await?;
    let dtos = with_other_party(&state, sent, current_user.user_id).await?;
    Ok(ApiResponse::ok("Sent requests retrieved", dtos))
}

/// Solo il destinatario può rispondere, e solo finché la richiesta è pendente
fn ensure_addressee(connection: &Connection, user: &User) -> Result<(), AppError> {
    if connection.addressee_id != user.user_id {
        return Err(AppError::forbidden("Only the addressee can answer this request"));
    }
    if connection.status != ConnectionStatus::Pending {
        return Err(AppError::conflict("Connection request is no longer pending"));
    }
    Ok(())
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn accept_connection(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(connection_id): Path<i32>,
) -> Result<ApiResponse<ConnectionDTO>, AppError> {
    let connection = load_connection(&state, connection_id).await?;
    ensure_addressee(&connection, &current_user)?;

    if !state.connection.accept_if_pending(&connection_id).await? {
        return Err(AppError::conflict("Connection request is no longer pending"));
    }

    notify(
        &state,
        connection.requester_id,
        current_user.user_id,
        NotificationKind::ConnectionAccepted,
        Some(connection_id),
        format!("{} accepted your connection request", current_user.username),
    )
    .await;

    let accepted = load_connection(&state, connection_id).await?;
    Ok(ApiResponse::ok(
        "Connection accepted",
        ConnectionDTO::from(accepted),
    ))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn reject_connection(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(connection_id): Path<i32>,
) -> Result<ApiResponse<()>, AppError> {
    let connection = load_connection(&state, connection_id).await?;
    ensure_addressee(&connection, &current_user)?;

    state.connection.delete(&connection_id).await?;
    Ok(ApiResponse::message("Connection request rejected"))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn remove_connection(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(other_id): Path<i32>,
) -> Result<ApiResponse<()>, AppError> {
    if !state
        .connection
        .delete_between(&current_user.user_id, &other_id)
        .await?
    {
        return Err(AppError::not_found("Connection not found"));
    }
    Ok(ApiResponse::message("Connection removed"))
}
