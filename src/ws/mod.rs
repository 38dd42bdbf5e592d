//! WebSocket Module - Gestione WebSocket per comunicazione real-time
//!
//! Ogni utente autenticato apre al più una connessione su `/ws`. Il server
//! spinge messaggi e notifiche (`PushEvent`); il client può inviare messaggi
//! nelle chat di cui è partecipante (`ClientMessageDTO`).

pub mod connection;
pub mod usermap;

// Re-exports pubblici
pub use connection::handle_socket;
pub use usermap::UserMap;

use crate::{core::AppState, entities::User};
use axum::{
    Extension,
    extract::{State, ws::WebSocketUpgrade},
    response::Response,
};
use std::sync::Arc;

/// Chiusura della connessione dopo questo intervallo senza frame dal client,
/// se `WS_IDLE_TIMEOUT_SECS` non è impostata
pub const TIMEOUT_DURATION_SECONDS: u64 = 300;
/// Intervallo minimo tra due frame elaborati dallo stesso client
pub const RATE_LIMITER_MILLIS: u64 = 20;

/// Entry point per gestire richieste di upgrade WebSocket
/// Operazioni:
/// 1. Estrarre user_id dall'autenticazione JWT
/// 2. Eseguire upgrade HTTP -> WebSocket
/// 3. Passare la connessione ad handle_socket
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>, // ottenuto dall'autenticazione JWT
) -> Response {
    let user_id = current_user.user_id;

    ws.on_upgrade(move |socket| handle_socket(socket, state, user_id))
}
