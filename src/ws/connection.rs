//! WebSocket Connection Management - Gestione connessioni WebSocket

use crate::core::AppState;
use crate::dtos::{ClientMessageDTO, PushEvent};
use crate::services::deliver_message;
use crate::ws::RATE_LIMITER_MILLIS;
use axum::extract::ws::{Message, Utf8Bytes, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::time::{Duration, interval, timeout};
use tracing::{debug, error, info, instrument, warn};

#[instrument(skip(ws, state))]
pub async fn handle_socket(ws: WebSocket, state: Arc<AppState>, user_id: i32) {
    info!("WebSocket connection established");

    // Dividiamo il WebSocket in due metà: sender e receiver
    let (ws_tx, ws_rx) = ws.split();

    // Canale interno: tutto ciò che va spinto al client passa da qui
    let (int_tx, int_rx) = unbounded_channel::<PushEvent>();

    // una nuova connessione dello stesso utente sostituisce la precedente
    state.users_online.register_online(user_id, int_tx.clone());

    tokio::spawn(listen_ws(user_id, ws_rx, int_tx, state));
    tokio::spawn(write_ws(user_id, ws_tx, int_rx));
}

/// Serializza e inoltra al client gli eventi ricevuti sul canale interno.
/// Termina quando tutti i trasmettitori sono stati rilasciati o il socket è chiuso.
#[instrument(skip(websocket_tx, internal_rx))]
pub async fn write_ws(
    user_id: i32,
    mut websocket_tx: SplitSink<WebSocket, Message>,
    mut internal_rx: UnboundedReceiver<PushEvent>,
) {
    info!("Write task started");

    while let Some(event) = internal_rx.recv().await {
        let json = match serde_json::to_string(&event) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize event: {:?}", e);
                continue;
            }
        };
        if let Err(e) = websocket_tx.send(Message::Text(Utf8Bytes::from(json))).await {
            warn!("Failed to send event, closing connection: {:?}", e);
            break;
        }
    }

    let _ = websocket_tx.close().await;
    info!("Write task terminated");
}

#[instrument(skip(websocket_rx, internal_tx, state))]
pub async fn listen_ws(
    user_id: i32,
    mut websocket_rx: SplitStream<WebSocket>,
    internal_tx: UnboundedSender<PushEvent>,
    state: Arc<AppState>,
) {
    info!("Listen task started");

    let mut rate_limiter = interval(Duration::from_millis(RATE_LIMITER_MILLIS));
    let timeout_secs = state.config.ws_idle_timeout_secs;
    let timeout_duration = Duration::from_secs(timeout_secs);

    loop {
        match timeout(timeout_duration, websocket_rx.next()).await {
            Ok(Some(msg_result)) => {
                rate_limiter.tick().await;

                let msg = match msg_result {
                    Ok(m) => m,
                    Err(e) => {
                        warn!("WebSocket error: {:?}", e);
                        break;
                    }
                };

                match msg {
                    Message::Text(text) => {
                        if let Err(reason) = process_frame(&state, user_id, &text).await {
                            let _ = internal_tx.send(PushEvent::Error(reason));
                        }
                    }
                    Message::Close(_) => {
                        info!("Close message received");
                        break;
                    }
                    _ => {}
                }
            }
            Ok(None) => {
                info!("WebSocket stream ended");
                break;
            }
            Err(_) => {
                warn!(timeout_secs, "Connection timeout");
                break;
            }
        }
    }

    // Cleanup: rimuove l'utente solo se la mappa punta ancora a questa connessione
    info!("Cleaning up connection");
    state.users_online.remove_from_online(&user_id, &internal_tx);
    info!("Listen task terminated");
}

/// Elabora un frame testuale del client; in caso di errore ritorna il testo da rimandare
async fn process_frame(state: &AppState, user_id: i32, text: &str) -> Result<(), String> {
    // 1. Parsing del frame
    // 2. Verifica che l'utente partecipi alla chat
    // 3. Salvataggio e consegna agli altri partecipanti online

    let frame: ClientMessageDTO = serde_json::from_str(text).map_err(|e| {
        warn!("Failed to deserialize client frame: {}", e);
        "Malformed message".to_string()
    })?;

    match state.chat.find_participant(&frame.chat_id, &user_id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            warn!("User {} is not a participant of chat {}", user_id, frame.chat_id);
            return Err("You are not a participant of this chat".to_string());
        }
        Err(e) => {
            error!("Failed to check chat participation: {:?}", e);
            return Err("Internal server error".to_string());
        }
    }

    deliver_message(state, frame.chat_id, user_id, frame.content)
        .await
        .map(|message| debug!("Message {} sent over WebSocket", message.message_id))
        .map_err(|e| e.message().to_string())
}
