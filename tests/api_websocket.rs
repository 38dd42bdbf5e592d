//! Integration tests per il canale WebSocket
//!
//! I primi test registrano direttamente un canale nella UserMap, come fa
//! `handle_socket`, e verificano cosa vi arriva quando le rotte REST producono
//! messaggi e notifiche. Gli altri aprono socket reali con tokio-tungstenite
//! su un server in ascolto su una porta locale.

mod common;

#[cfg(test)]
mod ws_tests {
    use super::common::*;
    use futures_util::{SinkExt, StreamExt};
    use serde_json::{Value, json};
    use sqlx::MySqlPool;
    use std::sync::Arc;
    use std::time::Duration;
    use talentlink::core::AppState;
    use talentlink::dtos::PushEvent;
    use talentlink::entities::NotificationKind;
    use talentlink::services::deliver_message;
    use tokio::sync::mpsc;
    use tokio_tungstenite::tungstenite::Message;

    /// Prossimo frame di testo dal server, come JSON
    async fn next_event(socket: &mut WsClient) -> Value {
        loop {
            let frame = tokio::time::timeout(Duration::from_secs(5), socket.next())
                .await
                .expect("No frame received in time")
                .expect("Socket closed")
                .expect("Socket error");
            if let Message::Text(text) = frame {
                return serde_json::from_str(&text).expect("Server sent invalid JSON");
            }
        }
    }

    async fn send_frame(socket: &mut WsClient, frame: Value) {
        socket
            .send(Message::Text(frame.to_string()))
            .await
            .expect("Failed to send frame");
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "posts", "applications")))]
    async fn test_rest_message_is_pushed_to_other_participants(
        pool: MySqlPool,
    ) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let (alice_tx, mut alice_rx) = mpsc::unbounded_channel();
        let (bob_tx, mut bob_rx) = mpsc::unbounded_channel();
        state.users_online.register_online(1, alice_tx);
        state.users_online.register_online(2, bob_tx);

        let server = create_test_server(state.clone());
        server
            .post("/api/chats/1/messages")
            .authorization_bearer(alice())
            .json(&json!({ "content": "Welcome aboard" }))
            .await
            .assert_status(axum::http::StatusCode::CREATED);

        match bob_rx.try_recv() {
            Ok(PushEvent::Message(msg)) => {
                assert_eq!(msg.chat_id, 1);
                assert_eq!(msg.sender_id, 1);
                assert_eq!(msg.content, "Welcome aboard");
            }
            other => panic!("Expected a message event, got {:?}", other),
        }
        // il mittente non riceve l'eco
        assert!(alice_rx.try_recv().is_err());
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "posts", "applications")))]
    async fn test_deliver_message_checks_content(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);

        let err = deliver_message(&state, 1, 2, String::new())
            .await
            .unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);

        let msg = deliver_message(&state, 1, 2, "Thanks!".to_string())
            .await
            .unwrap();
        assert_eq!(msg.sender_id, 2);
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_notification_is_pushed_when_online(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let (bob_tx, mut bob_rx) = mpsc::unbounded_channel();
        state.users_online.register_online(2, bob_tx);

        let server = create_test_server(state.clone());
        server
            .post("/api/connection/2")
            .authorization_bearer(charlie())
            .await
            .assert_status(axum::http::StatusCode::CREATED);

        match bob_rx.try_recv() {
            Ok(PushEvent::Notification(n)) => {
                assert_eq!(n.kind, NotificationKind::ConnectionRequest);
                assert_eq!(n.actor_id, Some(3));
                assert!(!n.is_read);
            }
            other => panic!("Expected a notification event, got {:?}", other),
        }
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_offline_user_still_gets_stored_notification(
        pool: MySqlPool,
    ) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state.clone());
        assert!(!state.users_online.is_user_online(&2));

        server
            .post("/api/connection/2")
            .authorization_bearer(charlie())
            .await
            .assert_status(axum::http::StatusCode::CREATED);

        let body: Value = server
            .get("/api/notifications/unread-count")
            .authorization_bearer(bob())
            .await
            .json();
        assert_eq!(body["data"]["unread"], 1);
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_ws_requires_authentication(pool: MySqlPool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));
        server.get("/ws").await.assert_status_unauthorized();
        Ok(())
    }

    // ============================================================
    // Test con socket reali
    // ============================================================

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "posts", "applications")))]
    async fn test_frame_is_stored_and_pushed(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool.clone());
        let addr = spawn_server(state.clone()).await;

        let mut alice_ws = connect_ws(addr, &alice()).await;
        let mut bob_ws = connect_ws(addr, &bob()).await;
        wait_online(&state, 1, true).await;
        wait_online(&state, 2, true).await;

        send_frame(&mut alice_ws, json!({ "chat_id": 1, "content": "Kickoff at 10" })).await;

        let event = next_event(&mut bob_ws).await;
        assert_eq!(event["type"], "message");
        assert_eq!(event["data"]["chat_id"], 1);
        assert_eq!(event["data"]["sender_id"], 1);
        assert_eq!(event["data"]["content"], "Kickoff at 10");

        let stored: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE chat_id = 1 AND sender_id = 1")
                .fetch_one(&pool)
                .await?;
        assert_eq!(stored, 1);
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "posts", "applications")))]
    async fn test_malformed_frame_gets_error_event(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let addr = spawn_server(state.clone()).await;
        let mut alice_ws = connect_ws(addr, &alice()).await;

        alice_ws
            .send(Message::Text("{not json".to_string()))
            .await
            .expect("Failed to send frame");

        let event = next_event(&mut alice_ws).await;
        assert_eq!(event["type"], "error");
        assert_eq!(event["data"], "Malformed message");

        // la connessione resta utilizzabile
        send_frame(&mut alice_ws, json!({ "chat_id": 1, "content": "" })).await;
        let event = next_event(&mut alice_ws).await;
        assert_eq!(event["type"], "error");
        assert!(state.users_online.is_user_online(&1));
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "posts", "applications")))]
    async fn test_non_participant_frame_is_rejected(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool.clone());
        let addr = spawn_server(state.clone()).await;
        let mut charlie_ws = connect_ws(addr, &charlie()).await;

        send_frame(&mut charlie_ws, json!({ "chat_id": 1, "content": "Let me in" })).await;

        let event = next_event(&mut charlie_ws).await;
        assert_eq!(event["type"], "error");
        assert_eq!(event["data"], "You are not a participant of this chat");

        let stored: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE sender_id = 3")
            .fetch_one(&pool)
            .await?;
        assert_eq!(stored, 0);
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_close_unregisters_user(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let addr = spawn_server(state.clone()).await;

        let mut alice_ws = connect_ws(addr, &alice()).await;
        wait_online(&state, 1, true).await;

        alice_ws.close(None).await.expect("Failed to close socket");
        wait_online(&state, 1, false).await;
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_reconnect_replaces_previous_socket(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let addr = spawn_server(state.clone()).await;

        let mut first = connect_ws(addr, &alice()).await;
        wait_online(&state, 1, true).await;
        let _second = connect_ws(addr, &alice()).await;
        tokio::time::sleep(Duration::from_millis(100)).await;

        // chiudere il socket vecchio non deve scollegare quello nuovo
        first.close(None).await.expect("Failed to close socket");
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(state.users_online.is_user_online(&1));
        assert_eq!(state.users_online.online_count(), 1);
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_idle_connection_times_out(pool: MySqlPool) -> sqlx::Result<()> {
        let mut config = test_config();
        config.ws_idle_timeout_secs = 1;
        let state = Arc::new(AppState::new(pool, config));
        let addr = spawn_server(state.clone()).await;

        let mut alice_ws = connect_ws(addr, &alice()).await;
        wait_online(&state, 1, true).await;

        // nessun frame dal client: il server chiude la connessione
        let closed = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                match alice_ws.next().await {
                    Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                    Some(Ok(_)) => continue,
                }
            }
        })
        .await;
        assert!(closed.is_ok(), "Server did not close the idle connection");
        wait_online(&state, 1, false).await;
        Ok(())
    }
}
