#![allow(dead_code)]

use axum_test::TestServer;
use sqlx::MySqlPool;
use std::sync::Arc;
use talentlink::config::Config;
use talentlink::core::AppState;

pub const JWT_SECRET: &str = "ilmiobellissimosegretochevaassolutamentecambiato";

/// Configurazione di test: upload in una cartella temporanea, Stripe disabilitato
pub fn test_config() -> Config {
    let upload_dir = std::env::temp_dir().join("talentlink-test-uploads");
    Config::for_tests(JWT_SECRET, &upload_dir.to_string_lossy())
}

/// Crea un AppState per i test
///
/// # Arguments
/// * `pool` - Connection pool MySQL
pub fn create_test_state(pool: MySqlPool) -> Arc<AppState> {
    Arc::new(AppState::new(pool, test_config()))
}

/// Crea un TestServer per i test
pub fn create_test_server(state: Arc<AppState>) -> TestServer {
    let app = talentlink::create_router(state);
    TestServer::new(app).expect("Failed to create test server")
}

/// Genera un JWT token valido 24 ore per l'utente indicato
pub fn create_test_jwt(user_id: i32, username: &str) -> String {
    talentlink::core::encode_jwt(username.to_string(), user_id, JWT_SECRET)
        .expect("Failed to create JWT token")
}

pub fn alice() -> String {
    create_test_jwt(1, "alice")
}

pub fn bob() -> String {
    create_test_jwt(2, "bob")
}

pub fn charlie() -> String {
    create_test_jwt(3, "charlie")
}

/// Avvia il router su una porta locale libera, per i test che usano socket reali
pub async fn spawn_server(state: Arc<AppState>) -> std::net::SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Failed to read local address");
    let app = talentlink::create_router(state);
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Test server crashed");
    });
    addr
}

pub type WsClient =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// Apre `/ws` con il token nell'header Authorization
pub async fn connect_ws(addr: std::net::SocketAddr, token: &str) -> WsClient {
    use tokio_tungstenite::tungstenite::client::IntoClientRequest;

    let mut request = format!("ws://{}/ws", addr)
        .into_client_request()
        .expect("Invalid WebSocket URL");
    request.headers_mut().insert(
        "authorization",
        format!("Bearer {}", token)
            .parse()
            .expect("Invalid authorization header"),
    );
    let (socket, _) = tokio_tungstenite::connect_async(request)
        .await
        .expect("WebSocket handshake failed");
    socket
}

/// Attende che la UserMap rifletta lo stato atteso (la registrazione avviene dopo l'upgrade)
pub async fn wait_online(state: &AppState, user_id: i32, online: bool) {
    tokio::time::timeout(std::time::Duration::from_secs(5), async {
        while state.users_online.is_user_online(&user_id) != online {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("UserMap did not reach the expected state");
}
