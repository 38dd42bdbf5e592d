//! Server library - espone i moduli principali per i test

pub mod core;
pub mod dtos;
pub mod entities;
pub mod integrations;
pub mod repositories;
pub mod services;
pub mod ws;

// Re-export dei tipi principali per facilitare l'import
pub use core::{AppError, AppState, auth, config};
pub use services::{root, route_not_found};

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{
        HeaderValue, Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    middleware,
    routing::{any, delete, get, patch, post, put},
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::warn;

/// Margine per gli header multipart oltre alla dimensione massima del file
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Crea il router principale dell'applicazione
pub fn create_router(state: Arc<AppState>) -> Router {
    use ws::ws_handler;

    let api = Router::new()
        .nest("/auth", configure_auth_routes())
        .nest("/user", configure_user_routes(state.clone()))
        .nest("/post", configure_post_routes(state.clone()))
        .nest("/application", configure_application_routes(state.clone()))
        .nest("/tasks", configure_task_routes(state.clone()))
        .nest("/chats", configure_chat_routes(state.clone()))
        .nest("/connection", configure_connection_routes(state.clone()))
        .nest("/notifications", configure_notification_routes(state.clone()))
        .nest("/subscription", configure_subscription_routes(state.clone()))
        .nest("/upload", configure_upload_routes(state.clone()))
        .nest("/stripe", configure_stripe_routes(state.clone()));

    Router::new()
        .route("/", get(root))
        .nest("/api", api)
        .route(
            "/ws",
            any(ws_handler).layer(middleware::from_fn_with_state(
                state.clone(),
                core::authentication_middleware,
            )),
        )
        .nest_service("/uploads", ServeDir::new(&state.config.upload_dir))
        .fallback(route_not_found)
        .layer(cors_layer(state.config.cors_origin.as_deref()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS permissivo se `CORS_ORIGIN` non è impostato, altrimenti solo l'origine indicata
/// (con credenziali, per il cookie di sessione)
fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::PATCH,
        Method::DELETE,
        Method::OPTIONS,
    ];

    match origin.map(HeaderValue::from_str) {
        Some(Ok(origin)) => CorsLayer::new()
            .allow_origin(AllowOrigin::exact(origin))
            .allow_methods(methods)
            .allow_headers([AUTHORIZATION, CONTENT_TYPE])
            .allow_credentials(true),
        Some(Err(_)) => {
            warn!("Invalid CORS_ORIGIN, falling back to permissive CORS");
            CorsLayer::permissive()
        }
        None => CorsLayer::permissive(),
    }
}

/// Configura le routes di autenticazione (login, register, logout)
fn configure_auth_routes() -> Router<Arc<AppState>> {
    use services::*;
    Router::new()
        .route("/login", post(login_user))
        .route("/register", post(register_user))
        .route("/logout", post(logout_user))
}

/// Configura le routes per profili utente e ricerca
fn configure_user_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use core::authentication_middleware;
    use services::*;

    Router::new()
        .route("/me", get(get_me).patch(update_me).delete(delete_my_account))
        .route("/me/skills", put(replace_skills))
        .route("/me/education", post(add_education))
        .route("/me/education/{education_id}", delete(delete_education))
        .route("/me/experience", post(add_experience))
        .route("/me/experience/{experience_id}", delete(delete_experience))
        .route("/search", get(search_users))
        .route("/{user_id}", get(get_user_by_id))
        .layer(middleware::from_fn_with_state(
            state,
            authentication_middleware,
        ))
}

/// Configura le routes per feed, post, like e commenti
fn configure_post_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use core::authentication_middleware;
    use services::*;

    Router::new()
        .route("/", get(list_posts).post(create_post))
        .route(
            "/{post_id}",
            get(get_post).patch(update_post).delete(delete_post),
        )
        .route("/{post_id}/like", post(like_post).delete(unlike_post))
        .route(
            "/{post_id}/comments",
            get(list_comments).post(create_comment),
        )
        .route("/{post_id}/comments/{comment_id}", delete(delete_comment))
        .layer(middleware::from_fn_with_state(
            state,
            authentication_middleware,
        ))
}

/// Configura le routes per le candidature
fn configure_application_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use core::authentication_middleware;
    use services::*;

    Router::new()
        .route("/mine", get(list_my_applications))
        .route(
            "/post/{post_id}",
            get(list_post_applications).post(apply_to_post),
        )
        .route("/{application_id}/status", patch(update_application_status))
        .route("/{application_id}", delete(withdraw_application))
        .layer(middleware::from_fn_with_state(
            state,
            authentication_middleware,
        ))
}

/// Configura le routes per task e consegne
fn configure_task_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use core::authentication_middleware;
    use services::*;

    Router::new()
        .route("/post/{post_id}", get(list_post_tasks).post(create_task))
        .route(
            "/submissions/{submission_id}/review",
            patch(review_submission),
        )
        .route(
            "/{task_id}",
            get(get_task).patch(update_task).delete(delete_task),
        )
        .route(
            "/{task_id}/submissions",
            get(list_submissions).post(create_submission),
        )
        .layer(middleware::from_fn_with_state(
            state,
            authentication_middleware,
        ))
}

/// Configura le routes per la gestione delle chat
fn configure_chat_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use core::{authentication_middleware, chat_participant_middleware};
    use services::*;

    // Rotte che NON richiedono di partecipare alla chat (solo autenticazione)
    let public_routes = Router::new()
        .route("/", get(list_chats).post(create_chat))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            authentication_middleware,
        ));

    // Rotte che richiedono la partecipazione (autenticazione + participant middleware)
    let participant_routes = Router::new()
        .route(
            "/{chat_id}/messages",
            get(get_chat_messages).post(send_message),
        )
        .route("/{chat_id}/read", post(mark_chat_read))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            chat_participant_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            state,
            authentication_middleware,
        ));

    public_routes.merge(participant_routes)
}

/// Configura le routes per i collegamenti tra utenti
fn configure_connection_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use core::authentication_middleware;
    use services::*;

    Router::new()
        .route("/", get(list_connections))
        .route("/pending", get(list_pending_requests))
        .route("/sent", get(list_sent_requests))
        // stesso nome di parametro: `{id}` è un user_id o un connection_id a seconda della rotta
        .route("/{id}", post(request_connection).delete(remove_connection))
        .route("/{id}/accept", post(accept_connection))
        .route("/{id}/reject", post(reject_connection))
        .layer(middleware::from_fn_with_state(
            state,
            authentication_middleware,
        ))
}

/// Configura le routes per le notifiche
fn configure_notification_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use core::authentication_middleware;
    use services::*;

    Router::new()
        .route("/", get(list_notifications))
        .route("/unread-count", get(unread_count))
        .route("/read-all", patch(mark_all_read))
        .route("/{notification_id}/read", patch(mark_notification_read))
        .route("/{notification_id}", delete(delete_notification))
        .layer(middleware::from_fn_with_state(
            state,
            authentication_middleware,
        ))
}

/// Configura le routes per crediti e piani
fn configure_subscription_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use core::authentication_middleware;
    use services::*;

    Router::new()
        .route("/", get(get_subscription))
        .route("/plans", get(list_plans))
        .layer(middleware::from_fn_with_state(
            state,
            authentication_middleware,
        ))
}

/// Configura la route di upload, con limite del body allineato a MAX_UPLOAD_BYTES
fn configure_upload_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use core::authentication_middleware;
    use services::*;

    let body_limit = state.config.max_upload_bytes + MULTIPART_OVERHEAD_BYTES;
    Router::new()
        .route("/", post(upload_file))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn_with_state(
            state,
            authentication_middleware,
        ))
}

/// Configura le routes Stripe: il webhook è autenticato dalla firma, non dal JWT
fn configure_stripe_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use core::authentication_middleware;
    use services::*;

    let checkout = Router::new()
        .route("/checkout", post(create_checkout))
        .layer(middleware::from_fn_with_state(
            state,
            authentication_middleware,
        ));

    Router::new()
        .route("/webhook", post(stripe_webhook))
        .merge(checkout)
}
