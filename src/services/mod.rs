//! Services module - Coordinatore per tutti i service handler HTTP
//!
//! Questo modulo organizza i service handlers in sotto-moduli separati per una migliore manutenibilità.
//! Ogni modulo gestisce gli endpoint HTTP per una specifica funzionalità.

pub mod application;
pub mod auth;
pub mod chat;
pub mod connection;
pub mod notification;
pub mod post;
pub mod stripe;
pub mod subscription;
pub mod task;
pub mod upload;
pub mod user;

// Re-exports per facilitare l'import
pub use application::{
    apply_to_post, list_my_applications, list_post_applications, update_application_status,
    withdraw_application,
};
pub use auth::{login_user, logout_user, register_user};
pub use chat::{
    create_chat, deliver_message, get_chat_messages, list_chats, mark_chat_read, send_message,
};
pub use connection::{
    accept_connection, list_connections, list_pending_requests, list_sent_requests,
    reject_connection, remove_connection, request_connection,
};
pub use notification::{
    delete_notification, list_notifications, mark_all_read, mark_notification_read, notify,
    unread_count,
};
pub use post::{
    create_comment, create_post, delete_comment, delete_post, get_post, like_post, list_comments,
    list_posts, unlike_post, update_post,
};
pub use stripe::{create_checkout, stripe_webhook};
pub use subscription::{get_subscription, list_plans};
pub use task::{
    create_submission, create_task, delete_task, get_task, list_post_tasks, list_submissions,
    review_submission, update_task,
};
pub use upload::upload_file;
pub use user::{
    add_education, add_experience, delete_education, delete_experience, delete_my_account, get_me,
    get_user_by_id, replace_skills, search_users, update_me,
};

use crate::core::{AppError, AppState};
use axum::{extract::State, http::StatusCode, response::IntoResponse};
use std::sync::Arc;

/// Root endpoint - health check
pub async fn root(State(_state): State<Arc<AppState>>) -> impl IntoResponse {
    (StatusCode::OK, "Server is running!")
}

/// Rotte inesistenti: stesso envelope degli altri errori
pub async fn route_not_found() -> AppError {
    AppError::not_found("Route not found")
}
