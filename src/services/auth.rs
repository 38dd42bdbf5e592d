//! Auth services - Gestione autenticazione e registrazione utenti

use crate::core::auth::{clear_session_headers, session_headers};
use crate::core::{ApiResponse, AppError, AppState, Json, encode_jwt};
use crate::dtos::{AuthResponseDTO, CreateUserDTO, LoginDTO, NewUser, UserDTO};
use crate::entities::User;
use crate::repositories::Create;
use axum::extract::State;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use validator::Validate;

#[instrument(skip(state, body), fields(email = %body.email))]
pub async fn login_user(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginDTO>,
) -> Result<ApiResponse<AuthResponseDTO>, AppError> {
    // 1. Cercare l'utente per email
    // 2. Verificare la password con bcrypt; stesso errore per utente inesistente e password errata
    // 3. Generare il token JWT (24 ore)
    // 4. Restituire token e utente, con cookie HttpOnly e header Authorization

    let user = state
        .user
        .find_by_email(&body.email.trim().to_lowercase())
        .await?
        .filter(|user| user.verify_password(&body.password))
        .ok_or_else(|| {
            warn!("Login failed");
            AppError::unauthenticated("Invalid email or password")
        })?;

    let token = encode_jwt(user.username.clone(), user.user_id, state.jwt_secret())?;
    let headers = session_headers(&token, state.config.is_production())?;

    info!("User {} logged in", user.user_id);
    Ok(ApiResponse::ok(
        "Login successful",
        AuthResponseDTO {
            token,
            user: UserDTO::from(user),
        },
    )
    .with_headers(headers))
}

#[instrument(skip(state, body), fields(username = %body.username))]
pub async fn register_user(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateUserDTO>,
) -> Result<ApiResponse<UserDTO>, AppError> {
    // 1. Validare il DTO (username, email, robustezza password)
    // 2. Controllare duplicati di username ed email per dare un messaggio chiaro
    //    (il vincolo UNIQUE resta comunque l'ultima parola in caso di corsa)
    // 3. Hash della password e inserimento di utente + riga subscription

    body.validate()?;

    let email = body.email.trim().to_lowercase();

    if state.user.find_by_username(&body.username).await?.is_some() {
        return Err(AppError::conflict("Username already exists"));
    }
    if state.user.find_by_email(&email).await?.is_some() {
        return Err(AppError::conflict("Email already registered"));
    }

    let password_hash = User::hash_password(&body.password)
        .map_err(|_| AppError::internal_server_error("Failed to hash password"))?;

    let new_user = NewUser {
        username: body.username,
        email,
        password_hash,
        full_name: body.full_name,
    };

    let created_user = state.user.create(&new_user).await?;
    info!("User {} registered", created_user.user_id);

    Ok(ApiResponse::created(
        "User registered",
        UserDTO::from(created_user),
    ))
}

pub async fn logout_user() -> ApiResponse<()> {
    ApiResponse::message("Logged out").with_headers(clear_session_headers())
}
