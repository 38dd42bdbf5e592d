use crate::core::{AppError, AppState};
use crate::entities::User;
use crate::repositories::Read;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, header};
use axum::{Error, body::Body, extract::Request, http::Response, middleware::Next};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

pub const TOKEN_COOKIE: &str = "token";
pub const TOKEN_TTL_HOURS: i64 = 24;

// struct che codifica il contenuto del token jwt
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub exp: usize, // Expiry time of the token
    pub iat: usize, // Issued at time of the token
    pub id: i32,
    pub username: String,
}

#[instrument(skip(secret), fields(username = %username, id = %id))]
pub fn encode_jwt(username: String, id: i32, secret: &str) -> Result<String, Error> {
    debug!("Encoding JWT token for user");
    let now = Utc::now();
    let expire: chrono::TimeDelta = Duration::hours(TOKEN_TTL_HOURS);
    let exp: usize = (now + expire).timestamp() as usize;
    let iat: usize = now.timestamp() as usize;
    let claim = Claims {
        iat,
        exp,
        username,
        id,
    };

    encode(
        &Header::default(),
        &claim,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| {
        error!("Failed to encode JWT token: {:?}", e);
        Error::new("Error in encoding jwt token")
    })
}

#[instrument(skip(jwt_token, secret))]
pub fn decode_jwt(jwt_token: &str, secret: &str) -> Result<TokenData<Claims>, Error> {
    decode(
        jwt_token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        debug!("Failed to decode JWT token: {:?}", e);
        Error::new("Error in decoding jwt token")
    })
}

/// Token dalla richiesta: prima `Authorization: Bearer`, poi il cookie `token`
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    let from_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty());
    if from_header.is_some() {
        return from_header;
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == TOKEN_COOKIE)
        .map(|(_, token)| token.to_string())
        .filter(|token| !token.is_empty())
}

/// Header da allegare alla risposta di login: cookie HttpOnly + bearer
pub fn session_headers(token: &str, secure: bool) -> Result<HeaderMap, AppError> {
    let cookie = format!(
        "{}={}; HttpOnly; SameSite=Lax; Max-Age={}; Path=/{}",
        TOKEN_COOKIE,
        token,
        TOKEN_TTL_HOURS * 3600,
        if secure { "; Secure" } else { "" }
    );
    let mut headers = HeaderMap::new();
    headers.insert(header::SET_COOKIE, header_value(&cookie)?);
    headers.insert(header::AUTHORIZATION, header_value(&format!("Bearer {}", token))?);
    Ok(headers)
}

/// Header che invalidano il cookie di sessione
pub fn clear_session_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::SET_COOKIE,
        HeaderValue::from_static("token=; HttpOnly; SameSite=Lax; Max-Age=0; Path=/"),
    );
    headers
}

fn header_value(value: &str) -> Result<HeaderValue, AppError> {
    HeaderValue::from_str(value).map_err(|_| {
        error!("Token produced an invalid header value");
        AppError::internal_server_error("Internal server error")
    })
}

#[instrument(skip(state, req, next))]
pub async fn authentication_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response<Body>, AppError> {
    let token = extract_token(req.headers()).ok_or_else(|| {
        warn!("Missing authentication token");
        AppError::unauthenticated("Authentication required")
    })?;

    let token_data = decode_jwt(&token, state.jwt_secret()).map_err(|_| {
        warn!("Invalid or expired JWT token");
        AppError::unauthenticated("Invalid or expired token")
    })?;

    // l'utente potrebbe essere stato cancellato dopo l'emissione del token
    let current_user = state
        .user
        .read(&token_data.claims.id)
        .await?
        .ok_or_else(|| {
            warn!("User {} from token not found", token_data.claims.id);
            AppError::unauthenticated("You are not an authorized user")
        })?;

    debug!("User authenticated: {}", current_user.username);
    req.extensions_mut().insert(current_user);
    // voledo si può recuperare lo user da extension
    Ok(next.run(req).await)
}

/// Middleware che verifica che l'utente corrente partecipi alla chat nel path
/// e inserisce il `ChatParticipant` nell'Extension
#[instrument(skip(state, req, next))]
pub async fn chat_participant_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response<Body>, AppError> {
    let current_user = req
        .extensions()
        .get::<User>()
        .ok_or_else(|| {
            warn!("User not found in request extensions");
            AppError::unauthenticated("User not authenticated")
        })?
        .clone();

    // nel router annidato il path è relativo: "/{chat_id}/..."
    let chat_id: i32 = req
        .uri()
        .path()
        .split('/')
        .find_map(|segment| segment.parse::<i32>().ok())
        .ok_or_else(|| {
            warn!("Chat ID not found in path: {}", req.uri().path());
            AppError::bad_request("Chat ID not found in path")
        })?;

    if state.chat.read(&chat_id).await?.is_none() {
        return Err(AppError::not_found("Chat not found"));
    }

    let participant = state
        .chat
        .find_participant(&chat_id, &current_user.user_id)
        .await?
        .ok_or_else(|| {
            warn!(
                "User {} is not a participant of chat {}",
                current_user.user_id, chat_id
            );
            AppError::forbidden("You are not a participant of this chat")
        })?;

    info!("User {} verified as participant of chat {}", current_user.user_id, chat_id);
    req.extensions_mut().insert(participant);

    Ok(next.run(req).await)
}
