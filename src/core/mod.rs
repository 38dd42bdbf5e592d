//! Core Module - Componenti infrastrutturali dell'applicazione
//!
//! Questo modulo contiene tutti i componenti "core" dell'applicazione:
//! - Autenticazione e JWT
//! - Configurazione
//! - Gestione errori e formato delle risposte
//! - Stato applicazione

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod response;
pub mod state;

// Re-exports per facilitare l'import
pub use auth::{
    Claims, authentication_middleware, chat_participant_middleware, decode_jwt, encode_jwt,
};
pub use config::Config;
pub use error::AppError;
pub use extract::{Json, Path, Query};
pub use response::ApiResponse;
pub use state::AppState;
