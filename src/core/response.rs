//! Response envelope - Formato uniforme delle risposte di successo
//!
//! Ogni handler ritorna `{ success, message, data }`; gli errori passano da
//! `AppError` che produce `{ success: false, message, error }`.

use axum::{
    Json,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;

#[derive(Serialize, Debug)]
struct Envelope<T: Serialize> {
    success: bool,
    message: &'static str,
    data: T,
}

pub struct ApiResponse<T: Serialize> {
    status: StatusCode,
    message: &'static str,
    data: T,
    headers: Option<HeaderMap>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(message: &'static str, data: T) -> Self {
        Self {
            status: StatusCode::OK,
            message,
            data,
            headers: None,
        }
    }

    pub fn created(message: &'static str, data: T) -> Self {
        Self {
            status: StatusCode::CREATED,
            message,
            data,
            headers: None,
        }
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = Some(headers);
        self
    }
}

impl ApiResponse<()> {
    /// Risposta senza payload (`data: null`)
    pub fn message(message: &'static str) -> Self {
        Self::ok(message, ())
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let body = Json(Envelope {
            success: true,
            message: self.message,
            data: self.data,
        });
        match self.headers {
            Some(headers) => (self.status, headers, body).into_response(),
            None => (self.status, body).into_response(),
        }
    }
}
