//! Extractors - Json, Path e Query con rifiuti nel formato di `AppError`
//!
//! Gli extractor di axum rispondono in testo semplice quando il body o i
//! parametri non sono validi; questi wrapper li convertono nell'envelope
//! `{ success: false, message, error }`.

use crate::core::AppError;
use axum_macros::{FromRequest, FromRequestParts};

#[derive(FromRequest, Debug)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct Json<T>(pub T);

#[derive(FromRequestParts, Debug)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct Path<T>(pub T);

#[derive(FromRequestParts, Debug)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct Query<T>(pub T);
