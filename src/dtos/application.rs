//! Application DTOs - Data Transfer Objects per candidature

use crate::entities::{Application, ApplicationStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ApplicationDTO {
    pub application_id: i32,
    pub post_id: i32,
    pub applicant_id: i32,
    pub cover_letter: Option<String>,
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Application> for ApplicationDTO {
    fn from(value: Application) -> Self {
        Self {
            application_id: value.application_id,
            post_id: value.post_id,
            applicant_id: value.applicant_id,
            cover_letter: value.cover_letter,
            status: value.status,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, Validate)]
pub struct CreateApplicationDTO {
    #[validate(length(max = 5000, message = "Cover letter must be at most 5000 characters"))]
    pub cover_letter: Option<String>,
}

/// Dati per l'inserimento di una candidatura
#[derive(Debug, Clone)]
pub struct NewApplication {
    pub post_id: i32,
    pub applicant_id: i32,
    pub cover_letter: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UpdateApplicationStatusDTO {
    pub status: ApplicationStatus,
}
