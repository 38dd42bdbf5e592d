//! User DTOs - Data Transfer Objects per utenti e profili

use crate::entities::{Education, Experience, User};
use chrono::{DateTime, NaiveDate, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

lazy_static! {
    static ref USERNAME_RE: Regex = Regex::new(r"^[A-Za-z0-9_.]+$").unwrap();
}

fn validate_password(password: &str) -> Result<(), ValidationError> {
    let has_letter = password.chars().any(|c| c.is_alphabetic());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if has_letter && has_digit {
        Ok(())
    } else {
        Err(ValidationError::new("weak_password")
            .with_message("Password must contain at least one letter and one digit".into()))
    }
}

/// Rappresentazione pubblica e compatta di un utente (liste, autori, partecipanti)
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UserDTO {
    pub user_id: i32,
    pub username: String,
    pub full_name: Option<String>,
    pub headline: Option<String>,
    pub avatar_url: Option<String>,
}

impl From<User> for UserDTO {
    fn from(value: User) -> Self {
        Self {
            user_id: value.user_id,
            username: value.username,
            full_name: value.full_name,
            headline: value.headline,
            avatar_url: value.avatar_url,
        }
    }
}

/// Profilo completo; l'email è esposta solo al proprietario
#[derive(Serialize, Deserialize, Debug)]
pub struct ProfileDTO {
    pub user_id: i32,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub headline: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub skills: Vec<String>,
    pub education: Vec<Education>,
    pub experience: Vec<Experience>,
    pub connection_count: i64,
    pub post_count: i64,
}

/// DTO di registrazione (body di POST /api/auth/register)
#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct CreateUserDTO {
    #[validate(
        length(min = 3, max = 30, message = "Username must be between 3 and 30 characters"),
        regex(path = *USERNAME_RE, message = "Username may contain letters, digits, '_' and '.'")
    )]
    pub username: String,

    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    #[validate(
        length(min = 8, max = 128, message = "Password must be between 8 and 128 characters"),
        custom(function = "validate_password")
    )]
    pub password: String,

    #[validate(length(max = 100))]
    pub full_name: Option<String>,
}

/// Dati per l'inserimento di un utente, con password già hashata
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub full_name: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct LoginDTO {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct AuthResponseDTO {
    pub token: String,
    pub user: UserDTO,
}

/// Aggiornamento parziale del profilo (solo campi `Some(_)`)
#[derive(Serialize, Deserialize, Debug, Default, Validate)]
pub struct UpdateProfileDTO {
    #[validate(length(min = 1, max = 100))]
    pub full_name: Option<String>,
    #[validate(length(max = 150))]
    pub headline: Option<String>,
    #[validate(length(max = 2000))]
    pub bio: Option<String>,
    #[validate(length(max = 100))]
    pub location: Option<String>,
    #[validate(url(message = "avatar_url must be a valid URL"), length(max = 512))]
    pub avatar_url: Option<String>,
}

impl UpdateProfileDTO {
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none()
            && self.headline.is_none()
            && self.bio.is_none()
            && self.location.is_none()
            && self.avatar_url.is_none()
    }
}

#[derive(Serialize, Deserialize, Debug, Validate)]
pub struct ReplaceSkillsDTO {
    #[validate(length(max = 50, message = "At most 50 skills are allowed"))]
    pub skills: Vec<String>,
}

impl ReplaceSkillsDTO {
    /// Nomi ripuliti: trim, scarto dei vuoti, de-duplicazione case-insensitive
    /// mantenendo la prima occorrenza
    pub fn normalized(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.skills
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .filter(|s| seen.insert(s.to_lowercase()))
            .map(str::to_string)
            .collect()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct CreateEducationDTO {
    #[validate(length(min = 1, max = 150))]
    pub institution: String,
    #[validate(length(max = 100))]
    pub degree: Option<String>,
    #[validate(length(max = 100))]
    pub field_of_study: Option<String>,
    #[validate(range(min = 1900, max = 2100))]
    pub start_year: Option<i32>,
    #[validate(range(min = 1900, max = 2100))]
    pub end_year: Option<i32>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct CreateExperienceDTO {
    #[validate(length(min = 1, max = 150))]
    pub company: String,
    #[validate(length(min = 1, max = 100))]
    pub title: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}
