//! User services - Profili, ricerca e gestione account

use crate::core::auth::clear_session_headers;
use crate::core::{ApiResponse, AppError, AppState, Json, Path, Query};
use crate::dtos::query::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, clamp_limit};
use crate::dtos::{
    CreateEducationDTO, CreateExperienceDTO, ProfileDTO, ReplaceSkillsDTO, UpdateProfileDTO,
    UserDTO, UserSearchQuery,
};
use crate::entities::{Education, Experience, User};
use crate::repositories::{Delete, Read, Update};
use axum::{
    Extension,
    extract::State,
};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

/// Compone il profilo completo; l'email è inclusa solo per il proprietario
async fn build_profile(
    state: &AppState,
    user: User,
    include_email: bool,
) -> Result<ProfileDTO, AppError> {
    let (skills, education, experience, (connection_count, post_count)) = tokio::try_join!(
        state.profile.find_skills(&user.user_id),
        state.profile.find_educations(&user.user_id),
        state.profile.find_experiences(&user.user_id),
        state.profile.counters(&user.user_id),
    )?;

    Ok(ProfileDTO {
        user_id: user.user_id,
        username: user.username,
        email: include_email.then_some(user.email),
        full_name: user.full_name,
        headline: user.headline,
        bio: user.bio,
        location: user.location,
        avatar_url: user.avatar_url,
        created_at: user.created_at,
        skills: skills.into_iter().map(|s| s.name).collect(),
        education,
        experience,
        connection_count,
        post_count,
    })
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
) -> Result<ApiResponse<ProfileDTO>, AppError> {
    let profile = build_profile(&state, current_user, true).await?;
    Ok(ApiResponse::ok("Profile retrieved", profile))
}

#[instrument(skip(state))]
pub async fn get_user_by_id(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i32>,
) -> Result<ApiResponse<ProfileDTO>, AppError> {
    let user = state.user.read(&user_id).await?.ok_or_else(|| {
        debug!("User not found");
        AppError::not_found("User not found")
    })?;

    let profile = build_profile(&state, user, false).await?;
    Ok(ApiResponse::ok("Profile retrieved", profile))
}

#[instrument(skip(state, params), fields(q = %params.q))]
pub async fn search_users(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UserSearchQuery>,
) -> Result<ApiResponse<Vec<UserDTO>>, AppError> {
    let query = params.q.trim();
    if query.is_empty() {
        return Err(AppError::bad_request("Search query must not be empty"));
    }
    let limit = clamp_limit(params.limit, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE);

    let users = state.user.search(query, limit).await?;
    Ok(ApiResponse::ok(
        "Users found",
        users.into_iter().map(UserDTO::from).collect(),
    ))
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id))]
pub async fn update_me(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Json(body): Json<UpdateProfileDTO>,
) -> Result<ApiResponse<ProfileDTO>, AppError> {
    body.validate()?;

    let updated = state.user.update(&current_user.user_id, &body).await?;
    info!("Profile updated");

    let profile = build_profile(&state, updated, true).await?;
    Ok(ApiResponse::ok("Profile updated", profile))
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id))]
pub async fn replace_skills(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Json(body): Json<ReplaceSkillsDTO>,
) -> Result<ApiResponse<Vec<String>>, AppError> {
    body.validate()?;

    let names = body.normalized();
    if names.iter().any(|name| name.chars().count() > 50) {
        return Err(AppError::bad_request("Skill names must be at most 50 characters"));
    }

    let skills = state
        .profile
        .replace_skills(&current_user.user_id, &names)
        .await?;
    Ok(ApiResponse::ok(
        "Skills updated",
        skills.into_iter().map(|s| s.name).collect(),
    ))
}

pub async fn add_education(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Json(body): Json<CreateEducationDTO>,
) -> Result<ApiResponse<Education>, AppError> {
    body.validate()?;
    if let (Some(start), Some(end)) = (body.start_year, body.end_year) {
        if end < start {
            return Err(AppError::bad_request("end_year must not precede start_year"));
        }
    }

    let education = state
        .profile
        .add_education(&current_user.user_id, &body)
        .await?;
    Ok(ApiResponse::created("Education added", education))
}

pub async fn delete_education(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(education_id): Path<i32>,
) -> Result<ApiResponse<()>, AppError> {
    if !state
        .profile
        .delete_education(&current_user.user_id, &education_id)
        .await?
    {
        return Err(AppError::not_found("Education entry not found"));
    }
    Ok(ApiResponse::message("Education removed"))
}

pub async fn add_experience(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Json(body): Json<CreateExperienceDTO>,
) -> Result<ApiResponse<Experience>, AppError> {
    body.validate()?;
    if body.end_date.is_some_and(|end| end < body.start_date) {
        return Err(AppError::bad_request("end_date must not precede start_date"));
    }

    let experience = state
        .profile
        .add_experience(&current_user.user_id, &body)
        .await?;
    Ok(ApiResponse::created("Experience added", experience))
}

pub async fn delete_experience(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(experience_id): Path<i32>,
) -> Result<ApiResponse<()>, AppError> {
    if !state
        .profile
        .delete_experience(&current_user.user_id, &experience_id)
        .await?
    {
        return Err(AppError::not_found("Experience entry not found"));
    }
    Ok(ApiResponse::message("Experience removed"))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn delete_my_account(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
) -> Result<ApiResponse<()>, AppError> {
    // le FK ON DELETE CASCADE rimuovono post, candidature, messaggi e il resto
    state.user.delete(&current_user.user_id).await?;
    warn!("Account deleted");

    Ok(ApiResponse::message("Account deleted").with_headers(clear_session_headers()))
}
