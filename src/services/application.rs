//! Application services - Candidature ai post PROJECT e RECRUITMENT

use crate::core::{ApiResponse, AppError, AppState, Json, Path};
use crate::dtos::{
    ApplicationDTO, CreateApplicationDTO, NewApplication, UpdateApplicationStatusDTO,
};
use crate::entities::{Application, ApplicationStatus, NotificationKind, User};
use crate::repositories::{Create, Delete, Read};
use crate::services::notification::notify;
use crate::services::post::load_post;
use axum_macros::debug_handler;
use axum::{
    Extension,
    extract::State,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use validator::Validate;

async fn load_application(state: &AppState, application_id: i32) -> Result<Application, AppError> {
    state
        .application
        .read(&application_id)
        .await?
        .ok_or_else(|| AppError::not_found("Application not found"))
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id))]
pub async fn apply_to_post(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(post_id): Path<i32>,
    Json(body): Json<CreateApplicationDTO>,
) -> Result<ApiResponse<ApplicationDTO>, AppError> {
    // 1. Il post deve esistere, accettare candidature ed essere aperto
    // 2. L'autore non può candidarsi al proprio post
    // 3. Una sola candidatura per utente e post (controllo + vincolo UNIQUE)
    // 4. Notificare l'autore del post

    body.validate()?;
    let post = load_post(&state, post_id).await?;

    if !post.post_type.accepts_applications() {
        return Err(AppError::bad_request("This post does not accept applications"));
    }
    if !post.is_open {
        return Err(AppError::bad_request("This post is closed"));
    }
    if post.author_id == current_user.user_id {
        return Err(AppError::forbidden("You cannot apply to your own post"));
    }

    if state
        .application
        .find_by_post_and_applicant(&post_id, &current_user.user_id)
        .await?
        .is_some()
    {
        warn!("Duplicate application");
        return Err(AppError::conflict("You already applied to this post"));
    }

    let application = state
        .application
        .create(&NewApplication {
            post_id,
            applicant_id: current_user.user_id,
            cover_letter: body.cover_letter,
        })
        .await?;
    info!("Application {} created", application.application_id);

    notify(
        &state,
        post.author_id,
        current_user.user_id,
        NotificationKind::ApplicationReceived,
        Some(application.application_id),
        format!("{} applied to your post", current_user.username),
    )
    .await;

    Ok(ApiResponse::created(
        "Application submitted",
        ApplicationDTO::from(application),
    ))
}

pub async fn list_my_applications(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
) -> Result<ApiResponse<Vec<ApplicationDTO>>, AppError> {
    let applications = state
        .application
        .find_many_by_applicant_id(&current_user.user_id)
        .await?;
    Ok(ApiResponse::ok(
        "Applications retrieved",
        applications.into_iter().map(ApplicationDTO::from).collect(),
    ))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn list_post_applications(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(post_id): Path<i32>,
) -> Result<ApiResponse<Vec<ApplicationDTO>>, AppError> {
    let post = load_post(&state, post_id).await?;
    if post.author_id != current_user.user_id {
        return Err(AppError::forbidden("Only the post author can see its applications"));
    }

    let applications = state.application.find_many_by_post_id(&post_id).await?;
    Ok(ApiResponse::ok(
        "Applications retrieved",
        applications.into_iter().map(ApplicationDTO::from).collect(),
    ))
}

#[debug_handler]
#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id, status = %body.status))]
pub async fn update_application_status(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(application_id): Path<i32>,
    Json(body): Json<UpdateApplicationStatusDTO>,
) -> Result<ApiResponse<ApplicationDTO>, AppError> {
    // 1. Solo APPROVED o REJECTED sono destinazioni valide
    // 2. Solo l'autore del post decide
    // 3. Transizione atomica PENDING -> nuovo stato, altrimenti 409
    // 4. Se approvata: candidato aggiunto alla chat di progetto (creata alla prima approvazione)
    // 5. Notificare il candidato

    if body.status == ApplicationStatus::Pending {
        return Err(AppError::bad_request("Status must be APPROVED or REJECTED"));
    }

    let application = load_application(&state, application_id).await?;
    let post = load_post(&state, application.post_id).await?;
    if post.author_id != current_user.user_id {
        return Err(AppError::forbidden("Only the post author can review applications"));
    }

    // approvazione e ingresso nella chat di progetto nella stessa transazione
    let reviewed = if body.status == ApplicationStatus::Approved {
        let title = post
            .title
            .clone()
            .unwrap_or_else(|| format!("Project #{}", post.post_id));
        state
            .application
            .approve_into_project_chat(&application, &post.author_id, &title)
            .await?
            .is_some()
    } else {
        state
            .application
            .update_status_if_pending(&application_id, body.status)
            .await?
    };
    if !reviewed {
        return Err(AppError::conflict("Application has already been reviewed"));
    }

    notify(
        &state,
        application.applicant_id,
        current_user.user_id,
        NotificationKind::ApplicationStatus,
        Some(application_id),
        format!(
            "Your application was {}",
            body.status.as_str().to_lowercase()
        ),
    )
    .await;

    let updated = load_application(&state, application_id).await?;
    Ok(ApiResponse::ok(
        "Application updated",
        ApplicationDTO::from(updated),
    ))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn withdraw_application(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(application_id): Path<i32>,
) -> Result<ApiResponse<()>, AppError> {
    let application = load_application(&state, application_id).await?;
    if application.applicant_id != current_user.user_id {
        return Err(AppError::forbidden("You can only withdraw your own applications"));
    }
    if application.status != ApplicationStatus::Pending {
        return Err(AppError::conflict("Only pending applications can be withdrawn"));
    }

    state.application.delete(&application_id).await?;
    Ok(ApiResponse::message("Application withdrawn"))
}
