//! Task services - Task di progetto e consegne dei candidati approvati

use crate::core::{ApiResponse, AppError, AppState, Json, Path};
use crate::dtos::{
    CreateSubmissionDTO, CreateTaskDTO, NewSubmission, NewTask, ReviewSubmissionDTO,
    SubmissionDTO, TaskDTO, UpdateTaskDTO,
};
use crate::entities::{NotificationKind, Post, SubmissionStatus, Task, TaskStatus, User};
use crate::repositories::{Create, Delete, Read, Update};
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

async fn load_task(state: &AppState, task_id: i32) -> Result<Task, AppError> {
    state
        .task
        .read(&task_id)
        .await?
        .ok_or_else(|| AppError::not_found("Task not found"))
}

/// Autore del post oppure candidato approvato
async fn ensure_member(state: &AppState, post: &Post, user_id: i32) -> Result<(), AppError> {
    if post.author_id == user_id
        || state
            .application
            .is_approved_member(&post.post_id, &user_id)
            .await?
    {
        return Ok(());
    }
    warn!("User {} is not a member of post {}", user_id, post.post_id);
    Err(AppError::forbidden("You are not a member of this project"))
}

async fn ensure_assignable(state: &AppState, post_id: i32, assignee_id: i32) -> Result<(), AppError> {
    if !state
        .application
        .is_approved_member(&post_id, &assignee_id)
        .await?
    {
        return Err(AppError::bad_request(
            "Tasks can only be assigned to approved applicants",
        ));
    }
    Ok(())
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id))]
pub async fn create_task(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(post_id): Path<i32>,
    Json(body): Json<CreateTaskDTO>,
) -> Result<ApiResponse<TaskDTO>, AppError> {
    body.validate()?;

    let post = load_post(&state, post_id).await?;
    if post.author_id != current_user.user_id {
        return Err(AppError::forbidden("Only the post author can create tasks"));
    }
    if let Some(assignee_id) = body.assignee_id {
        ensure_assignable(&state, post_id, assignee_id).await?;
    }

    let task = state
        .task
        .create(&NewTask {
            post_id,
            creator_id: current_user.user_id,
            assignee_id: body.assignee_id,
            title: body.title,
            description: body.description,
            due_date: body.due_date,
        })
        .await?;

    if let Some(assignee_id) = task.assignee_id {
        notify(
            &state,
            assignee_id,
            current_user.user_id,
            NotificationKind::TaskAssigned,
            Some(task.task_id),
            format!("You were assigned the task \"{}\"", task.title),
        )
        .await;
    }

    Ok(ApiResponse::created("Task created", TaskDTO::from(task)))
}

pub async fn list_post_tasks(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(post_id): Path<i32>,
) -> Result<ApiResponse<Vec<TaskDTO>>, AppError> {
    let post = load_post(&state, post_id).await?;
    ensure_member(&state, &post, current_user.user_id).await?;

    let tasks = state.task.find_many_by_post_id(&post_id).await?;
    Ok(ApiResponse::ok(
        "Tasks retrieved",
        tasks.into_iter().map(TaskDTO::from).collect(),
    ))
}

pub async fn get_task(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(task_id): Path<i32>,
) -> Result<ApiResponse<TaskDTO>, AppError> {
    let task = load_task(&state, task_id).await?;
    let post = load_post(&state, task.post_id).await?;
    ensure_member(&state, &post, current_user.user_id).await?;

    Ok(ApiResponse::ok("Task retrieved", TaskDTO::from(task)))
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id))]
pub async fn update_task(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(task_id): Path<i32>,
    Json(body): Json<UpdateTaskDTO>,
) -> Result<ApiResponse<TaskDTO>, AppError> {
    body.validate()?;

    let task = load_task(&state, task_id).await?;
    if task.creator_id != current_user.user_id {
        return Err(AppError::forbidden("Only the task creator can update it"));
    }

    let reassigned = body
        .assignee_id
        .filter(|assignee| task.assignee_id != Some(*assignee));
    if let Some(assignee_id) = reassigned {
        ensure_assignable(&state, task.post_id, assignee_id).await?;
    }

    let updated = state.task.update(&task_id, &body).await?;

    if let Some(assignee_id) = reassigned {
        notify(
            &state,
            assignee_id,
            current_user.user_id,
            NotificationKind::TaskAssigned,
            Some(task_id),
            format!("You were assigned the task \"{}\"", updated.title),
        )
        .await;
    }

    Ok(ApiResponse::ok("Task updated", TaskDTO::from(updated)))
}

pub async fn delete_task(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(task_id): Path<i32>,
) -> Result<ApiResponse<()>, AppError> {
    let task = load_task(&state, task_id).await?;
    if task.creator_id != current_user.user_id {
        return Err(AppError::forbidden("Only the task creator can delete it"));
    }

    state.task.delete(&task_id).await?;
    info!("Task {} deleted", task_id);
    Ok(ApiResponse::message("Task deleted"))
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id))]
pub async fn create_submission(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(task_id): Path<i32>,
    Json(body): Json<CreateSubmissionDTO>,
) -> Result<ApiResponse<SubmissionDTO>, AppError> {
    body.validate()?;

    let task = load_task(&state, task_id).await?;
    let is_assignee = task.assignee_id == Some(current_user.user_id);
    if !is_assignee
        && !state
            .application
            .is_approved_member(&task.post_id, &current_user.user_id)
            .await?
    {
        return Err(AppError::forbidden("Only approved applicants can submit work"));
    }
    if task.status != TaskStatus::Open {
        return Err(AppError::conflict("Task is not open for submissions"));
    }

    let submission = state
        .submission
        .create(&NewSubmission {
            task_id,
            submitter_id: current_user.user_id,
            content: body.content,
            attachment_url: body.attachment_url,
        })
        .await?;

    notify(
        &state,
        task.creator_id,
        current_user.user_id,
        NotificationKind::SubmissionReceived,
        Some(submission.submission_id),
        format!(
            "{} submitted work for \"{}\"",
            current_user.username, task.title
        ),
    )
    .await;

    Ok(ApiResponse::created(
        "Submission created",
        SubmissionDTO::from(submission),
    ))
}

pub async fn list_submissions(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(task_id): Path<i32>,
) -> Result<ApiResponse<Vec<SubmissionDTO>>, AppError> {
    let task = load_task(&state, task_id).await?;

    // il creatore vede tutte le consegne, gli altri solo le proprie
    let submitter = (task.creator_id != current_user.user_id).then_some(current_user.user_id);
    let submissions = state
        .submission
        .find_many_by_task_id(&task_id, submitter)
        .await?;

    Ok(ApiResponse::ok(
        "Submissions retrieved",
        submissions.into_iter().map(SubmissionDTO::from).collect(),
    ))
}

#[debug_handler]
#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id, status = %body.status))]
pub async fn review_submission(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(submission_id): Path<i32>,
    Json(body): Json<ReviewSubmissionDTO>,
) -> Result<ApiResponse<SubmissionDTO>, AppError> {
    body.validate()?;
    if body.status == SubmissionStatus::Pending {
        return Err(AppError::bad_request("Status must be ACCEPTED or REJECTED"));
    }

    let submission = state
        .submission
        .read(&submission_id)
        .await?
        .ok_or_else(|| AppError::not_found("Submission not found"))?;
    let task = load_task(&state, submission.task_id).await?;
    if task.creator_id != current_user.user_id {
        return Err(AppError::forbidden("Only the task creator can review submissions"));
    }

    if !state
        .submission
        .review_if_pending(
            &submission_id,
            &task.task_id,
            body.status,
            body.feedback.as_deref(),
        )
        .await?
    {
        return Err(AppError::conflict("Submission has already been reviewed"));
    }

    notify(
        &state,
        submission.submitter_id,
        current_user.user_id,
        NotificationKind::SubmissionReviewed,
        Some(submission_id),
        format!(
            "Your submission for \"{}\" was {}",
            task.title,
            body.status.as_str().to_lowercase()
        ),
    )
    .await;

    let reviewed = state
        .submission
        .read(&submission_id)
        .await?
        .ok_or_else(|| AppError::not_found("Submission not found"))?;
    Ok(ApiResponse::ok(
        "Submission reviewed",
        SubmissionDTO::from(reviewed),
    ))
}
