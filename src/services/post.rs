//! Post services - Feed, pubblicazione, like e commenti

use crate::core::{ApiResponse, AppError, AppState, Json, Path, Query};
use crate::dtos::query::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, clamp_limit};
use crate::dtos::{
    CommentDTO, CreateCommentDTO, CreatePostDTO, FeedQuery, NewComment, NewPost, PostDTO,
    UpdatePostDTO,
};
use crate::entities::{NotificationKind, Post, PostType, User};
use crate::repositories::{Create, Delete, Read, Update};
use crate::services::notification::notify;
use axum::{
    Extension,
    extract::State,
};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

/// Carica il post o restituisce 404
pub(crate) async fn load_post(state: &AppState, post_id: i32) -> Result<Post, AppError> {
    state
        .post
        .read(&post_id)
        .await?
        .ok_or_else(|| AppError::not_found("Post not found"))
}

async fn post_dto(state: &AppState, post_id: i32, viewer_id: i32) -> Result<PostDTO, AppError> {
    state
        .post
        .find_with_stats(&post_id, &viewer_id)
        .await?
        .map(PostDTO::from)
        .ok_or_else(|| AppError::not_found("Post not found"))
}

fn ensure_author(post: &Post, user: &User) -> Result<(), AppError> {
    if post.author_id != user.user_id {
        warn!(
            "User {} is not the author of post {}",
            user.user_id, post.post_id
        );
        return Err(AppError::forbidden("Only the author can do this"));
    }
    Ok(())
}

#[instrument(skip(state, current_user, params), fields(user_id = %current_user.user_id))]
pub async fn list_posts(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Query(params): Query<FeedQuery>,
) -> Result<ApiResponse<Vec<PostDTO>>, AppError> {
    let limit = clamp_limit(params.limit, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE);
    let posts = state
        .post
        .feed(&params, &current_user.user_id, limit)
        .await?;

    Ok(ApiResponse::ok(
        "Posts retrieved",
        posts.into_iter().map(PostDTO::from).collect(),
    ))
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id, post_type = %body.post_type))]
pub async fn create_post(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Json(body): Json<CreatePostDTO>,
) -> Result<ApiResponse<PostDTO>, AppError> {
    // 1. Validare il DTO; PROJECT e RECRUITMENT richiedono il titolo
    // 2. RECRUITMENT: consumo del credito e insert nella stessa transazione,
    //    senza crediti -> 402 e nessun post scritto
    // 3. Altri tipi: insert diretto
    // 4. Rileggere il post con i contatori per la risposta

    body.validate()?;
    if body.requires_title() && body.title.as_deref().is_none_or(|t| t.trim().is_empty()) {
        return Err(AppError::bad_request("This post type requires a title"));
    }

    let new_post = NewPost {
        author_id: current_user.user_id,
        post_type: body.post_type,
        title: body.title,
        content: body.content,
        image_url: body.image_url,
    };

    let post = if new_post.post_type == PostType::Recruitment {
        state
            .post
            .create_consuming_credit(&new_post)
            .await?
            .ok_or_else(|| {
                info!("Recruitment post rejected: no credits left");
                AppError::payment_required("No recruitment post credits left")
            })?
    } else {
        state.post.create(&new_post).await?
    };

    info!("Post {} created", post.post_id);
    let dto = post_dto(&state, post.post_id, current_user.user_id).await?;
    Ok(ApiResponse::created("Post created", dto))
}

pub async fn get_post(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(post_id): Path<i32>,
) -> Result<ApiResponse<PostDTO>, AppError> {
    let dto = post_dto(&state, post_id, current_user.user_id).await?;
    Ok(ApiResponse::ok("Post retrieved", dto))
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id))]
pub async fn update_post(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(post_id): Path<i32>,
    Json(body): Json<UpdatePostDTO>,
) -> Result<ApiResponse<PostDTO>, AppError> {
    body.validate()?;
    // come in creazione: un titolo fatto di soli spazi non è un titolo
    if body.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(AppError::bad_request("Title cannot be blank"));
    }

    let post = load_post(&state, post_id).await?;
    ensure_author(&post, &current_user)?;

    state.post.update(&post_id, &body).await?;
    let dto = post_dto(&state, post_id, current_user.user_id).await?;
    Ok(ApiResponse::ok("Post updated", dto))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn delete_post(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(post_id): Path<i32>,
) -> Result<ApiResponse<()>, AppError> {
    let post = load_post(&state, post_id).await?;
    ensure_author(&post, &current_user)?;

    state.post.delete(&post_id).await?;
    info!("Post {} deleted", post_id);
    Ok(ApiResponse::message("Post deleted"))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn like_post(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(post_id): Path<i32>,
) -> Result<ApiResponse<PostDTO>, AppError> {
    let post = load_post(&state, post_id).await?;

    let newly_liked = state.post.like(&current_user.user_id, &post_id).await?;
    if newly_liked {
        notify(
            &state,
            post.author_id,
            current_user.user_id,
            NotificationKind::PostLiked,
            Some(post_id),
            format!("{} liked your post", current_user.username),
        )
        .await;
    } else {
        debug!("Post already liked");
    }

    let dto = post_dto(&state, post_id, current_user.user_id).await?;
    Ok(ApiResponse::ok("Post liked", dto))
}

pub async fn unlike_post(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(post_id): Path<i32>,
) -> Result<ApiResponse<PostDTO>, AppError> {
    load_post(&state, post_id).await?;
    state.post.unlike(&current_user.user_id, &post_id).await?;

    let dto = post_dto(&state, post_id, current_user.user_id).await?;
    Ok(ApiResponse::ok("Like removed", dto))
}

pub async fn list_comments(
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<i32>,
) -> Result<ApiResponse<Vec<CommentDTO>>, AppError> {
    load_post(&state, post_id).await?;
    let comments = state.comment.find_many_by_post_id(&post_id).await?;
    Ok(ApiResponse::ok(
        "Comments retrieved",
        comments.into_iter().map(CommentDTO::from).collect(),
    ))
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id))]
pub async fn create_comment(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(post_id): Path<i32>,
    Json(body): Json<CreateCommentDTO>,
) -> Result<ApiResponse<CommentDTO>, AppError> {
    body.validate()?;
    let post = load_post(&state, post_id).await?;

    let comment = state
        .comment
        .create(&NewComment {
            post_id,
            author_id: current_user.user_id,
            content: body.content,
        })
        .await?;

    notify(
        &state,
        post.author_id,
        current_user.user_id,
        NotificationKind::PostCommented,
        Some(post_id),
        format!("{} commented on your post", current_user.username),
    )
    .await;

    Ok(ApiResponse::created("Comment added", CommentDTO::from(comment)))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn delete_comment(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path((post_id, comment_id)): Path<(i32, i32)>,
) -> Result<ApiResponse<()>, AppError> {
    let post = load_post(&state, post_id).await?;
    let comment = state
        .comment
        .read(&comment_id)
        .await?
        .filter(|c| c.post_id == post_id)
        .ok_or_else(|| AppError::not_found("Comment not found"))?;

    // può cancellare l'autore del commento oppure l'autore del post
    if comment.author_id != current_user.user_id && post.author_id != current_user.user_id {
        return Err(AppError::forbidden("You cannot delete this comment"));
    }

    state.comment.delete(&comment_id).await?;
    Ok(ApiResponse::message("Comment deleted"))
}
