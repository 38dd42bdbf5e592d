//! Post DTOs - Data Transfer Objects per post, commenti e feed

use crate::entities::{Comment, PostType, PostWithStats};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PostDTO {
    pub post_id: i32,
    pub author_id: i32,
    pub author_username: String,
    pub post_type: PostType,
    pub title: Option<String>,
    pub content: String,
    pub image_url: Option<String>,
    pub is_open: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub like_count: i64,
    pub comment_count: i64,
    pub liked_by_me: bool,
}

impl From<PostWithStats> for PostDTO {
    fn from(value: PostWithStats) -> Self {
        Self {
            post_id: value.post_id,
            author_id: value.author_id,
            author_username: value.author_username,
            post_type: value.post_type,
            title: value.title,
            content: value.content,
            image_url: value.image_url,
            is_open: value.is_open,
            created_at: value.created_at,
            updated_at: value.updated_at,
            like_count: value.like_count,
            comment_count: value.comment_count,
            liked_by_me: value.liked_by_me != 0,
        }
    }
}

/// DTO per creare un nuovo post (senza post_id)
#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct CreatePostDTO {
    pub post_type: PostType,

    #[validate(length(min = 1, max = 150, message = "Title must be between 1 and 150 characters"))]
    pub title: Option<String>,

    #[validate(length(min = 1, max = 5000, message = "Post content must be between 1 and 5000 characters"))]
    pub content: String,

    #[validate(url(message = "image_url must be a valid URL"), length(max = 512))]
    pub image_url: Option<String>,
}

impl CreatePostDTO {
    /// PROJECT e RECRUITMENT devono avere un titolo
    pub fn requires_title(&self) -> bool {
        self.post_type.accepts_applications()
    }
}

/// DTO per aggiornare un post (solo campi modificabili)
#[derive(Serialize, Deserialize, Debug, Clone, Default, Validate)]
pub struct UpdatePostDTO {
    #[validate(length(min = 1, max = 150))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 5000))]
    pub content: Option<String>,
    #[validate(url, length(max = 512))]
    pub image_url: Option<String>,
    pub is_open: Option<bool>,
}

impl UpdatePostDTO {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.image_url.is_none()
            && self.is_open.is_none()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CommentDTO {
    pub comment_id: i32,
    pub post_id: i32,
    pub author_id: i32,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<Comment> for CommentDTO {
    fn from(value: Comment) -> Self {
        Self {
            comment_id: value.comment_id,
            post_id: value.post_id,
            author_id: value.author_id,
            content: value.content,
            created_at: value.created_at,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct CreateCommentDTO {
    #[validate(length(min = 1, max = 2000, message = "Comment must be between 1 and 2000 characters"))]
    pub content: String,
}

/// Dati per l'inserimento di un commento
#[derive(Debug, Clone)]
pub struct NewComment {
    pub post_id: i32,
    pub author_id: i32,
    pub content: String,
}

/// Dati per l'inserimento di un post
#[derive(Debug, Clone)]
pub struct NewPost {
    pub author_id: i32,
    pub post_type: PostType,
    pub title: Option<String>,
    pub content: String,
    pub image_url: Option<String>,
}
