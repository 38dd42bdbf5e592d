//! Post entity - Entità post, commenti e like

use super::enums::PostType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct Post {
    pub post_id: i32,
    pub author_id: i32,
    #[sqlx(try_from = "String")]
    pub post_type: PostType,
    pub title: Option<String>,
    pub content: String,
    pub image_url: Option<String>,
    // le candidature sono accettate solo se il post è aperto
    pub is_open: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Post arricchito con contatori e username dell'autore, usato dal feed
#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct PostWithStats {
    pub post_id: i32,
    pub author_id: i32,
    pub author_username: String,
    #[sqlx(try_from = "String")]
    pub post_type: PostType,
    pub title: Option<String>,
    pub content: String,
    pub image_url: Option<String>,
    pub is_open: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub like_count: i64,
    pub comment_count: i64,
    // risultato di EXISTS(...), MySQL lo restituisce come intero
    pub liked_by_me: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct Comment {
    pub comment_id: i32,
    pub post_id: i32,
    pub author_id: i32,
    pub content: String,
    pub created_at: DateTime<Utc>,
}
